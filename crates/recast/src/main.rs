// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recast - recycle previously sent messages to fans who have not bought them.
//!
//! This is the binary entry point. Results go to stdout as JSON; logs go to
//! stderr.

mod fetcher;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::warn;

use recast_config::RecastConfig;
use recast_core::{MediaContainer, QueuedMessage, RecastError, RenderedElement, Request};
use recast_pipeline::{DropHook, RecastContext};

use crate::fetcher::DirectoryFetcher;

/// Recast - recycle previously sent messages.
#[derive(Parser, Debug)]
#[command(name = "recast", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding exported messages as `<id>.json` or `<id>.html`.
    #[arg(long, global = true, default_value = ".")]
    messages: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenize one message and run the exclusion and media checks.
    Process { text: String },
    /// Process a JSON array of messages read from a file.
    Batch { file: PathBuf },
    /// Inspect or update per-message exclusion lists.
    #[command(subcommand)]
    Exclusions(ExclusionCommand),
    /// Extract a message's media and re-insert it into a new message.
    Media {
        message_id: String,
        /// Directory to read the message from.
        #[arg(long)]
        from: PathBuf,
    },
    /// Inspect or clear the outbound queue.
    #[command(subcommand)]
    Queue(QueueCommand),
    /// Read a request envelope from stdin and write the response to stdout.
    Dispatch,
}

#[derive(Subcommand, Debug)]
enum ExclusionCommand {
    /// Print the exclusion list of a message.
    Show { message_id: String },
    /// Add buyers to the exclusion list of a message.
    Add {
        message_id: String,
        #[arg(required = true)]
        buyers: Vec<String>,
    },
    /// Print the candidates that are not on the exclusion list.
    Filter {
        message_id: String,
        candidates: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum QueueCommand {
    Size,
    Peek,
    Clear,
}

/// Prints every inserted element as one JSON line.
struct PrintingContainer;

#[async_trait]
impl MediaContainer for PrintingContainer {
    async fn append_child(&self, element: RenderedElement) -> Result<(), RecastError> {
        println!("{}", serde_json::to_string(&element)?);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => recast_config::load_and_validate_path(path),
        None => recast_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            recast_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.app.log_level);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("recast: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("recast={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn drop_hook() -> DropHook {
    Arc::new(|message: &QueuedMessage| {
        warn!(message_id = %message.id, retries = message.retry_count - 1, "message dropped after exhausting retries");
    })
}

async fn run(cli: Cli, config: RecastConfig) -> Result<(), RecastError> {
    let messages_dir = match &cli.command {
        Commands::Media { from, .. } => from.clone(),
        _ => cli.messages.clone(),
    };

    let store = recast_storage::open_store(&config.storage).await?;
    let fetcher = Arc::new(DirectoryFetcher::new(messages_dir));
    let ctx = RecastContext::initialize(config, store, fetcher, Some(drop_hook())).await?;

    let result = execute(&ctx, cli.command).await;
    ctx.shutdown().await?;
    result
}

async fn execute(ctx: &RecastContext, command: Commands) -> Result<(), RecastError> {
    match command {
        Commands::Process { text } => {
            let result = ctx.handler().handle_message(&Value::String(text)).await?;
            print_json(&serde_json::to_value(result)?)
        }
        Commands::Batch { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .map_err(|e| RecastError::Internal(format!("cannot read {}: {e}", file.display())))?;
            let messages: Value = serde_json::from_str(&raw)?;
            let results = ctx.handler().handle_batch(&messages).await?;
            print_json(&serde_json::to_value(results)?)
        }
        Commands::Exclusions(ExclusionCommand::Show { message_id }) => {
            let list = ctx.exclusions().get_or_create_list(&message_id).await;
            print_json(&json!(list))
        }
        Commands::Exclusions(ExclusionCommand::Add { message_id, buyers }) => {
            let list = ctx.exclusions().update_list(&message_id, &buyers).await;
            print_json(&json!(list))
        }
        Commands::Exclusions(ExclusionCommand::Filter {
            message_id,
            candidates,
        }) => {
            let kept = ctx
                .exclusions()
                .filter_recipients(&message_id, &candidates)
                .await;
            print_json(&json!(kept))
        }
        Commands::Media { message_id, .. } => {
            let results = ctx
                .media()
                .insert_media_into_new_message(&message_id, &PrintingContainer)
                .await;
            let failed = results.iter().filter(|r| !r.is_success()).count();
            eprintln!("{} inserted, {failed} failed", results.len() - failed);
            Ok(())
        }
        Commands::Queue(QueueCommand::Size) => print_json(&json!(ctx.queue().size().await)),
        Commands::Queue(QueueCommand::Peek) => print_json(&json!(ctx.queue().peek().await)),
        Commands::Queue(QueueCommand::Clear) => {
            ctx.queue().clear().await;
            Ok(())
        }
        Commands::Dispatch => {
            let request = read_request(tokio::io::stdin()).await?;
            let response = ctx.handler().dispatch(request).await;
            print_json(&serde_json::to_value(response)?)
        }
    }
}

/// Read one request envelope until end of input.
async fn read_request<R: AsyncRead + Unpin>(mut input: R) -> Result<Request, RecastError> {
    let mut raw = String::new();
    input
        .read_to_string(&mut raw)
        .await
        .map_err(|e| RecastError::Internal(format!("cannot read request: {e}")))?;
    Ok(serde_json::from_str(&raw)?)
}

fn print_json(value: &Value) -> Result<(), RecastError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_subcommands() {
        let cli = Cli::try_parse_from(["recast", "exclusions", "add", "m1", "a", "b"]).unwrap();
        match cli.command {
            Commands::Exclusions(ExclusionCommand::Add { message_id, buyers }) => {
                assert_eq!(message_id, "m1");
                assert_eq!(buyers, vec!["a", "b"]);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["recast", "media", "m1", "--from", "/tmp/msgs"]).unwrap();
        assert!(matches!(cli.command, Commands::Media { ref from, .. } if from == &PathBuf::from("/tmp/msgs")));

        assert!(Cli::try_parse_from(["recast", "exclusions", "add", "m1"]).is_err());
        assert!(Cli::try_parse_from(["recast", "media", "m1"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from(["recast", "queue", "size", "--config", "r.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("r.toml")));
        assert_eq!(cli.messages, PathBuf::from("."));
    }

    #[test]
    fn default_config_is_valid() {
        let config = recast_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.queue.retry_limit, 3);
    }

    #[tokio::test]
    async fn reads_request_envelope_from_input() {
        let raw = br#"{"action":"getExclusionList","payload":{"messageId":"m1"},"requestId":"r1","source":"cli"}"#;
        let request = read_request(&raw[..]).await.unwrap();
        assert_eq!(request.action, "getExclusionList");
        assert_eq!(request.request_id.as_deref(), Some("r1"));

        let err = read_request(&b"not json"[..]).await.unwrap_err();
        assert!(matches!(err, RecastError::Serialization(_)));
    }

    #[tokio::test]
    async fn execute_against_memory_store() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("m1.json"), r#"[{"type":"image","src":"a.jpg"}]"#).unwrap();

        let mut config = RecastConfig::default();
        config.storage.backend = recast_config::model::StorageBackend::Memory;
        let store = recast_storage::open_store(&config.storage).await.unwrap();
        let fetcher = Arc::new(DirectoryFetcher::new(dir.path()));
        let ctx = RecastContext::initialize(config, store, fetcher, Some(drop_hook()))
            .await
            .unwrap();

        execute(&ctx, Commands::Exclusions(ExclusionCommand::Add {
            message_id: "m1".into(),
            buyers: vec!["bob".into()],
        }))
        .await
        .unwrap();
        assert!(ctx.exclusions().is_excluded("m1", "bob").await);

        execute(&ctx, Commands::Media { message_id: "m1".into(), from: dir.path().to_path_buf() })
            .await
            .unwrap();
        assert_eq!(ctx.media().get_media_elements("m1").await.unwrap().len(), 1);

        assert!(execute(&ctx, Commands::Process { text: "Hello".into() }).await.is_ok());
    }
}
