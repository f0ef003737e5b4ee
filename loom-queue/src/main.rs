//! loom-queue - Manage scheduled posts
//!
//! Scheduling is a reminder ledger: nothing publishes a queued post on its
//! own. `loom-queue now <id>` is the explicit action that sends one.

use clap::{Parser, Subcommand};
use std::sync::Arc;

use liblinkloom::ledger::{Ledger, PostRecord, PostStatus};
use liblinkloom::logging::{self, LogFormat, LoggingConfig};
use liblinkloom::publisher::LinkedInApi;
use liblinkloom::{
    Config, ConnectionState, LinkloomError, PublishOutcome, Publisher, Result, SqliteStore,
};

#[derive(Parser, Debug)]
#[command(name = "loom-queue")]
#[command(version)]
#[command(about = "Manage scheduled posts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List scheduled posts
    List {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Cancel a scheduled post
    Cancel {
        /// Post id to cancel
        id: i64,
    },

    /// Publish a scheduled post immediately
    Now {
        /// Post id to publish
        id: i64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        LoggingConfig::new(LogFormat::Text, "debug".to_string(), true).init();
    } else {
        logging::init_default();
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let store = Arc::new(SqliteStore::open(&config.store.path).await?);
    let ledger = Ledger::new(store.clone());

    match cli.command {
        Commands::List { format } => {
            cmd_list(&ledger, &format).await?;
        }
        Commands::Cancel { id } => {
            cmd_cancel(&ledger, id).await?;
        }
        Commands::Now { id } => {
            let connection = ConnectionState::load(store.as_ref()).await?;
            let api = Arc::new(LinkedInApi::from_config(&config.linkedin));
            let publisher = Publisher::new(ledger, api);
            cmd_now(&publisher, id, &connection).await?;
        }
    }

    Ok(())
}

async fn cmd_list(ledger: &Ledger, format: &str) -> Result<()> {
    if format != "text" && format != "json" {
        return Err(LinkloomError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }

    let scheduled: Vec<PostRecord> = ledger
        .all()
        .await?
        .into_iter()
        .filter(|r| r.status == PostStatus::Scheduled)
        .collect();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&scheduled).unwrap_or_default());
        return Ok(());
    }

    for record in &scheduled {
        println!(
            "{} | {} | {} {}",
            record.id,
            truncate_content(&record.content, 50),
            record.scheduled_date.as_deref().unwrap_or("?"),
            record.scheduled_time.as_deref().unwrap_or("?"),
        );
    }

    Ok(())
}

/// Only scheduled records may be cancelled; published history is immutable
/// through this tool.
async fn cmd_cancel(ledger: &Ledger, id: i64) -> Result<()> {
    match ledger.get(id).await? {
        None => {
            println!("No post with id {}", id);
        }
        Some(record) if record.status == PostStatus::Published => {
            return Err(LinkloomError::InvalidInput(format!(
                "Post {} is published and cannot be cancelled",
                id
            )));
        }
        Some(_) => {
            ledger.remove(id).await?;
            println!("Cancelled post {}", id);
        }
    }

    Ok(())
}

async fn cmd_now(publisher: &Publisher, id: i64, connection: &ConnectionState) -> Result<()> {
    let (record, outcome) = publisher.publish_scheduled(id, connection).await?;

    match outcome {
        PublishOutcome::Remote(post_id) => {
            println!("Published post {} to LinkedIn: {}", record.id, post_id);
        }
        PublishOutcome::LocalOnly => {
            println!(
                "LinkedIn was unreachable; post {} was marked published locally \
                 and can be retried later",
                record.id
            );
        }
    }

    Ok(())
}

fn truncate_content(content: &str, max_len: usize) -> String {
    if content.chars().count() <= max_len {
        content.to_string()
    } else {
        let truncated: String = content.chars().take(max_len).collect();
        format!("{}...", truncated)
    }
}
