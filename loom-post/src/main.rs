//! loom-post - Publish or schedule a LinkedIn post

use clap::Parser;
use std::io::Read;
use std::sync::Arc;

use liblinkloom::ledger::Ledger;
use liblinkloom::logging::{self, LogFormat, LoggingConfig};
use liblinkloom::publisher::{LinkedInApi, MAX_POST_CHARS};
use liblinkloom::scheduling::parse_schedule;
use liblinkloom::{
    Config, ConnectionState, LinkloomError, PublishOutcome, Publisher, Result, SqliteStore,
};

#[derive(Parser, Debug)]
#[command(name = "loom-post")]
#[command(version)]
#[command(about = "Publish or schedule a LinkedIn post")]
struct Cli {
    /// Content to post (reads from stdin if not provided)
    content: Option<String>,

    /// Schedule for later instead of posting now, e.g. "2025-06-01 09:00",
    /// "tomorrow 9am", "2h"
    #[arg(short, long)]
    schedule: Option<String>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
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
    let content = read_content(cli.content)?;

    if content.trim().is_empty() {
        return Err(LinkloomError::InvalidInput(
            "Content cannot be empty".to_string(),
        ));
    }
    let char_count = content.chars().count();
    if char_count > MAX_POST_CHARS {
        return Err(LinkloomError::InvalidInput(format!(
            "Content exceeds the {} character limit (current: {} characters)",
            MAX_POST_CHARS, char_count
        )));
    }

    let config = Config::load()?;
    let store = Arc::new(SqliteStore::open(&config.store.path).await?);
    let connection = ConnectionState::load(store.as_ref()).await?;

    let ledger = Ledger::new(store);
    let api = Arc::new(LinkedInApi::from_config(&config.linkedin));
    let publisher = Publisher::new(ledger, api);

    match cli.schedule {
        Some(when) => {
            let (date, time) = parse_schedule(&when)?;
            let record = publisher.schedule(&content, &date, &time, &connection).await?;

            if cli.format == "json" {
                println!(
                    "{}",
                    serde_json::json!({
                        "id": record.id,
                        "status": "scheduled",
                        "scheduledDate": date,
                        "scheduledTime": time,
                    })
                );
            } else {
                println!("Scheduled post {} for {} {}", record.id, date, time);
            }
        }
        None => {
            let (record, outcome) = publisher.publish_now(&content, &connection).await?;

            match outcome {
                PublishOutcome::Remote(post_id) => {
                    if cli.format == "json" {
                        println!(
                            "{}",
                            serde_json::json!({
                                "id": record.id,
                                "status": "published",
                                "linkedInPostId": post_id,
                            })
                        );
                    } else {
                        println!("Published to LinkedIn: {}", post_id);
                    }
                }
                PublishOutcome::LocalOnly => {
                    if cli.format == "json" {
                        println!(
                            "{}",
                            serde_json::json!({
                                "id": record.id,
                                "status": "published",
                                "isLocal": true,
                            })
                        );
                    } else {
                        println!(
                            "LinkedIn was unreachable; the post was saved locally \
                             and can be retried later (id {})",
                            record.id
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

fn read_content(arg: Option<String>) -> Result<String> {
    match arg {
        Some(content) => Ok(content),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| LinkloomError::InvalidInput(format!("Failed to read stdin: {}", e)))?;
            Ok(buffer.trim_end().to_string())
        }
    }
}
