//! loom-stats - Activity counts derived from the post ledger

use clap::Parser;
use std::sync::Arc;

use liblinkloom::analytics::Analytics;
use liblinkloom::ledger::Ledger;
use liblinkloom::logging::{self, LogFormat, LoggingConfig};
use liblinkloom::{Config, LinkloomError, Result, SqliteStore};

#[derive(Parser, Debug)]
#[command(name = "loom-stats")]
#[command(version)]
#[command(about = "Show activity counts derived from the post ledger")]
struct Cli {
    /// Output format: text or json
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
    if cli.format != "text" && cli.format != "json" {
        return Err(LinkloomError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            cli.format
        )));
    }

    let config = Config::load()?;
    let store = Arc::new(SqliteStore::open(&config.store.path).await?);
    let analytics = Analytics::new(Ledger::new(store.clone()), store);

    let snapshot = analytics.snapshot().await?;

    if cli.format == "json" {
        println!("{}", serde_json::to_string_pretty(&snapshot).unwrap_or_default());
    } else {
        println!("Total posts:        {}", snapshot.total_posts);
        println!("Posts this month:   {}", snapshot.posts_this_month);
        println!("Scheduled:          {}", snapshot.scheduled);
        println!("Published:          {}", snapshot.published);
        println!("Drafts generated:   {}", snapshot.content_generated);
        println!("Ideas generated:    {}", snapshot.ideas_generated);
    }

    Ok(())
}
