//! loom-write - Generate post drafts and content ideas

use clap::Parser;
use std::io::Read;
use std::sync::Arc;

use liblinkloom::generator::{
    CompletionRequest, GenerationKind, Generator, HttpCompletionApi,
};
use liblinkloom::logging::{self, LogFormat, LoggingConfig};
use liblinkloom::{Config, LinkloomError, Result, SqliteStore};

#[derive(Parser, Debug)]
#[command(name = "loom-write")]
#[command(version)]
#[command(about = "Generate LinkedIn post drafts and content ideas")]
struct Cli {
    /// What to write about (reads from stdin if not provided)
    prompt: Option<String>,

    /// Generate a list of post ideas instead of a draft
    #[arg(short, long)]
    ideas: bool,

    /// Writing tone, e.g. professional, casual, bold
    #[arg(short, long)]
    tone: Option<String>,

    /// Target length, e.g. short, medium, long
    #[arg(short, long)]
    length: Option<String>,

    /// Topic to center the draft on
    #[arg(long)]
    focus: Option<String>,

    /// Industry context
    #[arg(long)]
    industry: Option<String>,

    /// Intended audience
    #[arg(long)]
    audience: Option<String>,

    /// Comma-separated interests to weave in
    #[arg(long)]
    interests: Option<String>,

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
    let prompt = read_prompt(cli.prompt)?;
    if prompt.trim().is_empty() {
        return Err(LinkloomError::InvalidInput(
            "Prompt cannot be empty".to_string(),
        ));
    }

    let config = Config::load()?;
    let store = Arc::new(SqliteStore::open(&config.store.path).await?);
    let api = Arc::new(HttpCompletionApi::from_config(&config.generator));
    let generator = Generator::new(api, store);

    let kind = if cli.ideas {
        GenerationKind::Ideas
    } else {
        GenerationKind::Content
    };

    let request = CompletionRequest {
        prompt,
        kind,
        tone: cli.tone.or(config.generator.default_tone),
        length: cli.length,
        focus: cli.focus,
        industry: cli.industry.or(config.generator.default_industry),
        audience: cli.audience,
        interests: cli
            .interests
            .map(|list| list.split(',').map(|s| s.trim().to_string()).collect()),
    };

    let generated = generator.generate(&request).await?;

    if cli.format == "json" {
        println!(
            "{}",
            serde_json::json!({
                "content": generated.content,
                "quality": generated.quality,
                "source": generated.source,
            })
        );
    } else {
        println!("{}", generated.content);
        if generated.is_fallback() {
            eprintln!("note: the generation service was unavailable; this is fallback text");
        }
    }

    Ok(())
}

fn read_prompt(arg: Option<String>) -> Result<String> {
    match arg {
        Some(prompt) => Ok(prompt),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| LinkloomError::InvalidInput(format!("Failed to read stdin: {}", e)))?;
            Ok(buffer.trim_end().to_string())
        }
    }
}
