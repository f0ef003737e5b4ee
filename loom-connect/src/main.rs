//! loom-connect - Manage the LinkedIn account connection

use clap::{Parser, Subcommand};
use std::sync::Arc;

use liblinkloom::connector::LinkedInAuth;
use liblinkloom::logging::{self, LogFormat, LoggingConfig};
use liblinkloom::{Config, ConnectionState, Connector, Result, SqliteStore};

#[derive(Parser, Debug)]
#[command(name = "loom-connect")]
#[command(version)]
#[command(about = "Connect a LinkedIn account over OAuth")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the authorization URL to open in a browser
    Url {
        /// Redirect URI registered with the provider (defaults to the
        /// configured one)
        #[arg(long)]
        redirect_uri: Option<String>,
    },

    /// Complete the flow with the code and state from the callback
    Complete {
        code: String,
        state: String,
    },

    /// Show the current connection state
    Status {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Clear the stored connection
    Disconnect,
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

    let auth = Arc::new(LinkedInAuth::from_config(&config.linkedin)?);
    let connector = Connector::new(
        store,
        auth,
        config.linkedin.client_id.clone(),
        config.linkedin.authorize_url.clone(),
    );

    match cli.command {
        Commands::Url { redirect_uri } => {
            let redirect = redirect_uri.unwrap_or_else(|| config.linkedin.redirect_uri.clone());
            let url = connector.request_authorization(&redirect).await?;
            println!("{}", url);
        }
        Commands::Complete { code, state } => {
            let profile = connector.handle_callback(&code, &state).await?;
            println!("Connected as {} ({})", profile.name, profile.sub);
        }
        Commands::Status { format } => {
            let state = connector.state().await?;
            print_status(&state, &format)?;
        }
        Commands::Disconnect => {
            connector.disconnect().await;
            println!("Disconnected");
        }
    }

    Ok(())
}

fn print_status(state: &ConnectionState, format: &str) -> Result<()> {
    if format != "text" && format != "json" {
        return Err(liblinkloom::LinkloomError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }

    match state {
        ConnectionState::Disconnected => {
            if format == "json" {
                println!("{}", serde_json::json!({ "state": "disconnected" }));
            } else {
                println!("Not connected");
            }
        }
        ConnectionState::Pending { redirect_uri, .. } => {
            if format == "json" {
                println!(
                    "{}",
                    serde_json::json!({ "state": "pending", "redirectUri": redirect_uri })
                );
            } else {
                println!("Authorization pending (redirect: {})", redirect_uri);
            }
        }
        ConnectionState::Connected { profile, .. } => {
            if format == "json" {
                println!(
                    "{}",
                    serde_json::json!({
                        "state": "connected",
                        "name": profile.name,
                        "sub": profile.sub,
                    })
                );
            } else {
                println!("Connected as {} ({})", profile.name, profile.sub);
            }
        }
    }

    Ok(())
}
