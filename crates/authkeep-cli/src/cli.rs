//! CLI entry and dispatch.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::commands;

#[derive(Parser)]
#[command(name = "authkeep")]
#[command(version)]
#[command(about = "Local authentication state keeper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Store credentials obtained from a remote login flow
    Login {
        /// User identifier returned by the login flow
        #[arg(long, value_name = "ID")]
        user_id: String,

        /// Bearer token (prompted on stdin if omitted)
        #[arg(long, value_name = "TOKEN")]
        token: Option<String>,

        /// Profile payload as a JSON object
        #[arg(long, value_name = "JSON")]
        user: Option<String>,
    },

    /// Clear stored credentials
    Logout,

    /// Show the current authentication state
    Status,

    /// Print request headers for the stored token
    Headers,
}

pub fn run() -> Result<()> {
    // Quiet unless RUST_LOG says otherwise; stderr so stdout stays scriptable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Login {
            user_id,
            token,
            user,
        } => commands::login(&user_id, token.as_deref(), user.as_deref()),
        Commands::Logout => commands::logout(),
        Commands::Status => commands::status(),
        Commands::Headers => commands::headers(),
    }
}
