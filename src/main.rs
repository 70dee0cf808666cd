use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use farmtwin::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli::commands::resolve_config(cli.api_url, cli.store)?;

    // Initialize tracing
    let default_filter = config.logging.filter.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Init => cli::commands::init().await,
        Commands::Login { email, password } => {
            cli::commands::login(&config, &email, &password).await
        }
        Commands::Logout => cli::commands::logout(&config).await,
        Commands::Status { format } => cli::commands::status(&config, format).await,
        Commands::Nav { role, format } => cli::commands::nav(&config, role, format).await,
        Commands::Profile => cli::commands::profile(&config).await,
        Commands::Get { path } => cli::commands::get(&config, &path).await,
    }
}
