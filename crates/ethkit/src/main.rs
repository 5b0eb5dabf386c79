mod commands;
mod logging;

use clap::Parser;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; values may come from the real environment.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::setup_logging(cli.verbose)?;
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    commands::run(cli).await
}
