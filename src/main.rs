use anyhow::Context;
use clap::Parser;
use catalog_api::cli::{self, Cli, Command};
use catalog_api::infrastructure::logging::init_logging;
use catalog_api::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;
    init_logging(&config.logging);

    match cli.into_command() {
        Command::Serve => cli::serve::run(config).await,
        Command::Migrate(args) => cli::migrate::run(config, args).await,
        Command::Seed(args) => cli::dataset::seed(config, args).await,
        Command::Truncate => cli::dataset::truncate(config).await,
    }
}
