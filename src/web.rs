#![cfg(not(tarpaulin_include))]

use storeplan::app;
use storeplan::config::Config;

/// Main entry point for the web application
///
/// Reads configuration from flags, the environment and `.env`, creates the
/// workbook if it is missing, and serves the API.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load();
    log::info!("using workbook {}", config.workbook.display());

    app::run(config).await
}
