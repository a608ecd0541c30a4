use ai_guard::api::rest::{AppState, RestApi};
use ai_guard::config;
use ai_guard::db::DatabaseService;
use anyhow::Result;
use log::{error, info};

async fn run_app() -> Result<()> {
    let config = config::load_from_env()?;

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.api.log_level.as_str()),
    )
    .init();
    info!("Starting AI Guard event server");

    let db = DatabaseService::new(&config.database).await?;
    let state = AppState::new(db.pool.clone(), &config.events)?;

    let http_server = RestApi::new(&config.api, state);
    let result = http_server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutting down...");
        })
        .await;

    // Flush pending writes before exiting
    db.close().await;

    result
}

#[tokio::main]
async fn main() {
    if let Err(e) = run_app().await {
        eprintln!("Application error: {:#}", e);
        std::process::exit(1);
    }
}
