use ai_guard::config;
use ai_guard::db::repositories::EventsRepository;
use ai_guard::db::{seed, DatabaseService};
use anyhow::Result;
use chrono::Utc;
use log::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load_from_env()?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.api.log_level.as_str()),
    )
    .init();

    info!("Seeding database at {}", config.database.url);

    let db = DatabaseService::new(&config.database).await?;
    let repo = EventsRepository::new(db.pool.clone(), config.events.time_zone()?);

    let result = seed::reseed(&repo, Utc::now()).await;
    db.close().await;

    match result {
        Ok(report) => {
            info!(
                "Seeding complete: cleared {} events, inserted {} sample events",
                report.cleared, report.inserted
            );
            Ok(())
        }
        Err(e) => {
            error!("Seeding failed: {}", e);
            Err(e.into())
        }
    }
}
