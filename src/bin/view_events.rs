use ai_guard::config;
use ai_guard::db::repositories::EventsRepository;
use ai_guard::db::DatabaseService;
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load_from_env()?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.api.log_level.as_str()),
    )
    .init();

    let db = DatabaseService::new(&config.database).await?;
    let time_zone = config.events.time_zone()?;
    let repo = EventsRepository::new(db.pool.clone(), time_zone);

    let events = repo.list_all().await;
    db.close().await;
    let events = events?;

    if events.is_empty() {
        println!("No events found in the database.");
        return Ok(());
    }

    println!("Found {} events:", events.len());
    println!(
        "{:>6}  {:<25}  {:<20}  {:<12}  {}",
        "id", "timestamp", "event_type", "camera_id", "description"
    );
    for event in events {
        println!(
            "{:>6}  {:<25}  {:<20}  {:<12}  {}",
            event.id,
            event
                .timestamp
                .with_timezone(&time_zone)
                .format("%Y-%m-%d %H:%M:%S %:z")
                .to_string(),
            event.event_type,
            event.camera_id,
            event.description
        );
    }

    Ok(())
}
