use ai_guard::config;
use ai_guard::notifications::{HttpEventFeed, NotificationBoard, NotificationPoller};
use anyhow::Result;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load_from_env()?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.api.log_level.as_str()),
    )
    .init();

    let poller_config = &config.poller;
    let feed = HttpEventFeed::new(&poller_config.server_url, poller_config.request_timeout())?;
    info!("Watching events at {}", feed.base_url());

    let board = NotificationBoard::new(poller_config.display_duration());
    let mut notifications = board.subscribe();
    let poller = Arc::new(NotificationPoller::new(Arc::new(feed), board, poller_config));
    poller.start().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            received = notifications.recv() => match received {
                Ok(notification) => {
                    let event = &notification.event;
                    info!(
                        "[{}] {} on {} {}",
                        event.timestamp.format("%H:%M:%S"),
                        event.event_type,
                        event.camera_id,
                        event.description
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Display fell behind, {} notifications not shown", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    poller.stop().await;
    Ok(())
}
