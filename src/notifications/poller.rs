use crate::config::PollerConfig;
use crate::error::Error;
use crate::notifications::board::{Notification, NotificationBoard};
use crate::notifications::feed::EventFeed;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Polling,
}

/// Observer-side loop that turns new events into notifications.
///
/// Delivery is by id: every event above the cursor is shown once, in
/// ascending id order, and the cursor only moves forward.
pub struct NotificationPoller {
    feed: Arc<dyn EventFeed>,
    board: NotificationBoard,
    interval: Duration,
    batch_limit: i64,
    /// `None` until the catch-up read succeeds. Held for the whole tick.
    last_seen_id: Mutex<Option<i64>>,
    /// Present while polling
    cancel: Mutex<Option<CancellationToken>>,
}

impl NotificationPoller {
    pub fn new(feed: Arc<dyn EventFeed>, board: NotificationBoard, config: &PollerConfig) -> Self {
        Self {
            feed,
            board,
            interval: config.interval(),
            batch_limit: config.batch_limit.max(1),
            last_seen_id: Mutex::new(None),
            cancel: Mutex::new(None),
        }
    }

    pub fn board(&self) -> &NotificationBoard {
        &self.board
    }

    pub async fn state(&self) -> PollerState {
        match *self.cancel.lock().await {
            Some(_) => PollerState::Polling,
            None => PollerState::Idle,
        }
    }

    pub async fn last_seen_id(&self) -> Option<i64> {
        *self.last_seen_id.lock().await
    }

    /// Skip existing history, then poll every `interval` until stopped.
    ///
    /// The next poll is scheduled from the end of the previous one, so a slow
    /// poll delays only itself. Starting an already polling poller is a no-op.
    pub async fn start(self: &Arc<Self>) {
        let mut cancel = self.cancel.lock().await;
        if cancel.is_some() {
            debug!("Notification poller already running");
            return;
        }

        {
            let mut cursor = self.last_seen_id.lock().await;
            if cursor.is_none() {
                *cursor = self.catch_up().await;
            }
        }

        let token = CancellationToken::new();
        *cancel = Some(token.clone());

        let poller = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(poller.interval) => {}
                }
                poller.tick().await;
            }
            debug!("Notification poller loop exited");
        });

        info!(
            "Notification poller started (interval {:?}, cursor {:?})",
            self.interval,
            self.last_seen_id().await
        );
    }

    /// Cancel the timer. Safe to call when already idle.
    pub async fn stop(&self) {
        if let Some(token) = self.cancel.lock().await.take() {
            token.cancel();
            info!("Notification poller stopped");
        }
    }

    /// Run one poll and return how many notifications were emitted.
    ///
    /// Fetch failures are swallowed; the next tick simply tries again.
    pub async fn tick(&self) -> usize {
        let mut cursor = self.last_seen_id.lock().await;

        let last_seen = match *cursor {
            Some(id) => id,
            None => {
                *cursor = self.catch_up().await;
                return 0;
            }
        };

        let events = match self.feed.events_since(last_seen, self.batch_limit).await {
            Ok(events) => events,
            Err(e) => {
                log_fetch_failure(&e);
                return 0;
            }
        };

        let mut emitted = 0;
        let mut last_seen = last_seen;
        for event in events {
            if event.id <= last_seen {
                continue;
            }
            last_seen = event.id;
            *cursor = Some(last_seen);
            self.board.push(Notification::from_event(event)).await;
            emitted += 1;
        }

        if emitted > 0 {
            debug!("Emitted {} notifications, cursor at {}", emitted, last_seen);
        }

        emitted
    }

    /// Highest id currently in the feed (`0` when empty), `None` on failure
    async fn catch_up(&self) -> Option<i64> {
        match self.feed.latest_event().await {
            Ok(latest) => Some(latest.map_or(0, |event| event.id)),
            Err(e) => {
                log_fetch_failure(&e);
                None
            }
        }
    }
}

fn log_fetch_failure(err: &Error) {
    if err.is_transient() {
        debug!("Event poll failed, retrying next tick: {}", err);
    } else {
        warn!("Event poll failed, retrying next tick: {}", err);
    }
}
