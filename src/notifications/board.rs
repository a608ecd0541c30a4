use crate::db::models::Event;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

/// Transient, auto-expiring view of one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub event: Event,
    pub shown_at: DateTime<Utc>,
}

impl Notification {
    pub fn from_event(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            event,
            shown_at: Utc::now(),
        }
    }
}

/// Currently displayed notifications.
///
/// Each pushed notification removes itself after the display duration,
/// independently of the others.
#[derive(Clone)]
pub struct NotificationBoard {
    displayed: Arc<Mutex<Vec<Notification>>>,
    display_for: Duration,
    sender: broadcast::Sender<Notification>,
}

impl NotificationBoard {
    pub fn new(display_for: Duration) -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            displayed: Arc::new(Mutex::new(Vec::new())),
            display_for,
            sender,
        }
    }

    /// Receive every notification as it is pushed
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub async fn push(&self, notification: Notification) {
        let id = notification.id;
        self.displayed.lock().await.push(notification.clone());
        // No subscribers is fine; the board itself is the display
        let _ = self.sender.send(notification);

        let board = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(board.display_for).await;
            board.remove(id).await;
        });
    }

    /// Remove by identity; unknown ids are ignored
    pub async fn remove(&self, id: Uuid) -> bool {
        let mut displayed = self.displayed.lock().await;
        match displayed.iter().position(|n| n.id == id) {
            Some(index) => {
                displayed.remove(index);
                debug!("Notification {} expired", id);
                true
            }
            None => false,
        }
    }

    pub async fn snapshot(&self) -> Vec<Notification> {
        self.displayed.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.displayed.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
