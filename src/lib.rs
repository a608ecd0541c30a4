pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod notifications;
pub mod services;

// Re-export main components for easier use
pub use db::models::{Event, NewEvent};
pub use db::repositories::EventsRepository;
pub use error::Error;
pub use notifications::{NotificationBoard, NotificationPoller};
