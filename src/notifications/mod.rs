pub mod board;
pub mod feed;
pub mod poller;

pub use board::{Notification, NotificationBoard};
pub use feed::{EventFeed, HttpEventFeed};
pub use poller::{NotificationPoller, PollerState};
