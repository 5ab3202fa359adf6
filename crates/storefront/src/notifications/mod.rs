//! Notification cache and synchronization.
//!
//! [`NotificationStore`] is the local cache (most-recent-first, capped at
//! 100 entries) and the single source of truth for the unread badge.
//! [`NotificationSync`] keeps it reconciled: hub pushes flow in through the
//! event routing task, pull refreshes replace the cache wholesale, and read
//! actions are applied optimistically before the backend acknowledgement.

mod store;
mod sync;

pub use store::{Notification, NotificationStore, PushNotification, RETENTION_CAP};
pub use sync::NotificationSync;
