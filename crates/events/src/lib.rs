//! Workflow events and the notification sink.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the event envelope published after a workflow
//!   step commits.
//! - [`NotificationDispatcher`]: background task that turns workflow
//!   events into `notifications` rows.

pub mod bus;
pub mod event_types;
pub mod notifications;

pub use bus::{EventBus, PlatformEvent};
pub use notifications::NotificationDispatcher;
