//! fanmq – a bounded, multi-subscriber broadcast queue.
//!
//! This crate exports
//!  * `core`    – message, subscriber and queue logic
//!  * `config`  – TOML-driven runtime configuration
//!  * `logging` – tracing-subscriber setup
//!
//! One `publish` fans a message out to every subscriber registered at that
//! moment; each subscriber drains its backlog independently through its own
//! read cursor. A message is retained until every entitled subscriber has
//! consumed it (or unsubscribed), then garbage-collected. Capacity is
//! bounded: publishers block while the store is full.

// ───────────────────────────────────────────────────────────
// Public modules
// ───────────────────────────────────────────────────────────
pub mod config;
pub mod core;
pub mod logging;

// ───────────────────────────────────────────────────────────
// Re-exports
// ───────────────────────────────────────────────────────────
pub use config::{load_config, Config};
pub use self::core::error::QueueError;
pub use self::core::message::{new_message, Message};
pub use self::core::queue::{BroadcastQueue, PublishOutcome};
pub use self::core::subscriber::SubscriberId;
