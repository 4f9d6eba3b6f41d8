pub mod error;
pub mod message;
pub mod queue;
pub mod subscriber;
