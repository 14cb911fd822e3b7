//! qscale-sqs: SQS backlog measurement.
//!
//! Backlog depth is the sum of three queue attributes:
//!
//! ```text
//! ApproximateNumberOfMessages            (visible)
//! ApproximateNumberOfMessagesDelayed     (delayed)
//! ApproximateNumberOfMessagesNotVisible  (in flight)
//! ```
//!
//! The queue name is resolved to a queue URL on the first measurement and
//! cached for the lifetime of the inspector.

pub mod inspector;

pub use inspector::{backlog_from_attributes, connect, SqsInspector};
