//! Team-wide review reminder digests.
//!
//! A digest groups every pending review request across a team's
//! repositories under a display key, then renders each key as a Slack
//! mention followed by the pull request URLs waiting on that person.

pub mod digest;
pub mod error;
pub mod render;
pub mod service;

pub use digest::{ReminderAggregator, ReminderDigest};
pub use error::ReminderError;
pub use render::{DIGEST_HEADER, render_digest};
pub use service::ReminderService;
