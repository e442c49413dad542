//! Plain-text rendering of a reminder digest.

use super::digest::ReminderDigest;
use crate::slack::{ChatUser, resolve_mention};

/// First line of every rendered digest.
pub const DIGEST_HEADER: &str = "Pull Request Reminder";

/// Renders `digest` with each key resolved against `directory`.
///
/// The header is followed by one block per key: a blank line, the mention
/// (or `@key` when nobody matched), then one URL per line.
#[must_use]
pub fn render_digest(digest: &ReminderDigest, directory: &[ChatUser]) -> String {
    let mut text = String::from(DIGEST_HEADER);
    text.push('\n');
    for (key, urls) in digest.iter() {
        text.push('\n');
        text.push_str(&resolve_mention(key, directory).to_string());
        text.push('\n');
        for url in urls {
            text.push_str(url);
            text.push('\n');
        }
    }
    text
}
