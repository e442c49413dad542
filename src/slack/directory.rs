//! Slack user directory and handle-to-mention resolution.
//!
//! Each [`ChatUser`] carries several alternative names taken from different
//! Slack profile fields. Resolution probes one field position at a time
//! across the whole directory, so a likelier field on a later user beats a
//! weaker field on an earlier one.

use std::fmt;

/// A Slack user with the names a GitHub handle may be matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUser {
    /// Slack user id (e.g. `U0123ABCD`).
    pub id: String,
    /// Candidate names, highest priority first.
    pub name_variants: Vec<String>,
}

impl ChatUser {
    /// Creates a user from an id and its ordered name variants.
    #[must_use]
    pub fn new<I, S>(id: impl Into<String>, name_variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            name_variants: name_variants.into_iter().map(Into::into).collect(),
        }
    }
}

/// Outcome of resolving a handle against the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MentionResolution {
    /// The handle matched a Slack user.
    Mention {
        /// Matched Slack user id.
        user_id: String,
    },
    /// Nobody matched; render the handle as plain text.
    Fallback {
        /// The handle that failed to resolve.
        handle: String,
    },
}

impl fmt::Display for MentionResolution {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mention { user_id } => write!(formatter, "<@{user_id}>"),
            Self::Fallback { handle } => write!(formatter, "@{handle}"),
        }
    }
}

/// Resolves `key` to a mention using tier-ordered matching.
///
/// For each name position, users are scanned in directory order and the
/// first exact (case-sensitive) match wins. Users with fewer variants than
/// the current position are skipped.
///
/// # Example
///
/// ```
/// use prbell::slack::{ChatUser, MentionResolution, resolve_mention};
///
/// let directory = vec![
///     ChatUser::new("U1", ["alice", "Alice Anderson"]),
///     ChatUser::new("U2", ["bob", "Alice Anderson"]),
/// ];
/// assert_eq!(
///     resolve_mention("Alice Anderson", &directory),
///     MentionResolution::Mention { user_id: "U1".to_owned() }
/// );
/// assert_eq!(resolve_mention("carol", &directory).to_string(), "@carol");
/// ```
#[must_use]
pub fn resolve_mention(key: &str, directory: &[ChatUser]) -> MentionResolution {
    let tiers = directory
        .iter()
        .map(|user| user.name_variants.len())
        .max()
        .unwrap_or(0);

    (0..tiers)
        .find_map(|tier| {
            directory.iter().find(|user| {
                user.name_variants
                    .get(tier)
                    .is_some_and(|name| name == key)
            })
        })
        .map_or_else(
            || MentionResolution::Fallback {
                handle: key.to_owned(),
            },
            |user| MentionResolution::Mention {
                user_id: user.id.clone(),
            },
        )
}
