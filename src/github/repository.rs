//! Repository references and token wrappers for GitHub access.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::IntakeError;

/// Identifies one GitHub repository a team watches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    organization: String,
    name: String,
}

impl RepositoryRef {
    /// Creates a repository reference from its organisation and name.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidRepository`] when either part is blank.
    pub fn new(organization: &str, name: &str) -> Result<Self, IntakeError> {
        let org = organization.trim();
        let repo = name.trim();
        if org.is_empty() || repo.is_empty() {
            return Err(IntakeError::InvalidRepository {
                input: format!("{organization}/{name}"),
            });
        }
        Ok(Self {
            organization: org.to_owned(),
            name: repo.to_owned(),
        })
    }

    /// Parses `organization/name`.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidRepository`] when the text is not two
    /// non-empty segments separated by a slash.
    ///
    /// # Example
    ///
    /// ```
    /// use prbell::github::RepositoryRef;
    ///
    /// let repo = RepositoryRef::parse("octo/widgets").expect("should parse");
    /// assert_eq!(repo.organization(), "octo");
    /// assert_eq!(repo.name(), "widgets");
    /// ```
    pub fn parse(input: &str) -> Result<Self, IntakeError> {
        let invalid = || IntakeError::InvalidRepository {
            input: input.to_owned(),
        };
        let (organization, name) = input.split_once('/').ok_or_else(invalid)?;
        if name.contains('/') {
            return Err(invalid());
        }
        Self::new(organization, name).map_err(|_| invalid())
    }

    /// Owning organisation or user.
    #[must_use]
    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn pulls_path(&self) -> String {
        format!("/repos/{}/{}/pulls", self.organization, self.name)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}", self.organization, self.name)
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::MissingToken` when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, IntakeError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IntakeError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

impl fmt::Debug for PersonalAccessToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("PersonalAccessToken(***)")
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{IntakeError, PersonalAccessToken, RepositoryRef};

    #[rstest]
    fn parses_organization_and_name() {
        let repo = RepositoryRef::parse("octo/widgets").expect("should parse repository");
        assert_eq!(repo.organization(), "octo");
        assert_eq!(repo.name(), "widgets");
        assert_eq!(repo.to_string(), "octo/widgets");
        assert_eq!(repo.pulls_path(), "/repos/octo/widgets/pulls");
    }

    #[rstest]
    #[case::missing_slash("octo")]
    #[case::empty_name("octo/")]
    #[case::empty_organization("/widgets")]
    #[case::extra_segment("octo/widgets/pull")]
    fn rejects_malformed_repository(#[case] input: &str) {
        let result = RepositoryRef::parse(input);
        assert!(
            matches!(result, Err(IntakeError::InvalidRepository { .. })),
            "expected InvalidRepository for {input}, got {result:?}"
        );
    }

    #[rstest]
    fn rejects_blank_token() {
        let result = PersonalAccessToken::new("   ");
        assert!(
            matches!(result, Err(IntakeError::MissingToken)),
            "expected MissingToken, got {result:?}"
        );
    }

    #[rstest]
    fn debug_output_hides_token() {
        let token = PersonalAccessToken::new(" ghp_secret ").expect("token should be valid");
        assert_eq!(token.value(), "ghp_secret");
        assert!(!format!("{token:?}").contains("ghp_secret"));
    }
}
