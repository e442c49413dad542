//! End-to-end digest production for a single team.

use tracing::{debug, info};

use super::digest::ReminderAggregator;
use super::error::ReminderError;
use super::render::render_digest;
use crate::github::PullRequestGateway;
use crate::slack::SlackGateway;
use crate::team::TeamRegistry;
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Looks up a team, aggregates its review requests and renders the digest.
///
/// The service borrows its collaborators; callers own them for the lifetime
/// of one request.
pub struct ReminderService<'a> {
    registry: &'a dyn TeamRegistry,
    github: &'a dyn PullRequestGateway,
    slack: &'a dyn SlackGateway,
    telemetry: &'a dyn TelemetrySink,
}

impl<'a> ReminderService<'a> {
    /// Creates a service over the given collaborators.
    #[must_use]
    pub fn new(
        registry: &'a dyn TeamRegistry,
        github: &'a dyn PullRequestGateway,
        slack: &'a dyn SlackGateway,
        telemetry: &'a dyn TelemetrySink,
    ) -> Self {
        Self {
            registry,
            github,
            slack,
            telemetry,
        }
    }

    /// Produces the rendered reminder digest for `team_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ReminderError::NotFound`] when the team is not configured
    /// and [`ReminderError::Upstream`] when storage, GitHub or Slack fail.
    pub async fn digest_for_team(&self, team_id: &str) -> Result<String, ReminderError> {
        let team = self.registry.team(team_id)?;
        debug!(
            team = %team.id,
            repositories = team.repositories.len(),
            "building reminder digest"
        );

        let digest = ReminderAggregator::new(self.github).build(&team).await?;
        let directory = self.slack.directory().await?;

        self.telemetry.record(TelemetryEvent::DigestBuilt {
            team_id: team.id.clone(),
            reviewers: digest.len(),
            pull_requests: digest.url_count(),
        });
        info!(team = %team.id, reviewers = digest.len(), "reminder digest ready");

        Ok(render_digest(&digest, &directory))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::ReminderService;
    use crate::github::{MockPullRequestGateway, OpenPullRequest, RepositoryRef};
    use crate::persistence::PersistenceError;
    use crate::reminder::ReminderError;
    use crate::slack::{ChatUser, MockSlackGateway, SlackError};
    use crate::team::{MockTeamRegistry, Team};
    use crate::telemetry::TelemetryEvent;
    use crate::telemetry::test_support::RecordingTelemetrySink;

    fn registry_with_alice_override() -> MockTeamRegistry {
        let mut registry = MockTeamRegistry::new();
        registry
            .expect_team()
            .withf(|team_id| team_id == "T1")
            .returning(|team_id| {
                Ok(Team {
                    id: team_id.to_owned(),
                    repositories: vec![
                        RepositoryRef::new("org", "repo").expect("repository should be valid"),
                    ],
                    overrides: [("alice".to_owned(), "Alice".to_owned())]
                        .into_iter()
                        .collect(),
                    comment: None,
                })
            });
        registry
    }

    fn github_with_one_request() -> MockPullRequestGateway {
        let mut github = MockPullRequestGateway::new();
        github.expect_open_pull_requests().returning(|_| {
            Ok(vec![OpenPullRequest {
                number: 1,
                html_url: Some("https://example/pr/1".to_owned()),
                requested_reviewers: vec![Some("alice".to_owned())],
            }])
        });
        github
    }

    #[rstest]
    #[tokio::test]
    async fn renders_override_resolved_against_the_directory() {
        let registry = registry_with_alice_override();
        let github = github_with_one_request();
        let mut slack = MockSlackGateway::new();
        slack
            .expect_directory()
            .returning(|| Ok(vec![ChatUser::new("U9", ["Alice"])]));
        let telemetry = RecordingTelemetrySink::default();

        let text = ReminderService::new(&registry, &github, &slack, &telemetry)
            .digest_for_team("T1")
            .await
            .expect("digest should render");

        assert_eq!(text, "Pull Request Reminder\n\n<@U9>\nhttps://example/pr/1\n");
        assert_eq!(
            telemetry.take(),
            vec![TelemetryEvent::DigestBuilt {
                team_id: "T1".to_owned(),
                reviewers: 1,
                pull_requests: 1,
            }]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_team_is_not_found_without_calling_apis() {
        let mut registry = MockTeamRegistry::new();
        registry.expect_team().returning(|team_id| {
            Err(PersistenceError::TeamNotFound {
                team_id: team_id.to_owned(),
            })
        });
        let mut github = MockPullRequestGateway::new();
        github.expect_open_pull_requests().never();
        let mut slack = MockSlackGateway::new();
        slack.expect_directory().never();
        let telemetry = RecordingTelemetrySink::default();

        let error = ReminderService::new(&registry, &github, &slack, &telemetry)
            .digest_for_team("T404")
            .await
            .expect_err("unknown team should fail");

        assert!(
            matches!(error, ReminderError::NotFound { .. }),
            "expected NotFound, got {error:?}"
        );
        assert!(telemetry.take().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn directory_failure_is_upstream() {
        let registry = registry_with_alice_override();
        let github = github_with_one_request();
        let mut slack = MockSlackGateway::new();
        slack.expect_directory().returning(|| {
            Err(SlackError::Api {
                method: "users.list".to_owned(),
                message: "missing_scope".to_owned(),
            })
        });
        let telemetry = RecordingTelemetrySink::default();

        let error = ReminderService::new(&registry, &github, &slack, &telemetry)
            .digest_for_team("T1")
            .await
            .expect_err("directory failure should surface");

        assert!(
            matches!(error, ReminderError::Upstream { .. }),
            "expected Upstream, got {error:?}"
        );
    }
}
