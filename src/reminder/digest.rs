//! Team-wide aggregation of review requests.

use std::collections::BTreeMap;

use tracing::{debug, error};

use super::error::ReminderError;
use crate::github::{PullRequestGateway, ReviewRequestCollector, ReviewRequestMap};
use crate::team::Team;

/// Display key (override name or raw login) → pull request URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderDigest {
    entries: BTreeMap<String, Vec<String>>,
}

impl ReminderDigest {
    /// Folds one repository's review requests in, applying `team` overrides.
    ///
    /// Logins that share an override name are concatenated under that name.
    pub fn merge(&mut self, team: &Team, requests: ReviewRequestMap) {
        for (login, urls) in requests {
            let key = team.display_key(&login).to_owned();
            self.entries.entry(key).or_default().extend(urls);
        }
    }

    /// URLs filed under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Iterates display keys in sorted order with their URLs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, urls)| (key.as_str(), urls.as_slice()))
    }

    /// Number of display keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nobody has a pending review.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total URL count across all keys.
    #[must_use]
    pub fn url_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

/// Builds a [`ReminderDigest`] for every repository of a team.
pub struct ReminderAggregator<'client, Gateway>
where
    Gateway: PullRequestGateway + ?Sized,
{
    collector: ReviewRequestCollector<'client, Gateway>,
}

impl<'client, Gateway> ReminderAggregator<'client, Gateway>
where
    Gateway: PullRequestGateway + ?Sized,
{
    /// Create an aggregator backed by the provided gateway.
    #[must_use]
    pub const fn new(client: &'client Gateway) -> Self {
        Self {
            collector: ReviewRequestCollector::new(client),
        }
    }

    /// Collects each repository in configured order and merges the results.
    ///
    /// # Errors
    ///
    /// Returns [`ReminderError::Upstream`] naming the first repository whose
    /// collection failed; no partial digest is produced.
    pub async fn build(&self, team: &Team) -> Result<ReminderDigest, ReminderError> {
        let mut digest = ReminderDigest::default();
        for repository in &team.repositories {
            let requests = self.collector.collect(repository).await.map_err(|failure| {
                error!(team = %team.id, repository = %repository, "collection failed: {failure}");
                ReminderError::for_repository(&repository.to_string(), &failure)
            })?;
            digest.merge(team, requests);
        }
        debug!(
            team = %team.id,
            reviewers = digest.len(),
            pull_requests = digest.url_count(),
            "built reminder digest"
        );
        Ok(digest)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use mockall::predicate::eq;
    use rstest::{fixture, rstest};

    use super::{ReminderAggregator, ReminderDigest};
    use crate::github::{IntakeError, MockPullRequestGateway, OpenPullRequest, RepositoryRef};
    use crate::reminder::ReminderError;
    use crate::team::Team;

    fn repo(text: &str) -> RepositoryRef {
        RepositoryRef::parse(text).expect("repository should parse")
    }

    fn pull_request(repository: &str, number: u64, reviewers: &[&str]) -> OpenPullRequest {
        OpenPullRequest {
            number,
            html_url: Some(format!("https://github.com/{repository}/pull/{number}")),
            requested_reviewers: reviewers.iter().map(|login| Some((*login).to_owned())).collect(),
        }
    }

    fn overrides(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(login, name)| ((*login).to_owned(), (*name).to_owned()))
            .collect()
    }

    #[fixture]
    fn two_repo_team() -> Team {
        Team {
            id: "T1".to_owned(),
            repositories: vec![repo("octo/api"), repo("octo/web")],
            ..Team::default()
        }
    }

    fn gateway_with_two_repos() -> MockPullRequestGateway {
        let mut gateway = MockPullRequestGateway::new();
        gateway
            .expect_open_pull_requests()
            .with(eq(repo("octo/api")))
            .returning(|_| {
                Ok(vec![
                    pull_request("octo/api", 1, &["alice"]),
                    pull_request("octo/api", 2, &["bob", "alice"]),
                ])
            });
        gateway
            .expect_open_pull_requests()
            .with(eq(repo("octo/web")))
            .returning(|_| Ok(vec![pull_request("octo/web", 7, &["alice", "bob"])]));
        gateway
    }

    #[rstest]
    #[tokio::test]
    async fn same_login_across_repositories_concatenates_in_repository_order(two_repo_team: Team) {
        let gateway = gateway_with_two_repos();

        let digest = ReminderAggregator::new(&gateway)
            .build(&two_repo_team)
            .await
            .expect("build should succeed");

        assert_eq!(
            digest.get("alice"),
            Some(
                [
                    "https://github.com/octo/api/pull/1".to_owned(),
                    "https://github.com/octo/api/pull/2".to_owned(),
                    "https://github.com/octo/web/pull/7".to_owned(),
                ]
                .as_slice()
            )
        );
        assert_eq!(digest.len(), 2);
        assert_eq!(digest.url_count(), 5);
    }

    #[rstest]
    #[tokio::test]
    async fn overrides_sharing_a_name_merge_under_one_key(mut two_repo_team: Team) {
        two_repo_team.overrides = overrides(&[("alice", "Alice A."), ("bob", "Alice A.")]);
        let gateway = gateway_with_two_repos();

        let digest = ReminderAggregator::new(&gateway)
            .build(&two_repo_team)
            .await
            .expect("build should succeed");

        assert_eq!(digest.len(), 1);
        assert!(digest.get("alice").is_none());
        assert!(digest.get("bob").is_none());
        assert_eq!(
            digest.get("Alice A."),
            Some(
                [
                    "https://github.com/octo/api/pull/1".to_owned(),
                    "https://github.com/octo/api/pull/2".to_owned(),
                    "https://github.com/octo/api/pull/2".to_owned(),
                    "https://github.com/octo/web/pull/7".to_owned(),
                    "https://github.com/octo/web/pull/7".to_owned(),
                ]
                .as_slice()
            )
        );
    }

    #[rstest]
    #[tokio::test]
    async fn shared_override_keeps_discovery_order_within_a_repository() {
        let team = Team {
            id: "T1".to_owned(),
            repositories: vec![repo("octo/api")],
            overrides: overrides(&[("alice", "X"), ("bob", "X")]),
            ..Team::default()
        };
        let mut gateway = MockPullRequestGateway::new();
        gateway.expect_open_pull_requests().returning(|_| {
            Ok(vec![
                pull_request("octo/api", 1, &["bob"]),
                pull_request("octo/api", 2, &["alice"]),
            ])
        });

        let digest = ReminderAggregator::new(&gateway)
            .build(&team)
            .await
            .expect("build should succeed");

        assert_eq!(
            digest.get("X"),
            Some(
                [
                    "https://github.com/octo/api/pull/1".to_owned(),
                    "https://github.com/octo/api/pull/2".to_owned(),
                ]
                .as_slice()
            )
        );
    }

    #[rstest]
    #[tokio::test]
    async fn first_failing_repository_aborts_the_digest(two_repo_team: Team) {
        let mut gateway = MockPullRequestGateway::new();
        gateway
            .expect_open_pull_requests()
            .with(eq(repo("octo/api")))
            .times(1)
            .returning(|_| {
                Err(IntakeError::Api {
                    message: "list pulls failed with status 404 Not Found: Not Found".to_owned(),
                })
            });
        gateway
            .expect_open_pull_requests()
            .with(eq(repo("octo/web")))
            .never();

        let error = ReminderAggregator::new(&gateway)
            .build(&two_repo_team)
            .await
            .expect_err("build should fail");

        assert!(
            matches!(error, ReminderError::Upstream { ref message } if message.starts_with("octo/api: ")),
            "expected Upstream naming octo/api, got {error:?}"
        );
    }

    #[rstest]
    fn merge_keeps_every_url() {
        let team = Team {
            overrides: overrides(&[("carol", "Carol C.")]),
            ..Team::default()
        };
        let mut digest = ReminderDigest::default();
        digest.merge(
            &team,
            [
                ("carol".to_owned(), vec!["u1".to_owned(), "u1".to_owned()]),
                ("dave".to_owned(), vec!["u2".to_owned()]),
            ]
            .into_iter()
            .collect(),
        );

        assert_eq!(digest.url_count(), 3);
        assert_eq!(
            digest.iter().map(|(key, _)| key).collect::<Vec<_>>(),
            vec!["Carol C.", "dave"]
        );
    }
}
