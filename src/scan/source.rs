//! Repository enumeration
//!
//! Lists the repositories to scan, either from a GitHub organization or from
//! an explicit list.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[cfg(test)]
use mockall::automock;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::version::registry::http_client;

/// Repositories requested per page from the GitHub API
const PER_PAGE: usize = 100;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid repository '{0}': expected owner/name")]
    InvalidRepository(String),

    #[error("Failed to read repository list {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
}

/// Repository identifier in `owner/name` form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepositoryId {
    pub owner: String,
    pub name: String,
}

impl RepositoryId {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryId {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(SourceError::InvalidRepository(trimmed.to_string())),
        }
    }
}

impl Serialize for RepositoryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Trait for listing the repositories to scan
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait RepositorySource: Send + Sync {
    async fn list_repositories(&self) -> Result<Vec<RepositoryId>, SourceError>;
}

/// Entry of `GET /orgs/{org}/repos`
#[derive(Debug, Deserialize)]
struct OrgRepository {
    full_name: String,
    #[serde(default)]
    archived: bool,
}

/// Lists every repository of a GitHub organization
pub struct GitHubOrganization {
    client: reqwest::Client,
    api_url: String,
    organization: String,
    token: String,
    include_archived: bool,
}

impl GitHubOrganization {
    pub fn new(api_url: &str, organization: &str, token: &str) -> Self {
        Self {
            client: http_client(),
            api_url: api_url.trim_end_matches('/').to_string(),
            organization: organization.to_string(),
            token: token.to_string(),
            include_archived: false,
        }
    }

    pub fn with_archived(mut self, include_archived: bool) -> Self {
        self.include_archived = include_archived;
        self
    }

    async fn fetch_page(&self, page: usize) -> Result<Vec<OrgRepository>, SourceError> {
        let url = format!(
            "{}/orgs/{}/repos?type=all&per_page={}&page={}",
            self.api_url, self.organization, PER_PAGE, page
        );

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("token {}", self.token))
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || (status == reqwest::StatusCode::FORBIDDEN
                && response
                    .headers()
                    .get("x-ratelimit-remaining")
                    .is_some_and(|v| v == "0"))
        {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(SourceError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(SourceError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub repositories response: {}", e);
            SourceError::InvalidResponse(e.to_string())
        })
    }
}

#[async_trait::async_trait]
impl RepositorySource for GitHubOrganization {
    async fn list_repositories(&self) -> Result<Vec<RepositoryId>, SourceError> {
        let mut repositories = Vec::new();
        let mut page = 1;

        loop {
            let entries = self.fetch_page(page).await?;
            let entry_count = entries.len();
            debug!(
                "Fetched page {} of {} with {} repositories",
                page, self.organization, entry_count
            );

            for entry in entries {
                if entry.archived && !self.include_archived {
                    debug!("Skipping archived repository {}", entry.full_name);
                    continue;
                }
                repositories.push(entry.full_name.parse()?);
            }

            if entry_count < PER_PAGE {
                break;
            }
            page += 1;
        }

        info!(
            "Found {} repositories in {}",
            repositories.len(),
            self.organization
        );
        Ok(repositories)
    }
}

/// A fixed list of repositories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticRepositories {
    repositories: Vec<RepositoryId>,
}

impl StaticRepositories {
    pub fn new(repositories: Vec<RepositoryId>) -> Self {
        Self { repositories }
    }

    /// Parse one `owner/name` per line; blank lines and `#` comments are ignored
    pub fn from_lines(content: &str) -> Result<Self, SourceError> {
        let repositories = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(RepositoryId::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(repositories))
    }

    pub fn from_file(path: &Path) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(path).map_err(|source| SourceError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_lines(&content)
    }
}

#[async_trait::async_trait]
impl RepositorySource for StaticRepositories {
    async fn list_repositories(&self) -> Result<Vec<RepositoryId>, SourceError> {
        Ok(self.repositories.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use rstest::rstest;

    fn page_body(names: &[String], archived: bool) -> String {
        let entries: Vec<_> = names
            .iter()
            .map(|n| serde_json::json!({ "full_name": n, "archived": archived }))
            .collect();
        serde_json::Value::Array(entries).to_string()
    }

    #[tokio::test]
    async fn list_repositories_pages_until_short_page() {
        let mut server = Server::new_async().await;

        let first: Vec<String> = (0..PER_PAGE).map(|i| format!("acme/repo-{}", i)).collect();
        let page1 = server
            .mock("GET", "/orgs/acme/repos")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("type".into(), "all".into()),
                Matcher::UrlEncoded("per_page".into(), "100".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .match_header("authorization", "token ghp_test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(page_body(&first, false))
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/orgs/acme/repos")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(page_body(&["acme/last".to_string()], false))
            .create_async()
            .await;

        let source = GitHubOrganization::new(&server.url(), "acme", "ghp_test");
        let result = source.list_repositories().await.unwrap();

        page1.assert_async().await;
        page2.assert_async().await;
        assert_eq!(result.len(), PER_PAGE + 1);
        assert_eq!(result.last(), Some(&RepositoryId::new("acme", "last")));
    }

    #[tokio::test]
    async fn list_repositories_skips_archived_by_default() {
        let mut server = Server::new_async().await;

        let body = serde_json::json!([
            { "full_name": "acme/live", "archived": false },
            { "full_name": "acme/old", "archived": true }
        ])
        .to_string();
        let mock = server
            .mock("GET", "/orgs/acme/repos")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(2)
            .create_async()
            .await;

        let active = GitHubOrganization::new(&server.url(), "acme", "t");
        let all = GitHubOrganization::new(&server.url(), "acme", "t").with_archived(true);

        assert_eq!(
            active.list_repositories().await.unwrap(),
            vec![RepositoryId::new("acme", "live")]
        );
        assert_eq!(all.list_repositories().await.unwrap().len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_repositories_returns_error_for_unauthorized() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/orgs/acme/repos")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"message": "Bad credentials"}"#)
            .create_async()
            .await;

        let source = GitHubOrganization::new(&server.url(), "acme", "bad");
        let result = source.list_repositories().await;

        mock.assert_async().await;
        assert!(matches!(result, Err(SourceError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn list_repositories_returns_rate_limited_when_quota_exhausted() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/orgs/acme/repos")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_header("x-ratelimit-remaining", "0")
            .create_async()
            .await;

        let source = GitHubOrganization::new(&server.url(), "acme", "t");
        let result = source.list_repositories().await;

        mock.assert_async().await;
        assert!(matches!(result, Err(SourceError::RateLimited { .. })));
    }

    #[rstest]
    #[case("acme/infra", Some(("acme", "infra")))]
    #[case("  acme/infra  ", Some(("acme", "infra")))]
    #[case("acme", None)]
    #[case("acme/", None)]
    #[case("/infra", None)]
    #[case("acme/infra/extra", None)]
    fn repository_id_from_str_returns_expected(
        #[case] input: &str,
        #[case] expected: Option<(&str, &str)>,
    ) {
        let result = input.parse::<RepositoryId>().ok();
        assert_eq!(
            result,
            expected.map(|(owner, name)| RepositoryId::new(owner, name))
        );
    }

    #[test]
    fn static_repositories_from_lines_skips_comments_and_blanks() {
        let content = "# platform repos\nacme/network\n\n  acme/compute  \n";

        let source = StaticRepositories::from_lines(content).unwrap();

        assert_eq!(
            source,
            StaticRepositories::new(vec![
                RepositoryId::new("acme", "network"),
                RepositoryId::new("acme", "compute"),
            ])
        );
    }

    #[test]
    fn static_repositories_from_lines_rejects_malformed_line() {
        let result = StaticRepositories::from_lines("acme/network\nnot-a-repo\n");
        assert!(matches!(
            result,
            Err(SourceError::InvalidRepository(line)) if line == "not-a-repo"
        ));
    }

    #[test]
    fn repository_id_displays_as_owner_slash_name() {
        assert_eq!(RepositoryId::new("acme", "infra").to_string(), "acme/infra");
    }
}
