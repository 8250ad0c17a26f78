//! Pull request lookups against the GitHub REST API
//!
//! Commits between two release tags are mapped to pull request numbers
//! (see [scan_pull_requests]); each number is then fetched concurrently,
//! with at most `max_concurrent` requests in flight. Results arrive in
//! completion order and are sorted once at the end, so the output does not
//! depend on network timing.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use crate::config::Config;
use crate::error::{ReleaseError, Result};
use crate::ui::Prompter;

const ACCEPT_VALUE: &str = "application/vnd.github.v3+json";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "mkrelease";

/// A pull request's web URL preceded by a `refs/pullreqs/N` decoration, or
/// a `(#N)` suffix in the commit subject.
static PR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\(refs/pullreqs/(\d+)|\(#(\d+)").expect("pull request pattern is valid")
});

/// Ordered by url, then title
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PullRequest {
    pub url: String,
    pub title: String,
}

/// Pull request numbers found in a commit log
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrScan {
    /// In order of first appearance, without duplicates
    pub numbers: Vec<u64>,
    /// Whether any number came from a `refs/pullreqs/*` decoration
    pub found_pullreq_ref: bool,
}

/// Extracts pull request numbers from `%d %s` formatted log lines.
///
/// Dependency bump commits (`build(deps)`) are skipped.
pub fn scan_pull_requests<'a, I>(lines: I) -> PrScan
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scan = PrScan::default();
    for line in lines {
        if line.contains("build(deps)") {
            continue;
        }
        let Some(captures) = PR_PATTERN.captures(line) else {
            continue;
        };

        let (number, from_ref) = match (captures.get(1), captures.get(2)) {
            (Some(from_ref), _) => (from_ref.as_str(), true),
            (None, Some(from_subject)) => (from_subject.as_str(), false),
            (None, None) => continue,
        };

        let Ok(number) = number.parse::<u64>() else {
            debug!(line, "pull request number out of range");
            continue;
        };
        scan.found_pullreq_ref |= from_ref;
        if !scan.numbers.contains(&number) {
            scan.numbers.push(number);
        }
    }
    scan
}

/// Reads the API token, failing with directions when the file is missing.
pub fn load_token(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(token) => Ok(token.trim().to_string()),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ReleaseError::configuration(format!(
            "No developer tool api token at '{}'\n    please create an access token at https://github.com/settings/tokens",
            path.display()
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Pulls `html_url` and `title` out of a pull request payload. Anything
/// else is a runtime error carrying the raw payload.
pub fn parse_pull_request(payload: &str) -> Result<PullRequest> {
    let malformed = || ReleaseError::runtime(payload.to_string());

    let value: Value = serde_json::from_str(payload).map_err(|_| malformed())?;
    let url = value.get("html_url").and_then(Value::as_str);
    let title = value.get("title").and_then(Value::as_str);

    match (url, title) {
        (Some(url), Some(title)) => Ok(PullRequest {
            url: url.to_string(),
            title: title.to_string(),
        }),
        _ => Err(malformed()),
    }
}

/// Authenticated client for one repository's pull requests
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: String,
    repo: String,
    username: String,
    token: String,
    max_concurrent: usize,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_base", &self.api_base)
            .field("repo", &self.repo)
            .field("username", &self.username)
            .field("max_concurrent", &self.max_concurrent)
            .finish()
    }
}

impl GitHubClient {
    /// * `api_base` - e.g. `https://api.github.com`
    /// * `repo` - `owner/name`
    pub fn new(
        api_base: impl Into<String>,
        repo: impl Into<String>,
        username: impl Into<String>,
        token: impl Into<String>,
        max_concurrent: usize,
    ) -> Self {
        GitHubClient {
            client: Client::new(),
            api_base: api_base.into(),
            repo: repo.into(),
            username: username.into(),
            token: token.into(),
            max_concurrent: max_concurrent.max(1),
        }
    }

    fn pull_url(&self, number: u64) -> String {
        format!(
            "{}/repos/{}/pulls/{}",
            self.api_base.trim_end_matches('/'),
            self.repo,
            number
        )
    }

    /// Fetches every pull request, sorted by url. The first failure aborts
    /// the lookups still in flight.
    pub async fn fetch_pull_requests(&self, numbers: &[u64]) -> Result<Vec<PullRequest>> {
        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for &number in numbers {
            let permits = Arc::clone(&permits);
            let request = self
                .client
                .get(self.pull_url(number))
                .basic_auth(&self.username, Some(&self.token))
                .header(ACCEPT, ACCEPT_VALUE)
                .header(USER_AGENT, USER_AGENT_VALUE);

            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| ReleaseError::runtime(format!("Request pool closed: {}", e)))?;
                debug!(number, "fetching pull request");
                let body = request.send().await?.text().await?;
                parse_pull_request(&body)
            });
        }

        let mut collected = Vec::with_capacity(numbers.len());
        while let Some(joined) = tasks.join_next().await {
            let pull = joined
                .map_err(|e| ReleaseError::runtime(format!("Pull request lookup failed: {}", e)))??;
            collected.push(pull);
        }

        collected.sort();
        Ok(collected)
    }
}

/// Resolves pull request numbers to their url and title
pub trait PullRequestLookup {
    fn lookup(&self, prompter: &dyn Prompter, numbers: &[u64]) -> Result<Vec<PullRequest>>;
}

/// [PullRequestLookup] against GitHub: asks for the username, reads the
/// token file, then fetches on a dedicated runtime.
#[derive(Debug, Clone)]
pub struct GitHubLookup {
    api_base: String,
    repo: String,
    token_path: PathBuf,
    max_concurrent: usize,
}

impl GitHubLookup {
    pub fn new(
        api_base: impl Into<String>,
        repo: impl Into<String>,
        token_path: impl Into<PathBuf>,
        max_concurrent: usize,
    ) -> Self {
        GitHubLookup {
            api_base: api_base.into(),
            repo: repo.into(),
            token_path: token_path.into(),
            max_concurrent,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        GitHubLookup::new(
            config.github.api_base.clone(),
            config.project.upstream_repo.clone(),
            config.github.resolved_token_path(),
            config.github.max_concurrent_requests,
        )
    }
}

impl PullRequestLookup for GitHubLookup {
    fn lookup(&self, prompter: &dyn Prompter, numbers: &[u64]) -> Result<Vec<PullRequest>> {
        let username = prompter.input("Enter your github username: ")?;
        let token = load_token(&self.token_path)?;

        let client = GitHubClient::new(
            self.api_base.clone(),
            self.repo.clone(),
            username,
            token,
            self.max_concurrent,
        );

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(client.fetch_pull_requests(numbers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scan_prefers_pullreq_refs() {
        let lines = [
            " (refs/pullreqs/4512) Merge pull request #4512 from someone/branch",
            " Fix the planner (#4498)",
            " (tag: v0.5.0) Unrelated commit",
        ];
        let scan = scan_pull_requests(lines);
        assert_eq!(scan.numbers, vec![4512, 4498]);
        assert!(scan.found_pullreq_ref);
    }

    #[test]
    fn test_scan_skips_dependency_bumps() {
        let lines = [
            " build(deps): bump serde from 1.0.1 to 1.0.2 (#4400)",
            " (refs/pullreqs/4401) build(deps): bump tokio",
            " sql: support LATERAL (#4402)",
        ];
        let scan = scan_pull_requests(lines);
        assert_eq!(scan.numbers, vec![4402]);
        assert!(!scan.found_pullreq_ref);
    }

    #[test]
    fn test_scan_deduplicates() {
        let lines = [" first half (#7)", " second half (#7)"];
        assert_eq!(scan_pull_requests(lines).numbers, vec![7]);
    }

    #[test]
    fn test_scan_pullreq_ref_must_lead() {
        let lines = [" (origin/main, refs/pullreqs/9) no number in subject"];
        let scan = scan_pull_requests(lines);
        assert!(scan.numbers.is_empty());
    }

    #[test]
    fn test_scan_ignores_oversized_numbers() {
        let lines = [
            " (refs/pullreqs/99999999999999999999999) Merge pull request",
            " fix overflow (#12)",
        ];
        let scan = scan_pull_requests(lines);
        assert_eq!(scan.numbers, vec![12]);
        assert!(!scan.found_pullreq_ref);
    }

    #[test]
    fn test_parse_pull_request() {
        let pr = parse_pull_request(
            r#"{"html_url": "https://github.com/o/r/pull/1", "title": "Add it", "number": 1}"#,
        )
        .unwrap();
        assert_eq!(pr.url, "https://github.com/o/r/pull/1");
        assert_eq!(pr.title, "Add it");
    }

    #[test]
    fn test_parse_pull_request_missing_field_carries_payload() {
        let payload = r#"{"message": "Not Found"}"#;
        let err = parse_pull_request(payload).unwrap_err();
        assert!(matches!(err, ReleaseError::Runtime(ref raw) if raw == payload));
    }

    #[test]
    fn test_parse_pull_request_not_json() {
        let err = parse_pull_request("<html>rate limited</html>").unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_parse_pull_request_title_must_be_string() {
        assert!(parse_pull_request(r#"{"html_url": "u", "title": null}"#).is_err());
    }

    #[test]
    fn test_load_token_trims() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "ghp_secret\n").unwrap();
        assert_eq!(load_token(&path).unwrap(), "ghp_secret");
    }

    #[test]
    fn test_load_token_missing() {
        let dir = TempDir::new().unwrap();
        let err = load_token(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, ReleaseError::Configuration(_)));
        assert!(err.to_string().contains("github.com/settings/tokens"));
    }

    #[test]
    fn test_pull_url() {
        let client = GitHubClient::new("https://api.github.com/", "o/r", "me", "t", 10);
        assert_eq!(client.pull_url(12), "https://api.github.com/repos/o/r/pulls/12");
        assert!(!format!("{:?}", client).contains("\"t\""));
    }

    #[test]
    fn test_pull_requests_sort_by_url() {
        let mut prs = vec![
            PullRequest {
                url: "https://github.com/o/r/pull/20".to_string(),
                title: "b".to_string(),
            },
            PullRequest {
                url: "https://github.com/o/r/pull/10".to_string(),
                title: "a".to_string(),
            },
        ];
        prs.sort();
        assert!(prs[0].url.ends_with("/10"));
    }
}
