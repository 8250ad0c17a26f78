use std::cell::RefCell;
use std::time::{Duration, Instant};

use mkrelease::github::{GitHubClient, GitHubLookup, PullRequestLookup};
use mkrelease::ui::Prompter;
use mkrelease::{ReleaseError, Result};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{basic_auth, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_pull(server: &MockServer, number: u64, delay_ms: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/acme/widget/pulls/{}", number)))
        .and(basic_auth("octocat", "s3cret"))
        .and(header("accept", "application/vnd.github.v3+json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "number": number,
                    "html_url": format!("https://github.com/acme/widget/pull/{}", number),
                    "title": format!("Change number {}", number),
                }))
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_results_sorted_regardless_of_completion_order() {
    let server = MockServer::start().await;
    mount_pull(&server, 30, 150).await;
    mount_pull(&server, 10, 0).await;
    mount_pull(&server, 20, 75).await;

    let client = GitHubClient::new(server.uri(), "acme/widget", "octocat", "s3cret", 10);
    let pulls = client.fetch_pull_requests(&[30, 10, 20]).await.unwrap();

    let urls: Vec<&str> = pulls.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://github.com/acme/widget/pull/10",
            "https://github.com/acme/widget/pull/20",
            "https://github.com/acme/widget/pull/30",
        ]
    );
    assert_eq!(pulls[0].title, "Change number 10");
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let server = MockServer::start().await;
    for number in 1..=3 {
        mount_pull(&server, number, 100).await;
    }

    let client = GitHubClient::new(server.uri(), "acme/widget", "octocat", "s3cret", 1);
    let started = Instant::now();
    let pulls = client.fetch_pull_requests(&[1, 2, 3]).await.unwrap();

    assert_eq!(pulls.len(), 3);
    // One at a time: the delays add up
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_malformed_payload_fails_the_batch() {
    let server = MockServer::start().await;
    mount_pull(&server, 1, 0).await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/pulls/2"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest",
        })))
        .mount(&server)
        .await;

    let client = GitHubClient::new(server.uri(), "acme/widget", "octocat", "s3cret", 10);
    let err = client.fetch_pull_requests(&[1, 2]).await.unwrap_err();

    assert!(matches!(err, ReleaseError::Runtime(_)));
    assert!(err.to_string().contains("Not Found"));
}

#[tokio::test]
async fn test_no_numbers_no_requests() {
    let server = MockServer::start().await;
    let client = GitHubClient::new(server.uri(), "acme/widget", "octocat", "s3cret", 10);

    let pulls = client.fetch_pull_requests(&[]).await.unwrap();
    assert!(pulls.is_empty());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

struct Username(RefCell<Vec<String>>);

impl Prompter for Username {
    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }

    fn input(&self, prompt: &str) -> Result<String> {
        self.0.borrow_mut().push(prompt.to_string());
        Ok("octocat".to_string())
    }
}

#[test]
fn test_lookup_asks_for_username_and_reads_token() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(async {
        let server = MockServer::start().await;
        mount_pull(&server, 7, 0).await;
        server
    });

    let dir = TempDir::new().unwrap();
    let token_path = dir.path().join("token");
    std::fs::write(&token_path, "s3cret\n").unwrap();

    let lookup = GitHubLookup::new(server.uri(), "acme/widget", token_path, 10);
    let prompter = Username(RefCell::new(Vec::new()));
    let pulls = lookup.lookup(&prompter, &[7]).unwrap();

    assert_eq!(pulls.len(), 1);
    assert_eq!(pulls[0].url, "https://github.com/acme/widget/pull/7");
    assert_eq!(
        *prompter.0.borrow(),
        vec!["Enter your github username: ".to_string()]
    );
}

#[test]
fn test_lookup_without_token_file() {
    let dir = TempDir::new().unwrap();
    let lookup = GitHubLookup::new(
        "http://127.0.0.1:9",
        "acme/widget",
        dir.path().join("missing-token"),
        10,
    );
    let prompter = Username(RefCell::new(Vec::new()));

    let err = lookup.lookup(&prompter, &[1]).unwrap_err();
    assert!(matches!(err, ReleaseError::Configuration(_)));
    assert!(err.to_string().contains("missing-token"));
}
