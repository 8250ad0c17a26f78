//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the git operations a
//! release needs, allowing for multiple implementations including a real
//! repository and a mock for testing.
//!
//! # Overview
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: A mock implementation for testing
//!
//! The release orchestrator depends on the [Repository] trait only.

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::Version;
use crate::error::Result;

/// One line of `git log --pretty='%d %s'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Decorations of the commit, as git prints them
    /// (e.g. "tag: v1.0.0", "origin/main", "refs/pullreqs/42")
    pub decorations: Vec<String>,
    /// First line of the commit message
    pub subject: String,
}

impl LogEntry {
    pub fn new(decorations: Vec<String>, subject: impl Into<String>) -> Self {
        LogEntry {
            decorations,
            subject: subject.into(),
        }
    }

    /// Renders the entry the way `%d %s` does: a leading space, the
    /// decorations in parentheses when there are any, then the subject.
    pub fn oneline(&self) -> String {
        if self.decorations.is_empty() {
            format!(" {}", self.subject)
        } else {
            format!(" ({}) {}", self.decorations.join(", "), self.subject)
        }
    }
}

/// Version-control collaborator used by the release flow
///
/// ## Error Handling
///
/// All methods return [crate::error::Result<T>]. Implementations map
/// underlying errors (like `git2::Error`) to [crate::error::ReleaseError].
///
/// ## Implementations
///
/// - [Git2Repository](repository::Git2Repository): Real Git implementation using the `git2` crate
/// - [MockRepository](mock::MockRepository): Test implementation recording every mutation
pub trait Repository {
    /// Whether tracked files have uncommitted changes (untracked files don't count)
    fn is_dirty(&self) -> Result<bool>;

    /// Check out a branch, tag or commit. Anything but a local branch
    /// leaves HEAD detached.
    fn checkout(&self, reference: &str) -> Result<()>;

    /// Create a branch at HEAD and switch to it
    fn create_branch(&self, name: &str) -> Result<()>;

    /// Stage every modified tracked file and commit it (like `git commit -a`)
    fn commit_all_changed(&self, message: &str) -> Result<()>;

    /// Create an annotated tag on HEAD
    fn tag_annotated(&self, name: &str) -> Result<()>;

    /// All `v<version>` tags, newest first. Fetches from the remotes first
    /// when `fetch` is set.
    fn get_version_tags(&self, fetch: bool) -> Result<Vec<Version>>;

    /// Whether `ancestor` is `descendant` or one of its ancestors
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool>;

    /// Resolve a ref to a full commit id, or with `abbrev` to its short
    /// name (`HEAD` resolves to the current branch name).
    fn rev_parse(&self, reference: &str, abbrev: bool) -> Result<String>;

    /// Name of the first remote whose URL contains `pattern`
    fn first_remote_matching(&self, pattern: &str) -> Result<Option<String>>;

    /// Fetch branches and tags from every remote
    fn fetch(&self) -> Result<()>;

    /// Describe HEAD relative to the nearest tag
    fn describe(&self) -> Result<String>;

    fn push_tag(&self, remote: &str, tag: &str) -> Result<()>;

    /// Human readable summary of the HEAD commit and its diffstat
    fn show_head(&self) -> Result<String>;

    /// Commits reachable from `recent` but not from `ancestor`, newest first
    fn log_range(&self, ancestor: &str, recent: &str) -> Result<Vec<LogEntry>>;
}
