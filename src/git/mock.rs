use crate::domain::{version_tags, Version};
use crate::error::{ReleaseError, Result};
use crate::git::{LogEntry, Repository};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct MockState {
    dirty: bool,
    tags: Vec<String>,
    on_latest: bool,
    branch: String,
    remotes: Vec<(String, String)>,
    log: HashMap<(String, String), Vec<LogEntry>>,
    fail_push: bool,
    fetches: usize,
    operations: Vec<String>,
}

/// Mock repository for testing without actual git operations
///
/// Every mutating call is recorded as a short line ("checkout v1.0.0",
/// "commit release: v1.0.0", ...) retrievable via [MockRepository::operations].
/// Annotated tags become visible to [Repository::get_version_tags].
pub struct MockRepository {
    state: Mutex<MockState>,
}

impl MockRepository {
    /// Create a new clean mock repository on branch "main"
    pub fn new() -> Self {
        MockRepository {
            state: Mutex::new(MockState {
                on_latest: true,
                branch: "main".to_string(),
                ..MockState::default()
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add an existing tag
    pub fn add_tag(&self, name: impl Into<String>) {
        self.state().tags.push(name.into());
    }

    pub fn set_dirty(&self, dirty: bool) {
        self.state().dirty = dirty;
    }

    /// Whether HEAD descends from every tag
    pub fn set_on_latest(&self, on_latest: bool) {
        self.state().on_latest = on_latest;
    }

    pub fn add_remote(&self, name: impl Into<String>, url: impl Into<String>) {
        self.state().remotes.push((name.into(), url.into()));
    }

    /// Commits returned by `log_range(ancestor, recent)`
    pub fn set_log(&self, ancestor: &str, recent: &str, entries: Vec<LogEntry>) {
        self.state()
            .log
            .insert((ancestor.to_string(), recent.to_string()), entries);
    }

    pub fn set_fail_push(&self, fail: bool) {
        self.state().fail_push = fail;
    }

    /// Mutations performed so far, in order
    pub fn operations(&self) -> Vec<String> {
        self.state().operations.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.state().fetches
    }

    fn record(&self, operation: String) {
        self.state().operations.push(operation);
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn is_dirty(&self) -> Result<bool> {
        Ok(self.state().dirty)
    }

    fn checkout(&self, reference: &str) -> Result<()> {
        self.record(format!("checkout {}", reference));
        Ok(())
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        self.state().branch = name.to_string();
        self.record(format!("branch {}", name));
        Ok(())
    }

    fn commit_all_changed(&self, message: &str) -> Result<()> {
        self.record(format!("commit {}", message));
        Ok(())
    }

    fn tag_annotated(&self, name: &str) -> Result<()> {
        self.state().tags.push(name.to_string());
        self.record(format!("tag {}", name));
        Ok(())
    }

    fn get_version_tags(&self, fetch: bool) -> Result<Vec<Version>> {
        if fetch {
            self.fetch()?;
        }
        Ok(version_tags(self.state().tags.iter()))
    }

    fn is_ancestor(&self, _ancestor: &str, _descendant: &str) -> Result<bool> {
        Ok(self.state().on_latest)
    }

    fn rev_parse(&self, reference: &str, abbrev: bool) -> Result<String> {
        match (reference, abbrev) {
            ("HEAD", true) => Ok(self.state().branch.clone()),
            (_, true) => Ok(reference.to_string()),
            (_, false) => Ok("0123456789abcdef0123456789abcdef01234567".to_string()),
        }
    }

    fn first_remote_matching(&self, pattern: &str) -> Result<Option<String>> {
        Ok(self
            .state()
            .remotes
            .iter()
            .find(|(_, url)| url.contains(pattern))
            .map(|(name, _)| name.clone()))
    }

    fn fetch(&self) -> Result<()> {
        self.state().fetches += 1;
        Ok(())
    }

    fn describe(&self) -> Result<String> {
        let tags = version_tags(self.state().tags.iter());
        match tags.last() {
            Some(oldest) => Ok(format!("{}-3-gabc1234", oldest.tag())),
            None => Err(ReleaseError::runtime("No tags can describe HEAD")),
        }
    }

    fn push_tag(&self, remote: &str, tag: &str) -> Result<()> {
        if self.state().fail_push {
            return Err(ReleaseError::runtime(format!(
                "Network error during push of {}",
                tag
            )));
        }
        self.record(format!("push {} {}", remote, tag));
        Ok(())
    }

    fn show_head(&self) -> Result<String> {
        Ok("commit 0123456789abcdef0123456789abcdef01234567".to_string())
    }

    fn log_range(&self, ancestor: &str, recent: &str) -> Result<Vec<LogEntry>> {
        self.state()
            .log
            .get(&(ancestor.to_string(), recent.to_string()))
            .cloned()
            .ok_or_else(|| {
                ReleaseError::configuration(format!("Unknown range {}..{}", ancestor, recent))
            })
    }
}
