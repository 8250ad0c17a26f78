use crate::domain::{version_tags, Version};
use crate::error::{ReleaseError, Result};
use crate::git::{LogEntry, Repository};
use git2::build::CheckoutBuilder;
use git2::{
    AutotagOption, Commit, DescribeFormatOptions, DescribeOptions, DiffStatsFormat, FetchOptions,
    Oid, PushOptions, RemoteCallbacks, Repository as Git2Repo, Sort, Status, StatusOptions,
};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    /// Root of the working tree
    pub fn workdir(&self) -> Result<&Path> {
        self.repo
            .workdir()
            .ok_or_else(|| ReleaseError::configuration("Cannot release from a bare repository"))
    }

    fn resolve_commit(&self, reference: &str) -> Result<Oid> {
        let object = self.repo.revparse_single(reference).map_err(|e| {
            ReleaseError::configuration(format!("Cannot resolve '{}': {}", reference, e))
        })?;
        Ok(object.peel_to_commit()?.id())
    }

    fn head_commit(&self) -> Result<Commit<'_>> {
        Ok(self.repo.head()?.peel_to_commit()?)
    }

    /// Every ref that points (after peeling) at a commit, keyed by that commit
    fn decorations(&self) -> Result<HashMap<Oid, Vec<String>>> {
        let mut decorations: HashMap<Oid, Vec<String>> = HashMap::new();

        for reference in self.repo.references()? {
            let reference = reference?;
            let Some(name) = reference.name() else {
                continue;
            };
            let Ok(commit) = reference.peel_to_commit() else {
                continue;
            };
            decorations
                .entry(commit.id())
                .or_default()
                .push(decoration_name(name));
        }

        for names in decorations.values_mut() {
            names.sort();
        }
        Ok(decorations)
    }
}

/// How `git log --decorate` names a ref
fn decoration_name(refname: &str) -> String {
    if let Some(branch) = refname.strip_prefix("refs/heads/") {
        branch.to_string()
    } else if let Some(remote_branch) = refname.strip_prefix("refs/remotes/") {
        remote_branch.to_string()
    } else if let Some(tag) = refname.strip_prefix("refs/tags/") {
        format!("tag: {}", tag)
    } else {
        refname.to_string()
    }
}

/// Credentials for fetch and push.
///
/// Supports SSH authentication via keys from ~/.ssh/ and the SSH agent,
/// falling back to default credentials.
fn remote_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(git2::CredentialType::SSH_KEY) {
            if let Some(home) = dirs::home_dir() {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = home.join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        git2::Cred::default()
    });
    callbacks
}

impl Repository for Git2Repository {
    fn is_dirty(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses.iter().any(|entry| entry.status() != Status::CURRENT))
    }

    fn checkout(&self, reference: &str) -> Result<()> {
        debug!(reference, "checking out");
        let (object, resolved) = self.repo.revparse_ext(reference).map_err(|e| {
            ReleaseError::configuration(format!("Cannot resolve '{}': {}", reference, e))
        })?;
        let commit = object.peel_to_commit()?;

        let mut builder = CheckoutBuilder::new();
        builder.safe();
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut builder))?;

        match resolved {
            Some(branch) if branch.is_branch() => {
                let name = branch.name().ok_or_else(|| {
                    ReleaseError::runtime(format!("Branch for '{}' is not valid UTF-8", reference))
                })?;
                self.repo.set_head(name)?;
            }
            _ => self.repo.set_head_detached(commit.id())?,
        }
        Ok(())
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        debug!(branch = name, "creating branch");
        let head = self.head_commit()?;
        let branch = self.repo.branch(name, &head, false)?;
        let refname = branch
            .get()
            .name()
            .ok_or_else(|| ReleaseError::runtime(format!("Branch '{}' is not valid UTF-8", name)))?
            .to_string();
        self.repo.set_head(&refname)?;
        Ok(())
    }

    fn commit_all_changed(&self, message: &str) -> Result<()> {
        debug!(message, "committing");
        let mut index = self.repo.index()?;
        index.update_all(["*"], None)?;
        index.write()?;

        let tree = self.repo.find_tree(index.write_tree()?)?;
        let signature = self.repo.signature()?;
        let parent = self.head_commit()?;
        self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;
        Ok(())
    }

    fn tag_annotated(&self, name: &str) -> Result<()> {
        debug!(tag = name, "tagging");
        let head = self.head_commit()?;
        let signature = self.repo.signature()?;
        self.repo
            .tag(name, head.as_object(), &signature, name, false)?;
        Ok(())
    }

    fn get_version_tags(&self, fetch: bool) -> Result<Vec<Version>> {
        if fetch {
            self.fetch()?;
        }
        let names = self.repo.tag_names(None)?;
        Ok(version_tags(names.iter().flatten()))
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        let ancestor = self.resolve_commit(ancestor)?;
        let descendant = self.resolve_commit(descendant)?;
        Ok(ancestor == descendant || self.repo.graph_descendant_of(descendant, ancestor)?)
    }

    fn rev_parse(&self, reference: &str, abbrev: bool) -> Result<String> {
        if !abbrev {
            return Ok(self.resolve_commit(reference)?.to_string());
        }

        let resolved = if reference == "HEAD" {
            if self.repo.head_detached()? {
                return Ok("HEAD".to_string());
            }
            self.repo.head()?
        } else {
            self.repo.resolve_reference_from_short_name(reference)?
        };

        resolved
            .shorthand()
            .map(str::to_string)
            .ok_or_else(|| ReleaseError::runtime(format!("'{}' is not valid UTF-8", reference)))
    }

    fn first_remote_matching(&self, pattern: &str) -> Result<Option<String>> {
        let remotes = self.repo.remotes()?;
        for name in remotes.iter().flatten() {
            let remote = self.repo.find_remote(name)?;
            if remote.url().map_or(false, |url| url.contains(pattern)) {
                return Ok(Some(name.to_string()));
            }
        }
        Ok(None)
    }

    fn fetch(&self) -> Result<()> {
        let remotes = self.repo.remotes()?;
        for name in remotes.iter().flatten() {
            debug!(remote = name, "fetching");
            let mut remote = self.repo.find_remote(name)?;

            let mut options = FetchOptions::new();
            options.remote_callbacks(remote_callbacks());
            options.download_tags(AutotagOption::All);

            // empty refspecs: use the remote's configured fetch refspecs
            remote
                .fetch(&[] as &[&str], Some(&mut options), None)
                .map_err(|e| {
                    ReleaseError::runtime(format!("Failed to fetch from remote '{}': {}", name, e))
                })?;
        }
        Ok(())
    }

    fn describe(&self) -> Result<String> {
        let mut options = DescribeOptions::new();
        options.describe_tags();
        let description = self.repo.describe(&options)?;

        let mut format = DescribeFormatOptions::new();
        format.abbreviated_size(7);
        Ok(description.format(Some(&format))?)
    }

    fn push_tag(&self, remote_name: &str, tag: &str) -> Result<()> {
        debug!(remote = remote_name, tag, "pushing tag");
        let mut remote = self.repo.find_remote(remote_name).map_err(|_| {
            ReleaseError::configuration(format!("No remote named '{}' found", remote_name))
        })?;

        let mut callbacks = remote_callbacks();
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "Push failed for {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspec = format!("refs/tags/{}", tag);
        remote
            .push(&[refspec.as_str()], Some(&mut push_options))
            .map_err(|e| {
                if e.class() == git2::ErrorClass::Net {
                    ReleaseError::runtime(format!("Network error during push: {}", e))
                } else {
                    ReleaseError::runtime(format!("Failed to push tag '{}': {}", tag, e))
                }
            })
    }

    fn show_head(&self) -> Result<String> {
        let commit = self.head_commit()?;
        let tree = commit.tree()?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
        let stats = diff.stats()?.to_buf(DiffStatsFormat::FULL, 80)?;

        let author = commit.author();
        Ok(format!(
            "commit {}\nAuthor: {} <{}>\n\n    {}\n\n{}",
            commit.id(),
            author.name().unwrap_or("unknown"),
            author.email().unwrap_or(""),
            commit.summary().unwrap_or(""),
            stats.as_str().unwrap_or("")
        ))
    }

    fn log_range(&self, ancestor: &str, recent: &str) -> Result<Vec<LogEntry>> {
        let decorations = self.decorations()?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(self.resolve_commit(recent)?)?;
        revwalk.hide(self.resolve_commit(ancestor)?)?;

        let mut entries = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;
            entries.push(LogEntry::new(
                decorations.get(&oid).cloned().unwrap_or_default(),
                commit.summary().unwrap_or(""),
            ));
        }
        Ok(entries)
    }
}
