//! Release workflow orchestration
//!
//! [Releaser] sequences the steps of a release over its collaborators: the
//! repository, the build tool, the operator prompts and the output sink. It
//! holds no state of its own between commands, and it knows nothing about
//! clap.
//!
//! A release moves through these states, each logged at debug level:
//!
//! ```text
//! ValidatingWorkingTree -> ValidatingVersion -> (CheckedOut) ->
//! ValidatingOnLatestPrerelease -> EditingFiles -> UpdatingLockfile ->
//! Committing -> (Tagging) -> (PublishingRemote) -> Done
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::boundary::BoundaryWarning;
use crate::cargo::BuildTool;
use crate::config::Config;
use crate::domain::{
    confirm_version_is_next, next_version, previous_release, Level, Prerelease, Transition,
    Version,
};
use crate::error::{ReleaseError, Result};
use crate::files;
use crate::git::{LogEntry, Repository};
use crate::github::{scan_pull_requests, PullRequest, PullRequestLookup};
use crate::ui::{confirm_or_abort, Prompter, Speaker};

/// Where a release currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReleaseState {
    ValidatingWorkingTree,
    ValidatingVersion,
    CheckedOut,
    ValidatingOnLatestPrerelease,
    EditingFiles,
    UpdatingLockfile,
    Committing,
    Tagging,
    PublishingRemote,
    Done,
}

/// Git options shared by the release commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOptions {
    /// Commit or branch to check out first
    pub checkout: Option<String>,

    /// Branch to create (after the checkout, so it is rooted there)
    pub create_branch: Option<String>,

    /// Whether to fetch from and push to remotes at all
    pub affect_remote: bool,
}

impl Default for ReleaseOptions {
    fn default() -> Self {
        ReleaseOptions {
            checkout: None,
            create_branch: None,
            affect_remote: true,
        }
    }
}

/// What a completed release did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    /// The version written into the project files
    pub version: Version,

    /// The tag that was created, if this release was tagged
    pub tag: Option<String>,

    /// Whether the tag was pushed to the upstream remote
    pub pushed: bool,
}

/// Which default branch name `incorporate` picks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Incorporation {
    /// A standalone `incorporate`
    Prepare,
    /// The second half of `finish`
    Continue,
}

impl Incorporation {
    fn branch_prefix(self) -> &'static str {
        match self {
            Incorporation::Prepare => "prepare",
            Incorporation::Continue => "continue",
        }
    }
}

/// Drives the release commands
pub struct Releaser<'a> {
    repo: &'a dyn Repository,
    build: &'a dyn BuildTool,
    prompter: &'a dyn Prompter,
    speaker: &'a dyn Speaker,
    config: &'a Config,
    root: PathBuf,
    today: NaiveDate,
}

impl<'a> Releaser<'a> {
    /// Operates on files relative to the current directory, dated today.
    pub fn new(
        repo: &'a dyn Repository,
        build: &'a dyn BuildTool,
        prompter: &'a dyn Prompter,
        speaker: &'a dyn Speaker,
        config: &'a Config,
    ) -> Self {
        Releaser {
            repo,
            build,
            prompter,
            speaker,
            config,
            root: PathBuf::from("."),
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Directory the configured paths are relative to
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Date used for the license change date and the docs version list
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Start a new release candidate cycle at `level`.
    pub fn new_rc(&self, level: Level, options: &ReleaseOptions) -> Result<ReleaseOutcome> {
        let latest = self.latest_version(options.affect_remote)?;
        let version = next_version(&latest, level)?;
        info!(%latest, %version, ?level, "new release candidate");
        self.release(&version, options, true)
    }

    /// Move the project to the next patch version with a `-dev` suffix.
    pub fn incorporate(&self, options: &ReleaseOptions) -> Result<ReleaseOutcome> {
        self.incorporate_with(options, options.affect_remote, Incorporation::Prepare)
    }

    /// Tag the final release of the latest release candidate, then prepare
    /// the next development cycle.
    ///
    /// Returns the outcomes of both steps.
    pub fn finish(
        &self,
        create_branch: Option<String>,
        affect_remote: bool,
    ) -> Result<(ReleaseOutcome, ReleaseOutcome)> {
        let latest = self.latest_version(affect_remote)?;
        if !latest.is_rc() {
            self.speaker.warning(&BoundaryWarning::NotAPrerelease {
                version: latest.to_string(),
            });
            confirm_or_abort(self.prompter, "Are you sure you want to continue?")?;
        }

        let final_release = latest.with_prerelease(None);
        let released = self.release(
            &final_release,
            &ReleaseOptions {
                checkout: Some(latest.tag()),
                create_branch: None,
                affect_remote,
            },
            true,
        )?;

        let continued = self.incorporate_with(
            &ReleaseOptions {
                checkout: None,
                create_branch,
                affect_remote,
            },
            false,
            Incorporation::Continue,
        )?;

        Ok((released, continued))
    }

    fn incorporate_with(
        &self,
        options: &ReleaseOptions,
        fetch: bool,
        kind: Incorporation,
    ) -> Result<ReleaseOutcome> {
        let latest = self.latest_version(fetch)?;
        let version = latest.bump_patch()?.with_prerelease(Some(Prerelease::Dev));

        let create_branch = options.create_branch.clone().or_else(|| {
            options
                .checkout
                .is_none()
                .then(|| format!("{}-{}", kind.branch_prefix(), version))
        });

        self.release(
            &version,
            &ReleaseOptions {
                checkout: options.checkout.clone(),
                create_branch,
                affect_remote: options.affect_remote,
            },
            false,
        )
    }

    /// Update the project files for `version`, commit, and with `tag`
    /// create and offer to push the release tag.
    ///
    /// With both a checkout and a branch the checkout happens first, so
    /// `-b prepare-v0.1.2 -c v0.1.1-rc1` behaves like
    /// `git checkout -b prepare-v0.1.2 v0.1.1-rc1`.
    pub fn release(
        &self,
        version: &Version,
        options: &ReleaseOptions,
        tag: bool,
    ) -> Result<ReleaseOutcome> {
        self.enter(ReleaseState::ValidatingWorkingTree);
        if self.repo.is_dirty()? {
            return Err(ReleaseError::configuration(
                "working directory is not clean, stash or commit your changes",
            ));
        }

        self.enter(ReleaseState::ValidatingVersion);
        let latest = self.latest_version(options.affect_remote)?;
        self.confirm_transition(version, &latest)?;

        if let Some(checkout) = &options.checkout {
            self.repo.checkout(checkout)?;
            self.enter(ReleaseState::CheckedOut);
        }
        if let Some(branch) = &options.create_branch {
            self.repo.create_branch(branch)?;
        }

        self.enter(ReleaseState::ValidatingOnLatestPrerelease);
        self.confirm_on_latest_prerelease()?;

        self.enter(ReleaseState::EditingFiles);
        self.edit_files(version)?;

        self.enter(ReleaseState::UpdatingLockfile);
        self.speaker.status("Updating Cargo.lock");
        self.build.check(false)?;
        self.build.check(false)?;
        self.build.check(true)?;

        self.enter(ReleaseState::Committing);
        let the_tag = version.tag();
        if tag {
            self.repo
                .commit_all_changed(&format!("release: {}", the_tag))?;
            self.enter(ReleaseState::Tagging);
            self.repo.tag_annotated(&the_tag)?;
        } else {
            self.repo.commit_all_changed(&format!(
                "Prepare next phase of development: {}",
                the_tag
            ))?;
            self.offer_versions_list_update()?;
        }

        let pushed = if tag {
            self.publish_tag(&the_tag, options.affect_remote)?
        } else {
            let branch = self.repo.rev_parse("HEAD", true)?;
            self.speaker.say("");
            self.speaker
                .say(&format!("Create a PR with your branch: '{}'", branch));
            false
        };

        self.enter(ReleaseState::Done);
        Ok(ReleaseOutcome {
            version: version.clone(),
            tag: tag.then_some(the_tag),
            pushed,
        })
    }

    /// List the pull requests merged between two refs, sorted by url.
    ///
    /// An omitted `recent` is the newest version tag; an omitted `ancestor`
    /// is the release before `recent`.
    pub fn list_prs(
        &self,
        recent: Option<&str>,
        ancestor: Option<&str>,
        lookup: &dyn PullRequestLookup,
    ) -> Result<Vec<PullRequest>> {
        self.repo.fetch()?;
        let (recent_ref, ancestor_ref) = self.resolve_range(recent, ancestor)?;

        let entries = self.repo.log_range(&ancestor_ref, &recent_ref)?;
        let lines: Vec<String> = entries.iter().map(LogEntry::oneline).collect();
        let scan = scan_pull_requests(lines.iter().map(String::as_str));
        debug!(commits = lines.len(), pulls = scan.numbers.len(), "scanned commit range");

        if !scan.found_pullreq_ref {
            self.speaker.warning(&BoundaryWarning::PullreqsNotConfigured {
                upstream: self.config.project.upstream_repo.clone(),
            });
        }

        if scan.numbers.is_empty() {
            self.speaker.say(&format!(
                "No pull requests found in {}..{}",
                ancestor_ref, recent_ref
            ));
            return Ok(Vec::new());
        }

        lookup.lookup(self.prompter, &scan.numbers)
    }

    fn enter(&self, state: ReleaseState) {
        debug!(?state, "release state");
    }

    /// The newest version tag
    fn latest_version(&self, fetch: bool) -> Result<Version> {
        self.repo
            .get_version_tags(fetch)?
            .into_iter()
            .next()
            .ok_or_else(|| ReleaseError::configuration("No version tags found in this repository"))
    }

    fn confirm_transition(&self, version: &Version, latest: &Version) -> Result<()> {
        match confirm_version_is_next(version, latest) {
            Transition::Allowed { notice } => {
                if let Some(notice) = notice {
                    self.speaker.success(&notice);
                }
                Ok(())
            }
            Transition::NeedsConfirmation(question) => confirm_or_abort(self.prompter, &question),
            Transition::Rejected(reason) => Err(ReleaseError::rejected(reason)),
        }
    }

    /// Guards against releasing from e.g. rc1 when rc2 already exists.
    fn confirm_on_latest_prerelease(&self) -> Result<()> {
        let latest = self.latest_version(false)?.tag();
        if self.repo.is_ancestor(&latest, "HEAD")? {
            return Ok(());
        }

        let base = self.repo.describe()?;
        self.speaker
            .warning(&BoundaryWarning::NotOnLatestPrerelease { base, latest });
        confirm_or_abort(self.prompter, "Are you sure?")
    }

    fn edit_files(&self, version: &Version) -> Result<()> {
        let paths = &self.config.paths;
        let manifest = self.path(&paths.manifest);
        let license = self.path(&paths.license);

        files::change_line(&manifest, "version", &format!("version = \"{}\"", version))?;
        files::change_line(
            &license,
            "Licensed Work:",
            &format!(
                "Licensed Work:             {} Version {}",
                self.config.project.product_name, version
            ),
        )?;

        // Only prereleases carry new code, so only they move the change date
        if version.is_prerelease() {
            let change_date = files::format_change_date(files::four_years_hence(self.today)?);
            files::change_line(
                &license,
                "Change Date",
                &format!("Change Date:               {}", change_date),
            )?;
        }
        Ok(())
    }

    /// After a final release, offer to list it in the docs.
    fn offer_versions_list_update(&self) -> Result<()> {
        let latest = self.latest_version(false)?;
        if latest.is_prerelease() {
            return Ok(());
        }

        let doc_versions = &self.config.paths.doc_versions;
        let question = format!(
            "Update {} marking {} as released",
            doc_versions.display(),
            latest.tag()
        );
        if !self.prompter.confirm(&question)? {
            return Ok(());
        }

        files::update_versions_list(&self.path(doc_versions), &latest, self.today)?;
        self.repo.commit_all_changed(&format!(
            "Update released versions to include {}",
            latest.tag()
        ))
    }

    /// Returns whether the tag was pushed.
    fn publish_tag(&self, tag: &str, affect_remote: bool) -> Result<bool> {
        let upstream = &self.config.project.upstream_repo;
        let Some(remote) = self.repo.first_remote_matching(upstream)? else {
            self.say_next_step(tag);
            return Ok(false);
        };

        self.enter(ReleaseState::PublishingRemote);
        self.speaker.say(&self.repo.show_head()?);
        if !affect_remote {
            self.say_next_step(tag);
            return Ok(false);
        }

        let question = format!(
            "\nWould you like to push the above changes as: git push {} {}",
            remote, tag
        );
        if !self.prompter.confirm(&question)? {
            return Ok(false);
        }

        match self.repo.push_tag(&remote, tag) {
            Ok(()) => {
                self.speaker
                    .success(&format!("Pushed {} to {}", tag, remote));
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, %remote, tag, "push failed");
                self.speaker.warning(&BoundaryWarning::PushFailed {
                    remote,
                    tag: tag.to_string(),
                    reason: e.to_string(),
                });
                Ok(false)
            }
        }
    }

    fn say_next_step(&self, tag: &str) {
        self.speaker.say("");
        self.speaker.say(&format!(
            "Next step is to push {} to the {} repo",
            tag, self.config.project.upstream_repo
        ));
    }

    /// Picks the `(recent, ancestor)` refs for `list_prs`, announcing any
    /// that were derived from the version tags.
    fn resolve_range(
        &self,
        recent: Option<&str>,
        ancestor: Option<&str>,
    ) -> Result<(String, String)> {
        if let (Some(recent), Some(ancestor)) = (recent, ancestor) {
            return Ok((ref_name(recent), ref_name(ancestor)));
        }

        let tags = self.repo.get_version_tags(false)?;
        let (recent_version, recent_ref) = match recent {
            Some(recent) => (Version::parse(recent).ok(), ref_name(recent)),
            None => {
                let newest = tags.first().ok_or_else(|| {
                    ReleaseError::configuration("No version tags found in this repository")
                })?;
                (Some(newest.clone()), newest.tag())
            }
        };

        let ancestor_ref = match ancestor {
            Some(ancestor) => ref_name(ancestor),
            None => {
                let recent_version = recent_version.ok_or_else(|| {
                    ReleaseError::configuration(format!(
                        "Cannot find the release before '{}', it is not a version",
                        recent_ref
                    ))
                })?;
                previous_release(&tags, &recent_version)
                    .map(Version::tag)
                    .ok_or_else(|| {
                        ReleaseError::configuration(format!(
                            "No release before {} to compare against",
                            recent_ref
                        ))
                    })?
            }
        };

        self.speaker.say(&format!(
            "Using recent_ref={}  ancestor_ref={}",
            recent_ref, ancestor_ref
        ));
        Ok((recent_ref, ancestor_ref))
    }

    fn path(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}

/// Versions are written as their tag; any other ref is used as given.
fn ref_name(reference: &str) -> String {
    match Version::parse(reference) {
        Ok(version) => version.tag(),
        Err(_) => reference.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_name() {
        assert_eq!(ref_name("0.5.0"), "v0.5.0");
        assert_eq!(ref_name("v0.5.1-rc2"), "v0.5.1-rc2");
        assert_eq!(ref_name("origin/main"), "origin/main");
        assert_eq!(ref_name("HEAD~3"), "HEAD~3");
    }

    #[test]
    fn test_default_options_affect_remote() {
        let options = ReleaseOptions::default();
        assert!(options.affect_remote);
        assert!(options.checkout.is_none());
        assert!(options.create_branch.is_none());
    }

    #[test]
    fn test_branch_prefixes() {
        assert_eq!(Incorporation::Prepare.branch_prefix(), "prepare");
        assert_eq!(Incorporation::Continue.branch_prefix(), "continue");
    }
}
