use std::fmt;

/// Unusual situations during a release that are reported to the operator
/// but do not stop it on their own.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// `finish` was asked to finalize a version that is not a release candidate
    NotAPrerelease { version: String },
    /// HEAD does not descend from the newest known prerelease tag
    NotOnLatestPrerelease { base: String, latest: String },
    /// No commit in the range was decorated with a `refs/pullreqs/*` ref
    PullreqsNotConfigured { upstream: String },
    /// The tag exists locally but could not be pushed
    PushFailed {
        remote: String,
        tag: String,
        reason: String,
    },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NotAPrerelease { version } => {
                write!(f, "This version: {} doesn't look like a prerelease", version)
            }
            BoundaryWarning::NotOnLatestPrerelease { base, latest } => {
                write!(
                    f,
                    "You are about to create a release based on: {}\n\
                     Which is not the latest prerelease:         {}",
                    base, latest
                )
            }
            BoundaryWarning::PullreqsNotConfigured { upstream } => {
                write!(
                    f,
                    "you probably don't have pullreqs configured for your repo\n\
                     Add the following line to the {} remote section in your .git/config\n  \
                     fetch = +refs/pull/*/head:refs/pullreqs/*",
                    upstream
                )
            }
            BoundaryWarning::PushFailed {
                remote,
                tag,
                reason,
            } => {
                write!(
                    f,
                    "Could not push {} to '{}': {}\nTo push this tag later, run:\n  git push {} {}",
                    tag, remote, reason, remote, tag
                )
            }
        }
    }
}
