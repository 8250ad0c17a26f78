//! Rules for which version may follow the latest tag
//!
//! Both functions are pure: they never prompt or print. The orchestrator
//! decides what to do with a [`Transition`].

use crate::domain::{Level, Prerelease, Version};
use crate::error::{ReleaseError, Result};

/// Outcome of checking a proposed version against the latest tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The proposed version is a regular successor. `notice` carries a
    /// message worth showing the operator, if any.
    Allowed { notice: Option<String> },
    /// Legal but unusual; the operator has to approve it
    NeedsConfirmation(String),
    /// Never legal; the release must stop
    Rejected(String),
}

impl Transition {
    fn allowed() -> Self {
        Transition::Allowed { notice: None }
    }
}

/// Computes the version a new release candidate cycle starts at.
///
/// `Rc` requires `latest` to already be a release candidate.
pub fn next_version(latest: &Version, level: Level) -> Result<Version> {
    let first_rc = Some(Prerelease::Rc(1));
    match level {
        Level::Rc => {
            let next = latest
                .prerelease
                .and_then(|pre| pre.next_rc())
                .ok_or_else(|| {
                    ReleaseError::configuration(
                        "Attempted to bump an rc version without starting an RC",
                    )
                })?;
            Ok(latest.with_prerelease(Some(next)))
        }
        Level::Biweekly => Ok(latest.bump_patch()?.with_prerelease(first_rc)),
        Level::Feature => Ok(latest.bump_minor()?.with_prerelease(first_rc)),
        Level::Major => Ok(latest.bump_major()?.with_prerelease(first_rc)),
    }
}

/// Checks whether `proposed` is the logical next version after `latest`.
///
/// The cases are evaluated in a fixed order and the first match wins. The
/// major component is not consulted.
pub fn confirm_version_is_next(proposed: &Version, latest: &Version) -> Transition {
    if proposed.minor == latest.minor {
        let same_patch = proposed.patch == latest.patch;
        let next_patch = latest
            .patch
            .checked_add(1)
            .map_or(false, |patch| proposed.patch == patch);

        if same_patch && proposed.is_prerelease() && latest.is_prerelease() {
            // rc bump
            Transition::allowed()
        } else if next_patch && proposed.is_prerelease() && !latest.is_prerelease() {
            // first rc
            Transition::allowed()
        } else if same_patch && !proposed.is_prerelease() && latest.is_prerelease() {
            Transition::Allowed {
                notice: Some("Congratulations on the successful release!".to_string()),
            }
        } else if next_patch && proposed.prerelease == Some(Prerelease::Dev) {
            // prepare next
            Transition::allowed()
        } else {
            Transition::Rejected(format!(
                "{} is not the next release after {}",
                proposed, latest
            ))
        }
    } else if latest.minor.checked_add(1) == Some(proposed.minor) && proposed.patch == 0 {
        Transition::NeedsConfirmation(
            "Are you sure you want to bump the minor version?".to_string(),
        )
    } else {
        Transition::NeedsConfirmation(format!(
            "The bump {} -> {} is suspicious, are you sure?",
            latest, proposed
        ))
    }
}
