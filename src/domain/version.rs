use crate::domain::Prerelease;
use crate::error::{ReleaseError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Release version: `major.minor.patch` with an optional `dev`/`rcN` suffix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<Prerelease>,
}

impl Version {
    /// Create a new final (non-prerelease) version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            prerelease: None,
        }
    }

    /// Parse a version from text, with or without the tag prefix
    /// (e.g. "v1.2.3-rc1" -> Version(1,2,3,rc1))
    pub fn parse(text: &str) -> Result<Self> {
        let clean = text.strip_prefix('v').unwrap_or(text);

        let parsed = semver::Version::parse(clean).map_err(|e| {
            ReleaseError::version(format!("Invalid version '{}': {}", text, e))
        })?;

        if !parsed.build.is_empty() {
            return Err(ReleaseError::version(format!(
                "Invalid version '{}': build metadata is not supported",
                text
            )));
        }

        let prerelease = if parsed.pre.is_empty() {
            None
        } else {
            Some(parsed.pre.as_str().parse::<Prerelease>()?)
        };

        Ok(Version {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            prerelease,
        })
    }

    pub fn bump_major(&self) -> Result<Self> {
        Ok(Version::new(increment(self.major, "major")?, 0, 0))
    }

    pub fn bump_minor(&self) -> Result<Self> {
        Ok(Version::new(self.major, increment(self.minor, "minor")?, 0))
    }

    pub fn bump_patch(&self) -> Result<Self> {
        Ok(Version::new(
            self.major,
            self.minor,
            increment(self.patch, "patch")?,
        ))
    }

    /// Copy of this version with the pre-release suffix replaced (or cleared)
    pub fn with_prerelease(&self, prerelease: Option<Prerelease>) -> Self {
        Version {
            prerelease,
            ..self.clone()
        }
    }

    /// Tag name for this version, e.g. "v1.2.3-rc1"
    pub fn tag(&self) -> String {
        format!("v{}", self)
    }

    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    pub fn is_rc(&self) -> bool {
        self.prerelease.map_or(false, |p| p.is_rc())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Version {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

fn increment(component: u64, name: &str) -> Result<u64> {
    component.checked_add(1).ok_or_else(|| {
        ReleaseError::version(format!("Cannot bump {} version past {}", name, component))
    })
}

/// Which part of the version a new release candidate cycle changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Level {
    /// The X in X.Y.Z
    Major,
    /// The Y in X.Y.Z
    Feature,
    /// The Z in X.Y.Z
    Biweekly,
    /// The N in -rcN, for a second or later release candidate
    Rc,
}
