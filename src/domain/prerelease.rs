//! Pre-release suffixes used by the release process
//!
//! Only two shapes exist: `dev`, marking the development cycle after a
//! release, and `rcN`, the N-th release candidate (N >= 1).

use crate::error::{ReleaseError, Result};
use std::fmt;
use std::str::FromStr;

/// Pre-release suffix of a version
///
/// Variant order is the sort order: `dev` sorts below every release
/// candidate, and candidates compare by number (`rc2 < rc10`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Prerelease {
    /// Development version (`dev`)
    Dev,
    /// Release candidate (`rcN`)
    Rc(u32),
}

impl Prerelease {
    /// Parse a pre-release suffix from a string
    ///
    /// Accepts exactly `dev` or `rc` followed by a positive decimal number.
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    pub fn is_rc(&self) -> bool {
        matches!(self, Prerelease::Rc(_))
    }

    /// The release candidate after this one, if this is a release candidate
    pub fn next_rc(&self) -> Option<Self> {
        match self {
            Prerelease::Rc(n) => n.checked_add(1).map(Prerelease::Rc),
            Prerelease::Dev => None,
        }
    }
}

impl FromStr for Prerelease {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "dev" {
            return Ok(Prerelease::Dev);
        }

        let invalid =
            || ReleaseError::version(format!("Invalid pre-release identifier: '{}'", s));

        let digits = s.strip_prefix("rc").ok_or_else(invalid)?;
        // no leading zeros, so that rendering gives back the same text
        if digits.starts_with('0') || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        digits.parse::<u32>().map(Prerelease::Rc).map_err(|_| invalid())
    }
}

impl fmt::Display for Prerelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prerelease::Dev => write!(f, "dev"),
            Prerelease::Rc(n) => write!(f, "rc{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dev() {
        assert_eq!(Prerelease::parse("dev").unwrap(), Prerelease::Dev);
    }

    #[test]
    fn test_parse_rc() {
        assert_eq!(Prerelease::parse("rc1").unwrap(), Prerelease::Rc(1));
        assert_eq!(Prerelease::parse("rc12").unwrap(), Prerelease::Rc(12));
    }

    #[test]
    fn test_parse_invalid() {
        for input in ["", "rc", "rc0", "rc01", "rc-1", "rc1a", "beta", "DEV", "rc.1", "alpha1"] {
            assert!(
                Prerelease::parse(input).is_err(),
                "'{}' should not parse",
                input
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Prerelease::Dev.to_string(), "dev");
        assert_eq!(Prerelease::Rc(3).to_string(), "rc3");
    }

    #[test]
    fn test_ordering() {
        assert!(Prerelease::Dev < Prerelease::Rc(1));
        assert!(Prerelease::Rc(1) < Prerelease::Rc(2));
        assert!(Prerelease::Rc(2) < Prerelease::Rc(10));
    }

    #[test]
    fn test_next_rc() {
        assert_eq!(Prerelease::Rc(1).next_rc(), Some(Prerelease::Rc(2)));
        assert_eq!(Prerelease::Dev.next_rc(), None);
        assert!(Prerelease::Rc(4).is_rc());
        assert!(!Prerelease::Dev.is_rc());
    }
}
