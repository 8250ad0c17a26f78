use crate::domain::Version;

/// Represents a git tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
}

impl Tag {
    /// Create a new tag from a string
    pub fn new(name: impl Into<String>) -> Self {
        Tag { name: name.into() }
    }

    /// The version this tag names, if it is a version tag at all
    pub fn version(&self) -> Option<Version> {
        if !self.name.starts_with('v') {
            return None;
        }
        Version::parse(&self.name).ok()
    }
}

/// Collects the version tags out of a list of tag names, newest first.
///
/// Tags that are not `v<version>` are skipped.
pub fn version_tags<I, S>(names: I) -> Vec<Version>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut versions: Vec<Version> = names
        .into_iter()
        .filter_map(|name| Tag::new(name.as_ref()).version())
        .collect();
    versions.sort_by(|a, b| b.cmp(a));
    versions.dedup();
    versions
}

/// The first tag older than `recent` that is a different release, i.e. whose
/// major, minor or patch is lower. Release candidates of `recent`'s own
/// triple are passed over.
///
/// `tags` must be sorted newest first.
pub fn previous_release<'a>(tags: &'a [Version], recent: &Version) -> Option<&'a Version> {
    tags.iter().skip(1).find(|candidate| {
        candidate.major < recent.major
            || candidate.minor < recent.minor
            || candidate.patch < recent.patch
    })
}
