//! Domain logic - pure versioning rules independent of git operations

pub mod prerelease;
pub mod tag;
pub mod transition;
pub mod version;

pub use prerelease::Prerelease;
pub use tag::{previous_release, version_tags, Tag};
pub use transition::{confirm_version_is_next, next_version, Transition};
pub use version::{Level, Version};
