//! Command workflows, independent of argument parsing

pub mod orchestration;

pub use orchestration::{ReleaseOptions, ReleaseOutcome, Releaser};
