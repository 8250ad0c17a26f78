//! Line-level edits of the version-bearing files

use crate::domain::Version;
use crate::error::{ReleaseError, Result};
use chrono::{Datelike, NaiveDate};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Line after which new entries are inserted into the docs version list
pub const VERSIONS_MARKER: &str = "versions = [";

/// Replaces the single line of `path` that starts with `line_start`.
///
/// Exactly one line must match; otherwise the file is left untouched and a
/// configuration error reports how many did.
pub fn change_line(path: &Path, line_start: &str, replacement: &str) -> Result<()> {
    let content = fs::read_to_string(path)?;
    let mut lines: Vec<&str> = content.lines().collect();

    let matches: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.starts_with(line_start))
        .map(|(i, _)| i)
        .collect();

    if matches.len() != 1 {
        return Err(ReleaseError::configuration(format!(
            "Found {} {}s in {}",
            matches.len(),
            line_start,
            path.display()
        )));
    }

    lines[matches[0]] = replacement;
    debug!(path = %path.display(), replacement, "changed line");
    write_lines(path, &lines)
}

/// Adds `released` to the documentation's list of versions, right after
/// the `versions = [` line.
pub fn update_versions_list(path: &Path, released: &Version, today: NaiveDate) -> Result<()> {
    let content = fs::read_to_string(path)?;
    let entry = format!(
        "  {{ name = \"{}\", date = \"{}\" }},",
        released.tag(),
        today.format("%d %B %Y")
    );

    let mut lines: Vec<&str> = Vec::new();
    let mut wrote_line = false;
    for line in content.lines() {
        lines.push(line);
        if line == VERSIONS_MARKER {
            lines.push(&entry);
            wrote_line = true;
        }
    }

    if !wrote_line {
        return Err(ReleaseError::runtime(format!(
            "Couldn't determine where to insert new version in {}",
            path.display()
        )));
    }
    write_lines(path, &lines)
}

/// The same calendar day four years from `today`. A leap day whose target
/// year has no February 29 becomes February 28.
pub fn four_years_hence(today: NaiveDate) -> Result<NaiveDate> {
    let year = today.year() + 4;
    today
        .with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))
        .ok_or_else(|| ReleaseError::runtime(format!("No date four years after {}", today)))
}

/// Date format used on the license's "Change Date" line
pub fn format_change_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

fn write_lines(path: &Path, lines: &[&str]) -> Result<()> {
    let mut out = lines.join("\n");
    out.push('\n');
    fs::write(path, out)?;
    Ok(())
}
