use std::path::Path;

use regex::Regex;
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::error::Error;
use crate::types::{RoleOccurrence, SourceRef};

/// Build the pattern matching ``:<role>:`<target>` ``.
///
/// # Errors
///
/// Returns `Error::InvalidRoleName` if the role is empty or contains
/// characters that cannot appear in a role name.
pub fn role_pattern(role: &str) -> Result<Regex, Error> {
    let invalid = |reason: &str| {
        return Error::InvalidRoleName {
            reason: reason.to_string(),
            role: role.to_string(),
        };
    };

    if role.is_empty() {
        return Err(invalid("empty"));
    }
    if role.chars().any(|c| return c == ':' || c == '`' || c.is_whitespace()) {
        return Err(invalid("contains `:`, a backtick, or whitespace"));
    }

    return Regex::new(&format!(r":{}:`([^`]+)`", regex::escape(role)))
        .map_err(|e| return invalid(&e.to_string()));
}

/// Scan all documentation files under `root` and extract role occurrences.
/// Applies the config's extension and include/exclude filters. Hidden
/// directories are skipped. Results are sorted by file, line, then column.
///
/// # Errors
///
/// Returns `Error::InvalidRoleName` for a bad configured role, or
/// `Error::Io` if a documentation file cannot be read.
pub fn scan(root: &Path, config: &Config) -> Result<Vec<RoleOccurrence>, Error> {
    let pattern = role_pattern(&config.role)?;
    let mut occurrences = Vec::new();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| return !is_hidden_dir(e))
        .filter_map(Result::ok)
        .filter(|e| return e.file_type().is_file())
    {
        let doc_path = entry.path();
        let relative = doc_path.strip_prefix(root).unwrap_or(doc_path);
        if !config.should_scan(relative) {
            continue;
        }

        let content = std::fs::read_to_string(doc_path)?;
        extract_roles(&content, relative, &pattern, &mut occurrences);
    }

    occurrences.sort_by(|a, b| return a.source.cmp(&b.source));
    tracing::debug!(count = occurrences.len(), root = %root.display(), "scanned documentation");
    return Ok(occurrences);
}

/// Extract every role from file content, with one-based positions.
pub fn extract_roles(content: &str, source: &Path, pattern: &Regex, out: &mut Vec<RoleOccurrence>) {
    for (line_idx, line) in content.lines().enumerate() {
        let line_number = u32::try_from(line_idx).unwrap_or(u32::MAX).saturating_add(1);
        for cap in pattern.captures_iter(line) {
            let (Some(whole), Some(target)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            let column = line.get(..whole.start()).map_or(0, |prefix| return prefix.chars().count());
            out.push(RoleOccurrence {
                raw: target.as_str().to_string(),
                source: SourceRef {
                    column: u32::try_from(column).unwrap_or(u32::MAX).saturating_add(1),
                    file: source.to_path_buf(),
                    line: line_number,
                },
            });
        }
    }
}

/// Dot-directories below the root (`.git`, `.venv`, ...).
fn is_hidden_dir(entry: &DirEntry) -> bool {
    return entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_string_lossy().starts_with('.');
}
