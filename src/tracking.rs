//! Tracking file updates.
//!
//! The tracking file is line-oriented: each relevant line maps one
//! downstream branch to one upstream commit hash, `branch=hash`. Blank
//! lines and `#` comments pass through unchanged. The updater rewrites
//! exactly one value; it refuses to touch a file with unresolved merge
//! conflict markers and never appends a missing entry.

use crate::constants::TRACKING_SEPARATOR;
use crate::error::{Result, SyncError};
use std::path::Path;

pub fn load(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

pub fn store(path: &Path, contents: &str) -> Result<()> {
    Ok(std::fs::write(path, contents)?)
}

/// Returns the hash currently recorded for `key`.
pub fn recorded_hash(contents: &str, key: &str) -> Result<String> {
    check_conflicts(contents)?;
    contents
        .lines()
        .filter_map(entry)
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
        .ok_or_else(|| SyncError::KeyNotFound {
            key: key.to_string(),
        })
}

/// Returns the file contents with exactly the `key` entry's value replaced.
///
/// Idempotent: applying the same `(key, hash)` twice yields the same output
/// as applying it once. All other lines and their ordering are preserved.
pub fn updated_contents(contents: &str, key: &str, new_hash: &str) -> Result<String> {
    check_conflicts(contents)?;

    let mut out = String::with_capacity(contents.len());
    let mut replaced = false;

    for raw in contents.split_inclusive('\n') {
        let line = raw.trim_end_matches('\n').trim_end_matches('\r');
        let suffix = &raw[line.len()..];
        match entry(line) {
            Some((k, _)) if k == key => {
                out.push_str(k);
                out.push(TRACKING_SEPARATOR);
                out.push_str(new_hash);
                out.push_str(suffix);
                replaced = true;
            }
            _ => out.push_str(raw),
        }
    }

    if !replaced {
        return Err(SyncError::KeyNotFound {
            key: key.to_string(),
        });
    }
    Ok(out)
}

/// Parses one line into a `(branch, hash)` entry. Comments, blank lines and
/// lines without the separator are not entries.
fn entry(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let (key, value) = trimmed.split_once(TRACKING_SEPARATOR)?;
    Some((key.trim(), value.trim()))
}

/// Fails with the first conflicting line when the file carries unresolved
/// merge markers. No write is attempted in that case.
fn check_conflicts(contents: &str) -> Result<()> {
    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.starts_with("<<<<<<<")
            || line.starts_with(">>>>>>>")
            || line.starts_with("|||||||")
            || line == "======="
        {
            return Err(SyncError::ConflictDetected { line: idx + 1 });
        }
    }
    Ok(())
}
