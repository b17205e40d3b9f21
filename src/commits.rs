//! Commit log parsing.
//!
//! Turns a range of upstream history into [`CommitRecord`]s, pulling out the
//! merged-PR number from squash-merge subjects and any "Fixes" references
//! from commit bodies. Commits without either annotation are the common
//! case, not an error.

use crate::error::{Result, SyncError};
use crate::git::{self, GitLogger};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Squash-merge subject suffix, e.g. `Fix test_gelu unit test (#269)`.
/// Only this exact shape counts as the commit's PR number.
static MERGED_PR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(#(\d+)\)\s*$").unwrap());

/// `Fixes #123`, `Fixes: <url>`, `fixed https://...`; case-insensitive,
/// optional colon, optional angle bracket around a URL.
static FIXES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfix(?:es|ed)\s*:?\s*<?(#\d+|https?://[^\s>]+)").unwrap());

/// Field and record separators used in the `git log` pretty format, chosen so
/// multi-line commit bodies never break record boundaries.
const FIELD_SEP: char = '\x1f';
const RECORD_SEP: char = '\x1e';

/// One upstream commit, immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Full commit hash.
    pub hash: String,
    /// Full commit message, subject line included.
    pub message: String,
    /// PR number from the subject's squash-merge suffix, when present.
    pub pr_number: Option<u64>,
    /// "Fixes" references in order of appearance in the message.
    pub fixes: Vec<String>,
}

impl CommitRecord {
    /// First line of the commit message.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }

    pub fn short_hash(&self) -> &str {
        git::short(&self.hash)
    }
}

/// Collects the commits in `old` (exclusive) .. `new` (inclusive),
/// oldest first.
///
/// Fails with [`SyncError::DataUnavailable`] when the range is empty or
/// either endpoint does not resolve.
pub fn collect_range(
    repo: &Path,
    old: &str,
    new: &str,
    log: GitLogger,
) -> Result<Vec<CommitRecord>> {
    let range = format!("{old}..{new}");
    let raw = git::log_range(repo, &range, log).map_err(|e| SyncError::DataUnavailable {
        range: range.clone(),
        detail: e.to_string(),
    })?;

    let mut records = parse_log(&raw);
    if records.is_empty() {
        return Err(SyncError::DataUnavailable {
            range,
            detail: "no commits in range".to_string(),
        });
    }

    // git log emits newest first; callers reason oldest first.
    records.reverse();
    Ok(records)
}

/// Parses raw `%H%x1f%B%x1e` log output, newest first as git emits it.
fn parse_log(raw: &str) -> Vec<CommitRecord> {
    raw.split(RECORD_SEP)
        .filter_map(|entry| parse_record(entry.trim_matches(['\n', ' '])))
        .collect()
}

fn parse_record(entry: &str) -> Option<CommitRecord> {
    let (hash, message) = entry.split_once(FIELD_SEP)?;
    let hash = hash.trim();
    if hash.is_empty() {
        return None;
    }
    let message = message.trim_end().to_string();

    let pr_number = extract_pr_number(message.lines().next().unwrap_or_default());
    let fixes = extract_fixes(&message);

    Some(CommitRecord {
        hash: hash.to_string(),
        message,
        pr_number,
        fixes,
    })
}

/// Extracts the PR number from a subject line, only when it matches the
/// recognized merged-PR pattern exactly.
fn extract_pr_number(subject: &str) -> Option<u64> {
    MERGED_PR_RE
        .captures(subject)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Extracts "Fixes" references from a full commit message, preserving their
/// order of appearance.
fn extract_fixes(message: &str) -> Vec<String> {
    FIXES_RE
        .captures_iter(message)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';']).to_string())
        .collect()
}
