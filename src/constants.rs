//! Application-wide constants.
//!
//! Centralized configuration values to avoid magic numbers throughout the codebase.

/// Default name of the tracking file inside the downstream repository.
pub const DEFAULT_TRACKING_FILE: &str = "related_commits";

/// Default remote used for fetch, branch creation and push.
pub const DEFAULT_REMOTE: &str = "origin";

/// Default pause between batch items, in seconds.
/// Keeps sequential runs from hammering the hosting platform.
pub const DEFAULT_PAUSE_SECS: u64 = 5;

/// Prefix for the deterministically named update branch.
pub const UPDATE_BRANCH_PREFIX: &str = "update-pin";

/// Commit hashes are abbreviated to this many characters in branch names,
/// messages and summaries.
pub const SHORT_HASH_LEN: usize = 12;

/// Progress bar tick interval in milliseconds.
pub const PROGRESS_TICK_MS: u64 = 80;

/// Separator between branch and hash in a tracking file entry.
pub const TRACKING_SEPARATOR: char = '=';
