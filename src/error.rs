//! Typed failure conditions.
//!
//! Every fallible operation in this crate returns one of these variants so
//! callers can tell a missing tracking entry from a rejected push without
//! inspecting message strings.

use thiserror::Error;

/// Failure conditions surfaced by the sync workflow.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The commit range was empty or one of its endpoints did not resolve.
    #[error("commit range '{range}' could not be resolved: {detail}")]
    DataUnavailable { range: String, detail: String },

    /// The tracking file has no entry for the requested downstream branch.
    #[error("branch '{key}' is not tracked; refusing to add a new entry")]
    KeyNotFound { key: String },

    /// The tracking file contains unresolved merge conflict markers.
    #[error("unresolved merge conflict marker on line {line}; resolve it manually before rerunning")]
    ConflictDetected { line: usize },

    /// An external command exited non-zero or could not be spawned.
    #[error("`{command}` failed (exit code {status}): {stderr}")]
    ExternalCommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    /// The remote rejected a push, typically because the branch already
    /// exists with different commits.
    #[error("push of '{branch}' rejected by remote: {stderr}")]
    NetworkRejected { branch: String, stderr: String },

    /// A branch name failed ref validation.
    #[error("invalid branch name: {name:?}")]
    InvalidRef { name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
