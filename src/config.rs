//! Configuration types for the sync run.
//!
//! Everything the workflow needs to know (repository paths, remote name,
//! toggles) lives in one explicit struct passed into each component. There
//! is no ambient global state.

use crate::constants::{DEFAULT_PAUSE_SECS, DEFAULT_REMOTE, DEFAULT_TRACKING_FILE};
use crate::git::{self, GitLogger};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration derived from CLI arguments.
#[derive(Debug, Clone)]
pub struct Config {
    /// Working copy whose tracking file is rewritten.
    pub downstream_repo: PathBuf,
    /// Working copy whose history supplies the new pin.
    pub upstream_repo: PathBuf,
    /// Tracking file name, relative to the downstream repository root.
    pub tracking_file: String,
    /// Remote used for fetch, branch creation and push in both repositories.
    pub remote: String,
    /// Downstream hosting URL for compare links. Derived from the remote
    /// when not set explicitly.
    pub downstream_url: Option<String>,
    /// Upstream hosting URL for PR links in generated messages.
    pub upstream_url: Option<String>,
    /// Create the update branch and commit the rewritten tracking file.
    pub create_branch: bool,
    /// Push the update branch to the remote.
    pub push: bool,
    /// Open a pull request via the `gh` CLI.
    pub create_pr: bool,
    /// Open review pages in the default browser after the run.
    pub open_browser: bool,
    /// Leave local modifications in place instead of stashing around checkouts.
    pub keep_local_changes: bool,
    /// Pause inserted between batch items.
    pub pause: Duration,
    /// Controls the verbosity level of CLI output.
    pub verbosity: Verbosity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            downstream_repo: PathBuf::new(),
            upstream_repo: PathBuf::new(),
            tracking_file: DEFAULT_TRACKING_FILE.to_string(),
            remote: DEFAULT_REMOTE.to_string(),
            downstream_url: None,
            upstream_url: None,
            create_branch: false,
            push: false,
            create_pr: false,
            open_browser: false,
            keep_local_changes: false,
            pause: Duration::from_secs(DEFAULT_PAUSE_SECS),
            verbosity: Verbosity::default(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Returns the appropriate git logger based on verbosity settings.
    ///
    /// Config controls which logger function to use, but doesn't implement
    /// logging itself; the actual echoing happens in the git module.
    #[must_use]
    pub fn git_logger(&self) -> GitLogger {
        if self.is_verbose() {
            git::verbose_logger
        } else {
            git::no_op_logger
        }
    }
}

/// Verbosity level for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git;

    #[test]
    fn test_config_quiet_and_verbose_flags() {
        let quiet = Config {
            verbosity: Verbosity::Quiet,
            ..Config::default()
        };
        assert!(quiet.is_quiet());
        assert!(!quiet.is_verbose());

        let verbose = Config {
            verbosity: Verbosity::Verbose,
            ..Config::default()
        };
        assert!(!verbose.is_quiet());
        assert!(verbose.is_verbose());
    }

    #[test]
    fn test_git_logger_selects_verbose_or_no_op() {
        let verbose = Config {
            verbosity: Verbosity::Verbose,
            ..Config::default()
        };
        assert!(std::ptr::fn_addr_eq(
            verbose.git_logger() as GitLogger,
            git::verbose_logger as GitLogger
        ));

        let normal = Config::default();
        assert!(std::ptr::fn_addr_eq(
            normal.git_logger() as GitLogger,
            git::no_op_logger as GitLogger
        ));
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.tracking_file, "related_commits");
        assert_eq!(config.remote, "origin");
        assert_eq!(config.pause, Duration::from_secs(5));
        assert!(!config.create_branch);
        assert!(!config.push);
        assert!(!config.create_pr);
    }
}
