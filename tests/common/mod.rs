//! Test infrastructure for repin integration tests.

use anyhow::Result;
use repin::config::{Config, Verbosity};
use repin::git::{self, no_op_logger};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Runs a git command in a test repository.
pub fn run(repo: &Path, args: &[&str]) -> Result<String> {
    Ok(git::run_git(repo, args, no_op_logger)?)
}

/// A temporary git repository for testing.
/// Automatically cleaned up when dropped.
pub struct TestRepo {
    _temp_dir: TempDir,
    path: PathBuf,
}

impl TestRepo {
    /// Creates a new test repository with an initial commit on the given branch.
    pub fn new(initial_branch: &str) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();

        run(&path, &["init", "-b", initial_branch])?;
        run(&path, &["config", "user.email", "test@example.com"])?;
        run(&path, &["config", "user.name", "Test User"])?;

        std::fs::write(path.join("README.md"), "# Test Repo\n")?;
        run(&path, &["add", "README.md"])?;
        run(&path, &["commit", "-m", "Initial commit"])?;

        Ok(Self {
            _temp_dir: temp_dir,
            path,
        })
    }

    /// Creates a test repository with a configured `origin` remote.
    /// Returns the repo and the remote TempDir (must be kept alive).
    pub fn with_remote(initial_branch: &str) -> Result<(Self, TempDir)> {
        let remote_dir = TempDir::new()?;
        run(remote_dir.path(), &["init", "--bare"])?;

        let local = Self::new(initial_branch)?;

        run(
            &local.path,
            &["remote", "add", "origin", remote_dir.path().to_str().unwrap()],
        )?;
        run(&local.path, &["push", "-u", "origin", initial_branch])?;

        Ok((local, remote_dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn head(&self) -> Result<String> {
        Ok(git::rev_parse(&self.path, "HEAD", no_op_logger)?)
    }

    pub fn current_branch(&self) -> Result<String> {
        Ok(git::get_current_branch(&self.path, no_op_logger)?)
    }

    /// Writes a file and commits it, returning the new head hash.
    pub fn commit_file(&self, name: &str, contents: &str, message: &str) -> Result<String> {
        std::fs::write(self.path.join(name), contents)?;
        run(&self.path, &["add", name])?;
        run(&self.path, &["commit", "-m", message])?;
        self.head()
    }

    pub fn read_file(&self, name: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.path.join(name))?)
    }

    pub fn make_dirty(&self) -> Result<()> {
        std::fs::write(self.path.join("README.md"), "# Test Repo (edited)\n")?;
        Ok(())
    }

    pub fn has_stash(&self) -> Result<bool> {
        Ok(!run(&self.path, &["stash", "list"])?.is_empty())
    }

    pub fn branch_exists(&self, branch: &str) -> Result<bool> {
        Ok(git::local_branch_exists(&self.path, branch, no_op_logger)?)
    }

    pub fn remote_branch_head(&self, branch: &str) -> Result<Option<String>> {
        let output = run(&self.path, &["ls-remote", "origin", &format!("refs/heads/{branch}")])?;
        Ok(output
            .split_whitespace()
            .next()
            .map(str::to_string))
    }

    pub fn last_commit_message(&self) -> Result<String> {
        run(&self.path, &["log", "-1", "--pretty=%B"])
    }
}

/// A downstream/upstream repository pair wired for the sync workflow:
/// both have `origin` remotes, and the downstream tracking file pins the
/// upstream's initial head.
pub struct SyncFixture {
    pub downstream: TestRepo,
    pub upstream: TestRepo,
    _downstream_remote: TempDir,
    _upstream_remote: TempDir,
    pub config: Config,
    pub pinned: String,
}

impl SyncFixture {
    pub fn new(downstream_branch: &str, upstream_branch: &str) -> Result<Self> {
        let (upstream, upstream_remote) = TestRepo::with_remote(upstream_branch)?;
        let pinned = upstream.head()?;

        let (downstream, downstream_remote) = TestRepo::with_remote(downstream_branch)?;
        downstream.commit_file(
            "related_commits",
            &format!("{downstream_branch}={pinned}\n"),
            "Track upstream pin",
        )?;
        run(downstream.path(), &["push", "origin", downstream_branch])?;

        let config = Config {
            downstream_repo: downstream.path().to_path_buf(),
            upstream_repo: upstream.path().to_path_buf(),
            downstream_url: Some("https://github.com/example/downstream".to_string()),
            upstream_url: Some("https://github.com/example/upstream".to_string()),
            pause: Duration::ZERO,
            verbosity: Verbosity::Quiet,
            ..Config::default()
        };

        Ok(Self {
            downstream,
            upstream,
            _downstream_remote: downstream_remote,
            _upstream_remote: upstream_remote,
            config,
            pinned,
        })
    }

    pub fn tracking_contents(&self) -> Result<String> {
        self.downstream.read_file("related_commits")
    }
}
