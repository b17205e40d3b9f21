//! Git command wrappers.
//!
//! This module provides a thin wrapper around git CLI commands,
//! handling command execution, verbose echoing and error mapping.

use crate::constants::SHORT_HASH_LEN;
use crate::error::{Result, SyncError};
use std::path::Path;
use std::process::{Command, Output};

/// Callback used to echo external commands before they run.
pub type GitLogger = fn(&Path, &str);

/// Logger that echoes every command to stderr (verbose mode).
pub fn verbose_logger(repo: &Path, command: &str) {
    eprintln!("  $ {} (in {})", command, repo.display());
}

/// Logger that discards all output.
pub fn no_op_logger(_repo: &Path, _command: &str) {}

fn command_line(args: &[&str]) -> String {
    format!("git {}", args.join(" "))
}

fn spawn_git(repo: &Path, args: &[&str]) -> Result<Output> {
    Command::new("git")
        .current_dir(repo)
        .args(args)
        .output()
        .map_err(|e| SyncError::ExternalCommandFailed {
            command: command_line(args),
            status: -1,
            stderr: e.to_string(),
        })
}

/// Runs a git command, returning trimmed stdout on success.
pub fn run_git(repo: &Path, args: &[&str], log: GitLogger) -> Result<String> {
    log(repo, &command_line(args));
    let output = spawn_git(repo, args)?;

    if output.status.success() {
        let result = String::from_utf8_lossy(&output.stdout);
        Ok(result.trim().to_string())
    } else {
        Err(SyncError::ExternalCommandFailed {
            command: command_line(args),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Runs a git command used as a yes/no probe; non-zero exit means "no".
fn git_probe(repo: &Path, args: &[&str], log: GitLogger) -> Result<bool> {
    log(repo, &command_line(args));
    let output = spawn_git(repo, args)?;
    Ok(output.status.success())
}

pub fn validate_branch_name(branch: &str) -> Result<()> {
    if branch.is_empty() || branch.contains('\0') || branch.contains('\n') {
        return Err(SyncError::InvalidRef {
            name: branch.to_string(),
        });
    }
    Ok(())
}

/// Abbreviates a commit hash for branch names, messages and summaries.
pub fn short(hash: &str) -> &str {
    &hash[..SHORT_HASH_LEN.min(hash.len())]
}

pub fn get_current_branch(repo: &Path, log: GitLogger) -> Result<String> {
    run_git(repo, &["rev-parse", "--abbrev-ref", "HEAD"], log)
}

pub fn has_uncommitted_changes(repo: &Path, log: GitLogger) -> Result<bool> {
    run_git(repo, &["status", "--porcelain"], log).map(|output| !output.is_empty())
}

/// Stashes local modifications. Returns false when there was nothing to save.
pub fn stash_push(repo: &Path, message: &str, log: GitLogger) -> Result<bool> {
    let output = run_git(repo, &["stash", "push", "-m", message], log)?;
    Ok(!output.contains("No local changes to save"))
}

pub fn stash_pop(repo: &Path, log: GitLogger) -> Result<()> {
    run_git(repo, &["stash", "pop"], log)?;
    Ok(())
}

pub fn checkout(repo: &Path, branch: &str, log: GitLogger) -> Result<()> {
    validate_branch_name(branch)?;
    run_git(repo, &["checkout", branch], log)?;
    Ok(())
}

pub fn checkout_new_branch(repo: &Path, branch: &str, log: GitLogger) -> Result<()> {
    validate_branch_name(branch)?;
    run_git(repo, &["checkout", "-b", branch], log)?;
    Ok(())
}

/// Creates a local branch from `<remote>/<branch>` and checks it out.
pub fn checkout_remote_branch(repo: &Path, branch: &str, remote: &str, log: GitLogger) -> Result<()> {
    validate_branch_name(branch)?;
    let tracking = format!("{remote}/{branch}");
    run_git(repo, &["checkout", "-b", branch, &tracking], log)?;
    Ok(())
}

pub fn local_branch_exists(repo: &Path, branch: &str, log: GitLogger) -> Result<bool> {
    validate_branch_name(branch)?;
    let refname = format!("refs/heads/{branch}");
    git_probe(repo, &["show-ref", "--verify", "--quiet", &refname], log)
}

pub fn delete_branch(repo: &Path, branch: &str, log: GitLogger) -> Result<()> {
    validate_branch_name(branch)?;
    run_git(repo, &["branch", "-D", branch], log)?;
    Ok(())
}

pub fn fetch(repo: &Path, remote: &str, log: GitLogger) -> Result<()> {
    run_git(repo, &["fetch", remote], log)?;
    Ok(())
}

/// Fast-forwards the checked-out branch to the remote tip.
pub fn pull_ff_only(repo: &Path, remote: &str, branch: &str, log: GitLogger) -> Result<()> {
    run_git(repo, &["pull", "--ff-only", remote, branch], log)?;
    Ok(())
}

pub fn rev_parse(repo: &Path, rev: &str, log: GitLogger) -> Result<String> {
    run_git(repo, &["rev-parse", rev], log)
}

/// Working-tree diff of one path, for verbose display.
pub fn diff_path(repo: &Path, path: &str, log: GitLogger) -> Result<String> {
    run_git(repo, &["diff", "--", path], log)
}

/// Range log with unit/record separators so the parser never fights
/// newlines inside commit bodies. One record per commit:
/// `<hash> \x1f <full message> \x1e`.
pub fn log_range(repo: &Path, range: &str, log: GitLogger) -> Result<String> {
    run_git(repo, &["log", "--pretty=format:%H%x1f%B%x1e", range], log)
}

pub fn add(repo: &Path, path: &str, log: GitLogger) -> Result<()> {
    run_git(repo, &["add", path], log)?;
    Ok(())
}

pub fn commit(repo: &Path, message: &str, log: GitLogger) -> Result<()> {
    run_git(repo, &["commit", "-m", message], log)?;
    Ok(())
}

/// Pushes a branch, distinguishing a remote rejection from other failures
/// so the caller can apply its single forced-retry policy.
pub fn push(repo: &Path, remote: &str, branch: &str, force: bool, log: GitLogger) -> Result<()> {
    validate_branch_name(branch)?;
    let mut args = vec!["push", "--set-upstream"];
    if force {
        args.push("--force-with-lease");
    }
    args.push(remote);
    args.push(branch);

    match run_git(repo, &args, log) {
        Ok(_) => Ok(()),
        Err(SyncError::ExternalCommandFailed { command, status, stderr }) => {
            if is_rejection(&stderr) {
                Err(SyncError::NetworkRejected {
                    branch: branch.to_string(),
                    stderr,
                })
            } else {
                Err(SyncError::ExternalCommandFailed {
                    command,
                    status,
                    stderr,
                })
            }
        }
        Err(other) => Err(other),
    }
}

fn is_rejection(stderr: &str) -> bool {
    stderr.contains("[rejected]")
        || stderr.contains("non-fast-forward")
        || stderr.contains("fetch first")
        || stderr.contains("stale info")
}

pub fn remotes(repo: &Path, log: GitLogger) -> Result<Vec<String>> {
    let output = run_git(repo, &["remote"], log)?;
    Ok(output.lines().map(str::to_string).collect())
}

pub fn remote_url(repo: &Path, remote: &str, log: GitLogger) -> Result<String> {
    run_git(repo, &["remote", "get-url", remote], log)
}

/// Normalizes a remote URL to its https form so compare and PR links can be
/// derived from the working copy.
pub fn remote_https_url(url: &str) -> String {
    let url = url.trim().trim_end_matches(".git");
    if let Some(rest) = url.strip_prefix("git@") {
        if let Some((host, path)) = rest.split_once(':') {
            return format!("https://{host}/{path}");
        }
    }
    if let Some(rest) = url.strip_prefix("ssh://git@") {
        return format!("https://{rest}");
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_branch_name_rejects_empty_and_control_chars() {
        assert!(validate_branch_name("release/2.8").is_ok());
        assert!(validate_branch_name("").is_err());
        assert!(validate_branch_name("bad\nname").is_err());
        assert!(validate_branch_name("bad\0name").is_err());
    }

    #[test]
    fn test_short_truncates_long_hashes_only() {
        assert_eq!(short("0123456789abcdef0123"), "0123456789ab");
        assert_eq!(short("abc"), "abc");
    }

    #[test]
    fn test_remote_https_url_normalizes_ssh_forms() {
        assert_eq!(
            remote_https_url("git@github.com:rocm-arch/apex.git"),
            "https://github.com/rocm-arch/apex"
        );
        assert_eq!(
            remote_https_url("ssh://git@gitlab.com/group/project.git"),
            "https://gitlab.com/group/project"
        );
        assert_eq!(
            remote_https_url("https://github.com/rocm-arch/apex"),
            "https://github.com/rocm-arch/apex"
        );
    }

    #[test]
    fn test_is_rejection_matches_known_push_refusals() {
        assert!(is_rejection("! [rejected] topic -> topic (non-fast-forward)"));
        assert!(is_rejection("hint: Updates were rejected... fetch first"));
        assert!(!is_rejection("fatal: repository not found"));
    }
}
