//! The publish workflow.
//!
//! Runs one branch pair through the whole update procedure: prepare both
//! working copies, compare the recorded pin with the upstream tip, rewrite
//! the tracking file, and optionally branch, commit, push and open a review
//! request. Side effects are strictly additive; a failure reports the step
//! it died in and leaves everything done so far in place.

use crate::commits::{self, CommitRecord};
use crate::config::Config;
use crate::constants::UPDATE_BRANCH_PREFIX;
use crate::error::{Result, SyncError};
use crate::git::{self, GitLogger};
use crate::github::{self, ManualPr, PrOutcome, PullRequestSpec};
use crate::tracking;
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

/// One unit of maintenance work: which downstream branch to update from
/// which upstream branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchPair {
    pub downstream: String,
    pub upstream: String,
}

impl BranchPair {
    pub fn new(downstream: impl Into<String>, upstream: impl Into<String>) -> Result<Self> {
        let pair = Self {
            downstream: downstream.into(),
            upstream: upstream.into(),
        };
        git::validate_branch_name(&pair.downstream)?;
        git::validate_branch_name(&pair.upstream)?;
        Ok(pair)
    }

    pub fn label(&self) -> String {
        format!("{} → {}", self.upstream, self.downstream)
    }
}

/// States of the publish workflow, entered in order. A failure is tagged
/// with the step it happened in; every earlier step completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    PreparingDownstream,
    PreparingUpstream,
    ReadingPin,
    ResolvingUpstreamHead,
    CollectingCommits,
    UpdatingPin,
    CreatingBranch,
    Committing,
    Pushing,
    OpeningPullRequest,
    Completed,
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            WorkflowStep::PreparingDownstream => "Preparing downstream branch",
            WorkflowStep::PreparingUpstream => "Preparing upstream branch",
            WorkflowStep::ReadingPin => "Reading recorded pin",
            WorkflowStep::ResolvingUpstreamHead => "Resolving upstream head",
            WorkflowStep::CollectingCommits => "Collecting new commits",
            WorkflowStep::UpdatingPin => "Updating tracking file",
            WorkflowStep::CreatingBranch => "Creating update branch",
            WorkflowStep::Committing => "Committing tracking file",
            WorkflowStep::Pushing => "Pushing update branch",
            WorkflowStep::OpeningPullRequest => "Opening pull request",
            WorkflowStep::Completed => "Completed",
        };
        f.write_str(msg)
    }
}

/// Progress notifications during a run. All methods default to no-ops.
pub trait PublishCallbacks {
    fn on_step(&self, _step: WorkflowStep) {}
    fn on_note(&self, _note: &str) {}
    fn on_complete(&self, _result: &WorkflowResult) {}
}

/// Terminal status a successful run reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStatus {
    /// Recorded pin already matches the upstream tip; nothing to do.
    UpToDate,
    /// Tracking file rewritten in the working tree, no branch requested.
    Analyzed,
    /// Update branch created and the tracking file committed.
    BranchCreated,
    /// Update branch pushed to the remote.
    Pushed,
    /// Review request opened (or manual instructions produced).
    PrCreated,
}

#[derive(Debug)]
pub struct PublishSuccess {
    pub status: PublishStatus,
    pub old_hash: String,
    pub new_hash: String,
    /// Commits between the old and new pin, zero when up to date.
    pub commit_count: usize,
    pub branch_name: Option<String>,
    pub pr_url: Option<String>,
    /// Set when PR creation fell back to manual instructions.
    pub manual_pr: Option<ManualPr>,
    /// The push needed the single forced retry.
    pub forced_push: bool,
}

impl PublishSuccess {
    fn up_to_date(hash: String) -> Self {
        Self {
            status: PublishStatus::UpToDate,
            old_hash: hash.clone(),
            new_hash: hash,
            commit_count: 0,
            branch_name: None,
            pr_url: None,
            manual_pr: None,
            forced_push: false,
        }
    }
}

#[derive(Debug)]
pub struct WorkflowFailure {
    pub step: WorkflowStep,
    pub error: SyncError,
}

#[derive(Debug)]
pub enum WorkflowOutcome {
    Success(PublishSuccess),
    Failed(WorkflowFailure),
}

/// Outcome of one branch pair, never mutated after creation.
#[derive(Debug)]
pub struct WorkflowResult {
    pub pair: BranchPair,
    pub outcome: WorkflowOutcome,
    pub duration: Duration,
}

impl WorkflowResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, WorkflowOutcome::Success(_))
    }

    pub fn status(&self) -> Option<PublishStatus> {
        match &self.outcome {
            WorkflowOutcome::Success(s) => Some(s.status),
            WorkflowOutcome::Failed(_) => None,
        }
    }

    /// URL worth opening in a browser for pairs that reached the review
    /// request stage: the created PR, or the pre-filled compare page.
    pub fn review_url(&self) -> Option<&str> {
        match &self.outcome {
            WorkflowOutcome::Success(s) if s.status == PublishStatus::PrCreated => s
                .pr_url
                .as_deref()
                .or_else(|| s.manual_pr.as_ref().map(|m| m.compare_url.as_str())),
            _ => None,
        }
    }
}

fn at_step<T>(step: WorkflowStep, result: Result<T>) -> std::result::Result<T, WorkflowFailure> {
    result.map_err(|error| WorkflowFailure { step, error })
}

/// Runs the whole workflow for one branch pair.
pub fn publish(config: &Config, pair: &BranchPair, callbacks: &dyn PublishCallbacks) -> WorkflowResult {
    let started = Instant::now();
    let outcome = match do_publish(config, pair, callbacks) {
        Ok(success) => {
            callbacks.on_step(WorkflowStep::Completed);
            WorkflowOutcome::Success(success)
        }
        Err(failure) => WorkflowOutcome::Failed(failure),
    };
    WorkflowResult {
        pair: pair.clone(),
        outcome,
        duration: started.elapsed(),
    }
}

fn do_publish(
    config: &Config,
    pair: &BranchPair,
    callbacks: &dyn PublishCallbacks,
) -> std::result::Result<PublishSuccess, WorkflowFailure> {
    use WorkflowStep::*;
    let log = config.git_logger();

    callbacks.on_step(PreparingDownstream);
    at_step(
        PreparingDownstream,
        prepare_branch(&config.downstream_repo, &pair.downstream, config, log),
    )?;

    callbacks.on_step(PreparingUpstream);
    at_step(
        PreparingUpstream,
        prepare_branch(&config.upstream_repo, &pair.upstream, config, log),
    )?;

    callbacks.on_step(ReadingPin);
    let tracking_path = config.downstream_repo.join(&config.tracking_file);
    let contents = at_step(ReadingPin, tracking::load(&tracking_path))?;
    let old_hash = at_step(ReadingPin, tracking::recorded_hash(&contents, &pair.downstream))?;

    callbacks.on_step(ResolvingUpstreamHead);
    let new_hash = at_step(
        ResolvingUpstreamHead,
        git::rev_parse(&config.upstream_repo, "HEAD", log),
    )?;

    if old_hash == new_hash {
        return Ok(PublishSuccess::up_to_date(old_hash));
    }

    callbacks.on_step(CollectingCommits);
    let commits = at_step(
        CollectingCommits,
        commits::collect_range(&config.upstream_repo, &old_hash, &new_hash, log),
    )?;

    callbacks.on_step(UpdatingPin);
    let updated = at_step(
        UpdatingPin,
        tracking::updated_contents(&contents, &pair.downstream, &new_hash),
    )?;
    at_step(UpdatingPin, tracking::store(&tracking_path, &updated))?;
    let diff = at_step(
        UpdatingPin,
        git::diff_path(&config.downstream_repo, &config.tracking_file, log),
    )?;
    if !diff.is_empty() {
        callbacks.on_note(&diff);
    }

    let mut success = PublishSuccess {
        status: PublishStatus::Analyzed,
        old_hash: old_hash.clone(),
        new_hash: new_hash.clone(),
        commit_count: commits.len(),
        branch_name: None,
        pr_url: None,
        manual_pr: None,
        forced_push: false,
    };
    if !config.create_branch {
        return Ok(success);
    }

    callbacks.on_step(CreatingBranch);
    let branch = update_branch_name(pair, &new_hash);
    at_step(CreatingBranch, recreate_branch(&config.downstream_repo, &branch, log))?;
    success.branch_name = Some(branch.clone());

    callbacks.on_step(Committing);
    let upstream_url = upstream_repo_url(config, log);
    let summary = change_summary(pair, &old_hash, &new_hash, &commits, upstream_url.as_deref());
    let title = commit_title(config, pair);
    let message = format!("{title}\n\n{summary}");
    at_step(
        Committing,
        git::add(&config.downstream_repo, &config.tracking_file, log),
    )?;
    at_step(Committing, git::commit(&config.downstream_repo, &message, log))?;
    success.status = PublishStatus::BranchCreated;
    if !config.push {
        return Ok(success);
    }

    callbacks.on_step(Pushing);
    match git::push(&config.downstream_repo, &config.remote, &branch, false, log) {
        Ok(()) => {}
        Err(SyncError::NetworkRejected { .. }) => {
            // The remote already has a branch of this name; one forced
            // retry, then give up.
            callbacks.on_note("push rejected, retrying once with --force-with-lease");
            at_step(
                Pushing,
                git::push(&config.downstream_repo, &config.remote, &branch, true, log),
            )?;
            success.forced_push = true;
        }
        Err(other) => {
            return Err(WorkflowFailure {
                step: Pushing,
                error: other,
            });
        }
    }
    success.status = PublishStatus::Pushed;
    if !config.create_pr {
        return Ok(success);
    }

    callbacks.on_step(OpeningPullRequest);
    let repo_url = at_step(OpeningPullRequest, downstream_repo_url(config, log))?;
    let spec = PullRequestSpec {
        title,
        body: summary,
        base: pair.downstream.clone(),
        head: branch,
    };
    match github::create_pull_request(&config.downstream_repo, &repo_url, &spec, log) {
        PrOutcome::Created { url } => success.pr_url = Some(url),
        PrOutcome::Manual(manual) => {
            callbacks.on_note("gh unavailable or failed; producing manual PR instructions");
            success.manual_pr = Some(manual);
        }
    }
    success.status = PublishStatus::PrCreated;
    Ok(success)
}

/// Checks out the branch at its latest remote state, stashing local
/// modifications around the switch unless the caller keeps them.
fn prepare_branch(repo: &Path, branch: &str, config: &Config, log: GitLogger) -> Result<()> {
    git::validate_branch_name(branch)?;

    let dirty = git::has_uncommitted_changes(repo, log)?;
    let stashed = if dirty && !config.keep_local_changes {
        git::stash_push(repo, &format!("repin: auto-stash before checkout of {branch}"), log)?
    } else {
        false
    };

    let checkout_result = checkout_latest(repo, branch, &config.remote, log);
    let restore_result = if stashed {
        git::stash_pop(repo, log)
    } else {
        Ok(())
    };
    checkout_result.and(restore_result)
}

fn checkout_latest(repo: &Path, branch: &str, remote: &str, log: GitLogger) -> Result<()> {
    git::fetch(repo, remote, log)?;
    if git::local_branch_exists(repo, branch, log)? {
        git::checkout(repo, branch, log)?;
    } else {
        git::checkout_remote_branch(repo, branch, remote, log)?;
    }
    git::pull_ff_only(repo, remote, branch, log)
}

/// Deterministic update branch name from the pair and target hash.
pub fn update_branch_name(pair: &BranchPair, new_hash: &str) -> String {
    format!(
        "{}/{}-{}",
        UPDATE_BRANCH_PREFIX,
        pair.downstream.replace('/', "-"),
        git::short(new_hash)
    )
}

/// An existing local branch of the same name is stale output from an
/// earlier run; recreate it at the current head.
fn recreate_branch(repo: &Path, branch: &str, log: GitLogger) -> Result<()> {
    if git::local_branch_exists(repo, branch, log)? {
        git::delete_branch(repo, branch, log)?;
    }
    git::checkout_new_branch(repo, branch, log)
}

fn commit_title(config: &Config, pair: &BranchPair) -> String {
    format!("[{}] update {}", pair.downstream, config.tracking_file)
}

/// Body shared by the commit message and the PR description: pin movement,
/// commit list, associated PR numbers and deduplicated Fixes references.
fn change_summary(
    pair: &BranchPair,
    old_hash: &str,
    new_hash: &str,
    commits: &[CommitRecord],
    upstream_url: Option<&str>,
) -> String {
    let mut lines = vec![format!(
        "Advance the {} pin from {} to {} ({} commit{}).",
        pair.upstream,
        git::short(old_hash),
        git::short(new_hash),
        commits.len(),
        if commits.len() == 1 { "" } else { "s" },
    )];

    lines.push(String::new());
    lines.push("Commits:".to_string());
    for commit in commits {
        lines.push(format!("- {} {}", commit.short_hash(), commit.subject()));
    }

    let prs = dedup(commits.iter().filter_map(|c| c.pr_number).map(|n| n.to_string()));
    if !prs.is_empty() {
        lines.push(String::new());
        lines.push("PRs:".to_string());
        for pr in prs {
            match upstream_url {
                Some(url) => lines.push(format!("- {}/pull/{}", url.trim_end_matches('/'), pr)),
                None => lines.push(format!("- #{pr}")),
            }
        }
    }

    let fixes = dedup(commits.iter().flat_map(|c| c.fixes.iter().cloned()));
    if !fixes.is_empty() {
        lines.push(String::new());
        lines.push("Fixes:".to_string());
        for fix in fixes {
            lines.push(format!("- {fix}"));
        }
    }

    lines.join("\n")
}

/// Removes duplicates while preserving first-appearance order.
fn dedup(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

fn downstream_repo_url(config: &Config, log: GitLogger) -> Result<String> {
    if let Some(url) = &config.downstream_url {
        return Ok(url.clone());
    }
    git::remote_url(&config.downstream_repo, &config.remote, log).map(|u| git::remote_https_url(&u))
}

/// Best-effort: a missing upstream URL only degrades PR links in the
/// generated message to bare `#N` references.
fn upstream_repo_url(config: &Config, log: GitLogger) -> Option<String> {
    config.upstream_url.clone().or_else(|| {
        git::remote_url(&config.upstream_repo, &config.remote, log)
            .ok()
            .map(|u| git::remote_https_url(&u))
    })
}
