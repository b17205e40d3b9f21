//! Batch driving.
//!
//! Runs the publish workflow over an ordered list of branch pairs, one at a
//! time. A failing pair never aborts its siblings; every pair is attempted
//! and its result recorded. A pause between pairs keeps the run from
//! hammering the hosting platform.

use crate::browser;
use crate::config::Config;
use crate::error::SyncError;
use crate::workflow::{self, BranchPair, PublishCallbacks, PublishStatus, WorkflowResult};

/// Runs every pair in order, pausing between them (never after the last).
///
/// `make_callbacks` builds the per-pair progress callbacks, in the same way
/// each repository gets its own tracker in a multi-repo update.
pub fn run<C, F>(config: &Config, pairs: &[BranchPair], mut make_callbacks: F) -> Vec<WorkflowResult>
where
    C: PublishCallbacks,
    F: FnMut(usize, &BranchPair) -> C,
{
    let mut results = Vec::with_capacity(pairs.len());

    for (index, pair) in pairs.iter().enumerate() {
        let callbacks = make_callbacks(index, pair);
        let result = workflow::publish(config, pair, &callbacks);
        callbacks.on_complete(&result);
        results.push(result);

        if index + 1 < pairs.len() && !config.pause.is_zero() {
            std::thread::sleep(config.pause);
        }
    }

    results
}

/// Opens the review page of every pair that reached the review-request
/// stage. Returns the URLs that failed to open, with their errors.
pub fn open_review_pages(results: &[WorkflowResult]) -> Vec<(String, SyncError)> {
    let mut failures = Vec::new();
    for url in results.iter().filter_map(WorkflowResult::review_url) {
        if let Err(err) = browser::open(url) {
            failures.push((url.to_string(), err));
        }
    }
    failures
}

/// Result counts partitioned by terminal status.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub up_to_date: usize,
    pub analyzed: usize,
    pub branch_created: usize,
    pub pushed: usize,
    pub pr_created: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.up_to_date + self.analyzed + self.branch_created + self.pushed + self.pr_created
            + self.failed
    }

    pub fn succeeded(&self) -> usize {
        self.total() - self.failed
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

pub fn summarize(results: &[WorkflowResult]) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for result in results {
        match result.status() {
            Some(PublishStatus::UpToDate) => summary.up_to_date += 1,
            Some(PublishStatus::Analyzed) => summary.analyzed += 1,
            Some(PublishStatus::BranchCreated) => summary.branch_created += 1,
            Some(PublishStatus::Pushed) => summary.pushed += 1,
            Some(PublishStatus::PrCreated) => summary.pr_created += 1,
            None => summary.failed += 1,
        }
    }
    summary
}
