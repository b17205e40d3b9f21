//! Review request creation via the `gh` CLI.
//!
//! PR creation is best-effort: when `gh` is missing or exits non-zero the
//! caller gets a [`ManualPr`] payload (a pre-filled compare URL plus the
//! title and body) instead of an error, so the operator can finish the job
//! by hand.

use crate::git::GitLogger;
use std::path::Path;
use std::process::Command;

/// Inputs for one review request.
#[derive(Debug, Clone)]
pub struct PullRequestSpec {
    pub title: String,
    pub body: String,
    /// Branch the PR targets.
    pub base: String,
    /// Branch carrying the update commit.
    pub head: String,
}

/// How the review request ended up.
#[derive(Debug, Clone)]
pub enum PrOutcome {
    /// The CLI created the PR and reported its URL.
    Created { url: String },
    /// The CLI was unavailable or failed; create the PR manually.
    Manual(ManualPr),
}

/// Everything needed to open the review request by hand.
#[derive(Debug, Clone)]
pub struct ManualPr {
    /// Compare URL with the title and body pre-filled.
    pub compare_url: String,
    pub title: String,
    pub body: String,
}

/// Opens a review request through `gh pr create`.
///
/// Never fails: any CLI problem degrades to [`PrOutcome::Manual`].
pub fn create_pull_request(
    repo: &Path,
    repo_url: &str,
    spec: &PullRequestSpec,
    log: GitLogger,
) -> PrOutcome {
    log(
        repo,
        &format!("gh pr create --base {} --head {}", spec.base, spec.head),
    );

    let result = Command::new("gh")
        .current_dir(repo)
        .args([
            "pr",
            "create",
            "--title",
            &spec.title,
            "--body",
            &spec.body,
            "--base",
            &spec.base,
            "--head",
            &spec.head,
        ])
        .output();

    match result {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            // gh prints the created PR URL on its own line.
            match stdout.lines().rev().find(|l| l.starts_with("http")) {
                Some(url) => PrOutcome::Created {
                    url: url.trim().to_string(),
                },
                None => PrOutcome::Manual(manual(repo_url, spec)),
            }
        }
        _ => PrOutcome::Manual(manual(repo_url, spec)),
    }
}

fn manual(repo_url: &str, spec: &PullRequestSpec) -> ManualPr {
    ManualPr {
        compare_url: prefilled_compare_url(repo_url, spec),
        title: spec.title.clone(),
        body: spec.body.clone(),
    }
}

/// Compare URL with the PR form pre-filled, for the manual fallback and for
/// browser opening.
pub fn prefilled_compare_url(repo_url: &str, spec: &PullRequestSpec) -> String {
    format!(
        "{}/compare/{}...{}?title={}&body={}&expand=1",
        repo_url.trim_end_matches('/'),
        spec.base,
        spec.head,
        urlencoding::encode(&spec.title),
        urlencoding::encode(&spec.body),
    )
}
