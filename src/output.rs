//! Progress bars, colored output, and summary formatting.
//!
//! Visual feedback while branch pairs are processed: a step spinner for
//! single runs, a pair-count bar for batch runs, and a colored summary
//! partitioned by terminal status.

use crate::batch::{self, BatchSummary};
use crate::config::Config;
use crate::constants::PROGRESS_TICK_MS;
use crate::error::SyncError;
use crate::github::ManualPr;
use crate::workflow::{
    PublishCallbacks, PublishStatus, PublishSuccess, WorkflowOutcome, WorkflowResult, WorkflowStep,
};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// No-op callbacks for when progress tracking is not needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOpCallbacks;

impl PublishCallbacks for NoOpCallbacks {}

/// Prints a step progress message in verbose mode.
pub fn print_step(config: &Config, step: WorkflowStep) {
    if !config.is_verbose() {
        return;
    }
    eprintln!("  {}...", step.to_string().dimmed());
}

/// Prints a workflow note (diff, retry notice) in verbose mode.
pub fn print_note(config: &Config, note: &str) {
    if !config.is_verbose() {
        return;
    }
    for line in note.lines() {
        eprintln!("  {}", line.dimmed());
    }
}

/// Progress wrapper for a single branch pair.
/// Uses `Option` to avoid allocation when progress is hidden (quiet/verbose modes).
pub struct PairProgress {
    spinner: Option<ProgressBar>,
}

impl PairProgress {
    pub fn update(&self, step: WorkflowStep) {
        if let Some(spinner) = &self.spinner {
            spinner.set_message(format!("{step}..."));
        }
    }

    pub fn finish(&self, result: &WorkflowResult) {
        if let Some(spinner) = &self.spinner {
            let label = result.pair.label();
            match &result.outcome {
                WorkflowOutcome::Success(success) => spinner.finish_with_message(format!(
                    "{} {} {}",
                    "✓".green(),
                    label,
                    status_label(success)
                )),
                WorkflowOutcome::Failed(failure) => spinner.finish_with_message(format!(
                    "{} {} failed at {}: {}",
                    "✗".red(),
                    label,
                    failure.step,
                    failure.error
                )),
            }
        }
    }
}

/// Callbacks for a single branch pair run.
pub struct SingleRunCallbacks {
    progress: PairProgress,
    config: Config,
}

impl SingleRunCallbacks {
    pub fn new(config: &Config) -> Self {
        Self {
            progress: create_pair_progress(config),
            config: config.clone(),
        }
    }
}

impl PublishCallbacks for SingleRunCallbacks {
    fn on_step(&self, step: WorkflowStep) {
        self.progress.update(step);
        print_step(&self.config, step);
    }

    fn on_note(&self, note: &str) {
        print_note(&self.config, note);
    }

    fn on_complete(&self, result: &WorkflowResult) {
        self.progress.finish(result);
    }
}

/// Progress tracker for batch mode: one bar counting completed pairs,
/// completed results echoed above it.
#[derive(Clone)]
pub struct BatchProgress {
    bar: Option<ProgressBar>,
}

impl BatchProgress {
    pub fn tracker(&self, pair_label: String, config: &Config) -> PairTracker {
        PairTracker {
            pair_label,
            bar: self.bar.clone(),
            config: config.clone(),
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

/// Per-pair callbacks for batch mode.
pub struct PairTracker {
    pair_label: String,
    bar: Option<ProgressBar>,
    config: Config,
}

impl PublishCallbacks for PairTracker {
    fn on_step(&self, step: WorkflowStep) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("{}: {step}...", self.pair_label));
        }
        print_step(&self.config, step);
    }

    fn on_note(&self, note: &str) {
        print_note(&self.config, note);
    }

    fn on_complete(&self, result: &WorkflowResult) {
        if let Some(bar) = &self.bar {
            let symbol = if result.is_success() {
                "✓".green()
            } else {
                "✗".red()
            };
            bar.println(format!("  {} {}", symbol, self.pair_label));
            bar.inc(1);
        }
    }
}

/// Creates a spinner-based progress tracker for single runs.
/// The spinner is absent in quiet and verbose modes to avoid allocation.
#[must_use]
pub fn create_pair_progress(config: &Config) -> PairProgress {
    let spinner = if config.is_quiet() || config.is_verbose() {
        None
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        spinner.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_MS));
        Some(spinner)
    };

    PairProgress { spinner }
}

/// Creates a progress bar counting completed pairs in batch mode.
#[must_use]
pub fn create_batch_progress(total: usize, config: &Config) -> BatchProgress {
    let bar = if config.is_quiet() || config.is_verbose() {
        None
    } else {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {pos}/{len} pairs {spinner:.cyan} {msg}")
                .unwrap()
                .progress_chars("█░"),
        );
        bar.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_MS));
        Some(bar)
    };

    BatchProgress { bar }
}

pub fn print_run_header(config: &Config, pairs: usize) {
    if config.is_quiet() {
        return;
    }
    println!(
        "{} {} {} {}",
        "Syncing".cyan(),
        config.downstream_repo.display().to_string().white().bold(),
        "from".cyan(),
        config.upstream_repo.display().to_string().white().bold(),
    );
    if pairs > 1 {
        println!("{}", format!("Batch mode: {pairs} branch pairs").dimmed());
    }
}

pub fn print_summary(results: &[WorkflowResult], duration: Duration, config: &Config) {
    if config.is_quiet() {
        print_quiet_summary(results);
    } else {
        print_normal_summary(results, duration);
    }
}

fn print_quiet_summary(results: &[WorkflowResult]) {
    let summary = batch::summarize(results);
    println!("{}/{} branch pairs synced", summary.succeeded(), summary.total());

    for result in results {
        match &result.outcome {
            WorkflowOutcome::Failed(failure) => eprintln!(
                "error: {}: at {}: {}",
                result.pair.label(),
                failure.step,
                failure.error
            ),
            WorkflowOutcome::Success(success) => {
                if let Some(manual) = &success.manual_pr {
                    println!("manual PR required: {}", manual.compare_url);
                }
            }
        }
    }
}

fn print_normal_summary(results: &[WorkflowResult], duration: Duration) {
    print_section("Summary");
    let (successes, failures): (Vec<_>, Vec<_>) =
        results.iter().partition(|r| r.is_success());

    print_successes(&successes);
    print_failures(&failures);

    let summary = batch::summarize(results);
    println!(
        "{}: {}/{} pairs in {}",
        "Total".white().bold(),
        summary.succeeded(),
        summary.total(),
        format_duration(duration)
    );
    print_status_counts(&summary);
}

fn print_successes(successes: &[&WorkflowResult]) {
    if successes.is_empty() {
        return;
    }
    println!(
        "{}",
        format!("Succeeded ({}):", successes.len()).green().bold()
    );

    for result in successes {
        if let WorkflowOutcome::Success(success) = &result.outcome {
            println!(
                "  {} {} {} {} in {}",
                "OK".green().bold(),
                result.pair.label().white(),
                status_label(success).cyan(),
                pin_movement(success).dimmed(),
                format_duration(result.duration).dimmed(),
            );
            if let Some(url) = &success.pr_url {
                println!("     {} {}", "PR:".cyan(), url);
            }
        }
    }
    println!();
}

fn print_failures(failures: &[&WorkflowResult]) {
    if failures.is_empty() {
        return;
    }

    println!("{}", format!("Failed ({}):", failures.len()).red().bold());

    for result in failures {
        if let WorkflowOutcome::Failed(failure) = &result.outcome {
            println!(
                "  {} {} {} in {}",
                "FAIL".red().bold(),
                result.pair.label().white(),
                format!("at {}: {}", failure.step, failure.error).red(),
                format_duration(result.duration).dimmed(),
            );
        }
    }
    println!();
}

fn print_status_counts(summary: &BatchSummary) {
    let mut parts = Vec::new();
    for (count, label) in [
        (summary.up_to_date, "up to date"),
        (summary.analyzed, "analyzed"),
        (summary.branch_created, "branch created"),
        (summary.pushed, "pushed"),
        (summary.pr_created, "PR created"),
        (summary.failed, "failed"),
    ] {
        if count > 0 {
            parts.push(format!("{count} {label}"));
        }
    }
    if !parts.is_empty() {
        println!("{}", parts.join(", ").dimmed());
    }
}

/// Boxed manual-instructions block for a PR that could not be opened
/// through the CLI.
pub fn print_manual_instructions(manual: &ManualPr) {
    let line = "=".repeat(60).cyan().dimmed();
    println!("\n{line}");
    println!("{}", "Manual PR creation required".yellow().bold());
    println!("{line}");
    println!("{} {}", "URL:".cyan(), manual.compare_url);
    println!("{} {}", "Title:".cyan(), manual.title);
    println!("{}", "Body:".cyan());
    for body_line in manual.body.lines() {
        println!("  {body_line}");
    }
    println!("{line}\n");
}

pub fn print_browser_failures(failures: &[(String, SyncError)]) {
    for (url, err) in failures {
        eprintln!("{} could not open {url}: {err}", "warning:".yellow());
    }
}

fn status_label(success: &PublishSuccess) -> &'static str {
    match (success.status, success.forced_push, success.manual_pr.is_some()) {
        (PublishStatus::UpToDate, _, _) => "already up to date",
        (PublishStatus::Analyzed, _, _) => "analyzed",
        (PublishStatus::BranchCreated, _, _) => "branch created",
        (PublishStatus::Pushed, true, _) => "pushed (forced)",
        (PublishStatus::Pushed, false, _) => "pushed",
        (PublishStatus::PrCreated, _, true) => "PR pending (manual)",
        (PublishStatus::PrCreated, _, false) => "PR created",
    }
}

fn pin_movement(success: &PublishSuccess) -> String {
    if success.status == PublishStatus::UpToDate {
        format!("at {}", crate::git::short(&success.old_hash))
    } else {
        format!(
            "{} → {} ({} commits)",
            crate::git::short(&success.old_hash),
            crate::git::short(&success.new_hash),
            success.commit_count
        )
    }
}

fn format_duration(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f32())
}

fn print_section(title: &str) {
    let line = "=".repeat(50).cyan().dimmed();
    let padding = (50 - title.len()) / 2;
    let centered = format!("{:>width$}", title, width = padding + title.len());
    println!("\n{}\n{}\n{}\n", line, centered.cyan().bold(), line);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::BranchPair;

    fn success(status: PublishStatus) -> PublishSuccess {
        PublishSuccess {
            status,
            old_hash: "abc123abc123abc1".into(),
            new_hash: "def456def456def4".into(),
            commit_count: 3,
            branch_name: None,
            pr_url: None,
            manual_pr: None,
            forced_push: false,
        }
    }

    #[test]
    fn test_format_duration_rounds_to_two_decimals() {
        assert_eq!(format_duration(Duration::from_millis(1234)), "1.23s");
        assert_eq!(format_duration(Duration::from_millis(5678)), "5.68s");
        assert_eq!(format_duration(Duration::from_secs(42)), "42.00s");
    }

    #[test]
    fn test_status_label_covers_push_and_pr_variants() {
        assert_eq!(status_label(&success(PublishStatus::UpToDate)), "already up to date");
        assert_eq!(status_label(&success(PublishStatus::Analyzed)), "analyzed");
        assert_eq!(status_label(&success(PublishStatus::Pushed)), "pushed");

        let forced = PublishSuccess {
            forced_push: true,
            ..success(PublishStatus::Pushed)
        };
        assert_eq!(status_label(&forced), "pushed (forced)");

        let manual = PublishSuccess {
            manual_pr: Some(ManualPr {
                compare_url: "https://example.com/compare".into(),
                title: "t".into(),
                body: "b".into(),
            }),
            ..success(PublishStatus::PrCreated)
        };
        assert_eq!(status_label(&manual), "PR pending (manual)");
    }

    #[test]
    fn test_quiet_summary_does_not_panic() {
        let results = vec![WorkflowResult {
            pair: BranchPair::new("release/2.8", "release/1.8.0").unwrap(),
            outcome: WorkflowOutcome::Success(success(PublishStatus::Pushed)),
            duration: Duration::from_secs(2),
        }];
        print_quiet_summary(&results);
        print_quiet_summary(&[]);
    }
}
