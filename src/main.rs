use anyhow::Context;
use clap::Parser;
use repin::batch;
use repin::config::{Config, Verbosity};
use repin::constants::{DEFAULT_PAUSE_SECS, DEFAULT_REMOTE, DEFAULT_TRACKING_FILE};
use repin::output;
use repin::workflow::{BranchPair, WorkflowOutcome};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Sync a pinned upstream commit across release branches and open update PRs.
#[derive(Parser, Debug)]
#[command(name = "repin", version)]
struct Cli {
    /// Downstream working copy (its tracking file is rewritten)
    #[arg(long, value_name = "PATH")]
    downstream_repo: PathBuf,

    /// Upstream working copy (source of the new pin)
    #[arg(long, value_name = "PATH")]
    upstream_repo: PathBuf,

    /// Downstream branch to update (single mode)
    #[arg(long, value_name = "BRANCH", conflicts_with = "pair", requires = "upstream_branch")]
    downstream_branch: Option<String>,

    /// Upstream branch supplying the new pin (single mode)
    #[arg(long, value_name = "BRANCH", conflicts_with = "pair", requires = "downstream_branch")]
    upstream_branch: Option<String>,

    /// Branch pair as `downstream:upstream`; repeat for batch mode
    #[arg(long = "pair", value_name = "DOWNSTREAM:UPSTREAM")]
    pair: Vec<String>,

    /// Remote used for fetch, branch creation and push
    #[arg(long, default_value = DEFAULT_REMOTE)]
    remote: String,

    /// Tracking file name inside the downstream repository
    #[arg(long, default_value = DEFAULT_TRACKING_FILE)]
    tracking_file: String,

    /// Downstream hosting URL for compare links (derived from the remote
    /// when omitted)
    #[arg(long, value_name = "URL")]
    repo_url: Option<String>,

    /// Upstream hosting URL for PR links in generated messages
    #[arg(long, value_name = "URL")]
    upstream_url: Option<String>,

    /// Create the update branch and commit the rewritten tracking file
    #[arg(long)]
    create_branch: bool,

    /// Push the update branch and open a PR (implies --create-branch)
    #[arg(long)]
    push_and_create_pr: bool,

    /// Open review pages in the default browser after the run
    #[arg(long)]
    open_browser: bool,

    /// Leave local modifications in place instead of stashing around checkouts
    #[arg(long)]
    keep_local_changes: bool,

    /// Seconds to pause between batch items
    #[arg(long, default_value_t = DEFAULT_PAUSE_SECS)]
    pause_secs: u64,

    /// Only print the final counts and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Echo every external command and workflow step
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            downstream_repo: self.downstream_repo.clone(),
            upstream_repo: self.upstream_repo.clone(),
            tracking_file: self.tracking_file.clone(),
            remote: self.remote.clone(),
            downstream_url: self.repo_url.clone(),
            upstream_url: self.upstream_url.clone(),
            create_branch: self.create_branch || self.push_and_create_pr,
            push: self.push_and_create_pr,
            create_pr: self.push_and_create_pr,
            open_browser: self.open_browser,
            keep_local_changes: self.keep_local_changes,
            pause: Duration::from_secs(self.pause_secs),
            verbosity: if self.quiet {
                Verbosity::Quiet
            } else if self.verbose {
                Verbosity::Verbose
            } else {
                Verbosity::Normal
            },
        }
    }

    fn pairs(&self) -> anyhow::Result<Vec<BranchPair>> {
        if !self.pair.is_empty() {
            return self.pair.iter().map(|s| parse_pair(s)).collect();
        }
        match (&self.downstream_branch, &self.upstream_branch) {
            (Some(downstream), Some(upstream)) => {
                Ok(vec![BranchPair::new(downstream.clone(), upstream.clone())?])
            }
            _ => anyhow::bail!(
                "specify --downstream-branch and --upstream-branch, or at least one --pair"
            ),
        }
    }
}

fn parse_pair(raw: &str) -> anyhow::Result<BranchPair> {
    let (downstream, upstream) = raw
        .split_once(':')
        .with_context(|| format!("invalid pair '{raw}': expected DOWNSTREAM:UPSTREAM"))?;
    Ok(BranchPair::new(downstream, upstream)?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config();
    let pairs = cli.pairs()?;

    output::print_run_header(&config, pairs.len());

    let started = Instant::now();
    let results = if pairs.len() == 1 {
        batch::run(&config, &pairs, |_, _| output::SingleRunCallbacks::new(&config))
    } else {
        let progress = output::create_batch_progress(pairs.len(), &config);
        let results = batch::run(&config, &pairs, |_, pair| {
            progress.tracker(pair.label(), &config)
        });
        progress.finish();
        results
    };

    output::print_summary(&results, started.elapsed(), &config);

    if !config.is_quiet() {
        for result in &results {
            if let WorkflowOutcome::Success(success) = &result.outcome {
                if let Some(manual) = &success.manual_pr {
                    output::print_manual_instructions(manual);
                }
            }
        }
    }

    if config.open_browser {
        let failures = batch::open_review_pages(&results);
        output::print_browser_failures(&failures);
    }

    if results.iter().any(|r| !r.is_success()) {
        std::process::exit(1);
    }
    Ok(())
}
