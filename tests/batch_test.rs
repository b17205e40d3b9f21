mod common;

use common::{TestRepo, run};
use repin::batch;
use repin::config::{Config, Verbosity};
use repin::error::SyncError;
use repin::output::NoOpCallbacks;
use repin::workflow::{BranchPair, PublishStatus, WorkflowOutcome, update_branch_name};
use std::time::Duration;
use tempfile::TempDir;

const DOWNSTREAM_BRANCHES: [&str; 5] = [
    "release/2.4",
    "release/2.5",
    "release/2.6",
    "release/2.7",
    "release/2.8",
];

/// The downstream branch seeded with an unresolved merge conflict in its
/// tracking file (pair 3 of 5).
const CONFLICTED: &str = "release/2.6";

struct BatchFixture {
    downstream: TestRepo,
    upstream: TestRepo,
    _downstream_remote: TempDir,
    _upstream_remote: TempDir,
    config: Config,
    new_head: String,
}

/// Five downstream release branches tracking one upstream branch; the
/// middle one carries an unresolved merge conflict in its tracking file.
fn fixture() -> anyhow::Result<BatchFixture> {
    let (upstream, upstream_remote) = TestRepo::with_remote("main")?;
    let pinned = upstream.head()?;

    let (downstream, downstream_remote) = TestRepo::with_remote(DOWNSTREAM_BRANCHES[0])?;
    for (index, branch) in DOWNSTREAM_BRANCHES.iter().enumerate() {
        if index > 0 {
            run(downstream.path(), &["checkout", "-b", branch])?;
        }
        let contents = if *branch == CONFLICTED {
            format!(
                "<<<<<<< HEAD\n{branch}={pinned}\n=======\n{branch}=0000000000000000\n>>>>>>> theirs\n"
            )
        } else {
            format!("{branch}={pinned}\n")
        };
        downstream.commit_file("related_commits", &contents, "Track upstream pin")?;
        run(downstream.path(), &["push", "origin", branch])?;
    }
    run(downstream.path(), &["checkout", DOWNSTREAM_BRANCHES[0]])?;

    let new_head = upstream.commit_file("feature.txt", "x\n", "Add feature (#7)")?;

    let config = Config {
        downstream_repo: downstream.path().to_path_buf(),
        upstream_repo: upstream.path().to_path_buf(),
        create_branch: true,
        pause: Duration::ZERO,
        verbosity: Verbosity::Quiet,
        ..Config::default()
    };

    Ok(BatchFixture {
        downstream,
        upstream,
        _downstream_remote: downstream_remote,
        _upstream_remote: upstream_remote,
        config,
        new_head,
    })
}

fn pairs() -> Vec<BranchPair> {
    DOWNSTREAM_BRANCHES
        .iter()
        .map(|downstream| BranchPair::new(*downstream, "main").unwrap())
        .collect()
}

#[test]
fn test_batch_isolates_a_failing_pair_and_attempts_all() -> anyhow::Result<()> {
    let fixture = fixture()?;
    let pairs = pairs();

    let results = batch::run(&fixture.config, &pairs, |_, _| NoOpCallbacks);
    assert_eq!(results.len(), 5);

    for (index, result) in results.iter().enumerate() {
        if pairs[index].downstream == CONFLICTED {
            match &result.outcome {
                WorkflowOutcome::Failed(failure) => {
                    assert!(matches!(failure.error, SyncError::ConflictDetected { .. }));
                }
                WorkflowOutcome::Success(_) => {
                    anyhow::bail!("expected the conflicted pair to fail")
                }
            }
        } else {
            assert_eq!(result.status(), Some(PublishStatus::BranchCreated));
        }
    }

    let summary = batch::summarize(&results);
    assert_eq!(summary.branch_created, 4);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.total(), 5);
    assert_eq!(summary.succeeded(), 4);
    assert!(!summary.all_succeeded());

    // Every healthy pair left its update branch behind.
    for downstream in DOWNSTREAM_BRANCHES.iter().filter(|b| **b != CONFLICTED) {
        let pair = BranchPair::new(*downstream, "main").unwrap();
        let branch = update_branch_name(&pair, &fixture.new_head);
        assert!(fixture.downstream.branch_exists(&branch)?);
    }
    assert!(fixture.upstream.branch_exists("main")?);
    Ok(())
}

#[test]
fn test_batch_reports_every_pair_in_order() -> anyhow::Result<()> {
    let fixture = fixture()?;
    let pairs = pairs();

    let results = batch::run(&fixture.config, &pairs, |_, _| NoOpCallbacks);

    let processed: Vec<&str> = results.iter().map(|r| r.pair.downstream.as_str()).collect();
    assert_eq!(processed, DOWNSTREAM_BRANCHES.to_vec());
    Ok(())
}
