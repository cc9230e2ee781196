use anyhow::Result;
use tracing::info;

use crate::config::FleetConfig;
use crate::execute::execute;
use crate::gh::{GhApi, Invocation};
use crate::outcome::{OperationResult, Outcome};
use crate::pool::TaskPool;
use crate::report::RunReport;

pub fn apply_topic<A: GhApi + ?Sized>(
    api: &A,
    repo: &str,
    topic: &str,
    dry_run: bool,
) -> OperationResult {
    let invocation = Invocation::AddTopic {
        repo: repo.to_string(),
        topic: topic.to_string(),
    };
    execute(api, repo, topic, &invocation, dry_run, "Applied")
}

/// Apply every topic to every repo, one task per pair.
pub fn run_topics<A, P>(
    api: &A,
    config: &FleetConfig,
    pool: &TaskPool,
    dry_run: bool,
    mut on_progress: P,
) -> Result<RunReport>
where
    A: GhApi + ?Sized,
    P: FnMut(usize, usize),
{
    info!(
        repos = config.repos.len(),
        topics = config.topics.len(),
        workers = pool.workers(),
        dry_run,
        "applying topics"
    );

    let mut pairs = Vec::with_capacity(config.repos.len() * config.topics.len());
    for repo in &config.repos {
        for topic in &config.topics {
            pairs.push((repo.as_str(), topic.as_str()));
        }
    }

    let tasks = pairs
        .iter()
        .map(|&(repo, topic)| move || apply_topic(api, repo, topic, dry_run))
        .collect::<Vec<_>>();
    let results = pool.run(
        tasks,
        |index, message| {
            let (repo, topic) = pairs[index];
            OperationResult::new(repo, topic, Outcome::Failed, message)
        },
        |_, done, total| on_progress(done, total),
    )?;

    Ok(RunReport {
        dry_run,
        operations: config.topics.clone(),
        results,
    })
}
