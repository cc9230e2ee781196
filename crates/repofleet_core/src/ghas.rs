//! GitHub Advanced Security enablement and status checks.

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, info};

use crate::catalog::Feature;
use crate::execute::execute;
use crate::gh::{ApiRequest, GhApi, Invocation};
use crate::outcome::{OperationResult, Outcome};
use crate::pool::TaskPool;
use crate::report::RunReport;

pub const SKIPPED_MESSAGE: &str = "Skipped (GHAS not enabled)";

pub fn enable_feature<A: GhApi + ?Sized>(
    api: &A,
    repo: &str,
    feature: Feature,
    dry_run: bool,
) -> OperationResult {
    let descriptor = feature.descriptor();
    let invocation = Invocation::Api(descriptor.request(repo));
    execute(api, repo, descriptor.name, &invocation, dry_run, "Enabled")
}

/// Enable `features` on one repo in the given order.
///
/// Once the prerequisite fails, every later feature that depends on it is
/// recorded as skipped without being attempted. Independent features still run.
pub fn enable_repo<A: GhApi + ?Sized>(
    api: &A,
    repo: &str,
    features: &[Feature],
    dry_run: bool,
) -> Vec<OperationResult> {
    let mut results = Vec::with_capacity(features.len());
    let mut prerequisite_failed = false;

    for &feature in features {
        if prerequisite_failed && feature.requires_prerequisite() {
            debug!(repo = %repo, feature = feature.name(), "skipping dependent feature");
            results.push(OperationResult::new(
                repo,
                feature.name(),
                Outcome::Skipped,
                SKIPPED_MESSAGE,
            ));
            continue;
        }

        let result = enable_feature(api, repo, feature, dry_run);
        if feature == Feature::PREREQUISITE && !result.success() {
            prerequisite_failed = true;
        }
        results.push(result);
    }

    results
}

/// Enable the selected features on every repo, one task per repo.
pub fn run_enable<A, P>(
    api: &A,
    repos: &[String],
    selected: &[Feature],
    pool: &TaskPool,
    dry_run: bool,
    mut on_progress: P,
) -> Result<RunReport>
where
    A: GhApi + ?Sized,
    P: FnMut(usize, usize),
{
    let features = Feature::in_enable_order(selected);
    info!(
        repos = repos.len(),
        features = features.len(),
        workers = pool.workers(),
        dry_run,
        "enabling security features"
    );

    let tasks = repos
        .iter()
        .map(|repo| {
            let features = features.as_slice();
            move || enable_repo(api, repo, features, dry_run)
        })
        .collect::<Vec<_>>();
    let batches = pool.run(
        tasks,
        |index, message| {
            features
                .iter()
                .map(|feature| {
                    OperationResult::new(
                        &repos[index],
                        feature.name(),
                        Outcome::Failed,
                        message.as_str(),
                    )
                })
                .collect()
        },
        |_, done, total| on_progress(done, total),
    )?;

    Ok(RunReport {
        dry_run,
        operations: features
            .iter()
            .map(|feature| feature.name().to_string())
            .collect(),
        results: batches.into_iter().flatten().collect(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureStatus {
    pub advanced_security: bool,
    pub codeql: bool,
    pub secret_scanning: bool,
    pub secret_push_protection: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoStatus {
    Known(FeatureStatus),
    /// The repository query itself failed.
    Unknown,
}

/// Read current feature state without changing anything.
pub fn check_repo_status<A: GhApi + ?Sized>(api: &A, repo: &str) -> RepoStatus {
    let Some(repository) = get_json(api, &format!("/repos/{repo}")) else {
        return RepoStatus::Unknown;
    };
    let analysis = &repository["security_and_analysis"];
    let enabled = |key: &str| analysis[key]["status"].as_str() == Some("enabled");

    // A failing default-setup query reads as "not configured".
    let codeql = get_json(api, &format!("/repos/{repo}/code-scanning/default-setup"))
        .is_some_and(|setup| setup["state"].as_str() == Some("configured"));

    RepoStatus::Known(FeatureStatus {
        advanced_security: enabled("advanced_security"),
        codeql,
        secret_scanning: enabled("secret_scanning"),
        secret_push_protection: enabled("secret_scanning_push_protection"),
    })
}

fn get_json<A: GhApi + ?Sized>(api: &A, endpoint: &str) -> Option<Value> {
    let output = match api.run(&Invocation::Api(ApiRequest::get(endpoint))) {
        Ok(output) if output.success() => output,
        Ok(output) => {
            debug!(endpoint = %endpoint, error = %output.error_text(), "status query failed");
            return None;
        }
        Err(error) => {
            debug!(endpoint = %endpoint, error = %error, "status query could not run");
            return None;
        }
    };
    serde_json::from_str(&output.stdout).ok()
}

/// Check every repo on the pool. Rows come back in config order.
pub fn run_check<A, P>(
    api: &A,
    repos: &[String],
    pool: &TaskPool,
    mut on_progress: P,
) -> Result<Vec<(String, RepoStatus)>>
where
    A: GhApi + ?Sized,
    P: FnMut(usize, usize),
{
    info!(repos = repos.len(), workers = pool.workers(), "checking security status");

    let tasks = repos
        .iter()
        .enumerate()
        .map(|(index, repo)| move || (index, check_repo_status(api, repo)))
        .collect::<Vec<_>>();
    let mut rows = pool.run(
        tasks,
        |index, _| (index, RepoStatus::Unknown),
        |_, done, total| on_progress(done, total),
    )?;
    rows.sort_by_key(|(index, _)| *index);

    Ok(rows
        .into_iter()
        .map(|(index, status)| (repos[index].clone(), status))
        .collect())
}
