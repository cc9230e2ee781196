use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde_json::Value;
use tracing::{info, warn};

use crate::catalog::ContentType;
use crate::gh::{GhApi, Invocation};
use crate::outcome::{OperationResult, Outcome};
use crate::paginate::{PaginationMode, fetch_collection, fetch_document};
use crate::pool::TaskPool;
use crate::report::RunReport;

/// Timestamp shared by every file written in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStamp(String);

impl RunStamp {
    pub fn now() -> Self {
        Self(Local::now().format("%Y%m%d_%H%M%S").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RunStamp {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub output_dir: PathBuf,
    pub stamp: RunStamp,
    pub pagination: PaginationMode,
    pub dry_run: bool,
}

/// `acme/api` becomes `acme_api`.
pub fn safe_filename(repo: &str) -> String {
    repo.replace('/', "_")
}

pub fn output_path(
    output_dir: &Path,
    repo: &str,
    content_type: ContentType,
    stamp: &RunStamp,
) -> PathBuf {
    output_dir.join(format!(
        "{}_{}_{}.json",
        safe_filename(repo),
        content_type.name(),
        stamp.as_str()
    ))
}

/// Download one content type for one repo and write it to disk on success.
pub fn download<A: GhApi + ?Sized>(
    api: &A,
    repo: &str,
    content_type: ContentType,
    options: &DownloadOptions,
) -> OperationResult {
    let descriptor = content_type.descriptor();
    let endpoint = descriptor.endpoint_for(repo);
    let path = output_path(&options.output_dir, repo, content_type, &options.stamp);

    if options.dry_run {
        let invocation = Invocation::Api(descriptor.request(repo));
        return OperationResult::new(
            repo,
            descriptor.name,
            Outcome::Planned,
            format!("DRY RUN: {}", invocation.command_line()),
        )
        .with_output_path(path);
    }

    let fetched = if descriptor.paginated {
        fetch_collection(api, &endpoint, options.pagination)
    } else {
        fetch_document(api, &endpoint)
    };
    let data = match fetched {
        Ok(data) => data,
        Err(error) => {
            let result =
                OperationResult::from_failure(repo, descriptor.name, &format!("{error:#}"));
            if result.outcome == Outcome::Failed {
                warn!(
                    repo = %repo,
                    content_type = descriptor.name,
                    error = %result.message,
                    "download failed"
                );
            }
            return result;
        }
    };

    if let Err(error) = write_payload(&path, &data) {
        warn!(repo = %repo, content_type = descriptor.name, error = %error, "write failed");
        return OperationResult::new(repo, descriptor.name, Outcome::Failed, format!("{error:#}"));
    }

    OperationResult::new(
        repo,
        descriptor.name,
        Outcome::Applied,
        summarize(content_type, &data),
    )
    .with_output_path(path)
}

fn write_payload(path: &Path, data: &Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(data).context("failed to encode payload")?;
    fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))
}

fn summarize(content_type: ContentType, data: &Value) -> String {
    match content_type {
        ContentType::Sbom => {
            let count = data
                .pointer("/sbom/packages")
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            format!("{count} packages")
        }
        ContentType::Dependabot | ContentType::Codeql => {
            let count = data.as_array().map_or(0, Vec::len);
            format!("{count} alerts")
        }
    }
}

/// Download every selected content type for every repo.
pub fn run_downloads<A, P>(
    api: &A,
    repos: &[String],
    content_types: &[ContentType],
    options: &DownloadOptions,
    pool: &TaskPool,
    mut on_progress: P,
) -> Result<RunReport>
where
    A: GhApi + ?Sized,
    P: FnMut(usize, usize),
{
    info!(
        repos = repos.len(),
        content_types = content_types.len(),
        workers = pool.workers(),
        dry_run = options.dry_run,
        stamp = options.stamp.as_str(),
        "downloading findings"
    );

    if !options.dry_run {
        fs::create_dir_all(&options.output_dir)
            .with_context(|| format!("failed to create {}", options.output_dir.display()))?;
    }

    let mut pairs = Vec::with_capacity(repos.len() * content_types.len());
    for repo in repos {
        for &content_type in content_types {
            pairs.push((repo.as_str(), content_type));
        }
    }

    let tasks = pairs
        .iter()
        .map(|&(repo, content_type)| move || download(api, repo, content_type, options))
        .collect::<Vec<_>>();
    let results = pool.run(
        tasks,
        |index, message| {
            let (repo, content_type) = pairs[index];
            OperationResult::new(repo, content_type.name(), Outcome::Failed, message)
        },
        |_, done, total| on_progress(done, total),
    )?;

    Ok(RunReport {
        dry_run: options.dry_run,
        operations: content_types
            .iter()
            .map(|content_type| content_type.name().to_string())
            .collect(),
        results,
    })
}
