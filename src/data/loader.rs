//! Match file loading
//!
//! Reads match JSON files concurrently with bounded parallelism. A file that
//! fails to read or parse is reported and skipped; the rest of the batch
//! still loads.

use crate::data::records::MatchRecord;
use crate::types::Match;
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A match file holds either one match or an array of matches
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MatchFile {
    Many(Vec<MatchRecord>),
    One(Box<MatchRecord>),
}

/// A file or record that could not be turned into a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Result of loading a set of files
#[derive(Debug, Default)]
pub struct LoadReport {
    pub matches: Vec<Match>,
    pub failures: Vec<LoadFailure>,
}

/// Parse the contents of one match file
///
/// Returns every record that converted cleanly, plus an error string for
/// each record that did not.
pub fn parse_matches(json: &str) -> Result<(Vec<Match>, Vec<String>)> {
    let file: MatchFile = serde_json::from_str(json).context("Invalid match JSON")?;
    let records = match file {
        MatchFile::Many(records) => records,
        MatchFile::One(record) => vec![*record],
    };

    let mut matches = Vec::with_capacity(records.len());
    let mut errors = Vec::new();
    for record in records {
        match Match::try_from(record) {
            Ok(m) => matches.push(m),
            Err(e) => errors.push(e.to_string()),
        }
    }
    Ok((matches, errors))
}

/// Expand `input` into the list of match files to load
///
/// A file is returned as is; a directory yields every `*.json` file below
/// it, sorted by path.
pub fn discover_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut paths = Vec::new();
    let mut pending = vec![input.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir)
            .with_context(|| format!("Failed to read input directory {}", dir.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to list {}", dir.display()))?
                .path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
    }
    paths.sort();
    Ok(paths)
}

async fn load_file(path: PathBuf) -> (PathBuf, Result<(Vec<Match>, Vec<String>)>) {
    let result = async {
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        parse_matches(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }
    .await;
    (path, result)
}

/// Load every file in `paths`, at most `concurrency` at a time
pub async fn load_matches(paths: Vec<PathBuf>, concurrency: usize) -> LoadReport {
    let total = paths.len();
    let mut results: Vec<_> = stream::iter(paths)
        .map(load_file)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    results.sort_by(|a, b| a.0.cmp(&b.0));

    let mut report = LoadReport::default();
    for (path, result) in results {
        match result {
            Ok((matches, errors)) => {
                debug!("Loaded {} matches from {}", matches.len(), path.display());
                report.matches.extend(matches);
                for error in errors {
                    warn!("Skipping match record in {}: {}", path.display(), error);
                    report.failures.push(LoadFailure {
                        path: path.clone(),
                        error,
                    });
                }
            }
            Err(e) => {
                warn!("{:#}", e);
                report.failures.push(LoadFailure {
                    path,
                    error: format!("{:#}", e),
                });
            }
        }
    }

    info!(
        "Loaded {} matches from {} files ({} failures)",
        report.matches.len(),
        total,
        report.failures.len()
    );
    report
}
