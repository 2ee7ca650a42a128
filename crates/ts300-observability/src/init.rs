// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output always; with the `file-logging` feature and a log directory,
//! also a daily rolling file inside a per-run folder:
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── ts300.log.2025-01-01
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

/// Run folders kept under the log directory, current run included
pub const DEFAULT_RETENTION_RUNS: usize = 10;

const RUN_FOLDER_PREFIX: &str = "run_";
const RUN_FOLDER_FORMAT: &str = "%Y%m%d_%H%M%S";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the file writer alive; dropping it flushes pending log lines
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Folder of the current run, when file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Install the global subscriber
///
/// # Arguments
/// * `debug_flags` - Crates to log at debug level
/// * `base_level` - Level for everything else (e.g. `info`)
/// * `log_dir` - Base directory for run folders; ignored without `file-logging`
///
/// # Errors
/// Fails on an unparsable level, an uncreatable log directory, or when a
/// global subscriber is already installed.
pub fn init_logging(
    debug_flags: &CrateDebugFlags,
    base_level: &str,
    log_dir: Option<&Path>,
) -> Result<LoggingGuard> {
    let filter = debug_flags.to_filter_string(base_level);
    let console_filter =
        EnvFilter::try_new(&filter).with_context(|| format!("Invalid log filter: {}", filter))?;

    let mut layers: Vec<BoxedLayer> = Vec::new();
    layers.push(
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_filter(console_filter)
            .boxed(),
    );

    #[cfg(feature = "file-logging")]
    let (file_guard, run_folder) = match log_dir {
        Some(base) => {
            let (layer, guard, run_folder) = file_layer(base, &filter)?;
            layers.push(layer);
            (Some(guard), Some(run_folder))
        }
        None => (None, None),
    };

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    #[cfg(feature = "file-logging")]
    let guard = LoggingGuard {
        _file_guard: file_guard,
        log_dir: run_folder,
    };

    #[cfg(not(feature = "file-logging"))]
    let guard = {
        if let Some(dir) = log_dir {
            tracing::warn!(
                "File logging not compiled in; ignoring log directory {}",
                dir.display()
            );
        }
        LoggingGuard { log_dir: None }
    };

    Ok(guard)
}

/// Console-only logging at `info`
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, "info", None)
}

#[cfg(feature = "file-logging")]
fn file_layer(
    base_log_dir: &Path,
    filter: &str,
) -> Result<(BoxedLayer, tracing_appender::non_blocking::WorkerGuard, PathBuf)> {
    let timestamp = chrono::Utc::now().format(RUN_FOLDER_FORMAT);
    let run_folder = base_log_dir.join(format!("{}{}", RUN_FOLDER_PREFIX, timestamp));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

    cleanup_old_runs(base_log_dir, DEFAULT_RETENTION_RUNS)?;

    let appender = tracing_appender::rolling::daily(&run_folder, "ts300.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(EnvFilter::try_new(filter)?)
        .boxed();

    Ok((layer, guard, run_folder))
}

/// Remove the oldest `run_*` folders so at most `keep` remain.
///
/// Folders whose name does not carry a run timestamp are left alone. Returns
/// how many were removed.
pub fn cleanup_old_runs(base_log_dir: &Path, keep: usize) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }

    let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let started = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix(RUN_FOLDER_PREFIX))
            .and_then(|stamp| NaiveDateTime::parse_from_str(stamp, RUN_FOLDER_FORMAT).ok());
        if let Some(started) = started {
            runs.push((path, started));
        }
    }

    if runs.len() <= keep {
        return Ok(0);
    }

    // Oldest first
    runs.sort_by_key(|(_, started)| *started);
    let excess = runs.len() - keep;
    let mut removed = 0;
    for (path, _) in runs.iter().take(excess) {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove old log directory {}", path.display()))?;
        removed += 1;
    }
    Ok(removed)
}
