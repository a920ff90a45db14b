use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::cancel::CancelToken;
use crate::config::MaskArgs;
use crate::errors::{Result, ScanOpsError};
use crate::plan::ConcurrencyPlan;
use crate::tool::{self, ToolInvocation, ToolRunner};

const MASK_SUFFIX: &str = ".mask.png";

/// One capture image and its derived mask output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub source: PathBuf,
    pub mask_path: PathBuf,
}

enum ItemOutcome {
    Completed,
    Skipped,
}

/// One work item that did not produce a mask.
#[derive(Debug, Clone)]
pub struct ItemFailure {
    pub source: PathBuf,
    pub reason: String,
}

/// Aggregate result of a batch run. Failed items are collected instead of
/// aborting the batch; the caller decides the exit status from `is_clean`.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failures: Vec<ItemFailure>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.completed + self.skipped + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// True for the capture formats the cameras produce.
pub fn is_capture_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg"))
}

fn mask_file_name(source: &Path) -> OsString {
    let mut name = source.file_stem().unwrap_or_default().to_os_string();
    name.push(MASK_SUFFIX);
    name
}

/// Mask path for a source image: same directory, extension replaced by the
/// mask suffix. `foo/bar.jpg` becomes `foo/bar.mask.png`. Downstream tooling
/// depends on this naming.
pub fn mask_path_for(source: &Path) -> PathBuf {
    source.with_file_name(mask_file_name(source))
}

/// Enumerate capture images under `input_dir` and pair each with its mask
/// path. With an output root, the path relative to `input_dir` is re-rooted
/// there; otherwise masks live alongside their sources.
pub fn discover(input_dir: &Path, output_root: Option<&Path>) -> Vec<WorkItem> {
    WalkDir::new(input_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_capture_image(entry.path()))
        .map(|entry| {
            let source = entry.into_path();
            let mask_path = match output_root {
                Some(root) => {
                    let relative = source.strip_prefix(input_dir).unwrap_or(&source);
                    root.join(relative).with_file_name(mask_file_name(&source))
                }
                None => mask_path_for(&source),
            };
            WorkItem { source, mask_path }
        })
        .collect()
}

/// The fixed masking pipeline: grayscale, blur, auto-level, percentage
/// threshold, keep the two largest 8-connected components, binarize. The
/// thread limit caps the tool's internal parallelism so concurrent workers do
/// not oversubscribe the host.
pub fn mask_invocation(tool: &Path, item: &WorkItem, threads_per_worker: usize) -> ToolInvocation {
    ToolInvocation::new(tool)
        .arg("-limit")
        .arg("thread")
        .arg(threads_per_worker.to_string())
        .arg(&item.source)
        .arg("-colorspace")
        .arg("Gray")
        .arg("-blur")
        .arg("0x4")
        .arg("-auto-level")
        .arg("-threshold")
        .arg("4%")
        .arg("-define")
        .arg("connected-components:keep-top=2")
        .arg("-connected-components")
        .arg("8")
        .arg("-type")
        .arg("bilevel")
        .arg(&item.mask_path)
}

/// Bounded-parallel mask generation over a directory of capture images.
///
/// Work items are independent: each derives its mask path, skips if the mask
/// already exists, and otherwise spawns one external masking process. At most
/// `plan.workers` processes run at a time, and `run` returns only after every
/// dispatched item has finished. A failed item is recorded and the rest of
/// the batch keeps going, so a re-run after a partial failure redoes only
/// what is missing.
pub struct MaskBatch<R> {
    args: MaskArgs,
    plan: ConcurrencyPlan,
    runner: R,
}

impl<R: ToolRunner> MaskBatch<R> {
    pub const fn new(args: MaskArgs, plan: ConcurrencyPlan, runner: R) -> Self {
        Self { args, plan, runner }
    }

    pub fn run(&self, cancel: &CancelToken) -> Result<BatchSummary> {
        let input_dir = &self.args.input_dir;
        if !input_dir.is_dir() {
            return Err(ScanOpsError::InputNotFound {
                path: input_dir.clone(),
            });
        }

        let items = discover(input_dir, self.args.output.as_deref());
        if items.is_empty() {
            info!("no capture images found under {}", input_dir.display());
            return Ok(BatchSummary::default());
        }

        info!(
            images = items.len(),
            workers = self.plan.workers,
            threads_per_worker = self.plan.threads_per_worker,
            "dispatching mask jobs"
        );

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.plan.workers)
            .build()
            .map_err(|e| ScanOpsError::Configuration {
                message: format!("failed to build worker pool: {e}"),
            })?;

        let progress = ProgressBar::new(items.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .unwrap()
                .progress_chars("#>-"),
        );

        let completed = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);
        let failures = Mutex::new(Vec::new());

        pool.install(|| {
            items.par_iter().for_each(|item| {
                match self.process_item(item, cancel) {
                    Ok(ItemOutcome::Completed) => {
                        completed.fetch_add(1, Ordering::Relaxed);
                        debug!("masked {}", item.source.display());
                    }
                    Ok(ItemOutcome::Skipped) => {
                        skipped.fetch_add(1, Ordering::Relaxed);
                        debug!("mask exists, skipping {}", item.source.display());
                    }
                    Err(err) => {
                        warn!("failed to mask {}: {err}", item.source.display());
                        failures.lock().push(ItemFailure {
                            source: item.source.clone(),
                            reason: err.to_string(),
                        });
                    }
                }
                progress.inc(1);
            });
        });

        progress.finish();

        let summary = BatchSummary {
            completed: completed.load(Ordering::Relaxed),
            skipped: skipped.load(Ordering::Relaxed),
            failures: failures.into_inner(),
        };
        info!(
            completed = summary.completed,
            skipped = summary.skipped,
            failed = summary.failures.len(),
            "mask batch finished"
        );
        Ok(summary)
    }

    fn process_item(&self, item: &WorkItem, cancel: &CancelToken) -> Result<ItemOutcome> {
        if cancel.is_cancelled() {
            return Err(ScanOpsError::Cancelled {
                program: tool::display_name(&self.args.tool),
            });
        }

        if !self.args.overwrite && item.mask_path.exists() {
            return Ok(ItemOutcome::Skipped);
        }

        if let Some(parent) = item.mask_path.parent() {
            fs::create_dir_all(parent).map_err(|source| ScanOpsError::FileSystem {
                path: parent.to_path_buf(),
                operation: "create output directory".to_string(),
                source,
            })?;
        }

        let invocation = mask_invocation(&self.args.tool, item, self.plan.threads_per_worker);
        self.runner.run(&invocation, cancel)?;
        Ok(ItemOutcome::Completed)
    }
}
