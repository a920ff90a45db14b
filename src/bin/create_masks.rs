//! Batch mask creation for capture images.
//!
//! Thin wrapper over the library: parse args, derive the concurrency plan
//! from the host CPU count, dispatch the batch, and exit non-zero if any
//! work item failed.

use anyhow::{bail, Result};
use clap::Parser;
use tracing::error;

use scanops_rs::{CancelToken, ConcurrencyPlan, MaskArgs, MaskBatch, ProcessRunner};

fn main() -> Result<()> {
    let args = MaskArgs::parse();
    scanops_rs::logging::init(args.verbose);

    let plan = ConcurrencyPlan::detect(args.workers, args.threads_per_worker);
    let batch = MaskBatch::new(args, plan, ProcessRunner);
    let summary = batch.run(&CancelToken::new())?;

    if !summary.is_clean() {
        for failure in &summary.failures {
            error!("{}: {}", failure.source.display(), failure.reason);
        }
        bail!(
            "{} of {} mask jobs failed",
            summary.failures.len(),
            summary.total()
        );
    }
    Ok(())
}
