//! Operator tools for the photogrammetry capture pipeline.
//!
//! Two independent commands, both thin wrappers over external binaries:
//! `create-masks` runs a bounded-parallel ImageMagick batch that derives a
//! subject mask for every capture image, and `create-models` drives one
//! headless RealityScan reconstruction per capture directory. Work that
//! already produced its output is skipped, so either command can be re-run
//! after a partial failure.

pub mod cancel;
pub mod config;
pub mod errors;
pub mod logging;
pub mod mask_batch;
pub mod model_build;
pub mod plan;
pub mod tool;

pub mod mocks;

pub use cancel::CancelToken;
pub use config::{MaskArgs, ModelArgs};
pub use errors::{Result, ScanOpsError};
pub use mask_batch::{BatchSummary, MaskBatch, WorkItem};
pub use model_build::{ModelBuilder, ModelJob, ModelOutcome};
pub use plan::ConcurrencyPlan;
pub use tool::{ProcessRunner, ToolInvocation, ToolRunner};
