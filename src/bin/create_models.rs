//! 3D model reconstruction for one capture directory.
//!
//! Thin wrapper over the library: parse args, run a single headless
//! reconstruction, and exit non-zero if the external tool failed.

use anyhow::Result;
use clap::Parser;

use scanops_rs::{CancelToken, ModelArgs, ModelBuilder, ProcessRunner};

fn main() -> Result<()> {
    let args = ModelArgs::parse();
    scanops_rs::logging::init(args.verbose);

    let builder = ModelBuilder::new(args, ProcessRunner);
    builder.run(&CancelToken::new())?;
    Ok(())
}
