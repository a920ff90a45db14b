use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::cancel::CancelToken;
use crate::errors::{Result, ScanOpsError};
use crate::tool::{ToolInvocation, ToolRunner};

/// Test double for the external tools: records every invocation, tracks how
/// many run concurrently, and optionally sleeps, fails, or writes the output
/// file the real tool would have produced.
#[derive(Debug, Default)]
pub struct MockToolRunner {
    invocations: Mutex<Vec<ToolInvocation>>,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    delays: Vec<Duration>,
    write_outputs: bool,
    fail_paths: Vec<PathBuf>,
}

impl MockToolRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for the given duration on every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delays = vec![delay];
        self
    }

    /// Sleep per call, cycling through the given durations in dispatch order.
    pub fn with_staggered_delays(mut self, delays: Vec<Duration>) -> Self {
        self.delays = delays;
        self
    }

    /// Write a placeholder file at the invocation's final argument, the way
    /// the masking tool writes its output path.
    pub fn with_output_writing(mut self) -> Self {
        self.write_outputs = true;
        self
    }

    /// Fail any invocation whose arguments mention the given path.
    pub fn with_failure_for(mut self, path: impl Into<PathBuf>) -> Self {
        self.fail_paths.push(path.into());
        self
    }

    pub fn invocations(&self) -> Vec<ToolInvocation> {
        self.invocations.lock().clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().len()
    }

    /// Highest number of invocations that were in flight at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn should_fail(&self, invocation: &ToolInvocation) -> bool {
        invocation.args.iter().any(|arg| {
            self.fail_paths
                .iter()
                .any(|path| Path::new(arg) == path.as_path())
        })
    }
}

impl ToolRunner for MockToolRunner {
    fn run(&self, invocation: &ToolInvocation, cancel: &CancelToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(ScanOpsError::Cancelled {
                program: invocation.program_name(),
            });
        }

        self.invocations.lock().push(invocation.clone());
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        if !self.delays.is_empty() {
            std::thread::sleep(self.delays[call % self.delays.len()]);
        }

        let result = if self.should_fail(invocation) {
            Err(ScanOpsError::ToolFailed {
                program: invocation.program_name(),
                code: 1,
                stderr: "simulated failure".to_string(),
            })
        } else if self.write_outputs {
            match invocation.args.last() {
                Some(output) => {
                    fs::write(Path::new(output), b"mock output").map_err(|source| {
                        ScanOpsError::FileSystem {
                            path: PathBuf::from(output),
                            operation: "write mock output".to_string(),
                            source,
                        }
                    })
                }
                None => Ok(()),
            }
        } else {
            Ok(())
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
