use std::ffi::OsString;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::errors::{Result, ScanOpsError};

/// A fully resolved external-tool call: program plus ordered argument list.
///
/// Invocations are plain data so tests can assert the exact command line
/// without spawning anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Short program name for log and error messages.
    pub fn program_name(&self) -> String {
        display_name(Path::new(&self.program))
    }
}

pub(crate) fn display_name(program: &Path) -> String {
    program
        .file_name()
        .unwrap_or(program.as_os_str())
        .to_string_lossy()
        .into_owned()
}

/// Abstracts the external-tool call so dispatch logic can be exercised in
/// tests with a recording double instead of real binaries.
pub trait ToolRunner: Send + Sync {
    fn run(&self, invocation: &ToolInvocation, cancel: &CancelToken) -> Result<()>;
}

impl<T: ToolRunner + ?Sized> ToolRunner for &T {
    fn run(&self, invocation: &ToolInvocation, cancel: &CancelToken) -> Result<()> {
        (**self).run(invocation, cancel)
    }
}

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Spawns one OS process per invocation and blocks until it exits, polling
/// the cancellation token while the child runs. On cancellation the child is
/// killed and reaped before returning.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &ToolInvocation, cancel: &CancelToken) -> Result<()> {
        let program = invocation.program_name();
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ScanOpsError::ToolLaunch {
                program: program.clone(),
                source,
            })?;

        // Drain stderr on its own thread; a full pipe would keep the child
        // from ever exiting.
        let stderr_pipe = child.stderr.take();
        let drain = thread::spawn(move || {
            let mut buf = String::new();
            if let Some(mut pipe) = stderr_pipe {
                let _ = pipe.read_to_string(&mut buf);
            }
            buf
        });

        let status = loop {
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                let _ = drain.join();
                return Err(ScanOpsError::Cancelled { program });
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(CANCEL_POLL_INTERVAL),
                Err(source) => {
                    let _ = child.kill();
                    let _ = drain.join();
                    return Err(ScanOpsError::ToolLaunch { program, source });
                }
            }
        };

        let stderr = drain.join().unwrap_or_default();
        if status.success() {
            Ok(())
        } else {
            Err(ScanOpsError::ToolFailed {
                program,
                code: status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            })
        }
    }
}
