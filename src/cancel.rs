use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shareable cancellation flag for a running batch.
///
/// Once fired it stops dispatch of new work items, and the process runner
/// terminates whatever external processes are still in flight. Cloning hands
/// out another handle to the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
