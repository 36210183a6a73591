use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop flag flipped by Ctrl-C or by the presenter.
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token that Ctrl-C cancels. Call once per process.
    pub fn install_ctrlc() -> Result<Self> {
        let token = Self::new();
        let handler_token = token.clone();
        ctrlc::set_handler(move || {
            handler_token.cancel();
        })?;
        Ok(token)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
