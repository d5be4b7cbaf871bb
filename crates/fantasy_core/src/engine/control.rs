//! Early termination between trial batches.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared flag another thread can raise to stop a running simulation.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Stop conditions checked before each batch starts. Batches already in
/// flight always finish, so a stopped run still returns whole trials.
#[derive(Debug, Clone, Default)]
pub struct SimulationControl {
    cancel: Option<CancelHandle>,
    deadline: Option<Instant>,
}

impl SimulationControl {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, handle: CancelHandle) -> Self {
        self.cancel = Some(handle);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn should_stop(&self) -> bool {
        if self.cancel.as_ref().is_some_and(CancelHandle::is_cancelled) {
            return true;
        }
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_handle_shared() {
        let handle = CancelHandle::new();
        let control = SimulationControl::unbounded().with_cancel(handle.clone());
        assert!(!control.should_stop());
        handle.cancel();
        assert!(control.should_stop());
    }

    #[test]
    fn test_expired_deadline_stops() {
        let control = SimulationControl::unbounded().with_timeout(Duration::ZERO);
        assert!(control.should_stop());
        assert!(!SimulationControl::unbounded().should_stop());
    }
}
