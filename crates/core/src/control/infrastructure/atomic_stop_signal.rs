use std::sync::atomic::{AtomicBool, Ordering};

use crate::control::domain::stop_signal::StopSignal;

/// Stop flag that any thread can raise.
#[derive(Default)]
pub struct AtomicStopSignal {
    stopped: AtomicBool,
}

impl AtomicStopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }
}

impl StopSignal for AtomicStopSignal {
    fn should_stop(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_clear_and_latches() {
        let signal = AtomicStopSignal::new();
        assert!(!signal.should_stop());
        signal.request_stop();
        assert!(signal.should_stop());
        signal.request_stop();
        assert!(signal.should_stop());
    }
}
