use std::sync::atomic::{AtomicI64, Ordering};

use crate::compositing::domain::compositor_config::CompositorConfig;
use crate::control::domain::blur_control::BlurControl;

/// Slider-like blur strength shared between threads.
///
/// Writes are clamped to the slider range `[min, max]`; the compositor still
/// normalizes whatever it reads.
pub struct AtomicBlurControl {
    value: AtomicI64,
    min: i64,
    max: i64,
}

impl AtomicBlurControl {
    pub fn new(initial: i64, min: i64, max: i64) -> Self {
        let (min, max) = (min.min(max), max.max(min));
        Self {
            value: AtomicI64::new(initial.clamp(min, max)),
            min,
            max,
        }
    }

    pub fn from_config(config: &CompositorConfig) -> Self {
        Self::new(
            i64::from(config.default_strength),
            i64::from(config.min_strength),
            i64::from(config.max_strength),
        )
    }

    /// Stores `value` clamped to the slider range and returns what was stored.
    pub fn set(&self, value: i64) -> i64 {
        let clamped = value.clamp(self.min, self.max);
        self.value.store(clamped, Ordering::Relaxed);
        clamped
    }

    /// Moves the slider by `delta` and returns the new value.
    pub fn step(&self, delta: i64) -> i64 {
        let (min, max) = (self.min, self.max);
        let previous = self
            .value
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                Some(v.saturating_add(delta).clamp(min, max))
            })
            .unwrap_or_else(|v| v);
        previous.saturating_add(delta).clamp(min, max)
    }

    pub fn range(&self) -> (i64, i64) {
        (self.min, self.max)
    }
}

impl BlurControl for AtomicBlurControl {
    fn current_strength(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_from_config_starts_at_default() {
        let control = AtomicBlurControl::from_config(&CompositorConfig::default());
        assert_eq!(control.current_strength(), 35);
        assert_eq!(control.range(), (5, 99));
    }

    #[test]
    fn test_set_clamps_to_range() {
        let control = AtomicBlurControl::new(35, 5, 99);
        assert_eq!(control.set(120), 99);
        assert_eq!(control.current_strength(), 99);
        assert_eq!(control.set(-3), 5);
        assert_eq!(control.current_strength(), 5);
        assert_eq!(control.set(36), 36);
    }

    #[test]
    fn test_step_moves_and_clamps() {
        let control = AtomicBlurControl::new(95, 5, 99);
        assert_eq!(control.step(2), 97);
        assert_eq!(control.step(2), 99);
        assert_eq!(control.step(2), 99);
        assert_eq!(control.step(-100), 5);
        assert_eq!(control.current_strength(), 5);
    }

    #[test]
    fn test_initial_value_clamped() {
        let control = AtomicBlurControl::new(1000, 5, 99);
        assert_eq!(control.current_strength(), 99);
    }

    #[test]
    fn test_concurrent_writes_are_visible() {
        let control = Arc::new(AtomicBlurControl::new(35, 5, 99));
        let writer = {
            let control = control.clone();
            std::thread::spawn(move || {
                for v in 5..=99 {
                    control.set(v);
                }
            })
        };
        writer.join().unwrap();
        assert_eq!(control.current_strength(), 99);
    }
}
