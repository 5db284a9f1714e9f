use crate::shared::constants::{
    DEFAULT_BLUR_STRENGTH, DEFAULT_FOREGROUND_THRESHOLD, MAX_BLUR_STRENGTH, MIN_BLUR_STRENGTH,
};

use super::composite_error::CompositeError;

/// Tunables of the background-blur compositor and its control surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositorConfig {
    /// Mask values strictly above this are foreground.
    pub threshold: f32,
    /// Smallest kernel size applied; must be odd.
    pub min_strength: u32,
    /// Initial control-surface value.
    pub default_strength: u32,
    /// Largest value the control surface offers.
    pub max_strength: u32,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_FOREGROUND_THRESHOLD,
            min_strength: MIN_BLUR_STRENGTH,
            default_strength: DEFAULT_BLUR_STRENGTH,
            max_strength: MAX_BLUR_STRENGTH,
        }
    }
}

impl CompositorConfig {
    pub fn validate(&self) -> Result<(), CompositeError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(CompositeError::InvalidParameter(format!(
                "foreground threshold must be between 0.0 and 1.0, got {}",
                self.threshold
            )));
        }
        if self.min_strength == 0 || self.min_strength % 2 == 0 {
            return Err(CompositeError::InvalidParameter(format!(
                "minimum blur strength must be a positive odd integer, got {}",
                self.min_strength
            )));
        }
        if self.max_strength < self.min_strength {
            return Err(CompositeError::InvalidParameter(format!(
                "maximum blur strength {} is below the minimum {}",
                self.max_strength, self.min_strength
            )));
        }
        if !(self.min_strength..=self.max_strength).contains(&self.default_strength) {
            return Err(CompositeError::InvalidParameter(format!(
                "default blur strength {} is outside {}..={}",
                self.default_strength, self.min_strength, self.max_strength
            )));
        }
        Ok(())
    }
}
