use crate::segmentation::domain::foreground_mask::ForegroundMask;
use crate::segmentation::domain::probability_mask::ProbabilityMask;
use crate::shared::frame::{Frame, CHANNELS};
use crate::shared::roi::RoiRect;

use super::background_blurrer::BackgroundBlurrer;
use super::blur_strength::BlurStrength;
use super::composite_error::CompositeError;
use super::compositor_config::CompositorConfig;

/// Combines the sharp subject of a frame with a blurred copy of its
/// background.
///
/// Each call is a pure function of `(frame, mask, raw_strength)`: the inputs
/// are never modified and identical inputs give byte-identical output.
pub struct Compositor {
    config: CompositorConfig,
    blurrer: Box<dyn BackgroundBlurrer>,
}

impl Compositor {
    pub fn new(
        config: CompositorConfig,
        blurrer: Box<dyn BackgroundBlurrer>,
    ) -> Result<Self, CompositeError> {
        config.validate()?;
        Ok(Self { config, blurrer })
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    pub fn normalize(&self, raw_strength: i64) -> Result<BlurStrength, CompositeError> {
        BlurStrength::normalize(raw_strength, self.config.min_strength)
    }

    /// Foreground pixels are copied from `frame`; every other pixel comes
    /// from the frame blurred with the normalized `raw_strength`.
    pub fn composite(
        &self,
        frame: &Frame,
        mask: &ProbabilityMask,
        raw_strength: i64,
    ) -> Result<Frame, CompositeError> {
        if mask.width() != frame.width() || mask.height() != frame.height() {
            return Err(CompositeError::DimensionMismatch {
                frame_width: frame.width(),
                frame_height: frame.height(),
                mask_width: mask.width(),
                mask_height: mask.height(),
            });
        }

        let foreground = ForegroundMask::from_probabilities(mask, self.config.threshold);
        let strength = self.normalize(raw_strength)?;
        let mut output = frame.data().to_vec();

        // Only the box around background pixels is blurred; the blurrer
        // guarantees those values match a full-frame blur.
        let Some(bounds) = foreground.background_bounds() else {
            return Ok(frame.with_data(output));
        };
        let blurred = self
            .blurrer
            .blur_roi(frame, strength.kernel_size(), bounds)?;

        let fw = frame.width() as usize;
        let flags = foreground.as_slice();
        for row in 0..bounds.h {
            let y = bounds.y + row;
            for col in 0..bounds.w {
                let x = bounds.x + col;
                if flags[y * fw + x] {
                    continue;
                }
                let dst = (y * fw + x) * CHANNELS;
                let src = (row * bounds.w + col) * CHANNELS;
                output[dst..dst + CHANNELS].copy_from_slice(&blurred[src..src + CHANNELS]);
            }
        }

        log::debug!(
            "Composited frame {} (strength={}, foreground={}/{})",
            frame.index(),
            strength.value(),
            foreground.foreground_count(),
            flags.len()
        );

        Ok(frame.with_data(output))
    }

    /// The full background layer: `frame` blurred with the normalized strength.
    pub fn blurred(&self, frame: &Frame, raw_strength: i64) -> Result<Frame, CompositeError> {
        let strength = self.normalize(raw_strength)?;
        let full = RoiRect::full(frame.width() as usize, frame.height() as usize);
        if full.is_empty() {
            return Ok(frame.clone());
        }
        let data = self.blurrer.blur_roi(frame, strength.kernel_size(), full)?;
        Ok(frame.with_data(data))
    }
}
