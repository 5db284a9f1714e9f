use crate::shared::roi::RoiRect;

use super::probability_mask::ProbabilityMask;

/// Boolean subject/background classification derived from a
/// [`ProbabilityMask`] by a strict threshold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForegroundMask {
    foreground: Vec<bool>,
    width: u32,
    height: u32,
}

impl ForegroundMask {
    /// A pixel is foreground when its probability is strictly greater than
    /// `threshold`. NaN never compares greater, so it classifies as background.
    pub fn from_probabilities(mask: &ProbabilityMask, threshold: f32) -> Self {
        Self {
            foreground: mask.values().iter().map(|&v| v > threshold).collect(),
            width: mask.width(),
            height: mask.height(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.foreground[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Row-major flags, one per pixel.
    pub fn as_slice(&self) -> &[bool] {
        &self.foreground
    }

    pub fn foreground_count(&self) -> usize {
        self.foreground.iter().filter(|&&f| f).count()
    }

    /// Smallest rectangle containing every background pixel, or `None` when
    /// the whole frame is foreground.
    pub fn background_bounds(&self) -> Option<RoiRect> {
        let w = self.width as usize;
        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        let mut any = false;

        for (i, &fg) in self.foreground.iter().enumerate() {
            if fg {
                continue;
            }
            let (x, y) = (i % w, i / w);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
            any = true;
        }

        any.then(|| RoiRect {
            x: min_x,
            y: min_y,
            w: max_x - min_x + 1,
            h: max_y - min_y + 1,
        })
    }
}
