use crate::segmentation::domain::probability_mask::ProbabilityMask;
use crate::segmentation::domain::segmenter::Segmenter;
use crate::shared::frame::Frame;

/// Decorator that runs segmentation every N frames, reusing the last mask
/// in between.
///
/// A cached mask is only reused while it still matches the frame size; a
/// size change forces a fresh segmentation and restarts the interval.
pub struct SkipFrameSegmenter {
    inner: Box<dyn Segmenter>,
    skip_interval: usize,
    frames_since_segment: usize,
    last_mask: Option<ProbabilityMask>,
}

impl SkipFrameSegmenter {
    pub fn new(inner: Box<dyn Segmenter>, skip_interval: usize) -> Result<Self, &'static str> {
        if skip_interval < 1 {
            return Err("skip_interval must be >= 1");
        }
        Ok(Self {
            inner,
            skip_interval,
            frames_since_segment: 0,
            last_mask: None,
        })
    }
}

impl Segmenter for SkipFrameSegmenter {
    fn segment(&mut self, frame: &Frame) -> Result<ProbabilityMask, Box<dyn std::error::Error>> {
        let reusable = self.last_mask.as_ref().filter(|m| {
            self.frames_since_segment < self.skip_interval
                && m.width() == frame.width()
                && m.height() == frame.height()
        });

        if let Some(mask) = reusable {
            let mask = mask.clone();
            self.frames_since_segment += 1;
            return Ok(mask);
        }

        // A failed inference leaves no cached mask, so the next frame retries.
        self.last_mask = None;
        let mask = self.inner.segment(frame)?;
        self.last_mask = Some(mask.clone());
        self.frames_since_segment = 1;
        Ok(mask)
    }
}
