use crate::shared::frame::Frame;

use super::probability_mask::ProbabilityMask;

/// Domain interface for person segmentation.
///
/// Returns a probability mask with the same width and height as `frame`.
/// Implementations may be stateful (recurrent models, frame skipping),
/// hence `&mut self`.
pub trait Segmenter: Send {
    fn segment(&mut self, frame: &Frame) -> Result<ProbabilityMask, Box<dyn std::error::Error>>;
}
