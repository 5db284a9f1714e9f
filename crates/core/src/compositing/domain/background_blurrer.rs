use crate::shared::frame::Frame;
use crate::shared::roi::RoiRect;

use super::composite_error::CompositeError;

/// Domain interface for producing the blurred background layer.
///
/// Implementations return the pixels of `roi` exactly as they would appear
/// if the *whole* frame had been blurred with a `kernel_size` x
/// `kernel_size` Gaussian (edges replicated at the frame border). This lets
/// the compositor blur only the part of the frame it will actually use.
pub trait BackgroundBlurrer: Send {
    /// Returns `roi.w * roi.h * 3` row-major bytes.
    fn blur_roi(
        &self,
        frame: &Frame,
        kernel_size: usize,
        roi: RoiRect,
    ) -> Result<Vec<u8>, CompositeError>;
}
