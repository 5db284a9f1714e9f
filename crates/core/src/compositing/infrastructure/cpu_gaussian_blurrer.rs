use std::cell::RefCell;

use crate::compositing::domain::background_blurrer::BackgroundBlurrer;
use crate::compositing::domain::composite_error::CompositeError;
use crate::shared::frame::{Frame, CHANNELS};
use crate::shared::roi::{extract_roi, RoiRect};

use super::gaussian;

/// Weights of the most recently used kernel size, folded to `max_len`.
struct KernelCache {
    size: usize,
    max_len: usize,
    weights: Vec<f32>,
}

/// CPU background blurrer using a separable Gaussian.
///
/// Blurs the requested ROI padded by the kernel radius, so results are
/// identical to blurring the full frame. The kernel is cached between calls:
/// a slider held still does not recompute weights every frame.
pub struct CpuGaussianBlurrer {
    kernel: RefCell<KernelCache>,
    roi_buf: RefCell<Vec<u8>>,
    blur_temp: RefCell<Vec<f32>>,
}

impl CpuGaussianBlurrer {
    pub fn new() -> Self {
        Self {
            kernel: RefCell::new(KernelCache {
                size: 0,
                max_len: 0,
                weights: Vec::new(),
            }),
            roi_buf: RefCell::new(Vec::new()),
            blur_temp: RefCell::new(Vec::new()),
        }
    }
}

impl Default for CpuGaussianBlurrer {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundBlurrer for CpuGaussianBlurrer {
    fn blur_roi(
        &self,
        frame: &Frame,
        kernel_size: usize,
        roi: RoiRect,
    ) -> Result<Vec<u8>, CompositeError> {
        if kernel_size == 0 || kernel_size % 2 == 0 {
            return Err(CompositeError::InvalidParameter(format!(
                "kernel size must be a positive odd integer, got {kernel_size}"
            )));
        }
        let fw = frame.width() as usize;
        let fh = frame.height() as usize;
        if roi.x + roi.w > fw || roi.y + roi.h > fh {
            return Err(CompositeError::InvalidParameter(format!(
                "ROI {roi:?} exceeds {fw}x{fh} frame"
            )));
        }
        if roi.is_empty() {
            return Ok(Vec::new());
        }

        // Folding against the frame, not the ROI, keeps ROI and full-frame
        // blurs on the same weights.
        let max_len = fw.max(fh);
        let mut cache = self.kernel.borrow_mut();
        if cache.size != kernel_size || cache.max_len != max_len {
            log::debug!("Computing Gaussian kernel (kernel_size={kernel_size}, max_len={max_len})");
            cache.weights = gaussian::folded_kernel_1d(kernel_size, max_len);
            cache.size = kernel_size;
            cache.max_len = max_len;
        }

        // Pad by the radius so every ROI pixel sees the same neighborhood
        // as in a full-frame blur; padding stops at the frame border, where
        // both versions replicate edge pixels.
        let padded = roi.expand(cache.weights.len() / 2, fw, fh);
        let mut buf = self.roi_buf.borrow_mut();
        extract_roi(frame.data(), fw, CHANNELS, padded, &mut buf);

        let mut temp = self.blur_temp.borrow_mut();
        gaussian::separable_gaussian_blur_with_kernel(
            &mut buf,
            padded.w,
            padded.h,
            CHANNELS,
            &cache.weights,
            &mut temp,
        );

        let row_len = roi.w * CHANNELS;
        let mut out = Vec::with_capacity(roi.h * row_len);
        for row in 0..roi.h {
            let start = ((roi.y - padded.y + row) * padded.w + (roi.x - padded.x)) * CHANNELS;
            out.extend_from_slice(&buf[start..start + row_len]);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[
                    (x * 255 / width.max(1)) as u8,
                    (y * 255 / height.max(1)) as u8,
                    ((x * 31 + y * 17) % 256) as u8,
                ]);
            }
        }
        Frame::new(data, width, height, 0)
    }

    fn full_blur(frame: &Frame, kernel_size: usize) -> Vec<u8> {
        let blurrer = CpuGaussianBlurrer::new();
        let full = RoiRect::full(frame.width() as usize, frame.height() as usize);
        blurrer.blur_roi(frame, kernel_size, full).unwrap()
    }

    fn crop(data: &[u8], frame_width: usize, rect: RoiRect) -> Vec<u8> {
        let mut out = Vec::new();
        extract_roi(data, frame_width, CHANNELS, rect, &mut out);
        out
    }

    #[test]
    fn test_full_roi_blurs_frame() {
        let frame = gradient_frame(20, 20);
        let blurred = full_blur(&frame, 5);
        assert_eq!(blurred.len(), frame.data().len());
        assert_ne!(blurred, frame.data());
    }

    #[test]
    fn test_roi_matches_full_frame_blur() {
        let frame = gradient_frame(40, 30);
        let rects = [
            RoiRect { x: 0, y: 0, w: 5, h: 5 },
            RoiRect { x: 15, y: 10, w: 8, h: 6 },
            RoiRect { x: 35, y: 25, w: 5, h: 5 },
            RoiRect { x: 1, y: 28, w: 38, h: 2 },
        ];
        for kernel_size in [5, 11, 35, 99] {
            let full = full_blur(&frame, kernel_size);
            let blurrer = CpuGaussianBlurrer::new();
            for rect in rects {
                let roi = blurrer.blur_roi(&frame, kernel_size, rect).unwrap();
                assert_eq!(roi, crop(&full, 40, rect), "kernel {kernel_size} rect {rect:?}");
            }
        }
    }

    #[test]
    fn test_kernel_cache_follows_size_changes() {
        let frame = gradient_frame(16, 16);
        let blurrer = CpuGaussianBlurrer::new();
        let full = RoiRect::full(16, 16);

        let a = blurrer.blur_roi(&frame, 5, full).unwrap();
        let b = blurrer.blur_roi(&frame, 9, full).unwrap();
        let a_again = blurrer.blur_roi(&frame, 5, full).unwrap();

        assert_ne!(a, b);
        assert_eq!(a, a_again);
        assert_eq!(blurrer.kernel.borrow().size, 5);
    }

    #[test]
    fn test_kernel_wider_than_frame_stays_frame_sized() {
        let frame = gradient_frame(6, 4);
        let blurrer = CpuGaussianBlurrer::new();
        let full = RoiRect::full(6, 4);

        let huge = blurrer.blur_roi(&frame, u32::MAX as usize, full).unwrap();
        assert_eq!(huge.len(), frame.data().len());
        assert_eq!(blurrer.kernel.borrow().weights.len(), 11);

        let rect = RoiRect { x: 4, y: 2, w: 2, h: 2 };
        let roi = blurrer.blur_roi(&frame, u32::MAX as usize, rect).unwrap();
        assert_eq!(roi, crop(&huge, 6, rect));
    }

    #[test]
    fn test_even_or_zero_kernel_rejected() {
        let frame = gradient_frame(8, 8);
        let blurrer = CpuGaussianBlurrer::new();
        for size in [0, 4] {
            let err = blurrer.blur_roi(&frame, size, RoiRect::full(8, 8)).unwrap_err();
            assert!(matches!(err, CompositeError::InvalidParameter(_)));
        }
    }

    #[test]
    fn test_roi_outside_frame_rejected() {
        let frame = gradient_frame(8, 8);
        let blurrer = CpuGaussianBlurrer::new();
        let rect = RoiRect { x: 6, y: 0, w: 4, h: 2 };
        assert!(blurrer.blur_roi(&frame, 5, rect).is_err());
    }

    #[test]
    fn test_empty_roi_returns_nothing() {
        let frame = gradient_frame(8, 8);
        let blurrer = CpuGaussianBlurrer::new();
        let rect = RoiRect { x: 2, y: 2, w: 0, h: 3 };
        assert!(blurrer.blur_roi(&frame, 5, rect).unwrap().is_empty());
    }
}
