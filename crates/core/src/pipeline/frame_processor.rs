use std::time::Instant;

use crate::compositing::domain::compositor::Compositor;
use crate::control::domain::blur_control::BlurControl;
use crate::segmentation::domain::segmenter::Segmenter;
use crate::shared::frame::Frame;

use super::pipeline_logger::{PipelineLogger, STAGE_COMPOSITE, STAGE_SEGMENT};

/// Per-frame work shared by every executor: segment, take one strength
/// snapshot, composite.
pub struct FrameProcessor {
    segmenter: Box<dyn Segmenter>,
    compositor: Compositor,
}

impl FrameProcessor {
    pub fn new(segmenter: Box<dyn Segmenter>, compositor: Compositor) -> Self {
        Self {
            segmenter,
            compositor,
        }
    }

    /// Composites one frame, or returns `None` when the frame must be
    /// skipped. Segmentation and composite failures only affect this frame;
    /// they are reported to `logger` and never abort the loop.
    pub fn process(
        &mut self,
        frame: &Frame,
        control: &dyn BlurControl,
        logger: &mut dyn PipelineLogger,
    ) -> Option<Frame> {
        let t0 = Instant::now();
        let mask = match self.segmenter.segment(frame) {
            Ok(mask) => mask,
            Err(e) => {
                logger.skipped(frame.index(), &format!("segmentation failed: {e}"));
                return None;
            }
        };
        logger.timing(STAGE_SEGMENT, t0.elapsed().as_secs_f64() * 1000.0);

        let strength = control.current_strength();

        let t1 = Instant::now();
        let output = match self.compositor.composite(frame, &mask, strength) {
            Ok(output) => output,
            Err(e) => {
                logger.skipped(frame.index(), &e.to_string());
                return None;
            }
        };
        logger.timing(STAGE_COMPOSITE, t1.elapsed().as_secs_f64() * 1000.0);

        Some(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositing::domain::compositor_config::CompositorConfig;
    use crate::compositing::infrastructure::cpu_gaussian_blurrer::CpuGaussianBlurrer;
    use crate::pipeline::pipeline_logger::StdoutPipelineLogger;
    use crate::segmentation::domain::probability_mask::ProbabilityMask;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct FixedControl(AtomicI64);

    impl BlurControl for FixedControl {
        fn current_strength(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct ConstSegmenter(f32);

    impl Segmenter for ConstSegmenter {
        fn segment(
            &mut self,
            frame: &Frame,
        ) -> Result<ProbabilityMask, Box<dyn std::error::Error>> {
            Ok(ProbabilityMask::filled(frame.width(), frame.height(), self.0))
        }
    }

    struct WrongSizeSegmenter;

    impl Segmenter for WrongSizeSegmenter {
        fn segment(&mut self, _: &Frame) -> Result<ProbabilityMask, Box<dyn std::error::Error>> {
            Ok(ProbabilityMask::filled(2, 2, 0.0))
        }
    }

    struct FailingSegmenter;

    impl Segmenter for FailingSegmenter {
        fn segment(&mut self, _: &Frame) -> Result<ProbabilityMask, Box<dyn std::error::Error>> {
            Err("model crashed".into())
        }
    }

    fn processor(segmenter: Box<dyn Segmenter>) -> FrameProcessor {
        let compositor =
            Compositor::new(CompositorConfig::default(), Box::new(CpuGaussianBlurrer::new()))
                .unwrap();
        FrameProcessor::new(segmenter, compositor)
    }

    fn striped_frame() -> Frame {
        let mut frame = Frame::filled(12, 12, [0, 0, 0], 3);
        for (i, px) in frame.data_mut().chunks_exact_mut(3).enumerate() {
            if i % 2 == 0 {
                px.copy_from_slice(&[255, 255, 255]);
            }
        }
        frame
    }

    #[test]
    fn test_foreground_frame_passes_through() {
        let mut p = processor(Box::new(ConstSegmenter(0.9)));
        let frame = striped_frame();
        let control = FixedControl(AtomicI64::new(35));
        let out = p
            .process(&frame, &control, &mut StdoutPipelineLogger::new(1))
            .unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn test_background_frame_is_blurred() {
        let mut p = processor(Box::new(ConstSegmenter(0.0)));
        let frame = striped_frame();
        let control = FixedControl(AtomicI64::new(7));
        let out = p
            .process(&frame, &control, &mut StdoutPipelineLogger::new(1))
            .unwrap();
        assert_ne!(out, frame);
        assert_eq!(out.index(), 3);
    }

    #[test]
    fn test_records_stage_timings() {
        let mut p = processor(Box::new(ConstSegmenter(0.0)));
        let mut logger = StdoutPipelineLogger::new(1);
        let control = FixedControl(AtomicI64::new(5));
        p.process(&striped_frame(), &control, &mut logger).unwrap();
        assert_eq!(logger.timings_for(STAGE_SEGMENT).unwrap().count, 1);
        assert_eq!(logger.timings_for(STAGE_COMPOSITE).unwrap().count, 1);
    }

    #[test]
    fn test_segmentation_failure_skips_frame() {
        let mut p = processor(Box::new(FailingSegmenter));
        let mut logger = StdoutPipelineLogger::new(1);
        let control = FixedControl(AtomicI64::new(35));
        assert!(p.process(&striped_frame(), &control, &mut logger).is_none());
        assert_eq!(logger.frames_skipped(), 1);
    }

    #[test]
    fn test_dimension_mismatch_skips_frame() {
        let mut p = processor(Box::new(WrongSizeSegmenter));
        let mut logger = StdoutPipelineLogger::new(1);
        let control = FixedControl(AtomicI64::new(35));
        assert!(p.process(&striped_frame(), &control, &mut logger).is_none());
        assert_eq!(logger.frames_skipped(), 1);
    }

    #[test]
    fn test_strength_read_per_frame() {
        let mut p = processor(Box::new(ConstSegmenter(0.0)));
        let frame = striped_frame();
        let control = FixedControl(AtomicI64::new(5));
        let mut logger = StdoutPipelineLogger::new(1);
        let soft = p.process(&frame, &control, &mut logger).unwrap();
        control.0.store(31, Ordering::SeqCst);
        let strong = p.process(&frame, &control, &mut logger).unwrap();
        assert_ne!(soft, strong);
    }
}
