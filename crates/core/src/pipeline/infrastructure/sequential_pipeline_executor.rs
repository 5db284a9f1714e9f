use std::path::Path;
use std::time::Instant;

use crate::compositing::domain::compositor::Compositor;
use crate::pipeline::frame_processor::FrameProcessor;
use crate::pipeline::pipeline_executor::{
    LoopOutcome, LoopSummary, PipelineConfig, PipelineExecutor,
};
use crate::pipeline::pipeline_logger::STAGE_WRITE;
use crate::segmentation::domain::segmenter::Segmenter;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

/// Runs the whole loop on the calling thread, one frame at a time.
///
/// Lowest latency per frame; the natural choice for a live camera.
pub struct SequentialPipelineExecutor;

impl SequentialPipelineExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SequentialPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor for SequentialPipelineExecutor {
    fn execute(
        &self,
        mut reader: Box<dyn VideoReader>,
        mut writer: Box<dyn VideoWriter>,
        segmenter: Box<dyn Segmenter>,
        compositor: Compositor,
        metadata: &VideoMetadata,
        output_path: &Path,
        mut config: PipelineConfig,
    ) -> Result<LoopSummary, Box<dyn std::error::Error>> {
        if let Err(e) = writer.open(output_path, metadata) {
            reader.close();
            return Err(e);
        }

        let mut processor = FrameProcessor::new(segmenter, compositor);
        let result = run_loop(
            &mut *reader,
            &mut *writer,
            &mut processor,
            metadata.total_frames,
            &mut config,
        );

        reader.close();
        let close_result = writer.close();
        let summary = result?;
        close_result?;

        config.logger.summary();
        Ok(summary)
    }
}

fn run_loop(
    reader: &mut dyn VideoReader,
    writer: &mut dyn VideoWriter,
    processor: &mut FrameProcessor,
    total_frames: usize,
    config: &mut PipelineConfig,
) -> Result<LoopSummary, Box<dyn std::error::Error>> {
    let mut summary = LoopSummary::default();

    for frame_result in reader.frames() {
        let frame = frame_result?;
        summary.frames_read += 1;

        match processor.process(&frame, &*config.control, &mut *config.logger) {
            Some(output) => {
                let t0 = Instant::now();
                writer.write(&output)?;
                config
                    .logger
                    .timing(STAGE_WRITE, t0.elapsed().as_secs_f64() * 1000.0);
                summary.frames_written += 1;
            }
            None => summary.frames_skipped += 1,
        }

        config.logger.progress(summary.frames_read, total_frames);
        let keep_going = config
            .on_progress
            .as_ref()
            .map_or(true, |callback| callback(summary.frames_read, total_frames));

        if !keep_going || config.stop.should_stop() {
            summary.outcome = LoopOutcome::Stopped;
            break;
        }
    }

    log::debug!("Frame loop finished: {summary:?}");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositing::domain::compositor_config::CompositorConfig;
    use crate::compositing::infrastructure::cpu_gaussian_blurrer::CpuGaussianBlurrer;
    use crate::control::infrastructure::atomic_blur_control::AtomicBlurControl;
    use crate::control::infrastructure::atomic_stop_signal::AtomicStopSignal;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::segmentation::domain::probability_mask::ProbabilityMask;
    use crate::shared::frame::Frame;
    use std::sync::{Arc, Mutex};

    struct VecReader(Vec<Result<Frame, String>>);

    impl VideoReader for VecReader {
        fn open(&mut self, _: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            Err("unused".into())
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(
                self.0
                    .drain(..)
                    .map(|r| r.map_err(|e| -> Box<dyn std::error::Error> { e.into() })),
            )
        }

        fn close(&mut self) {}
    }

    struct CollectingWriter(Arc<Mutex<Vec<usize>>>);

    impl VideoWriter for CollectingWriter {
        fn open(&mut self, _: &Path, _: &VideoMetadata) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }

        fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.0.lock().unwrap().push(frame.index());
            Ok(())
        }

        fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }
    }

    struct HalfSegmenter;

    impl Segmenter for HalfSegmenter {
        fn segment(
            &mut self,
            frame: &Frame,
        ) -> Result<ProbabilityMask, Box<dyn std::error::Error>> {
            let half = frame.width() / 2;
            Ok(ProbabilityMask::from_fn(frame.width(), frame.height(), |x, _| {
                if x < half {
                    1.0
                } else {
                    0.0
                }
            }))
        }
    }

    fn run(
        frames: Vec<Result<Frame, String>>,
        stop: Arc<AtomicStopSignal>,
    ) -> (Result<LoopSummary, Box<dyn std::error::Error>>, Vec<usize>) {
        let written = Arc::new(Mutex::new(Vec::new()));
        let compositor =
            Compositor::new(CompositorConfig::default(), Box::new(CpuGaussianBlurrer::new()))
                .unwrap();
        let config = PipelineConfig {
            control: Arc::new(AtomicBlurControl::from_config(&CompositorConfig::default())),
            stop,
            logger: Box::new(NullPipelineLogger),
            on_progress: None,
        };
        let meta = VideoMetadata::still(8, 8, "", None);
        let result = SequentialPipelineExecutor::new().execute(
            Box::new(VecReader(frames)),
            Box::new(CollectingWriter(written.clone())),
            Box::new(HalfSegmenter),
            compositor,
            &meta,
            Path::new("out.mp4"),
            config,
        );
        let written = written.lock().unwrap().clone();
        (result, written)
    }

    fn frames(n: usize) -> Vec<Result<Frame, String>> {
        (0..n)
            .map(|i| Ok(Frame::filled(8, 8, [i as u8, 0, 0], i)))
            .collect()
    }

    #[test]
    fn test_stream_end_is_clean() {
        let (result, written) = run(frames(4), Arc::new(AtomicStopSignal::new()));
        let summary = result.unwrap();
        assert_eq!(summary.outcome, LoopOutcome::StreamEnded);
        assert_eq!(summary.frames_read, 4);
        assert_eq!(written, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_stop_requested_before_start_processes_one_frame() {
        let stop = Arc::new(AtomicStopSignal::new());
        stop.request_stop();
        let (result, written) = run(frames(4), stop);
        assert_eq!(result.unwrap().outcome, LoopOutcome::Stopped);
        assert_eq!(written, vec![0]);
    }

    #[test]
    fn test_reader_error_is_fatal() {
        let mut input = frames(2);
        input.push(Err("device unplugged".to_string()));
        input.extend(frames(2));
        let (result, written) = run(input, Arc::new(AtomicStopSignal::new()));
        assert!(result.unwrap_err().to_string().contains("device unplugged"));
        assert_eq!(written, vec![0, 1]);
    }
}
