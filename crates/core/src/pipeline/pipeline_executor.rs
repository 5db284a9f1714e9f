use std::path::Path;
use std::sync::Arc;

use crate::compositing::domain::compositor::Compositor;
use crate::control::domain::blur_control::BlurControl;
use crate::control::domain::stop_signal::StopSignal;
use crate::segmentation::domain::segmenter::Segmenter;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::pipeline_logger::PipelineLogger;

/// Progress callback: `(frames_read, total_frames)`; returning `false`
/// stops the loop as if the stop signal had fired.
pub type ProgressFn = Box<dyn Fn(usize, usize) -> bool + Send>;

/// Runtime collaborators for one frame-loop run.
pub struct PipelineConfig {
    pub control: Arc<dyn BlurControl>,
    pub stop: Arc<dyn StopSignal>,
    pub logger: Box<dyn PipelineLogger>,
    pub on_progress: Option<ProgressFn>,
}

/// Why the frame loop ended. Both are clean terminations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The source ran out of frames.
    StreamEnded,
    /// A stop was requested between iterations.
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames_read: usize,
    pub frames_written: usize,
    pub frames_skipped: usize,
    pub outcome: LoopOutcome,
}

impl Default for LoopSummary {
    fn default() -> Self {
        Self {
            frames_read: 0,
            frames_written: 0,
            frames_skipped: 0,
            outcome: LoopOutcome::StreamEnded,
        }
    }
}

/// Abstracts how the read → segment → composite → write loop is executed.
///
/// Implementations open the writer, close both ends before returning, and
/// treat only reader/writer failures as errors.
pub trait PipelineExecutor: Send {
    #[allow(clippy::too_many_arguments)]
    fn execute(
        &self,
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        segmenter: Box<dyn Segmenter>,
        compositor: Compositor,
        metadata: &VideoMetadata,
        output_path: &Path,
        config: PipelineConfig,
    ) -> Result<LoopSummary, Box<dyn std::error::Error>>;
}
