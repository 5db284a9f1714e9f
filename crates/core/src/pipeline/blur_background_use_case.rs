use std::path::Path;
use std::sync::Arc;

use crate::compositing::domain::compositor::Compositor;
use crate::control::domain::blur_control::BlurControl;
use crate::control::domain::stop_signal::StopSignal;
use crate::segmentation::domain::segmenter::Segmenter;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::pipeline_executor::{LoopSummary, PipelineConfig, PipelineExecutor, ProgressFn};
use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};

/// Orchestrates the live background-blur loop.
///
/// Wires the frame source, segmenter, compositor and sink together and
/// delegates execution to a `PipelineExecutor`. Single-use: `execute`
/// consumes the owned components, so a second call fails.
pub struct BlurBackgroundUseCase {
    reader: Option<Box<dyn VideoReader>>,
    writer: Option<Box<dyn VideoWriter>>,
    segmenter: Option<Box<dyn Segmenter>>,
    compositor: Option<Compositor>,
    executor: Box<dyn PipelineExecutor>,
    control: Arc<dyn BlurControl>,
    stop: Arc<dyn StopSignal>,
    logger: Option<Box<dyn PipelineLogger>>,
    on_progress: Option<ProgressFn>,
}

impl BlurBackgroundUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        segmenter: Box<dyn Segmenter>,
        compositor: Compositor,
        executor: Box<dyn PipelineExecutor>,
        control: Arc<dyn BlurControl>,
        stop: Arc<dyn StopSignal>,
    ) -> Self {
        Self {
            reader: Some(reader),
            writer: Some(writer),
            segmenter: Some(segmenter),
            compositor: Some(compositor),
            executor,
            control,
            stop,
            logger: None,
            on_progress: None,
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_progress(mut self, on_progress: ProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    /// Runs until the source ends or a stop is requested.
    pub fn execute(
        &mut self,
        metadata: &VideoMetadata,
        output_path: &Path,
    ) -> Result<LoopSummary, Box<dyn std::error::Error>> {
        let config = PipelineConfig {
            control: Arc::clone(&self.control),
            stop: Arc::clone(&self.stop),
            logger: self
                .logger
                .take()
                .unwrap_or_else(|| Box::new(NullPipelineLogger)),
            on_progress: self.on_progress.take(),
        };

        let summary = self.executor.execute(
            self.reader.take().ok_or("Pipeline already executed")?,
            self.writer.take().ok_or("Pipeline already executed")?,
            self.segmenter.take().ok_or("Pipeline already executed")?,
            self.compositor.take().ok_or("Pipeline already executed")?,
            metadata,
            output_path,
            config,
        )?;

        log::info!(
            "Finished ({:?}): {} frames read, {} written, {} skipped",
            summary.outcome,
            summary.frames_read,
            summary.frames_written,
            summary.frames_skipped
        );
        Ok(summary)
    }
}
