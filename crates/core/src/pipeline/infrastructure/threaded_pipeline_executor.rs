use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::compositing::domain::compositor::Compositor;
use crate::pipeline::frame_processor::FrameProcessor;
use crate::pipeline::pipeline_executor::{
    LoopOutcome, LoopSummary, PipelineConfig, PipelineExecutor,
};
use crate::segmentation::domain::segmenter::Segmenter;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

const DEFAULT_CHANNEL_CAPACITY: usize = 4;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Executes the frame loop with dedicated threads for decoding and encoding.
///
/// Layout: `reader → main [segment/composite] → writer`
///
/// Segmentation, the strength snapshot and compositing stay on the calling
/// thread, so frames are processed and written strictly in order.
pub struct ThreadedPipelineExecutor {
    channel_capacity: usize,
}

impl ThreadedPipelineExecutor {
    pub fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_channel_capacity(channel_capacity: usize) -> Self {
        Self {
            channel_capacity: channel_capacity.max(1),
        }
    }
}

impl Default for ThreadedPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor for ThreadedPipelineExecutor {
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

        let cap = self.channel_capacity;
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Result<Frame, SendError>>(cap);
        let (write_tx, write_rx) = crossbeam_channel::bounded::<Frame>(cap);
        let halt = Arc::new(AtomicBool::new(false));

        let reader_handle = spawn_reader(reader, frame_tx, Arc::clone(&halt));
        let writer_handle = spawn_writer(writer, write_rx);

        let mut processor = FrameProcessor::new(segmenter, compositor);
        let main_result = run_main_loop(
            frame_rx,
            &write_tx,
            &mut processor,
            metadata.total_frames,
            &mut config,
        );

        halt.store(true, Ordering::Relaxed);
        drop(write_tx);

        let summary = join_threads(reader_handle, writer_handle, main_result)?;
        config.logger.summary();
        Ok(summary)
    }
}

fn spawn_reader(
    mut reader: Box<dyn VideoReader>,
    frame_tx: crossbeam_channel::Sender<Result<Frame, SendError>>,
    halt: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for frame_result in reader.frames() {
            if halt.load(Ordering::Relaxed) {
                break;
            }
            let mapped = frame_result.map_err(|e| -> SendError { e.to_string().into() });
            let failed = mapped.is_err();
            if frame_tx.send(mapped).is_err() || failed {
                break;
            }
        }
        reader.close();
    })
}

fn spawn_writer(
    mut writer: Box<dyn VideoWriter>,
    write_rx: crossbeam_channel::Receiver<Frame>,
) -> std::thread::JoinHandle<Result<(), SendError>> {
    std::thread::spawn(move || {
        for frame in write_rx {
            if let Err(e) = writer.write(&frame) {
                if let Err(close_err) = writer.close() {
                    log::warn!("Closing writer after failure: {close_err}");
                }
                return Err(e.to_string().into());
            }
        }
        writer
            .close()
            .map_err(|e| -> SendError { e.to_string().into() })
    })
}

/// Receives decoded frames, composites them and hands them to the writer.
fn run_main_loop(
    frame_rx: crossbeam_channel::Receiver<Result<Frame, SendError>>,
    write_tx: &crossbeam_channel::Sender<Frame>,
    processor: &mut FrameProcessor,
    total_frames: usize,
    config: &mut PipelineConfig,
) -> Result<LoopSummary, Box<dyn std::error::Error>> {
    let mut summary = LoopSummary::default();

    for received in frame_rx.iter() {
        config
            .logger
            .metric("reader_queue_depth", frame_rx.len() as f64);
        let frame = received.map_err(|e| -> Box<dyn std::error::Error> { e.to_string().into() })?;
        summary.frames_read += 1;

        match processor.process(&frame, &*config.control, &mut *config.logger) {
            Some(output) => {
                // A closed channel means the writer failed; its error is
                // reported when the thread is joined.
                if write_tx.send(output).is_err() {
                    break;
                }
                summary.frames_written += 1;
                config
                    .logger
                    .metric("writer_queue_depth", write_tx.len() as f64);
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

/// Joins both helper threads. An error from the main loop wins over thread
/// errors; otherwise the first thread error is reported.
fn join_threads(
    reader_handle: std::thread::JoinHandle<()>,
    writer_handle: std::thread::JoinHandle<Result<(), SendError>>,
    main_result: Result<LoopSummary, Box<dyn std::error::Error>>,
) -> Result<LoopSummary, Box<dyn std::error::Error>> {
    let mut thread_error: Option<Box<dyn std::error::Error>> = None;

    if reader_handle.join().is_err() {
        thread_error = Some("Reader thread panicked".into());
    }

    match writer_handle.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            thread_error.get_or_insert_with(|| e.to_string().into());
        }
        Err(_) => {
            thread_error.get_or_insert_with(|| "Writer thread panicked".into());
        }
    }

    let summary = main_result?;
    match thread_error {
        Some(e) => Err(e),
        None => Ok(summary),
    }
}
