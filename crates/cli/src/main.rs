mod settings;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use backdrop_core::compositing::domain::compositor::Compositor;
use backdrop_core::compositing::domain::compositor_config::CompositorConfig;
use backdrop_core::compositing::infrastructure::cpu_gaussian_blurrer::CpuGaussianBlurrer;
use backdrop_core::control::domain::blur_control::BlurControl;
use backdrop_core::control::infrastructure::atomic_blur_control::AtomicBlurControl;
use backdrop_core::control::infrastructure::atomic_stop_signal::AtomicStopSignal;
use backdrop_core::control::infrastructure::interrupt_stop_signal::InterruptStopSignal;
use backdrop_core::control::infrastructure::stdin_control_surface::StdinControlSurface;
use backdrop_core::pipeline::blur_background_image_use_case::BlurBackgroundImageUseCase;
use backdrop_core::pipeline::blur_background_use_case::BlurBackgroundUseCase;
use backdrop_core::pipeline::infrastructure::sequential_pipeline_executor::SequentialPipelineExecutor;
use backdrop_core::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
use backdrop_core::pipeline::pipeline_executor::{LoopOutcome, PipelineExecutor};
use backdrop_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use backdrop_core::segmentation::domain::segmenter::Segmenter;
use backdrop_core::segmentation::infrastructure::onnx_segmenter::{OnnxSegmenter, OutputActivation};
use backdrop_core::segmentation::infrastructure::skip_frame_segmenter::SkipFrameSegmenter;
use backdrop_core::shared::constants::{CAPTURE_HEIGHT, CAPTURE_WIDTH, IMAGE_EXTENSIONS};
use backdrop_core::shared::model_resolver;
use backdrop_core::video::domain::video_reader::VideoReader;
use backdrop_core::video::domain::video_writer::VideoWriter;
use backdrop_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use backdrop_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use backdrop_core::video::infrastructure::image_file_reader::ImageFileReader;
use backdrop_core::video::infrastructure::image_file_writer::ImageFileWriter;

use settings::Settings;

/// How to read the segmentation model's output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum ModelOutput {
    /// Decide from the first frame.
    #[default]
    Auto,
    /// Values are probabilities in [0, 1].
    Probability,
    /// Values are logits.
    Logits,
}

impl From<ModelOutput> for OutputActivation {
    fn from(output: ModelOutput) -> Self {
        match output {
            ModelOutput::Auto => OutputActivation::Auto,
            ModelOutput::Probability => OutputActivation::Probability,
            ModelOutput::Logits => OutputActivation::Logits,
        }
    }
}

/// Blur everything but the person in a video, camera feed or image.
///
/// While a video runs, type a number (kernel size), `+` or `-` and press
/// Enter to change the blur strength; `q` or Ctrl-C stops.
#[derive(Parser)]
#[command(name = "backdrop")]
struct Cli {
    /// Input video, image or capture device (e.g. /dev/video0).
    input: PathBuf,

    /// Output video or image file.
    output: PathBuf,

    /// Segmentation model: a local .onnx path or an http(s) URL.
    #[arg(long)]
    model: Option<String>,

    /// Mask values strictly above this are kept sharp (0.0-1.0).
    #[arg(long)]
    threshold: Option<f32>,

    /// Initial blur kernel size.
    #[arg(long)]
    blur_strength: Option<u32>,

    /// Smallest blur kernel size (odd).
    #[arg(long)]
    min_strength: Option<u32>,

    /// Largest blur kernel size the controls accept.
    #[arg(long)]
    max_strength: Option<u32>,

    /// Interpretation of the model output.
    #[arg(long, value_enum, default_value_t = ModelOutput::Auto)]
    model_output: ModelOutput,

    /// Run segmentation every Nth frame (1 = every frame).
    #[arg(long)]
    segment_every: Option<usize>,

    /// Processing width; devices default to 640x480.
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Processing height.
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Output bit rate in kbit/s.
    #[arg(long)]
    bitrate: Option<usize>,

    /// Settings file (JSON); defaults to the platform config directory.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Process every frame on the calling thread instead of decoding and
    /// encoding on helper threads.
    #[arg(long)]
    sequential: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = Settings::load_or_default(cli.settings.as_deref())?;
    let config = compositor_config(&cli, &settings);
    let segment_every = cli.segment_every.or(settings.segment_every).unwrap_or(1);
    validate(&cli, &config, segment_every)?;

    let model_source = cli
        .model
        .clone()
        .or_else(|| settings.model.clone())
        .ok_or("A segmentation model is required: pass --model or set \"model\" in the settings file")?;
    let segmenter = build_segmenter(&model_source, cli.model_output.into(), segment_every)?;
    let compositor = Compositor::new(config, Box::new(CpuGaussianBlurrer::new()))?;
    let control = Arc::new(AtomicBlurControl::from_config(&config));

    if is_image(&cli.input) {
        run_image_blur(&cli.input, &cli.output, segmenter, compositor, &*control)
    } else {
        run_video_blur(&cli, segmenter, compositor, control)
    }
}

fn run_image_blur(
    input: &Path,
    output: &Path,
    segmenter: Box<dyn Segmenter>,
    compositor: Compositor,
    control: &dyn BlurControl,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut use_case = BlurBackgroundImageUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        segmenter,
        compositor,
    );
    use_case.execute(input, output, control)?;
    log::info!("Output written to {}", output.display());
    Ok(())
}

fn run_video_blur(
    cli: &Cli,
    segmenter: Box<dyn Segmenter>,
    compositor: Compositor,
    control: Arc<AtomicBlurControl>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut ffmpeg_reader = FfmpegReader::new();
    if let Some((w, h)) = processing_size(cli) {
        ffmpeg_reader = ffmpeg_reader.with_output_size(w, h);
    }
    let mut reader: Box<dyn VideoReader> = Box::new(ffmpeg_reader);
    let metadata = reader.open(&cli.input)?;

    let ffmpeg_writer = match cli.bitrate {
        Some(kbps) => FfmpegWriter::new().with_bit_rate(kbps * 1000),
        None => FfmpegWriter::new(),
    };
    let writer: Box<dyn VideoWriter> = Box::new(ffmpeg_writer);

    let executor: Box<dyn PipelineExecutor> = if cli.sequential || is_device(&cli.input) {
        Box::new(SequentialPipelineExecutor::new())
    } else {
        Box::new(ThreadedPipelineExecutor::new())
    };

    let stop = Arc::new(AtomicStopSignal::new());
    InterruptStopSignal::spawn(Arc::clone(&stop))?;
    if std::io::stdin().is_terminal() {
        let (min, max) = control.range();
        eprintln!("Blur strength {min}-{max}: type a number, + or -, then Enter; q or Ctrl-C stops.");
        StdinControlSurface::spawn(Arc::clone(&control), Arc::clone(&stop));
    }

    let mut use_case = BlurBackgroundUseCase::new(
        reader,
        writer,
        segmenter,
        compositor,
        executor,
        control,
        stop,
    )
    .with_logger(Box::new(StdoutPipelineLogger::default()));

    let summary = use_case.execute(&metadata, &cli.output)?;
    if summary.outcome == LoopOutcome::Stopped {
        log::info!("Stopped after {} frames", summary.frames_read);
    }
    log::info!("Output written to {}", cli.output.display());
    Ok(())
}

fn build_segmenter(
    model_source: &str,
    activation: OutputActivation,
    segment_every: usize,
) -> Result<Box<dyn Segmenter>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {model_source}");
    let model_path = model_resolver::resolve(model_source, Some(Box::new(download_progress)))?;

    let onnx = OnnxSegmenter::new(&model_path)?.with_output_activation(activation);
    let base: Box<dyn Segmenter> = Box::new(onnx);
    if segment_every > 1 {
        Ok(Box::new(SkipFrameSegmenter::new(base, segment_every)?))
    } else {
        Ok(base)
    }
}

/// Defaults, then the settings file, then command-line flags.
fn compositor_config(cli: &Cli, settings: &Settings) -> CompositorConfig {
    let base = settings.apply(CompositorConfig::default());
    CompositorConfig {
        threshold: cli.threshold.unwrap_or(base.threshold),
        min_strength: cli.min_strength.unwrap_or(base.min_strength),
        default_strength: cli.blur_strength.unwrap_or(base.default_strength),
        max_strength: cli.max_strength.unwrap_or(base.max_strength),
    }
}

fn validate(
    cli: &Cli,
    config: &CompositorConfig,
    segment_every: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    config.validate()?;
    if segment_every == 0 {
        return Err("--segment-every must be at least 1".into());
    }
    if let (Some(w), Some(h)) = (cli.width, cli.height) {
        if w == 0 || h == 0 || w % 2 != 0 || h % 2 != 0 {
            return Err(format!("Processing size must be positive and even, got {w}x{h}").into());
        }
    }
    if cli.bitrate == Some(0) {
        return Err("--bitrate must be positive".into());
    }
    if is_image(&cli.input) != is_image(&cli.output) {
        return Err("Images must be written to an image file and videos to a video file".into());
    }
    Ok(())
}

fn processing_size(cli: &Cli) -> Option<(u32, u32)> {
    match (cli.width, cli.height) {
        (Some(w), Some(h)) => Some((w, h)),
        _ if is_device(&cli.input) => Some((CAPTURE_WIDTH, CAPTURE_HEIGHT)),
        _ => None,
    }
}

fn is_device(path: &Path) -> bool {
    path.starts_with("/dev")
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading segmentation model... {pct}%");
    } else {
        eprint!("\rDownloading segmentation model... {downloaded} bytes");
    }
}
