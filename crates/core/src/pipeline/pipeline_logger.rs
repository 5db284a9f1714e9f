use std::collections::HashMap;
use std::time::Instant;

/// Stage names reported through [`PipelineLogger::timing`].
pub const STAGE_SEGMENT: &str = "segment";
pub const STAGE_COMPOSITE: &str = "composite";
pub const STAGE_WRITE: &str = "write";

/// Cross-cutting logger for frame-loop events.
///
/// Keeps the use cases free of any particular output mechanism; the CLI
/// logs through the `log` crate, tests discard everything.
pub trait PipelineLogger: Send {
    /// Report frame-level progress. `total` is zero for live sources.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. queue depth).
    fn metric(&mut self, name: &str, value: f64);

    /// A frame was dropped instead of written.
    fn skipped(&mut self, frame_index: usize, reason: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn skipped(&mut self, _frame_index: usize, _reason: &str) {}
}

/// Running total of a recorded series; constant size however long the run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningStat {
    pub total: f64,
    pub count: usize,
}

impl RunningStat {
    fn record(&mut self, value: f64) {
        self.total += value;
        self.count += 1;
    }

    pub fn mean(&self) -> f64 {
        self.total / self.count.max(1) as f64
    }
}

/// CLI logger: per-stage timings, metrics and skipped frames, with a
/// summary at the end of the run.
///
/// Progress output is throttled to every `throttle_frames` frames.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: HashMap<String, RunningStat>,
    metrics: HashMap<String, RunningStat>,
    start_time: Instant,
    frames_seen: usize,
    frames_skipped: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames_seen: 0,
            frames_skipped: 0,
        }
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() && self.frames_skipped == 0 {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames_seen;
        let mut lines = vec![format!(
            "Run summary ({frames} frames, {} skipped, {:.1}s total):",
            self.frames_skipped,
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let stat = self.timings[stage];
            let total_ms = stat.total;
            let avg_ms = stat.mean();
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let avg = self.metrics[name].mean();
            lines.push(format!("  {name}: avg {avg:.1}"));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<RunningStat> {
        self.timings.get(stage).copied()
    }

    pub fn metrics_for(&self, name: &str) -> Option<RunningStat> {
        self.metrics.get(name).copied()
    }

    pub fn frames_skipped(&self) -> usize {
        self.frames_skipped
    }

    fn should_report(&self, current: usize, total: usize) -> bool {
        current % self.throttle_frames == 0 || (total > 0 && current == total)
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = current;
        if !self.should_report(current, total) {
            return;
        }
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Processing: {current}/{total} frames ({pct:.1}%)");
        } else {
            log::info!("Processing: {current} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        match self.timings.get_mut(stage) {
            Some(stat) => stat.record(duration_ms),
            None => {
                let mut stat = RunningStat::default();
                stat.record(duration_ms);
                self.timings.insert(stage.to_string(), stat);
            }
        }
    }

    fn metric(&mut self, name: &str, value: f64) {
        match self.metrics.get_mut(name) {
            Some(stat) => stat.record(value),
            None => {
                let mut stat = RunningStat::default();
                stat.record(value);
                self.metrics.insert(name.to_string(), stat);
            }
        }
    }

    fn skipped(&mut self, frame_index: usize, reason: &str) {
        self.frames_skipped += 1;
        log::warn!("Skipping frame {frame_index}: {reason}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 10);
        logger.timing(STAGE_SEGMENT, 5.0);
        logger.metric("reader_queue_depth", 3.0);
        logger.skipped(4, "mask size mismatch");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values_per_stage() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing(STAGE_SEGMENT, 20.0);
        logger.timing(STAGE_SEGMENT, 30.0);
        logger.timing(STAGE_COMPOSITE, 5.0);

        let segment = logger.timings_for(STAGE_SEGMENT).unwrap();
        assert_eq!((segment.total, segment.count), (50.0, 2));
        assert_eq!(segment.mean(), 25.0);
        assert_eq!(logger.timings_for(STAGE_COMPOSITE).unwrap().count, 1);
        assert!(logger.timings_for(STAGE_WRITE).is_none());
    }

    #[test]
    fn test_metric_records_values() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.metric("reader_queue_depth", 3.0);
        logger.metric("reader_queue_depth", 4.0);
        assert_eq!(logger.metrics_for("reader_queue_depth").unwrap().count, 2);
    }

    #[test]
    fn test_long_run_keeps_one_entry_per_key() {
        let mut logger = StdoutPipelineLogger::new(1000);
        for i in 0..100_000 {
            logger.timing(STAGE_SEGMENT, 1.0);
            logger.timing(STAGE_COMPOSITE, 2.0);
            logger.metric("reader_queue_depth", (i % 4) as f64);
            logger.progress(i + 1, 0);
        }
        assert_eq!(logger.timings.len(), 2);
        assert_eq!(logger.metrics.len(), 1);
        let composite = logger.timings_for(STAGE_COMPOSITE).unwrap();
        assert_eq!(composite.count, 100_000);
        assert_eq!(composite.mean(), 2.0);
        assert_eq!(logger.metrics_for("reader_queue_depth").unwrap().mean(), 1.5);
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.progress(10, 10);
        logger.timing(STAGE_SEGMENT, 20.0);
        logger.timing(STAGE_WRITE, 2.0);
        logger.metric("reader_queue_depth", 3.0);
        logger.metric("reader_queue_depth", 4.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Run summary (10 frames, 0 skipped"));
        assert!(summary.contains(STAGE_SEGMENT));
        assert!(summary.contains(STAGE_WRITE));
        assert!(summary.contains("reader_queue_depth: avg 3.5"));
        assert!(summary.contains("fps"));
    }

    #[test]
    fn test_skipped_frames_counted_in_summary() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.skipped(3, "segmentation failed");
        logger.skipped(7, "segmentation failed");
        assert_eq!(logger.frames_skipped(), 2);
        assert!(logger.summary_string().unwrap().contains("2 skipped"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let logger = StdoutPipelineLogger::new(10);
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_progress_throttle_for_live_and_finite_sources() {
        let logger = StdoutPipelineLogger::new(10);
        assert!(logger.should_report(20, 0));
        assert!(!logger.should_report(21, 0));
        assert!(logger.should_report(23, 23));
        assert!(!logger.should_report(22, 23));
    }

    #[test]
    fn test_progress_tracks_frames_seen() {
        let mut logger = StdoutPipelineLogger::new(10);
        for i in 1..=25 {
            logger.progress(i, 0);
        }
        assert_eq!(logger.frames_seen, 25);
    }

    #[test]
    fn test_zero_throttle_is_raised_to_one() {
        let logger = StdoutPipelineLogger::new(0);
        assert_eq!(logger.throttle_frames, 1);
    }
}
