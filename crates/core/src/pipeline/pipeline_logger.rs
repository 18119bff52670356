use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for recognition and enrollment runs.
///
/// Keeps the use cases free of any particular output mechanism; the CLI
/// routes events to `log`, tests discard them.
pub trait PipelineLogger: Send {
    /// Report progress over sampled frames (or photos, for enrollment).
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one unit of work.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. faces found in a frame).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Logger backed by the `log` facade.
///
/// Progress lines are throttled to every `throttle` units. Timings and
/// metrics are accumulated and reported by [`summary`](PipelineLogger::summary).
pub struct LogPipelineLogger {
    throttle: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    processed: usize,
}

impl LogPipelineLogger {
    pub fn new(throttle: usize) -> Self {
        Self {
            throttle: throttle.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            processed: 0,
        }
    }

    /// The formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Run summary ({} sampled, {elapsed_s:.1}s total):",
            self.processed
        )];

        let mut stages: Vec<_> = self.timings.iter().collect();
        stages.sort_by(|a, b| a.0.cmp(b.0));
        for (stage, durations) in stages {
            let total_ms: f64 = durations.iter().sum();
            lines.push(format!(
                "  {stage:10}: avg {:6.1}ms  total {total_ms:7.0}ms",
                average(durations)
            ));
        }

        let mut metrics: Vec<_> = self.metrics.iter().collect();
        metrics.sort_by(|a, b| a.0.cmp(b.0));
        for (name, values) in metrics {
            let total: f64 = values.iter().sum();
            lines.push(format!(
                "  {name}: avg {:.1}, total {total:.0}",
                average(values)
            ));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    fn should_report(&self, current: usize, total: usize) -> bool {
        current % self.throttle == 0 || (total > 0 && current == total)
    }
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.processed = current;
        if !self.should_report(current, total) {
            return;
        }
        if total > 0 {
            let pct = (current as f64 / total as f64 * 100.0).min(100.0);
            log::info!("Processed {current}/{total} ({pct:.0}%)");
        } else {
            log::info!("Processed {current}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 10);
        logger.timing("analyze", 5.0);
        logger.metric("faces", 3.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values_per_stage() {
        let mut logger = LogPipelineLogger::new(10);
        logger.timing("analyze", 20.0);
        logger.timing("analyze", 30.0);
        logger.timing("match", 1.0);

        assert_eq!(logger.timings_for("analyze").unwrap(), &[20.0, 30.0]);
        assert_eq!(logger.timings_for("match").unwrap(), &[1.0]);
        assert!(logger.timings_for("decode").is_none());
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = LogPipelineLogger::new(10);
        logger.progress(4, 4);
        logger.timing("analyze", 10.0);
        logger.metric("faces", 1.0);
        logger.metric("faces", 2.0);

        assert_eq!(logger.metrics_for("faces").unwrap(), &[1.0, 2.0]);
        assert!(logger.metrics_for("queue").is_none());

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("4 sampled"));
        assert!(summary.contains("analyze"));
        assert!(summary.contains("faces: avg 1.5, total 3"));
    }

    #[test]
    fn test_empty_summary_is_none() {
        assert!(LogPipelineLogger::default().summary_string().is_none());
    }

    #[test]
    fn test_progress_throttle() {
        let logger = LogPipelineLogger::new(5);
        assert!(!logger.should_report(3, 12));
        assert!(logger.should_report(5, 12));
        assert!(logger.should_report(12, 12));
        assert!(!logger.should_report(7, 0));
    }

    #[test]
    fn test_zero_throttle_clamps_to_one() {
        let logger = LogPipelineLogger::new(0);
        assert!(logger.should_report(3, 0));
    }

    #[test]
    fn test_average() {
        assert_relative_eq!(average(&[10.0, 20.0, 30.0]), 20.0);
        assert_eq!(average(&[]), 0.0);
    }
}
