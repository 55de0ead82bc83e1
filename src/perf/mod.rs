//! Transfer rate tracking
//!
//! Measures elapsed wall time and computes overall plus min/max
//! instantaneous throughput in megabits per second. Byte deltas arrive via
//! [`PerformanceTracker::sample`]; every time more than the sampling
//! interval has passed since the previous sample point, the bytes moved in
//! that window become one instantaneous rate observation.
//!
//! The sampling baseline (last sample instant + byte count) is read and
//! reset under one mutex so two concurrent callers cannot both claim the
//! same interval.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Window length for instantaneous rate observations.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(30);

/// Megabits per second, zero when no time has elapsed.
pub fn rate_mbps(bytes: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    (bytes as f64 * 8.0) / (1024.0 * 1024.0) / elapsed_secs
}

/// Final rate statistics for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateReport {
    pub overall_mbps: f64,
    pub min_mbps: f64,
    pub max_mbps: f64,
    pub elapsed_secs: f64,
}

#[derive(Default)]
struct TrackerState {
    started_at: Option<Instant>,
    last_sample_at: Option<Instant>,
    bytes_total: u64,
    bytes_at_last_sample: u64,
    min_mbps: Option<f64>,
    max_mbps: Option<f64>,
}

/// Elapsed-time and throughput tracker for one run.
pub struct PerformanceTracker {
    interval: Duration,
    state: Mutex<TrackerState>,
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::with_interval(SAMPLE_INTERVAL)
    }

    /// Tracker with a custom sampling interval (tests).
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            state: Mutex::new(TrackerState::default()),
        }
    }

    /// Mark the start of the run. Resets any previous state.
    pub fn start(&self) {
        let now = Instant::now();
        let mut state = self.state.lock();
        *state = TrackerState {
            started_at: Some(now),
            last_sample_at: Some(now),
            ..TrackerState::default()
        };
    }

    /// Account for `bytes_delta` more transferred bytes.
    ///
    /// When the sampling interval has elapsed since the previous sample
    /// point, folds the window's bytes into min/max as one instantaneous
    /// rate observation and resets the baseline.
    pub fn sample(&self, bytes_delta: u64) {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.bytes_total += bytes_delta;

        let Some(last) = state.last_sample_at else {
            return;
        };
        let window = now.duration_since(last);
        if window < self.interval {
            return;
        }

        let window_bytes = state.bytes_total - state.bytes_at_last_sample;
        let instantaneous = rate_mbps(window_bytes, window.as_secs_f64());
        state.last_sample_at = Some(now);
        state.bytes_at_last_sample = state.bytes_total;
        state.min_mbps = Some(state.min_mbps.map_or(instantaneous, |m| m.min(instantaneous)));
        state.max_mbps = Some(state.max_mbps.map_or(instantaneous, |m| m.max(instantaneous)));

        tracing::info!(
            rate_mbps = instantaneous,
            window_bytes,
            window_secs = window.as_secs_f64(),
            "instantaneous transfer rate"
        );
    }

    /// Compute the final report.
    ///
    /// When no sampling window ever elapsed (a fast, small run) min and max
    /// default to the overall rate.
    pub fn finish(&self) -> RateReport {
        let state = self.state.lock();
        let elapsed_secs = state
            .started_at
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        let overall_mbps = rate_mbps(state.bytes_total, elapsed_secs);
        RateReport {
            overall_mbps,
            min_mbps: state.min_mbps.unwrap_or(overall_mbps),
            max_mbps: state.max_mbps.unwrap_or(overall_mbps),
            elapsed_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_elapsed_is_zero_rate() {
        assert_eq!(rate_mbps(1_048_576, 0.0), 0.0);
    }

    #[test]
    fn one_megabyte_per_second_is_eight_mbps() {
        let rate = rate_mbps(1024 * 1024, 1.0);
        assert!((rate - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn finish_without_start_reports_zero() {
        let tracker = PerformanceTracker::new();
        let report = tracker.finish();
        assert_eq!(report.overall_mbps, 0.0);
        assert_eq!(report.min_mbps, 0.0);
        assert_eq!(report.max_mbps, 0.0);
        assert_eq!(report.elapsed_secs, 0.0);
    }

    #[test]
    fn min_max_default_to_overall_without_samples() {
        let tracker = PerformanceTracker::new();
        tracker.start();
        tracker.sample(4096);
        let report = tracker.finish();
        assert_eq!(report.min_mbps, report.overall_mbps);
        assert_eq!(report.max_mbps, report.overall_mbps);
    }

    #[test]
    fn interval_elapse_records_min_max() {
        let tracker = PerformanceTracker::with_interval(Duration::from_millis(0));
        tracker.start();
        tracker.sample(1024 * 1024);
        tracker.sample(512 * 1024);
        let report = tracker.finish();
        assert!(report.max_mbps >= report.min_mbps);
        assert!(report.max_mbps > 0.0);
    }
}
