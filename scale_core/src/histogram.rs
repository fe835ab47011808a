use crate::clock::{DynClock, SystemClock};
use crate::error::{Result, ScaleError};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Which samples a [`WindowedHistogram`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// The most recent N updates.
    Last(usize),
    /// Every update younger than the window.
    Window(Duration),
}

/// Shortest window a histogram accepts; anything shorter would evict every
/// sample on the update that recorded it.
pub const MIN_WINDOW: Duration = Duration::from_millis(1);

impl Retention {
    pub fn last(n: usize) -> Self {
        Self::Last(n.max(1))
    }

    /// Windows below [`MIN_WINDOW`] are raised to it.
    pub fn window(window: Duration) -> Self {
        Self::Window(window.max(MIN_WINDOW))
    }

    pub fn description(&self) -> String {
        match self {
            Retention::Last(n) => format!("last {} samples", n),
            Retention::Window(window) => format!("trailing {:?}", window),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    at: Instant,
    value: f64,
}

/// Summary statistics over the samples retained at snapshot time.
///
/// Export-only: the sorted samples behind [`value_at`](Self::value_at) are
/// not serialised, so there is no way back from the serialised form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistogramSnapshot {
    /// Samples currently retained.
    pub count: usize,
    /// Updates accepted over the histogram's lifetime.
    pub total_updates: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub stddev: f64,
    pub median: f64,
    pub p75: f64,
    pub p95: f64,
    pub p98: f64,
    pub p99: f64,
    pub p999: f64,
    #[serde(skip)]
    values: Vec<f64>,
}

impl HistogramSnapshot {
    fn from_values(mut values: Vec<f64>, total_updates: u64) -> Self {
        values.sort_by(|a, b| a.total_cmp(b));

        let count = values.len();
        let (min, max, mean, stddev) = if !values.is_empty() {
            let mean = values.iter().sum::<f64>() / count as f64;
            let stddev = if count > 1 {
                let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                    / (count - 1) as f64;
                variance.sqrt()
            } else {
                0.0
            };
            (values[0], values[count - 1], mean, stddev)
        } else {
            (0.0, 0.0, 0.0, 0.0)
        };

        Self {
            count,
            total_updates,
            min,
            max,
            mean,
            stddev,
            median: percentile(&values, 0.50),
            p75: percentile(&values, 0.75),
            p95: percentile(&values, 0.95),
            p98: percentile(&values, 0.98),
            p99: percentile(&values, 0.99),
            p999: percentile(&values, 0.999),
            values,
        }
    }

    /// Value at quantile `q` (clamped to `[0, 1]`); 0 when nothing is retained.
    pub fn value_at(&self, q: f64) -> f64 {
        percentile(&self.values, q)
    }

    /// Retained samples in ascending order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() || q.is_nan() {
        return 0.0;
    }

    let q = q.clamp(0.0, 1.0);
    let index = ((sorted.len() as f64) * q) as usize;
    let index = index.min(sorted.len() - 1);
    sorted[index]
}

/// Histogram over a bounded set of recent samples.
///
/// Eviction happens on every update and snapshot, never in the background,
/// so statistics only ever cover what the retention policy allows.
pub struct WindowedHistogram {
    retention: Retention,
    samples: Mutex<VecDeque<Sample>>,
    total_updates: AtomicU64,
    clock: DynClock,
}

impl WindowedHistogram {
    pub fn new(retention: Retention) -> Self {
        Self::with_clock(retention, SystemClock::shared())
    }

    pub fn with_clock(retention: Retention, clock: DynClock) -> Self {
        let retention = match retention {
            Retention::Last(n) => Retention::last(n),
            Retention::Window(window) => Retention::window(window),
        };
        let capacity = match retention {
            Retention::Last(n) => n,
            Retention::Window(_) => 0,
        };

        Self {
            retention,
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            total_updates: AtomicU64::new(0),
            clock,
        }
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    /// Records a non-negative, finite sample (milliseconds by convention).
    pub fn update(&self, value: f64) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(ScaleError::InvalidSample(format!(
                "{} is not a finite non-negative value",
                value
            )));
        }

        let now = self.clock.now();
        let mut samples = self.samples.lock().unwrap_or_else(|e| e.into_inner());
        self.evict(&mut samples, now);
        samples.push_back(Sample { at: now, value });
        if let Retention::Last(n) = self.retention {
            while samples.len() > n {
                samples.pop_front();
            }
        }
        self.total_updates.fetch_add(1, Ordering::Relaxed);

        Ok(())
    }

    pub fn update_duration(&self, duration: Duration) -> Result<()> {
        self.update(duration.as_secs_f64() * 1000.0)
    }

    pub fn total_updates(&self) -> u64 {
        self.total_updates.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        let now = self.clock.now();
        let values: Vec<f64> = {
            let mut samples = self.samples.lock().unwrap_or_else(|e| e.into_inner());
            self.evict(&mut samples, now);
            samples.iter().map(|s| s.value).collect()
        };

        HistogramSnapshot::from_values(values, self.total_updates())
    }

    fn evict(&self, samples: &mut VecDeque<Sample>, now: Instant) {
        if let Retention::Window(window) = self.retention {
            while let Some(oldest) = samples.front() {
                if now.saturating_duration_since(oldest.at) >= window {
                    samples.pop_front();
                } else {
                    break;
                }
            }
        }
    }
}

impl std::fmt::Debug for WindowedHistogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowedHistogram")
            .field("retention", &self.retention)
            .field("total_updates", &self.total_updates())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;

    #[test]
    fn test_run_durations_summary() {
        let histogram = WindowedHistogram::new(Retention::last(3));
        for value in [100.0, 200.0, 300.0] {
            histogram.update(value).unwrap();
        }

        let snapshot = histogram.snapshot();
        assert_eq!(snapshot.count, 3);
        assert_eq!(snapshot.mean, 200.0);
        assert_eq!(snapshot.min, 100.0);
        assert_eq!(snapshot.max, 300.0);
        assert_eq!(snapshot.median, 200.0);
        assert_eq!(snapshot.stddev, 100.0);
    }

    #[test]
    fn test_count_bounded_evicts_oldest() {
        let histogram = WindowedHistogram::new(Retention::last(3));
        for value in 1..=5 {
            histogram.update(value as f64).unwrap();
        }

        let snapshot = histogram.snapshot();
        assert_eq!(snapshot.count, 3);
        assert_eq!(snapshot.total_updates, 5);
        assert_eq!(snapshot.values(), &[3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let histogram = WindowedHistogram::new(Retention::Last(0));
        assert_eq!(histogram.retention(), Retention::Last(1));

        histogram.update(1.0).unwrap();
        histogram.update(2.0).unwrap();
        assert_eq!(histogram.snapshot().values(), &[2.0]);
    }

    #[test]
    fn test_zero_window_is_clamped() {
        let clock = Arc::new(ManualClock::new());
        let histogram = WindowedHistogram::with_clock(Retention::Window(Duration::ZERO), clock.clone());
        assert_eq!(histogram.retention(), Retention::Window(MIN_WINDOW));
        assert_eq!(Retention::window(Duration::ZERO), Retention::Window(MIN_WINDOW));

        histogram.update(7.0).unwrap();
        assert_eq!(histogram.snapshot().values(), &[7.0]);

        clock.advance(MIN_WINDOW);
        assert_eq!(histogram.snapshot().count, 0);
    }

    #[test]
    fn test_snapshot_serializes_statistics_only() {
        let histogram = WindowedHistogram::new(Retention::last(3));
        for value in [100.0, 200.0, 300.0] {
            histogram.update(value).unwrap();
        }

        let json = serde_json::to_value(histogram.snapshot()).unwrap();
        assert_eq!(json["count"], 3);
        assert_eq!(json["median"], 200.0);
        assert!(json.get("values").is_none());
    }

    #[test]
    fn test_time_window_boundaries() {
        let clock = Arc::new(ManualClock::new());
        let histogram =
            WindowedHistogram::with_clock(Retention::window(Duration::from_secs(60)), clock.clone());

        histogram.update(42.0).unwrap();
        assert_eq!(histogram.snapshot().count, 1);

        clock.advance(Duration::from_millis(59_999));
        assert_eq!(histogram.snapshot().count, 1);

        clock.advance(Duration::from_millis(1));
        let snapshot = histogram.snapshot();
        assert_eq!(snapshot.count, 0);
        assert_eq!(snapshot.total_updates, 1);
    }

    #[test]
    fn test_time_window_keeps_recent_samples() {
        let clock = Arc::new(ManualClock::new());
        let histogram =
            WindowedHistogram::with_clock(Retention::window(Duration::from_secs(60)), clock.clone());

        histogram.update(10.0).unwrap();
        clock.advance(Duration::from_secs(30));
        histogram.update(20.0).unwrap();
        clock.advance(Duration::from_secs(30));

        let snapshot = histogram.snapshot();
        assert_eq!(snapshot.values(), &[20.0]);
        assert_eq!(snapshot.mean, 20.0);
    }

    #[test]
    fn test_empty_snapshot_reports_zero() {
        let histogram = WindowedHistogram::new(Retention::window(Duration::from_secs(60)));
        let snapshot = histogram.snapshot();

        assert_eq!(snapshot.count, 0);
        assert_eq!(snapshot.mean, 0.0);
        assert_eq!(snapshot.p99, 0.0);
        assert_eq!(snapshot.value_at(0.5), 0.0);
    }

    #[test]
    fn test_rejects_invalid_samples() {
        let histogram = WindowedHistogram::new(Retention::last(3));

        assert!(histogram.update(-1.0).is_err());
        assert!(histogram.update(f64::NAN).is_err());
        assert!(histogram.update(f64::INFINITY).is_err());
        assert_eq!(histogram.total_updates(), 0);
        assert_eq!(histogram.snapshot().count, 0);
    }

    #[test]
    fn test_percentiles() {
        let histogram = WindowedHistogram::new(Retention::last(100));
        for value in 1..=100 {
            histogram.update(value as f64).unwrap();
        }

        let snapshot = histogram.snapshot();
        assert_eq!(snapshot.median, 51.0);
        assert_eq!(snapshot.p95, 96.0);
        assert_eq!(snapshot.p999, 100.0);
        assert_eq!(snapshot.value_at(0.0), 1.0);
        assert_eq!(snapshot.value_at(2.0), 100.0);
    }

    #[test]
    fn test_update_duration_uses_millis() {
        let histogram = WindowedHistogram::new(Retention::last(1));
        histogram.update_duration(Duration::from_millis(1500)).unwrap();
        assert_eq!(histogram.snapshot().max, 1500.0);
    }
}
