use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use scale_core::{
    DynClock, DynGaugeSource, Gauge, Metric, RateMeter, Result, Retention, ScaleError,
    SystemClock, WindowedHistogram,
};
use std::sync::Arc;
use tracing::debug;

/// Process-wide registry of named metrics.
///
/// Construct once at startup and share through an `Arc`; only the contents
/// change afterwards.
pub struct MetricCatalog {
    metrics: DashMap<String, Metric>,
    clock: DynClock,
}

impl MetricCatalog {
    pub fn new() -> Self {
        Self::with_clock(SystemClock::shared())
    }

    /// Meters and histograms created by this catalog read time from `clock`.
    pub fn with_clock(clock: DynClock) -> Self {
        Self {
            metrics: DashMap::new(),
            clock,
        }
    }

    pub fn clock(&self) -> &DynClock {
        &self.clock
    }

    /// Returns the metric under `key`, creating it with `factory` if absent.
    ///
    /// Racing callers on the same key run `factory` at most once; every caller
    /// gets the winning instance. `factory` runs under the key's shard lock and
    /// must not call back into the catalog.
    pub fn register_if_absent<F>(&self, key: &str, factory: F) -> Metric
    where
        F: FnOnce() -> Metric,
    {
        if let Some(existing) = self.metrics.get(key) {
            return existing.value().clone();
        }

        match self.metrics.entry(key.to_string()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let metric = factory();
                debug!("Registered {} '{}'", metric.kind(), key);
                entry.insert(metric).value().clone()
            }
        }
    }

    pub fn meter(&self, key: &str) -> Result<Arc<RateMeter>> {
        let metric = self.register_if_absent(key, || {
            RateMeter::with_clock(self.clock.clone()).into()
        });
        metric
            .as_meter()
            .cloned()
            .ok_or_else(|| kind_mismatch(key, &metric, "meter"))
    }

    pub fn histogram(&self, key: &str, retention: Retention) -> Result<Arc<WindowedHistogram>> {
        let metric = self.register_if_absent(key, || {
            WindowedHistogram::with_clock(retention, self.clock.clone()).into()
        });
        metric
            .as_histogram()
            .cloned()
            .ok_or_else(|| kind_mismatch(key, &metric, "histogram"))
    }

    pub fn gauge(&self, key: &str, source: DynGaugeSource) -> Result<Arc<Gauge>> {
        let metric = self.register_if_absent(key, || Gauge::new(source).into());
        metric
            .as_gauge()
            .cloned()
            .ok_or_else(|| kind_mismatch(key, &metric, "gauge"))
    }

    pub fn get(&self, key: &str) -> Option<Metric> {
        self.metrics.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.metrics.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Every registered metric, sorted by key.
    pub fn all(&self) -> Vec<(String, Metric)> {
        let mut entries: Vec<(String, Metric)> = self
            .metrics
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn keys(&self) -> Vec<String> {
        self.all().into_iter().map(|(key, _)| key).collect()
    }
}

impl Default for MetricCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn kind_mismatch(key: &str, existing: &Metric, requested: &'static str) -> ScaleError {
    ScaleError::KindMismatch {
        key: key.to_string(),
        existing: existing.kind(),
        requested,
    }
}
