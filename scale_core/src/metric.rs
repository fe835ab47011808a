use crate::gauge::{Gauge, GaugeSnapshot};
use crate::histogram::{HistogramSnapshot, WindowedHistogram};
use crate::meter::{MeterSnapshot, RateMeter};
use serde::Serialize;
use std::sync::Arc;

/// A metric instance as held by a catalog. Cloning shares the instance.
#[derive(Debug, Clone)]
pub enum Metric {
    Meter(Arc<RateMeter>),
    Histogram(Arc<WindowedHistogram>),
    Gauge(Arc<Gauge>),
}

impl Metric {
    pub fn kind(&self) -> &'static str {
        match self {
            Metric::Meter(_) => "meter",
            Metric::Histogram(_) => "histogram",
            Metric::Gauge(_) => "gauge",
        }
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        match self {
            Metric::Meter(meter) => MetricSnapshot::Meter(meter.snapshot()),
            Metric::Histogram(histogram) => MetricSnapshot::Histogram(histogram.snapshot()),
            Metric::Gauge(gauge) => MetricSnapshot::Gauge(gauge.snapshot()),
        }
    }

    pub fn as_meter(&self) -> Option<&Arc<RateMeter>> {
        match self {
            Metric::Meter(meter) => Some(meter),
            _ => None,
        }
    }

    pub fn as_histogram(&self) -> Option<&Arc<WindowedHistogram>> {
        match self {
            Metric::Histogram(histogram) => Some(histogram),
            _ => None,
        }
    }

    pub fn as_gauge(&self) -> Option<&Arc<Gauge>> {
        match self {
            Metric::Gauge(gauge) => Some(gauge),
            _ => None,
        }
    }

    /// True when both handles point at the same instance.
    pub fn same_instance(&self, other: &Metric) -> bool {
        match (self, other) {
            (Metric::Meter(a), Metric::Meter(b)) => Arc::ptr_eq(a, b),
            (Metric::Histogram(a), Metric::Histogram(b)) => Arc::ptr_eq(a, b),
            (Metric::Gauge(a), Metric::Gauge(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<RateMeter> for Metric {
    fn from(meter: RateMeter) -> Self {
        Metric::Meter(Arc::new(meter))
    }
}

impl From<WindowedHistogram> for Metric {
    fn from(histogram: WindowedHistogram) -> Self {
        Metric::Histogram(Arc::new(histogram))
    }
}

impl From<Gauge> for Metric {
    fn from(gauge: Gauge) -> Self {
        Metric::Gauge(Arc::new(gauge))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetricSnapshot {
    Meter(MeterSnapshot),
    Histogram(HistogramSnapshot),
    Gauge(GaugeSnapshot),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::Retention;

    #[test]
    fn test_metric_kinds() {
        let meter: Metric = RateMeter::new().into();
        let histogram: Metric = WindowedHistogram::new(Retention::last(3)).into();
        let gauge: Metric = Gauge::from_fn(|| 1.0).into();

        assert_eq!(meter.kind(), "meter");
        assert_eq!(histogram.kind(), "histogram");
        assert_eq!(gauge.kind(), "gauge");
        assert!(meter.as_meter().is_some());
        assert!(meter.as_histogram().is_none());
    }

    #[test]
    fn test_same_instance() {
        let a: Metric = RateMeter::new().into();
        let b = a.clone();
        let c: Metric = RateMeter::new().into();

        assert!(a.same_instance(&b));
        assert!(!a.same_instance(&c));
    }

    #[test]
    fn test_snapshot_serializes_with_type_tag() {
        let gauge: Metric = Gauge::from_fn(|| 2.0).into();
        let json = serde_json::to_value(gauge.snapshot()).unwrap();

        assert_eq!(json["type"], "gauge");
        assert_eq!(json["value"], 2.0);
    }
}
