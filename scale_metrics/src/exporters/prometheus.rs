//! Prometheus text exposition.
//!
//! Dotted catalog keys become underscore-separated metric names. Meters
//! export a `_total` counter plus a `_rate` gauge labelled by window,
//! histograms export a summary over the retained samples, gauges export as
//! gauges.

use crate::provider::CatalogSnapshot;
use prometheus::proto::{
    Counter, Gauge, LabelPair, Metric, MetricFamily, MetricType, Quantile, Summary,
};
use prometheus::{Encoder, TextEncoder};
use scale_core::{HistogramSnapshot, MeterSnapshot, MetricSnapshot, Result, ScaleError};
use std::collections::BTreeSet;
use tracing::warn;

const QUANTILES: [f64; 6] = [0.5, 0.75, 0.95, 0.98, 0.99, 0.999];

pub struct PrometheusExporter;

impl PrometheusExporter {
    /// Families in key order. When two keys sanitise to the same name the
    /// first one wins and the later family is dropped with a warning.
    pub fn families(snapshot: &CatalogSnapshot) -> Vec<MetricFamily> {
        let mut families = Vec::new();

        for (key, metric) in &snapshot.metrics {
            let name = sanitize(key);
            match metric {
                MetricSnapshot::Meter(meter) => families.extend(meter_families(&name, key, meter)),
                MetricSnapshot::Histogram(histogram) => {
                    families.push(summary_family(&name, key, histogram))
                }
                MetricSnapshot::Gauge(gauge) => {
                    let mut value = Gauge::default();
                    value.set_value(gauge.value);
                    let mut metric = Metric::default();
                    metric.set_gauge(value);
                    families.push(family(name, key, MetricType::GAUGE, vec![metric]));
                }
            }
        }

        let mut emitted = BTreeSet::new();
        families.retain(|family| {
            if emitted.insert(family.get_name().to_string()) {
                return true;
            }
            warn!(
                "Skipping {}: name '{}' is already exported",
                family.get_help().trim_start_matches("Exported from "),
                family.get_name()
            );
            false
        });

        families
    }

    pub fn format(snapshot: &CatalogSnapshot) -> Result<String> {
        let families = Self::families(snapshot);
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&families, &mut buffer)
            .map_err(|e| ScaleError::Export(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| ScaleError::Export(e.to_string()))
    }
}

fn meter_families(name: &str, key: &str, meter: &MeterSnapshot) -> Vec<MetricFamily> {
    let mut counter = Counter::default();
    counter.set_value(meter.count as f64);
    let mut total = Metric::default();
    total.set_counter(counter);

    let rates: Vec<Metric> = [
        ("1m", meter.rate_1m),
        ("5m", meter.rate_5m),
        ("15m", meter.rate_15m),
        ("mean", meter.mean_rate),
    ]
    .into_iter()
    .map(|(window, rate)| {
        let mut value = Gauge::default();
        value.set_value(rate);
        let mut metric = Metric::default();
        metric.set_label(vec![label("window", window)].into());
        metric.set_gauge(value);
        metric
    })
    .collect();

    vec![
        family(format!("{}_total", name), key, MetricType::COUNTER, vec![total]),
        family(format!("{}_rate", name), key, MetricType::GAUGE, rates),
    ]
}

fn summary_family(name: &str, key: &str, histogram: &HistogramSnapshot) -> MetricFamily {
    let quantiles = QUANTILES
        .iter()
        .map(|&q| {
            let mut quantile = Quantile::default();
            quantile.set_quantile(q);
            quantile.set_value(histogram.value_at(q));
            quantile
        })
        .collect::<Vec<_>>();

    let mut summary = Summary::default();
    summary.set_sample_count(histogram.count as u64);
    summary.set_sample_sum(histogram.mean * histogram.count as f64);
    summary.set_quantile(quantiles.into());

    let mut metric = Metric::default();
    metric.set_summary(summary);
    family(name.to_string(), key, MetricType::SUMMARY, vec![metric])
}

fn family(name: String, key: &str, kind: MetricType, metrics: Vec<Metric>) -> MetricFamily {
    let mut family = MetricFamily::default();
    family.set_name(name);
    family.set_help(format!("Exported from {}", key));
    family.set_field_type(kind);
    family.set_metric(metrics.into());
    family
}

fn label(name: &str, value: &str) -> LabelPair {
    let mut pair = LabelPair::default();
    pair.set_name(name.to_string());
    pair.set_value(value.to_string());
    pair
}

/// Maps a catalog key onto the Prometheus name alphabet `[a-zA-Z0-9_:]`.
fn sanitize(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == ':' { c } else { '_' })
        .collect();
    if name.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MetricCatalog, MetricProvider};
    use scale_core::Retention;
    use std::sync::Arc;

    #[test]
    fn test_sanitize() {
        assert_eq!(
            sanitize("jenkins.scalemetrics.runCompletedRate"),
            "jenkins_scalemetrics_runCompletedRate"
        );
        assert_eq!(sanitize("9lives.a-b"), "_9lives_a_b");
    }

    #[test]
    fn test_prometheus_format() {
        let catalog = Arc::new(MetricCatalog::new());
        let meter = catalog.meter("jenkins.scalemetrics.runCompletedRate").unwrap();
        meter.mark();
        meter.mark();
        let histogram = catalog
            .histogram("jenkins.scalemetrics.recentRunTime", Retention::last(3))
            .unwrap();
        for value in [100.0, 200.0, 300.0] {
            histogram.update(value).unwrap();
        }
        catalog
            .gauge("jenkins.loadgenerators.nightly.currentTaskCount", Arc::new(|| 5.0))
            .unwrap();

        let text = PrometheusExporter::format(&MetricProvider::new(catalog).snapshot()).unwrap();

        assert!(text.contains("# TYPE jenkins_scalemetrics_runCompletedRate_total counter"));
        assert!(text.contains("jenkins_scalemetrics_runCompletedRate_total 2"));
        assert!(text.contains("jenkins_scalemetrics_runCompletedRate_rate{window=\"1m\"}"));
        assert!(text.contains("# TYPE jenkins_scalemetrics_recentRunTime summary"));
        assert!(text.contains("jenkins_scalemetrics_recentRunTime{quantile=\"0.5\"} 200"));
        assert!(text.contains("jenkins_scalemetrics_recentRunTime_sum 600"));
        assert!(text.contains("jenkins_scalemetrics_recentRunTime_count 3"));
        assert!(text.contains("jenkins_loadgenerators_nightly_currentTaskCount 5"));
    }

    #[test]
    fn test_colliding_names_export_once() {
        let catalog = Arc::new(MetricCatalog::new());
        catalog
            .gauge("jenkins.loadgenerators.x-y.currentTaskCount", Arc::new(|| 1.0))
            .unwrap();
        catalog
            .gauge("jenkins.loadgenerators.x_y.currentTaskCount", Arc::new(|| 2.0))
            .unwrap();

        let snapshot = MetricProvider::new(catalog).snapshot();
        let families = PrometheusExporter::families(&snapshot);
        assert_eq!(families.len(), 1);

        let text = PrometheusExporter::format(&snapshot).unwrap();
        assert_eq!(
            text.matches("# TYPE jenkins_loadgenerators_x_y_currentTaskCount gauge").count(),
            1
        );
        // "x-y" sorts before "x_y", so its reading is the one kept.
        assert!(text.contains("jenkins_loadgenerators_x_y_currentTaskCount 1"));
    }
}
