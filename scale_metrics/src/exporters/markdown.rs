use crate::provider::CatalogSnapshot;
use scale_core::MetricSnapshot;
use std::fmt::Write;

pub struct MarkdownExporter;

impl MarkdownExporter {
    pub fn format(snapshot: &CatalogSnapshot) -> String {
        let mut meters = String::new();
        let mut histograms = String::new();
        let mut gauges = String::new();

        for (key, metric) in &snapshot.metrics {
            match metric {
                MetricSnapshot::Meter(m) => {
                    let _ = writeln!(
                        meters,
                        "| {} | {} | {:.3} | {:.3} | {:.3} | {:.3} |",
                        key, m.count, m.rate_1m, m.rate_5m, m.rate_15m, m.mean_rate
                    );
                }
                MetricSnapshot::Histogram(h) => {
                    let _ = writeln!(
                        histograms,
                        "| {} | {} | {:.1} | {:.1} | {:.1} | {:.1} | {:.1} | {:.1} |",
                        key, h.count, h.min, h.mean, h.median, h.p95, h.p99, h.max
                    );
                }
                MetricSnapshot::Gauge(g) => {
                    let _ = writeln!(gauges, "| {} | {} |", key, g.value);
                }
            }
        }

        format!(
            r#"# Scalability Metrics Report

Exported at {}

## Meters (events/s)

| Metric | Count | 1m | 5m | 15m | Mean |
|--------|-------|----|----|-----|------|
{}
## Histograms (ms)

| Metric | Count | Min | Mean | P50 | P95 | P99 | Max |
|--------|-------|-----|------|-----|-----|-----|-----|
{}
## Gauges

| Metric | Value |
|--------|-------|
{}"#,
            snapshot.exported_at.to_rfc3339(),
            meters,
            histograms,
            gauges,
        )
    }
}
