use crate::catalog::MetricCatalog;
use chrono::{DateTime, Utc};
use scale_core::{Metric, MetricSnapshot};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Every metric in a catalog, sampled at one moment.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogSnapshot {
    pub exported_at: DateTime<Utc>,
    pub metrics: BTreeMap<String, MetricSnapshot>,
}

/// Read side of the catalog, handed to exporters.
#[derive(Clone)]
pub struct MetricProvider {
    catalog: Arc<MetricCatalog>,
}

impl MetricProvider {
    pub fn new(catalog: Arc<MetricCatalog>) -> Self {
        Self { catalog }
    }

    /// Current key → metric mapping, rebuilt on every call.
    pub fn metric_set(&self) -> BTreeMap<String, Metric> {
        self.catalog.all().into_iter().collect()
    }

    /// Samples every metric. Gauges read their live sources here.
    pub fn snapshot(&self) -> CatalogSnapshot {
        let metrics = self
            .metric_set()
            .into_iter()
            .map(|(key, metric)| (key, metric.snapshot()))
            .collect();

        CatalogSnapshot {
            exported_at: Utc::now(),
            metrics,
        }
    }
}
