use crate::catalog::MetricCatalog;
use crate::keys;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use scale_core::Gauge;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// A host-owned load generator whose task count is sampled at export time.
#[cfg_attr(test, mockall::automock)]
pub trait LoadGenerator: Send + Sync {
    fn generator_id(&self) -> String;

    fn short_name(&self) -> String;

    /// Tasks this generator currently has queued or running.
    fn queued_and_running(&self) -> u64;
}

pub type DynLoadGenerator = Arc<dyn LoadGenerator>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorEvent {
    Added,
    Started,
    Stopped,
    Reconfigured,
    Removed,
}

/// Tracks which generators already have a task-count gauge.
///
/// Gauges are never retracted: a removed generator keeps its gauge, which
/// also prevents a reused id from registering a second one.
pub struct GeneratorRegistry {
    catalog: Arc<MetricCatalog>,
    scope: String,
    by_id: DashMap<String, Arc<Gauge>>,
}

impl GeneratorRegistry {
    pub fn new(catalog: Arc<MetricCatalog>, scope: impl Into<String>) -> Self {
        Self {
            catalog,
            scope: scope.into(),
            by_id: DashMap::new(),
        }
    }

    /// Applies a lifecycle event. For `Reconfigured`, pass the new generator.
    pub fn handle(&self, event: GeneratorEvent, generator: DynLoadGenerator) {
        match event {
            GeneratorEvent::Removed => {
                debug!(
                    "Generator '{}' removed, keeping its gauge",
                    generator.generator_id()
                );
            }
            GeneratorEvent::Added
            | GeneratorEvent::Started
            | GeneratorEvent::Stopped
            | GeneratorEvent::Reconfigured => self.ensure_registered(generator),
        }
    }

    fn ensure_registered(&self, generator: DynLoadGenerator) {
        let id = generator.generator_id();
        if self.by_id.contains_key(&id) {
            return;
        }

        if let Entry::Vacant(entry) = self.by_id.entry(id) {
            let key = keys::generator_task_count(&self.scope, &generator.short_name());
            let source = generator.clone();
            match self
                .catalog
                .gauge(&key, Arc::new(move || source.queued_and_running() as f64))
            {
                Ok(gauge) => {
                    debug!("Tracking generator '{}' as '{}'", entry.key(), key);
                    entry.insert(gauge);
                }
                Err(e) => {
                    warn!("Cannot register gauge for generator '{}': {}", entry.key(), e);
                }
            }
        }
    }

    pub fn gauge_for(&self, generator_id: &str) -> Option<Arc<Gauge>> {
        self.by_id.get(generator_id).map(|entry| entry.value().clone())
    }

    pub fn tracked(&self) -> usize {
        self.by_id.len()
    }
}
