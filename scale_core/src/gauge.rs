use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Something a [`Gauge`] can sample on demand.
pub trait GaugeSource: Send + Sync {
    fn read(&self) -> f64;
}

impl<F> GaugeSource for F
where
    F: Fn() -> f64 + Send + Sync,
{
    fn read(&self) -> f64 {
        self()
    }
}

pub type DynGaugeSource = Arc<dyn GaugeSource>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaugeSnapshot {
    pub value: f64,
}

/// Pull-based metric: holds no value of its own and reads its source every
/// time it is sampled.
pub struct Gauge {
    source: DynGaugeSource,
}

impl Gauge {
    pub fn new(source: DynGaugeSource) -> Self {
        Self { source }
    }

    pub fn from_fn(f: impl Fn() -> f64 + Send + Sync + 'static) -> Self {
        Self::new(Arc::new(f))
    }

    pub fn value(&self) -> f64 {
        self.source.read()
    }

    pub fn snapshot(&self) -> GaugeSnapshot {
        GaugeSnapshot {
            value: self.value(),
        }
    }
}

impl std::fmt::Debug for Gauge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gauge").finish_non_exhaustive()
    }
}
