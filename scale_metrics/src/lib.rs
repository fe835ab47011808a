pub mod capability;
pub mod catalog;
pub mod exporters;
pub mod generators;
pub mod keys;
pub mod provider;
pub mod sink;

pub use capability::{CapabilityGate, CapabilitySource};
pub use catalog::MetricCatalog;
pub use generators::{GeneratorEvent, GeneratorRegistry, LoadGenerator};
pub use keys::{metric_name, StaticKeys};
pub use provider::{CatalogSnapshot, MetricProvider};
pub use sink::{EventSink, NodeCreated};

pub use scale_config::{Feature, HostCapabilities};
