use scale_config::{Feature, HostCapabilities};
use scale_core::Result;
use tracing::{info, warn};

/// What the host says it can do. Implemented by the host integration.
#[cfg_attr(test, mockall::automock)]
pub trait CapabilitySource: Send + Sync {
    fn advertises(&self, feature: Feature) -> Result<bool>;
}

impl CapabilitySource for HostCapabilities {
    fn advertises(&self, feature: Feature) -> Result<bool> {
        Ok(self.supports(feature))
    }
}

/// Startup-time decision on which optional metric families exist.
///
/// Probed once; the answer never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityGate {
    flow_nodes: bool,
}

impl CapabilityGate {
    pub fn probe(source: &dyn CapabilitySource) -> Self {
        let flow_nodes = match source.advertises(Feature::FlowNodeEvents) {
            Ok(supported) => supported,
            Err(e) => {
                warn!("Capability probe failed, treating flow node events as absent: {}", e);
                false
            }
        };

        if flow_nodes {
            info!("Flow node metrics enabled");
        } else {
            info!("Flow node metrics disabled: host does not report flow node events");
        }

        Self { flow_nodes }
    }

    pub fn enabled() -> Self {
        Self { flow_nodes: true }
    }

    pub fn disabled() -> Self {
        Self { flow_nodes: false }
    }

    pub fn flow_nodes_enabled(&self) -> bool {
        self.flow_nodes
    }
}
