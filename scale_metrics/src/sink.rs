use crate::capability::CapabilityGate;
use crate::catalog::MetricCatalog;
use crate::generators::{DynLoadGenerator, GeneratorEvent, GeneratorRegistry};
use crate::keys::StaticKeys;
use scale_config::ScaleConfig;
use scale_core::{RateMeter, Result, WindowedHistogram};
use std::sync::Arc;
use tracing::{info, warn};

/// A new node in a running flow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeCreated {
    pub parents: usize,
    /// Start time of this node minus start time of its parent, when known.
    pub elapsed_since_parent_millis: Option<i64>,
}

impl NodeCreated {
    pub fn root() -> Self {
        Self {
            parents: 0,
            elapsed_since_parent_millis: None,
        }
    }

    pub fn with_parent(elapsed_millis: i64) -> Self {
        Self {
            parents: 1,
            elapsed_since_parent_millis: Some(elapsed_millis),
        }
    }

    pub fn merge(parents: usize) -> Self {
        Self {
            parents,
            elapsed_since_parent_millis: None,
        }
    }
}

struct FlowNodeMetrics {
    creation: Arc<RateMeter>,
    run_time: Arc<WindowedHistogram>,
}

/// Entry point for host events.
///
/// Handlers never fail: malformed input is logged and dropped so event
/// processing in the host is never interrupted.
pub struct EventSink {
    run_completed: Arc<RateMeter>,
    recent_run_time: Arc<WindowedHistogram>,
    flow_nodes: Option<FlowNodeMetrics>,
    generators: GeneratorRegistry,
    gate: CapabilityGate,
}

impl EventSink {
    /// Registers the fixed metric families in `catalog`. The flow node
    /// family is only registered when `gate` allows it.
    pub fn new(
        catalog: Arc<MetricCatalog>,
        gate: CapabilityGate,
        config: &ScaleConfig,
    ) -> Result<Self> {
        let keys = StaticKeys::for_scope(&config.scope);

        let run_completed = catalog.meter(&keys.run_completed_rate)?;
        let recent_run_time =
            catalog.histogram(&keys.recent_run_time, config.run_time.retention.to_retention())?;

        let flow_nodes = if gate.flow_nodes_enabled() {
            Some(FlowNodeMetrics {
                creation: catalog.meter(&keys.flow_node_creation)?,
                run_time: catalog.histogram(
                    &keys.flow_node_time,
                    config.flow_node_time.retention.to_retention(),
                )?,
            })
        } else {
            None
        };

        info!(
            "Event sink ready with {} metrics under scope '{}'",
            catalog.len(),
            config.scope
        );

        Ok(Self {
            run_completed,
            recent_run_time,
            flow_nodes,
            generators: GeneratorRegistry::new(catalog, config.scope.clone()),
            gate,
        })
    }

    pub fn gate(&self) -> CapabilityGate {
        self.gate
    }

    pub fn generators(&self) -> &GeneratorRegistry {
        &self.generators
    }

    pub fn on_run_completed(&self, duration_millis: i64) {
        if duration_millis < 0 {
            warn!(
                "Ignoring run completion with negative duration {}ms",
                duration_millis
            );
            return;
        }

        self.run_completed.mark();
        if let Err(e) = self.recent_run_time.update(duration_millis as f64) {
            warn!("Run duration not recorded: {}", e);
        }
    }

    pub fn on_node_created(&self, node: NodeCreated) {
        let Some(flow_nodes) = &self.flow_nodes else {
            return;
        };

        flow_nodes.creation.mark();

        // Merge points have no single parent to measure from.
        if node.parents != 1 {
            return;
        }

        match node.elapsed_since_parent_millis {
            Some(elapsed) if elapsed >= 0 => {
                if let Err(e) = flow_nodes.run_time.update(elapsed as f64) {
                    warn!("Flow node time not recorded: {}", e);
                }
            }
            Some(elapsed) => {
                warn!("Ignoring negative flow node time {}ms", elapsed);
            }
            None => {}
        }
    }

    pub fn on_generator(&self, event: GeneratorEvent, generator: DynLoadGenerator) {
        self.generators.handle(event, generator);
    }
}
