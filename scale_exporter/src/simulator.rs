//! Stand-in for a build host: emits run, node and generator events into an
//! [`EventSink`] so the exporter has something to show.

use rand::{rngs::StdRng, Rng, SeedableRng};
use scale_metrics::{EventSink, GeneratorEvent, LoadGenerator, NodeCreated};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub struct SimulatedGenerator {
    id: String,
    name: String,
    tasks: AtomicU64,
}

impl SimulatedGenerator {
    pub fn new(index: usize) -> Self {
        Self {
            id: format!("generator-{}", index),
            name: format!("load{}", index),
            tasks: AtomicU64::new(0),
        }
    }

    fn set_tasks(&self, tasks: u64) {
        self.tasks.store(tasks, Ordering::Relaxed);
    }
}

impl LoadGenerator for SimulatedGenerator {
    fn generator_id(&self) -> String {
        self.id.clone()
    }

    fn short_name(&self) -> String {
        self.name.clone()
    }

    fn queued_and_running(&self) -> u64 {
        self.tasks.load(Ordering::Relaxed)
    }
}

pub struct SimulatorConfig {
    pub generators: usize,
    pub seed: Option<u64>,
}

pub fn spawn(sink: Arc<EventSink>, config: SimulatorConfig) -> Vec<JoinHandle<()>> {
    let seed = config.seed.unwrap_or_else(rand::random);
    info!(
        "Simulating host with {} generators (seed {})",
        config.generators, seed
    );

    let generators: Vec<Arc<SimulatedGenerator>> = (0..config.generators)
        .map(|i| Arc::new(SimulatedGenerator::new(i)))
        .collect();

    vec![
        tokio::spawn(run_builds(sink.clone(), StdRng::seed_from_u64(seed))),
        tokio::spawn(run_generators(
            sink,
            generators,
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        )),
    ]
}

async fn run_builds(sink: Arc<EventSink>, mut rng: StdRng) {
    loop {
        let wait = Duration::from_millis(rng.gen_range(50..500));
        tokio::time::sleep(wait).await;

        // A build is a short chain of nodes, sometimes with a parallel merge.
        sink.on_node_created(NodeCreated::root());
        for _ in 0..rng.gen_range(1..8) {
            if rng.gen_bool(0.1) {
                sink.on_node_created(NodeCreated::merge(rng.gen_range(2..5)));
            } else {
                sink.on_node_created(NodeCreated::with_parent(rng.gen_range(1..2_000)));
            }
        }

        let duration = rng.gen_range(100..5_000);
        sink.on_run_completed(duration);
        debug!("Simulated run finished in {}ms", duration);
    }
}

async fn run_generators(
    sink: Arc<EventSink>,
    generators: Vec<Arc<SimulatedGenerator>>,
    mut rng: StdRng,
) {
    for generator in &generators {
        sink.on_generator(GeneratorEvent::Added, generator.clone());
        sink.on_generator(GeneratorEvent::Started, generator.clone());
    }

    if generators.is_empty() {
        return;
    }

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    loop {
        interval.tick().await;

        for generator in &generators {
            generator.set_tasks(rng.gen_range(0..25));
        }

        let generator = &generators[rng.gen_range(0..generators.len())];
        let event = match rng.gen_range(0..20) {
            0 => GeneratorEvent::Stopped,
            1 => GeneratorEvent::Reconfigured,
            2 => GeneratorEvent::Removed,
            _ => continue,
        };
        debug!("Generator '{}' {:?}", generator.generator_id(), event);
        sink.on_generator(event, generator.clone());
    }
}
