//! Stable export keys.
//!
//! Keys are dotted paths: `{scope}.scalemetrics.{name}` for the fixed
//! families and `{scope}.loadgenerators.{short_name}.currentTaskCount` for
//! per-generator gauges.

pub const SCALE_METRICS: &str = "scalemetrics";
pub const LOAD_GENERATORS: &str = "loadgenerators";

/// Joins non-empty parts with dots.
pub fn metric_name(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(".")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticKeys {
    pub run_completed_rate: String,
    pub recent_run_time: String,
    pub flow_node_creation: String,
    pub flow_node_time: String,
}

impl StaticKeys {
    pub fn for_scope(scope: &str) -> Self {
        Self {
            run_completed_rate: metric_name(&[scope, SCALE_METRICS, "runCompletedRate"]),
            recent_run_time: metric_name(&[scope, SCALE_METRICS, "recentRunTime"]),
            flow_node_creation: metric_name(&[scope, SCALE_METRICS, "flownodeCreation"]),
            flow_node_time: metric_name(&[scope, SCALE_METRICS, "flowNodeTime"]),
        }
    }
}

pub fn generator_task_count(scope: &str, short_name: &str) -> String {
    metric_name(&[scope, LOAD_GENERATORS, short_name, "currentTaskCount"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_name_skips_empty_parts() {
        assert_eq!(metric_name(&["a", "", "b"]), "a.b");
        assert_eq!(metric_name(&[]), "");
    }

    #[test]
    fn test_static_keys() {
        let keys = StaticKeys::for_scope("jenkins");
        assert_eq!(keys.run_completed_rate, "jenkins.scalemetrics.runCompletedRate");
        assert_eq!(keys.recent_run_time, "jenkins.scalemetrics.recentRunTime");
        assert_eq!(keys.flow_node_creation, "jenkins.scalemetrics.flownodeCreation");
        assert_eq!(keys.flow_node_time, "jenkins.scalemetrics.flowNodeTime");
    }

    #[test]
    fn test_generator_key() {
        assert_eq!(
            generator_task_count("jenkins", "nightly"),
            "jenkins.loadgenerators.nightly.currentTaskCount"
        );
    }
}
