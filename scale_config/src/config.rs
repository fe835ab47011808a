use scale_core::Retention;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Optional host features that gate metric families.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// The host fires an event for every new flow-graph node.
    FlowNodeEvents,
}

/// Feature set a host declares up front.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct HostCapabilities {
    features: BTreeSet<Feature>,
}

impl HostCapabilities {
    pub fn new(features: impl IntoIterator<Item = Feature>) -> Self {
        Self {
            features: features.into_iter().collect(),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn supports(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn features(&self) -> impl Iterator<Item = Feature> + '_ {
        self.features.iter().copied()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RetentionConfig {
    Last(usize),
    Window(#[serde(with = "humantime_serde")] Duration),
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self::Window(Duration::from_secs(60))
    }
}

impl RetentionConfig {
    pub fn to_retention(&self) -> Retention {
        match *self {
            RetentionConfig::Last(n) => Retention::last(n),
            RetentionConfig::Window(window) => Retention::window(window),
        }
    }
}

impl From<Retention> for RetentionConfig {
    fn from(retention: Retention) -> Self {
        match retention {
            Retention::Last(n) => Self::Last(n),
            Retention::Window(window) => Self::Window(window),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistogramConfig {
    /// Written as a one-key map: `{ last: 3 }` or `{ window: 1m }`.
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScaleConfig {
    /// First segment of every exported key.
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default)]
    pub run_time: HistogramConfig,
    #[serde(default)]
    pub flow_node_time: HistogramConfig,
    #[serde(default)]
    pub capabilities: HostCapabilities,
}

/// TOML files wrap the settings in a `[metrics]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsFile {
    pub metrics: ScaleConfig,
}

fn default_scope() -> String {
    "jenkins".to_string()
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            scope: default_scope(),
            run_time: HistogramConfig::default(),
            flow_node_time: HistogramConfig::default(),
            capabilities: HostCapabilities::none(),
        }
    }
}

impl ScaleConfig {
    pub fn builder() -> ScaleConfigBuilder {
        ScaleConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.scope.is_empty() {
            return Err("Scope cannot be empty".to_string());
        }

        if self.scope.chars().any(char::is_whitespace) {
            return Err(format!("Scope '{}' must not contain whitespace", self.scope));
        }

        for (name, histogram) in [("run_time", &self.run_time), ("flow_node_time", &self.flow_node_time)] {
            match histogram.retention {
                RetentionConfig::Last(0) => {
                    return Err(format!("Histogram '{}' must retain at least one sample", name));
                }
                RetentionConfig::Window(window) if window.is_zero() => {
                    return Err(format!("Histogram '{}' window must be > 0", name));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

#[derive(Default)]
pub struct ScaleConfigBuilder {
    scope: Option<String>,
    run_time: Option<Retention>,
    flow_node_time: Option<Retention>,
    capabilities: Vec<Feature>,
}

impl ScaleConfigBuilder {
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn run_time(mut self, retention: Retention) -> Self {
        self.run_time = Some(retention);
        self
    }

    pub fn flow_node_time(mut self, retention: Retention) -> Self {
        self.flow_node_time = Some(retention);
        self
    }

    pub fn capability(mut self, feature: Feature) -> Self {
        self.capabilities.push(feature);
        self
    }

    pub fn build(self) -> ScaleConfig {
        let histogram = |retention: Option<Retention>| HistogramConfig {
            retention: retention.map(RetentionConfig::from).unwrap_or_default(),
        };

        ScaleConfig {
            scope: self.scope.unwrap_or_else(default_scope),
            run_time: histogram(self.run_time),
            flow_node_time: histogram(self.flow_node_time),
            capabilities: HostCapabilities::new(self.capabilities),
        }
    }
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_plugin_layout() {
        let config = ScaleConfig::default();

        assert_eq!(config.scope, "jenkins");
        assert_eq!(
            config.run_time.retention.to_retention(),
            Retention::Window(Duration::from_secs(60))
        );
        assert!(!config.capabilities.supports(Feature::FlowNodeEvents));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ScaleConfig::builder()
            .scope("ci")
            .run_time(Retention::last(3))
            .capability(Feature::FlowNodeEvents)
            .build();

        assert_eq!(config.scope, "ci");
        assert_eq!(config.run_time.retention, RetentionConfig::Last(3));
        assert_eq!(config.flow_node_time.retention, RetentionConfig::default());
        assert!(config.capabilities.supports(Feature::FlowNodeEvents));
    }

    #[test]
    fn test_validation() {
        let mut config = ScaleConfig::default();
        config.scope = "has space".to_string();
        assert!(config.validate().is_err());

        let mut config = ScaleConfig::default();
        config.run_time.retention = RetentionConfig::Last(0);
        assert!(config.validate().is_err());

        let mut config = ScaleConfig::default();
        config.flow_node_time.retention = RetentionConfig::Window(Duration::ZERO);
        assert!(config.validate().is_err());

        let invalid = ScaleConfig::builder().scope("").build();
        assert!(invalid.validate().is_err());
    }
}
