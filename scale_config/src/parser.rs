use crate::config::{MetricsFile, ScaleConfig};
use anyhow::Result;
use scale_core::ScaleError;
use std::path::Path;
use tracing::debug;

pub async fn parse_config_from_file(path: impl AsRef<Path>) -> Result<ScaleConfig> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path).await?;

    debug!("Loaded metrics config from {}", path.display());

    let extension = path.extension().and_then(|s| s.to_str());

    match extension {
        Some("yaml") | Some("yml") => parse_yaml(&contents),
        Some("toml") => parse_toml(&contents),
        Some("json") => parse_json(&contents),
        _ => Err(anyhow::anyhow!(
            "Unsupported file format. Use .yaml, .yml, .toml, or .json"
        )),
    }
}

pub fn parse_config_from_str(content: &str, format: &str) -> Result<ScaleConfig> {
    match format.to_lowercase().as_str() {
        "yaml" | "yml" => parse_yaml(content),
        "toml" => parse_toml(content),
        "json" => parse_json(content),
        _ => Err(anyhow::anyhow!("Unsupported format: {}", format)),
    }
}

fn parse_yaml(content: &str) -> Result<ScaleConfig> {
    let config: ScaleConfig = serde_yaml::from_str(content)?;
    config.validate().map_err(ScaleError::InvalidConfig)?;
    Ok(config)
}

fn parse_toml(content: &str) -> Result<ScaleConfig> {
    let file: MetricsFile = toml::from_str(content)?;
    file.metrics.validate().map_err(ScaleError::InvalidConfig)?;
    Ok(file.metrics)
}

fn parse_json(content: &str) -> Result<ScaleConfig> {
    let config: ScaleConfig = serde_json::from_str(content)?;
    config.validate().map_err(ScaleError::InvalidConfig)?;
    Ok(config)
}
