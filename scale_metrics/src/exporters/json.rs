use crate::provider::CatalogSnapshot;
use scale_core::Result;

pub struct JsonExporter;

impl JsonExporter {
    pub fn to_string(snapshot: &CatalogSnapshot) -> Result<String> {
        Ok(serde_json::to_string_pretty(snapshot)?)
    }

    pub fn to_value(snapshot: &CatalogSnapshot) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(snapshot)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MetricCatalog, MetricProvider};
    use scale_core::Retention;
    use std::sync::Arc;

    #[test]
    fn test_json_export() {
        let catalog = Arc::new(MetricCatalog::new());
        catalog.meter("jenkins.scalemetrics.runCompletedRate").unwrap().mark();
        catalog
            .histogram("jenkins.scalemetrics.recentRunTime", Retention::last(3))
            .unwrap()
            .update(120.0)
            .unwrap();

        let value = JsonExporter::to_value(&MetricProvider::new(catalog).snapshot()).unwrap();
        let metrics = &value["metrics"];

        assert_eq!(metrics["jenkins.scalemetrics.runCompletedRate"]["type"], "meter");
        assert_eq!(metrics["jenkins.scalemetrics.runCompletedRate"]["count"], 1);
        assert_eq!(metrics["jenkins.scalemetrics.recentRunTime"]["max"], 120.0);
        assert!(value["exported_at"].is_string());
    }
}
