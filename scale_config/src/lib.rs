pub mod config;
pub mod parser;

pub use config::{Feature, HistogramConfig, HostCapabilities, RetentionConfig, ScaleConfig};
pub use parser::{parse_config_from_file, parse_config_from_str};
