//! Load and validate the gateway config from a JSON file.

use crate::config::types::GatewayConfig;
use crate::error::ConfigError;
use std::collections::HashSet;
use std::path::Path;

pub fn load_config(path: impl AsRef<Path>) -> Result<GatewayConfig, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    parse_config(&text)
}

pub fn parse_config(text: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = serde_json::from_str(text)?;
    let mut seen = HashSet::new();
    for ep in &config.endpoints {
        if ep.name.is_empty() {
            return Err(ConfigError::EmptyEndpointName);
        }
        if !seen.insert(ep.name.as_str()) {
            return Err(ConfigError::DuplicateEndpoint(ep.name.clone()));
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_endpoint_with_defaults() {
        let config = parse_config(
            r#"{"endpoints": [{"name": "db1", "connection": "server=localhost", "tables": ["^inv"]}]}"#,
        )
        .unwrap();
        assert_eq!(config.listen, "0.0.0.0:3000");
        let ep = &config.endpoints[0];
        assert_eq!(ep.tables, vec!["^inv".to_string()]);
        assert!(ep.views.is_empty());
        assert!(!ep.advanced);
        assert_eq!(ep.pool_size, 5);
    }

    #[test]
    fn rejects_duplicate_endpoint_names() {
        let err = parse_config(
            r#"{"endpoints": [
                {"name": "db1", "connection": "a"},
                {"name": "db1", "connection": "b"}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateEndpoint(name) if name == "db1"));
    }

    #[test]
    fn rejects_empty_endpoint_name() {
        let err = parse_config(r#"{"endpoints": [{"name": "", "connection": "a"}]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyEndpointName));
    }
}
