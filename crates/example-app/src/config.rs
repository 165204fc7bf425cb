//! TOML configuration for the example app

use serde::Deserialize;

/// Top-level example app configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Listen host (defaults to 127.0.0.1)
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port (defaults to 18090)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base route every endpoint is served under (e.g. "/api")
    #[serde(default)]
    pub base_route: String,
    /// User-Agent prefixes that are rejected with 403
    #[serde(default)]
    pub blocked_user_agents: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    18090
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: default_host(),
            port: default_port(),
            base_route: String::new(),
            blocked_user_agents: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{path}': {e}"))?;
        toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{path}': {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: AppConfig = toml::from_str("port = 9999").unwrap();
        assert_eq!(config.port, 9999);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.base_route, "");
        assert!(config.blocked_user_agents.is_empty());
    }

    #[test]
    fn full_config_parses() {
        let config: AppConfig = toml::from_str(
            r#"
            host = "0.0.0.0"
            port = 8080
            base_route = "/api"
            blocked_user_agents = ["curl"]
            "#,
        )
        .unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.base_route, "/api");
        assert_eq!(config.blocked_user_agents, ["curl"]);
    }
}
