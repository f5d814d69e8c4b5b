use nebulous_client::{ClientConfig, ServerRegion};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_region")]
    pub region: ServerRegion,
    /// `<account_id>,<creation_date>,<signature>`; blank plays anonymously.
    #[serde(default)]
    pub ticket: String,
    /// Alternate account API host (test servers).
    #[serde(default)]
    pub account_api_url: Option<String>,
    #[serde(default)]
    pub client: ClientConfig,
}

fn default_region() -> ServerRegion {
    ServerRegion::UsWest
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            ticket: String::new(),
            account_api_url: None,
            client: ClientConfig::default(),
        }
    }
}

impl BotConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: BotConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_config_from_toml() {
        let config: BotConfig = toml::from_str(
            r#"
            region = "EU"
            ticket = ""

            [client]
            alias = "observer"
            game_version = 1404
            "#,
        )
        .unwrap();
        assert_eq!(config.region, ServerRegion::Eu);
        assert!(config.ticket.is_empty());
        assert_eq!(config.client.alias, "observer");
        assert_eq!(config.client.game_version, 1404);
    }
}
