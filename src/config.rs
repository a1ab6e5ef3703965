use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use toml;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://sh.dataspace.copernicus.eu";
const DEFAULT_TOKEN_URL: &str =
    "https://identity.dataspace.copernicus.eu/auth/realms/CDSE/protocol/openid-connect/token";

/// Connection settings for the Sentinel Hub catalog.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: Url,
    pub token_url: Url,
    pub client_id: String,
    pub client_secret: String,
    /// Items requested per page. The catalog caps this at 100.
    pub page_limit: u32,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("Default base url should always parse"),
            token_url: Url::parse(DEFAULT_TOKEN_URL).expect("Default token url should always parse"),
            client_id: String::new(),
            client_secret: String::new(),
            page_limit: 100,
            max_retries: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

impl CatalogConfig {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn from_template(table: &toml::Table) -> Self {
        let config: Self = toml::from_str(&table.to_string()).expect("Error serializing template");
        config
    }

    /// Replaces the credentials with any that were given explicitly.
    pub fn with_credentials(mut self, client_id: Option<String>, client_secret: Option<String>) -> Self {
        if let Some(id) = client_id {
            self.client_id = id;
        }
        if let Some(secret) = client_secret {
            self.client_secret = secret;
        }
        self
    }

    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

pub fn catalog_config_toml() -> toml::Table {
    toml::toml! {
        // Copernicus Data Space Ecosystem deployment of Sentinel Hub
        base_url = "https://sh.dataspace.copernicus.eu"

        token_url = "https://identity.dataspace.copernicus.eu/auth/realms/CDSE/protocol/openid-connect/token"

        client_id = ""

        client_secret = ""

        page_limit = 100

        max_retries = 3

        retry_base_delay_ms = 1000
    }
}
