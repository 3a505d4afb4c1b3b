//! Client configuration structures

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "tokenomics.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub api: Api,
    pub checkout: Checkout,
    pub wallet: Wallet,
    pub ledger: Ledger,
    pub logging: Logging,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Api {
    pub base_url: String,
    /// Origin the hosted checkout redirects back to.
    pub origin_url: String,
    pub timeout_secs: u64,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            origin_url: "http://localhost:3000".to_string(),
            timeout_secs: 90,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Checkout {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl Default for Checkout {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Wallet {
    /// Keypair file in Solana CLI JSON format
    pub keypair_path: Option<String>,
    /// Environment variable holding a base58 or JSON-array private key
    pub private_key_env: Option<String>,
    pub rpc_url: String,
    pub network: String,
}

impl Default for Wallet {
    fn default() -> Self {
        Self {
            keypair_path: None,
            private_key_env: Some("SOLANA_PRIVATE_KEY".to_string()),
            rpc_url: "https://api.devnet.solana.com".to_string(),
            network: "devnet".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Ledger {
    pub path: String,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            path: "payment_intents.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    pub directory: String,
    pub file_prefix: String,
    /// Filter used when RUST_LOG is unset
    pub level: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            file_prefix: "tokenomics.log".to_string(),
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        Ok(config)
    }

    /// Loads `TOKENOMICS_CONFIG` (or `tokenomics.toml`) when present, falls
    /// back to defaults otherwise, then applies environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("TOKENOMICS_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&path).exists() {
            Self::load_from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TOKENOMICS_API_URL") {
            self.api.base_url = url;
        }
        if let Some(origin) = lookup("TOKENOMICS_ORIGIN_URL") {
            self.api.origin_url = origin;
        }
        if let Some(rpc) = lookup("SOLANA_RPC_URL") {
            self.wallet.rpc_url = rpc;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.checkout.interval_ms)
    }
}
