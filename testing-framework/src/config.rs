//! Harness configuration
//!
//! Loaded once from a JSON file (`config.json` by default) and treated as
//! immutable afterwards. Every field has a default so a minimal file only
//! needs the node URL. A relative `cases` path is taken relative to the
//! config file. With a `funder` key set, every sender of a case receives
//! `fund_amount` wei from it before the case runs.
//!
//! ```json
//! {
//!   "node_url": "http://127.0.0.1:8545",
//!   "seed": "zion-test",
//!   "network": {
//!     "contract": "0x0000000000000000000000000000000000001000",
//!     "chain_id": 1000,
//!     "gas_limit": 10000000,
//!     "gas_price": "1000000000"
//!   },
//!   "transport": { "request_timeout_secs": 10, "receipt_timeout_secs": 30, "poll_interval_ms": 500 },
//!   "methods": { "mutating": ["addNode"], "read_only": ["getNodeInfo"] },
//!   "funder": "0x4646464646464646464646464646464646464646464646464646464646464646",
//!   "fund_amount": "1000000000000000000",
//!   "cases": "cases.yaml"
//! }
//! ```

use crate::assertions::de_amount;
use crate::cases::{MethodKind, MethodRegistry};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use zion_common::{
    config::{DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE, NODE_MANAGER_CONTRACT, ZION_CHAIN_ID},
    crypto::{Address, KeyPair},
};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_NODE_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_SEED: &str = "zion-test";
/// 1 native token
pub const DEFAULT_FUND_AMOUNT: u128 = 1_000_000_000_000_000_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Fixed inputs of the packer: target contract, chain identity and gas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub contract: Address,
    pub chain_id: u64,
    pub gas_limit: u64,
    #[serde(deserialize_with = "de_amount")]
    pub gas_price: u128,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            contract: NODE_MANAGER_CONTRACT,
            chain_id: ZION_CHAIN_ID,
            gas_limit: DEFAULT_GAS_LIMIT,
            gas_price: DEFAULT_GAS_PRICE,
        }
    }
}

/// Timeouts of the JSON-RPC transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub request_timeout_secs: u64,
    pub receipt_timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            receipt_timeout_secs: 30,
            poll_interval_ms: 500,
        }
    }
}

impl TransportConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Extra entries for the method registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodOverrides {
    pub mutating: Vec<String>,
    pub read_only: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub node_url: String,
    pub seed: String,
    pub network: NetworkConfig,
    pub transport: TransportConfig,
    pub methods: MethodOverrides,
    /// Hex private key that funds the case senders
    pub funder: Option<String>,
    #[serde(deserialize_with = "de_amount")]
    pub fund_amount: u128,
    /// Case file used when none is given on the command line
    pub cases: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            node_url: DEFAULT_NODE_URL.to_string(),
            seed: DEFAULT_SEED.to_string(),
            network: NetworkConfig::default(),
            transport: TransportConfig::default(),
            methods: MethodOverrides::default(),
            funder: None,
            fund_amount: DEFAULT_FUND_AMOUNT,
            cases: None,
        }
    }
}

impl HarnessConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json(&content)?;
        if let (Some(cases), Some(dir)) = (config.cases.as_mut(), path.parent()) {
            if cases.is_relative() {
                *cases = dir.join(&*cases);
            }
        }
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.node_url.is_empty() {
            return Err(ConfigError::Invalid("node_url is empty".to_string()));
        }
        if self.seed.is_empty() {
            return Err(ConfigError::Invalid("seed is empty".to_string()));
        }
        if self.network.gas_limit == 0 {
            return Err(ConfigError::Invalid("gas_limit must be positive".to_string()));
        }
        if self.transport.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.funder.is_some() {
            self.funder_key()?;
            if self.fund_amount == 0 {
                return Err(ConfigError::Invalid(
                    "fund_amount must be positive when a funder is set".to_string(),
                ));
            }
        }
        if let Some(name) = self
            .methods
            .mutating
            .iter()
            .find(|name| self.methods.read_only.contains(*name))
        {
            return Err(ConfigError::Invalid(format!(
                "method '{}' is listed as both mutating and read-only",
                name
            )));
        }
        Ok(())
    }

    /// Key of the funding account, if one is configured
    pub fn funder_key(&self) -> Result<Option<KeyPair>, ConfigError> {
        self.funder
            .as_deref()
            .map(KeyPair::from_hex)
            .transpose()
            .map_err(|e| ConfigError::Invalid(format!("funder: {}", e)))
    }

    /// Node manager registry extended with the configured methods
    pub fn registry(&self) -> MethodRegistry {
        let mut registry = MethodRegistry::node_manager();
        for name in &self.methods.mutating {
            registry.register(name.clone(), MethodKind::Mutating);
        }
        for name in &self.methods.read_only {
            registry.register(name.clone(), MethodKind::ReadOnly);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = HarnessConfig::from_json(r#"{ "node_url": "http://node:8545" }"#).unwrap();
        assert_eq!(config.node_url, "http://node:8545");
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.network, NetworkConfig::default());
        assert_eq!(config.network.contract, NODE_MANAGER_CONTRACT);
        assert_eq!(config.network.chain_id, 1000);
        assert_eq!(config.transport.receipt_timeout(), Duration::from_secs(30));
        assert!(config.cases.is_none());
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "node_url": "http://127.0.0.1:22000",
            "seed": "devnet",
            "network": {
                "contract": "0x0000000000000000000000000000000000002000",
                "chain_id": 77,
                "gas_limit": 500000,
                "gas_price": "2000000000"
            },
            "transport": { "request_timeout_secs": 3, "receipt_timeout_secs": 9, "poll_interval_ms": 100 },
            "methods": { "mutating": ["addNode"], "read_only": ["getNodeInfo"] },
            "cases": "cases/node.yaml"
        }"#;
        let config = HarnessConfig::from_json(json).unwrap();
        assert_eq!(config.network.chain_id, 77);
        assert_eq!(config.network.gas_price, 2_000_000_000);
        assert_eq!(config.network.contract.as_bytes()[18], 0x20);
        assert_eq!(config.transport.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.cases, Some(PathBuf::from("cases/node.yaml")));

        let registry = config.registry();
        assert_eq!(registry.classify("addNode"), Some(MethodKind::Mutating));
        assert_eq!(registry.classify("getNodeInfo"), Some(MethodKind::ReadOnly));
        assert_eq!(registry.classify("stake"), Some(MethodKind::Mutating));
    }

    #[test]
    fn test_conflicting_method_lists_are_rejected() {
        let json = r#"{ "methods": { "mutating": ["addNode"], "read_only": ["addNode"] } }"#;
        assert!(matches!(
            HarnessConfig::from_json(json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "seed": "from-file" }}"#).unwrap();
        let config = HarnessConfig::load(file.path()).unwrap();
        assert_eq!(config.seed, "from-file");
        assert_eq!(config.node_url, DEFAULT_NODE_URL);
    }

    #[test]
    fn test_relative_cases_path_follows_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "cases": "scenarios/node.yaml" }"#).unwrap();
        let config = HarnessConfig::load(&path).unwrap();
        assert_eq!(config.cases, Some(dir.path().join("scenarios/node.yaml")));

        std::fs::write(&path, r#"{ "cases": "/abs/node.yaml" }"#).unwrap();
        let config = HarnessConfig::load(&path).unwrap();
        assert_eq!(config.cases, Some(PathBuf::from("/abs/node.yaml")));

        // Parsing without a file keeps the path as written
        let config = HarnessConfig::from_json(r#"{ "cases": "node.yaml" }"#).unwrap();
        assert_eq!(config.cases, Some(PathBuf::from("node.yaml")));
    }

    #[test]
    fn test_funder() {
        let config = HarnessConfig::from_json(
            r#"{
                "funder": "0x4646464646464646464646464646464646464646464646464646464646464646",
                "fund_amount": 5000
            }"#,
        )
        .unwrap();
        assert_eq!(config.fund_amount, 5000);
        let funder = config.funder_key().unwrap().unwrap();
        assert_eq!(
            funder.address().to_hex(),
            "0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f"
        );

        let config = HarnessConfig::from_json("{}").unwrap();
        assert_eq!(config.fund_amount, DEFAULT_FUND_AMOUNT);
        assert!(config.funder_key().unwrap().is_none());

        assert!(matches!(
            HarnessConfig::from_json(r#"{ "funder": "0x1234" }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            HarnessConfig::from_json(
                r#"{
                    "funder": "0x4646464646464646464646464646464646464646464646464646464646464646",
                    "fund_amount": 0
                }"#
            ),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = HarnessConfig::load("/nonexistent/config.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
