//! Engine configuration.
//!
//! Loading from the process environment is the deployment's concern; the
//! engine only receives an already-assembled [`EngineConfig`].

use serde::{Deserialize, Serialize};

use crate::{Address, Result, RfqError, constants};

/// Configuration for one RFQ engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Lifetime of server-signed quotes, in seconds.
    pub quote_ttl_secs: u64,
    /// Skip every ledger write (reads are still performed).
    pub skip_onchain: bool,
    /// Register new RFQs on the ledger with `createRFQ`.
    pub register_rfq_onchain: bool,
    /// Ledger connection details. `None` runs against the dry-run ledger.
    pub chain: Option<ChainConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quote_ttl_secs: constants::DEFAULT_QUOTE_TTL_SECS,
            skip_onchain: false,
            register_rfq_onchain: true,
            chain: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(s).map_err(|e| RfqError::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.quote_ttl_secs == 0 {
            return Err(RfqError::Configuration(
                "quote_ttl_secs must be > 0".to_string(),
            ));
        }
        if let Some(chain) = &self.chain {
            chain.validate()?;
        }
        Ok(())
    }

    /// Whether ledger writes should actually be sent.
    #[must_use]
    pub fn ledger_writes_enabled(&self) -> bool {
        !self.skip_onchain
    }
}

/// Where the settlement ledger lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: String,
    /// Attestation registry contract.
    pub registry_address: Address,
    /// Settlement contract.
    pub settlement_address: Address,
}

impl ChainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.trim().is_empty() {
            return Err(RfqError::Configuration("chain.rpc_url is empty".to_string()));
        }
        if self.registry_address.is_zero() {
            return Err(RfqError::MisconfiguredAddress {
                field: "chain.registry_address",
                value: self.registry_address.to_string(),
            });
        }
        if self.settlement_address.is_zero() {
            return Err(RfqError::MisconfiguredAddress {
                field: "chain.settlement_address",
                value: self.settlement_address.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_config_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.quote_ttl_secs, 60);
        assert!(!cfg.skip_onchain);
        assert!(cfg.register_rfq_onchain);
        assert!(cfg.chain.is_none());
        assert!(cfg.ledger_writes_enabled());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg = EngineConfig::from_json(r#"{ "skip_onchain": true }"#).unwrap();
        assert!(cfg.skip_onchain);
        assert_eq!(cfg.quote_ttl_secs, 60);
        assert!(!cfg.ledger_writes_enabled());
    }

    #[test]
    fn chain_addresses_are_validated() {
        let json = r#"{
            "chain": {
                "rpc_url": "http://127.0.0.1:8545",
                "registry_address": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
                "settlement_address": "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"
            }
        }"#;
        let cfg = EngineConfig::from_json(json).unwrap();
        assert!(cfg.chain.is_some());

        let bad = json.replace("0x5FbDB2315678afecb367f032d93F642f64180aa3", "0xRegistry");
        let err = EngineConfig::from_json(&bad).unwrap_err();
        assert!(matches!(err, RfqError::Configuration(_)), "Got: {err:?}");
    }

    #[test]
    fn zero_ttl_rejected() {
        let err = EngineConfig::from_json(r#"{ "quote_ttl_secs": 0 }"#).unwrap_err();
        assert!(err.to_string().contains("quote_ttl_secs"));
    }

    #[test]
    fn zero_settlement_address_rejected() {
        let cfg = EngineConfig {
            chain: Some(ChainConfig {
                rpc_url: "http://localhost:8545".into(),
                registry_address: Address([1; 20]),
                settlement_address: Address::ZERO,
            }),
            ..EngineConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(RfqError::MisconfiguredAddress { field: "chain.settlement_address", .. })
        ));
    }
}
