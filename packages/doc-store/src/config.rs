//! Store configuration.

use jsonkit_codec::{Algorithm, CryptoConfig};
use jsonkit_core::Error;
use serde::{Deserialize, Serialize};

use crate::query::MissPolicy;

/// Options fixed at store construction.
///
/// Every field has a default, so a configuration file only needs to name
/// what it changes:
///
/// ```rust
/// use jsonkit_store::StoreConfig;
///
/// let config = StoreConfig::from_json_str(r#"{"miss": {"throw_on_miss": true}}"#).unwrap();
/// assert!(config.miss.throw_on_miss);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Behaviour of lookups that find nothing.
    pub miss: MissPolicy,
    /// Cipher suite used for keyed import and export.
    pub crypto: CryptoConfig,
    /// Transport encoding for unkeyed import and export.
    pub algorithm: Algorithm,
}

impl StoreConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, Error> {
        let config: StoreConfig = serde_json::from_str(raw)?;
        config.crypto.validate()?;
        Ok(config)
    }

    /// Default configuration with misses raising `EmptyResult`.
    pub fn strict() -> Self {
        Self {
            miss: MissPolicy::strict(),
            ..Self::default()
        }
    }
}
