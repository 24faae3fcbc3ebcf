//! Resolver configuration.
//!
//! Defaults point at the public services. Every value can be overridden
//! from the environment (a `.env` file is loaded if present) and then from
//! CLI flags.
//!
//! | Variable              | Default                                                   |
//! |-----------------------|-----------------------------------------------------------|
//! | `INCHI_CACTUS_URL`    | `https://cactus.nci.nih.gov/chemical/structure`           |
//! | `INCHI_DRUGBANK_URL`  | `https://www.drugbank.ca/structures/small_molecule_drugs` |
//! | `INCHI_PUBCHEM_URL`   | `https://pubchem.ncbi.nlm.nih.gov/rest/pug`               |
//! | `INCHI_TIMEOUT_SECS`  | `5`                                                       |
//! | `INCHI_RETRIES`       | `2`                                                       |
//! | `INCHI_PRIORITY`      | `drugbank-first`                                          |

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::PriorityOrder;

/// NCI/CADD Chemical Identifier Resolver.
pub const DEFAULT_CACTUS_URL: &str = "https://cactus.nci.nih.gov/chemical/structure";

/// DrugBank small-molecule structure downloads.
pub const DEFAULT_DRUGBANK_URL: &str = "https://www.drugbank.ca/structures/small_molecule_drugs";

/// PubChem PUG REST root.
pub const DEFAULT_PUBCHEM_URL: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug";

/// Per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Transport-level retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 2;

/// Delay between transport retries in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Upper bound accepted for the per-request timeout.
pub const MAX_TIMEOUT_SECS: u64 = 600;

/// Upper bound accepted for transport retries.
pub const MAX_RETRIES: u32 = 10;

/// Everything needed to build a [`crate::resolve::Resolver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub cactus_url: String,
    pub drugbank_url: String,
    pub pubchem_url: String,
    /// Bound on each external call, retries included.
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
    pub priority: PriorityOrder,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cactus_url: DEFAULT_CACTUS_URL.to_string(),
            drugbank_url: DEFAULT_DRUGBANK_URL.to_string(),
            pubchem_url: DEFAULT_PUBCHEM_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retries: DEFAULT_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            priority: PriorityOrder::default(),
        }
    }
}

impl ResolverConfig {
    /// Defaults overridden by `INCHI_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try loading .env file
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("INCHI_CACTUS_URL") {
            config.cactus_url = url;
        }
        if let Some(url) = lookup("INCHI_DRUGBANK_URL") {
            config.drugbank_url = url;
        }
        if let Some(url) = lookup("INCHI_PUBCHEM_URL") {
            config.pubchem_url = url;
        }
        if let Some(secs) = lookup("INCHI_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_number("INCHI_TIMEOUT_SECS", &secs)?);
        }
        if let Some(retries) = lookup("INCHI_RETRIES") {
            config.retries = parse_number("INCHI_RETRIES", &retries)?;
        }
        if let Some(priority) = lookup("INCHI_PRIORITY") {
            config.priority = priority.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_priority(mut self, priority: PriorityOrder) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Check that every base URL parses and the numbers are in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        base_url("INCHI_CACTUS_URL", &self.cactus_url)?;
        base_url("INCHI_DRUGBANK_URL", &self.drugbank_url)?;
        base_url("INCHI_PUBCHEM_URL", &self.pubchem_url)?;

        if self.timeout > Duration::from_secs(MAX_TIMEOUT_SECS) {
            return Err(ConfigError::InvalidNumber {
                name: "INCHI_TIMEOUT_SECS".to_string(),
                value: format!("{} (max {})", self.timeout.as_secs(), MAX_TIMEOUT_SECS),
            });
        }
        if self.retries > MAX_RETRIES {
            return Err(ConfigError::InvalidNumber {
                name: "INCHI_RETRIES".to_string(),
                value: format!("{} (max {})", self.retries, MAX_RETRIES),
            });
        }
        if self.retry_delay > Duration::from_secs(MAX_TIMEOUT_SECS) {
            return Err(ConfigError::InvalidNumber {
                name: "retry_delay".to_string(),
                value: format!("{} ms", self.retry_delay.as_millis()),
            });
        }
        Ok(())
    }
}

/// Parse a service base URL. Only http(s) URLs that can take path segments qualify.
pub fn base_url(name: &str, value: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidUrl {
        name: name.to_string(),
        value: value.to_string(),
    };

    let url = Url::parse(value.trim()).map_err(|_| invalid())?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    Ok(url)
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        name: name.to_string(),
        value: value.to_string(),
    })
}
