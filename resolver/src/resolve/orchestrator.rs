//! Per-row resolution: try identifiers in priority order, stop at the first hit.

use reqwest::Url;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::{CactusAdapter, DrugBankAdapter, LookupAdapter, PubChemAdapter};
use crate::config::{base_url, ResolverConfig};
use crate::error::ConfigError;
use crate::fetch::{call_timeout, HttpFetch, ReqwestFetcher};
use crate::models::{
    AdapterOutcome, Identifier, IdentifierField, PriorityOrder, Row, Source, StructureResult,
    UnresolvedReason,
};

/// One adapter call made for a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub field: IdentifierField,
    pub source: Source,
    pub identifier: Identifier,
    pub outcome: AdapterOutcome,
}

/// Final result of a row plus every call that led to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowResolution {
    pub result: StructureResult,
    pub attempts: Vec<Attempt>,
}

impl RowResolution {
    pub fn unresolved(reason: UnresolvedReason, attempts: Vec<Attempt>) -> Self {
        Self {
            result: StructureResult::unresolved(reason),
            attempts,
        }
    }
}

/// Runs the fallback chain over the three adapters.
pub struct Resolver {
    cactus: Arc<dyn LookupAdapter>,
    drugbank: Arc<dyn LookupAdapter>,
    pubchem: Arc<dyn LookupAdapter>,
    priority: PriorityOrder,
    call_timeout: Duration,
}

impl Resolver {
    pub fn new(
        cactus: Arc<dyn LookupAdapter>,
        drugbank: Arc<dyn LookupAdapter>,
        pubchem: Arc<dyn LookupAdapter>,
        priority: PriorityOrder,
        call_timeout: Duration,
    ) -> Self {
        Self {
            cactus,
            drugbank,
            pubchem,
            priority,
            call_timeout,
        }
    }

    /// Build the standard adapters on top of the given HTTP capability.
    pub fn with_fetcher(config: &ResolverConfig, fetcher: Arc<dyn HttpFetch>) -> Result<Self, ConfigError> {
        config.validate()?;

        let cactus_base: Url = base_url("INCHI_CACTUS_URL", &config.cactus_url)?;
        let drugbank_base: Url = base_url("INCHI_DRUGBANK_URL", &config.drugbank_url)?;
        let pubchem_base: Url = base_url("INCHI_PUBCHEM_URL", &config.pubchem_url)?;

        Ok(Self::new(
            Arc::new(CactusAdapter::new(fetcher.clone(), cactus_base)),
            Arc::new(DrugBankAdapter::new(fetcher.clone(), drugbank_base)),
            Arc::new(PubChemAdapter::new(fetcher, pubchem_base)),
            config.priority,
            call_timeout(config),
        ))
    }

    /// Build the standard adapters over a `reqwest` client.
    pub fn from_config(config: &ResolverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let fetcher = ReqwestFetcher::from_config(config)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    pub fn priority(&self) -> PriorityOrder {
        self.priority
    }

    fn adapter(&self, source: Source) -> &dyn LookupAdapter {
        match source {
            Source::Cactus => self.cactus.as_ref(),
            Source::DrugBank => self.drugbank.as_ref(),
            Source::PubChem => self.pubchem.as_ref(),
        }
    }

    /// One adapter call, bounded by the call timeout.
    pub async fn lookup(&self, source: Source, identifier: &Identifier) -> AdapterOutcome {
        let call = self.adapter(source).resolve(identifier);
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => AdapterOutcome::TransportError(format!(
                "{} gave no answer within {} ms",
                source,
                self.call_timeout.as_millis()
            )),
        }
    }

    /// Resolve one row. Fields are tried in priority order; the first
    /// success ends the chain and later fields are never looked up.
    pub async fn resolve_row(&self, row: &Row) -> RowResolution {
        if row.is_empty() {
            return RowResolution::unresolved(UnresolvedReason::NoIdentifiers, Vec::new());
        }

        let mut attempts = Vec::new();

        for &(field, source) in self.priority.steps() {
            let Some(identifier) = row.get(field) else {
                continue;
            };

            let outcome = self.lookup(source, identifier).await;
            let found = outcome.inchi().cloned();

            attempts.push(Attempt {
                field,
                source,
                identifier: identifier.clone(),
                outcome,
            });

            if let Some(inchi) = found {
                return RowResolution {
                    result: StructureResult::Resolved {
                        inchi,
                        source,
                        field,
                    },
                    attempts,
                };
            }
        }

        RowResolution::unresolved(UnresolvedReason::Exhausted, attempts)
    }
}
