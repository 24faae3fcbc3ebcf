//! Identifier lookup adapters.
//!
//! Each adapter wraps one external service and turns whatever it answers
//! into an [`AdapterOutcome`]. Nothing escapes an adapter as an error:
//! transport failures, odd status codes and unparseable bodies all become
//! outcomes, so the orchestrator never looks at raw response text.
//!
//! | Adapter             | Identifier              | Request                                              |
//! |---------------------|-------------------------|------------------------------------------------------|
//! | [`CactusAdapter`]   | name, CAS, notation     | `GET {base}/{identifier}/inchi`                      |
//! | [`DrugBankAdapter`] | DrugBank ID             | `GET {base}/{identifier}.inchi`                      |
//! | [`PubChemAdapter`]  | name                    | `GET {base}/compound/name/{name}/property/InChI/JSON` |

pub mod cactus;
pub mod drugbank;
pub mod pubchem;

pub use cactus::CactusAdapter;
pub use drugbank::DrugBankAdapter;
pub use pubchem::{CompoundRecord, PubChemAdapter};

use async_trait::async_trait;
use reqwest::Url;

use crate::error::FetchError;
use crate::fetch::HttpResponse;
use crate::models::{AdapterOutcome, Identifier, Inchi, Source};

/// Body phrases of the plain-text services' two known failure pages
/// ("Bad Request", "Page not found").
pub const NOT_FOUND_PHRASES: &[&str] = &["Bad", "found"];

/// One external structure source.
#[async_trait]
pub trait LookupAdapter: Send + Sync {
    fn source(&self) -> Source;

    async fn resolve(&self, identifier: &Identifier) -> AdapterOutcome;
}

/// Append percent-encoded path segments to a base URL.
pub(crate) fn join_segments<I, S>(base: &Url, segments: I) -> Url
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty();
        for segment in segments {
            path.push(segment.as_ref());
        }
    }
    url
}

/// Classify a plain-text structure response (CACTUS, DrugBank).
///
/// Rules, in order:
/// 1. transport failure → `TransportError`
/// 2. body contains a failure phrase → `NotFound`
/// 3. first non-empty line carries the `InChI` marker → `Success`
/// 4. 5xx status → `TransportError`
/// 5. 404 status → `NotFound`
/// 6. anything else → `MalformedResponse`
pub(crate) fn classify_text(result: Result<HttpResponse, FetchError>) -> AdapterOutcome {
    let response = match result {
        Ok(r) => r,
        Err(e) => return AdapterOutcome::TransportError(e.to_string()),
    };

    if NOT_FOUND_PHRASES.iter().any(|p| response.body.contains(p)) {
        return AdapterOutcome::NotFound;
    }

    if let Some(inchi) = Inchi::from_body(&response.body) {
        return AdapterOutcome::Success(inchi);
    }

    if response.is_server_error() {
        return AdapterOutcome::TransportError(format!("HTTP {}", response.status));
    }

    if response.status == 404 {
        return AdapterOutcome::NotFound;
    }

    AdapterOutcome::MalformedResponse(format!(
        "HTTP {}: {:?}",
        response.status,
        response.snippet(80)
    ))
}
