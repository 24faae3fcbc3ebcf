//! PubChem compound database, queried by name through PUG REST.
//!
//! A name can match several compounds; the first record wins. Typical
//! answers:
//!
//! ```text
//! 200 {"PropertyTable":{"Properties":[{"CID":1140,"InChI":"InChI=1S/C7H8/..."}]}}
//! 404 {"Fault":{"Code":"PUGREST.NotFound","Message":"No CID found"}}
//! ```

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{join_segments, LookupAdapter};
use crate::fetch::{HttpFetch, HttpResponse};
use crate::models::{AdapterOutcome, Identifier, Inchi, Source};

/// One compound matching a name query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundRecord {
    #[serde(rename = "CID", default)]
    pub cid: Option<u64>,
    #[serde(rename = "InChI", default)]
    pub inchi: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PugResponse {
    #[serde(rename = "PropertyTable")]
    property_table: Option<PropertyTable>,
    #[serde(rename = "Fault")]
    fault: Option<Fault>,
}

#[derive(Debug, Deserialize)]
struct PropertyTable {
    #[serde(rename = "Properties", default)]
    properties: Vec<CompoundRecord>,
}

#[derive(Debug, Deserialize)]
struct Fault {
    #[serde(rename = "Code", default)]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
}

/// PubChem name search returning the first compound's InChI.
pub struct PubChemAdapter {
    fetcher: Arc<dyn HttpFetch>,
    base: Url,
}

impl PubChemAdapter {
    pub fn new(fetcher: Arc<dyn HttpFetch>, base: Url) -> Self {
        Self { fetcher, base }
    }

    pub fn url_for(&self, name: &str) -> Url {
        join_segments(
            &self.base,
            ["compound", "name", name, "property", "InChI", "JSON"],
        )
    }

    /// All compounds matching `name`, in PubChem's order.
    ///
    /// `Err` carries the outcome to report when no record list could be
    /// obtained.
    pub async fn query(&self, name: &str) -> Result<Vec<CompoundRecord>, AdapterOutcome> {
        let response = self
            .fetcher
            .get(&self.url_for(name))
            .await
            .map_err(|e| AdapterOutcome::TransportError(e.to_string()))?;

        parse_records(&response)
    }
}

#[async_trait]
impl LookupAdapter for PubChemAdapter {
    fn source(&self) -> Source {
        Source::PubChem
    }

    async fn resolve(&self, identifier: &Identifier) -> AdapterOutcome {
        let records = match self.query(identifier.as_str()).await {
            Ok(records) => records,
            Err(outcome) => return outcome,
        };

        let Some(first) = records.into_iter().next() else {
            return AdapterOutcome::NotFound;
        };

        match first.inchi.as_deref().and_then(Inchi::new) {
            Some(inchi) => AdapterOutcome::Success(inchi),
            None => AdapterOutcome::MalformedResponse(format!(
                "compound {} has no InChI",
                first.cid.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string())
            )),
        }
    }
}

fn parse_records(response: &HttpResponse) -> Result<Vec<CompoundRecord>, AdapterOutcome> {
    let parsed: PugResponse = match serde_json::from_str(&response.body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return Err(match response.status {
                404 => AdapterOutcome::NotFound,
                s if s >= 500 => AdapterOutcome::TransportError(format!("HTTP {}", s)),
                s => AdapterOutcome::MalformedResponse(format!("HTTP {}: {}", s, e)),
            })
        }
    };

    if let Some(fault) = parsed.fault {
        return Err(classify_fault(&fault));
    }

    match parsed.property_table {
        Some(table) => Ok(table.properties),
        None if response.status == 404 => Err(AdapterOutcome::NotFound),
        None => Err(AdapterOutcome::MalformedResponse(
            "response has neither PropertyTable nor Fault".to_string(),
        )),
    }
}

/// Map a PUG REST fault code onto an outcome.
fn classify_fault(fault: &Fault) -> AdapterOutcome {
    match fault.code.as_str() {
        "PUGREST.NotFound" | "PUGREST.BadRequest" => AdapterOutcome::NotFound,
        "PUGREST.ServerBusy" | "PUGREST.Timeout" | "PUGREST.ServerError" => {
            AdapterOutcome::TransportError(format!("{}: {}", fault.code, fault.message))
        }
        _ => AdapterOutcome::MalformedResponse(format!("{}: {}", fault.code, fault.message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::{Reply, ScriptedFetcher};

    const TOLUENE_JSON: &str = r#"{"PropertyTable":{"Properties":[
        {"CID":1140,"InChI":"InChI=1S/C7H8/c1-7-5-3-2-4-6-7/h2-6H,1H3"},
        {"CID":9999,"InChI":"InChI=1S/other"}
    ]}}"#;

    const NOT_FOUND_JSON: &str =
        r#"{"Fault":{"Code":"PUGREST.NotFound","Message":"No CID found","Details":["No CID found that matches the given name"]}}"#;

    fn adapter(fetcher: Arc<ScriptedFetcher>) -> PubChemAdapter {
        let base = Url::parse("https://pubchem.test/rest/pug").unwrap();
        PubChemAdapter::new(fetcher, base)
    }

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    #[test]
    fn test_url_template() {
        let adapter = adapter(Arc::new(ScriptedFetcher::new()));
        assert_eq!(
            adapter.url_for("acetic acid").as_str(),
            "https://pubchem.test/rest/pug/compound/name/acetic%20acid/property/InChI/JSON"
        );
    }

    #[tokio::test]
    async fn test_first_compound_wins() {
        let fetcher = Arc::new(ScriptedFetcher::new().ok("/name/toluene/", TOLUENE_JSON));
        let outcome = adapter(fetcher).resolve(&id("toluene")).await;

        assert_eq!(
            outcome.inchi().map(|i| i.as_str()),
            Some("InChI=1S/C7H8/c1-7-5-3-2-4-6-7/h2-6H,1H3")
        );
    }

    #[tokio::test]
    async fn test_query_returns_all_records() {
        let fetcher = Arc::new(ScriptedFetcher::new().ok("/name/toluene/", TOLUENE_JSON));
        let records = adapter(fetcher).query("toluene").await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].cid, Some(9999));
    }

    #[tokio::test]
    async fn test_fault_not_found() {
        let fetcher = Arc::new(
            ScriptedFetcher::new().on("/name/", Reply::Respond(404, NOT_FOUND_JSON.into())),
        );
        let outcome = adapter(fetcher).resolve(&id("unobtainium")).await;
        assert_eq!(outcome, AdapterOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_server_busy_is_transport_error() {
        let body = r#"{"Fault":{"Code":"PUGREST.ServerBusy","Message":"Too many requests"}}"#;
        let fetcher = Arc::new(ScriptedFetcher::new().on("/name/", Reply::Respond(503, body.into())));
        let outcome = adapter(fetcher).resolve(&id("toluene")).await;
        assert!(matches!(outcome, AdapterOutcome::TransportError(_)));
    }

    #[tokio::test]
    async fn test_empty_property_list() {
        let body = r#"{"PropertyTable":{"Properties":[]}}"#;
        let fetcher = Arc::new(ScriptedFetcher::new().ok("/name/", body));
        let outcome = adapter(fetcher).resolve(&id("toluene")).await;
        assert_eq!(outcome, AdapterOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_record_without_inchi() {
        let body = r#"{"PropertyTable":{"Properties":[{"CID":42}]}}"#;
        let fetcher = Arc::new(ScriptedFetcher::new().ok("/name/", body));
        let outcome = adapter(fetcher).resolve(&id("toluene")).await;

        match outcome {
            AdapterOutcome::MalformedResponse(msg) => assert!(msg.contains("42")),
            other => panic!("expected malformed response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_body() {
        let fetcher = Arc::new(ScriptedFetcher::new().ok("/name/", "<html>oops</html>"));
        let outcome = adapter(fetcher).resolve(&id("toluene")).await;
        assert!(matches!(outcome, AdapterOutcome::MalformedResponse(_)));

        // Default scripted reply is a 404 HTML page.
        let fetcher = Arc::new(ScriptedFetcher::new());
        let outcome = adapter(fetcher).resolve(&id("toluene")).await;
        assert_eq!(outcome, AdapterOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let fetcher = Arc::new(ScriptedFetcher::new().on("/name/", Reply::Fail("dns error".into())));
        let outcome = adapter(fetcher).resolve(&id("toluene")).await;
        assert!(matches!(outcome, AdapterOutcome::TransportError(_)));
    }
}
