//! DrugBank structure downloads by DrugBank ID.

use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;

use super::{classify_text, join_segments, LookupAdapter};
use crate::fetch::HttpFetch;
use crate::models::{AdapterOutcome, Identifier, Source};

/// DrugBank lookup, `{base}/{id}.inchi`.
pub struct DrugBankAdapter {
    fetcher: Arc<dyn HttpFetch>,
    base: Url,
}

impl DrugBankAdapter {
    pub fn new(fetcher: Arc<dyn HttpFetch>, base: Url) -> Self {
        Self { fetcher, base }
    }

    pub fn url_for(&self, identifier: &str) -> Url {
        join_segments(&self.base, [format!("{}.inchi", identifier)])
    }
}

#[async_trait]
impl LookupAdapter for DrugBankAdapter {
    fn source(&self) -> Source {
        Source::DrugBank
    }

    async fn resolve(&self, identifier: &Identifier) -> AdapterOutcome {
        let url = self.url_for(identifier.as_str());
        classify_text(self.fetcher.get(&url).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::{Reply, ScriptedFetcher};

    const ASPIRIN: &str = "InChI=1S/C9H8O4/c1-6(10)13-8-5-3-2-4-7(8)9(11)12/h2-5H,1H3,(H,11,12)";

    fn adapter(fetcher: Arc<ScriptedFetcher>) -> DrugBankAdapter {
        let base = Url::parse("https://drugbank.test/structures/small_molecule_drugs").unwrap();
        DrugBankAdapter::new(fetcher, base)
    }

    #[test]
    fn test_url_template() {
        let adapter = adapter(Arc::new(ScriptedFetcher::new()));
        assert_eq!(
            adapter.url_for("DB00945").as_str(),
            "https://drugbank.test/structures/small_molecule_drugs/DB00945.inchi"
        );
    }

    #[tokio::test]
    async fn test_resolve_by_id() {
        let fetcher = Arc::new(ScriptedFetcher::new().ok("/DB00945.inchi", ASPIRIN));
        let outcome = adapter(fetcher).resolve(&Identifier::new("DB00945").unwrap()).await;
        assert_eq!(outcome.inchi().map(|i| i.as_str()), Some(ASPIRIN));
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let fetcher = Arc::new(ScriptedFetcher::new().on(
            "/DB99999999.inchi",
            Reply::Respond(404, "The page you were looking for could not be found".into()),
        ));
        let outcome = adapter(fetcher).resolve(&Identifier::new("DB99999999").unwrap()).await;
        assert_eq!(outcome, AdapterOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let fetcher = Arc::new(ScriptedFetcher::new().on("/DB00945.inchi", Reply::Timeout));
        let outcome = adapter(fetcher).resolve(&Identifier::new("DB00945").unwrap()).await;
        assert!(matches!(outcome, AdapterOutcome::TransportError(_)));
    }

    #[tokio::test]
    async fn test_no_acid_retry() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let outcome = adapter(fetcher.clone())
            .resolve(&Identifier::new("folic acid").unwrap())
            .await;

        assert_eq!(outcome, AdapterOutcome::NotFound);
        assert_eq!(fetcher.request_count(), 1);
    }
}
