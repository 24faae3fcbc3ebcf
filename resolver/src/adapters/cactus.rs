//! NCI/CADD Chemical Identifier Resolver.
//!
//! Accepts names, CAS numbers and line notations (SMILES) alike and answers
//! with a plain-text InChI.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use std::sync::Arc;

use super::{classify_text, join_segments, LookupAdapter};
use crate::fetch::HttpFetch;
use crate::models::{AdapterOutcome, Identifier, Source};

static ACID_WORD: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)\bacid\b").ok());

/// CACTUS lookup by name, CAS number or notation.
pub struct CactusAdapter {
    fetcher: Arc<dyn HttpFetch>,
    base: Url,
}

impl CactusAdapter {
    pub fn new(fetcher: Arc<dyn HttpFetch>, base: Url) -> Self {
        Self { fetcher, base }
    }

    pub fn url_for(&self, identifier: &str) -> Url {
        join_segments(&self.base, [identifier, "inchi"])
    }

    async fn lookup(&self, identifier: &str) -> AdapterOutcome {
        classify_text(self.fetcher.get(&self.url_for(identifier)).await)
    }
}

#[async_trait]
impl LookupAdapter for CactusAdapter {
    fn source(&self) -> Source {
        Source::Cactus
    }

    /// Look the identifier up; a failed multi-word "... acid" name gets
    /// exactly one more try with its first word.
    async fn resolve(&self, identifier: &Identifier) -> AdapterOutcome {
        let outcome = self.lookup(identifier.as_str()).await;
        if outcome.is_success() {
            return outcome;
        }

        match acid_stem(identifier.as_str()) {
            Some(stem) => {
                let retry = self.lookup(stem).await;
                if retry.is_success() {
                    retry
                } else {
                    outcome
                }
            }
            None => outcome,
        }
    }
}

/// First word of a multi-word phrase that contains the word "acid".
///
/// `"benzoic acid"` → `Some("benzoic")`; `"acetic-acid"` and `"toluene"` → `None`.
pub fn acid_stem(identifier: &str) -> Option<&str> {
    let mut words = identifier.split_whitespace();
    let first = words.next()?;
    words.next()?;

    if ACID_WORD.as_ref().is_some_and(|re| re.is_match(identifier)) {
        Some(first)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::{Reply, ScriptedFetcher};

    const TOLUENE: &str = "InChI=1S/C7H8/c1-7-5-3-2-4-6-7/h2-6H,1H3";
    const BENZOIC: &str = "InChI=1S/C7H6O2/c8-7(9)6-4-2-1-3-5-6/h1-5H,(H,8,9)";

    fn adapter(fetcher: Arc<ScriptedFetcher>) -> CactusAdapter {
        let base = Url::parse("https://cactus.test/chemical/structure").unwrap();
        CactusAdapter::new(fetcher, base)
    }

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    #[test]
    fn test_acid_stem() {
        assert_eq!(acid_stem("benzoic acid"), Some("benzoic"));
        assert_eq!(acid_stem("Acetylsalicylic Acid"), Some("Acetylsalicylic"));
        assert_eq!(acid_stem("acid"), None);
        assert_eq!(acid_stem("acetic-acid"), None);
        assert_eq!(acid_stem("sodium chloride"), None);
        assert_eq!(acid_stem("toluene"), None);
        assert_eq!(acid_stem("hydroacidic compound"), None);
    }

    #[tokio::test]
    async fn test_resolve_by_name() {
        let fetcher = Arc::new(ScriptedFetcher::new().ok("/toluene/inchi", TOLUENE));
        let outcome = adapter(fetcher.clone()).resolve(&id("toluene")).await;

        assert_eq!(outcome.inchi().map(|i| i.as_str()), Some(TOLUENE));
        assert_eq!(
            fetcher.requests(),
            vec!["https://cactus.test/chemical/structure/toluene/inchi"]
        );
    }

    #[tokio::test]
    async fn test_not_found_page() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let outcome = adapter(fetcher).resolve(&id("unobtainium")).await;
        assert_eq!(outcome, AdapterOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_acid_retry_uses_first_word() {
        let fetcher = Arc::new(ScriptedFetcher::new().ok("/benzoic/inchi", BENZOIC));
        let outcome = adapter(fetcher.clone()).resolve(&id("benzoic acid")).await;

        assert!(outcome.is_success());
        let requests = fetcher.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].ends_with("/benzoic%20acid/inchi"));
        assert!(requests[1].ends_with("/benzoic/inchi"));
    }

    #[tokio::test]
    async fn test_acid_retry_is_bounded() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let outcome = adapter(fetcher.clone()).resolve(&id("amino acid mixture")).await;

        assert_eq!(outcome, AdapterOutcome::NotFound);
        assert_eq!(fetcher.request_count(), 2);
    }

    #[tokio::test]
    async fn test_no_retry_on_success() {
        let fetcher = Arc::new(ScriptedFetcher::new().ok("/benzoic%20acid/inchi", BENZOIC));
        let outcome = adapter(fetcher.clone()).resolve(&id("benzoic acid")).await;

        assert!(outcome.is_success());
        assert_eq!(fetcher.request_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_is_an_outcome() {
        let fetcher = Arc::new(ScriptedFetcher::new().on("/50-00-0/", Reply::Fail("connection reset".into())));
        let outcome = adapter(fetcher).resolve(&id("50-00-0")).await;

        match outcome {
            AdapterOutcome::TransportError(msg) => assert!(msg.contains("connection reset")),
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_idempotent_classification() {
        let fetcher = Arc::new(ScriptedFetcher::new().ok("/toluene/inchi", TOLUENE));
        let adapter = adapter(fetcher);

        let first = adapter.resolve(&id("toluene")).await;
        let second = adapter.resolve(&id("toluene")).await;
        assert_eq!(first, second);

        let first = adapter.resolve(&id("unknown")).await;
        let second = adapter.resolve(&id("unknown")).await;
        assert_eq!(first, second);
    }
}
