// Client for the external monster catalog API.

use serde::Deserialize;

use crate::language::Language;
use crate::metrics;

/// One monster entry from the catalog. Ephemeral: fetched fresh on every
/// query that needs it, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MonsterRecord {
    pub name: String,
}

/// Why a catalog fetch produced no data. Callers must branch on this
/// rather than treating an empty list as an overloaded failure signal.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("catalog API returned status {0}")]
    Status(u16),
    #[error("catalog response did not parse: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The default endpoint has shipped two body shapes over time: a bare
/// array of monsters and an object wrapping the same array. Both must
/// be tolerated.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogBody {
    Bare(Vec<MonsterRecord>),
    Wrapped { monsters: Vec<MonsterRecord> },
}

impl CatalogBody {
    fn into_monsters(self) -> Vec<MonsterRecord> {
        match self {
            CatalogBody::Bare(monsters) => monsters,
            CatalogBody::Wrapped { monsters } => monsters,
        }
    }
}

/// Read-only client for the monster catalog. No retries, no caching:
/// every call is a fresh network round trip with the transport's
/// default timeouts.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    localized_base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: String, localized_base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            localized_base_url,
        }
    }

    /// The endpoint used for the given language: English hits the default
    /// catalog, other languages the language-parameterized one.
    pub fn url_for(&self, language: Language) -> String {
        match language {
            Language::En => self.base_url.clone(),
            other => format!(
                "{}/{}/monsters?kind=large",
                self.localized_base_url,
                other.code()
            ),
        }
    }

    /// Fetch the monster roster for a language. Transport faults, non-2xx
    /// statuses and malformed bodies are all errors; an `Ok` result holds
    /// whatever the API returned, which callers should still treat as a
    /// failure when empty (a real catalog is never empty).
    pub async fn fetch_catalog(&self, language: Language) -> Result<Vec<MonsterRecord>, CatalogError> {
        let url = self.url_for(language);
        tracing::info!(%url, "fetching monster catalog");

        match self.fetch_inner(&url).await {
            Ok(monsters) => {
                tracing::info!(count = monsters.len(), "fetched monster catalog");
                Ok(monsters)
            }
            Err(e) => {
                metrics::CATALOG_FETCH_FAILURES_TOTAL
                    .with_label_values(&[language.code()])
                    .inc();
                tracing::error!(%url, error = %e, "catalog fetch failed");
                Err(e)
            }
        }
    }

    async fn fetch_inner(&self, url: &str) -> Result<Vec<MonsterRecord>, CatalogError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        parse_catalog_body(&body)
    }
}

/// Parse a catalog response body, accepting both observed shapes.
pub fn parse_catalog_body(body: &str) -> Result<Vec<MonsterRecord>, CatalogError> {
    let parsed: CatalogBody = serde_json::from_str(body)?;
    Ok(parsed.into_monsters())
}
