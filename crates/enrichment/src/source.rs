//! Remote summary lookups.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Short description of a place, as shown in its popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
}

impl Summary {
    /// Popup text: the short description, else the extract.
    pub fn blurb(&self) -> Option<&str> {
        self.description
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.extract.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentError {
    InvalidUrl(String),
    Http(String),
    Status(u16),
    Decode(String),
}

impl std::fmt::Display for EnrichmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrichmentError::InvalidUrl(msg) => write!(f, "invalid summary url: {msg}"),
            EnrichmentError::Http(msg) => write!(f, "summary request failed: {msg}"),
            EnrichmentError::Status(code) => write!(f, "summary request returned HTTP {code}"),
            EnrichmentError::Decode(msg) => write!(f, "summary response malformed: {msg}"),
        }
    }
}

impl std::error::Error for EnrichmentError {}

/// Looks up a summary by page title. `Ok(None)` means no such page.
pub trait SummarySource {
    fn fetch_summary<'a>(
        &'a self,
        title: &'a str,
    ) -> BoxFuture<'a, Result<Option<Summary>, EnrichmentError>>;
}

/// Wikipedia REST `page/summary` payload, reduced to the fields we show.
#[derive(Debug, Deserialize)]
struct RestSummary {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    thumbnail: Option<RestThumbnail>,
    #[serde(default)]
    content_urls: Option<RestContentUrls>,
}

#[derive(Debug, Deserialize)]
struct RestThumbnail {
    source: String,
}

#[derive(Debug, Deserialize)]
struct RestContentUrls {
    #[serde(default)]
    desktop: Option<RestPage>,
}

#[derive(Debug, Deserialize)]
struct RestPage {
    page: String,
}

impl From<RestSummary> for Summary {
    fn from(rest: RestSummary) -> Self {
        Summary {
            title: rest.title,
            description: rest.description,
            extract: rest.extract,
            thumbnail_url: rest.thumbnail.map(|t| t.source),
            page_url: rest.content_urls.and_then(|c| c.desktop).map(|d| d.page),
        }
    }
}

/// Parses a `page/summary` response body.
pub fn parse_rest_summary(body: &str) -> Result<Summary, EnrichmentError> {
    serde_json::from_str::<RestSummary>(body)
        .map(Summary::from)
        .map_err(|e| EnrichmentError::Decode(e.to_string()))
}

/// Builds `{base}/page/summary/{title}` with spaces in the title as
/// underscores and the segment percent-encoded.
pub fn summary_url(base: &url::Url, title: &str) -> Result<url::Url, EnrichmentError> {
    let mut url = base.clone();
    let title = title.trim().replace(' ', "_");
    url.path_segments_mut()
        .map_err(|_| EnrichmentError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(["page", "summary", title.as_str()]);
    Ok(url)
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::WikipediaSource;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::time::Duration;

    use super::{BoxFuture, EnrichmentError, Summary, SummarySource, parse_rest_summary, summary_url};

    #[derive(Debug, Clone)]
    pub struct WikipediaSource {
        base: url::Url,
        client: reqwest::Client,
    }

    impl WikipediaSource {
        pub const DEFAULT_BASE_URL: &'static str = "https://en.wikipedia.org/api/rest_v1";

        pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EnrichmentError> {
            let base =
                url::Url::parse(base_url).map_err(|e| EnrichmentError::InvalidUrl(e.to_string()))?;
            if base.cannot_be_a_base() {
                return Err(EnrichmentError::InvalidUrl(base_url.to_string()));
            }
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(concat!("snowmap/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| EnrichmentError::Http(e.to_string()))?;
            Ok(Self { base, client })
        }
    }

    impl SummarySource for WikipediaSource {
        fn fetch_summary<'a>(
            &'a self,
            title: &'a str,
        ) -> BoxFuture<'a, Result<Option<Summary>, EnrichmentError>> {
            Box::pin(async move {
                let url = summary_url(&self.base, title)?;
                tracing::debug!(%url, "fetching summary");

                let resp = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| EnrichmentError::Http(e.to_string()))?;

                if resp.status() == reqwest::StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if !resp.status().is_success() {
                    return Err(EnrichmentError::Status(resp.status().as_u16()));
                }

                let body = resp
                    .text()
                    .await
                    .map_err(|e| EnrichmentError::Http(e.to_string()))?;
                parse_rest_summary(&body).map(Some)
            })
        }
    }
}
