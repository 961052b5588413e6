use std::time::Duration;

use async_trait::async_trait;
use slugsync_core::{SITEMAP_INDEX_FILE, SitemapEntry};

use crate::error::FetchError;
use crate::parse::{extract_locs, extract_url_entries};

/// Where sitemap entries come from. One request per call, no retries.
#[async_trait]
pub trait SitemapSource: Send + Sync {
    /// Sub-sitemap URLs listed by the index, in index order.
    async fn list_sitemaps(&self) -> Result<Vec<String>, FetchError>;

    /// Decoded entries of one sub-sitemap, in document order.
    async fn fetch_sitemap(&self, url: &str) -> Result<Vec<SitemapEntry>, FetchError>;
}

/// HTTP client for the remote sitemap tree.
pub struct SitemapClient {
    client: reqwest::Client,
    index_url: String,
    page_url_prefix: String,
}

impl std::fmt::Debug for SitemapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SitemapClient")
            .field("index_url", &self.index_url)
            .field("page_url_prefix", &self.page_url_prefix)
            .finish_non_exhaustive()
    }
}

impl SitemapClient {
    /// Creates a client for the sitemap tree rooted at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(base_url: &str, page_url_prefix: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("slugsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::ClientInit(e.to_string()))?;
        let index_url = format!("{}/{SITEMAP_INDEX_FILE}", base_url.trim_end_matches('/'));
        Ok(Self { client, index_url, page_url_prefix: page_url_prefix.to_owned() })
    }

    /// Returns the sitemap index URL.
    #[must_use]
    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport { url: url.to_owned(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_owned(), code: status.as_u16() });
        }

        response.text().await.map_err(|source| FetchError::Transport { url: url.to_owned(), source })
    }
}

#[async_trait]
impl SitemapSource for SitemapClient {
    async fn list_sitemaps(&self) -> Result<Vec<String>, FetchError> {
        let xml = self.get_text(&self.index_url).await?;
        let urls = extract_locs(&xml);
        tracing::info!(sitemaps = urls.len(), index = %self.index_url, "Fetched sitemap index");
        Ok(urls)
    }

    async fn fetch_sitemap(&self, url: &str) -> Result<Vec<SitemapEntry>, FetchError> {
        let xml = self.get_text(url).await?;
        Ok(entries_from_xml(&xml, &self.page_url_prefix))
    }
}

/// Decode every `<url>` block into an entry.
///
/// The page prefix is stripped from each `<loc>`; a location without it is
/// decoded whole so the entry still reaches the store and its counters.
#[must_use]
pub fn entries_from_xml(xml: &str, page_url_prefix: &str) -> Vec<SitemapEntry> {
    extract_url_entries(xml)
        .into_iter()
        .map(|e| {
            let segment = match e.loc.strip_prefix(page_url_prefix) {
                Some(segment) => segment,
                None => {
                    tracing::warn!(
                        loc = %e.loc,
                        prefix = page_url_prefix,
                        "Sitemap location outside the page prefix, keeping it whole"
                    );
                    e.loc.as_str()
                },
            };
            SitemapEntry::from_raw_segment(segment, e.last_modified.clone())
        })
        .collect()
}
