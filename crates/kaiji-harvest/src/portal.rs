//! HTTP client for the disclosure portal.

use std::time::Duration;

use async_trait::async_trait;
use kaiji_core::ListingDate;
use tracing::{debug, info};

use crate::{FetchError, RetryPolicy};

/// Public listing service of the Tokyo Stock Exchange.
pub const PORTAL_BASE_URL: &str = "https://www.release.tdnet.info/inbs/";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of raw listing pages.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// HTML of listing page `page` (1-based) for `date`.
    async fn listing_page(&self, date: ListingDate, page: usize) -> Result<String, FetchError>;

    /// Base prepended to relative links found on listing pages.
    fn link_base(&self) -> &str;
}

/// Source of document bytes.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Portal client. Every request is retried according to its [`RetryPolicy`].
pub struct PortalClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl PortalClient {
    /// Create a client for the portal at `base_url`.
    ///
    /// `base_url` should be like `https://www.release.tdnet.info/inbs/`; a
    /// trailing slash is added if missing.
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Result<Self, FetchError> {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("kaiji/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url,
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `I_list_{page:03}_{YYYYMMDD}.html` under the base URL.
    pub fn listing_url(&self, date: ListingDate, page: usize) -> String {
        format!("{}I_list_{page:03}_{}.html", self.base_url, date.compact())
    }

    async fn get_once(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        debug!(url, "GET");
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl ListingSource for PortalClient {
    async fn listing_page(&self, date: ListingDate, page: usize) -> Result<String, FetchError> {
        let url = self.listing_url(date, page);
        let url = url.as_str();
        info!(date = %date, page, "fetching listing page");
        self.retry
            .run(url, || async move {
                let resp = self.get_once(url).await?;
                Ok::<_, FetchError>(resp.text().await?)
            })
            .await
    }

    fn link_base(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl DocumentSource for PortalClient {
    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let bytes = self
            .retry
            .run(url, || async move {
                let resp = self.get_once(url).await?;
                Ok::<_, FetchError>(resp.bytes().await?.to_vec())
            })
            .await?;
        debug!(url, bytes = bytes.len(), "downloaded document");
        Ok(bytes)
    }
}
