//! HTTP transport for sitemaps, robots.txt and sampled pages
//!
//! Two clients share one configuration:
//! - a raw client for the sitemap itself, which negotiates compression on its
//!   own so the `Content-Encoding` header and the still-encoded body stay
//!   observable
//! - a decoding client for everything else (robots.txt, index lookups, probes)

mod decompress;

pub use decompress::*;

use crate::config::Config;
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::{Client, Response};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Redirects followed before giving up
pub const MAX_REDIRECTS: usize = 5;

/// One completed GET
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// URL after redirects
    pub final_url: String,
    pub status: u16,
    pub headers: HeaderMap,
    /// Body as received, still transport-encoded for [`Fetcher::fetch_sitemap`]
    pub body: Vec<u8>,
    /// `Content-Length` as announced by the server
    pub declared_length: Option<u64>,
    /// The body grew past the ceiling and was dropped
    pub oversized: bool,
    pub elapsed: Duration,
}

impl FetchedResource {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    pub fn content_encoding(&self) -> Option<&str> {
        self.header(CONTENT_ENCODING.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body interpreted as UTF-8, invalid sequences replaced
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP fetcher configured from [`Config`]
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    raw_client: Client,
    max_body: u64,
}

impl Fetcher {
    /// Create a fetcher with the configured user agent, timeout and TLS policy
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_client(config, true)?,
            raw_client: build_client(config, false)?,
            max_body: config.security.max_filesize,
        })
    }

    /// The auto-decoding client, shared with the sample prober
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Hard ceiling for any body read through this fetcher
    pub fn max_body(&self) -> u64 {
        self.max_body
    }

    /// Fetch a sitemap without transparent decoding
    ///
    /// Non-2xx responses and bodies over the ceiling come back with an empty
    /// body. Only transport failures are errors.
    pub async fn fetch_sitemap(&self, url: &str) -> Result<FetchedResource> {
        let request = self
            .raw_client
            .get(url)
            .header(ACCEPT_ENCODING, "gzip, deflate");
        self.execute(request, url).await
    }

    /// Fetch any resource, letting the client undo transport compression
    pub async fn fetch(&self, url: &str) -> Result<FetchedResource> {
        self.execute(self.client.get(url), url).await
    }

    async fn execute(&self, request: reqwest::RequestBuilder, url: &str) -> Result<FetchedResource> {
        debug!("Fetching: {}", url);
        let started = Instant::now();
        let response = request.send().await?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response.headers().clone();
        let declared_length = response.content_length();

        let (body, oversized) = if response.status().is_success() {
            match read_body_limited(response, self.max_body).await {
                Ok(body) => (body, false),
                Err(Error::TooLarge(limit)) => {
                    warn!("{} is larger than {} bytes", url, limit);
                    (Vec::new(), true)
                }
                Err(e) => return Err(e),
            }
        } else {
            (Vec::new(), false)
        };
        let elapsed = started.elapsed();

        debug!(
            "Fetched {} -> {} ({} bytes in {:?})",
            url,
            status,
            body.len(),
            elapsed
        );

        Ok(FetchedResource {
            final_url,
            status,
            headers,
            body,
            declared_length,
            oversized,
            elapsed,
        })
    }
}

fn build_client(config: &Config, decode: bool) -> Result<Client> {
    let builder = Client::builder()
        .user_agent(&config.validator.user_agent)
        .timeout(config.validator.timeout())
        .danger_accept_invalid_certs(!config.security.verify_ssl)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));

    let builder = if decode {
        builder.gzip(true).brotli(true).deflate(true)
    } else {
        builder.no_gzip().no_brotli().no_deflate()
    };

    builder
        .build()
        .map_err(|e| Error::Client(format!("Failed to create HTTP client: {}", e)))
}

/// Read a whole body, failing once it grows past `limit` bytes
pub(crate) async fn read_body_limited(mut response: Response, limit: u64) -> Result<Vec<u8>> {
    if response.content_length().is_some_and(|len| len > limit) {
        return Err(Error::TooLarge(limit));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if (body.len() + chunk.len()) as u64 > limit {
            return Err(Error::TooLarge(limit));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Read at most `limit` bytes of a body and drop the rest
pub(crate) async fn read_body_prefix(mut response: Response, limit: usize) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit.saturating_sub(body.len());
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
