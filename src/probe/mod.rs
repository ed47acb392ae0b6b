//! Live reachability and indexability checks for sampled sitemap URLs

mod noindex;

pub use noindex::*;

use crate::config::ValidatorConfig;
use crate::error::Result;
use crate::fetch::{read_body_prefix, Fetcher};
use crate::models::UrlSampleStatus;
use crate::robots::RobotsRules;
use futures::stream::{self, StreamExt};
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Bytes of a sampled page scanned for robots meta tags
pub const PROBE_BODY_LIMIT: usize = 1024 * 1024;

/// Pick up to `count` distinct candidates, uniformly at random
///
/// With `count` or fewer candidates all of them are returned in their
/// original order.
pub fn select_sample<R: Rng + ?Sized>(candidates: &[String], count: usize, rng: &mut R) -> Vec<String> {
    if candidates.len() <= count {
        return candidates.to_vec();
    }
    candidates.choose_multiple(rng, count).cloned().collect()
}

/// Probes sampled URLs with bounded concurrency
pub struct SampleProber<'a> {
    client: &'a Client,
    timeout: Duration,
    concurrency: usize,
}

struct ProbeOutcome {
    status: u16,
    noindex_header: bool,
    noindex_meta: bool,
}

impl<'a> SampleProber<'a> {
    pub fn new(fetcher: &'a Fetcher, config: &ValidatorConfig) -> Self {
        Self {
            client: fetcher.client(),
            timeout: config.timeout(),
            concurrency: config.probe_concurrency.max(1),
        }
    }

    /// Probe every URL and return statuses in the order given
    ///
    /// robots.txt blocking is decided up front; every URL is fetched
    /// regardless. A failed probe never fails the batch.
    pub async fn probe_all(&self, sample: Vec<String>, rules: &RobotsRules) -> Vec<UrlSampleStatus> {
        if sample.is_empty() {
            return Vec::new();
        }
        info!("Probing {} sampled URLs", sample.len());

        let pending: Vec<UrlSampleStatus> = sample
            .into_iter()
            .map(|url| {
                let blocked = rules.is_url_blocked(&url);
                UrlSampleStatus::pending(url, blocked)
            })
            .collect();

        stream::iter(pending)
            .map(|status| self.probe(status))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn probe(&self, mut status: UrlSampleStatus) -> UrlSampleStatus {
        match tokio::time::timeout(self.timeout, self.fetch_outcome(&status.url)).await {
            Ok(Ok(outcome)) => {
                status.http_status = Some(outcome.status);
                status.has_noindex_header = outcome.noindex_header;
                status.has_noindex_meta = outcome.noindex_meta;
                debug!("Probe {} -> {}", status.url, outcome.status);
            }
            Ok(Err(e)) => {
                debug!("Probe {} failed: {}", status.url, e);
                status.probe_error = Some(e.to_string());
            }
            Err(_) => {
                debug!("Probe {} timed out", status.url);
                status.probe_error = Some(format!("timed out after {}s", self.timeout.as_secs()));
            }
        }
        status
    }

    async fn fetch_outcome(&self, url: &str) -> Result<ProbeOutcome> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let noindex_header = header_has_noindex(response.headers());

        // Any status and content type: mislabelled pages still carry the tag
        let body = read_body_prefix(response, PROBE_BODY_LIMIT).await?;
        let noindex_meta = html_has_noindex(&String::from_utf8_lossy(&body));

        Ok(ProbeOutcome {
            status,
            noindex_header,
            noindex_meta,
        })
    }
}
