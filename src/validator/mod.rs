//! The validation pipeline
//!
//! Fetch, decompress, parse, analyze entries, check robots.txt, probe a
//! sample, score. Each stage appends to one per-run diagnostics log; fatal
//! stages stop the pipeline and the partial result is returned as is.

use crate::config::{Config, SecurityConfig};
use crate::error::{Error, Result};
use crate::fetch::{decode_content, gunzip, needs_gunzip, ContentCoding, Fetcher};
use crate::models::{Diagnostics, ValidationResult};
use crate::probe::{select_sample, SampleProber};
use crate::robots::{RobotsAnalyzer, RobotsRules};
use crate::score;
use crate::sitemap::{
    analyze_index, analyze_urlset, check_mime_type, check_root, check_utf8, is_gz_named,
    parse_document, RootKind, SOFT_MAX_FILESIZE,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};
use url::Url;

/// Accept only absolute http(s) URLs whose host passes the allow-list
pub fn validate_input_url(raw: &str, security: &SecurityConfig) -> Result<Url> {
    let raw = raw.trim();
    let url = Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("{}: {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::UnsupportedScheme(url.scheme().to_string()));
    }

    let host = url
        .host_str()
        .ok_or_else(|| Error::InvalidUrl(format!("{}: URL has no host", raw)))?;
    if !security.is_host_allowed(host) {
        return Err(Error::HostNotAllowed(host.to_string()));
    }

    Ok(url)
}

/// Validates sitemaps with one configuration
pub struct SitemapValidator {
    config: Config,
    fetcher: Fetcher,
}

impl SitemapValidator {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let fetcher = Fetcher::new(&config)?;
        Ok(Self { config, fetcher })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate one sitemap URL
    ///
    /// Only a rejected input URL is an `Err`. Everything that goes wrong with
    /// the sitemap itself is reported on the returned result.
    pub async fn validate(&self, url: &str) -> Result<ValidationResult> {
        let mut rng = StdRng::from_entropy();
        self.validate_with_rng(url, &mut rng).await
    }

    /// [`validate`](Self::validate) with a caller-supplied sampling RNG
    pub async fn validate_with_rng<R: Rng + ?Sized>(
        &self,
        url: &str,
        rng: &mut R,
    ) -> Result<ValidationResult> {
        let url = validate_input_url(url, &self.config.security)?;
        info!("Validating {}", url);

        let mut result = ValidationResult::new(url.as_str());
        let mut diagnostics = Diagnostics::new();

        if let Some(body) = self.fetch_stage(&url, &mut result, &mut diagnostics).await {
            self.analyze(&url, &body, &mut result, &mut diagnostics, rng)
                .await;
        }

        result.errors = diagnostics.into_vec();
        info!(
            "Finished {}: score {:?}, {} diagnostics",
            url,
            result.sitemap_score,
            result.errors.len()
        );
        Ok(result)
    }

    /// Fetch and decode the sitemap; `None` halts the run
    async fn fetch_stage(
        &self,
        url: &Url,
        result: &mut ValidationResult,
        diagnostics: &mut Diagnostics,
    ) -> Option<Vec<u8>> {
        let gz_named = is_gz_named(url);
        result.is_compressed = gz_named;

        let resource = match self.fetcher.fetch_sitemap(url.as_str()).await {
            Ok(resource) => resource,
            Err(e) => {
                warn!("Sitemap {} is unreachable: {}", url, e);
                diagnostics.push(format!("Sitemap could not be retrieved: {}", e));
                return None;
            }
        };

        result.http_status = Some(resource.status);
        result.load_time = resource.elapsed.as_secs_f64();
        result.content_type = resource.content_type().map(str::to_string);
        result.content_encoding_header = resource.content_encoding().map(str::to_string);

        let coding = ContentCoding::from_header(resource.content_encoding());
        result.http_compressed = coding.is_compressed();

        if !resource.is_success() {
            diagnostics.push(format!("HTTP status {} when fetching the sitemap", resource.status));
            return None;
        }
        if resource.status != 200 {
            diagnostics.push(format!("HTTP status is {}, expected 200", resource.status));
        }

        result.valid_mime_type =
            check_mime_type(result.content_type.as_deref(), gz_named, diagnostics);

        let max = self.config.security.max_filesize;
        if resource.oversized {
            result.filesize = resource.declared_length.unwrap_or(0);
            diagnostics.push(too_large(max));
            return None;
        }

        if let ContentCoding::Unsupported(name) = &coding {
            diagnostics.push(format!("Unsupported Content-Encoding: {}", name));
        }
        let body = match decode_content(&coding, resource.body, max) {
            Ok(body) => body,
            Err(Error::TooLarge(limit)) => {
                diagnostics.push(too_large(limit));
                return None;
            }
            Err(e) => {
                diagnostics.push(format!("Could not decode the HTTP response: {}", e));
                return None;
            }
        };

        let body = if needs_gunzip(gz_named, &body) {
            debug!("Inflating gzip sitemap {}", url);
            match gunzip(&body, max) {
                Ok(inflated) => inflated,
                Err(Error::TooLarge(limit)) => {
                    diagnostics.push(too_large(limit));
                    return None;
                }
                Err(e) => {
                    diagnostics.push(format!("Could not decompress the gzip file: {}", e));
                    return None;
                }
            }
        } else {
            body
        };

        result.filesize = body.len() as u64;
        if result.filesize > SOFT_MAX_FILESIZE {
            diagnostics.push(format!(
                "Sitemap is larger than 50 MB ({:.2} MB)",
                result.filesize as f64 / (1024.0 * 1024.0)
            ));
        }

        Some(body)
    }

    async fn analyze<R: Rng + ?Sized>(
        &self,
        url: &Url,
        body: &[u8],
        result: &mut ValidationResult,
        diagnostics: &mut Diagnostics,
        rng: &mut R,
    ) {
        let doc = match parse_document(body) {
            Ok(doc) => doc,
            Err(e) => {
                debug!("Sitemap {} failed to parse: {}", url, e);
                diagnostics.push(e.to_string());
                return;
            }
        };
        result.valid_xml = true;
        result.encoding_utf8 = check_utf8(
            result.content_type.as_deref(),
            doc.declared_encoding.as_deref(),
            diagnostics,
        );

        let (kind, valid_root) = check_root(&doc, diagnostics);
        result.valid_root_element = valid_root;

        let candidates = match kind {
            RootKind::UrlSet => {
                let analysis = analyze_urlset(&doc, diagnostics);
                result.url_count = analysis.url_count;
                result.unique_url_count = analysis.unique_urls.len();
                result.has_lastmod = analysis.has_lastmod;
                result.has_invalid_lastmod = Some(analysis.has_invalid_lastmod);
                result.has_changefreq = Some(analysis.has_changefreq);
                result.has_invalid_changefreq = Some(analysis.has_invalid_changefreq);
                result.has_priority = Some(analysis.has_priority);
                result.has_invalid_priority = Some(analysis.has_invalid_priority);
                result.extensions = Some(analysis.extensions);
                Some(analysis.unique_urls)
            }
            RootKind::SitemapIndex => {
                let analysis = analyze_index(&doc, diagnostics);
                result.is_sitemap_index = true;
                result.url_count = analysis.entry_count;
                result.unique_url_count = analysis.unique_urls.len();
                result.has_lastmod = analysis.has_lastmod;
                None
            }
            RootKind::Unknown(_) => {
                score::apply(result);
                return;
            }
        };

        let rules = self.robots_stage(url, result, diagnostics).await;

        if let (Some(candidates), Some(rules)) = (candidates, rules) {
            let sample = select_sample(&candidates, self.config.validator.sample_urls_count, rng);
            let prober = SampleProber::new(&self.fetcher, &self.config.validator);
            let statuses = prober.probe_all(sample, &rules).await;

            for status in &statuses {
                if status.http_status != Some(200) {
                    let reason = match (status.http_status, &status.probe_error) {
                        (Some(code), _) => format!("HTTP {}", code),
                        (None, Some(error)) => error.clone(),
                        (None, None) => "not probed".to_string(),
                    };
                    diagnostics.push(format!("Sampled URL not reachable ({}): {}", reason, status.url));
                }
                if status.blocked_by_robots {
                    diagnostics.push(format!("Sampled URL blocked by robots.txt: {}", status.url));
                }
                if status.has_noindex() {
                    diagnostics.push(format!("Sampled URL has a noindex directive: {}", status.url));
                }
            }
            result.url_sample_status = statuses;
        }

        score::apply(result);
    }

    /// Load robots.txt and record reachability and reference
    ///
    /// `None` when robots.txt is unreachable; no URLs are sampled then.
    async fn robots_stage(
        &self,
        url: &Url,
        result: &mut ValidationResult,
        diagnostics: &mut Diagnostics,
    ) -> Option<RobotsRules> {
        let analyzer = RobotsAnalyzer::new(&self.fetcher);
        let Some(rules) = analyzer.load(url).await else {
            diagnostics.push("robots.txt could not be retrieved");
            return None;
        };

        result.robots_txt_accessible = true;
        result.robots_txt_reference = analyzer.is_referenced(&rules, &result.url).await;
        if !result.robots_txt_reference {
            diagnostics.push("Sitemap is not referenced in robots.txt");
        }
        Some(rules)
    }
}

fn too_large(limit: u64) -> String {
    format!(
        "Sitemap exceeds the maximum allowed size of {:.1} MB",
        limit as f64 / (1024.0 * 1024.0)
    )
}
