//! robots.txt retrieval and sitemap reference checks

mod rules;

pub use rules::*;

use crate::fetch::Fetcher;
use crate::sitemap::parse_document;
use tracing::{debug, info, warn};
use url::Url;

/// Maximum number of declared sitemaps fetched as possible indexes
pub const MAX_INDEX_LOOKUPS: usize = 10;

/// `{scheme}://{host}[:port]/robots.txt` for any URL on the site
pub fn robots_url(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let mut robots = format!("{}://{}", url.scheme(), host);
    if let Some(port) = url.port() {
        robots.push_str(&format!(":{}", port));
    }
    robots.push_str("/robots.txt");
    Some(robots)
}

/// Fetches robots.txt and answers questions about it
pub struct RobotsAnalyzer<'a> {
    fetcher: &'a Fetcher,
}

impl<'a> RobotsAnalyzer<'a> {
    pub fn new(fetcher: &'a Fetcher) -> Self {
        Self { fetcher }
    }

    /// Load the site's robots.txt; `None` unless it answers 200
    pub async fn load(&self, sitemap_url: &Url) -> Option<RobotsRules> {
        let robots_url = robots_url(sitemap_url)?;
        match self.fetcher.fetch(&robots_url).await {
            Ok(resource) if resource.status == 200 && !resource.oversized => {
                let rules = RobotsRules::parse(&resource.text());
                info!(
                    "Loaded {} ({} sitemaps, {} disallow rules)",
                    robots_url,
                    rules.sitemaps().len(),
                    rules.disallows().len()
                );
                Some(rules)
            }
            Ok(resource) => {
                debug!("{} answered HTTP {}", robots_url, resource.status);
                None
            }
            Err(e) => {
                warn!("Failed to fetch {}: {}", robots_url, e);
                None
            }
        }
    }

    /// Whether robots.txt points at the sitemap, directly or through an index
    ///
    /// Declared sitemaps on the same origin are fetched and, if they turn out
    /// to be sitemap indexes, searched for the URL. Failures there only log.
    pub async fn is_referenced(&self, rules: &RobotsRules, sitemap_url: &str) -> bool {
        if rules.references(sitemap_url) {
            return true;
        }

        let Ok(sitemap) = Url::parse(sitemap_url) else {
            return false;
        };

        let candidates = rules
            .sitemaps()
            .iter()
            .filter(|declared| {
                Url::parse(declared).is_ok_and(|d| d.origin() == sitemap.origin())
            })
            .take(MAX_INDEX_LOOKUPS);

        for declared in candidates {
            if self.index_lists(declared, sitemap_url).await {
                info!("{} is listed in sitemap index {}", sitemap_url, declared);
                return true;
            }
        }

        false
    }

    async fn index_lists(&self, index_url: &str, sitemap_url: &str) -> bool {
        let resource = match self.fetcher.fetch(index_url).await {
            Ok(resource) if resource.status == 200 => resource,
            Ok(resource) => {
                debug!("Sitemap index {} answered HTTP {}", index_url, resource.status);
                return false;
            }
            Err(e) => {
                debug!("Failed to fetch sitemap index {}: {}", index_url, e);
                return false;
            }
        };

        let doc = match parse_document(&resource.body) {
            Ok(doc) => doc,
            Err(e) => {
                debug!("Sitemap index {} is not valid XML: {}", index_url, e);
                return false;
            }
        };

        if doc.root.local_name != "sitemapindex" {
            return false;
        }

        let ns = doc.root.namespace.as_deref();
        let listed = doc
            .root
            .children_named(ns, "sitemap")
            .filter_map(|entry| entry.child(ns, "loc"))
            .any(|loc| loc.text == sitemap_url);
        listed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_robots_url() {
        let url = Url::parse("https://example.com/sitemaps/a.xml?x=1").unwrap();
        assert_eq!(
            robots_url(&url).as_deref(),
            Some("https://example.com/robots.txt")
        );

        let url = Url::parse("http://127.0.0.1:8080/sitemap.xml").unwrap();
        assert_eq!(
            robots_url(&url).as_deref(),
            Some("http://127.0.0.1:8080/robots.txt")
        );
    }

    #[tokio::test]
    async fn test_load_missing_robots() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&Config::default()).unwrap();
        let analyzer = RobotsAnalyzer::new(&fetcher);
        let sitemap = Url::parse(&format!("{}/sitemap.xml", server.uri())).unwrap();

        assert!(analyzer.load(&sitemap).await.is_none());
    }

    #[tokio::test]
    async fn test_referenced_through_index() {
        let server = MockServer::start().await;
        let sitemap_url = format!("{}/sitemap-posts.xml", server.uri());
        let index = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>{}</loc></sitemap>
</sitemapindex>"#,
            sitemap_url
        );

        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "User-agent: *\nDisallow:\nSitemap: {}/sitemap_index.xml\nSitemap: https://elsewhere.example/s.xml\n",
                server.uri()
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sitemap_index.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(index, "application/xml"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&Config::default()).unwrap();
        let analyzer = RobotsAnalyzer::new(&fetcher);
        let rules = analyzer
            .load(&Url::parse(&sitemap_url).unwrap())
            .await
            .unwrap();

        assert!(!rules.references(&sitemap_url));
        assert!(analyzer.is_referenced(&rules, &sitemap_url).await);
        assert!(
            !analyzer
                .is_referenced(&rules, &format!("{}/unlisted.xml", server.uri()))
                .await
        );
    }

    #[tokio::test]
    async fn test_broken_index_lookup_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<sitemapindex><broken"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&Config::default()).unwrap();
        let analyzer = RobotsAnalyzer::new(&fetcher);
        let rules = RobotsRules::parse(&format!("Sitemap: {}/index.xml", server.uri()));

        let referenced = analyzer
            .is_referenced(&rules, &format!("{}/sitemap.xml", server.uri()))
            .await;
        assert!(!referenced);
    }
}
