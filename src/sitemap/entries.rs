//! Per-entry checks for `<url>` and `<sitemap>` elements

use super::document::{XmlDocument, XmlElement};
use super::{Extension, MAX_ENTRIES, XHTML_NAMESPACE};
use crate::models::{Diagnostics, ExtensionStats};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Allowed `<changefreq>` values
pub const CHANGEFREQ_VALUES: &[&str] = &[
    "always", "hourly", "daily", "weekly", "monthly", "yearly", "never",
];

static LASTMOD_PATTERN: OnceLock<Regex> = OnceLock::new();

/// `YYYY-MM-DD` or `YYYY-MM-DDThh:mm:ss` with a `Z` or `±hh:mm` offset
pub fn is_valid_lastmod(value: &str) -> bool {
    LASTMOD_PATTERN
        .get_or_init(|| {
            Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}(T[0-9]{2}:[0-9]{2}:[0-9]{2}(Z|[+-][0-9]{2}:[0-9]{2}))?$")
                .expect("lastmod pattern compiles")
        })
        .is_match(value)
}

pub fn is_valid_changefreq(value: &str) -> bool {
    let value = value.to_ascii_lowercase();
    CHANGEFREQ_VALUES.contains(&value.as_str())
}

/// A number in `[0.0, 1.0]`; anything unparsable is invalid
pub fn is_valid_priority(value: &str) -> bool {
    value
        .parse::<f64>()
        .is_ok_and(|p| (0.0..=1.0).contains(&p))
}

/// Absolute URL with a scheme and a host
pub fn is_valid_loc(value: &str) -> bool {
    Url::parse(value).is_ok_and(|url| url.has_host())
}

/// Findings for a `<urlset>`
#[derive(Debug, Clone, Default)]
pub struct UrlSetAnalysis {
    pub url_count: usize,
    /// Distinct locations in first-seen order
    pub unique_urls: Vec<String>,
    pub has_lastmod: bool,
    pub has_invalid_lastmod: bool,
    pub has_changefreq: bool,
    pub has_invalid_changefreq: bool,
    pub has_priority: bool,
    pub has_invalid_priority: bool,
    pub extensions: ExtensionStats,
}

/// Findings for a `<sitemapindex>`
#[derive(Debug, Clone, Default)]
pub struct IndexAnalysis {
    pub entry_count: usize,
    pub unique_urls: Vec<String>,
    pub has_lastmod: bool,
}

/// Collects locations while keeping first-seen order
#[derive(Default)]
struct LocationSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl LocationSet {
    fn insert(&mut self, loc: &str) {
        if self.seen.insert(loc.to_string()) {
            self.ordered.push(loc.to_string());
        }
    }
}

/// Check every `<url>` child of the document root
pub fn analyze_urlset(doc: &XmlDocument, diagnostics: &mut Diagnostics) -> UrlSetAnalysis {
    let root = &doc.root;
    let ns = root.namespace.as_deref();
    let mut analysis = UrlSetAnalysis::default();
    let mut locations = LocationSet::default();

    let declared: Vec<(Extension, bool)> = Extension::ALL
        .iter()
        .map(|ext| (*ext, doc.declares_namespace(ext.namespace(), ext.prefix())))
        .collect();

    for entry in root.children_named(ns, "url") {
        let Some(loc) = entry.child(ns, "loc") else {
            diagnostics.push("Found a <url> element without <loc>");
            continue;
        };
        let loc = loc.text.as_str();
        analysis.url_count += 1;
        locations.insert(loc);

        if !is_valid_loc(loc) {
            diagnostics.push(format!("Invalid URL: {}", loc));
        }

        check_attributes(entry, ns, &mut analysis, diagnostics);

        for (ext, is_declared) in &declared {
            if *is_declared {
                let count = entry.children_named(Some(ext.namespace()), ext.element()).count();
                *ext.count_mut(&mut analysis.extensions) += count;
            }
        }
        analysis.extensions.alternate_links_count += count_alternate_links(entry);
    }

    for (ext, is_declared) in declared {
        *ext.flag_mut(&mut analysis.extensions) = is_declared;
    }
    analysis.extensions.has_alternate_links = analysis.extensions.alternate_links_count > 0;

    if analysis.url_count > MAX_ENTRIES {
        diagnostics.push(format!(
            "Sitemap contains more than {} URLs ({})",
            MAX_ENTRIES, analysis.url_count
        ));
    }
    if locations.ordered.len() < analysis.url_count {
        diagnostics.push("Sitemap contains duplicate URLs");
    }

    analysis.unique_urls = locations.ordered;
    analysis
}

fn check_attributes(
    entry: &XmlElement,
    ns: Option<&str>,
    analysis: &mut UrlSetAnalysis,
    diagnostics: &mut Diagnostics,
) {
    if let Some(lastmod) = entry.child(ns, "lastmod") {
        analysis.has_lastmod = true;
        if !is_valid_lastmod(&lastmod.text) {
            analysis.has_invalid_lastmod = true;
            diagnostics.push(format!(
                "Invalid lastmod format: {} - expected ISO 8601 (YYYY-MM-DD or YYYY-MM-DDThh:mm:ss+hh:mm)",
                lastmod.text
            ));
        }
    }

    if let Some(changefreq) = entry.child(ns, "changefreq") {
        analysis.has_changefreq = true;
        if !is_valid_changefreq(&changefreq.text) {
            analysis.has_invalid_changefreq = true;
            diagnostics.push(format!(
                "Invalid changefreq value: {} - allowed: {}",
                changefreq.text,
                CHANGEFREQ_VALUES.join(", ")
            ));
        }
    }

    if let Some(priority) = entry.child(ns, "priority") {
        analysis.has_priority = true;
        if !is_valid_priority(&priority.text) {
            analysis.has_invalid_priority = true;
            diagnostics.push(format!(
                "Invalid priority value: {} - must be between 0.0 and 1.0",
                priority.text
            ));
        }
    }
}

/// `<xhtml:link>` children carrying both `rel="alternate"` and `hreflang`
fn count_alternate_links(entry: &XmlElement) -> usize {
    entry
        .children_named(Some(XHTML_NAMESPACE), "link")
        .filter(|link| link.attr("rel") == Some("alternate") && link.attr("hreflang").is_some())
        .count()
}

/// Check every `<sitemap>` child of a sitemap index
pub fn analyze_index(doc: &XmlDocument, diagnostics: &mut Diagnostics) -> IndexAnalysis {
    let root = &doc.root;
    let ns = root.namespace.as_deref();
    let mut analysis = IndexAnalysis::default();
    let mut locations = LocationSet::default();

    for entry in root.children_named(ns, "sitemap") {
        let Some(loc) = entry.child(ns, "loc") else {
            diagnostics.push("Found a <sitemap> element without <loc>");
            continue;
        };
        let loc = loc.text.as_str();
        analysis.entry_count += 1;
        locations.insert(loc);

        if !is_valid_loc(loc) {
            diagnostics.push(format!("Invalid sitemap URL in index: {}", loc));
        }
        if entry.child(ns, "lastmod").is_some() {
            analysis.has_lastmod = true;
        }
    }

    if analysis.entry_count > MAX_ENTRIES {
        diagnostics.push(format!(
            "Sitemap index contains more than {} sitemaps ({})",
            MAX_ENTRIES, analysis.entry_count
        ));
    }
    if locations.ordered.len() < analysis.entry_count {
        diagnostics.push("Sitemap index contains duplicate sitemap URLs");
    }

    analysis.unique_urls = locations.ordered;
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sitemap::parse_document;

    fn urlset(body: &str) -> XmlDocument {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
        xmlns:image="http://www.google.com/schemas/sitemap-image/1.1"
        xmlns:xhtml="http://www.w3.org/1999/xhtml">{}</urlset>"#,
            body
        );
        parse_document(xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_lastmod_formats() {
        assert!(is_valid_lastmod("2025-04-01"));
        assert!(is_valid_lastmod("2025-04-01T12:30:00+00:00"));
        assert!(is_valid_lastmod("2025-04-01T12:30:00Z"));
        assert!(!is_valid_lastmod("04/01/2025"));
        assert!(!is_valid_lastmod("2025-04-01T12:30:00"));
        assert!(!is_valid_lastmod("2025-4-1"));
        assert!(!is_valid_lastmod(""));
        assert!(!is_valid_lastmod("\u{662}\u{660}\u{662}\u{664}-01-01"));
        assert!(!is_valid_lastmod("2025-04-01T12:30:00+\u{966}\u{966}:00"));
    }

    #[test]
    fn test_changefreq_values() {
        assert!(is_valid_changefreq("daily"));
        assert!(is_valid_changefreq("Daily"));
        assert!(is_valid_changefreq("NEVER"));
        assert!(!is_valid_changefreq("sometimes"));
    }

    #[test]
    fn test_priority_range() {
        assert!(is_valid_priority("0.0"));
        assert!(is_valid_priority("1.0"));
        assert!(is_valid_priority("0.5"));
        assert!(!is_valid_priority("1.01"));
        assert!(!is_valid_priority("-0.01"));
        assert!(!is_valid_priority("high"));
    }

    #[test]
    fn test_valid_urlset() {
        let doc = urlset(
            r#"<url><loc>https://example.com/</loc><lastmod>2025-04-01</lastmod>
               <changefreq>weekly</changefreq><priority>1.0</priority></url>"#,
        );
        let mut diagnostics = Diagnostics::new();
        let analysis = analyze_urlset(&doc, &mut diagnostics);

        assert_eq!(analysis.url_count, 1);
        assert_eq!(analysis.unique_urls, vec!["https://example.com/"]);
        assert!(analysis.has_lastmod && analysis.has_changefreq && analysis.has_priority);
        assert!(!analysis.has_invalid_lastmod);
        assert!(!analysis.has_invalid_changefreq);
        assert!(!analysis.has_invalid_priority);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_invalid_values_are_recorded() {
        let doc = urlset(
            r#"<url><loc>https://example.com/a</loc><lastmod>04/01/2025</lastmod>
               <changefreq>sometimes</changefreq><priority>1.5</priority></url>"#,
        );
        let mut diagnostics = Diagnostics::new();
        let analysis = analyze_urlset(&doc, &mut diagnostics);

        assert!(analysis.has_invalid_lastmod);
        assert!(analysis.has_invalid_changefreq);
        assert!(analysis.has_invalid_priority);
        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics.iter().any(|d| d.contains("04/01/2025")));
    }

    #[test]
    fn test_duplicates_and_missing_loc() {
        let doc = urlset(
            r#"<url><loc>https://example.com/a</loc></url>
               <url><loc>https://example.com/b</loc></url>
               <url><loc>https://example.com/a</loc></url>
               <url><lastmod>2025-04-01</lastmod></url>"#,
        );
        let mut diagnostics = Diagnostics::new();
        let analysis = analyze_urlset(&doc, &mut diagnostics);

        assert_eq!(analysis.url_count, 3);
        assert_eq!(
            analysis.unique_urls,
            vec!["https://example.com/a", "https://example.com/b"]
        );
        assert!(diagnostics.iter().any(|d| d.contains("without <loc>")));
        assert!(diagnostics.iter().any(|d| d.contains("duplicate")));
    }

    #[test]
    fn test_invalid_loc_is_diagnosed() {
        let doc = urlset("<url><loc>not a url</loc></url>");
        let mut diagnostics = Diagnostics::new();
        let analysis = analyze_urlset(&doc, &mut diagnostics);

        assert_eq!(analysis.url_count, 1);
        assert!(diagnostics.iter().any(|d| d == "Invalid URL: not a url"));
    }

    #[test]
    fn test_extension_counts() {
        let doc = urlset(
            r#"<url><loc>https://example.com/</loc>
                 <image:image><image:loc>https://example.com/1.png</image:loc></image:image>
                 <image:image><image:loc>https://example.com/2.png</image:loc></image:image>
                 <xhtml:link rel="alternate" hreflang="de" href="https://example.com/de/"/>
                 <xhtml:link rel="alternate" href="https://example.com/x/"/>
               </url>"#,
        );
        let mut diagnostics = Diagnostics::new();
        let ext = analyze_urlset(&doc, &mut diagnostics).extensions;

        assert!(ext.has_image_extension);
        assert_eq!(ext.image_extension_count, 2);
        assert!(!ext.has_video_extension);
        assert!(ext.has_alternate_links);
        assert_eq!(ext.alternate_links_count, 1);
    }

    #[test]
    fn test_declared_xhtml_without_links_is_not_alternates() {
        let doc = urlset("<url><loc>https://example.com/</loc></url>");
        let mut diagnostics = Diagnostics::new();
        let ext = analyze_urlset(&doc, &mut diagnostics).extensions;

        assert!(ext.has_image_extension);
        assert!(!ext.has_alternate_links);
    }

    #[test]
    fn test_index_entries() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/a.xml</loc><lastmod>2025-04-01</lastmod></sitemap>
  <sitemap><loc>https://example.com/b.xml</loc></sitemap>
</sitemapindex>"#;
        let doc = parse_document(xml.as_bytes()).unwrap();
        let mut diagnostics = Diagnostics::new();
        let analysis = analyze_index(&doc, &mut diagnostics);

        assert_eq!(analysis.entry_count, 2);
        assert_eq!(analysis.unique_urls.len(), 2);
        assert!(analysis.has_lastmod);
        assert!(diagnostics.is_empty());
    }
}
