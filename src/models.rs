//! Validation records shared by every pipeline stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of validating one sitemap URL.
///
/// Created fresh for every run, filled in stage by stage and handed back as a
/// finished value. Fields that a stage never reached keep their defaults;
/// facts that only exist for `<urlset>` documents are `Option`s and stay
/// `None` for sitemap indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub url: String,
    pub date_checked: DateTime<Utc>,

    /// `None` when the server could not be reached at all
    pub http_status: Option<u16>,
    pub content_type: Option<String>,
    pub valid_mime_type: bool,
    /// Decoded body size in bytes
    pub filesize: u64,
    /// Fetch time in seconds
    pub load_time: f64,
    pub http_compressed: bool,
    pub content_encoding_header: Option<String>,
    /// The URL names a `.gz` file
    pub is_compressed: bool,

    pub valid_xml: bool,
    pub encoding_utf8: bool,
    pub valid_root_element: bool,
    pub is_sitemap_index: bool,

    pub url_count: usize,
    pub unique_url_count: usize,
    pub has_lastmod: bool,
    pub has_invalid_lastmod: Option<bool>,
    pub has_changefreq: Option<bool>,
    pub has_invalid_changefreq: Option<bool>,
    pub has_priority: Option<bool>,
    pub has_invalid_priority: Option<bool>,
    #[serde(flatten)]
    pub extensions: Option<ExtensionStats>,

    pub robots_txt_accessible: bool,
    pub robots_txt_reference: bool,

    pub url_sample_status: Vec<UrlSampleStatus>,

    /// `None` when the run halted before the document could be parsed
    pub sitemap_score: Option<f64>,
    pub sitemap_grade: Option<Grade>,

    /// Everything that deviated from the protocol, in the order it was found
    pub errors: Vec<String>,
}

impl ValidationResult {
    /// Fresh result with every fact at its "unknown" default
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            date_checked: Utc::now(),
            http_status: None,
            content_type: None,
            valid_mime_type: false,
            filesize: 0,
            load_time: 0.0,
            http_compressed: false,
            content_encoding_header: None,
            is_compressed: false,
            valid_xml: false,
            encoding_utf8: false,
            valid_root_element: false,
            is_sitemap_index: false,
            url_count: 0,
            unique_url_count: 0,
            has_lastmod: false,
            has_invalid_lastmod: None,
            has_changefreq: None,
            has_invalid_changefreq: None,
            has_priority: None,
            has_invalid_priority: None,
            extensions: None,
            robots_txt_accessible: false,
            robots_txt_reference: false,
            url_sample_status: Vec::new(),
            sitemap_score: None,
            sitemap_grade: None,
            errors: Vec::new(),
        }
    }

    /// Whether the primary fetch returned 200 OK
    pub fn fetched_ok(&self) -> bool {
        self.http_status == Some(200)
    }

    /// Whether the primary fetch returned any 2xx status
    pub fn fetch_succeeded(&self) -> bool {
        self.http_status.is_some_and(|status| (200..300).contains(&status))
    }

    pub fn duplicate_count(&self) -> usize {
        self.url_count.saturating_sub(self.unique_url_count)
    }

    /// Whether any image/video/news/mobile/hreflang extension was found
    pub fn has_any_extension(&self) -> bool {
        self.extensions
            .as_ref()
            .is_some_and(ExtensionStats::any_present)
    }
}

/// Sitemap extension presence and per-entry counts (urlset only)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionStats {
    pub has_image_extension: bool,
    pub has_video_extension: bool,
    pub has_news_extension: bool,
    pub has_mobile_extension: bool,
    pub has_alternate_links: bool,
    pub image_extension_count: usize,
    pub video_extension_count: usize,
    pub news_extension_count: usize,
    pub mobile_extension_count: usize,
    pub alternate_links_count: usize,
}

impl ExtensionStats {
    pub fn any_present(&self) -> bool {
        self.has_image_extension
            || self.has_video_extension
            || self.has_news_extension
            || self.has_mobile_extension
            || self.has_alternate_links
    }
}

/// Live status of one sampled sitemap URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlSampleStatus {
    pub url: String,
    /// `None` until probed, and when the probe itself failed
    pub http_status: Option<u16>,
    /// Transport failure or timeout, distinct from a non-200 response
    pub probe_error: Option<String>,
    pub blocked_by_robots: bool,
    pub has_noindex_meta: bool,
    pub has_noindex_header: bool,
}

impl UrlSampleStatus {
    /// Unprobed status for `url`
    pub fn pending(url: impl Into<String>, blocked_by_robots: bool) -> Self {
        Self {
            url: url.into(),
            http_status: None,
            probe_error: None,
            blocked_by_robots,
            has_noindex_meta: false,
            has_noindex_header: false,
        }
    }

    pub fn has_noindex(&self) -> bool {
        self.has_noindex_meta || self.has_noindex_header
    }

    /// Reachable with 200, not blocked and not marked noindex
    pub fn is_indexable(&self) -> bool {
        self.http_status == Some(200) && !self.blocked_by_robots && !self.has_noindex()
    }
}

/// Letter grade attached to a score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub grade: String,
    pub color: GradeColor,
    pub text: String,
}

/// Severity tag for a grade, mirrors the bootstrap-style colors of the web UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeColor {
    Success,
    Primary,
    Warning,
    Danger,
}

/// Per-run, append-only diagnostics log passed through the pipeline stages
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    messages: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_indexable() {
        let mut status = UrlSampleStatus::pending("https://example.com/", false);
        assert!(!status.is_indexable());

        status.http_status = Some(200);
        assert!(status.is_indexable());

        status.has_noindex_header = true;
        assert!(status.has_noindex());
        assert!(!status.is_indexable());
    }

    #[test]
    fn test_result_serializes_flat_extensions() {
        let mut result = ValidationResult::new("https://example.com/sitemap.xml");
        result.extensions = Some(ExtensionStats {
            has_image_extension: true,
            image_extension_count: 3,
            ..Default::default()
        });

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["has_image_extension"], true);
        assert_eq!(json["image_extension_count"], 3);
        assert!(json["sitemap_grade"].is_null());
        assert!(result.has_any_extension());
    }

    #[test]
    fn test_grade_color_serializes_lowercase() {
        let grade = Grade {
            grade: "A+".to_string(),
            color: GradeColor::Success,
            text: "Excellent".to_string(),
        };
        let json = serde_json::to_string(&grade).unwrap();
        assert!(json.contains(r#""color":"success""#));
    }

    #[test]
    fn test_diagnostics_append_only() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push("first");
        diagnostics.push(String::from("second"));
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.into_vec(), vec!["first", "second"]);
    }
}
