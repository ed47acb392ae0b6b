//! XML Sitemap protocol checks
//!
//! This module provides:
//! - A namespace-aware XML tree (`document`)
//! - Root element, namespace, MIME type and encoding checks
//! - Per-entry checks for `<urlset>` and `<sitemapindex>` documents (`entries`)

mod document;
mod entries;

pub use document::*;
pub use entries::*;

use crate::models::{Diagnostics, ExtensionStats};

/// Namespace every sitemap root must declare as its default
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Namespace of `<xhtml:link>` hreflang alternates
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Protocol limit on entries per file
pub const MAX_ENTRIES: usize = 50_000;

/// Protocol limit on the uncompressed file size (50 MB)
pub const SOFT_MAX_FILESIZE: u64 = 50 * 1024 * 1024;

/// Content types accepted for plain XML sitemaps
pub const XML_MIME_TYPES: &[&str] = &[
    "text/xml",
    "application/xml",
    "application/xhtml+xml",
    "text/html",
];

/// Content types accepted for `.gz` sitemaps
pub const GZIP_MIME_TYPES: &[&str] = &[
    "application/gzip",
    "application/x-gzip",
    "application/octet-stream",
];

/// Google sitemap extensions counted per `<url>` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Image,
    Video,
    News,
    Mobile,
}

impl Extension {
    pub const ALL: [Extension; 4] = [
        Extension::Image,
        Extension::Video,
        Extension::News,
        Extension::Mobile,
    ];

    pub fn namespace(self) -> &'static str {
        match self {
            Extension::Image => "http://www.google.com/schemas/sitemap-image/1.1",
            Extension::Video => "http://www.google.com/schemas/sitemap-video/1.1",
            Extension::News => "http://www.google.com/schemas/sitemap-news/0.9",
            Extension::Mobile => "http://www.google.com/schemas/sitemap-mobile/1.0",
        }
    }

    /// Conventional prefix, also accepted as proof of declaration
    pub fn prefix(self) -> &'static str {
        match self {
            Extension::Image => "image",
            Extension::Video => "video",
            Extension::News => "news",
            Extension::Mobile => "mobile",
        }
    }

    /// Element counted inside each `<url>`
    pub fn element(self) -> &'static str {
        self.prefix()
    }

    pub(crate) fn flag_mut(self, stats: &mut ExtensionStats) -> &mut bool {
        match self {
            Extension::Image => &mut stats.has_image_extension,
            Extension::Video => &mut stats.has_video_extension,
            Extension::News => &mut stats.has_news_extension,
            Extension::Mobile => &mut stats.has_mobile_extension,
        }
    }

    pub(crate) fn count_mut(self, stats: &mut ExtensionStats) -> &mut usize {
        match self {
            Extension::Image => &mut stats.image_extension_count,
            Extension::Video => &mut stats.video_extension_count,
            Extension::News => &mut stats.news_extension_count,
            Extension::Mobile => &mut stats.mobile_extension_count,
        }
    }
}

/// What the document element turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootKind {
    UrlSet,
    SitemapIndex,
    Unknown(String),
}

/// Classify the root and check its namespace
///
/// Returns the kind and whether root and namespace are both valid. A wrong
/// namespace is recorded but entries are still extracted by the caller.
pub fn check_root(doc: &XmlDocument, diagnostics: &mut Diagnostics) -> (RootKind, bool) {
    let root = &doc.root;
    let kind = match root.local_name.as_str() {
        "urlset" => RootKind::UrlSet,
        "sitemapindex" => RootKind::SitemapIndex,
        other => RootKind::Unknown(other.to_string()),
    };

    match &kind {
        RootKind::Unknown(name) => {
            diagnostics.push(format!(
                "Unknown root element <{}>: expected <urlset> or <sitemapindex>",
                name
            ));
            (kind, false)
        }
        _ => {
            let valid = root.prefix.is_none() && root.namespace.as_deref() == Some(SITEMAP_NAMESPACE);
            if !valid {
                diagnostics.push(format!(
                    "Invalid root element or namespace: <{}> must use the default namespace {}",
                    root.local_name, SITEMAP_NAMESPACE
                ));
            }
            (kind, valid)
        }
    }
}

/// Check the declared content type against the set expected for the file name
pub fn check_mime_type(
    content_type: Option<&str>,
    gz_named: bool,
    diagnostics: &mut Diagnostics,
) -> bool {
    let expected = if gz_named { GZIP_MIME_TYPES } else { XML_MIME_TYPES };
    let declared = content_type.unwrap_or_default().to_ascii_lowercase();
    let valid = expected.iter().any(|mime| declared.contains(mime));

    if !valid {
        diagnostics.push(format!(
            "Invalid MIME type: {} - expected one of: {}",
            content_type.unwrap_or("none"),
            expected.join(", ")
        ));
    }
    valid
}

/// UTF-8 if either the header charset or the XML declaration says so
pub fn check_utf8(
    content_type: Option<&str>,
    declared_encoding: Option<&str>,
    diagnostics: &mut Diagnostics,
) -> bool {
    let header_utf8 = content_type
        .and_then(charset_param)
        .is_some_and(|charset| is_utf8_label(&charset));
    let declaration_utf8 = declared_encoding.is_some_and(is_utf8_label);

    let utf8 = header_utf8 || declaration_utf8;
    if !utf8 {
        diagnostics.push("Sitemap is not declared as UTF-8 encoded");
    }
    utf8
}

fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

fn is_utf8_label(label: &str) -> bool {
    label.trim().eq_ignore_ascii_case("utf-8")
}

/// Whether the URL path names a `.gz` file
pub fn is_gz_named(url: &url::Url) -> bool {
    std::path::Path::new(url.path())
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}
