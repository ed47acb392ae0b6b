//! `noindex` detection in response headers and HTML

use reqwest::header::HeaderMap;
use scraper::{Html, Selector};

/// Meta names that carry indexing directives for Google
const ROBOTS_META_NAMES: &[&str] = &["robots", "googlebot"];

fn contains_noindex(value: &str) -> bool {
    value.to_ascii_lowercase().contains("noindex")
}

/// Whether any `X-Robots-Tag` header contains `noindex`
pub fn header_has_noindex(headers: &HeaderMap) -> bool {
    headers
        .get_all("x-robots-tag")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(contains_noindex)
}

/// Whether a robots or googlebot `<meta>` tag contains `noindex`
///
/// Attribute order and quoting do not matter.
pub fn html_has_noindex(html: &str) -> bool {
    let Ok(selector) = Selector::parse("meta[name][content]") else {
        return false;
    };

    let document = Html::parse_document(html);
    document.select(&selector).any(|meta| {
        let element = meta.value();
        let name = element.attr("name").unwrap_or_default().trim();
        let content = element.attr("content").unwrap_or_default();
        ROBOTS_META_NAMES
            .iter()
            .any(|robots| name.eq_ignore_ascii_case(robots))
            && contains_noindex(content)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_meta_noindex_either_order() {
        assert!(html_has_noindex(
            r#"<html><head><meta name="robots" content="noindex, follow"></head></html>"#
        ));
        assert!(html_has_noindex(
            r#"<html><head><meta content='NOINDEX' name='GoogleBot'></head></html>"#
        ));
    }

    #[test]
    fn test_meta_without_noindex() {
        assert!(!html_has_noindex(
            r#"<html><head><meta name="robots" content="index, follow"></head></html>"#
        ));
        assert!(!html_has_noindex(
            r#"<html><head><meta name="description" content="noindex is mentioned here"></head></html>"#
        ));
        assert!(!html_has_noindex("<p>plain page</p>"));
    }

    #[test]
    fn test_header_noindex() {
        let mut headers = HeaderMap::new();
        assert!(!header_has_noindex(&headers));

        headers.append("x-robots-tag", HeaderValue::from_static("nofollow"));
        assert!(!header_has_noindex(&headers));

        headers.append("X-Robots-Tag", HeaderValue::from_static("googlebot: NoIndex"));
        assert!(header_has_noindex(&headers));
    }
}
