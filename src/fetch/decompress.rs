//! Body decoding for transport `Content-Encoding` and `.gz` sitemap files

use crate::error::{Error, Result};
use flate2::read::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};
use std::io::Read;

/// Transport coding announced by a `Content-Encoding` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentCoding {
    Identity,
    Gzip,
    Deflate,
    /// Anything we did not ask for and cannot decode
    Unsupported(String),
}

impl ContentCoding {
    /// Interpret a `Content-Encoding` header value
    pub fn from_header(value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return ContentCoding::Identity;
        };

        match value.to_ascii_lowercase().as_str() {
            "identity" => ContentCoding::Identity,
            "gzip" | "x-gzip" => ContentCoding::Gzip,
            "deflate" => ContentCoding::Deflate,
            other => ContentCoding::Unsupported(other.to_string()),
        }
    }

    pub fn is_compressed(&self) -> bool {
        !matches!(self, ContentCoding::Identity)
    }
}

/// Undo the transport coding of a response body
///
/// Unsupported codings are passed through untouched, the caller decides how
/// to report them.
pub fn decode_content(coding: &ContentCoding, body: Vec<u8>, limit: u64) -> Result<Vec<u8>> {
    match coding {
        ContentCoding::Identity | ContentCoding::Unsupported(_) => Ok(body),
        ContentCoding::Gzip => gunzip(&body, limit),
        ContentCoding::Deflate => inflate(&body, limit),
    }
}

/// Whether a `.gz`-named body still has to be inflated
pub fn needs_gunzip(gz_named: bool, body: &[u8]) -> bool {
    gz_named && !starts_with_xml_declaration(body)
}

/// Whether the body opens with `<?xml`, ignoring a BOM and leading whitespace
pub fn starts_with_xml_declaration(body: &[u8]) -> bool {
    let body = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    body[start..].starts_with(b"<?xml")
}

/// Inflate a gzip stream, refusing output larger than `limit` bytes
pub fn gunzip(body: &[u8], limit: u64) -> Result<Vec<u8>> {
    read_limited(MultiGzDecoder::new(body), limit)
}

/// HTTP `deflate` is zlib-wrapped in theory and raw deflate in practice
fn inflate(body: &[u8], limit: u64) -> Result<Vec<u8>> {
    match read_limited(ZlibDecoder::new(body), limit) {
        Ok(decoded) => Ok(decoded),
        Err(Error::TooLarge(limit)) => Err(Error::TooLarge(limit)),
        Err(_) => read_limited(DeflateDecoder::new(body), limit),
    }
}

fn read_limited<R: Read>(reader: R, limit: u64) -> Result<Vec<u8>> {
    let mut decoded = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut decoded)
        .map_err(|e| Error::Decompress(e.to_string()))?;

    if decoded.len() as u64 > limit {
        return Err(Error::TooLarge(limit));
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use std::io::Write;

    const XML: &[u8] = b"<?xml version=\"1.0\"?><urlset/>";

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_coding_from_header() {
        assert_eq!(ContentCoding::from_header(None), ContentCoding::Identity);
        assert_eq!(ContentCoding::from_header(Some("GZIP")), ContentCoding::Gzip);
        assert_eq!(ContentCoding::from_header(Some("x-gzip")), ContentCoding::Gzip);
        assert_eq!(
            ContentCoding::from_header(Some(" deflate ")),
            ContentCoding::Deflate
        );
        assert_eq!(
            ContentCoding::from_header(Some("br")),
            ContentCoding::Unsupported("br".to_string())
        );
        assert!(!ContentCoding::from_header(Some("identity")).is_compressed());
    }

    #[test]
    fn test_gunzip_roundtrip() {
        assert_eq!(gunzip(&gzip(XML), 1024).unwrap(), XML);
    }

    #[test]
    fn test_gunzip_garbage_fails() {
        let result = gunzip(b"definitely not gzip", 1024);
        assert!(matches!(result, Err(Error::Decompress(_))));
    }

    #[test]
    fn test_gunzip_respects_limit() {
        let big = vec![b'a'; 10_000];
        let result = gunzip(&gzip(&big), 100);
        assert!(matches!(result, Err(Error::TooLarge(100))));
    }

    #[test]
    fn test_inflate_accepts_zlib_and_raw() {
        let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
        zlib.write_all(XML).unwrap();
        let zlib = zlib.finish().unwrap();

        let mut raw = DeflateEncoder::new(Vec::new(), Compression::default());
        raw.write_all(XML).unwrap();
        let raw = raw.finish().unwrap();

        assert_eq!(
            decode_content(&ContentCoding::Deflate, zlib, 1024).unwrap(),
            XML
        );
        assert_eq!(
            decode_content(&ContentCoding::Deflate, raw, 1024).unwrap(),
            XML
        );
    }

    #[test]
    fn test_needs_gunzip() {
        assert!(needs_gunzip(true, &gzip(XML)));
        assert!(!needs_gunzip(true, XML));
        assert!(!needs_gunzip(true, b"\xEF\xBB\xBF  \n<?xml version=\"1.0\"?>"));
        assert!(!needs_gunzip(false, &gzip(XML)));
    }
}
