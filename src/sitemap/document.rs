//! Namespace-aware XML tree built with quick-xml
//!
//! quick-xml never expands external entities, so a hostile DOCTYPE cannot
//! pull in local files or remote resources. Unknown entity references fail
//! the parse instead.
//!
//! Documents declared in another encoding are transcoded to UTF-8 first;
//! the declaration itself is kept so callers can still see what was declared.

use crate::error::{Error, Result};
use encoding_rs::{Encoding, UTF_8};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{PrefixDeclaration, ResolveResult};
use quick_xml::reader::NsReader;
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

static DECLARED_ENCODING: OnceLock<Regex> = OnceLock::new();

/// A parsed XML document
#[derive(Debug, Clone)]
pub struct XmlDocument {
    pub root: XmlElement,
    /// `encoding` pseudo-attribute of the XML declaration
    pub declared_encoding: Option<String>,
    /// Every `xmlns` declaration found anywhere in the document
    pub namespaces: Vec<NamespaceDecl>,
}

impl XmlDocument {
    /// Whether a namespace is declared anywhere, by URI or by prefix
    pub fn declares_namespace(&self, uri: &str, prefix: &str) -> bool {
        self.namespaces
            .iter()
            .any(|ns| ns.uri == uri || ns.prefix.as_deref() == Some(prefix))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// `None` for a default namespace declaration
    pub prefix: Option<String>,
    pub uri: String,
}

#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    pub local_name: String,
    pub prefix: Option<String>,
    /// Resolved namespace URI
    pub namespace: Option<String>,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlElement>,
    /// Concatenated, trimmed text content of this element only
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct XmlAttribute {
    pub local_name: String,
    pub prefix: Option<String>,
    pub value: String,
}

impl XmlElement {
    /// Direct children with the given local name in the given namespace
    pub fn children_named<'a>(
        &'a self,
        namespace: Option<&'a str>,
        local_name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children
            .iter()
            .filter(move |c| c.local_name == local_name && c.namespace.as_deref() == namespace)
    }

    /// First matching child
    pub fn child(&self, namespace: Option<&str>, local_name: &str) -> Option<&XmlElement> {
        self.children
            .iter()
            .find(|c| c.local_name == local_name && c.namespace.as_deref() == namespace)
    }

    /// Unprefixed attribute value
    pub fn attr(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.prefix.is_none() && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }
}

/// Parse a complete document into a tree
///
/// Fails on anything a conforming parser rejects: malformed markup,
/// mismatched or unclosed tags, content outside the root element, a missing
/// or duplicated root.
pub fn parse_document(bytes: &[u8]) -> Result<XmlDocument> {
    let bytes = transcode(bytes)?;
    let mut reader = NsReader::from_reader(bytes.as_ref());
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut declared_encoding = None;
    let mut namespaces = Vec::new();

    loop {
        let position = reader.buffer_position();
        let (resolved, event) = match reader.read_resolved_event_into(&mut buf) {
            Ok(pair) => pair,
            Err(e) => return Err(Error::Xml(format!("{} (near byte {})", e, position))),
        };
        let namespace = resolved_uri(&resolved);

        match event {
            Event::Decl(decl) => {
                if let Some(Ok(encoding)) = decl.encoding() {
                    declared_encoding = Some(String::from_utf8_lossy(&encoding).into_owned());
                }
            }
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(Error::Xml(
                        "extra content after the document element".to_string(),
                    ));
                }
                let element = build_element(&start, namespace, &mut namespaces)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = build_element(&start, namespace, &mut namespaces)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::Xml("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let value = text.unescape().map_err(|e| Error::Xml(e.to_string()))?;
                push_text(&mut stack, &value)?;
            }
            Event::CData(data) => {
                let value = String::from_utf8_lossy(&data).into_owned();
                push_text(&mut stack, &value)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(Error::Xml(format!(
            "premature end of document, <{}> is not closed",
            open.local_name
        )));
    }

    let root = root.ok_or_else(|| Error::Xml("document has no root element".to_string()))?;

    Ok(XmlDocument {
        root,
        declared_encoding,
        namespaces,
    })
}

/// `encoding` of the XML declaration, read from the raw prolog
fn declared_encoding_label(bytes: &[u8]) -> Option<String> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    DECLARED_ENCODING
        .get_or_init(|| {
            Regex::new(r#"^\x{FEFF}?\s*<\?xml\s[^>]*?encoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#)
                .expect("declaration pattern compiles")
        })
        .captures(&head)
        .map(|caps| caps[1].to_string())
}

/// Re-encode a document declared in a non-UTF-8 encoding as UTF-8
fn transcode(bytes: &[u8]) -> Result<Cow<'_, [u8]>> {
    let Some(label) = declared_encoding_label(bytes) else {
        return Ok(Cow::Borrowed(bytes));
    };
    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| Error::Xml(format!("unsupported encoding '{}'", label)))?;
    if encoding == UTF_8 {
        return Ok(Cow::Borrowed(bytes));
    }

    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(Error::Xml(format!(
            "document is not valid {}",
            encoding.name()
        )));
    }
    Ok(Cow::Owned(text.into_owned().into_bytes()))
}

fn resolved_uri(resolved: &ResolveResult) -> Option<String> {
    match resolved {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        _ => None,
    }
}

fn build_element(
    start: &BytesStart,
    namespace: Option<String>,
    namespaces: &mut Vec<NamespaceDecl>,
) -> Result<XmlElement> {
    let name = start.name();
    let mut element = XmlElement {
        local_name: String::from_utf8_lossy(name.local_name().as_ref()).into_owned(),
        prefix: name
            .prefix()
            .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned()),
        namespace,
        ..Default::default()
    };

    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Xml(e.to_string()))?
            .into_owned();

        if let Some(binding) = attr.key.as_namespace_binding() {
            let prefix = match binding {
                PrefixDeclaration::Default => None,
                PrefixDeclaration::Named(p) => Some(String::from_utf8_lossy(p).into_owned()),
            };
            let decl = NamespaceDecl { prefix, uri: value };
            if !namespaces.contains(&decl) {
                namespaces.push(decl);
            }
            continue;
        }

        element.attributes.push(XmlAttribute {
            local_name: String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned(),
            prefix: attr
                .key
                .prefix()
                .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned()),
            value,
        });
    }

    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(Error::Xml(
                "extra content after the document element".to_string(),
            ))
        }
    }
    Ok(())
}

fn push_text(stack: &mut [XmlElement], value: &str) -> Result<()> {
    match stack.last_mut() {
        Some(element) => element.text.push_str(value),
        None if value.trim().is_empty() => {}
        None => {
            return Err(Error::Xml(
                "text content outside of the document element".to_string(),
            ))
        }
    }
    Ok(())
}
