//! Namespace-resolved XML element tree
//!
//! DAV request bodies are small, so they are read fully into a tree whose
//! element names are (namespace URI, local name) pairs. Prefixes never leak
//! past this module.

use quick_xml::{
    NsReader,
    events::{BytesStart, Event},
    name::{Namespace, ResolveResult},
};

use crate::error::ProtocolError;

/// Deepest element nesting accepted in a request body
const MAX_DOCUMENT_DEPTH: usize = 32;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct XmlElement {
    pub namespace: String,
    pub local: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    pub text: String,
}

impl XmlElement {
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace == namespace && self.local == local
    }

    pub fn child(&self, namespace: &str, local: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.is(namespace, local))
    }

    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |c| c.is(namespace, local))
    }

    /// Attribute by unprefixed name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

fn namespace_of(resolved: &ResolveResult<'_>) -> String {
    match resolved {
        ResolveResult::Bound(Namespace(ns)) => String::from_utf8_lossy(ns).into_owned(),
        _ => String::new(),
    }
}

fn open_element(resolved: &ResolveResult<'_>, start: &BytesStart<'_>) -> Result<XmlElement, ProtocolError> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        namespace: namespace_of(resolved),
        local: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

/// Parse a document and return its root element
pub(crate) fn parse_document(body: &str) -> Result<XmlElement, ProtocolError> {
    let mut reader = NsReader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        buf.clear();
        let (resolved, event) = reader.read_resolved_event_into(&mut buf)?;
        match event {
            Event::Start(ref start) => {
                if stack.len() >= MAX_DOCUMENT_DEPTH {
                    return Err(ProtocolError::Xml("document nests too deeply".to_string()));
                }
                let element = open_element(&resolved, start)?;
                stack.push(element);
            },
            Event::Empty(ref start) => {
                let element = open_element(&resolved, start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None if root.is_none() => root = Some(element),
                    None => return Err(ProtocolError::Xml("multiple root elements".to_string())),
                }
            },
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(ProtocolError::Xml("unbalanced end tag".to_string()));
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None if root.is_none() => root = Some(element),
                    None => return Err(ProtocolError::Xml("multiple root elements".to_string())),
                }
            },
            Event::Text(ref text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            },
            Event::CData(ref data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(data.as_ref()));
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    if !stack.is_empty() {
        return Err(ProtocolError::Xml("unexpected end of document".to_string()));
    }
    root.ok_or_else(|| ProtocolError::Xml("document has no root element".to_string()))
}
