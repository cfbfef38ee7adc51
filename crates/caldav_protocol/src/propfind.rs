//! PROPFIND request bodies

use tracing::debug;

use crate::{
    DAV_NS,
    error::ProtocolError,
    properties::{PropRequest, PropertyName},
    xml::{XmlElement, parse_document},
};

/// Parse a PROPFIND body, treating anything unusable as `allprop`
///
/// Empty bodies are `allprop` by RFC 4918. Malformed or non-UTF-8 bodies and
/// bodies whose root is not `DAV:propfind` also degrade to `allprop`.
#[must_use]
pub fn parse_propfind(body: &[u8]) -> PropRequest {
    let Ok(text) = std::str::from_utf8(body) else {
        debug!("PROPFIND body is not UTF-8, answering allprop");
        return PropRequest::AllProp;
    };
    match parse_propfind_strict(text) {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, "Unreadable PROPFIND body, answering allprop");
            PropRequest::AllProp
        },
    }
}

/// Parse a PROPFIND body, rejecting malformed XML
pub fn parse_propfind_strict(body: &str) -> Result<PropRequest, ProtocolError> {
    if body.trim().is_empty() {
        return Ok(PropRequest::AllProp);
    }
    let root = parse_document(body)?;
    if !root.is(DAV_NS, "propfind") {
        return Err(ProtocolError::Xml(format!(
            "expected DAV:propfind, found {}",
            root.local
        )));
    }
    Ok(prop_request(&root))
}

/// Interpret the `allprop` / `propname` / `prop` child of a request element
///
/// A request element with none of them asks for everything.
pub(crate) fn prop_request(parent: &XmlElement) -> PropRequest {
    if parent.child(DAV_NS, "propname").is_some() {
        return PropRequest::PropName;
    }
    if parent.child(DAV_NS, "allprop").is_some() {
        return PropRequest::AllProp;
    }
    parent.child(DAV_NS, "prop").map_or(PropRequest::AllProp, |prop| {
        PropRequest::Props(
            prop.children
                .iter()
                .map(|c| PropertyName::from_qualified(&c.namespace, &c.local))
                .collect(),
        )
    })
}
