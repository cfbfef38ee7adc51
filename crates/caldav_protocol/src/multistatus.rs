//! Multistatus response writer

use std::io::Cursor;

use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::{
    CALDAV_NS, DAV_NS,
    error::ProtocolError,
    properties::{DavStatus, PropStat, PropertyName, PropertyValue, ResourceTypeFlag},
};

/// One `<response>` of a multistatus body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavResponse {
    pub href: String,
    pub body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    PropStats(Vec<PropStat>),
    /// Whole-response status, used for hrefs that name nothing
    Status(DavStatus),
}

impl DavResponse {
    #[must_use]
    pub fn with_propstats(href: impl Into<String>, propstats: Vec<PropStat>) -> Self {
        Self {
            href: href.into(),
            body: ResponseBody::PropStats(propstats),
        }
    }

    #[must_use]
    pub fn not_found(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            body: ResponseBody::Status(DavStatus::NotFound),
        }
    }
}

/// A `<multistatus>` envelope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Multistatus {
    responses: Vec<DavResponse>,
}

impl Multistatus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, response: DavResponse) {
        self.responses.push(response);
    }

    #[must_use]
    pub fn responses(&self) -> &[DavResponse] {
        &self.responses
    }

    /// Serialize with the XML declaration first
    pub fn to_xml(&self) -> Result<String, ProtocolError> {
        let mut out = XmlOut::new();
        out.event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut root = BytesStart::new("d:multistatus");
        root.push_attribute(("xmlns:d", DAV_NS));
        root.push_attribute(("xmlns:cal", CALDAV_NS));
        out.event(Event::Start(root))?;

        for response in &self.responses {
            out.start("d:response")?;
            out.text_element("d:href", &response.href)?;
            match &response.body {
                ResponseBody::PropStats(propstats) => {
                    for propstat in propstats {
                        write_propstat(&mut out, propstat)?;
                    }
                },
                ResponseBody::Status(status) => {
                    out.text_element("d:status", status.status_line())?;
                },
            }
            out.end("d:response")?;
        }

        out.end("d:multistatus")?;
        out.finish()
    }
}

fn write_propstat(out: &mut XmlOut, propstat: &PropStat) -> Result<(), ProtocolError> {
    out.start("d:propstat")?;
    out.start("d:prop")?;
    for (name, value) in &propstat.properties {
        write_property(out, name, value.as_ref())?;
    }
    out.end("d:prop")?;
    out.text_element("d:status", propstat.status.status_line())?;
    out.end("d:propstat")
}

fn qualified_name(name: &PropertyName) -> (String, Option<(&'static str, String)>) {
    match name {
        PropertyName::Other { namespace, name } if namespace.is_empty() => (name.clone(), None),
        PropertyName::Other { namespace, name } => {
            (format!("x:{name}"), Some(("xmlns:x", namespace.clone())))
        },
        known if known.namespace() == CALDAV_NS => (format!("cal:{}", known.local_name()), None),
        known => (format!("d:{}", known.local_name()), None),
    }
}

fn write_property(
    out: &mut XmlOut,
    name: &PropertyName,
    value: Option<&PropertyValue>,
) -> Result<(), ProtocolError> {
    let (tag, declaration) = qualified_name(name);
    let mut start = BytesStart::new(tag.as_str());
    if let Some((attr, ns)) = &declaration {
        start.push_attribute((*attr, ns.as_str()));
    }

    let Some(value) = value else {
        return out.event(Event::Empty(start));
    };

    match value {
        PropertyValue::Text(text) if text.is_empty() => return out.event(Event::Empty(start)),
        PropertyValue::ResourceType(flags) if flags.is_empty() => {
            return out.event(Event::Empty(start));
        },
        _ => {},
    }

    out.event(Event::Start(start))?;
    match value {
        PropertyValue::Text(text) => out.text(text)?,
        PropertyValue::Href(href) => out.text_element("d:href", href)?,
        PropertyValue::ResourceType(flags) => {
            for flag in flags {
                let tag = match flag {
                    ResourceTypeFlag::Collection => "d:collection",
                    ResourceTypeFlag::Calendar => "cal:calendar",
                    ResourceTypeFlag::Principal => "d:principal",
                };
                out.event(Event::Empty(BytesStart::new(tag)))?;
            }
        },
        PropertyValue::ComponentSet(components) => {
            for component in components {
                let mut comp = BytesStart::new("cal:comp");
                comp.push_attribute(("name", component.as_str()));
                out.event(Event::Empty(comp))?;
            }
        },
    }
    out.end(&tag)
}

/// quick-xml writer with protocol error mapping
struct XmlOut {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new(Cursor::new(Vec::new())),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), ProtocolError> {
        self.writer
            .write_event(event)
            .map_err(|e| ProtocolError::Xml(e.to_string()))
    }

    fn start(&mut self, tag: &str) -> Result<(), ProtocolError> {
        self.event(Event::Start(BytesStart::new(tag)))
    }

    fn end(&mut self, tag: &str) -> Result<(), ProtocolError> {
        self.event(Event::End(BytesEnd::new(tag)))
    }

    fn text(&mut self, text: &str) -> Result<(), ProtocolError> {
        self.event(Event::Text(BytesText::new(text)))
    }

    fn text_element(&mut self, tag: &str, text: &str) -> Result<(), ProtocolError> {
        self.start(tag)?;
        self.text(text)?;
        self.end(tag)
    }

    fn finish(self) -> Result<String, ProtocolError> {
        String::from_utf8(self.writer.into_inner().into_inner())
            .map_err(|e| ProtocolError::Xml(e.to_string()))
    }
}
