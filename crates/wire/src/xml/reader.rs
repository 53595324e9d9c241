//! Namespace-aware event layer over `quick_xml::NsReader`.
//!
//! The parser works on five event kinds only. Empty elements are expanded into
//! a start and end event, comments, processing instructions and the doctype
//! are dropped, and adjacent text, CDATA sections and entity or character
//! references are merged into a single [`XmlEvent::Text`].

use std::collections::VecDeque;
use std::io::BufRead;

use gdata_model::QName;
use quick_xml::NsReader;
use quick_xml::encoding::EncodingError;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use tracing::trace;

use crate::config::WireConfig;
use crate::error::{Result, WireError};

/// An attribute with its resolved name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: QName,
    pub value: String,
}

/// Event produced by [`XmlEventReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    StartDocument,
    StartElement {
        name: QName,
        attributes: Vec<XmlAttribute>,
    },
    Text(String),
    EndElement {
        name: QName,
    },
    EndDocument,
}

/// Pull reader with one-event lookahead and push-back.
pub struct XmlEventReader<R: BufRead> {
    reader: NsReader<R>,
    buf: Vec<u8>,
    /// Events that have been peeked or pushed back
    buffered: VecDeque<XmlEvent>,
    /// Event read while collecting text, returned after the text
    lookahead: Option<XmlEvent>,
    started: bool,
    finished: bool,
    depth: usize,
    max_depth: usize,
}

impl<R: BufRead> XmlEventReader<R> {
    pub fn new(source: R, config: &WireConfig) -> Self {
        let mut reader = NsReader::from_reader(source);
        let settings = reader.config_mut();
        settings.expand_empty_elements = true;
        settings.check_end_names = true;
        settings.trim_text(false);

        Self {
            reader,
            buf: Vec::new(),
            buffered: VecDeque::new(),
            lookahead: None,
            started: false,
            finished: false,
            depth: 0,
            max_depth: config.max_depth,
        }
    }

    /// Byte offset of the reader in the input.
    pub fn position(&self) -> u64 {
        self.reader.buffer_position()
    }

    /// Depth of the element most recently started and not yet ended.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Peek at the next event without consuming it.
    pub fn peek(&mut self) -> Result<&XmlEvent> {
        if self.buffered.is_empty() {
            let event = self.read()?;
            self.buffered.push_back(event);
        }
        match self.buffered.front() {
            Some(event) => Ok(event),
            None => Err(self.error("event buffer empty after read")),
        }
    }

    /// Get the next event, using peeked events first.
    pub fn next_event(&mut self) -> Result<XmlEvent> {
        match self.buffered.pop_front() {
            Some(event) => Ok(event),
            None => self.read(),
        }
    }

    /// Returns an event so that the next call to [`next_event`](Self::next_event) yields it again.
    pub fn push_back(&mut self, event: XmlEvent) {
        self.buffered.push_front(event);
    }

    /// Skips the rest of the element whose start event was just consumed.
    pub fn skip_element(&mut self) -> Result<()> {
        let mut depth = 1usize;
        loop {
            match self.next_event()? {
                XmlEvent::StartElement { .. } => depth += 1,
                XmlEvent::EndElement { .. } => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                XmlEvent::EndDocument => {
                    return Err(self.error("unexpected end of document"));
                }
                _ => {}
            }
        }
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> WireError {
        WireError::parse(message, self.position())
    }

    fn read(&mut self) -> Result<XmlEvent> {
        if !self.started {
            self.started = true;
            return Ok(XmlEvent::StartDocument);
        }
        if let Some(event) = self.lookahead.take() {
            return Ok(event);
        }
        if self.finished {
            return Ok(XmlEvent::EndDocument);
        }

        let mut text: Option<String> = None;
        loop {
            self.buf.clear();
            let (resolved, event) = self.reader.read_resolved_event_into(&mut self.buf)?;
            let namespace = match resolved {
                ResolveResult::Bound(ns) => Some(namespace_uri(ns.as_ref())?),
                ResolveResult::Unbound => None,
                ResolveResult::Unknown(prefix) => {
                    let prefix = String::from_utf8_lossy(&prefix).into_owned();
                    return Err(WireError::parse(
                        format!("unknown namespace prefix '{prefix}'"),
                        self.reader.buffer_position(),
                    ));
                }
            };

            let next = match event {
                Event::Start(start) => {
                    let name = element_name(&self.reader, &start, namespace)?;
                    let attributes = attributes(&self.reader, &start)?;
                    XmlEvent::StartElement { name, attributes }
                }
                Event::End(end) => {
                    let end_local = end.local_name();
                    let local = self.reader.decoder().decode(end_local.as_ref())?;
                    XmlEvent::EndElement {
                        name: QName::new(namespace, local.into_owned()),
                    }
                }
                Event::Text(content) => {
                    if self.depth > 0 {
                        text.get_or_insert_with(String::new)
                            .push_str(&content.decode()?);
                    }
                    continue;
                }
                Event::CData(content) => {
                    let decoded = self.reader.decoder().decode(content.as_ref())?;
                    text.get_or_insert_with(String::new).push_str(&decoded);
                    continue;
                }
                Event::GeneralRef(reference) => {
                    let resolved = match reference.resolve_char_ref()? {
                        Some(ch) => ch.to_string(),
                        None => {
                            let name = reference.decode()?;
                            match resolve_predefined_entity(&name) {
                                Some(value) => value.to_string(),
                                None => {
                                    return Err(WireError::parse(
                                        format!("unknown entity '&{name};'"),
                                        self.reader.buffer_position(),
                                    ));
                                }
                            }
                        }
                    };
                    text.get_or_insert_with(String::new).push_str(&resolved);
                    continue;
                }
                Event::Eof => {
                    if self.depth != 0 {
                        return Err(self.error("unexpected end of document"));
                    }
                    self.finished = true;
                    XmlEvent::EndDocument
                }
                Event::Empty(_) => {
                    return Err(self.error("unexpanded empty element"));
                }
                Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_) => {
                    trace!("skipping non-content event");
                    continue;
                }
            };

            match &next {
                XmlEvent::StartElement { name, .. } => {
                    self.depth += 1;
                    if self.depth > self.max_depth {
                        return Err(self.error(format!(
                            "element {name} exceeds the maximum depth of {}",
                            self.max_depth
                        )));
                    }
                }
                XmlEvent::EndElement { .. } => self.depth = self.depth.saturating_sub(1),
                _ => {}
            }

            return Ok(match text.take() {
                Some(text) => {
                    self.lookahead = Some(next);
                    XmlEvent::Text(text)
                }
                None => next,
            });
        }
    }
}

fn namespace_uri(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| WireError::Encoding(EncodingError::Utf8(e)))
}

fn element_name<R>(
    reader: &NsReader<R>,
    start: &BytesStart<'_>,
    namespace: Option<String>,
) -> Result<QName> {
    let start_local = start.local_name();
    let local = reader.decoder().decode(start_local.as_ref())?;
    Ok(QName::new(namespace, local.into_owned()))
}

fn attributes<R>(reader: &NsReader<R>, start: &BytesStart<'_>) -> Result<Vec<XmlAttribute>> {
    let mut out = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attribute.key);
        let namespace = match resolved {
            ResolveResult::Bound(ns) => Some(namespace_uri(ns.as_ref())?),
            ResolveResult::Unbound => None,
            ResolveResult::Unknown(prefix) => {
                return Err(WireError::parse(
                    format!(
                        "unknown namespace prefix '{}'",
                        String::from_utf8_lossy(&prefix)
                    ),
                    reader.buffer_position(),
                ));
            }
        };
        let local = reader.decoder().decode(local.as_ref())?.into_owned();
        let value = attribute
            .decode_and_unescape_value(reader.decoder())?
            .into_owned();
        out.push(XmlAttribute {
            name: QName::new(namespace, local),
            value,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdata_model::namespace::ATOM_NS;
    use pretty_assertions::assert_eq;

    fn reader(xml: &str) -> XmlEventReader<&[u8]> {
        XmlEventReader::new(xml.as_bytes(), &WireConfig::default())
    }

    fn collect(xml: &str) -> Vec<XmlEvent> {
        let mut reader = reader(xml);
        let mut events = Vec::new();
        loop {
            let event = reader.next_event().unwrap();
            let done = event == XmlEvent::EndDocument;
            events.push(event);
            if done {
                return events;
            }
        }
    }

    #[test]
    fn test_empty_element_expands() {
        let events = collect(r#"<feed xmlns="http://www.w3.org/2005/Atom"><id/></feed>"#);
        let id = QName::new(Some(ATOM_NS.to_string()), "id");
        assert_eq!(
            events[2],
            XmlEvent::StartElement {
                name: id.clone(),
                attributes: vec![]
            }
        );
        assert_eq!(events[3], XmlEvent::EndElement { name: id });
        assert_eq!(events.len(), 6);
    }

    #[test]
    fn test_text_cdata_and_references_merge() {
        let events = collect("<a>x &amp; <![CDATA[<y>]]>&#65;<!-- c --></a>");
        assert_eq!(events[2], XmlEvent::Text("x & <y>A".to_string()));
        assert!(matches!(events[3], XmlEvent::EndElement { .. }));
    }

    #[test]
    fn test_attributes_resolve_namespaces() {
        let events = collect(
            r#"<a xmlns:gd="http://schemas.google.com/g/2005" gd:etag="W/&quot;1&quot;" xml:lang="en" href="x"/>"#,
        );
        let XmlEvent::StartElement { attributes, .. } = &events[1] else {
            panic!("expected start element");
        };
        assert_eq!(attributes.len(), 3);
        assert_eq!(
            attributes[0].name,
            QName::new(Some("http://schemas.google.com/g/2005".to_string()), "etag")
        );
        assert_eq!(attributes[0].value, "W/\"1\"");
        assert_eq!(attributes[1].name.namespace(), Some(gdata_model::namespace::XML_NS));
        assert_eq!(attributes[2].name, QName::new(None, "href"));
    }

    #[test]
    fn test_peek_and_push_back() {
        let mut reader = reader("<a>t</a>");
        assert_eq!(reader.next_event().unwrap(), XmlEvent::StartDocument);
        assert!(matches!(reader.peek().unwrap(), XmlEvent::StartElement { .. }));
        let start = reader.next_event().unwrap();
        reader.push_back(start.clone());
        assert_eq!(reader.next_event().unwrap(), start);
        assert_eq!(reader.next_event().unwrap(), XmlEvent::Text("t".to_string()));
    }

    #[test]
    fn test_unknown_prefix_is_parse_error() {
        let mut reader = reader("<x:a/>");
        reader.next_event().unwrap();
        let err = reader.next_event().unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_max_depth() {
        let config = WireConfig {
            max_depth: 2,
            ..Default::default()
        };
        let mut reader = XmlEventReader::new("<a><b><c/></b></a>".as_bytes(), &config);
        let err = loop {
            match reader.next_event() {
                Ok(_) => continue,
                Err(e) => break e,
            }
        };
        assert!(err.to_string().contains("maximum depth"));
    }

    #[test]
    fn test_skip_element() {
        let mut reader = reader("<a><skip><x><y/></x></skip><keep/></a>");
        reader.next_event().unwrap();
        reader.next_event().unwrap();
        assert!(matches!(reader.next_event().unwrap(), XmlEvent::StartElement { .. }));
        reader.skip_element().unwrap();
        match reader.next_event().unwrap() {
            XmlEvent::StartElement { name, .. } => assert_eq!(name.local_name(), "keep"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
