//! Recursive-descent binding of XML events to the element graph.
//!
//! Each element is parsed against the metadata of the key its parent
//! declares for it:
//!
//! 1. Declared attributes are coerced to their value type. Undeclared ones
//!    are dropped, except on `Open` elements which keep them as raw
//!    `@name` / `@{uri}name` values.
//! 2. Declared children are parsed recursively and stored by cardinality:
//!    the last of repeated single children wins, lists keep document order
//!    and sets drop duplicates. Undeclared children become extensions when
//!    the registry knows their name, or schema-less elements when the policy
//!    is `Open`; otherwise the whole subtree is skipped.
//! 3. At the end tag the collected text is coerced to the key's value type
//!    and the element is narrowed. Text of an `Open` element without a value
//!    type is kept raw, together with its order relative to extension
//!    elements when the two are interleaved.

use std::io::BufRead;
use std::sync::Arc;

use gdata_model::element::{MixedContent, TEXT_PSEUDO_KEY};
use gdata_model::metadata::ExtensionPolicy;
use gdata_model::namespace::raw_attribute_key;
use gdata_model::narrow::narrow;
use gdata_model::validate::validate;
use gdata_model::value::{ValueType, from_wire};
use gdata_model::{Element, ElementKey, ElementMetadata, QName};
use tracing::{debug, trace};

use crate::context::WireContext;
use crate::error::Result;
use crate::xml::reader::{XmlAttribute, XmlEvent, XmlEventReader};

/// Parse a document whose root element is bound to `key`.
///
/// # Examples
///
/// ```
/// use gdata_model::atom::{AtomElement, Entry, entry::ENTRY};
/// use gdata_wire::{WireContext, from_xml_str};
///
/// let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom">
///   <id>urn:example:1</id>
///   <title>Hello</title>
/// </entry>"#;
/// let ctx = WireContext::atom();
/// let entry = Entry::from_any(from_xml_str(&ctx, xml, &ENTRY)?).unwrap();
/// assert_eq!(entry.title(), Some("Hello"));
/// # Ok::<(), gdata_wire::WireError>(())
/// ```
pub fn from_xml_str(ctx: &WireContext, xml: &str, key: &ElementKey) -> Result<Element> {
    from_xml_reader(ctx, xml.as_bytes(), key)
}

/// Parse a document from bytes.
pub fn from_xml_slice(ctx: &WireContext, xml: &[u8], key: &ElementKey) -> Result<Element> {
    from_xml_reader(ctx, xml, key)
}

/// Parse a document from a buffered reader.
pub fn from_xml_reader<R: BufRead>(ctx: &WireContext, reader: R, key: &ElementKey) -> Result<Element> {
    let mut parser = ElementParser::new(ctx, reader);
    let (name, attributes) = parser.read_root()?;
    parser.check_root(&name, key)?;
    let element = parser.parse_element(key.clone(), attributes)?;
    parser.finish_document()?;
    parser.validate(&element)?;
    Ok(element)
}

/// Parse any document without metadata.
///
/// The root and every descendant become schema-less elements holding their
/// attributes and text as raw extension values.
pub fn from_xml_str_generic(ctx: &WireContext, xml: &str) -> Result<Element> {
    let mut parser = ElementParser::new(ctx, xml.as_bytes());
    let (name, attributes) = parser.read_root()?;
    let element = parser.parse_element(ElementKey::generic(name, ValueType::Void), attributes)?;
    parser.finish_document()?;
    Ok(element)
}

/// An element whose start tag has been read and whose content is being bound.
pub(crate) struct Frame {
    pub(crate) element: Element,
    metadata: Option<Arc<ElementMetadata>>,
    text: String,
    /// Text runs and extension elements in document order
    mixed: Vec<MixedContent>,
    /// Text read since the last extension element
    run: String,
}

impl Frame {
    fn policy(&self) -> ExtensionPolicy {
        self.metadata
            .as_ref()
            .map_or(ExtensionPolicy::Open, |m| m.extension_policy())
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
        self.run.push_str(text);
    }

    fn add_extension(&mut self, extension: Element) -> Result<()> {
        if !self.run.is_empty() {
            self.mixed.push(MixedContent::Text(std::mem::take(&mut self.run)));
        }
        self.mixed
            .push(MixedContent::Element(self.element.extensions().elements().len()));
        self.element.add_extension(extension)?;
        Ok(())
    }
}

/// Why [`ElementParser::read_children`] returned.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Stop {
    /// The end tag of the element was consumed.
    End,
    /// The start tag of the requested child is next.
    Child,
}

pub(crate) struct ElementParser<'c, R: BufRead> {
    ctx: &'c WireContext,
    pub(crate) events: XmlEventReader<R>,
}

impl<'c, R: BufRead> ElementParser<'c, R> {
    pub(crate) fn new(ctx: &'c WireContext, source: R) -> Self {
        Self {
            ctx,
            events: XmlEventReader::new(source, &ctx.config),
        }
    }

    /// Reads up to and including the root start tag.
    pub(crate) fn read_root(&mut self) -> Result<(QName, Vec<XmlAttribute>)> {
        loop {
            match self.events.next_event()? {
                XmlEvent::StartDocument | XmlEvent::Text(_) => continue,
                XmlEvent::StartElement { name, attributes } => return Ok((name, attributes)),
                XmlEvent::EndElement { .. } | XmlEvent::EndDocument => {
                    return Err(self.events.error("document has no root element"));
                }
            }
        }
    }

    pub(crate) fn check_root(&self, name: &QName, key: &ElementKey) -> Result<()> {
        match key.id() {
            Some(expected) if expected != name => Err(self
                .events
                .error(format!("expected root element {expected}, found {name}"))),
            _ => Ok(()),
        }
    }

    /// Consumes everything after the root end tag.
    pub(crate) fn finish_document(&mut self) -> Result<()> {
        loop {
            match self.events.next_event()? {
                XmlEvent::EndDocument => return Ok(()),
                XmlEvent::Text(_) => continue,
                XmlEvent::StartDocument
                | XmlEvent::StartElement { .. }
                | XmlEvent::EndElement { .. } => {
                    return Err(self.events.error("content after the root element"));
                }
            }
        }
    }

    pub(crate) fn validate(&self, element: &Element) -> Result<()> {
        if self.ctx.config.validate {
            validate(element, &self.ctx.registry)?;
        }
        Ok(())
    }

    /// Parses the element whose start tag was just consumed.
    pub(crate) fn parse_element(
        &mut self,
        key: ElementKey,
        attributes: Vec<XmlAttribute>,
    ) -> Result<Element> {
        let mut frame = self.open(key, attributes)?;
        self.read_children(&mut frame, None)?;
        self.close(frame)
    }

    /// Binds the start tag of an element.
    pub(crate) fn open(&self, key: ElementKey, attributes: Vec<XmlAttribute>) -> Result<Frame> {
        let metadata = self.ctx.registry.find(&key);
        let mut frame = Frame {
            element: Element::new(key),
            metadata,
            text: String::new(),
            mixed: Vec::new(),
            run: String::new(),
        };
        let open = frame.policy() == ExtensionPolicy::Open;

        for attribute in attributes {
            let declared = frame
                .metadata
                .as_ref()
                .and_then(|m| m.attribute(&attribute.name))
                .map(|a| a.key.clone());
            match declared {
                Some(key) => {
                    let value = from_wire(&attribute.value, key.datatype())?;
                    frame.element.set_attribute(key, value)?;
                }
                None if open => {
                    frame
                        .element
                        .set_raw(raw_attribute_key(&attribute.name), attribute.value)?;
                }
                None => {
                    trace!(attribute = %attribute.name, element = %frame.element.key(), "skipping undeclared attribute");
                }
            }
        }
        Ok(frame)
    }

    /// Reads content into `frame` until its end tag, or until the start tag of
    /// a child named `stop_at`, which is left unread.
    pub(crate) fn read_children(&mut self, frame: &mut Frame, stop_at: Option<&QName>) -> Result<Stop> {
        loop {
            match self.events.next_event()? {
                XmlEvent::StartElement { name, attributes } => {
                    if stop_at == Some(&name) {
                        self.events.push_back(XmlEvent::StartElement { name, attributes });
                        return Ok(Stop::Child);
                    }
                    self.read_child(frame, name, attributes)?;
                }
                XmlEvent::Text(text) => frame.push_text(&text),
                XmlEvent::EndElement { .. } => return Ok(Stop::End),
                XmlEvent::StartDocument => continue,
                XmlEvent::EndDocument => {
                    return Err(self.events.error("unexpected end of document"));
                }
            }
        }
    }

    /// Binds one child whose start tag was just consumed.
    pub(crate) fn read_child(
        &mut self,
        frame: &mut Frame,
        name: QName,
        attributes: Vec<XmlAttribute>,
    ) -> Result<()> {
        let declared = frame
            .metadata
            .as_ref()
            .and_then(|m| m.child(&name))
            .map(|c| (c.key.clone(), c.cardinality));
        if let Some((key, cardinality)) = declared {
            let child = self.parse_element(key.clone(), attributes)?;
            frame.element.put_element(cardinality, key, child)?;
            return Ok(());
        }

        let policy = frame.policy();
        let known = match policy {
            ExtensionPolicy::Ignore => None,
            ExtensionPolicy::Declared | ExtensionPolicy::Open => {
                self.ctx.registry.key_for_name(&name)
            }
        };
        match (known, policy) {
            (Some(key), _) => {
                trace!(key = %key, "binding registered extension");
                let child = self.parse_element(key, attributes)?;
                frame.add_extension(child)?;
            }
            (None, ExtensionPolicy::Open) => {
                let child = self.parse_element(ElementKey::generic(name, ValueType::Void), attributes)?;
                frame.add_extension(child)?;
            }
            (None, _) => {
                trace!(element = %name, parent = %frame.element.key(), "skipping unknown element");
                self.events.skip_element()?;
            }
        }
        Ok(())
    }

    /// Coerces the collected text and narrows the element.
    pub(crate) fn close(&self, frame: Frame) -> Result<Element> {
        let open = frame.policy() == ExtensionPolicy::Open;
        let Frame {
            mut element,
            text,
            mut mixed,
            run,
            ..
        } = frame;

        let text = if self.ctx.config.trim_text {
            text.trim()
        } else {
            text.as_str()
        };
        let datatype = element.key().datatype();
        if datatype != ValueType::Void {
            if !text.is_empty() {
                element.set_value(from_wire(text, datatype)?)?;
            }
        } else if !text.trim().is_empty() {
            if open {
                element.set_raw(TEXT_PSEUDO_KEY, text)?;
                if !element.extensions().elements().is_empty() {
                    if !run.is_empty() {
                        mixed.push(MixedContent::Text(run));
                    }
                    element.set_mixed_content(mixed)?;
                }
            } else {
                trace!(element = %element.key(), "dropping text of element without a value type");
            }
        }

        let key = element.key().clone();
        let element = narrow(element, &self.ctx.registry);
        if element.key() != &key {
            debug!(from = %key, to = %element.key(), "element narrowed while parsing");
        }
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WireConfig;
    use gdata_model::atom::entry::ENTRY;
    use gdata_model::atom::feed::FEED;
    use gdata_model::atom::{self, AtomElement, BoundElement, Content, Entry, Feed};
    use gdata_model::namespace::ATOM_NS;
    use pretty_assertions::assert_eq;

    fn ctx() -> WireContext {
        WireContext::atom().with_config(WireConfig::for_testing())
    }

    #[test]
    fn test_parse_entry() {
        let xml = r#"<?xml version="1.0"?>
<entry xmlns="http://www.w3.org/2005/Atom" xmlns:gd="http://schemas.google.com/g/2005" gd:etag="W/&quot;abc&quot;">
  <id>urn:entry:1</id>
  <updated>2024-05-01T10:00:00.000Z</updated>
  <title type="text">First</title>
  <author><name>Ada</name><email>ada@example.com</email></author>
  <link rel="alternate" type="text/html" href="http://example.com/1"/>
  <content type="html">&lt;p&gt;hi&lt;/p&gt;</content>
</entry>"#;
        let entry = Entry::from_any(from_xml_str(&ctx(), xml, &ENTRY).unwrap()).unwrap();
        assert_eq!(entry.id(), Some("urn:entry:1"));
        assert_eq!(entry.etag(), Some("W/\"abc\""));
        assert_eq!(entry.title(), Some("First"));
        assert_eq!(entry.authors()[0].email(), Some("ada@example.com"));
        assert_eq!(
            entry.updated().map(|t| t.to_rfc3339()),
            Some("2024-05-01T10:00:00.000Z".to_string())
        );
        match entry.content() {
            Some(Content::Text(text)) => assert_eq!(text.plain_text(), Some("<p>hi</p>")),
            other => panic!("unexpected content {other:?}"),
        }
    }

    #[test]
    fn test_wrong_root_is_parse_error() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"/>"#;
        let err = from_xml_str(&ctx(), xml, &ENTRY).unwrap_err();
        assert!(err.is_parse_error());
        assert!(err.to_string().contains("expected root element"));
    }

    #[test]
    fn test_unknown_element_is_skipped() {
        let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom" xmlns:x="urn:x">
  <x:unknown><x:deep>ignored</x:deep></x:unknown>
  <id>urn:entry:2</id>
</entry>"#;
        let element = from_xml_str(&ctx(), xml, &ENTRY).unwrap();
        assert!(element.extensions().elements().is_empty());
        assert_eq!(Entry::from_any(element).unwrap().id(), Some("urn:entry:2"));
    }

    #[test]
    fn test_registered_extension_is_bound() {
        // atom:id is known to the registry but not declared on atom:link
        let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom">
  <link href="http://example.com/"><id>urn:nested</id></link>
</entry>"#;
        let element = from_xml_str(&ctx(), xml, &ENTRY).unwrap();
        let link = &element.elements(&atom::link::LINK)[0];
        let nested = &link.extensions().elements()[0];
        assert_eq!(nested.key(), &atom::ID);
        assert_eq!(nested.text_value(), Some("urn:nested"));
    }

    #[test]
    fn test_last_single_child_wins() {
        let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom">
  <title>one</title>
  <title>two</title>
</entry>"#;
        let entry = Entry::from_any(from_xml_str(&ctx(), xml, &ENTRY).unwrap()).unwrap();
        assert_eq!(entry.title(), Some("two"));
    }

    #[test]
    fn test_repeated_categories_collapse() {
        let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom">
  <category term="a"/>
  <category term="b"/>
  <category term="a"/>
</entry>"#;
        let entry = Entry::from_any(from_xml_str(&ctx(), xml, &ENTRY).unwrap()).unwrap();
        let terms: Vec<_> = entry
            .categories()
            .iter()
            .map(|c| c.term().unwrap_or_default().to_string())
            .collect();
        assert_eq!(terms, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_bad_literal_is_model_error() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:openSearch="http://a9.com/-/spec/opensearch/1.1/">
  <openSearch:totalResults>many</openSearch:totalResults>
</feed>"#;
        let err = from_xml_str(&ctx(), xml, &FEED).unwrap_err();
        assert!(matches!(
            err,
            crate::error::WireError::Model(gdata_model::ModelError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn test_missing_required_attribute_is_invalid() {
        let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom"><link rel="self"/></entry>"#;
        let err = from_xml_str(&ctx(), xml, &ENTRY).unwrap_err();
        assert!(matches!(err, crate::error::WireError::Invalid(_)));
        assert!(err.to_string().contains("href"));

        let lenient = WireContext::atom().with_config(WireConfig {
            validate: false,
            ..WireConfig::for_testing()
        });
        assert!(from_xml_str(&lenient, xml, &ENTRY).is_ok());
    }

    #[test]
    fn test_generic_document() {
        let xml = r#"<doc xmlns="urn:doc" xmlns:o="urn:other" o:flag="yes" plain="1"><item>text</item></doc>"#;
        let element = from_xml_str_generic(&ctx(), xml).unwrap();
        assert_eq!(element.id(), Some(&QName::new(Some("urn:doc".to_string()), "doc")));
        assert_eq!(element.extensions().raw("@{urn:other}flag"), Some("yes"));
        assert_eq!(element.extensions().raw("@plain"), Some("1"));
        let item = &element.extensions().elements()[0];
        assert_eq!(item.extensions().text(), Some("text"));
    }

    #[test]
    fn test_feed_entries_in_document_order() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <title>F</title>
  <entry><id>1</id></entry>
  <entry><id>2</id></entry>
</feed>"#;
        let feed = Feed::from_element(from_xml_str(&ctx(), xml, &FEED).unwrap()).unwrap();
        let ids: Vec<_> = feed
            .entries()
            .iter()
            .map(|e| e.id().unwrap_or_default().to_string())
            .collect();
        assert_eq!(ids, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(feed.as_element().id(), Some(&QName::of_static(Some(ATOM_NS), "feed")));
    }
}
