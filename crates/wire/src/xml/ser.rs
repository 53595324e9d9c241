//! Element graph to XML generation.
//!
//! Generation is depth-first and mirrors parsing. Namespace prefixes are
//! chosen once for the whole tree and declared on the root element. Each
//! element writes its attributes (hidden ones skipped), raw extension
//! attributes, then either its text value or its children, then its extension
//! elements. Text interleaved with extension elements is written back in
//! document order. Elements with no content are written self-closing.

use std::io::Write;

use gdata_model::element::{ExtensionBag, MixedContent};
use gdata_model::namespace::{NamespaceBindings, NamespaceUsage, split_clark, split_prefixed};
use gdata_model::value::to_wire;
use gdata_model::{Element, ModelError, QName};
use quick_xml::Writer;
use quick_xml::encoding::EncodingError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::context::WireContext;
use crate::error::{Result, WireError};

/// Serialize an element tree to an XML string.
///
/// # Examples
///
/// ```
/// use gdata_model::atom::{AtomElement, BoundElement, Entry};
/// use gdata_wire::{WireConfig, WireContext, to_xml_string};
///
/// let ctx = WireContext::atom().with_config(WireConfig::for_testing());
/// let mut entry = Entry::new();
/// entry.set_id("urn:example:1")?;
/// let xml = to_xml_string(&ctx, entry.as_element())?;
/// assert_eq!(xml, r#"<entry xmlns="http://www.w3.org/2005/Atom"><id>urn:example:1</id></entry>"#);
/// # Ok::<(), gdata_wire::WireError>(())
/// ```
pub fn to_xml_string(ctx: &WireContext, element: &Element) -> Result<String> {
    into_string(to_xml_vec(ctx, element)?)
}

/// Serialize an element tree to an XML byte vector.
pub fn to_xml_vec(ctx: &WireContext, element: &Element) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    to_xml_writer(ctx, element, &mut buffer)?;
    Ok(buffer)
}

/// Serialize an element tree to an XML writer.
pub fn to_xml_writer<W: Write>(ctx: &WireContext, element: &Element, writer: W) -> Result<()> {
    let mut generator = XmlGenerator::new(ctx, writer);
    generator.write_document(element, None)?;
    generator.finish();
    Ok(())
}

/// Serialize under another root name, given as `alias:local` or `local`
/// in the default namespace.
pub fn to_xml_string_named(ctx: &WireContext, element: &Element, name: &str) -> Result<String> {
    let root = ctx.namespaces.qualify(name, false)?;
    let mut buffer = Vec::new();
    let mut generator = XmlGenerator::new(ctx, &mut buffer);
    generator.write_document(element, Some(&root))?;
    generator.finish();
    into_string(buffer)
}

/// Serialize for diagnostics.
///
/// Never fails on unknown aliases in raw attribute names set by hand: they are
/// bound to `http://unknown/<alias>`.
pub fn to_debug_string(ctx: &WireContext, element: &Element) -> Result<String> {
    let mut buffer = Vec::new();
    let mut generator = XmlGenerator::new(ctx, &mut buffer).lenient();
    generator.write_document(element, None)?;
    generator.finish();
    into_string(buffer)
}

fn into_string(buffer: Vec<u8>) -> Result<String> {
    String::from_utf8(buffer).map_err(|e| WireError::Encoding(EncodingError::Utf8(e.utf8_error())))
}

/// XML generator that writes directly to quick-xml.
pub struct XmlGenerator<'c, W: Write> {
    ctx: &'c WireContext,
    writer: Writer<W>,
    lenient: bool,
}

impl<'c, W: Write> XmlGenerator<'c, W> {
    pub fn new(ctx: &'c WireContext, writer: W) -> Self {
        let writer = match ctx.config.indent {
            0 => Writer::new(writer),
            width => Writer::new_with_indent(writer, b' ', width),
        };
        Self {
            ctx,
            writer,
            lenient: false,
        }
    }

    /// Resolve unknown raw attribute aliases to placeholder namespaces.
    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    /// Writes `element` as a complete document, optionally under another root name.
    pub fn write_document(&mut self, element: &Element, root_name: Option<&QName>) -> Result<()> {
        let root = match root_name {
            Some(name) => name.clone(),
            None => element
                .id()
                .cloned()
                .ok_or_else(|| ModelError::UnnamedElement(element.key().to_string()))?,
        };

        let mut usage = NamespaceUsage {
            root: root.namespace().map(str::to_string),
            ..Default::default()
        };
        usage.record_element(&root);
        self.collect(element, &mut usage)?;
        let bindings = self.ctx.namespaces.assign_prefixes(&usage);

        if self.ctx.config.write_declaration {
            self.writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        }
        self.write_element(element, &root, &bindings, true)
    }

    /// Finishes serialization and returns the writer.
    pub fn finish(self) -> W {
        self.writer.into_inner()
    }

    /// Gathers the namespaces used by `element` and its subtree, except its own name.
    fn collect(&self, element: &Element, usage: &mut NamespaceUsage) -> Result<()> {
        let metadata = self.ctx.registry.find(element.key());
        for (key, _) in element.attributes() {
            if metadata.as_ref().is_none_or(|m| m.is_attribute_visible(key)) {
                usage.record_attribute(key.id());
            }
        }
        for (name, _) in element.extensions().raw_attributes() {
            usage.record_attribute(&self.raw_attribute_name(name)?);
        }
        for (key, children) in element.children() {
            if metadata.as_ref().is_some_and(|m| !m.is_child_visible(key)) {
                continue;
            }
            for child in children.iter() {
                self.collect_named(child, usage)?;
            }
        }
        for extension in element.extensions().elements() {
            self.collect_named(extension, usage)?;
        }
        Ok(())
    }

    fn collect_named(&self, element: &Element, usage: &mut NamespaceUsage) -> Result<()> {
        let name = element
            .id()
            .ok_or_else(|| ModelError::UnnamedElement(element.key().to_string()))?;
        usage.record_element(name);
        self.collect(element, usage)
    }

    /// Name of an undeclared attribute, given in Clark notation or with a
    /// dictionary alias.
    fn raw_attribute_name(&self, raw: &str) -> Result<QName> {
        if let Some((uri, local)) = split_clark(raw) {
            return Ok(QName::new(Some(uri.to_string()), local));
        }
        let (alias, local) = split_prefixed(raw);
        if alias.is_empty() {
            return Ok(QName::new(None, local));
        }
        Ok(self.ctx.namespaces.qualify(raw, self.lenient)?)
    }

    fn write_element(
        &mut self,
        element: &Element,
        name: &QName,
        bindings: &NamespaceBindings,
        root: bool,
    ) -> Result<()> {
        let tag = bindings
            .element_name(name)
            .ok_or_else(|| unbound(name))?;
        let mut start = BytesStart::new(tag.as_str());

        if root {
            for (attribute, uri) in bindings.declarations() {
                start.push_attribute((attribute.as_str(), uri));
            }
        }

        let metadata = self.ctx.registry.find(element.key());
        for (key, value) in element.attributes() {
            if metadata.as_ref().is_some_and(|m| !m.is_attribute_visible(key)) {
                continue;
            }
            let attribute = bindings
                .attribute_name(key.id())
                .ok_or_else(|| unbound(key.id()))?;
            start.push_attribute((attribute.as_str(), to_wire(value).as_ref()));
        }
        for (raw, value) in element.extensions().raw_attributes() {
            let qualified = self.raw_attribute_name(raw)?;
            let attribute = bindings
                .attribute_name(&qualified)
                .ok_or_else(|| unbound(&qualified))?;
            start.push_attribute((attribute.as_str(), value));
        }

        let text = element
            .value()
            .map(|value| to_wire(value).into_owned())
            .or_else(|| element.extensions().text().map(str::to_string));
        let children: Vec<&Element> = element
            .children()
            .filter(|(key, _)| metadata.as_ref().is_none_or(|m| m.is_child_visible(key)))
            .flat_map(|(_, children)| children.iter())
            .collect();
        let extensions = element.extensions();
        let mixed = element.value().is_none() && !extensions.mixed_content().is_empty();

        if text.is_none()
            && children.is_empty()
            && extensions.elements().is_empty()
            && !self.ctx.config.expand_empty_elements
        {
            self.writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        self.writer.write_event(Event::Start(start))?;
        if !mixed && let Some(text) = &text {
            self.writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for child in children {
            self.write_child(child, bindings)?;
        }
        if mixed {
            self.write_mixed(extensions, bindings)?;
        } else {
            self.write_extensions(extensions, bindings)?;
        }
        self.writer
            .write_event(Event::End(BytesEnd::new(tag.as_str())))?;
        Ok(())
    }

    fn write_child(&mut self, child: &Element, bindings: &NamespaceBindings) -> Result<()> {
        let name = child
            .id()
            .ok_or_else(|| ModelError::UnnamedElement(child.key().to_string()))?;
        self.write_element(child, name, bindings, false)
    }

    fn write_extensions(&mut self, extensions: &ExtensionBag, bindings: &NamespaceBindings) -> Result<()> {
        for extension in extensions.elements() {
            self.write_child(extension, bindings)?;
        }
        Ok(())
    }

    /// Writes text runs and extension elements in their recorded order.
    fn write_mixed(&mut self, extensions: &ExtensionBag, bindings: &NamespaceBindings) -> Result<()> {
        let elements = extensions.elements();
        let mut written = vec![false; elements.len()];
        for segment in extensions.mixed_content() {
            match segment {
                MixedContent::Text(text) => {
                    self.writer.write_event(Event::Text(BytesText::new(text)))?;
                }
                MixedContent::Element(index) => {
                    if let Some(extension) = elements.get(*index) {
                        self.write_child(extension, bindings)?;
                        written[*index] = true;
                    }
                }
            }
        }
        for (extension, _) in elements.iter().zip(written).filter(|(_, done)| !done) {
            self.write_child(extension, bindings)?;
        }
        Ok(())
    }
}

fn unbound(name: &QName) -> WireError {
    WireError::Model(ModelError::UnknownAlias(
        name.namespace().unwrap_or_default().to_string(),
    ))
}
