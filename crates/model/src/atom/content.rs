//! `atom:content` and its narrowed kinds.
//!
//! Content is parsed under [`CONTENT`] and narrowed once complete: a `src`
//! attribute makes it [`OUT_OF_LINE_CONTENT`], a text `type` (or none) makes
//! it [`TEXT_CONTENT`](crate::atom::text::TEXT_CONTENT). Anything else, such
//! as inline `application/xml`, stays generic.

use crate::atom::text::{self, DIV, TYPE, TextContent, TextType};
use crate::atom::{BoundElement, ETAG, XML_LANG, bound_element};
use crate::element::Element;
use crate::error::Result;
use crate::key::{AttributeKey, ElementKey, ElementKind};
use crate::metadata::{AttributeMetadata, Cardinality, Discriminator, ElementMetadata, ExtensionPolicy};
use crate::namespace::{ATOM_NS, QName};
use crate::registry::MetadataRegistry;
use crate::value::ValueType;

pub const CONTENT_KIND: ElementKind = ElementKind::new("atom:content");
pub const OUT_OF_LINE_KIND: ElementKind = ElementKind::new("atom:content.out-of-line");

/// Discriminator value that narrows `atom:content` to [`OUT_OF_LINE_CONTENT`].
pub const OUT_OF_LINE_DISCRIMINATOR: &str = "out-of-line";

/// `atom:content` before narrowing.
pub const CONTENT: ElementKey = ElementKey::new(
    QName::of_static(Some(ATOM_NS), "content"),
    ValueType::Text,
    CONTENT_KIND,
);

/// `atom:content` referring to external media.
pub const OUT_OF_LINE_CONTENT: ElementKey = ElementKey::new(
    QName::of_static(Some(ATOM_NS), "content"),
    ValueType::Void,
    OUT_OF_LINE_KIND,
);

pub const SRC: AttributeKey = AttributeKey::text("src");
/// Size of the referenced media. Never written.
pub const LENGTH: AttributeKey = AttributeKey::new(QName::unqualified("length"), ValueType::I64);

fn content_discriminator(element: &Element) -> Option<String> {
    if element.has_attribute(&SRC) {
        return Some(OUT_OF_LINE_DISCRIMINATOR.to_string());
    }
    text::text_type_of(element)
        .ok()
        .map(|_| text::TEXT_CONTENT_DISCRIMINATOR.to_string())
}

/// Registers generic and out-of-line content.
pub fn register_metadata(registry: &MetadataRegistry) -> Result<()> {
    if registry.is_registered(&CONTENT) {
        return Ok(());
    }

    registry.register(ElementMetadata::generic(DIV))?;

    let base = ElementMetadata::builder(CONTENT)
        .attribute(TYPE)
        .attribute(SRC)
        .attribute(XML_LANG)
        .child(DIV, Cardinality::Single)
        .extension_policy(ExtensionPolicy::Open)
        .discriminator(Discriminator::Custom(content_discriminator))
        .build();

    let out_of_line = ElementMetadata::builder(OUT_OF_LINE_CONTENT)
        .inherit(&base)
        .required_attribute(SRC)
        .replace_attribute(AttributeMetadata::optional(LENGTH).hidden())
        .attribute(ETAG)
        .extension_policy(ExtensionPolicy::Declared)
        .build();

    registry.register(base)?;
    registry.register(out_of_line)?;
    registry.adapt(&CONTENT, OUT_OF_LINE_DISCRIMINATOR, &OUT_OF_LINE_CONTENT)?;
    Ok(())
}

bound_element!(
    /// Content stored outside the entry and referenced by `src`.
    OutOfLineContent,
    OUT_OF_LINE_CONTENT,
    register_metadata
);

impl OutOfLineContent {
    pub fn new(src: &str, mime_type: Option<&str>) -> Result<Self> {
        let mut element = Element::new(OUT_OF_LINE_CONTENT);
        element.set_attribute(SRC, src)?;
        if let Some(mime_type) = mime_type {
            element.set_attribute(TYPE, mime_type)?;
        }
        Ok(Self(element))
    }

    pub fn src(&self) -> Option<&str> {
        self.0.attribute_text(&SRC)
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.0.attribute_text(&TYPE)
    }

    pub fn length(&self) -> Option<i64> {
        self.0.attribute(&LENGTH).and_then(|v| v.as_i64())
    }

    pub fn set_length(&mut self, length: i64) -> Result<()> {
        self.0.set_attribute(LENGTH, length)
    }

    pub fn etag(&self) -> Option<&str> {
        self.0.attribute_text(&ETAG)
    }
}

/// The content of an entry, by narrowed kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(TextContent),
    OutOfLine(OutOfLineContent),
    /// Inline content of any other media type.
    Other(Element),
}

impl Content {
    pub fn from_element(element: Element) -> Self {
        let element = match TextContent::from_element(element) {
            Ok(text) => return Content::Text(text),
            Err(element) => element,
        };
        match OutOfLineContent::from_element(element) {
            Ok(out_of_line) => Content::OutOfLine(out_of_line),
            Err(element) => Content::Other(element),
        }
    }

    pub fn as_element(&self) -> &Element {
        match self {
            Content::Text(text) => text.as_element(),
            Content::OutOfLine(out_of_line) => out_of_line.as_element(),
            Content::Other(element) => element,
        }
    }

    pub fn into_element(self) -> Element {
        match self {
            Content::Text(text) => text.into_element(),
            Content::OutOfLine(out_of_line) => out_of_line.into_element(),
            Content::Other(element) => element,
        }
    }

    /// Value of the `type` attribute, defaulting to `text` for text content.
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(text.text_type().map_or("text", |t| t.as_str())),
            Content::OutOfLine(out_of_line) => out_of_line.mime_type(),
            Content::Other(element) => element.attribute_text(&TYPE),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Content::Text(t) if t.text_type() != Some(TextType::Xhtml))
    }
}

impl From<TextContent> for Content {
    fn from(value: TextContent) -> Self {
        Content::Text(value)
    }
}

impl From<OutOfLineContent> for Content {
    fn from(value: OutOfLineContent) -> Self {
        Content::OutOfLine(value)
    }
}
