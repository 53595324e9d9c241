//! Atom text constructs: `title`, `subtitle`, `summary`, `rights`, and
//! `content` once it is known to hold text.

use crate::atom::{XML_LANG, bound_element, content};
use crate::element::Element;
use crate::error::{Result, ValidationError};
use crate::key::{AttributeKey, ElementKey, ElementKind};
use crate::metadata::{Cardinality, ElementMetadata, ExtensionPolicy};
use crate::namespace::{ATOM_NS, QName, XHTML_NS};
use crate::registry::MetadataRegistry;
use crate::value::ValueType;

/// Kind shared by every text construct.
pub const TEXT_KIND: ElementKind = ElementKind::new("atom:text");

/// Discriminator value that narrows `atom:content` to [`TEXT_CONTENT`].
pub const TEXT_CONTENT_DISCRIMINATOR: &str = "text";

/// Metadata shared by all text constructs regardless of name.
pub const TEXT_CONSTRUCT: ElementKey = ElementKey::construct(ValueType::Text, TEXT_KIND);

pub const TITLE: ElementKey = text_key("title");
pub const SUBTITLE: ElementKey = text_key("subtitle");
pub const SUMMARY: ElementKey = text_key("summary");
pub const RIGHTS: ElementKey = text_key("rights");

/// `atom:content` narrowed to inline text.
pub const TEXT_CONTENT: ElementKey = text_key("content");

/// `xhtml:div`, the wrapper of `type="xhtml"` text.
pub const DIV: ElementKey = ElementKey::new(
    QName::of_static(Some(XHTML_NS), "div"),
    ValueType::Void,
    ElementKind::new("xhtml:div"),
);

/// The `type` attribute of text constructs and content.
pub const TYPE: AttributeKey = AttributeKey::text("type");

const fn text_key(local_name: &'static str) -> ElementKey {
    ElementKey::new(QName::of_static(Some(ATOM_NS), local_name), ValueType::Text, TEXT_KIND)
}

/// How the text of a construct is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextType {
    Text,
    Html,
    Xhtml,
}

impl TextType {
    /// Maps a `type` attribute value. Media type spellings are accepted.
    pub fn from_attribute(value: &str) -> Option<Self> {
        match value {
            "plain" | "text" | "text/plain" => Some(TextType::Text),
            "html" | "text/html" => Some(TextType::Html),
            "xhtml" => Some(TextType::Xhtml),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TextType::Text => "text",
            TextType::Html => "html",
            TextType::Xhtml => "xhtml",
        }
    }
}

/// Type of a text construct element; a missing `type` means plain text.
pub(crate) fn text_type_of(element: &Element) -> std::result::Result<TextType, String> {
    match element.attribute_text(&TYPE) {
        None => Ok(TextType::Text),
        Some(value) => TextType::from_attribute(value).ok_or_else(|| value.to_string()),
    }
}

fn validate_text(element: &Element) -> std::result::Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidContent {
        element: element
            .id()
            .cloned()
            .unwrap_or(QName::of_static(Some(ATOM_NS), "content")),
        reason,
    };
    match text_type_of(element) {
        Err(unknown) => Err(invalid(format!("invalid type: {unknown}"))),
        Ok(TextType::Text | TextType::Html) => {
            if element.element_count() != 0 {
                return Err(invalid(
                    "child elements not allowed on text content".to_string(),
                ));
            }
            Ok(())
        }
        Ok(TextType::Xhtml) => {
            if !element.has_element(&DIV) {
                Err(invalid(
                    "xhtml text content must have a div element".to_string(),
                ))
            } else if element.element_count() != 1 {
                Err(invalid(
                    "xhtml text content must contain only a div element".to_string(),
                ))
            } else {
                Ok(())
            }
        }
    }
}

/// Registers the text construct, the `xhtml:div` wrapper and narrowed text content.
pub fn register_metadata(registry: &MetadataRegistry) -> Result<()> {
    if registry.is_registered(&TEXT_CONSTRUCT) {
        return Ok(());
    }

    registry.register(ElementMetadata::generic(DIV))?;
    content::register_metadata(registry)?;

    registry.register(
        ElementMetadata::builder(TEXT_CONSTRUCT)
            .attribute(TYPE)
            .attribute(XML_LANG)
            .child(DIV, Cardinality::Single)
            .validator(validate_text)
            .build(),
    )?;

    let base = registry.lookup(&content::CONTENT)?;
    registry.register(
        ElementMetadata::builder(TEXT_CONTENT)
            .inherit(&base)
            .extension_policy(ExtensionPolicy::Declared)
            .validator(validate_text)
            .build(),
    )?;
    registry.adapt(&content::CONTENT, TEXT_CONTENT_DISCRIMINATOR, &TEXT_CONTENT)?;
    Ok(())
}

bound_element!(
    /// A text construct or inline text content.
    TextContent,
    TEXT_CONTENT,
    register_metadata
);

impl TextContent {
    fn build(key: ElementKey, text_type: TextType, text: &str) -> Result<Self> {
        let mut element = Element::with_value(key, text)?;
        if text_type != TextType::Text {
            element.set_attribute(TYPE, text_type.as_str())?;
        }
        Ok(Self(element))
    }

    /// Plain text `atom:content`.
    pub fn text(text: &str) -> Result<Self> {
        Self::build(TEXT_CONTENT, TextType::Text, text)
    }

    /// Escaped HTML `atom:content`.
    pub fn html(html: &str) -> Result<Self> {
        Self::build(TEXT_CONTENT, TextType::Html, html)
    }

    /// XHTML `atom:content` wrapping the given `xhtml:div`.
    pub fn xhtml(div: Element) -> Result<Self> {
        let mut element = Element::new(TEXT_CONTENT);
        element.set_attribute(TYPE, TextType::Xhtml.as_str())?;
        element.set_element(DIV, div)?;
        Ok(Self(element))
    }

    /// Plain text construct under another name, such as [`TITLE`].
    pub fn named(key: &ElementKey, text: &str) -> Result<Self> {
        Self::build(key.clone(), TextType::Text, text)
    }

    /// The declared type; `None` for an unrecognized `type` attribute.
    pub fn text_type(&self) -> Option<TextType> {
        text_type_of(&self.0).ok()
    }

    pub fn plain_text(&self) -> Option<&str> {
        self.0.text_value()
    }

    pub fn div(&self) -> Option<&Element> {
        self.0.element(&DIV)
    }

    pub fn lang(&self) -> Option<&str> {
        self.0.attribute_text(&XML_LANG)
    }
}
