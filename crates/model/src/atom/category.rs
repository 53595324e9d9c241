//! `atom:category`, including the GData kind category.

use crate::atom::{XML_LANG, bound_element};
use crate::element::Element;
use crate::error::Result;
use crate::key::{AttributeKey, ElementKey, ElementKind};
use crate::metadata::ElementMetadata;
use crate::namespace::{ATOM_NS, QName};
use crate::registry::MetadataRegistry;
use crate::value::ValueType;

/// Scheme of categories that name the kind of an entry or feed.
pub const KIND_SCHEME: &str = "http://schemas.google.com/g/2005#kind";

pub const CATEGORY: ElementKey = ElementKey::new(
    QName::of_static(Some(ATOM_NS), "category"),
    ValueType::Void,
    ElementKind::new("atom:category"),
);

pub const TERM: AttributeKey = AttributeKey::text("term");
pub const SCHEME: AttributeKey = AttributeKey::text("scheme");
pub const LABEL: AttributeKey = AttributeKey::text("label");

pub fn register_metadata(registry: &MetadataRegistry) -> Result<()> {
    registry.register(
        ElementMetadata::builder(CATEGORY)
            .required_attribute(TERM)
            .attribute(SCHEME)
            .attribute(LABEL)
            .attribute(XML_LANG)
            .build(),
    )?;
    Ok(())
}

bound_element!(
    /// A category. Equal categories collapse in an entry's category set.
    Category,
    CATEGORY,
    register_metadata
);

impl Category {
    pub fn new(scheme: Option<&str>, term: &str) -> Result<Self> {
        let mut element = Element::new(CATEGORY);
        element.set_attribute(TERM, term)?;
        if let Some(scheme) = scheme {
            element.set_attribute(SCHEME, scheme)?;
        }
        Ok(Self(element))
    }

    /// Category declaring the kind of an entry or feed.
    pub fn kind(term: &str) -> Result<Self> {
        Self::new(Some(KIND_SCHEME), term)
    }

    pub fn with_label(mut self, label: &str) -> Result<Self> {
        self.0.set_attribute(LABEL, label)?;
        Ok(self)
    }

    pub fn term(&self) -> Option<&str> {
        self.0.attribute_text(&TERM)
    }

    pub fn scheme(&self) -> Option<&str> {
        self.0.attribute_text(&SCHEME)
    }

    pub fn label(&self) -> Option<&str> {
        self.0.attribute_text(&LABEL)
    }

    pub fn is_kind(&self) -> bool {
        self.scheme() == Some(KIND_SCHEME)
    }
}

/// Kind named by `element`: its `gd:kind` attribute, else a single kind category.
///
/// Several distinct kind categories are ambiguous and yield `None`.
pub(crate) fn kind_of(element: &Element) -> Option<String> {
    if let Some(kind) = element.attribute_text(&crate::atom::KIND) {
        return Some(kind.to_string());
    }
    let mut terms = element
        .elements(&CATEGORY)
        .iter()
        .filter(|c| c.attribute_text(&SCHEME) == Some(KIND_SCHEME))
        .filter_map(|c| c.attribute_text(&TERM));
    let first = terms.next()?;
    if terms.any(|t| t != first) {
        tracing::debug!(first, "ambiguous kind categories");
        return None;
    }
    Some(first.to_string())
}
