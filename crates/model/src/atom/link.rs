//! `atom:link`.

use crate::atom::{ETAG, bound_element};
use crate::element::Element;
use crate::error::Result;
use crate::key::{AttributeKey, ElementKey, ElementKind};
use crate::metadata::{Discriminator, ElementMetadata};
use crate::namespace::{ATOM_NS, QName};
use crate::registry::MetadataRegistry;
use crate::value::ValueType;

/// Common link relations.
pub mod rel {
    pub const ALTERNATE: &str = "alternate";
    pub const SELF: &str = "self";
    pub const EDIT: &str = "edit";
    pub const EDIT_MEDIA: &str = "edit-media";
    pub const ENCLOSURE: &str = "enclosure";
    pub const RELATED: &str = "related";
    pub const VIA: &str = "via";
    pub const NEXT: &str = "next";
    pub const PREVIOUS: &str = "previous";
    pub const FEED: &str = "http://schemas.google.com/g/2005#feed";
    pub const POST: &str = "http://schemas.google.com/g/2005#post";
    pub const BATCH: &str = "http://schemas.google.com/g/2005#batch";
}

/// Links narrow on their `rel` value; callers may register adaptations for it.
pub const LINK: ElementKey = ElementKey::new(
    QName::of_static(Some(ATOM_NS), "link"),
    ValueType::Void,
    ElementKind::new("atom:link"),
);

pub const HREF: AttributeKey = AttributeKey::text("href");
pub const REL: AttributeKey = AttributeKey::text("rel");
pub const TYPE: AttributeKey = AttributeKey::text("type");
pub const HREFLANG: AttributeKey = AttributeKey::text("hreflang");
pub const TITLE: AttributeKey = AttributeKey::text("title");
pub const LENGTH: AttributeKey = AttributeKey::new(QName::unqualified("length"), ValueType::I64);

pub fn register_metadata(registry: &MetadataRegistry) -> Result<()> {
    registry.register(
        ElementMetadata::builder(LINK)
            .required_attribute(HREF)
            .attribute(REL)
            .attribute(TYPE)
            .attribute(HREFLANG)
            .attribute(TITLE)
            .attribute(LENGTH)
            .attribute(ETAG)
            .discriminator(Discriminator::Attribute(REL))
            .build(),
    )?;
    Ok(())
}

bound_element!(
    /// A link to a related resource.
    Link,
    LINK,
    register_metadata
);

impl Link {
    pub fn new(rel: &str, mime_type: Option<&str>, href: &str) -> Result<Self> {
        let mut element = Element::new(LINK);
        element.set_attribute(REL, rel)?;
        if let Some(mime_type) = mime_type {
            element.set_attribute(TYPE, mime_type)?;
        }
        element.set_attribute(HREF, href)?;
        Ok(Self(element))
    }

    pub fn href(&self) -> Option<&str> {
        self.0.attribute_text(&HREF)
    }

    /// The relation; Atom defaults a missing `rel` to `alternate`.
    pub fn rel(&self) -> &str {
        self.0.attribute_text(&REL).unwrap_or(rel::ALTERNATE)
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.0.attribute_text(&TYPE)
    }

    pub fn title(&self) -> Option<&str> {
        self.0.attribute_text(&TITLE)
    }

    pub fn length(&self) -> Option<i64> {
        self.0.attribute(&LENGTH).and_then(|v| v.as_i64())
    }

    /// True if `rel` and `mime_type` match; `None` matches anything.
    pub fn matches(&self, rel: Option<&str>, mime_type: Option<&str>) -> bool {
        rel.is_none_or(|r| r == self.rel()) && mime_type.is_none_or(|t| Some(t) == self.mime_type())
    }
}

/// First link under `element` matching `rel` and `mime_type`.
pub(crate) fn find_link(element: &Element, rel: Option<&str>, mime_type: Option<&str>) -> Option<Link> {
    crate::atom::children_as::<Link>(element, &LINK)
        .into_iter()
        .find(|link| link.matches(rel, mime_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches() {
        let link = Link::new(rel::EDIT, Some("application/atom+xml"), "http://x/1").unwrap();
        assert!(link.matches(Some("edit"), None));
        assert!(link.matches(None, Some("application/atom+xml")));
        assert!(!link.matches(Some("self"), None));
        assert!(!link.matches(Some("edit"), Some("text/html")));
    }

    #[test]
    fn test_default_rel() {
        let mut element = Element::new(LINK);
        element.set_attribute(HREF, "http://x/").unwrap();
        let link = Link(element);
        assert_eq!(link.rel(), rel::ALTERNATE);
        assert!(link.matches(Some(rel::ALTERNATE), None));
    }
}
