//! `atom:entry`.

use crate::atom::category::{self, CATEGORY, kind_of};
use crate::atom::content::{self, CONTENT, Content};
use crate::atom::feed::{self, SOURCE, Source};
use crate::atom::person::{self, AUTHOR, CONTRIBUTOR};
use crate::atom::text::{self, RIGHTS, SUMMARY, TITLE, TextContent};
use crate::atom::{
    AtomElement, BoundElement, EDITED, ETAG, FIELDS, ID, KIND, PUBLISHED, UPDATED, bound_element,
    child_text, child_timestamp, link, register_values, set_child_value,
};
use crate::element::Element;
use crate::error::Result;
use crate::key::{ElementKey, ElementKind};
use crate::metadata::{Cardinality, Discriminator, ElementMetadata};
use crate::namespace::{ATOM_NS, QName};
use crate::registry::MetadataRegistry;
use crate::value::{Timestamp, ValueType};

pub const ENTRY_KIND: ElementKind = ElementKind::new("atom:entry");

/// Entries narrow on their kind: `gd:kind` or a kind category.
pub const ENTRY: ElementKey = ElementKey::new(
    QName::of_static(Some(ATOM_NS), "entry"),
    ValueType::Void,
    ENTRY_KIND,
);

/// Metadata builder for `atom:entry`, for kinds that extend it.
pub fn entry_metadata(key: ElementKey) -> crate::metadata::ElementMetadataBuilder {
    ElementMetadata::builder(key)
        .attribute(ETAG)
        .attribute(KIND)
        .attribute(FIELDS)
        .child(ID, Cardinality::Single)
        .child(PUBLISHED, Cardinality::Single)
        .child(UPDATED, Cardinality::Single)
        .child(EDITED, Cardinality::Single)
        .child(CATEGORY, Cardinality::Set)
        .child(TITLE, Cardinality::Single)
        .child(SUMMARY, Cardinality::Single)
        .child(RIGHTS, Cardinality::Single)
        .child(CONTENT, Cardinality::Single)
        .child(link::LINK, Cardinality::Multiple)
        .child(AUTHOR, Cardinality::Multiple)
        .child(CONTRIBUTOR, Cardinality::Multiple)
        .child(SOURCE, Cardinality::Single)
        .discriminator(Discriminator::Custom(kind_of))
}

pub fn register_metadata(registry: &MetadataRegistry) -> Result<()> {
    if registry.is_registered(&ENTRY) {
        return Ok(());
    }

    register_values(registry, &[ID, PUBLISHED, UPDATED, EDITED])?;
    category::register_metadata(registry)?;
    link::register_metadata(registry)?;
    person::register_metadata(registry)?;
    content::register_metadata(registry)?;
    text::register_metadata(registry)?;
    feed::register_source(registry)?;

    registry.register(entry_metadata(ENTRY).build())?;
    Ok(())
}

bound_element!(
    /// An Atom entry.
    Entry,
    ENTRY,
    register_metadata
);

impl AtomElement for Entry {}

impl Default for Entry {
    fn default() -> Self {
        Self::new()
    }
}

impl Entry {
    pub fn new() -> Self {
        Self(Element::new(ENTRY))
    }

    /// Wraps an element bound to any entry kind, including narrowed ones.
    pub fn from_any(element: Element) -> std::result::Result<Self, Element> {
        if element.id() == ENTRY.id() {
            Ok(Self(element))
        } else {
            Err(element)
        }
    }

    pub fn published(&self) -> Option<&Timestamp> {
        child_timestamp(&self.0, &PUBLISHED)
    }

    pub fn set_published(&mut self, published: Timestamp) -> Result<()> {
        set_child_value(&mut self.0, &PUBLISHED, published)
    }

    pub fn edited(&self) -> Option<&Timestamp> {
        child_timestamp(&self.0, &EDITED)
    }

    pub fn summary(&self) -> Option<&str> {
        child_text(&self.0, &SUMMARY)
    }

    pub fn set_summary(&mut self, summary: &str) -> Result<()> {
        let summary = TextContent::named(&SUMMARY, summary)?;
        self.0.set_element(SUMMARY, summary.into_element())
    }

    pub fn content(&self) -> Option<Content> {
        self.0
            .element(&CONTENT)
            .map(|e| Content::from_element(e.clone()))
    }

    pub fn set_content(&mut self, content: impl Into<Content>) -> Result<()> {
        self.0.set_element(CONTENT, content.into().into_element())
    }

    pub fn source(&self) -> Option<Source> {
        self.0
            .element(&SOURCE)
            .and_then(|e| Source::from_element(e.clone()).ok())
    }

    pub fn etag(&self) -> Option<&str> {
        self.0.attribute_text(&ETAG)
    }

    pub fn set_etag(&mut self, etag: &str) -> Result<()> {
        self.0.set_attribute(ETAG, etag)
    }

    /// The kind this entry declares, if unambiguous.
    pub fn kind(&self) -> Option<String> {
        kind_of(&self.0)
    }

    pub fn edit_link(&self) -> Option<crate::atom::Link> {
        self.link(Some(link::rel::EDIT), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::{Category, Link, OutOfLineContent, Person, rel};
    use crate::narrow::narrow;
    use crate::validate::validate;

    fn registry() -> MetadataRegistry {
        let registry = MetadataRegistry::new();
        register_metadata(&registry).unwrap();
        registry
    }

    #[test]
    fn test_build_entry() {
        let registry = registry();
        let mut entry = Entry::new();
        entry.set_id("urn:entry:1").unwrap();
        entry.set_title("First").unwrap();
        entry.set_summary("Summary").unwrap();
        entry.add_author(Person::author("Ada").unwrap()).unwrap();
        entry
            .add_link(Link::new(rel::EDIT, None, "http://example.com/1").unwrap())
            .unwrap();
        entry
            .set_content(OutOfLineContent::new("http://example.com/1.png", Some("image/png")).unwrap())
            .unwrap();

        assert!(validate(entry.as_element(), &registry).is_ok());
        assert_eq!(entry.id(), Some("urn:entry:1"));
        assert_eq!(entry.title(), Some("First"));
        assert_eq!(entry.authors()[0].name(), Some("Ada"));
        assert_eq!(
            entry.edit_link().and_then(|l| l.href().map(str::to_string)).as_deref(),
            Some("http://example.com/1")
        );
        assert!(matches!(entry.content(), Some(Content::OutOfLine(_))));
    }

    #[test]
    fn test_entry_narrows_on_kind_category() {
        let registry = registry();
        let event = ENTRY.with_kind(ElementKind::new("test:event"));
        registry
            .register(ElementMetadata::builder(event.clone()).inherit(&registry.lookup(&ENTRY).unwrap()).build())
            .unwrap();
        registry.adapt(&ENTRY, "event", &event).unwrap();

        let mut entry = Entry::new();
        entry.add_category(Category::kind("event").unwrap()).unwrap();
        let narrowed = narrow(entry.into_element(), &registry);
        assert_eq!(narrowed.key(), &event);
        assert!(Entry::from_element(narrowed.clone()).is_err());
        let entry = Entry::from_any(narrowed).unwrap();
        assert_eq!(entry.kind().as_deref(), Some("event"));
    }
}
