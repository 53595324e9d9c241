//! `atom:feed` and `atom:source`.

use crate::atom::category::{self, CATEGORY, kind_of};
use crate::atom::entry::{self, ENTRY, Entry};
use crate::atom::person::{self, AUTHOR, CONTRIBUTOR};
use crate::atom::text::{self, RIGHTS, SUBTITLE, TITLE};
use crate::atom::{
    AtomElement, BoundElement, ETAG, FIELDS, GENERATOR, ICON, ID, ITEMS_PER_PAGE, KIND, LOGO,
    START_INDEX, TOTAL_RESULTS, UPDATED, XML_LANG, bound_element, child_i64, child_text, link,
    register_generator, register_values, set_child_value,
};
use crate::element::Element;
use crate::error::Result;
use crate::key::{ElementKey, ElementKind};
use crate::metadata::{Cardinality, Discriminator, ElementMetadata};
use crate::namespace::{ATOM_NS, QName};
use crate::registry::MetadataRegistry;
use crate::value::ValueType;

pub const FEED: ElementKey = ElementKey::new(
    QName::of_static(Some(ATOM_NS), "feed"),
    ValueType::Void,
    ElementKind::new("atom:feed"),
);

/// Feed metadata carried by an entry copied from another feed.
pub const SOURCE: ElementKey = ElementKey::new(
    QName::of_static(Some(ATOM_NS), "source"),
    ValueType::Void,
    ElementKind::new("atom:source"),
);

fn source_metadata(key: ElementKey) -> crate::metadata::ElementMetadataBuilder {
    ElementMetadata::builder(key)
        .attribute(XML_LANG)
        .child(AUTHOR, Cardinality::Multiple)
        .child(CATEGORY, Cardinality::Set)
        .child(CONTRIBUTOR, Cardinality::Multiple)
        .child(GENERATOR, Cardinality::Single)
        .child(ICON, Cardinality::Single)
        .child(ID, Cardinality::Single)
        .child(link::LINK, Cardinality::Multiple)
        .child(LOGO, Cardinality::Single)
        .child(RIGHTS, Cardinality::Single)
        .child(SUBTITLE, Cardinality::Single)
        .child(TITLE, Cardinality::Single)
        .child(UPDATED, Cardinality::Single)
}

pub(crate) fn register_source(registry: &MetadataRegistry) -> Result<()> {
    if registry.is_registered(&SOURCE) {
        return Ok(());
    }
    register_values(registry, &[ICON, ID, LOGO, UPDATED])?;
    register_generator(registry)?;
    category::register_metadata(registry)?;
    link::register_metadata(registry)?;
    person::register_metadata(registry)?;
    text::register_metadata(registry)?;
    registry.register(source_metadata(SOURCE).build())?;
    Ok(())
}

/// Metadata builder for `atom:feed`, for kinds that extend it.
pub fn feed_metadata(key: ElementKey) -> crate::metadata::ElementMetadataBuilder {
    source_metadata(key)
        .attribute(ETAG)
        .attribute(KIND)
        .attribute(FIELDS)
        .child(TOTAL_RESULTS, Cardinality::Single)
        .child(START_INDEX, Cardinality::Single)
        .child(ITEMS_PER_PAGE, Cardinality::Single)
        .child(ENTRY, Cardinality::Multiple)
        .discriminator(Discriminator::Custom(kind_of))
}

pub fn register_metadata(registry: &MetadataRegistry) -> Result<()> {
    if registry.is_registered(&FEED) {
        return Ok(());
    }
    register_source(registry)?;
    register_values(registry, &[TOTAL_RESULTS, START_INDEX, ITEMS_PER_PAGE])?;
    entry::register_metadata(registry)?;
    registry.register(feed_metadata(FEED).build())?;
    Ok(())
}

bound_element!(
    /// The `atom:source` of an entry.
    Source,
    SOURCE,
    register_source
);

impl AtomElement for Source {}

bound_element!(
    /// An Atom feed.
    Feed,
    FEED,
    register_metadata
);

impl AtomElement for Feed {}

impl Default for Feed {
    fn default() -> Self {
        Self::new()
    }
}

impl Feed {
    pub fn new() -> Self {
        Self(Element::new(FEED))
    }

    /// Wraps an element bound to any feed kind, including narrowed ones.
    pub fn from_any(element: Element) -> std::result::Result<Self, Element> {
        if element.id() == FEED.id() {
            Ok(Self(element))
        } else {
            Err(element)
        }
    }

    pub fn subtitle(&self) -> Option<&str> {
        child_text(&self.0, &SUBTITLE)
    }

    pub fn generator(&self) -> Option<&str> {
        child_text(&self.0, &GENERATOR)
    }

    /// Entries bound into the feed element itself, of every entry kind.
    pub fn entries(&self) -> Vec<Entry> {
        self.0
            .elements(&ENTRY)
            .iter()
            .filter_map(|e| Entry::from_any(e.clone()).ok())
            .collect()
    }

    pub fn add_entry(&mut self, entry: Entry) -> Result<()> {
        self.0.add_element(ENTRY, entry.into_element())
    }

    pub fn total_results(&self) -> Option<i64> {
        child_i64(&self.0, &TOTAL_RESULTS)
    }

    pub fn set_total_results(&mut self, total: i32) -> Result<()> {
        set_child_value(&mut self.0, &TOTAL_RESULTS, total)
    }

    pub fn start_index(&self) -> Option<i64> {
        child_i64(&self.0, &START_INDEX)
    }

    pub fn set_start_index(&mut self, index: i32) -> Result<()> {
        set_child_value(&mut self.0, &START_INDEX, index)
    }

    pub fn items_per_page(&self) -> Option<i64> {
        child_i64(&self.0, &ITEMS_PER_PAGE)
    }

    pub fn set_items_per_page(&mut self, count: i32) -> Result<()> {
        set_child_value(&mut self.0, &ITEMS_PER_PAGE, count)
    }

    pub fn etag(&self) -> Option<&str> {
        self.0.attribute_text(&ETAG)
    }

    pub fn kind(&self) -> Option<String> {
        kind_of(&self.0)
    }

    pub fn next_link(&self) -> Option<crate::atom::Link> {
        self.link(Some(link::rel::NEXT), None)
    }
}
