//! Atom metadata and typed views.
//!
//! Each submodule declares the keys of one Atom construct together with a
//! `register_metadata` function that registers the construct and everything
//! it depends on. Typed wrappers such as [`Entry`] and [`Link`] are thin views
//! over a neutral [`Element`] and can be built from any element bound to the
//! matching kind.
//!
//! # Example
//!
//! ```
//! use gdata_model::atom::{self, AtomElement, Entry, Link};
//!
//! let mut entry = Entry::new();
//! entry.set_title("Hello")?;
//! entry.add_link(Link::new(atom::rel::ALTERNATE, Some("text/html"), "http://example.com/1")?)?;
//! assert_eq!(entry.title(), Some("Hello"));
//! assert_eq!(entry.html_link().and_then(|l| l.href().map(str::to_string)).as_deref(),
//!            Some("http://example.com/1"));
//! # Ok::<(), gdata_model::ModelError>(())
//! ```

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::element::Element;
use crate::error::Result;
use crate::key::{AttributeKey, ElementKey, ElementKind};
use crate::metadata::ElementMetadata;
use crate::namespace::{APP_NS, ATOM_NS, GD_NS, OPENSEARCH_NS, QName, XML_NS};
use crate::registry::MetadataRegistry;
use crate::value::{Timestamp, Value, ValueType};

pub mod category;
pub mod content;
pub mod entry;
pub mod feed;
pub mod link;
pub mod person;
pub mod text;

pub use category::Category;
pub use content::{Content, OutOfLineContent};
pub use entry::Entry;
pub use feed::{Feed, Source};
pub use link::{Link, rel};
pub use person::Person;
pub use text::{TextContent, TextType};

/// Media type of Atom documents.
pub const ATOM_CONTENT_TYPE: &str = "application/atom+xml";

/// `xml:lang`
pub const XML_LANG: AttributeKey =
    AttributeKey::new(QName::of_static(Some(XML_NS), "lang"), ValueType::Text);
/// `gd:etag`
pub const ETAG: AttributeKey =
    AttributeKey::new(QName::of_static(Some(GD_NS), "etag"), ValueType::Text);
/// `gd:kind`
pub const KIND: AttributeKey =
    AttributeKey::new(QName::of_static(Some(GD_NS), "kind"), ValueType::Text);
/// `gd:fields`, the partial-response selector a document was produced with.
pub const FIELDS: AttributeKey =
    AttributeKey::new(QName::of_static(Some(GD_NS), "fields"), ValueType::Text);

/// `atom:id`
pub const ID: ElementKey = value_key(ATOM_NS, "id", ValueType::Text);
/// `atom:updated`
pub const UPDATED: ElementKey = value_key(ATOM_NS, "updated", ValueType::DateTime);
/// `atom:published`
pub const PUBLISHED: ElementKey = value_key(ATOM_NS, "published", ValueType::DateTime);
/// `atom:icon`
pub const ICON: ElementKey = value_key(ATOM_NS, "icon", ValueType::Text);
/// `atom:logo`
pub const LOGO: ElementKey = value_key(ATOM_NS, "logo", ValueType::Text);
/// `app:edited`
pub const EDITED: ElementKey = value_key(APP_NS, "edited", ValueType::DateTime);
/// `openSearch:totalResults`
pub const TOTAL_RESULTS: ElementKey = value_key(OPENSEARCH_NS, "totalResults", ValueType::I32);
/// `openSearch:startIndex`
pub const START_INDEX: ElementKey = value_key(OPENSEARCH_NS, "startIndex", ValueType::I32);
/// `openSearch:itemsPerPage`
pub const ITEMS_PER_PAGE: ElementKey = value_key(OPENSEARCH_NS, "itemsPerPage", ValueType::I32);

/// `atom:generator`
pub const GENERATOR: ElementKey = ElementKey::new(
    QName::of_static(Some(ATOM_NS), "generator"),
    ValueType::Text,
    ElementKind::new("atom:generator"),
);
pub const GENERATOR_URI: AttributeKey = AttributeKey::text("uri");
pub const GENERATOR_VERSION: AttributeKey = AttributeKey::text("version");

const fn value_key(namespace: &'static str, local_name: &'static str, datatype: ValueType) -> ElementKey {
    ElementKey::new(
        QName::of_static(Some(namespace), local_name),
        datatype,
        ElementKind::VALUE,
    )
}

/// An element kind with a typed view.
pub trait BoundElement: Sized {
    /// Key used for new instances.
    fn key() -> ElementKey;

    /// Registers the metadata of this kind and its dependencies.
    fn register_metadata(registry: &MetadataRegistry) -> Result<()>;

    /// Wraps `element` if it is bound to this kind, otherwise hands it back.
    fn from_element(element: Element) -> std::result::Result<Self, Element>;

    fn as_element(&self) -> &Element;

    fn as_element_mut(&mut self) -> &mut Element;

    fn into_element(self) -> Element;
}

/// Accessors shared by entries, feeds and sources.
pub trait AtomElement: BoundElement {
    fn id(&self) -> Option<&str> {
        child_text(self.as_element(), &ID)
    }

    fn set_id(&mut self, id: &str) -> Result<()> {
        set_child_value(self.as_element_mut(), &ID, id)
    }

    /// Title text, whatever its `type`.
    fn title(&self) -> Option<&str> {
        child_text(self.as_element(), &text::TITLE)
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        let title = TextContent::named(&text::TITLE, title)?;
        self.as_element_mut()
            .set_element(text::TITLE, title.into_element())
    }

    fn title_content(&self) -> Option<TextContent> {
        self.as_element()
            .element(&text::TITLE)
            .and_then(|e| TextContent::from_element(e.clone()).ok())
    }

    fn updated(&self) -> Option<&Timestamp> {
        child_timestamp(self.as_element(), &UPDATED)
    }

    fn set_updated(&mut self, updated: Timestamp) -> Result<()> {
        set_child_value(self.as_element_mut(), &UPDATED, updated)
    }

    fn links(&self) -> Vec<Link> {
        children_as(self.as_element(), &link::LINK)
    }

    fn add_link(&mut self, link: Link) -> Result<()> {
        self.as_element_mut()
            .add_element(link::LINK, link.into_element())
    }

    /// First link matching `rel` and `mime_type`; `None` matches anything.
    fn link(&self, rel: Option<&str>, mime_type: Option<&str>) -> Option<Link> {
        link::find_link(self.as_element(), rel, mime_type)
    }

    fn html_link(&self) -> Option<Link> {
        self.link(Some(rel::ALTERNATE), Some("text/html"))
    }

    fn self_link(&self) -> Option<Link> {
        self.link(Some(rel::SELF), None)
    }

    fn authors(&self) -> Vec<Person> {
        children_as(self.as_element(), &person::AUTHOR)
    }

    fn add_author(&mut self, author: Person) -> Result<()> {
        self.as_element_mut()
            .add_element(person::AUTHOR, author.into_element())
    }

    fn contributors(&self) -> Vec<Person> {
        children_as(self.as_element(), &person::CONTRIBUTOR)
    }

    fn add_contributor(&mut self, contributor: Person) -> Result<()> {
        self.as_element_mut()
            .add_element(person::CONTRIBUTOR, contributor.into_element())
    }

    fn categories(&self) -> Vec<Category> {
        children_as(self.as_element(), &category::CATEGORY)
    }

    /// Adds a category unless an equal one is present.
    fn add_category(&mut self, category: Category) -> Result<bool> {
        self.as_element_mut()
            .insert_element(category::CATEGORY, category.into_element())
    }
}

/// Declares a newtype view over [`Element`] for one element kind.
macro_rules! bound_element {
    ($(#[$meta:meta])* $name:ident, $key:expr, $register:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(crate::element::Element);

        impl crate::atom::BoundElement for $name {
            fn key() -> crate::key::ElementKey {
                $key
            }

            fn register_metadata(
                registry: &crate::registry::MetadataRegistry,
            ) -> crate::error::Result<()> {
                ($register)(registry)
            }

            fn from_element(
                element: crate::element::Element,
            ) -> std::result::Result<Self, crate::element::Element> {
                if element.kind() == $key.kind() {
                    Ok(Self(element))
                } else {
                    Err(element)
                }
            }

            fn as_element(&self) -> &crate::element::Element {
                &self.0
            }

            fn as_element_mut(&mut self) -> &mut crate::element::Element {
                &mut self.0
            }

            fn into_element(self) -> crate::element::Element {
                self.0
            }
        }

        impl From<$name> for crate::element::Element {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}
pub(crate) use bound_element;

/// Registers all Atom metadata.
pub fn register_metadata(registry: &MetadataRegistry) -> Result<()> {
    feed::register_metadata(registry)?;
    entry::register_metadata(registry)?;
    Ok(())
}

static DEFAULT_REGISTRY: Lazy<Arc<MetadataRegistry>> = Lazy::new(|| {
    let registry = MetadataRegistry::new();
    if let Err(e) = register_metadata(&registry) {
        tracing::error!(error = %e, "failed to register Atom metadata");
    }
    Arc::new(registry)
});

/// Shared registry holding all Atom metadata.
///
/// Callers that declare their own element kinds should build a private
/// registry and [`merge`](MetadataRegistry::merge) this one into it, or
/// register their kinds here, since registration is additive.
pub fn default_registry() -> Arc<MetadataRegistry> {
    Arc::clone(&DEFAULT_REGISTRY)
}

pub(crate) fn register_values(registry: &MetadataRegistry, keys: &[ElementKey]) -> Result<()> {
    for key in keys {
        registry.register(ElementMetadata::builder(key.clone()).build())?;
    }
    Ok(())
}

pub(crate) fn register_generator(registry: &MetadataRegistry) -> Result<()> {
    registry.register(
        ElementMetadata::builder(GENERATOR)
            .attribute(GENERATOR_URI)
            .attribute(GENERATOR_VERSION)
            .build(),
    )?;
    Ok(())
}

pub(crate) fn child_text<'a>(element: &'a Element, key: &ElementKey) -> Option<&'a str> {
    element.element(key).and_then(Element::text_value)
}

pub(crate) fn child_timestamp<'a>(element: &'a Element, key: &ElementKey) -> Option<&'a Timestamp> {
    element
        .element(key)
        .and_then(Element::value)
        .and_then(Value::as_timestamp)
}

pub(crate) fn child_i64(element: &Element, key: &ElementKey) -> Option<i64> {
    element
        .element(key)
        .and_then(Element::value)
        .and_then(Value::as_i64)
}

pub(crate) fn set_child_value(
    element: &mut Element,
    key: &ElementKey,
    value: impl Into<Value>,
) -> Result<()> {
    let child = Element::with_value(key.clone(), value)?;
    element.set_element(key.clone(), child)
}

/// Typed views of the children under `key` that are bound to `T`'s kind.
pub(crate) fn children_as<T: BoundElement>(element: &Element, key: &ElementKey) -> Vec<T> {
    element
        .elements(key)
        .iter()
        .filter_map(|child| T::from_element(child.clone()).ok())
        .collect()
}
