//! Atom person constructs: `author` and `contributor`.

use crate::atom::{XML_LANG, bound_element, child_text, register_values, set_child_value};
use crate::element::Element;
use crate::error::Result;
use crate::key::{ElementKey, ElementKind};
use crate::metadata::{Cardinality, ElementMetadata};
use crate::namespace::{ATOM_NS, QName};
use crate::registry::MetadataRegistry;
use crate::value::ValueType;

pub const PERSON_KIND: ElementKind = ElementKind::new("atom:person");

/// Metadata shared by `author` and `contributor`.
pub const PERSON: ElementKey = ElementKey::construct(ValueType::Void, PERSON_KIND);

pub const AUTHOR: ElementKey = person_key("author");
pub const CONTRIBUTOR: ElementKey = person_key("contributor");

pub const NAME: ElementKey = ElementKey::new(
    QName::of_static(Some(ATOM_NS), "name"),
    ValueType::Text,
    ElementKind::VALUE,
);
pub const URI: ElementKey = ElementKey::new(
    QName::of_static(Some(ATOM_NS), "uri"),
    ValueType::Text,
    ElementKind::VALUE,
);
pub const EMAIL: ElementKey = ElementKey::new(
    QName::of_static(Some(ATOM_NS), "email"),
    ValueType::Text,
    ElementKind::VALUE,
);

const fn person_key(local_name: &'static str) -> ElementKey {
    ElementKey::new(QName::of_static(Some(ATOM_NS), local_name), ValueType::Void, PERSON_KIND)
}

pub fn register_metadata(registry: &MetadataRegistry) -> Result<()> {
    if registry.is_registered(&PERSON) {
        return Ok(());
    }
    register_values(registry, &[NAME, URI, EMAIL])?;
    registry.register(
        ElementMetadata::builder(PERSON)
            .attribute(XML_LANG)
            .required_child(NAME, Cardinality::Single)
            .child(URI, Cardinality::Single)
            .child(EMAIL, Cardinality::Single)
            .build(),
    )?;
    Ok(())
}

bound_element!(
    /// An author or contributor.
    Person,
    AUTHOR,
    register_metadata
);

impl Person {
    /// New `atom:author`.
    pub fn author(name: &str) -> Result<Self> {
        Self::named(AUTHOR, name)
    }

    /// New `atom:contributor`.
    pub fn contributor(name: &str) -> Result<Self> {
        Self::named(CONTRIBUTOR, name)
    }

    fn named(key: ElementKey, name: &str) -> Result<Self> {
        let mut element = Element::new(key);
        set_child_value(&mut element, &NAME, name)?;
        Ok(Self(element))
    }

    pub fn name(&self) -> Option<&str> {
        child_text(&self.0, &NAME)
    }

    pub fn uri(&self) -> Option<&str> {
        child_text(&self.0, &URI)
    }

    pub fn set_uri(&mut self, uri: &str) -> Result<()> {
        set_child_value(&mut self.0, &URI, uri)
    }

    pub fn email(&self) -> Option<&str> {
        child_text(&self.0, &EMAIL)
    }

    pub fn set_email(&mut self, email: &str) -> Result<()> {
        set_child_value(&mut self.0, &EMAIL, email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::BoundElement;
    use crate::validate::validate;

    #[test]
    fn test_person_requires_name() {
        let registry = MetadataRegistry::new();
        register_metadata(&registry).unwrap();
        let err = validate(&Element::new(CONTRIBUTOR), &registry).unwrap_err();
        assert!(err.to_string().contains("name"));

        let mut author = Person::author("Ada").unwrap();
        author.set_email("ada@example.com").unwrap();
        assert!(validate(author.as_element(), &registry).is_ok());
        assert_eq!(author.email(), Some("ada@example.com"));
        assert_eq!(author.as_element().id(), AUTHOR.id());
    }
}
