//! Element and attribute identities.

use std::fmt;

use crate::namespace::QName;
use crate::value::ValueType;

/// Tag naming the bound implementation of an element.
///
/// Two keys with the same name and different kinds are separate registry
/// entries; narrowing moves an element from one kind to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKind(&'static str);

impl ElementKind {
    /// Schema-less element with an open extension bag.
    pub const GENERIC: ElementKind = ElementKind("element");

    /// Element that carries only a text value, like `atom:id`.
    pub const VALUE: ElementKind = ElementKind("value");

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Identity of an element: name, text value type and bound kind.
///
/// A key without a name is a *construct*: metadata shared by every
/// concrete element with the same value type and kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKey {
    id: Option<QName>,
    datatype: ValueType,
    kind: ElementKind,
}

impl ElementKey {
    pub const fn new(id: QName, datatype: ValueType, kind: ElementKind) -> Self {
        Self {
            id: Some(id),
            datatype,
            kind,
        }
    }

    /// Creates an unnamed construct key.
    pub const fn construct(datatype: ValueType, kind: ElementKind) -> Self {
        Self {
            id: None,
            datatype,
            kind,
        }
    }

    /// Generic key for an element that has no registered metadata.
    pub fn generic(id: QName, datatype: ValueType) -> Self {
        Self::new(id, datatype, ElementKind::GENERIC)
    }

    pub fn id(&self) -> Option<&QName> {
        self.id.as_ref()
    }

    pub fn datatype(&self) -> ValueType {
        self.datatype
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn is_construct(&self) -> bool {
        self.id.is_none()
    }

    /// The construct key this key falls back to in the registry.
    pub fn to_construct(&self) -> Self {
        Self::construct(self.datatype, self.kind)
    }

    /// Same datatype and kind under another name.
    pub fn with_id(&self, id: QName) -> Self {
        Self::new(id, self.datatype, self.kind)
    }

    /// Same name and datatype, different kind.
    pub fn with_kind(&self, kind: ElementKind) -> Self {
        Self {
            id: self.id.clone(),
            datatype: self.datatype,
            kind,
        }
    }

    pub fn matches_id(&self, name: &QName) -> bool {
        self.id.as_ref() == Some(name)
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}[{}, {}]", id, self.datatype, self.kind),
            None => write!(f, "<construct>[{}, {}]", self.datatype, self.kind),
        }
    }
}

/// Identity of an attribute: name and value type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeKey {
    id: QName,
    datatype: ValueType,
}

impl AttributeKey {
    pub const fn new(id: QName, datatype: ValueType) -> Self {
        Self { id, datatype }
    }

    /// Unqualified text attribute, the most common shape.
    pub const fn text(local_name: &'static str) -> Self {
        Self::new(QName::unqualified(local_name), ValueType::Text)
    }

    pub fn id(&self) -> &QName {
        &self.id
    }

    pub fn datatype(&self) -> ValueType {
        self.datatype
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}[{}]", self.id, self.datatype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::ATOM_NS;

    const TITLE: ElementKey = ElementKey::new(
        QName::of_static(Some(ATOM_NS), "title"),
        ValueType::Text,
        ElementKind::new("atom:text"),
    );

    #[test]
    fn test_kind_distinguishes_keys() {
        let other = TITLE.with_kind(ElementKind::GENERIC);
        assert_ne!(TITLE, other);
        assert_eq!(TITLE.id(), other.id());
    }

    #[test]
    fn test_construct_fallback_key() {
        let construct = TITLE.to_construct();
        assert!(construct.is_construct());
        assert_eq!(construct.datatype(), ValueType::Text);
        assert_eq!(construct.kind(), TITLE.kind());
        assert_eq!(construct.with_id(QName::of_static(Some(ATOM_NS), "title")), TITLE);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            TITLE.to_string(),
            "{http://www.w3.org/2005/Atom}title[text, atom:text]"
        );
        assert_eq!(AttributeKey::text("href").to_string(), "@href[text]");
    }
}
