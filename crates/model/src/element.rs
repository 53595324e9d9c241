//! The element graph.
//!
//! An [`Element`] is a generic node bound to an [`ElementKey`]. It owns its
//! attribute values, its child collections, an optional text value and an
//! [`ExtensionBag`] for content its metadata does not declare.
//!
//! Child collections are keyed by the declared child key and keep one of three
//! shapes ([`Children`]). The shape chosen for a key by the first insertion is
//! fixed for the lifetime of the element:
//!
//! ```
//! use gdata_model::element::Element;
//! use gdata_model::key::{ElementKey, ElementKind};
//! use gdata_model::namespace::QName;
//! use gdata_model::value::ValueType;
//!
//! let item = ElementKey::generic(QName::unqualified("item"), ValueType::Void);
//! let tag = ElementKey::new(QName::unqualified("tag"), ValueType::Text, ElementKind::VALUE);
//!
//! let mut element = Element::new(item);
//! element.add_element(tag.clone(), Element::with_value(tag.clone(), "a")?)?;
//! element.add_element(tag.clone(), Element::with_value(tag.clone(), "b")?)?;
//! assert_eq!(element.elements(&tag).len(), 2);
//! assert!(element.set_element(tag.clone(), Element::new(tag)).is_err());
//! # Ok::<(), gdata_model::ModelError>(())
//! ```

use std::collections::BTreeMap;

use crate::error::{ModelError, Result};
use crate::key::{AttributeKey, ElementKey, ElementKind};
use crate::metadata::{Cardinality, ElementMetadata};
use crate::namespace::QName;
use crate::value::{Value, ValueType, from_wire, to_wire};

/// Pseudo-key under which untyped text is kept in an [`ExtensionBag`].
pub const TEXT_PSEUDO_KEY: &str = "text()";

/// Insertion-ordered collection without equal members.
#[derive(Debug, Clone, Default)]
pub struct ElementSet {
    items: Vec<Element>,
}

impl ElementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `element` unless an equal member exists. Returns whether it was added.
    pub fn insert(&mut self, element: Element) -> bool {
        if self.contains(&element) {
            return false;
        }
        self.items.push(element);
        true
    }

    pub fn contains(&self, element: &Element) -> bool {
        self.items.iter().any(|e| e == element)
    }

    pub fn remove(&mut self, element: &Element) -> bool {
        let before = self.items.len();
        self.items.retain(|e| e != element);
        self.items.len() != before
    }

    pub fn as_slice(&self) -> &[Element] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.items.iter()
    }

    fn into_vec(self) -> Vec<Element> {
        self.items
    }
}

impl PartialEq for ElementSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.items.iter().all(|e| other.contains(e))
    }
}

impl FromIterator<Element> for ElementSet {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        let mut set = ElementSet::new();
        for element in iter {
            set.insert(element);
        }
        set
    }
}

/// The values stored under one child key.
#[derive(Debug, Clone, PartialEq)]
pub enum Children {
    Single(Box<Element>),
    List(Vec<Element>),
    Set(ElementSet),
}

impl Children {
    pub fn cardinality(&self) -> Cardinality {
        match self {
            Children::Single(_) => Cardinality::Single,
            Children::List(_) => Cardinality::Multiple,
            Children::Set(_) => Cardinality::Set,
        }
    }

    pub fn as_slice(&self) -> &[Element] {
        match self {
            Children::Single(element) => std::slice::from_ref(element.as_ref()),
            Children::List(elements) => elements,
            Children::Set(set) => set.as_slice(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.as_slice().iter()
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Applies `f` to every member, rebuilding sets so they stay de-duplicated.
    pub(crate) fn map_members<F>(self, mut f: F) -> Result<Children>
    where
        F: FnMut(Element) -> Result<Element>,
    {
        Ok(match self {
            Children::Single(element) => Children::Single(Box::new(f(*element)?)),
            Children::List(elements) => {
                Children::List(elements.into_iter().map(f).collect::<Result<_>>()?)
            }
            Children::Set(set) => Children::Set(
                set.into_vec()
                    .into_iter()
                    .map(f)
                    .collect::<Result<Vec<_>>>()?
                    .into_iter()
                    .collect(),
            ),
        })
    }

    fn for_each_mut(&mut self, mut f: impl FnMut(&mut Element)) {
        match self {
            Children::Single(element) => f(element),
            Children::List(elements) => elements.iter_mut().for_each(f),
            Children::Set(set) => set.items.iter_mut().for_each(f),
        }
    }
}

/// One run of mixed content: text, or an extension element by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MixedContent {
    Text(String),
    /// Index into [`ExtensionBag::elements`].
    Element(usize),
}

/// Content not covered by an element's static metadata.
///
/// Holds extension elements in document order and raw values under
/// pseudo-keys: `text()` for untyped text, and for undeclared attributes
/// `@name`, `@{uri}name` as produced by the parser, or `@alias:name` with an
/// alias of the namespace dictionary.
///
/// When text and extension elements are interleaved, as inside an
/// `xhtml:div`, their document order is kept as [`MixedContent`]. `text()`
/// then holds the concatenated text only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionBag {
    raw: BTreeMap<String, String>,
    elements: Vec<Element>,
    mixed: Vec<MixedContent>,
}

impl ExtensionBag {
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty() && self.elements.is_empty() && self.mixed.is_empty()
    }

    /// Interleaved text and extension elements in document order; empty
    /// unless the element held mixed content.
    pub fn mixed_content(&self) -> &[MixedContent] {
        &self.mixed
    }

    pub fn raw(&self, pseudo_key: &str) -> Option<&str> {
        self.raw.get(pseudo_key).map(String::as_str)
    }

    pub fn raw_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.raw.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Undeclared attributes as `(name, value)`, the name without its `@`.
    pub fn raw_attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.raw
            .iter()
            .filter_map(|(k, v)| k.strip_prefix('@').map(|name| (name, v.as_str())))
    }

    pub fn text(&self) -> Option<&str> {
        self.raw(TEXT_PSEUDO_KEY)
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn elements_named<'a>(&'a self, name: &'a QName) -> impl Iterator<Item = &'a Element> {
        self.elements.iter().filter(move |e| e.id() == Some(name))
    }
}

/// A node of the element graph.
#[derive(Debug, Clone)]
pub struct Element {
    key: ElementKey,
    attributes: BTreeMap<AttributeKey, Value>,
    children: Vec<(ElementKey, Children)>,
    value: Option<Value>,
    extensions: ExtensionBag,
    locked: bool,
}

impl Element {
    pub fn new(key: ElementKey) -> Self {
        Self {
            key,
            attributes: BTreeMap::new(),
            children: Vec::new(),
            value: None,
            extensions: ExtensionBag::default(),
            locked: false,
        }
    }

    /// Schema-less element with the given name.
    pub fn generic(name: QName) -> Self {
        Self::new(ElementKey::generic(name, ValueType::Void))
    }

    /// Element holding a text value.
    pub fn with_value(key: ElementKey, value: impl Into<Value>) -> Result<Self> {
        let mut element = Self::new(key);
        element.set_value(value)?;
        Ok(element)
    }

    pub fn key(&self) -> &ElementKey {
        &self.key
    }

    pub fn id(&self) -> Option<&QName> {
        self.key.id()
    }

    pub fn kind(&self) -> ElementKind {
        self.key.kind()
    }

    /// True when the element carries no attribute, child, value or extension.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
            && self.children.is_empty()
            && self.value.is_none()
            && self.extensions.is_empty()
    }

    /// Makes this element and its whole subtree immutable.
    pub fn lock(&mut self) {
        self.locked = true;
        for (_, children) in &mut self.children {
            children.for_each_mut(Element::lock);
        }
        for element in &mut self.extensions.elements {
            element.lock();
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    fn check_unlocked(&self) -> Result<()> {
        if self.locked {
            return Err(ModelError::Locked(self.key.to_string()));
        }
        Ok(())
    }

    // Attributes

    pub fn attribute(&self, key: &AttributeKey) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Text value of an attribute, if it holds text.
    pub fn attribute_text(&self, key: &AttributeKey) -> Option<&str> {
        self.attribute(key).and_then(Value::as_str)
    }

    /// Attribute with the given name, whatever its declared type.
    pub fn attribute_by_name(&self, name: &QName) -> Option<(&AttributeKey, &Value)> {
        self.attributes.iter().find(|(k, _)| k.id() == name)
    }

    pub fn has_attribute(&self, key: &AttributeKey) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&AttributeKey, &Value)> {
        self.attributes.iter()
    }

    pub fn set_attribute(&mut self, key: AttributeKey, value: impl Into<Value>) -> Result<()> {
        self.check_unlocked()?;
        let value = value.into();
        if value.value_type() != key.datatype() {
            return Err(ModelError::TypeMismatch {
                name: key.id().to_string(),
                expected: key.datatype(),
                found: value.value_type(),
            });
        }
        self.attributes.insert(key, value);
        Ok(())
    }

    pub fn remove_attribute(&mut self, key: &AttributeKey) -> Result<Option<Value>> {
        self.check_unlocked()?;
        Ok(self.attributes.remove(key))
    }

    // Text value

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn text_value(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<()> {
        self.check_unlocked()?;
        let value = value.into();
        if value.value_type() != self.key.datatype() {
            return Err(ModelError::TypeMismatch {
                name: self.key.to_string(),
                expected: self.key.datatype(),
                found: value.value_type(),
            });
        }
        self.value = Some(value);
        Ok(())
    }

    pub fn clear_value(&mut self) -> Result<Option<Value>> {
        self.check_unlocked()?;
        Ok(self.value.take())
    }

    // Children

    fn position(&self, key: &ElementKey) -> Option<usize> {
        self.children.iter().position(|(k, _)| k == key)
    }

    /// Child collections in first-insertion order.
    pub fn children(&self) -> impl Iterator<Item = (&ElementKey, &Children)> {
        self.children.iter().map(|(k, c)| (k, c))
    }

    pub fn child_collection(&self, key: &ElementKey) -> Option<&Children> {
        self.children.iter().find(|(k, _)| k == key).map(|(_, c)| c)
    }

    /// First child under `key`, whatever its cardinality.
    pub fn element(&self, key: &ElementKey) -> Option<&Element> {
        self.child_collection(key).and_then(|c| c.as_slice().first())
    }

    /// All children under `key`. Empty when there are none.
    pub fn elements(&self, key: &ElementKey) -> &[Element] {
        self.child_collection(key).map_or(&[][..], Children::as_slice)
    }

    /// Mutable access to a single child or the first member of a list.
    ///
    /// Set members are not handed out mutably since editing them could
    /// break de-duplication; remove and re-insert instead.
    pub fn element_mut(&mut self, key: &ElementKey) -> Option<&mut Element> {
        let index = self.position(key)?;
        match &mut self.children[index].1 {
            Children::Single(element) => Some(element.as_mut()),
            Children::List(elements) => elements.first_mut(),
            Children::Set(_) => None,
        }
    }

    pub fn has_element(&self, key: &ElementKey) -> bool {
        self.child_collection(key).is_some_and(|c| !c.is_empty())
    }

    /// Number of child elements across all keys.
    pub fn element_count(&self) -> usize {
        self.children.iter().map(|(_, c)| c.len()).sum()
    }

    /// Sets the single child under `key`, replacing any previous one.
    pub fn set_element(&mut self, key: ElementKey, element: Element) -> Result<()> {
        self.check_unlocked()?;
        match self.position(&key) {
            Some(index) => match &mut self.children[index].1 {
                Children::Single(existing) => {
                    **existing = element;
                    Ok(())
                }
                other => Err(mismatch(&key, other, Cardinality::Single)),
            },
            None => {
                self.children.push((key, Children::Single(Box::new(element))));
                Ok(())
            }
        }
    }

    /// Appends to the ordered list under `key`.
    pub fn add_element(&mut self, key: ElementKey, element: Element) -> Result<()> {
        self.check_unlocked()?;
        match self.position(&key) {
            Some(index) => match &mut self.children[index].1 {
                Children::List(elements) => {
                    elements.push(element);
                    Ok(())
                }
                other => Err(mismatch(&key, other, Cardinality::Multiple)),
            },
            None => {
                self.children.push((key, Children::List(vec![element])));
                Ok(())
            }
        }
    }

    /// Inserts into the set under `key`. Returns false if an equal member was present.
    pub fn insert_element(&mut self, key: ElementKey, element: Element) -> Result<bool> {
        self.check_unlocked()?;
        match self.position(&key) {
            Some(index) => match &mut self.children[index].1 {
                Children::Set(set) => Ok(set.insert(element)),
                other => Err(mismatch(&key, other, Cardinality::Set)),
            },
            None => {
                let mut set = ElementSet::new();
                set.insert(element);
                self.children.push((key, Children::Set(set)));
                Ok(true)
            }
        }
    }

    /// Stores a child with the accessor matching `cardinality`.
    pub fn put_element(
        &mut self,
        cardinality: Cardinality,
        key: ElementKey,
        element: Element,
    ) -> Result<()> {
        match cardinality {
            Cardinality::Single => self.set_element(key, element),
            Cardinality::Multiple => self.add_element(key, element),
            Cardinality::Set => self.insert_element(key, element).map(|_| ()),
        }
    }

    /// Removes every child under `key`.
    pub fn remove_element(&mut self, key: &ElementKey) -> Result<Option<Children>> {
        self.check_unlocked()?;
        Ok(self
            .position(key)
            .map(|index| self.children.remove(index).1))
    }

    /// Removes one member of the list or set under `key`.
    pub fn remove_member(&mut self, key: &ElementKey, element: &Element) -> Result<bool> {
        self.check_unlocked()?;
        let Some(index) = self.position(key) else {
            return Ok(false);
        };
        let (removed, now_empty) = match &mut self.children[index].1 {
            Children::Single(existing) => {
                let hit = existing.as_ref() == element;
                (hit, hit)
            }
            Children::List(elements) => match elements.iter().position(|e| e == element) {
                Some(at) => {
                    elements.remove(at);
                    (true, elements.is_empty())
                }
                None => (false, false),
            },
            Children::Set(set) => {
                let hit = set.remove(element);
                (hit, set.is_empty())
            }
        };
        if now_empty {
            self.children.remove(index);
        }
        Ok(removed)
    }

    // Extensions

    pub fn extensions(&self) -> &ExtensionBag {
        &self.extensions
    }

    pub fn add_extension(&mut self, element: Element) -> Result<()> {
        self.check_unlocked()?;
        self.extensions.elements.push(element);
        Ok(())
    }

    pub fn remove_extensions(&mut self, name: &QName) -> Result<Vec<Element>> {
        self.check_unlocked()?;
        let (removed, kept): (Vec<Element>, Vec<Element>) = std::mem::take(&mut self.extensions.elements)
            .into_iter()
            .partition(|e| e.id() == Some(name));
        self.extensions.elements = kept;
        if !removed.is_empty() {
            self.extensions.mixed.clear();
        }
        Ok(removed)
    }

    /// Records the document order of text runs and extension elements.
    ///
    /// Extension elements not referenced by `content` are written after it.
    pub fn set_mixed_content(&mut self, content: Vec<MixedContent>) -> Result<()> {
        self.check_unlocked()?;
        self.extensions.mixed = content;
        Ok(())
    }

    pub fn set_raw(&mut self, pseudo_key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.check_unlocked()?;
        self.extensions.raw.insert(pseudo_key.into(), value.into());
        Ok(())
    }

    pub fn remove_raw(&mut self, pseudo_key: &str) -> Result<Option<String>> {
        self.check_unlocked()?;
        Ok(self.extensions.raw.remove(pseudo_key))
    }

    // Narrowing support

    /// Takes the child collections out, leaving none behind.
    pub(crate) fn take_children(&mut self) -> Vec<(ElementKey, Children)> {
        std::mem::take(&mut self.children)
    }

    pub(crate) fn restore_children(&mut self, children: Vec<(ElementKey, Children)>) {
        self.children = children;
    }

    pub(crate) fn take_extension_elements(&mut self) -> Vec<Element> {
        std::mem::take(&mut self.extensions.elements)
    }

    pub(crate) fn restore_extension_elements(&mut self, elements: Vec<Element>) {
        self.extensions.elements = elements;
    }

    /// Moves extension elements that `metadata` declares as children into
    /// their declared slots.
    pub(crate) fn promote_extensions(&mut self, metadata: &ElementMetadata) -> Result<()> {
        self.check_unlocked()?;
        let extensions = self.take_extension_elements();
        let count = extensions.len();
        for extension in extensions {
            match metadata.child_for_key(&extension.key) {
                Some(child) => {
                    let (cardinality, key) = (child.cardinality, child.key.clone());
                    self.put_element(cardinality, key, extension)?;
                }
                None => self.extensions.elements.push(extension),
            }
        }
        if self.extensions.elements.len() != count {
            self.extensions.mixed.clear();
        }
        Ok(())
    }

    /// Re-binds this element to `key`, moving all content.
    ///
    /// When the value type changes the text value is re-coerced; a value that
    /// does not fit the new type hands the element back unchanged. Text moving
    /// to a void type is kept under `text()`.
    pub(crate) fn into_key(mut self, key: ElementKey) -> std::result::Result<Element, Element> {
        let target = key.datatype();
        if target != self.key.datatype() {
            match self.value.take() {
                Some(value) if target == ValueType::Void => {
                    self.extensions
                        .raw
                        .insert(TEXT_PSEUDO_KEY.to_string(), to_wire(&value).into_owned());
                }
                Some(value) => match from_wire(&to_wire(&value), target) {
                    Ok(converted) => self.value = Some(converted),
                    Err(_) => {
                        self.value = Some(value);
                        return Err(self);
                    }
                },
                None if target != ValueType::Void => {
                    if let Some(raw) = self.extensions.raw.get(TEXT_PSEUDO_KEY)
                        && let Ok(converted) = from_wire(raw, target)
                    {
                        self.extensions.raw.remove(TEXT_PSEUDO_KEY);
                        self.value = Some(converted);
                    }
                }
                None => {}
            }
        }
        self.key = key;
        Ok(self)
    }
}

fn mismatch(key: &ElementKey, actual: &Children, requested: Cardinality) -> ModelError {
    ModelError::CardinalityMismatch {
        key: key.to_string(),
        actual: actual.cardinality().name(),
        requested: requested.name(),
    }
}

/// Equality ignores the lock flag and the order of distinct child keys.
impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.attributes == other.attributes
            && self.value == other.value
            && self.extensions == other.extensions
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .all(|(key, children)| other.child_collection(key) == Some(children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ITEM: ElementKey = ElementKey::new(
        QName::unqualified("item"),
        ValueType::Void,
        ElementKind::new("test:item"),
    );
    const TAG: ElementKey = ElementKey::new(
        QName::unqualified("tag"),
        ValueType::Text,
        ElementKind::VALUE,
    );
    const COUNT: AttributeKey = AttributeKey::new(QName::unqualified("count"), ValueType::I32);

    fn tag(text: &str) -> Element {
        Element::with_value(TAG, text).unwrap()
    }

    #[test]
    fn test_single_child_last_wins() {
        let mut item = Element::new(ITEM);
        item.set_element(TAG, tag("first")).unwrap();
        item.set_element(TAG, tag("second")).unwrap();
        assert_eq!(item.elements(&TAG).len(), 1);
        assert_eq!(item.element(&TAG).unwrap().text_value(), Some("second"));
    }

    #[test]
    fn test_set_child_deduplicates() {
        let mut item = Element::new(ITEM);
        assert!(item.insert_element(TAG, tag("x")).unwrap());
        assert!(!item.insert_element(TAG, tag("x")).unwrap());
        assert_eq!(item.elements(&TAG).len(), 1);
    }

    #[test]
    fn test_list_child_keeps_duplicates_in_order() {
        let mut item = Element::new(ITEM);
        item.add_element(TAG, tag("x")).unwrap();
        item.add_element(TAG, tag("y")).unwrap();
        item.add_element(TAG, tag("x")).unwrap();
        let texts: Vec<_> = item
            .elements(&TAG)
            .iter()
            .map(|e| e.text_value().unwrap())
            .collect();
        assert_eq!(texts, vec!["x", "y", "x"]);
    }

    #[test]
    fn test_cardinality_fixed_per_key() {
        let mut item = Element::new(ITEM);
        item.insert_element(TAG, tag("x")).unwrap();
        let err = item.add_element(TAG, tag("y")).unwrap_err();
        assert!(matches!(
            err,
            ModelError::CardinalityMismatch {
                actual: "set",
                requested: "list",
                ..
            }
        ));
    }

    #[test]
    fn test_attribute_type_checked() {
        let mut item = Element::new(ITEM);
        item.set_attribute(COUNT, 3).unwrap();
        assert_eq!(item.attribute(&COUNT), Some(&Value::I32(3)));
        let err = item.set_attribute(COUNT, "three").unwrap_err();
        assert!(matches!(err, ModelError::TypeMismatch { .. }));
    }

    #[test]
    fn test_value_type_checked() {
        let mut item = Element::new(ITEM);
        assert!(matches!(
            item.set_value("text"),
            Err(ModelError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_locked_element_rejects_mutation() {
        let mut item = Element::new(ITEM);
        item.add_element(TAG, tag("x")).unwrap();
        item.lock();
        assert!(matches!(
            item.set_attribute(COUNT, 1),
            Err(ModelError::Locked(_))
        ));
        assert!(matches!(item.remove_element(&TAG), Err(ModelError::Locked(_))));
        assert!(item.elements(&TAG)[0].is_locked());
    }

    #[test]
    fn test_equality_ignores_child_key_order() {
        let other_key = ElementKey::new(
            QName::unqualified("other"),
            ValueType::Text,
            ElementKind::VALUE,
        );
        let mut a = Element::new(ITEM);
        a.set_element(TAG, tag("x")).unwrap();
        a.set_element(other_key.clone(), Element::with_value(other_key.clone(), "y").unwrap())
            .unwrap();
        let mut b = Element::new(ITEM);
        b.set_element(other_key.clone(), Element::with_value(other_key, "y").unwrap())
            .unwrap();
        b.set_element(TAG, tag("x")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_remove_member() {
        let mut item = Element::new(ITEM);
        item.add_element(TAG, tag("x")).unwrap();
        item.add_element(TAG, tag("y")).unwrap();
        assert!(item.remove_member(&TAG, &tag("x")).unwrap());
        assert!(!item.remove_member(&TAG, &tag("z")).unwrap());
        assert!(item.remove_member(&TAG, &tag("y")).unwrap());
        assert!(!item.has_element(&TAG));
    }

    #[test]
    fn test_into_key_recoerces_value() {
        let mut element = Element::new(ITEM);
        element.set_raw(TEXT_PSEUDO_KEY, "42").unwrap();
        let number = ElementKey::new(
            QName::unqualified("item"),
            ValueType::I32,
            ElementKind::new("test:number"),
        );
        let narrowed = element.into_key(number.clone()).unwrap();
        assert_eq!(narrowed.value(), Some(&Value::I32(42)));
        assert!(narrowed.extensions().text().is_none());

        let back = narrowed.into_key(ITEM).unwrap();
        assert_eq!(back.extensions().text(), Some("42"));
        assert!(back.value().is_none());
    }

    #[test]
    fn test_extension_bag() {
        let mut item = Element::new(ITEM);
        item.set_raw("@gd:foo", "1").unwrap();
        item.set_raw(TEXT_PSEUDO_KEY, "hello").unwrap();
        let ext = QName::new(Some("urn:x".to_string()), "ext");
        item.add_extension(Element::generic(ext.clone())).unwrap();

        let attrs: Vec<_> = item.extensions().raw_attributes().collect();
        assert_eq!(attrs, vec![("gd:foo", "1")]);
        assert_eq!(item.extensions().text(), Some("hello"));
        assert_eq!(item.extensions().elements_named(&ext).count(), 1);
        assert_eq!(item.remove_extensions(&ext).unwrap().len(), 1);
        assert!(item.extensions().elements().is_empty());
    }

    #[test]
    fn test_mixed_content_follows_extensions() {
        let bold = QName::new(Some("urn:x".to_string()), "b");
        let mut item = Element::new(ITEM);
        item.add_extension(Element::generic(bold.clone())).unwrap();
        item.set_mixed_content(vec![
            MixedContent::Text("Hello ".to_string()),
            MixedContent::Element(0),
            MixedContent::Text("!".to_string()),
        ])
        .unwrap();
        assert_eq!(item.extensions().mixed_content().len(), 3);

        let mut other = item.clone();
        other.set_mixed_content(Vec::new()).unwrap();
        assert_ne!(item, other);

        item.remove_extensions(&bold).unwrap();
        assert!(item.extensions().mixed_content().is_empty());
    }
}
