//! Declared shape of an element kind.
//!
//! [`ElementMetadata`] lists the attributes and child elements an element may
//! carry, their cardinalities and whether they are required. Metadata is
//! assembled with [`ElementMetadataBuilder`] and handed to the
//! [`MetadataRegistry`](crate::registry::MetadataRegistry).

use std::fmt;

use crate::element::Element;
use crate::error::ValidationError;
use crate::key::{AttributeKey, ElementKey};
use crate::namespace::QName;
use crate::value::to_wire;

/// Multiplicity of a child element under its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// At most one value; a repeated occurrence replaces the previous one.
    Single,
    /// Ordered list, in document order.
    Multiple,
    /// De-duplicating collection, in first-insertion order.
    Set,
}

impl Cardinality {
    pub fn name(&self) -> &'static str {
        match self {
            Cardinality::Single => "single",
            Cardinality::Multiple => "list",
            Cardinality::Set => "set",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How an element treats child elements it does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtensionPolicy {
    /// Undeclared children are skipped.
    Ignore,
    /// Undeclared children are kept when the registry knows their name.
    #[default]
    Declared,
    /// Like `Declared`, and anything else is kept as a schema-less element.
    /// Undeclared attributes and untyped text are kept as raw values.
    Open,
}

/// Computes the value used to look up a narrowing rule.
#[derive(Clone)]
pub enum Discriminator {
    /// The wire form of an attribute value.
    Attribute(AttributeKey),
    /// A fixed value whenever the attribute is present.
    Presence {
        attribute: AttributeKey,
        value: &'static str,
    },
    Custom(fn(&Element) -> Option<String>),
}

impl Discriminator {
    /// Returns `None` when the element does not carry enough data to decide.
    pub fn evaluate(&self, element: &Element) -> Option<String> {
        match self {
            Discriminator::Attribute(key) => element
                .attribute(key)
                .map(|value| to_wire(value).into_owned()),
            Discriminator::Presence { attribute, value } => element
                .has_attribute(attribute)
                .then(|| (*value).to_string()),
            Discriminator::Custom(f) => f(element),
        }
    }
}

impl fmt::Debug for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discriminator::Attribute(key) => f.debug_tuple("Attribute").field(key).finish(),
            Discriminator::Presence { attribute, value } => f
                .debug_struct("Presence")
                .field("attribute", attribute)
                .field("value", value)
                .finish(),
            Discriminator::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Extra structural check run during validation.
pub type Validator = fn(&Element) -> Result<(), ValidationError>;

/// A declared attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMetadata {
    pub key: AttributeKey,
    pub required: bool,
    /// Hidden attributes are parsed but never written.
    pub visible: bool,
}

impl AttributeMetadata {
    pub fn optional(key: AttributeKey) -> Self {
        Self {
            key,
            required: false,
            visible: true,
        }
    }

    pub fn required(key: AttributeKey) -> Self {
        Self {
            required: true,
            ..Self::optional(key)
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// A declared child element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildMetadata {
    pub key: ElementKey,
    pub cardinality: Cardinality,
    pub required: bool,
    pub visible: bool,
}

impl ChildMetadata {
    pub fn new(key: ElementKey, cardinality: Cardinality) -> Self {
        Self {
            key,
            cardinality,
            required: false,
            visible: true,
        }
    }

    pub fn single(key: ElementKey) -> Self {
        Self::new(key, Cardinality::Single)
    }

    pub fn list(key: ElementKey) -> Self {
        Self::new(key, Cardinality::Multiple)
    }

    pub fn set(key: ElementKey) -> Self {
        Self::new(key, Cardinality::Set)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    fn same_slot(&self, other: &ElementKey) -> bool {
        match (self.key.id(), other.id()) {
            (Some(a), Some(b)) => a == b,
            _ => &self.key == other,
        }
    }
}

/// Declared shape of one [`ElementKey`].
#[derive(Debug, Clone)]
pub struct ElementMetadata {
    key: ElementKey,
    attributes: Vec<AttributeMetadata>,
    children: Vec<ChildMetadata>,
    extension_policy: ExtensionPolicy,
    discriminator: Option<Discriminator>,
    validator: Option<Validator>,
}

impl ElementMetadata {
    pub fn builder(key: ElementKey) -> ElementMetadataBuilder {
        ElementMetadataBuilder {
            metadata: ElementMetadata {
                key,
                attributes: Vec::new(),
                children: Vec::new(),
                extension_policy: ExtensionPolicy::default(),
                discriminator: None,
                validator: None,
            },
        }
    }

    /// Metadata for a schema-less element: nothing declared, everything kept.
    pub fn generic(key: ElementKey) -> Self {
        Self::builder(key)
            .extension_policy(ExtensionPolicy::Open)
            .build()
    }

    pub fn key(&self) -> &ElementKey {
        &self.key
    }

    pub fn attributes(&self) -> &[AttributeMetadata] {
        &self.attributes
    }

    pub fn children(&self) -> &[ChildMetadata] {
        &self.children
    }

    pub fn extension_policy(&self) -> ExtensionPolicy {
        self.extension_policy
    }

    pub fn discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref()
    }

    pub fn validator(&self) -> Option<Validator> {
        self.validator
    }

    /// Declared attribute with the given name.
    pub fn attribute(&self, name: &QName) -> Option<&AttributeMetadata> {
        self.attributes.iter().find(|a| a.key.id() == name)
    }

    /// Declared child with the given name.
    pub fn child(&self, name: &QName) -> Option<&ChildMetadata> {
        self.children.iter().find(|c| c.key.matches_id(name))
    }

    pub fn child_for_key(&self, key: &ElementKey) -> Option<&ChildMetadata> {
        self.children.iter().find(|c| &c.key == key)
    }

    /// Undeclared attributes are visible.
    pub fn is_attribute_visible(&self, key: &AttributeKey) -> bool {
        self.attributes
            .iter()
            .find(|a| &a.key == key)
            .is_none_or(|a| a.visible)
    }

    /// Undeclared children are visible.
    pub fn is_child_visible(&self, key: &ElementKey) -> bool {
        self.child_for_key(key).is_none_or(|c| c.visible)
    }
}

/// Builder for [`ElementMetadata`].
///
/// Declaring an attribute or child whose name is already declared replaces
/// the earlier declaration, which is how a narrowed kind tightens what it
/// inherited.
#[derive(Debug)]
pub struct ElementMetadataBuilder {
    metadata: ElementMetadata,
}

impl ElementMetadataBuilder {
    /// Copies every declaration of `base`, keeping this builder's key.
    pub fn inherit(mut self, base: &ElementMetadata) -> Self {
        for attribute in &base.attributes {
            self = self.replace_attribute(attribute.clone());
        }
        for child in &base.children {
            self = self.replace_child(child.clone());
        }
        self.metadata.extension_policy = base.extension_policy;
        if base.discriminator.is_some() {
            self.metadata.discriminator = base.discriminator.clone();
        }
        if base.validator.is_some() {
            self.metadata.validator = base.validator;
        }
        self
    }

    pub fn attribute(self, key: AttributeKey) -> Self {
        self.replace_attribute(AttributeMetadata::optional(key))
    }

    pub fn required_attribute(self, key: AttributeKey) -> Self {
        self.replace_attribute(AttributeMetadata::required(key))
    }

    pub fn replace_attribute(mut self, attribute: AttributeMetadata) -> Self {
        let attributes = &mut self.metadata.attributes;
        match attributes.iter_mut().find(|a| a.key.id() == attribute.key.id()) {
            Some(existing) => *existing = attribute,
            None => attributes.push(attribute),
        }
        self
    }

    pub fn child(self, key: ElementKey, cardinality: Cardinality) -> Self {
        self.replace_child(ChildMetadata::new(key, cardinality))
    }

    pub fn required_child(self, key: ElementKey, cardinality: Cardinality) -> Self {
        self.replace_child(ChildMetadata::new(key, cardinality).required())
    }

    pub fn replace_child(mut self, child: ChildMetadata) -> Self {
        let children = &mut self.metadata.children;
        match children.iter_mut().find(|c| c.same_slot(&child.key)) {
            Some(existing) => *existing = child,
            None => children.push(child),
        }
        self
    }

    pub fn extension_policy(mut self, policy: ExtensionPolicy) -> Self {
        self.metadata.extension_policy = policy;
        self
    }

    pub fn discriminator(mut self, discriminator: Discriminator) -> Self {
        self.metadata.discriminator = Some(discriminator);
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.metadata.validator = Some(validator);
        self
    }

    pub fn build(self) -> ElementMetadata {
        self.metadata
    }
}
