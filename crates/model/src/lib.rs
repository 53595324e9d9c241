//! # gdata-model
//!
//! The data side of the GData XML binding: qualified names and namespace
//! dictionaries, typed scalar values, element and attribute keys, a
//! thread-safe metadata registry, the neutral element graph and kind
//! narrowing.
//!
//! Documents are held as a tree of [`Element`]s. Each element is bound to an
//! [`ElementKey`] (qualified name, value type and kind) whose registered
//! [`ElementMetadata`] declares the attributes and children the element may
//! carry. Everything else lands in the element's [`ExtensionBag`].
//!
//! Typed views over the Atom vocabulary live in [`atom`]. The wire format
//! itself (parsing and generating XML) is handled by the `gdata-wire` crate.
//!
//! ```
//! use gdata_model::atom::{self, AtomElement, BoundElement, Entry};
//! use gdata_model::validate::validate;
//!
//! let registry = atom::default_registry();
//! let mut entry = Entry::new();
//! entry.set_id("urn:example:1")?;
//! entry.set_title("Example")?;
//! validate(entry.as_element(), &registry)?;
//! # Ok::<(), gdata_model::ModelError>(())
//! ```

pub mod atom;
pub mod element;
pub mod error;
pub mod key;
pub mod metadata;
pub mod namespace;
pub mod narrow;
pub mod registry;
pub mod validate;
pub mod value;

pub use element::{Children, Element, ElementSet, ExtensionBag, MixedContent};
pub use error::{ModelError, Result, ValidationError};
pub use key::{AttributeKey, ElementKey, ElementKind};
pub use metadata::{Cardinality, ElementMetadata, ExtensionPolicy};
pub use namespace::{NamespaceDictionary, QName};
pub use registry::MetadataRegistry;
pub use value::{Timestamp, Value, ValueType};
