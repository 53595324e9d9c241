//! Metadata registry.
//!
//! The registry maps [`ElementKey`]s to their declared [`ElementMetadata`] and
//! records the narrowing rules used by [`narrow`](crate::narrow::narrow).
//! Registration is additive and idempotent, so every element kind can register
//! its own dependencies on demand without coordinating with other kinds.
//!
//! # Thread Safety
//!
//! All state sits behind a `parking_lot::RwLock`. Lookups take a shared lock;
//! registration takes the exclusive lock only for the final insert and never
//! calls back into user code while holding it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::{ModelError, Result};
use crate::key::ElementKey;
use crate::metadata::{Cardinality, ElementMetadata};
use crate::namespace::QName;

#[derive(Debug, Default, Clone)]
struct RegistryState {
    entries: HashMap<ElementKey, Arc<ElementMetadata>>,
    /// Keys in registration order.
    order: Vec<ElementKey>,
    /// First registered key for each name.
    by_name: HashMap<QName, ElementKey>,
    /// Cardinality each child key was first declared with.
    cardinalities: HashMap<ElementKey, Cardinality>,
    /// base key -> discriminator value -> narrowed key
    adaptations: HashMap<ElementKey, HashMap<String, ElementKey>>,
    /// (base, value) pairs in registration order.
    adaptation_order: Vec<(ElementKey, String)>,
}

/// Registry of element metadata and narrowing rules.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    state: RwLock<RegistryState>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers metadata for its key.
    ///
    /// Returns `Ok(false)` without changing anything when the key is already
    /// registered. Fails if a child key is declared with a cardinality that
    /// differs from an earlier declaration of the same key.
    pub fn register(&self, metadata: ElementMetadata) -> Result<bool> {
        self.insert(Arc::new(metadata))
    }

    fn insert(&self, metadata: Arc<ElementMetadata>) -> Result<bool> {
        let mut state = self.state.write();
        if state.entries.contains_key(metadata.key()) {
            return Ok(false);
        }

        for child in metadata.children() {
            if let Some(existing) = state.cardinalities.get(&child.key)
                && *existing != child.cardinality
            {
                return Err(ModelError::CardinalityConflict {
                    key: child.key.to_string(),
                    existing: existing.name(),
                    requested: child.cardinality.name(),
                });
            }
        }
        for child in metadata.children() {
            state
                .cardinalities
                .entry(child.key.clone())
                .or_insert(child.cardinality);
        }

        let key = metadata.key().clone();
        if let Some(id) = key.id() {
            state.by_name.entry(id.clone()).or_insert_with(|| key.clone());
        }
        debug!(key = %key, "registered element metadata");
        state.order.push(key.clone());
        state.entries.insert(key, metadata);
        Ok(true)
    }

    pub fn is_registered(&self, key: &ElementKey) -> bool {
        self.state.read().entries.contains_key(key)
    }

    /// Metadata for `key`, falling back to its construct.
    pub fn find(&self, key: &ElementKey) -> Option<Arc<ElementMetadata>> {
        let state = self.state.read();
        state
            .entries
            .get(key)
            .or_else(|| {
                if key.is_construct() {
                    None
                } else {
                    state.entries.get(&key.to_construct())
                }
            })
            .cloned()
    }

    /// Like [`find`](Self::find), failing with `NotFound` for unknown keys.
    pub fn lookup(&self, key: &ElementKey) -> Result<Arc<ElementMetadata>> {
        self.find(key).ok_or_else(|| ModelError::NotFound {
            key: key.to_string(),
        })
    }

    /// First key registered under `name`.
    pub fn key_for_name(&self, name: &QName) -> Option<ElementKey> {
        self.state.read().by_name.get(name).cloned()
    }

    /// Cardinality a child key was declared with.
    pub fn cardinality(&self, key: &ElementKey) -> Option<Cardinality> {
        self.state.read().cardinalities.get(key).copied()
    }

    /// Records that an element bound to `base` whose discriminator evaluates
    /// to `value` is to be treated as `narrowed`.
    ///
    /// Both keys must share the same qualified name.
    pub fn adapt(
        &self,
        base: &ElementKey,
        value: impl Into<String>,
        narrowed: &ElementKey,
    ) -> Result<()> {
        if base.id() != narrowed.id() {
            warn!(base = %base, narrowed = %narrowed, "rejected adaptation across names");
            return Err(ModelError::InvalidAdaptation {
                base: base.to_string(),
                narrowed: narrowed.to_string(),
            });
        }
        let value = value.into();
        let mut state = self.state.write();
        let rules = state.adaptations.entry(base.clone()).or_default();
        if !rules.contains_key(&value) {
            debug!(base = %base, value = %value, narrowed = %narrowed, "registered adaptation");
            rules.insert(value.clone(), narrowed.clone());
            state.adaptation_order.push((base.clone(), value));
        }
        Ok(())
    }

    /// Narrowed key for `base` and a discriminator value.
    ///
    /// Rules recorded on a construct apply to every element of that construct.
    pub fn adaptation(&self, base: &ElementKey, value: &str) -> Option<ElementKey> {
        let state = self.state.read();
        if let Some(target) = state.adaptations.get(base).and_then(|rules| rules.get(value)) {
            return Some(target.clone());
        }
        if base.is_construct() {
            return None;
        }
        let target = state
            .adaptations
            .get(&base.to_construct())
            .and_then(|rules| rules.get(value))?;
        Some(match base.id() {
            Some(id) if target.is_construct() => target.with_id(id.clone()),
            _ => target.clone(),
        })
    }

    /// Copies every entry and adaptation of `other` that is not already present.
    pub fn merge(&self, other: &MetadataRegistry) -> Result<()> {
        if std::ptr::eq(self, other) {
            return Ok(());
        }
        let snapshot = other.state.read().clone();
        // Replay in registration order so first-registered names stay first
        for key in &snapshot.order {
            if let Some(metadata) = snapshot.entries.get(key) {
                self.insert(metadata.clone())?;
            }
        }
        for (base, value) in &snapshot.adaptation_order {
            if let Some(narrowed) = snapshot.adaptations.get(base).and_then(|rules| rules.get(value)) {
                self.adapt(base, value.clone(), narrowed)?;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
