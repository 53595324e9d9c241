//! Explicit dependencies of every parse and generate call.

use std::sync::Arc;

use gdata_model::atom;
use gdata_model::{MetadataRegistry, NamespaceDictionary};

use crate::config::WireConfig;

/// Registry, namespace dictionary and settings used by the wire format.
///
/// Cheap to clone: the registry is shared.
#[derive(Debug, Clone)]
pub struct WireContext {
    pub registry: Arc<MetadataRegistry>,
    pub namespaces: NamespaceDictionary,
    pub config: WireConfig,
}

impl WireContext {
    pub fn new(
        registry: Arc<MetadataRegistry>,
        namespaces: NamespaceDictionary,
        config: WireConfig,
    ) -> Self {
        Self {
            registry,
            namespaces,
            config,
        }
    }

    /// Context for Atom documents backed by the shared Atom registry.
    pub fn atom() -> Self {
        Self::new(
            atom::default_registry(),
            NamespaceDictionary::atom(),
            WireConfig::default(),
        )
    }

    /// Replaces the settings.
    pub fn with_config(mut self, config: WireConfig) -> Self {
        self.config = config;
        self
    }
}

impl Default for WireContext {
    fn default() -> Self {
        Self::atom()
    }
}
