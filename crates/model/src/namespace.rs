//! Qualified names and the namespace alias dictionary.
//!
//! The [`NamespaceDictionary`] maps short aliases (`gd`, `app`, the empty
//! default alias) to namespace URIs. The parser only needs the URIs it reads
//! from the document, while the serializer uses the dictionary to pick the
//! prefixes it declares on the root element.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{ModelError, Result};

/// Atom syndication format.
pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
/// Atom publishing protocol.
pub const APP_NS: &str = "http://www.w3.org/2007/app";
/// GData extension elements.
pub const GD_NS: &str = "http://schemas.google.com/g/2005";
/// OpenSearch response elements.
pub const OPENSEARCH_NS: &str = "http://a9.com/-/spec/opensearch/1.1/";
/// XHTML, used by `type="xhtml"` text constructs.
pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";
/// The reserved `xml:` namespace. Always bound, never declared.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

const UNKNOWN_NS_BASE: &str = "http://unknown/";

/// A namespace-qualified name.
///
/// Names are usually `const` items built with [`QName::of_static`]; names read
/// from a document own their strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    namespace: Option<Cow<'static, str>>,
    local_name: Cow<'static, str>,
}

impl QName {
    /// Creates a name from static strings, usable in `const` context.
    pub const fn of_static(namespace: Option<&'static str>, local_name: &'static str) -> Self {
        let namespace = match namespace {
            Some(uri) => Some(Cow::Borrowed(uri)),
            None => None,
        };
        Self {
            namespace,
            local_name: Cow::Borrowed(local_name),
        }
    }

    /// Creates a name without a namespace.
    pub const fn unqualified(local_name: &'static str) -> Self {
        Self::of_static(None, local_name)
    }

    /// Creates a name from owned strings.
    pub fn new(namespace: Option<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(Cow::Owned),
            local_name: Cow::Owned(local_name.into()),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Returns true if this name is in the given namespace.
    pub fn is_in(&self, namespace: &str) -> bool {
        self.namespace() == Some(namespace)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

/// Immutable alias ↔ URI table.
///
/// The empty alias denotes the default namespace. When several aliases map to
/// the same URI, the first non-empty one added is used for prefixes.
#[derive(Debug, Clone, Default)]
pub struct NamespaceDictionary {
    by_alias: BTreeMap<String, String>,
    by_uri: BTreeMap<String, String>,
}

impl NamespaceDictionary {
    pub fn builder() -> NamespaceDictionaryBuilder {
        NamespaceDictionaryBuilder::default()
    }

    /// Dictionary for Atom documents with the GData extension namespaces.
    pub fn atom() -> Self {
        Self::builder()
            .add("", ATOM_NS)
            .add("atom", ATOM_NS)
            .add("app", APP_NS)
            .add("gd", GD_NS)
            .add("openSearch", OPENSEARCH_NS)
            .add("xhtml", XHTML_NS)
            .add("xml", XML_NS)
            .build()
    }

    /// Resolves an alias to its namespace URI.
    pub fn resolve(&self, alias: &str) -> Result<&str> {
        self.by_alias
            .get(alias)
            .map(String::as_str)
            .ok_or_else(|| ModelError::UnknownAlias(alias.to_string()))
    }

    /// Resolves an alias, substituting a placeholder URI for unknown aliases.
    ///
    /// Used for diagnostic output where an unknown alias must not abort.
    pub fn resolve_lenient(&self, alias: &str) -> Cow<'_, str> {
        match self.by_alias.get(alias) {
            Some(uri) => Cow::Borrowed(uri.as_str()),
            None => Cow::Owned(format!("{UNKNOWN_NS_BASE}{alias}")),
        }
    }

    /// Parses `alias:local` (or a bare `local` in the default namespace) into a [`QName`].
    pub fn qualify(&self, prefixed: &str, lenient: bool) -> Result<QName> {
        let (alias, local) = split_prefixed(prefixed);
        let uri = if lenient {
            self.resolve_lenient(alias).into_owned()
        } else {
            self.resolve(alias)?.to_string()
        };
        Ok(QName::new(Some(uri), local))
    }

    /// Preferred non-empty alias for a URI.
    pub fn alias_for(&self, uri: &str) -> Option<&str> {
        self.by_uri.get(uri).map(String::as_str)
    }

    /// URI bound to the empty alias.
    pub fn default_namespace(&self) -> Option<&str> {
        self.by_alias.get("").map(String::as_str)
    }

    /// Assigns a prefix to every namespace in `usage`.
    ///
    /// The result is deterministic: URIs are visited in sorted order and
    /// namespaces missing from the dictionary get `ns0`, `ns1`, … in that
    /// order. Only namespaces present in `usage` are bound.
    pub fn assign_prefixes(&self, usage: &NamespaceUsage) -> NamespaceBindings {
        let default = match (usage.root.as_deref(), self.default_namespace()) {
            (Some(root), Some(default)) if root == default && !usage.unqualified_elements => {
                Some(default.to_string())
            }
            _ => None,
        };

        let mut taken: BTreeSet<String> = BTreeSet::new();
        let mut prefixes = BTreeMap::new();
        let mut generated = 0usize;

        for uri in usage.elements.union(&usage.attributes) {
            if uri == XML_NS {
                continue;
            }
            let needs_prefix =
                default.as_deref() != Some(uri.as_str()) || usage.attributes.contains(uri);
            if !needs_prefix {
                continue;
            }
            let prefix = match self.alias_for(uri) {
                Some(alias) if !taken.contains(alias) && alias != "xml" && alias != "xmlns" => {
                    alias.to_string()
                }
                _ => loop {
                    let candidate = format!("ns{generated}");
                    generated += 1;
                    if !taken.contains(&candidate) {
                        break candidate;
                    }
                },
            };
            taken.insert(prefix.clone());
            prefixes.insert(uri.clone(), prefix);
        }

        NamespaceBindings { default, prefixes }
    }
}

/// Builder for [`NamespaceDictionary`].
#[derive(Debug, Default)]
pub struct NamespaceDictionaryBuilder {
    dictionary: NamespaceDictionary,
}

impl NamespaceDictionaryBuilder {
    /// Adds an alias. Later additions of the same alias replace earlier ones.
    pub fn add(mut self, alias: impl Into<String>, uri: impl Into<String>) -> Self {
        let alias = alias.into();
        let uri = uri.into();
        if !alias.is_empty() {
            self.dictionary
                .by_uri
                .entry(uri.clone())
                .or_insert_with(|| alias.clone());
        }
        self.dictionary.by_alias.insert(alias, uri);
        self
    }

    pub fn build(self) -> NamespaceDictionary {
        self.dictionary
    }
}

/// Namespaces referenced by one document, gathered before serialization.
#[derive(Debug, Clone, Default)]
pub struct NamespaceUsage {
    /// Namespaces of element names.
    pub elements: BTreeSet<String>,
    /// Namespaces of attribute names.
    pub attributes: BTreeSet<String>,
    /// Namespace of the root element.
    pub root: Option<String>,
    /// Whether any element has no namespace, which rules out a default namespace.
    pub unqualified_elements: bool,
}

impl NamespaceUsage {
    pub fn record_element(&mut self, name: &QName) {
        match name.namespace() {
            Some(uri) => {
                self.elements.insert(uri.to_string());
            }
            None => self.unqualified_elements = true,
        }
    }

    pub fn record_attribute(&mut self, name: &QName) {
        if let Some(uri) = name.namespace() {
            self.attributes.insert(uri.to_string());
        }
    }
}

/// Prefixes chosen for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceBindings {
    default: Option<String>,
    prefixes: BTreeMap<String, String>,
}

impl NamespaceBindings {
    pub fn default_namespace(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Prefix bound to a URI, if any.
    pub fn prefix(&self, uri: &str) -> Option<&str> {
        if uri == XML_NS {
            return Some("xml");
        }
        self.prefixes.get(uri).map(String::as_str)
    }

    /// Serialized element name for `name`.
    pub fn element_name(&self, name: &QName) -> Option<String> {
        match name.namespace() {
            None => Some(name.local_name().to_string()),
            Some(uri) if self.default.as_deref() == Some(uri) => {
                Some(name.local_name().to_string())
            }
            Some(uri) => self
                .prefix(uri)
                .map(|prefix| format!("{prefix}:{}", name.local_name())),
        }
    }

    /// Serialized attribute name for `name`. Attributes never use the default namespace.
    pub fn attribute_name(&self, name: &QName) -> Option<String> {
        match name.namespace() {
            None => Some(name.local_name().to_string()),
            Some(uri) => self
                .prefix(uri)
                .map(|prefix| format!("{prefix}:{}", name.local_name())),
        }
    }

    /// `xmlns` attributes to place on the root element, default first.
    pub fn declarations(&self) -> Vec<(String, &str)> {
        let mut out = Vec::with_capacity(self.prefixes.len() + 1);
        if let Some(default) = &self.default {
            out.push(("xmlns".to_string(), default.as_str()));
        }
        let mut by_prefix: Vec<_> = self.prefixes.iter().collect();
        by_prefix.sort_by(|a, b| a.1.cmp(b.1));
        for (uri, prefix) in by_prefix {
            out.push((format!("xmlns:{prefix}"), uri.as_str()));
        }
        out
    }
}

/// Splits `alias:local` into its parts. A name without a colon has the empty alias.
pub fn split_prefixed(name: &str) -> (&str, &str) {
    match name.split_once(':') {
        Some((alias, local)) => (alias, local),
        None => ("", name),
    }
}

/// Pseudo-key for an undeclared attribute: `@local` without a namespace,
/// `@{uri}local` (Clark notation) with one.
pub fn raw_attribute_key(name: &QName) -> String {
    match name.namespace() {
        Some(uri) => format!("@{{{uri}}}{}", name.local_name()),
        None => format!("@{}", name.local_name()),
    }
}

/// Splits a Clark-notation name `{uri}local` into its parts.
pub fn split_clark(name: &str) -> Option<(&str, &str)> {
    name.strip_prefix('{')?.split_once('}')
}
