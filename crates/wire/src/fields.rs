//! Partial-response field selectors.
//!
//! A selector names the attributes and children a client wants back, in the
//! form `@attr,child,child(@a,grandchild)`. Names in the dictionary's default
//! namespace are written bare, others with their dictionary alias.

use std::collections::HashSet;

use gdata_model::{ElementKey, ModelError, NamespaceDictionary, QName};

use crate::context::WireContext;
use crate::error::Result;

/// Selector for every visible attribute and child declared for `key`.
///
/// ```
/// use gdata_model::atom::link::LINK;
/// use gdata_wire::{WireContext, fields};
///
/// let ctx = WireContext::atom();
/// assert_eq!(
///     fields::element_fields(&ctx, &LINK)?,
///     "@href,@rel,@type,@hreflang,@title,@length,@gd:etag"
/// );
/// # Ok::<(), gdata_wire::WireError>(())
/// ```
pub fn element_fields(ctx: &WireContext, key: &ElementKey) -> Result<String> {
    let mut visiting = HashSet::new();
    render(ctx, key, None, &mut visiting)
}

/// Selector for a feed whose entries are bound to `entry_key`.
///
/// The feed's own declaration of its entries is replaced by `entry(...)`
/// rendered from `entry_key`, which may be a narrowed entry kind.
pub fn feed_fields(ctx: &WireContext, feed_key: &ElementKey, entry_key: &ElementKey) -> Result<String> {
    let entry_name = entry_key
        .id()
        .ok_or_else(|| ModelError::UnnamedElement(entry_key.to_string()))?;
    let mut visiting = HashSet::new();
    let feed = render(ctx, feed_key, Some(entry_name), &mut visiting)?;
    let entry = render(ctx, entry_key, None, &mut HashSet::new())?;
    let entry = selector(&ctx.namespaces, entry_name, &entry);
    Ok(if feed.is_empty() {
        entry
    } else {
        format!("{feed},{entry}")
    })
}

fn render(
    ctx: &WireContext,
    key: &ElementKey,
    skip_child: Option<&QName>,
    visiting: &mut HashSet<ElementKey>,
) -> Result<String> {
    let metadata = ctx.registry.lookup(key)?;
    if !visiting.insert(key.clone()) {
        return Ok(String::new());
    }

    let mut parts = Vec::new();
    for attribute in metadata.attributes().iter().filter(|a| a.visible) {
        parts.push(format!("@{}", display_name(&ctx.namespaces, attribute.key.id())));
    }
    for child in metadata.children().iter().filter(|c| c.visible) {
        let Some(name) = child.key.id() else {
            continue;
        };
        if skip_child == Some(name) {
            continue;
        }
        let nested = match ctx.registry.find(&child.key) {
            Some(_) => render(ctx, &child.key, None, visiting)?,
            None => String::new(),
        };
        parts.push(selector(&ctx.namespaces, name, &nested));
    }

    visiting.remove(key);
    Ok(parts.join(","))
}

fn selector(namespaces: &NamespaceDictionary, name: &QName, nested: &str) -> String {
    let name = display_name(namespaces, name);
    if nested.is_empty() {
        name
    } else {
        format!("{name}({nested})")
    }
}

fn display_name(namespaces: &NamespaceDictionary, name: &QName) -> String {
    match name.namespace() {
        None => name.local_name().to_string(),
        Some(uri) if namespaces.default_namespace() == Some(uri) => name.local_name().to_string(),
        Some(uri) => match namespaces.alias_for(uri) {
            Some(alias) => format!("{alias}:{}", name.local_name()),
            None => name.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdata_model::atom::entry::ENTRY;
    use gdata_model::atom::feed::FEED;
    use gdata_model::atom::person::AUTHOR;

    #[test]
    fn test_person_fields() {
        let ctx = WireContext::atom();
        assert_eq!(
            element_fields(&ctx, &AUTHOR).unwrap(),
            "@xml:lang,name,uri,email"
        );
    }

    #[test]
    fn test_entry_fields_nest() {
        let ctx = WireContext::atom();
        let fields = element_fields(&ctx, &ENTRY).unwrap();
        assert!(fields.starts_with("@gd:etag,@gd:kind,@gd:fields,id,published,updated,app:edited,"));
        assert!(fields.contains("author(@xml:lang,name,uri,email)"));
        assert!(fields.contains("link(@href,@rel"));
    }

    #[test]
    fn test_feed_fields_append_entry() {
        let ctx = WireContext::atom();
        let fields = feed_fields(&ctx, &FEED, &ENTRY).unwrap();
        assert!(fields.ends_with(&format!("entry({})", element_fields(&ctx, &ENTRY).unwrap())));
        assert_eq!(fields.matches("entry(").count(), 1);
    }

    #[test]
    fn test_unknown_key_fails() {
        let ctx = WireContext::atom();
        let key = ElementKey::generic(QName::unqualified("nothing"), gdata_model::ValueType::Void);
        assert!(element_fields(&ctx, &key).is_err());
    }
}
