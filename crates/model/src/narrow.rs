//! Kind narrowing.
//!
//! A parsed element starts out bound to the key its parent declares. Once the
//! element is complete, its metadata's [`Discriminator`](crate::metadata::Discriminator)
//! is evaluated and, if the registry holds an adaptation for the result, the
//! element is re-bound to the narrowed key. Content moves over unchanged;
//! only the kind (and possibly the value type) differs afterwards.

use tracing::{debug, trace};

use crate::element::Element;
use crate::error::Result;
use crate::registry::MetadataRegistry;
use crate::validate::validate;

/// Upper bound on chained adaptations for one element.
const MAX_NARROWING_STEPS: usize = 8;

/// Narrows `element` as far as its data allows.
///
/// Extension elements that the narrowed kind declares as children are moved
/// into their declared slots. Idempotent: narrowing an already narrowed
/// element returns it unchanged.
/// Missing or ambiguous discriminator data leaves the element as it is.
pub fn narrow(element: Element, registry: &MetadataRegistry) -> Element {
    let mut element = element;
    for _ in 0..MAX_NARROWING_STEPS {
        let Some(metadata) = registry.find(element.key()) else {
            return element;
        };
        let Some(discriminator) = metadata.discriminator() else {
            return element;
        };
        let Some(value) = discriminator.evaluate(&element) else {
            trace!(key = %element.key(), "no discriminator value, keeping binding");
            return element;
        };
        let target = match registry.adaptation(element.key(), &value) {
            Some(target) if &target != element.key() => target,
            _ => return element,
        };
        debug!(from = %element.key(), to = %target, value = %value, "narrowing element");
        element = match element.into_key(target) {
            Ok(narrowed) => narrowed,
            Err(unchanged) => {
                debug!(key = %unchanged.key(), "value does not fit narrowed type, keeping binding");
                return unchanged;
            }
        };
        // Extensions the narrowed kind declares become regular children.
        if let Some(narrowed) = registry.find(element.key())
            && let Err(e) = element.promote_extensions(&narrowed)
        {
            debug!(key = %element.key(), error = %e, "could not promote extensions");
        }
    }
    element
}

/// Narrows a whole tree bottom-up, then validates it.
///
/// Used for element graphs built in code, which never pass through the
/// parser's narrowing step.
pub fn resolve(element: Element, registry: &MetadataRegistry) -> Result<Element> {
    let element = narrow_tree(element, registry)?;
    validate(&element, registry)?;
    Ok(element)
}

fn narrow_tree(mut element: Element, registry: &MetadataRegistry) -> Result<Element> {
    let children = element
        .take_children()
        .into_iter()
        .map(|(key, children)| {
            children
                .map_members(|child| narrow_tree(child, registry))
                .map(|children| (key, children))
        })
        .collect::<Result<Vec<_>>>()?;
    element.restore_children(children);

    let extensions = element
        .take_extension_elements()
        .into_iter()
        .map(|child| narrow_tree(child, registry))
        .collect::<Result<Vec<_>>>()?;
    element.restore_extension_elements(extensions);

    Ok(narrow(element, registry))
}
