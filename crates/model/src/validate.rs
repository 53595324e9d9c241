//! Structural validation against registered metadata.

use crate::element::Element;
use crate::error::{ModelError, Result, ValidationError};
use crate::namespace::QName;
use crate::registry::MetadataRegistry;

const CONSTRUCT_NAME: QName = QName::unqualified("(construct)");

/// Validates `element` and its subtree, failing with the first violation.
pub fn validate(element: &Element, registry: &MetadataRegistry) -> Result<()> {
    match validation_errors(element, registry).into_iter().next() {
        Some(error) => Err(ModelError::Validation(error)),
        None => Ok(()),
    }
}

/// Collects every violation in `element` and its subtree, in document order.
///
/// Elements without registered metadata are not checked themselves, but their
/// children are.
pub fn validation_errors(element: &Element, registry: &MetadataRegistry) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    collect(element, registry, &mut errors);
    errors
}

fn collect(element: &Element, registry: &MetadataRegistry, errors: &mut Vec<ValidationError>) {
    if let Some(metadata) = registry.find(element.key()) {
        let name = || element.id().cloned().unwrap_or(CONSTRUCT_NAME);

        for attribute in metadata.attributes().iter().filter(|a| a.required) {
            if !element.has_attribute(&attribute.key) {
                errors.push(ValidationError::MissingAttribute {
                    element: name(),
                    attribute: attribute.key.id().clone(),
                });
            }
        }
        for child in metadata.children().iter().filter(|c| c.required) {
            if !element.has_element(&child.key) {
                errors.push(ValidationError::MissingElement {
                    element: name(),
                    child: child.key.id().cloned().unwrap_or(CONSTRUCT_NAME),
                });
            }
        }
        if let Some(validator) = metadata.validator()
            && let Err(error) = validator(element)
        {
            errors.push(error);
        }
    }

    for (_, children) in element.children() {
        for child in children.iter() {
            collect(child, registry, errors);
        }
    }
    for extension in element.extensions().elements() {
        collect(extension, registry, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{AttributeKey, ElementKey, ElementKind};
    use crate::metadata::{Cardinality, ElementMetadata};
    use crate::value::ValueType;

    const PERSON: ElementKey = ElementKey::new(
        QName::unqualified("person"),
        ValueType::Void,
        ElementKind::new("test:person"),
    );
    const NAME: ElementKey = ElementKey::new(
        QName::unqualified("name"),
        ValueType::Text,
        ElementKind::VALUE,
    );
    const ID: AttributeKey = AttributeKey::text("id");

    fn registry() -> MetadataRegistry {
        let registry = MetadataRegistry::new();
        registry
            .register(
                ElementMetadata::builder(PERSON)
                    .required_attribute(ID)
                    .required_child(NAME, Cardinality::Single)
                    .validator(|element| {
                        if element.attribute_text(&ID) == Some("") {
                            return Err(ValidationError::InvalidContent {
                                element: QName::unqualified("person"),
                                reason: "empty id".to_string(),
                            });
                        }
                        Ok(())
                    })
                    .build(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_missing_required_attribute_is_named() {
        let registry = registry();
        let mut person = Element::new(PERSON);
        person
            .set_element(NAME, Element::with_value(NAME, "Ada").unwrap())
            .unwrap();
        let err = validate(&person, &registry).unwrap_err();
        assert_eq!(
            err,
            ModelError::Validation(ValidationError::MissingAttribute {
                element: QName::unqualified("person"),
                attribute: QName::unqualified("id"),
            })
        );
    }

    #[test]
    fn test_collects_all_errors() {
        let registry = registry();
        let errors = validation_errors(&Element::new(PERSON), &registry);
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[1], ValidationError::MissingElement { .. }));
    }

    #[test]
    fn test_custom_validator() {
        let registry = registry();
        let mut person = Element::new(PERSON);
        person.set_attribute(ID, "").unwrap();
        person
            .set_element(NAME, Element::with_value(NAME, "Ada").unwrap())
            .unwrap();
        let errors = validation_errors(&person, &registry);
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::InvalidContent { .. }]
        ));
    }
}
