//! Error types for the element model.
//!
//! Coercion failures, registry misuse and structural problems found while
//! validating an element tree all surface as [`ModelError`]. Structural
//! problems are additionally described by [`ValidationError`] so callers can
//! collect every violation of a tree instead of stopping at the first one.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::namespace::QName;
use crate::value::ValueType;

/// The error type for all model operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A wire literal could not be converted to its declared type.
    #[error("invalid {value_type} literal '{value}': {reason}")]
    InvalidLiteral {
        value: String,
        value_type: ValueType,
        reason: String,
    },

    /// The declared type has no coercion rule.
    #[error("no coercion rule for value type {0}")]
    UnsupportedType(ValueType),

    /// A namespace alias was used but never registered.
    #[error("unrecognized alias: {}", display_alias(.0))]
    UnknownAlias(String),

    /// No metadata is registered for an element identity.
    #[error("no metadata registered for {key}")]
    NotFound { key: String },

    /// A value does not match the declared type of its key.
    #[error("type mismatch for {name}: expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: ValueType,
        found: ValueType,
    },

    /// Mutation attempted on a locked element.
    #[error("element {0} is locked")]
    Locked(String),

    /// A child collection was accessed with the wrong cardinality.
    #[error("child {key} holds {actual} values, cannot be used as {requested}")]
    CardinalityMismatch {
        key: String,
        actual: &'static str,
        requested: &'static str,
    },

    /// The same child key was declared with two different cardinalities.
    #[error("child {key} already declared as {existing}, cannot redeclare as {requested}")]
    CardinalityConflict {
        key: String,
        existing: &'static str,
        requested: &'static str,
    },

    /// A narrowing rule would change the qualified name of an element.
    #[error("cannot adapt {base} to {narrowed}: qualified names differ")]
    InvalidAdaptation { base: String, narrowed: String },

    /// A construct key without a name was used where a concrete element is required.
    #[error("element {0} has no qualified name")]
    UnnamedElement(String),

    /// A structural constraint was violated.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A single structural violation found while validating an element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required attribute {attribute} on {element}")]
    MissingAttribute { element: QName, attribute: QName },

    #[error("missing required element {child} in {element}")]
    MissingElement { element: QName, child: QName },

    #[error("invalid content in {element}: {reason}")]
    InvalidContent { element: QName, reason: String },
}

fn display_alias(alias: &str) -> &str {
    if alias.is_empty() { "(default)" } else { alias }
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_default_alias_message() {
        let err = ModelError::UnknownAlias(String::new());
        assert_eq!(err.to_string(), "unrecognized alias: (default)");
        let err = ModelError::UnknownAlias("gd".to_string());
        assert_eq!(err.to_string(), "unrecognized alias: gd");
    }

    #[test]
    fn test_validation_error_names_missing_attribute() {
        let err: ModelError = ValidationError::MissingAttribute {
            element: QName::of_static(Some("http://www.w3.org/2005/Atom"), "link"),
            attribute: QName::unqualified("href"),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "missing required attribute href on {http://www.w3.org/2005/Atom}link"
        );
    }
}
