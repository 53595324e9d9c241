//! Error types for the XML wire format.
//!
//! Every failure while reading or writing a document is a [`WireError`].
//! Malformed input of any kind (bad markup, attributes, encodings or an event
//! sequence the parser cannot bind) is grouped by [`WireError::is_parse_error`].
//! Failures of the underlying reader or writer are always [`WireError::Io`],
//! including those quick-xml reports wrapped in its own error type.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::io;
use std::sync::Arc;

use gdata_model::{ModelError, ValidationError};
use quick_xml::encoding::EncodingError;
use quick_xml::events::attributes::AttrError;
use thiserror::Error;

/// The error type for parsing and generating XML.
#[derive(Error, Debug)]
pub enum WireError {
    /// The event sequence does not form a document the parser can bind.
    #[error("parse error at byte {position}: {message}")]
    Parse { message: String, position: u64 },

    /// Malformed XML reported by the tokenizer.
    #[error("XML error: {0}")]
    Xml(#[source] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),

    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Value coercion or element graph failure.
    #[error(transparent)]
    Model(ModelError),

    /// A parsed document violates its declared structure.
    #[error("invalid document: {0}")]
    Invalid(ValidationError),
}

impl WireError {
    pub(crate) fn parse(message: impl Into<String>, position: u64) -> Self {
        WireError::Parse {
            message: message.into(),
            position,
        }
    }

    /// True for failures caused by malformed input.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            WireError::Parse { .. }
                | WireError::Xml(_)
                | WireError::Attribute(_)
                | WireError::Encoding(_)
        )
    }
}

impl From<ModelError> for WireError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Validation(invalid) => WireError::Invalid(invalid),
            other => WireError::Model(other),
        }
    }
}

impl From<quick_xml::Error> for WireError {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(shared) => WireError::Io(
                Arc::try_unwrap(shared)
                    .unwrap_or_else(|shared| io::Error::new(shared.kind(), shared.to_string())),
            ),
            other => WireError::Xml(other),
        }
    }
}

/// Result type alias for wire operations.
pub type Result<T> = std::result::Result<T, WireError>;

#[cfg(test)]
mod tests {
    use super::*;
    use gdata_model::QName;

    #[test]
    fn test_validation_errors_become_invalid() {
        let err: WireError = ModelError::Validation(ValidationError::MissingAttribute {
            element: QName::unqualified("link"),
            attribute: QName::unqualified("href"),
        })
        .into();
        assert!(matches!(err, WireError::Invalid(_)));
        assert!(!err.is_parse_error());
        assert_eq!(
            err.to_string(),
            "invalid document: missing required attribute href on link"
        );
    }

    #[test]
    fn test_model_errors_are_transparent() {
        let err: WireError = ModelError::UnknownAlias("foo".to_string()).into();
        assert_eq!(err.to_string(), "unrecognized alias: foo");
    }

    #[test]
    fn test_reader_failures_are_io_errors() {
        let cause = io::Error::new(io::ErrorKind::ConnectionReset, "connection reset");
        let err: WireError = quick_xml::Error::Io(Arc::new(cause)).into();
        assert!(matches!(err, WireError::Io(ref e) if e.kind() == io::ErrorKind::ConnectionReset));
        assert!(!err.is_parse_error());

        let err: WireError = quick_xml::Error::Syntax(quick_xml::errors::SyntaxError::UnclosedTag).into();
        assert!(matches!(err, WireError::Xml(_)));
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_parse_error_message() {
        let err = WireError::parse("unexpected end of document", 42);
        assert!(err.is_parse_error());
        assert_eq!(
            err.to_string(),
            "parse error at byte 42: unexpected end of document"
        );
    }
}
