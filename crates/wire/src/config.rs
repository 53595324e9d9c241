//! Parser and generator settings.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GDATA_XML_TRIM_TEXT` | true | Trim whitespace around element text |
//! | `GDATA_XML_VALIDATE` | true | Validate parsed documents against their metadata |
//! | `GDATA_XML_MAX_DEPTH` | 256 | Maximum element nesting depth |
//! | `GDATA_XML_INDENT` | 0 | Indent width of generated XML (0 writes a single line) |
//! | `GDATA_XML_WRITE_DECLARATION` | true | Start generated documents with `<?xml ...?>` |
//! | `GDATA_XML_EXPAND_EMPTY` | false | Write `<a></a>` instead of `<a/>` |
//!
//! # Example
//!
//! ```rust
//! use gdata_wire::WireConfig;
//!
//! // Create from environment
//! let config = WireConfig::from_env();
//!
//! // Or create programmatically
//! let config = WireConfig {
//!     indent: 2,
//!     validate: false,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use clap::{ArgAction, Parser};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Settings shared by parsing and generation.
#[derive(Debug, Clone, PartialEq, Eq, Parser, Serialize, Deserialize)]
#[command(name = "gdata-wire")]
#[command(about = "GData XML wire settings")]
#[serde(default)]
pub struct WireConfig {
    /// Trim leading and trailing whitespace of element text.
    #[arg(long, env = "GDATA_XML_TRIM_TEXT", default_value_t = true, action = ArgAction::Set)]
    pub trim_text: bool,

    /// Validate parsed documents and feed entries.
    #[arg(long, env = "GDATA_XML_VALIDATE", default_value_t = true, action = ArgAction::Set)]
    pub validate: bool,

    /// Maximum element nesting depth accepted by the parser.
    #[arg(long, env = "GDATA_XML_MAX_DEPTH", default_value_t = 256)]
    pub max_depth: usize,

    /// Indent width for generated XML; 0 disables indentation.
    #[arg(long, env = "GDATA_XML_INDENT", default_value_t = 0)]
    pub indent: usize,

    /// Write the XML declaration before the root element.
    #[arg(long, env = "GDATA_XML_WRITE_DECLARATION", default_value_t = true, action = ArgAction::Set)]
    pub write_declaration: bool,

    /// Write empty elements as a start and end tag pair.
    #[arg(long, env = "GDATA_XML_EXPAND_EMPTY", default_value_t = false, action = ArgAction::Set)]
    pub expand_empty_elements: bool,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            trim_text: true,
            validate: true,
            max_depth: 256,
            indent: 0,
            write_declaration: true,
            expand_empty_elements: false,
        }
    }
}

impl WireConfig {
    /// Largest accepted indent width.
    pub const MAX_INDENT: usize = 16;

    /// Creates a configuration from environment variables.
    ///
    /// Command line arguments of the host process are not consulted.
    /// An unparsable variable is logged and the defaults are used instead.
    pub fn from_env() -> Self {
        // Parse without arguments so only the environment applies
        Self::parse_or_default(["gdata-wire"])
    }

    fn parse_or_default<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "invalid wire configuration, using defaults");
                Self::default()
            }
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_depth == 0 {
            errors.push("Max depth cannot be 0".to_string());
        }

        if self.indent > Self::MAX_INDENT {
            errors.push(format!("Indent cannot exceed {}", Self::MAX_INDENT));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// Output is compact and has no declaration so expected documents stay short.
    pub fn for_testing() -> Self {
        Self {
            trim_text: true,
            validate: true,
            max_depth: 64,
            indent: 0,
            write_declaration: false,
            expand_empty_elements: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WireConfig::default();
        assert!(config.trim_text);
        assert!(config.validate);
        assert_eq!(config.max_depth, 256);
        assert_eq!(config.indent, 0);
    }

    #[test]
    fn test_parse_arguments() {
        let config = WireConfig::try_parse_from([
            "gdata-wire",
            "--validate",
            "false",
            "--indent",
            "4",
        ])
        .unwrap();
        assert!(!config.validate);
        assert_eq!(config.indent, 4);
        assert!(config.write_declaration);
    }

    #[test]
    fn test_unparsable_settings_fall_back_to_defaults() {
        let config = WireConfig::parse_or_default(["gdata-wire", "--max-depth", "deep"]);
        assert_eq!(config, WireConfig::default());

        let config = WireConfig::parse_or_default(["gdata-wire", "--indent", "2"]);
        assert_eq!(config.indent, 2);
    }

    #[test]
    fn test_validate_valid() {
        assert!(WireConfig::default().validate().is_ok());
        assert!(WireConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn test_validate_invalid() {
        let config = WireConfig {
            max_depth: 0,
            indent: 40,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("depth")));
    }

    #[test]
    fn test_serde_defaults_missing_fields() {
        let config: WireConfig = serde_json::from_str(r#"{"indent": 2}"#).unwrap();
        assert_eq!(config.indent, 2);
        assert!(config.trim_text);
        assert_eq!(config.max_depth, 256);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["write_declaration"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_for_testing() {
        let config = WireConfig::for_testing();
        assert!(!config.write_declaration);
        assert_eq!(config.max_depth, 64);
    }
}
