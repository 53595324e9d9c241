//! # gdata-wire
//!
//! XML wire format for [`gdata_model`] element graphs.
//!
//! - **Parsing**: [`from_xml_str`], [`from_xml_slice`] and [`from_xml_reader`]
//!   bind a whole document to a root key; [`FeedParser`] reads large feeds one
//!   entry at a time.
//! - **Generation**: [`to_xml_string`], [`to_xml_vec`] and [`to_xml_writer`].
//! - **Field selectors**: [`fields`] renders partial-response selectors from
//!   declared metadata.
//!
//! Every call takes a [`WireContext`] holding the metadata registry, the
//! namespace dictionary and the [`WireConfig`].
//!
//! ## Example
//!
//! ```
//! use gdata_model::atom::feed::FEED;
//! use gdata_wire::{WireContext, from_xml_str, to_xml_string};
//!
//! let ctx = WireContext::atom();
//! let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>Hi</title></feed>"#;
//! let feed = from_xml_str(&ctx, xml, &FEED)?;
//! assert!(to_xml_string(&ctx, &feed)?.ends_with(xml));
//! # Ok::<(), gdata_wire::WireError>(())
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod fields;
pub mod xml;

pub use config::WireConfig;
pub use context::WireContext;
pub use error::{Result, WireError};
pub use xml::{
    FeedParser, XmlGenerator, from_xml_reader, from_xml_slice, from_xml_str,
    from_xml_str_generic, to_debug_string, to_xml_string, to_xml_string_named, to_xml_vec,
    to_xml_writer,
};
