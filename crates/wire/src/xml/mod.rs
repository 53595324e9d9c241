//! XML reading and writing for element graphs.
//!
//! ## Architecture
//!
//! - **Events**: [`reader::XmlEventReader`] turns `quick_xml::NsReader`
//!   output into five namespace-resolved event kinds with one-event lookahead.
//!
//! - **Parsing**: [`de`] binds events to [`Element`](gdata_model::Element)s by
//!   recursive descent, guided by the metadata registered for each key, and
//!   narrows every element when its end tag is read.
//!
//! - **Feeds**: [`feed::FeedParser`] parses a feed header eagerly and its
//!   entries on demand.
//!
//! - **Generation**: [`ser`] writes an element tree back through
//!   `quick_xml::Writer`, declaring all namespaces on the root element.
//!
//! ## Example
//!
//! ```xml
//! <feed xmlns="http://www.w3.org/2005/Atom"
//!       xmlns:gd="http://schemas.google.com/g/2005"
//!       gd:etag="W/&quot;C0QBRXcycSp7ImA9WxRVFUk.&quot;">
//!   <id>http://www.google.com/calendar/feeds/default/private/full</id>
//!   <entry gd:kind="calendar#event">
//!     <title>Meeting</title>
//!   </entry>
//! </feed>
//! ```
//!
//! Parsed against `atom:feed`, the `entry` is bound to `atom:entry` and
//! narrowed to whatever kind is registered for `calendar#event`; unknown
//! kinds stay plain entries.

pub mod de;
pub mod feed;
pub mod reader;
pub mod ser;

pub use de::{from_xml_reader, from_xml_slice, from_xml_str, from_xml_str_generic};
pub use feed::FeedParser;
pub use ser::{XmlGenerator, to_debug_string, to_xml_string, to_xml_string_named, to_xml_vec, to_xml_writer};
