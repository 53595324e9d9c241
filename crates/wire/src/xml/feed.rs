//! Lazy feed parsing.
//!
//! [`FeedParser`] reads the feed header eagerly and stops in front of the
//! first entry. Entries are then parsed one at a time, so memory use is
//! bounded by the largest entry instead of the whole feed. Header elements
//! that follow the entries are merged into the header as they are read.

use std::io::BufRead;

use gdata_model::narrow::narrow;
use gdata_model::{Element, ElementKey, ModelError, QName};
use tracing::debug;

use crate::context::WireContext;
use crate::error::Result;
use crate::xml::de::{ElementParser, Frame, Stop};
use crate::xml::reader::XmlEvent;

/// Single-pass reader over the entries of a feed document.
///
/// Pulling past the last entry returns `Ok(None)`; the parser cannot be
/// restarted. The underlying reader is released when the parser is dropped
/// or [closed](Self::close).
///
/// ```
/// use gdata_model::atom::{entry::ENTRY, feed::FEED};
/// use gdata_wire::{FeedParser, WireContext};
///
/// let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
///   <title>Feed</title>
///   <entry><id>1</id></entry>
///   <entry><id>2</id></entry>
/// </feed>"#;
/// let ctx = WireContext::atom();
/// let mut parser = FeedParser::new(&ctx, xml.as_bytes(), &FEED, &ENTRY)?;
/// assert_eq!(parser.feed().element_count(), 1);
/// assert_eq!(parser.by_ref().count(), 2);
/// assert!(parser.next_entry()?.is_none());
/// # Ok::<(), gdata_wire::WireError>(())
/// ```
pub struct FeedParser<'c, R: BufRead> {
    parser: ElementParser<'c, R>,
    entry_key: ElementKey,
    entry_name: QName,
    /// Open feed element while entries remain
    header: Option<Frame>,
    /// Narrowed snapshot of the header
    feed: Element,
    entries_read: usize,
    done: bool,
}

impl<'c, R: BufRead> FeedParser<'c, R> {
    /// Reads the feed header up to the first entry.
    pub fn new(
        ctx: &'c WireContext,
        source: R,
        feed_key: &ElementKey,
        entry_key: &ElementKey,
    ) -> Result<Self> {
        let entry_name = entry_key
            .id()
            .cloned()
            .ok_or_else(|| ModelError::UnnamedElement(entry_key.to_string()))?;

        let mut parser = ElementParser::new(ctx, source);
        let (name, attributes) = parser.read_root()?;
        parser.check_root(&name, feed_key)?;
        let mut frame = parser.open(feed_key.clone(), attributes)?;

        let mut this = match parser.read_children(&mut frame, Some(&entry_name))? {
            Stop::Child => {
                let feed = narrow(frame.element.clone(), &ctx.registry);
                Self {
                    parser,
                    entry_key: entry_key.clone(),
                    entry_name,
                    header: Some(frame),
                    feed,
                    entries_read: 0,
                    done: false,
                }
            }
            Stop::End => {
                let feed = parser.close(frame)?;
                Self {
                    parser,
                    entry_key: entry_key.clone(),
                    entry_name,
                    header: None,
                    feed,
                    entries_read: 0,
                    done: false,
                }
            }
        };
        if this.header.is_none() {
            this.finish()?;
        }
        debug!(feed = %this.feed.key(), "feed header parsed");
        Ok(this)
    }

    /// The feed header. Complete once all entries have been read.
    pub fn feed(&self) -> &Element {
        &self.feed
    }

    /// Number of entries returned so far.
    pub fn entries_read(&self) -> usize {
        self.entries_read
    }

    /// Parses the next entry, or returns `None` after the last one.
    pub fn next_entry(&mut self) -> Result<Option<Element>> {
        if self.done {
            return Ok(None);
        }
        let result = self.read_entry();
        if result.is_err() {
            self.done = true;
        }
        result
    }

    /// Stops reading and releases the underlying reader.
    pub fn close(self) {
        debug!(entries = self.entries_read, "feed parser closed");
    }

    fn read_entry(&mut self) -> Result<Option<Element>> {
        loop {
            let Some(frame) = self.header.as_mut() else {
                self.finish()?;
                return Ok(None);
            };
            match self.parser.events.next_event()? {
                XmlEvent::StartElement { name, attributes } if name == self.entry_name => {
                    let entry = self.parser.parse_element(self.entry_key.clone(), attributes)?;
                    self.parser.validate(&entry)?;
                    self.entries_read += 1;
                    debug!(index = self.entries_read, key = %entry.key(), "entry parsed");
                    return Ok(Some(entry));
                }
                XmlEvent::StartElement { name, attributes } => {
                    self.parser.read_child(frame, name, attributes)?;
                }
                XmlEvent::Text(_) | XmlEvent::StartDocument => continue,
                XmlEvent::EndElement { .. } => {
                    if let Some(frame) = self.header.take() {
                        self.feed = self.parser.close(frame)?;
                    }
                }
                XmlEvent::EndDocument => {
                    return Err(self.parser.events.error("unexpected end of document"));
                }
            }
        }
    }

    /// Completes the document once the feed end tag has been read.
    fn finish(&mut self) -> Result<()> {
        self.done = true;
        self.parser.finish_document()?;
        self.parser.validate(&self.feed)?;
        debug!(entries = self.entries_read, "feed fully read");
        Ok(())
    }
}

impl<R: BufRead> Iterator for FeedParser<'_, R> {
    type Item = Result<Element>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WireConfig;
    use gdata_model::atom::entry::ENTRY;
    use gdata_model::atom::feed::FEED;
    use gdata_model::atom::{AtomElement, BoundElement, Entry, Feed};

    const FEED_XML: &str = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:openSearch="http://a9.com/-/spec/opensearch/1.1/">
  <id>urn:feed</id>
  <title>Feed</title>
  <openSearch:totalResults>2</openSearch:totalResults>
  <entry><id>urn:1</id><title>One</title></entry>
  <entry><id>urn:2</id><title>Two</title></entry>
  <link rel="next" href="http://example.com/?page=2"/>
</feed>"#;

    fn ctx() -> WireContext {
        WireContext::atom().with_config(WireConfig::for_testing())
    }

    #[test]
    fn test_header_before_entries() {
        let ctx = ctx();
        let parser = FeedParser::new(&ctx, FEED_XML.as_bytes(), &FEED, &ENTRY).unwrap();
        let feed = Feed::from_element(parser.feed().clone()).unwrap();
        assert_eq!(feed.title(), Some("Feed"));
        assert_eq!(feed.total_results(), Some(2));
        assert!(feed.entries().is_empty());
        assert!(feed.next_link().is_none());
    }

    #[test]
    fn test_entries_then_trailing_header() {
        let ctx = ctx();
        let mut parser = FeedParser::new(&ctx, FEED_XML.as_bytes(), &FEED, &ENTRY).unwrap();
        let titles: Vec<String> = parser
            .by_ref()
            .map(|entry| {
                Entry::from_any(entry.unwrap())
                    .unwrap()
                    .title()
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();
        assert_eq!(titles, vec!["One".to_string(), "Two".to_string()]);
        assert_eq!(parser.entries_read(), 2);

        let feed = Feed::from_element(parser.feed().clone()).unwrap();
        assert!(feed.next_link().is_some());
        assert!(parser.next_entry().unwrap().is_none());
        parser.close();
    }

    #[test]
    fn test_feed_without_entries() {
        let ctx = ctx();
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>Empty</title></feed>"#;
        let mut parser = FeedParser::new(&ctx, xml.as_bytes(), &FEED, &ENTRY).unwrap();
        assert!(parser.next_entry().unwrap().is_none());
        assert_eq!(parser.entries_read(), 0);
    }

    #[test]
    fn test_truncated_feed_fails_once() {
        let ctx = ctx();
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><id>1</id></entry><entry><id>"#;
        let mut parser = FeedParser::new(&ctx, xml.as_bytes(), &FEED, &ENTRY).unwrap();
        assert!(parser.next_entry().unwrap().is_some());
        assert!(parser.next_entry().is_err());
        assert!(parser.next_entry().unwrap().is_none());
    }
}
