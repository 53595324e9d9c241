//! Element graph, registry and narrowing tests against the Atom vocabulary.

use gdata_model::atom::{
    self, AtomElement, BoundElement, Category, Content, Entry, Feed, Link, OutOfLineContent,
    Person, TextContent, TextType, rel,
};
use gdata_model::atom::entry::{ENTRY, entry_metadata};
use gdata_model::key::{AttributeKey, ElementKey, ElementKind};
use gdata_model::metadata::Cardinality;
use gdata_model::namespace::{GD_NS, QName};
use gdata_model::narrow::{narrow, resolve};
use gdata_model::value::{Timestamp, ValueType};
use gdata_model::{Element, MetadataRegistry, ModelError};
use pretty_assertions::assert_eq;

const EVENT_KIND: ElementKind = ElementKind::new("test:event");
const WHERE: ElementKey = ElementKey::new(
    QName::of_static(Some(GD_NS), "where"),
    ValueType::Void,
    ElementKind::new("gd:where"),
);
const VALUE_STRING: AttributeKey = AttributeKey::text("valueString");

/// Atom registry extended with an event entry kind that declares `gd:where`.
fn event_registry() -> (MetadataRegistry, ElementKey) {
    let registry = MetadataRegistry::new();
    atom::register_metadata(&registry).unwrap();
    registry
        .register(
            gdata_model::ElementMetadata::builder(WHERE)
                .required_attribute(VALUE_STRING)
                .build(),
        )
        .unwrap();

    let event = ENTRY.with_kind(EVENT_KIND);
    registry
        .register(
            entry_metadata(event.clone())
                .child(WHERE, Cardinality::Multiple)
                .build(),
        )
        .unwrap();
    registry
        .adapt(&ENTRY, "http://schemas.google.com/g/2005#event", &event)
        .unwrap();
    (registry, event)
}

#[test]
fn test_entry_narrows_to_registered_kind() {
    let (registry, event) = event_registry();

    let mut entry = Entry::new();
    entry.set_title("Meeting").unwrap();
    entry
        .add_category(Category::kind("http://schemas.google.com/g/2005#event").unwrap())
        .unwrap();

    let narrowed = narrow(entry.into_element(), &registry);
    assert_eq!(narrowed.key(), &event);

    let entry = Entry::from_any(narrowed).unwrap();
    assert_eq!(entry.title(), Some("Meeting"));
    assert_eq!(entry.categories().len(), 1);
}

#[test]
fn test_ambiguous_kind_leaves_entry_generic() {
    let (registry, _) = event_registry();

    let mut entry = Entry::new();
    entry
        .add_category(Category::kind("http://schemas.google.com/g/2005#event").unwrap())
        .unwrap();
    entry
        .add_category(Category::kind("http://schemas.google.com/g/2005#contact").unwrap())
        .unwrap();

    let narrowed = narrow(entry.into_element(), &registry);
    assert_eq!(narrowed.key(), &ENTRY);
}

#[test]
fn test_narrowing_twice_changes_nothing() {
    let (registry, _) = event_registry();
    let mut entry = Entry::new();
    entry
        .add_category(Category::kind("http://schemas.google.com/g/2005#event").unwrap())
        .unwrap();
    let once = narrow(entry.into_element(), &registry);
    let twice = narrow(once.clone(), &registry);
    assert_eq!(once, twice);
}

#[test]
fn test_resolve_validates_narrowed_children() {
    let (registry, event) = event_registry();

    let mut element = Element::new(event.clone());
    element.add_element(WHERE, Element::new(WHERE)).unwrap();
    let err = resolve(element, &registry).unwrap_err();
    assert!(matches!(err, ModelError::Validation(_)));
    assert!(err.to_string().contains("valueString"));

    let mut place = Element::new(WHERE);
    place.set_attribute(VALUE_STRING, "Room 1").unwrap();
    let mut element = Element::new(event);
    element.add_element(WHERE, place).unwrap();
    assert!(resolve(element, &registry).is_ok());
}

#[test]
fn test_conflicting_cardinality_is_rejected() {
    let (registry, _) = event_registry();
    let other = ElementKey::new(
        QName::unqualified("other"),
        ValueType::Void,
        ElementKind::new("test:other"),
    );
    let err = registry
        .register(
            gdata_model::ElementMetadata::builder(other)
                .child(WHERE, Cardinality::Single)
                .build(),
        )
        .unwrap_err();
    assert!(matches!(err, ModelError::CardinalityConflict { .. }));
}

#[test]
fn test_feed_view_over_entries() {
    let registry = atom::default_registry();

    let mut feed = Feed::new();
    feed.set_id("urn:feed").unwrap();
    feed.set_title("Feed").unwrap();
    feed.set_updated(Timestamp::parse("2024-01-02T03:04:05Z").unwrap())
        .unwrap();
    feed.add_link(Link::new(rel::NEXT, Some(atom::ATOM_CONTENT_TYPE), "http://example.com/?start=26").unwrap())
        .unwrap();

    let mut entry = Entry::new();
    entry.set_id("urn:entry").unwrap();
    entry.add_author(Person::author("Grace").unwrap()).unwrap();
    entry.set_content(TextContent::html("<p>hi</p>").unwrap()).unwrap();
    feed.add_entry(entry).unwrap();

    let feed = Feed::from_element(resolve(feed.into_element(), &registry).unwrap()).unwrap();
    assert_eq!(
        feed.next_link().and_then(|l| l.href().map(str::to_string)).as_deref(),
        Some("http://example.com/?start=26")
    );
    let entries = feed.entries();
    assert_eq!(entries.len(), 1);
    match entries[0].content() {
        Some(Content::Text(text)) => assert_eq!(text.text_type(), Some(TextType::Html)),
        other => panic!("unexpected content {other:?}"),
    }
}

#[test]
fn test_out_of_line_content_requires_src_on_resolve() {
    let registry = atom::default_registry();
    let content = OutOfLineContent::new("http://example.com/a.jpg", Some("image/jpeg")).unwrap();
    let mut element = content.into_element();
    element.remove_attribute(&atom::content::SRC).unwrap();

    let mut entry = Entry::new();
    entry.set_content(Content::Other(element)).unwrap();
    assert!(resolve(entry.into_element(), &registry).is_err());
}

#[test]
fn test_locked_graph_rejects_changes() {
    let mut entry = Entry::new();
    entry.set_title("Fixed").unwrap();
    let mut element = entry.into_element();
    element.lock();
    assert!(element.is_locked());
    assert!(matches!(
        element.set_attribute(atom::ETAG, "W/\"1\""),
        Err(ModelError::Locked(_))
    ));
}
