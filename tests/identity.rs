mod common;

use common::locator;
use tmdm::construct::ConstructRef;
use tmdm::system::AUTOMERGE;
use tmdm::{TopicMap, TopicMapError};

fn setup() -> TopicMap {
    common::topic_map(&[])
}

#[test]
fn generated_item_identifiers_resolve_against_the_map() {
    let mut map = setup();
    let topic = map.create_topic().unwrap();
    let identifiers = map.item_identifiers(topic).unwrap();
    assert_eq!(identifiers.len(), 1);
    let identifier = identifiers.iter().next().unwrap().clone();
    assert!(identifier.reference().starts_with("http://example.org/map/#t"));
    assert_eq!(map.construct_by_item_identifier(&identifier), Some(ConstructRef::Topic(topic)));
}

#[test]
fn subject_identifiers_find_the_same_topic() {
    let mut map = setup();
    let sid = locator("http://example.org/person");
    let first = map.create_topic_by_subject_identifier(&sid).unwrap();
    let second = map.create_topic_by_subject_identifier(&sid).unwrap();
    assert_eq!(first, second);
    assert_eq!(map.topics().len(), 1);
    assert_eq!(map.topic_by_subject_identifier(&sid), Some(first));
}

#[test]
fn colliding_subject_identifiers_merge_with_automerge() {
    let mut map = setup();
    let a = map.create_topic_by_subject_identifier(&locator("http://example.org/a")).unwrap();
    let b = map.create_topic_by_subject_identifier(&locator("http://example.org/b")).unwrap();
    map.add_subject_identifier(a, &locator("http://example.org/b")).unwrap();
    assert_eq!(map.topics().len(), 1, "the topics should have been merged");
    assert!(map.topics().contains(&a));
    assert!(!map.topics().contains(&b));
    assert_eq!(map.subject_identifiers(a).unwrap().len(), 2);
    assert_eq!(map.topic_by_subject_identifier(&locator("http://example.org/b")), Some(a));
}

#[test]
fn colliding_subject_identifiers_are_refused_without_automerge() {
    let mut map = common::topic_map(&[(AUTOMERGE, false)]);
    let a = map.create_topic_by_subject_identifier(&locator("http://example.org/a")).unwrap();
    let b = map.create_topic_by_subject_identifier(&locator("http://example.org/b")).unwrap();
    let error = map.add_subject_identifier(a, &locator("http://example.org/b")).unwrap_err();
    assert!(matches!(error, TopicMapError::IdentityConstraint { .. }), "got {error:?}");
    assert!(error.is_model_constraint());
    assert_eq!(error.reporter(), Some(ConstructRef::Topic(a)));
    assert_eq!(map.topics().len(), 2, "nothing should have changed");
    assert_eq!(map.subject_identifiers(a).unwrap().len(), 1);
    assert_eq!(map.topic_by_subject_identifier(&locator("http://example.org/b")), Some(b));
}

#[test]
fn item_identifier_matching_a_subject_identifier_merges() {
    let mut map = setup();
    let iri = locator("http://example.org/shared");
    let a = map.create_topic_by_subject_identifier(&iri).unwrap();
    let b = map.create_topic().unwrap();
    map.add_item_identifier(b, &iri).unwrap();
    assert_eq!(map.topics().len(), 1);
    assert!(map.topics().contains(&b));
    assert!(!map.topics().contains(&a));
    assert!(map.subject_identifiers(b).unwrap().contains(&iri));
    assert!(map.item_identifiers(b).unwrap().contains(&iri));
}

#[test]
fn item_identifier_matching_a_subject_identifier_is_refused_without_automerge() {
    let mut map = common::topic_map(&[(AUTOMERGE, false)]);
    let iri = locator("http://example.org/shared");
    map.create_topic_by_subject_identifier(&iri).unwrap();
    let b = map.create_topic().unwrap();
    let error = map.add_item_identifier(b, &iri).unwrap_err();
    assert!(matches!(error, TopicMapError::IdentityConstraint { .. }));
    assert!(!map.item_identifiers(b).unwrap().contains(&iri));
}

#[test]
fn item_identifiers_of_statements_never_merge() {
    let mut map = setup();
    let iri = locator("http://example.org/statement");
    let topic = map.create_topic().unwrap();
    let name = map.create_name(topic, "Alice", &[]).unwrap();
    map.add_item_identifier(name, &iri).unwrap();
    let error = map.add_item_identifier(topic, &iri).unwrap_err();
    match error {
        TopicMapError::IdentityConstraint { reporter, existing, .. } => {
            assert_eq!(reporter, ConstructRef::Topic(topic));
            assert_eq!(existing, ConstructRef::Name(name));
        }
        other => panic!("unexpected error {other:?}"),
    }
    let occurrence_type = map.create_topic().unwrap();
    let occurrence = map.create_occurrence(topic, occurrence_type, "x", &[]).unwrap();
    assert!(map.add_item_identifier(occurrence, &iri).is_err());
}

#[test]
fn statements_cannot_take_a_subject_identifier_as_item_identifier() {
    let mut map = setup();
    let iri = locator("http://example.org/person");
    let person = map.create_topic_by_subject_identifier(&iri).unwrap();
    let association = map.create_association(person, &[]).unwrap();
    let error = map.add_item_identifier(association, &iri).unwrap_err();
    assert!(matches!(error, TopicMapError::IdentityConstraint { .. }));
}

#[test]
fn create_by_item_identifier_returns_the_holder_with_automerge() {
    let mut map = setup();
    let iri = locator("http://example.org/x");
    let topic = map.create_topic_by_item_identifier(&iri).unwrap();
    assert_eq!(map.create_topic_by_item_identifier(&iri).unwrap(), topic);
    assert_eq!(map.topics().len(), 1);
}

#[test]
fn create_by_item_identifier_is_refused_without_automerge() {
    let mut map = common::topic_map(&[(AUTOMERGE, false)]);
    let iri = locator("http://example.org/x");
    map.create_topic_by_item_identifier(&iri).unwrap();
    let error = map.create_topic_by_item_identifier(&iri).unwrap_err();
    assert!(matches!(error, TopicMapError::IdentityConstraint { .. }));
    assert_eq!(map.topics().len(), 1);
}

#[test]
fn create_by_subject_locator_is_create_or_get() {
    let mut map = setup();
    let slo = locator("http://example.org/page.html");
    let topic = map.create_topic_by_subject_locator(&slo).unwrap();
    assert_eq!(map.create_topic_by_subject_locator(&slo).unwrap(), topic);
    assert_eq!(map.topic_by_subject_locator(&slo), Some(topic));
    let other = map.create_topic().unwrap();
    map.add_subject_locator(other, &slo).unwrap();
    assert_eq!(map.topics().len(), 1, "sharing a subject locator merges");
}

#[test]
fn removed_identifiers_can_be_reused() {
    let mut map = common::topic_map(&[(AUTOMERGE, false)]);
    let iri = locator("http://example.org/x");
    let a = map.create_topic().unwrap();
    let b = map.create_topic().unwrap();
    map.add_item_identifier(a, &iri).unwrap();
    map.remove_item_identifier(a, &iri).unwrap();
    assert_eq!(map.construct_by_item_identifier(&iri), None);
    map.add_item_identifier(b, &iri).unwrap();
    assert_eq!(map.construct_by_item_identifier(&iri), Some(ConstructRef::Topic(b)));
}

#[test]
fn the_topic_map_carries_item_identifiers() {
    let mut map = setup();
    let iri = locator("http://example.org/map-id");
    let construct = map.as_construct();
    map.add_item_identifier(construct, &iri).unwrap();
    assert_eq!(map.construct_by_item_identifier(&iri), Some(construct));
    map.clear().unwrap();
    assert_eq!(map.construct_by_item_identifier(&iri), Some(construct), "clear keeps the map itself");
}

#[test]
fn constructs_of_other_maps_are_rejected() {
    let mut map = setup();
    let mut other = setup();
    let foreign = other.create_topic().unwrap();
    let local = map.create_topic().unwrap();
    let error = map.add_type(local, foreign).unwrap_err();
    assert!(error.is_model_constraint());
    assert!(map.add_subject_identifier(foreign, &locator("http://example.org/y")).is_err());
    assert!(map.types(local).unwrap().is_empty());
}
