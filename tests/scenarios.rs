mod common;

use common::locator;
use tmdm::construct::Themes;
use tmdm::system::{AUTOMERGE, TopicMapSystemFactory};
use tmdm::{Locator, TopicMapError, TopicMapSystem};

fn setup(automerge: bool) -> TopicMapSystem {
    common::init_tracing();
    let mut factory = TopicMapSystemFactory::new();
    factory.set_feature(AUTOMERGE, automerge).unwrap();
    factory.new_topic_map_system()
}

#[test]
fn creating_by_the_same_item_identifier_fails_without_automerge() {
    let mut system = setup(false);
    let shared = system.create_topic_map(&locator("http://x/")).unwrap();
    let mut map = shared.lock().unwrap();
    let iid = locator("http://x/a");
    map.create_topic_by_item_identifier(&iid).unwrap();
    let error = map.create_topic_by_item_identifier(&iid).unwrap_err();
    assert!(matches!(error, TopicMapError::IdentityConstraint { .. }), "got {error:?}");
    assert_eq!(map.topics().len(), 1);
}

#[test]
fn creating_by_the_same_item_identifier_yields_one_topic_with_automerge() {
    let mut system = setup(true);
    let shared = system.create_topic_map(&locator("http://x/")).unwrap();
    let mut map = shared.lock().unwrap();
    let iid = locator("http://x/a");
    let first = map.create_topic_by_item_identifier(&iid).unwrap();
    let second = map.create_topic_by_item_identifier(&iid).unwrap();
    assert_eq!(first, second);
    assert_eq!(map.topics().len(), 1);
    assert_eq!(map.item_identifiers(first).unwrap().len(), 1);
}

#[test]
fn equal_default_names_collapse_on_merge() {
    let mut system = setup(true);
    let shared = system.create_topic_map(&locator("http://x/")).unwrap();
    let mut map = shared.lock().unwrap();
    let a = map.create_topic().unwrap();
    let b = map.create_topic().unwrap();
    map.create_name(a, "TMAPI", &[]).unwrap();
    map.create_name(b, "TMAPI", &[]).unwrap();
    map.merge_in(a, b).unwrap();
    assert_eq!(map.names(a).unwrap().len(), 1);
}

#[test]
fn relative_references_resolve_against_the_base() {
    let base = Locator::new("http://a/b/c/d;p?q").unwrap();
    assert_eq!(base.resolve("../../g").unwrap().reference(), "http://a/g");
}

#[test]
fn merging_a_topic_with_itself_is_idempotent() {
    let mut system = setup(true);
    let shared = system.create_topic_map(&locator("http://x/")).unwrap();
    let mut map = shared.lock().unwrap();
    let topic = map.create_topic_by_subject_identifier(&locator("http://x/s")).unwrap();
    let class = map.create_topic().unwrap();
    map.add_type(topic, class).unwrap();
    map.create_name(topic, "Topic", &[]).unwrap();
    let count = map.topics().len();
    let identifiers = map.item_identifiers(topic).unwrap().clone();
    let subjects = map.subject_identifiers(topic).unwrap().clone();
    let names = map.names(topic).unwrap().clone();
    let types = map.types(topic).unwrap().clone();
    map.merge_in(topic, topic).unwrap();
    assert_eq!(map.topics().len(), count);
    assert_eq!(map.item_identifiers(topic).unwrap(), &identifiers);
    assert_eq!(map.subject_identifiers(topic).unwrap(), &subjects);
    assert_eq!(map.names(topic).unwrap(), &names);
    assert_eq!(map.types(topic).unwrap(), &types);
}

#[test]
fn merging_unions_disjoint_subject_identifiers() {
    let mut system = setup(true);
    let shared = system.create_topic_map(&locator("http://x/")).unwrap();
    let mut map = shared.lock().unwrap();
    let s1 = locator("http://x/s1");
    let s2 = locator("http://x/s2");
    let a = map.create_topic_by_subject_identifier(&s1).unwrap();
    let b = map.create_topic_by_subject_identifier(&s2).unwrap();
    map.merge_in(a, b).unwrap();
    let subjects = map.subject_identifiers(a).unwrap();
    assert_eq!(subjects.len(), 2);
    assert!(subjects.contains(&s1) && subjects.contains(&s2));
    assert!(!map.topics().contains(&b));
}

#[test]
fn reifiers_of_different_associations_refuse_to_merge() {
    let mut system = setup(true);
    let shared = system.create_topic_map(&locator("http://x/")).unwrap();
    let mut map = shared.lock().unwrap();
    let kind = map.create_topic().unwrap();
    let x = map.create_association(kind, &[]).unwrap();
    let y = map.create_association(kind, &[]).unwrap();
    let a = map.create_topic().unwrap();
    let b = map.create_topic().unwrap();
    map.set_reifier(x, Some(a)).unwrap();
    map.set_reifier(y, Some(b)).unwrap();
    let error = map.merge_in(a, b).unwrap_err();
    assert!(error.is_model_constraint(), "got {error:?}");
    assert!(map.topics().contains(&a) && map.topics().contains(&b));
    assert_eq!(map.reifier(x).unwrap(), Some(a));
    assert_eq!(map.reifier(y).unwrap(), Some(b));
    assert_eq!(map.associations().len(), 2);
}

#[test]
fn duplicate_names_keep_both_item_identifiers() {
    let mut system = setup(true);
    let shared = system.create_topic_map(&locator("http://x/")).unwrap();
    let mut map = shared.lock().unwrap();
    let t1 = map.create_topic().unwrap();
    let t2 = map.create_topic().unwrap();
    let first = map.create_name(t1, "Name", &[]).unwrap();
    let second = map.create_name(t2, "Name", &[]).unwrap();
    let iid1 = locator("http://x/#iid1");
    let iid2 = locator("http://x/#iid2");
    map.add_item_identifier(first, &iid1).unwrap();
    map.add_item_identifier(second, &iid2).unwrap();
    map.merge_in(t1, t2).unwrap();
    let names = map.names(t1).unwrap().clone();
    assert_eq!(names.len(), 1);
    let survivor = names.into_iter().next().unwrap();
    let identifiers = map.item_identifiers(survivor).unwrap();
    assert!(identifiers.contains(&iid1) && identifiers.contains(&iid2));
}

#[test]
fn an_association_type_is_in_use_until_retyped() {
    let mut system = setup(true);
    let shared = system.create_topic_map(&locator("http://x/")).unwrap();
    let mut map = shared.lock().unwrap();
    let kind = map.create_topic().unwrap();
    let other = map.create_topic().unwrap();
    let association = map.create_association(kind, &[]).unwrap();
    let error = map.remove_topic(kind).unwrap_err();
    assert!(matches!(error, TopicMapError::TopicInUse { .. }), "got {error:?}");
    map.set_type(association, other).unwrap();
    let count = map.topics().len();
    map.remove_topic(kind).unwrap();
    assert_eq!(map.topics().len(), count - 1);
}

#[test]
fn variant_scope_follows_the_name() {
    let mut system = setup(true);
    let shared = system.create_topic_map(&locator("http://x/")).unwrap();
    let mut map = shared.lock().unwrap();
    let owner = map.create_topic().unwrap();
    let s1 = map.create_topic().unwrap();
    let s2 = map.create_topic().unwrap();
    let t1 = map.create_topic().unwrap();
    let name = map.create_name(owner, "Owner", &[s1, s2]).unwrap();
    let variant = map.create_variant(name, "owner", &[t1]).unwrap();
    assert_eq!(map.scope(variant).unwrap(), [s1, s2, t1].into_iter().collect::<Themes>());
    map.remove_theme(name, s1).unwrap();
    assert_eq!(map.scope(variant).unwrap(), [s2, t1].into_iter().collect::<Themes>());
}

#[test]
fn merging_maps_leaves_the_source_untouched() {
    let mut system = setup(true);
    let target = system.create_topic_map(&locator("http://x/one")).unwrap();
    let source = system.create_topic_map(&locator("http://x/two")).unwrap();
    let (topic, association) = {
        let mut map = source.lock().unwrap();
        let topic = map.create_topic_by_subject_identifier(&locator("http://x/s")).unwrap();
        let kind = map.create_topic().unwrap();
        let association = map.create_association(kind, &[]).unwrap();
        map.create_role(association, kind, topic).unwrap();
        map.create_name(topic, "Source", &[]).unwrap();
        (topic, association)
    };
    let (topics, associations, names, roles) = {
        let map = source.lock().unwrap();
        (
            map.topics().clone(),
            map.associations().clone(),
            map.names(topic).unwrap().clone(),
            map.roles(association).unwrap().clone(),
        )
    };
    system.merge_topic_maps(&target, &source).unwrap();
    let after = source.lock().unwrap();
    assert_eq!(after.topics(), &topics);
    assert_eq!(after.associations(), &associations);
    assert_eq!(after.names(topic).unwrap(), &names);
    assert_eq!(after.roles(association).unwrap(), &roles);
    assert_eq!(after.topic_by_subject_identifier(&locator("http://x/s")), Some(topic));
    let merged = target.lock().unwrap();
    assert!(merged.topic_by_subject_identifier(&locator("http://x/s")).is_some());
    assert_eq!(merged.associations().len(), 1);
}
