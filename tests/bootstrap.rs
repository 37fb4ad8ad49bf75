mod common;

use std::fs;
use std::path::PathBuf;

use common::locator;
use tmdm::bootstrap::{Bootstrap, DEFAULT_ENGINE, EngineRegistry, FACTORY_INTERFACE};
use tmdm::system::{AUTOMERGE, READ_ONLY, TYPE_INSTANCE_ASSOCIATIONS, TopicMapSystemFactory};
use tmdm::TopicMapError;

fn setup() -> EngineRegistry {
    common::init_tracing();
    EngineRegistry::with_defaults()
}

fn config_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("tmdm-{}-{}.toml", std::process::id(), name));
    fs::write(&path, content).unwrap();
    path
}

fn strict() -> TopicMapSystemFactory {
    let mut factory = TopicMapSystemFactory::new();
    factory.set_feature(AUTOMERGE, false).unwrap();
    factory
}

#[test]
fn factory_features_have_defaults() {
    let factory = TopicMapSystemFactory::new();
    assert!(factory.feature(AUTOMERGE).unwrap());
    assert!(!factory.feature(READ_ONLY).unwrap());
    assert!(!factory.feature(TYPE_INSTANCE_ASSOCIATIONS).unwrap());
    assert!(factory.has_feature(AUTOMERGE));
    assert!(!factory.has_feature("http://example.org/unknown"));
}

#[test]
fn unknown_and_unsupported_features_are_refused() {
    let mut factory = TopicMapSystemFactory::new();
    let error = factory.set_feature("http://example.org/unknown", true).unwrap_err();
    assert!(matches!(error, TopicMapError::FeatureNotRecognized(_)));
    assert!(matches!(
        factory.feature("http://example.org/unknown"),
        Err(TopicMapError::FeatureNotRecognized(_))
    ));
    let error = factory.set_feature(READ_ONLY, true).unwrap_err();
    assert!(matches!(error, TopicMapError::FeatureNotSupported(_)));
    factory.set_feature(READ_ONLY, false).unwrap();
}

#[test]
fn systems_keep_the_factory_settings() {
    let mut factory = TopicMapSystemFactory::new();
    factory.set_feature(TYPE_INSTANCE_ASSOCIATIONS, true).unwrap();
    factory.set_property("storage", "memory");
    let system = factory.new_topic_map_system();
    factory.set_feature(TYPE_INSTANCE_ASSOCIATIONS, false).unwrap();
    assert!(system.feature(TYPE_INSTANCE_ASSOCIATIONS).unwrap());
    assert_eq!(system.property("storage"), Some("memory"));
    assert_eq!(system.property("missing"), None);
}

#[test]
fn the_registry_provides_the_default_engine() {
    let registry = setup();
    assert_eq!(registry.provider(FACTORY_INTERFACE), Some(DEFAULT_ENGINE));
    let factory = Bootstrap::new().resolve(&registry).unwrap();
    assert!(factory.feature(AUTOMERGE).unwrap());
}

#[test]
fn an_override_wins() {
    let mut registry = setup();
    registry.register("strict", strict);
    let factory = Bootstrap::new().with_override("strict").resolve(&registry).unwrap();
    assert!(!factory.feature(AUTOMERGE).unwrap());
}

#[test]
fn unregistered_candidates_fall_through() {
    let registry = setup();
    let factory = Bootstrap::new().with_override("missing").resolve(&registry).unwrap();
    assert!(factory.feature(AUTOMERGE).unwrap());
}

#[test]
fn no_engine_is_a_configuration_error() {
    let registry = EngineRegistry::new();
    let error = Bootstrap::new().resolve(&registry).unwrap_err();
    assert!(matches!(error, TopicMapError::Config(_)), "got {error:?}");
}

#[test]
fn the_configuration_file_chooses_engine_and_features() {
    let mut registry = setup();
    registry.register("strict", strict);
    let path = config_file(
        "engine",
        "engine = \"strict\"\ntype_instance_associations = true\n\n[properties]\nowner = \"tests\"\n",
    );
    let bootstrap = Bootstrap::new().with_config_file(&path);
    let settings = bootstrap.settings().unwrap();
    assert_eq!(settings.engine.as_deref(), Some("strict"));
    let factory = bootstrap.resolve(&registry).unwrap();
    assert!(!factory.feature(AUTOMERGE).unwrap());
    assert!(factory.feature(TYPE_INSTANCE_ASSOCIATIONS).unwrap());
    assert_eq!(factory.property("owner"), Some("tests"));
    fs::remove_file(path).unwrap();
}

#[test]
fn configuring_read_only_fails() {
    let registry = setup();
    let path = config_file("read-only", "read_only = true\n");
    let error = Bootstrap::new().with_config_file(&path).resolve(&registry).unwrap_err();
    assert!(matches!(error, TopicMapError::FeatureNotSupported(_)));
    fs::remove_file(path).unwrap();
}

#[test]
fn a_missing_configuration_file_is_an_error() {
    let registry = setup();
    let error = Bootstrap::new()
        .with_config_file("/nonexistent/tmdm.toml")
        .resolve(&registry)
        .unwrap_err();
    assert!(matches!(error, TopicMapError::Config(_)));
}

#[test]
fn topic_maps_are_registered_by_locator() {
    let mut system = TopicMapSystemFactory::new().new_topic_map_system();
    let address = system.create_locator("http://example.org/map").unwrap();
    let map = system.create_topic_map(&address).unwrap();
    assert_eq!(system.locators(), vec![address.clone()]);
    assert!(system.topic_map(&address).is_some());
    let error = system.create_topic_map(&address).unwrap_err();
    assert!(matches!(error, TopicMapError::TopicMapExists { .. }));
    assert_eq!(map.lock().unwrap().locator(), &address);
    assert!(system.topic_map(&locator("http://example.org/other")).is_none());
}

#[test]
fn removed_topic_maps_stop_working() {
    let mut system = TopicMapSystemFactory::new().new_topic_map_system();
    let address = locator("http://example.org/map");
    let map = system.create_topic_map(&address).unwrap();
    system.remove_topic_map(&address).unwrap();
    assert!(system.locators().is_empty());
    let error = map.lock().unwrap().create_topic().unwrap_err();
    assert!(error.is_model_constraint());
    system.create_topic_map(&address).unwrap();
}

#[test]
fn closing_the_system_closes_every_map() {
    let mut system = TopicMapSystemFactory::new().new_topic_map_system();
    let map = system.create_topic_map(&locator("http://example.org/one")).unwrap();
    let topic = map.lock().unwrap().create_topic().unwrap();
    system.close().unwrap();
    let guard = map.lock().unwrap();
    assert!(guard.is_closed());
    assert!(guard.item_identifiers(topic).is_err());
}

#[test]
fn clearing_a_topic_map_keeps_it_registered() {
    let mut system = TopicMapSystemFactory::new().new_topic_map_system();
    let address = locator("http://example.org/map");
    let shared = system.create_topic_map(&address).unwrap();
    {
        let mut map = shared.lock().unwrap();
        map.create_topic().unwrap();
        let root = map.as_construct();
        map.remove(root).unwrap();
        assert!(map.topics().is_empty());
        assert!(!map.is_closed());
    }
    assert_eq!(system.locators(), vec![address.clone()]);
    system.remove_topic_map(&address).unwrap();
    assert!(system.topic_map(&address).is_none());
    assert!(shared.lock().unwrap().is_closed());
}
