#![allow(dead_code)]

use std::sync::Arc;

use tmdm::system::TopicMapSystemFactory;
use tmdm::{Locator, TopicMap};
use tracing_subscriber::EnvFilter;

/// Log output for a test run, filtered through `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn locator(reference: &str) -> Locator {
    Locator::new(reference).unwrap()
}

/// A topic map owned by the test, created by a system with the given feature settings.
pub fn topic_map(features: &[(&str, bool)]) -> TopicMap {
    init_tracing();
    let mut factory = TopicMapSystemFactory::new();
    for (name, value) in features {
        factory.set_feature(name, *value).unwrap();
    }
    let mut system = factory.new_topic_map_system();
    let shared = system.create_topic_map(&locator("http://example.org/map/")).unwrap();
    drop(system);
    Arc::try_unwrap(shared).unwrap().into_inner().unwrap()
}
