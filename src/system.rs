//! The topic map system: a registry of topic maps keyed by storage address,
//! created by a factory that fixes its features and properties.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::construct::OtherHasher;
use crate::error::{Result, TopicMapError};
use crate::locator::Locator;
use crate::topicmap::TopicMap;

pub const AUTOMERGE: &str = "http://tmapi.org/features/automerge/";
pub const READ_ONLY: &str = "http://tmapi.org/features/readOnly/";
pub const TYPE_INSTANCE_ASSOCIATIONS: &str = "http://tmapi.org/features/type-instance-associations";

/// Feature switches shared by every topic map of a system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    /// Merge topics on identity collisions instead of refusing them.
    pub automerge: bool,
    /// Always off, read-only topic maps are not supported.
    pub read_only: bool,
    /// Materialize topic types as type-instance associations.
    pub type_instance_associations: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            automerge: true,
            read_only: false,
            type_instance_associations: false,
        }
    }
}

impl Features {
    pub const NAMES: [&'static str; 3] = [AUTOMERGE, READ_ONLY, TYPE_INSTANCE_ASSOCIATIONS];

    pub fn get(&self, name: &str) -> Result<bool> {
        match name {
            AUTOMERGE => Ok(self.automerge),
            READ_ONLY => Ok(self.read_only),
            TYPE_INSTANCE_ASSOCIATIONS => Ok(self.type_instance_associations),
            _ => Err(TopicMapError::FeatureNotRecognized(name.to_string())),
        }
    }
    pub fn set(&mut self, name: &str, value: bool) -> Result<()> {
        match name {
            AUTOMERGE => self.automerge = value,
            READ_ONLY if value => return Err(TopicMapError::FeatureNotSupported(name.to_string())),
            READ_ONLY => (),
            TYPE_INSTANCE_ASSOCIATIONS => self.type_instance_associations = value,
            _ => return Err(TopicMapError::FeatureNotRecognized(name.to_string())),
        }
        Ok(())
    }
}

pub type Properties = HashMap<String, String, OtherHasher>;

/// Collects features and properties, then creates systems that keep them.
#[derive(Debug, Clone, Default)]
pub struct TopicMapSystemFactory {
    features: Features,
    properties: Properties,
}

impl TopicMapSystemFactory {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn features(&self) -> Features {
        self.features
    }
    pub fn feature(&self, name: &str) -> Result<bool> {
        self.features.get(name)
    }
    pub fn has_feature(&self, name: &str) -> bool {
        Features::NAMES.iter().any(|known| *known == name)
    }
    pub fn set_feature(&mut self, name: &str, value: bool) -> Result<()> {
        self.features.set(name, value)
    }
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
    pub fn set_property(&mut self, name: &str, value: impl Into<String>) {
        self.properties.insert(name.to_string(), value.into());
    }
    pub fn new_topic_map_system(&self) -> TopicMapSystem {
        info!(features = ?self.features, "created topic map system");
        TopicMapSystem {
            features: self.features,
            properties: self.properties.clone(),
            maps: HashMap::default(),
        }
    }
}

/// Topic maps are handed out shared, one lock per topic map.
pub type TopicMapRef = Arc<Mutex<TopicMap>>;

#[derive(Debug)]
pub struct TopicMapSystem {
    features: Features,
    properties: Properties,
    maps: HashMap<Locator, TopicMapRef, OtherHasher>,
}

impl TopicMapSystem {
    pub fn features(&self) -> Features {
        self.features
    }
    pub fn feature(&self, name: &str) -> Result<bool> {
        self.features.get(name)
    }
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
    pub fn create_locator(&self, reference: &str) -> Result<Locator> {
        Locator::new(reference)
    }
    pub fn create_topic_map(&mut self, locator: &Locator) -> Result<TopicMapRef> {
        if self.maps.contains_key(locator) {
            return Err(TopicMapError::TopicMapExists {
                locator: locator.clone(),
            });
        }
        let map = Arc::new(Mutex::new(TopicMap::new(locator.clone(), self.features)));
        self.maps.insert(locator.clone(), map.clone());
        Ok(map)
    }
    pub fn topic_map(&self, locator: &Locator) -> Option<TopicMapRef> {
        self.maps.get(locator).cloned()
    }
    pub fn locators(&self) -> Vec<Locator> {
        let mut locators: Vec<_> = self.maps.keys().cloned().collect();
        locators.sort();
        locators
    }
    /// Unregisters the topic map and closes it, so outstanding handles stop working.
    pub fn remove_topic_map(&mut self, locator: &Locator) -> Result<()> {
        if let Some(map) = self.maps.remove(locator) {
            debug!(locator = %locator, "removing topic map");
            map.lock()?.close();
        }
        Ok(())
    }
    /// Merges `source` into `target`; `source` is left untouched.
    pub fn merge_topic_maps(&self, target: &TopicMapRef, source: &TopicMapRef) -> Result<()> {
        if Arc::ptr_eq(target, source) {
            return Ok(());
        }
        // never hold both locks at once
        let source = source.lock()?.snapshot();
        target.lock()?.merge_topic_map(&source)
    }
    /// Closes every topic map and forgets them.
    pub fn close(&mut self) -> Result<()> {
        info!(maps = self.maps.len(), "closing topic map system");
        for (_, map) in self.maps.drain() {
            map.lock()?.close();
        }
        Ok(())
    }
}
