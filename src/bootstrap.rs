//! Bootstrap of a topic map system factory.
//!
//! The engine is chosen, in this order, by an explicit override, by the
//! `engine` setting of the configuration (a user file layered with `TMDM_*`
//! environment variables) and finally by whatever engine the registry
//! provides for [`FACTORY_INTERFACE`]. The registry is passed in, so several
//! bootstraps with different engines can coexist in one process.

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Result, TopicMapError};
use crate::system::{AUTOMERGE, READ_ONLY, TYPE_INSTANCE_ASSOCIATIONS, TopicMapSystemFactory};

pub const FACTORY_INTERFACE: &str = "org.tmapi.core.TopicMapSystemFactory";
pub const DEFAULT_ENGINE: &str = "tmdm.memory";
pub const ENV_PREFIX: &str = "TMDM";

pub type EngineFactory = fn() -> TopicMapSystemFactory;

/// Engines by name, and which engine provides which interface.
#[derive(Debug, Clone, Default)]
pub struct EngineRegistry {
    engines: HashMap<String, EngineFactory>,
    providers: HashMap<String, String>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    /// A registry holding the in-memory engine as provider of [`FACTORY_INTERFACE`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(DEFAULT_ENGINE, TopicMapSystemFactory::new);
        registry.provide(FACTORY_INTERFACE, DEFAULT_ENGINE);
        registry
    }
    pub fn register(&mut self, name: &str, factory: EngineFactory) {
        self.engines.insert(name.to_string(), factory);
    }
    pub fn provide(&mut self, interface: &str, engine: &str) {
        self.providers.insert(interface.to_string(), engine.to_string());
    }
    pub fn engine(&self, name: &str) -> Option<EngineFactory> {
        self.engines.get(name).copied()
    }
    pub fn provider(&self, interface: &str) -> Option<&str> {
        self.providers.get(interface).map(String::as_str)
    }
}

/// User settings; anything left out keeps the factory default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: Option<String>,
    pub automerge: Option<bool>,
    pub read_only: Option<bool>,
    pub type_instance_associations: Option<bool>,
    pub properties: HashMap<String, String>,
}

impl Settings {
    pub fn apply(&self, factory: &mut TopicMapSystemFactory) -> Result<()> {
        let features = [
            (AUTOMERGE, self.automerge),
            (READ_ONLY, self.read_only),
            (TYPE_INSTANCE_ASSOCIATIONS, self.type_instance_associations),
        ];
        for (name, value) in features {
            if let Some(value) = value {
                factory.set_feature(name, value)?;
            }
        }
        for (name, value) in &self.properties {
            factory.set_property(name, value.as_str());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Bootstrap {
    engine: Option<String>,
    config_file: Option<PathBuf>,
}

impl Bootstrap {
    pub fn new() -> Self {
        Self::default()
    }
    /// Names the engine to use ahead of any configuration.
    pub fn with_override(mut self, engine: &str) -> Self {
        self.engine = Some(engine.to_string());
        self
    }
    /// Reads settings from this file; the format follows its extension.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }
    pub fn settings(&self) -> Result<Settings> {
        let mut builder = Config::builder();
        if let Some(path) = &self.config_file {
            builder = builder.add_source(File::from(path.as_path()));
        }
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize::<Settings>()?;
        Ok(settings)
    }
    pub fn resolve(&self, registry: &EngineRegistry) -> Result<TopicMapSystemFactory> {
        let settings = self.settings()?;
        let candidates = [
            ("override", self.engine.as_deref()),
            ("configuration", settings.engine.as_deref()),
            ("registry", registry.provider(FACTORY_INTERFACE)),
        ];
        for (source, engine) in candidates {
            let Some(engine) = engine else {
                continue;
            };
            match registry.engine(engine) {
                Some(create) => {
                    info!(engine, source, "bootstrapping topic map system factory");
                    let mut factory = create();
                    settings.apply(&mut factory)?;
                    return Ok(factory);
                }
                None => warn!(engine, source, "engine is not registered"),
            }
        }
        Err(TopicMapError::Config(format!(
            "no engine provides {}",
            FACTORY_INTERFACE
        )))
    }
}
