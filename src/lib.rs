//! Tmdm – an in-memory engine for the Topic Maps Data Model.
//!
//! A topic map holds *topics*, proxies for subjects, and the statements made
//! about them:
//! * A [`construct::TopicId`] is identified by item identifiers, subject
//!   identifiers and subject locators (all [`locator::Locator`]s).
//! * Names and occurrences are characteristics of one topic; names carry
//!   variants.
//! * Associations relate topics through typed roles.
//! * Statements are typed, scoped by a set of themes and may be reified by a
//!   topic.
//!
//! Every construct lives in an arena owned by its [`topicmap::TopicMap`] and
//! is addressed by a copyable handle; all reading and writing goes through the
//! topic map, which validates each call before changing anything. Two topics
//! that turn out to share an identity are merged, and merging suppresses the
//! duplicate statements that result.
//!
//! ## Modules
//! * [`construct`] – Handles, construct kinds and capability traits.
//! * [`topicmap`] – The topic map and construct operations; identifiers,
//!   scopes, removal and merging extend it from their own modules.
//! * [`index`] – Type-instance, scoped and literal snapshot indices.
//! * [`locator`] – Absolute IRIs with RFC 3986 reference resolution.
//! * [`datatype`] – The [`datatype::Literal`] trait and well-known identifiers.
//! * [`system`] – Topic map systems, their factory and features.
//! * [`bootstrap`] – Choosing and configuring a factory.
//!
//! ## Quick Start
//! ```
//! use tmdm::system::TopicMapSystemFactory;
//! let mut system = TopicMapSystemFactory::new().new_topic_map_system();
//! let locator = system.create_locator("http://example.org/map").unwrap();
//! let map = system.create_topic_map(&locator).unwrap();
//! let mut map = map.lock().unwrap();
//! let person = map.create_topic().unwrap();
//! let alice = map.create_topic().unwrap();
//! map.add_type(alice, person).unwrap();
//! map.create_name(alice, "Alice", &[]).unwrap();
//! assert_eq!(map.type_instance_index().unwrap().topics(Some(person)).unwrap(), vec![alice]);
//! ```

pub mod bootstrap;
pub mod construct;
pub mod datatype;
pub mod error;
pub mod index;
pub mod locator;
pub mod system;
pub mod topicmap;

mod identity;
mod merge;
mod removal;
mod scope;
mod store;

pub use error::{Result, TopicMapError};
pub use locator::Locator;
pub use system::{TopicMapRef, TopicMapSystem, TopicMapSystemFactory};
pub use topicmap::TopicMap;
