//! Read models derived from a topic map.
//!
//! Indices are point-in-time snapshots: they never follow later changes of
//! the topic map and must be refreshed with [`Index::reindex`]. Members are
//! kept as roaring bitmaps over construct sequence numbers, so combining
//! several keys is a bitmap union or intersection.

use std::collections::HashMap;
use std::hash::Hash;

use roaring::RoaringTreemap;

use crate::construct::{ConstructId, IdHasher, MapId, TopicId};
use crate::error::{Result, TopicMapError};
use crate::topicmap::TopicMap;

mod literal;
mod scoped;
mod type_instance;

pub use literal::LiteralIndex;
pub use scoped::ScopedIndex;
pub use type_instance::TypeInstanceIndex;

/// Lifecycle shared by every index.
pub trait Index {
    fn open(&mut self);
    fn close(&mut self);
    fn is_open(&self) -> bool;
    /// Always false, indices are snapshots.
    fn is_auto_updated(&self) -> bool {
        false
    }
    /// Rebuilds the snapshot from the current state of the topic map.
    fn reindex(&mut self, map: &TopicMap) -> Result<()>;
}

// members by key
#[derive(Debug, Clone)]
pub(crate) struct Postings<K = u64> {
    index: HashMap<K, RoaringTreemap, IdHasher>,
}

impl<K: Eq + Hash + Clone> Postings<K> {
    pub fn new() -> Self {
        Self {
            index: HashMap::default(),
        }
    }
    pub fn insert(&mut self, key: K, member: u64) {
        self.index.entry(key).or_default().insert(member);
    }
    pub fn get(&self, key: &K) -> Option<&RoaringTreemap> {
        self.index.get(key)
    }
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.index.keys()
    }
    pub fn union<'a>(&self, keys: impl IntoIterator<Item = &'a K>) -> RoaringTreemap
    where
        K: 'a,
    {
        let mut members = RoaringTreemap::new();
        for key in keys {
            if let Some(found) = self.index.get(key) {
                members |= found;
            }
        }
        members
    }
    pub fn intersection<'a>(&self, keys: impl IntoIterator<Item = &'a K>) -> RoaringTreemap
    where
        K: 'a,
    {
        let mut members: Option<RoaringTreemap> = None;
        for key in keys {
            let Some(found) = self.index.get(key) else {
                return RoaringTreemap::new();
            };
            members = Some(match members {
                Some(members) => members & found,
                None => found.clone(),
            });
        }
        members.unwrap_or_default()
    }
    pub fn clear(&mut self) {
        self.index.clear();
    }
}

impl<K: Eq + Hash + Clone> Default for Postings<K> {
    fn default() -> Self {
        Self::new()
    }
}

// The bookkeeping every index carries: which map it reads and whether it is open.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Snapshot {
    pub map: MapId,
    pub open: bool,
}

impl Snapshot {
    pub fn new(map: MapId) -> Self {
        Self { map, open: false }
    }
    pub fn ensure_open(&self) -> Result<()> {
        if !self.open {
            return Err(TopicMapError::model(self.map, "the index is not open"));
        }
        Ok(())
    }
    pub fn ensure_same_map(&self, map: &TopicMap) -> Result<()> {
        if map.id() != self.map {
            return Err(TopicMapError::model(
                map.id(),
                "the index belongs to another topic map",
            ));
        }
        Ok(())
    }
    pub fn handles<H>(&self, members: Option<&RoaringTreemap>, make: fn(ConstructId) -> H) -> Vec<H> {
        members
            .map(|members| {
                members
                    .iter()
                    .map(|seq| make(ConstructId::new(self.map, seq)))
                    .collect()
            })
            .unwrap_or_default()
    }
    pub fn topics<'a>(&self, seqs: impl Iterator<Item = &'a u64>) -> Vec<TopicId> {
        let mut topics: Vec<_> = seqs
            .map(|seq| TopicId(ConstructId::new(self.map, *seq)))
            .collect();
        topics.sort();
        topics
    }
}

impl TopicMap {
    /// A freshly built, open type-instance index.
    pub fn type_instance_index(&self) -> Result<TypeInstanceIndex> {
        let mut index = TypeInstanceIndex::new(self.id());
        index.open();
        index.reindex(self)?;
        Ok(index)
    }
    /// A freshly built, open scoped index.
    pub fn scoped_index(&self) -> Result<ScopedIndex> {
        let mut index = ScopedIndex::new(self.id());
        index.open();
        index.reindex(self)?;
        Ok(index)
    }
    /// A freshly built, open literal index.
    pub fn literal_index(&self) -> Result<LiteralIndex> {
        let mut index = LiteralIndex::new(self.id());
        index.open();
        index.reindex(self)?;
        Ok(index)
    }
}
