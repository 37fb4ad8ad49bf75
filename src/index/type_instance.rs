use roaring::RoaringTreemap;

use crate::construct::{AssociationId, Construct, MapId, NameId, OccurrenceId, RoleId, TopicId};
use crate::error::Result;
use crate::index::{Index, Postings, Snapshot};
use crate::topicmap::TopicMap;

/// Instances by type: topics by topic type, and statements by their type.
#[derive(Debug, Clone)]
pub struct TypeInstanceIndex {
    snapshot: Snapshot,
    topics: RoaringTreemap,
    instances: Postings,
    associations: Postings,
    roles: Postings,
    occurrences: Postings,
    names: Postings,
}

impl TypeInstanceIndex {
    pub fn new(map: MapId) -> Self {
        Self {
            snapshot: Snapshot::new(map),
            topics: RoaringTreemap::new(),
            instances: Postings::new(),
            associations: Postings::new(),
            roles: Postings::new(),
            occurrences: Postings::new(),
            names: Postings::new(),
        }
    }

    /// Instances of `type_`, or with `None` the topics that are not the type
    /// of any other topic.
    pub fn topics(&self, type_: Option<TopicId>) -> Result<Vec<TopicId>> {
        self.snapshot.ensure_open()?;
        match type_ {
            Some(type_) => Ok(self.snapshot.handles(self.instances.get(&type_.seq()), TopicId)),
            None => {
                let mut roots = self.topics.clone();
                for type_ in self.instances.keys() {
                    let used_by_others = self
                        .instances
                        .get(type_)
                        .is_some_and(|instances| instances.iter().any(|i| i != *type_));
                    if used_by_others {
                        roots.remove(*type_);
                    }
                }
                Ok(self.snapshot.handles(Some(&roots), TopicId))
            }
        }
    }
    /// Instances of every listed type when `match_all`, else of any of them.
    pub fn topics_of_types(&self, types: &[TopicId], match_all: bool) -> Result<Vec<TopicId>> {
        self.snapshot.ensure_open()?;
        let keys: Vec<u64> = types.iter().map(|t| t.seq()).collect();
        let members = if match_all {
            self.instances.intersection(&keys)
        } else {
            self.instances.union(&keys)
        };
        Ok(self.snapshot.handles(Some(&members), TopicId))
    }
    pub fn topic_types(&self) -> Result<Vec<TopicId>> {
        self.snapshot.ensure_open()?;
        Ok(self.snapshot.topics(self.instances.keys()))
    }
    pub fn associations(&self, type_: TopicId) -> Result<Vec<AssociationId>> {
        self.snapshot.ensure_open()?;
        Ok(self.snapshot.handles(self.associations.get(&type_.seq()), AssociationId))
    }
    pub fn association_types(&self) -> Result<Vec<TopicId>> {
        self.snapshot.ensure_open()?;
        Ok(self.snapshot.topics(self.associations.keys()))
    }
    pub fn roles(&self, type_: TopicId) -> Result<Vec<RoleId>> {
        self.snapshot.ensure_open()?;
        Ok(self.snapshot.handles(self.roles.get(&type_.seq()), RoleId))
    }
    pub fn role_types(&self) -> Result<Vec<TopicId>> {
        self.snapshot.ensure_open()?;
        Ok(self.snapshot.topics(self.roles.keys()))
    }
    pub fn occurrences(&self, type_: TopicId) -> Result<Vec<OccurrenceId>> {
        self.snapshot.ensure_open()?;
        Ok(self.snapshot.handles(self.occurrences.get(&type_.seq()), OccurrenceId))
    }
    pub fn occurrence_types(&self) -> Result<Vec<TopicId>> {
        self.snapshot.ensure_open()?;
        Ok(self.snapshot.topics(self.occurrences.keys()))
    }
    pub fn names(&self, type_: TopicId) -> Result<Vec<NameId>> {
        self.snapshot.ensure_open()?;
        Ok(self.snapshot.handles(self.names.get(&type_.seq()), NameId))
    }
    pub fn name_types(&self) -> Result<Vec<TopicId>> {
        self.snapshot.ensure_open()?;
        Ok(self.snapshot.topics(self.names.keys()))
    }
}

impl Index for TypeInstanceIndex {
    fn open(&mut self) {
        self.snapshot.open = true;
    }
    fn close(&mut self) {
        self.snapshot.open = false;
    }
    fn is_open(&self) -> bool {
        self.snapshot.open
    }
    fn reindex(&mut self, map: &TopicMap) -> Result<()> {
        self.snapshot.ensure_same_map(map)?;
        map.ensure_open()?;
        self.topics.clear();
        self.instances.clear();
        self.associations.clear();
        self.roles.clear();
        self.occurrences.clear();
        self.names.clear();
        for (construct, data) in map.store.constructs() {
            let seq = construct.id().seq();
            match data {
                Construct::Topic(topic) => {
                    self.topics.insert(seq);
                    for type_ in &topic.types {
                        self.instances.insert(type_.seq(), seq);
                    }
                }
                Construct::Association(association) => {
                    self.associations.insert(association.type_.seq(), seq)
                }
                Construct::Role(role) => self.roles.insert(role.type_.seq(), seq),
                Construct::Occurrence(occurrence) => {
                    self.occurrences.insert(occurrence.type_.seq(), seq)
                }
                Construct::Name(name) => self.names.insert(name.type_.seq(), seq),
                Construct::Variant(_) => (),
            }
        }
        if map.features().type_instance_associations {
            for association in map.associations() {
                if let Some((_, type_, instance)) = map.type_instance_pair(*association) {
                    self.instances.insert(type_.seq(), instance.seq());
                }
            }
        }
        Ok(())
    }
}
