//! The construct store.
//!
//! Owns every construct of one topic map in an arena keyed by sequence number,
//! together with the identity indices (item identifiers, subject identifiers,
//! subject locators), the reifier bijection and the reverse lookups used by the
//! removability check and the merge engine. Nothing here validates anything:
//! callers check constraints first, then use these primitives, which keep the
//! arena and every index consistent with each other.

// used to keep the one-to-one mapping between reifiers and what they reify
use bimap::BiMap;

use std::collections::{BTreeSet, HashMap};

use crate::construct::{
    AssociationData, AssociationId, Construct, ConstructId, ConstructRef, IdGenerator, IdHasher,
    LocatorSet, Lookup, MapId, NameData, NameId, OccurrenceData, OccurrenceId, OtherHasher,
    RoleData, RoleId, TopicData, TopicId, VariantData, VariantId,
};
use crate::locator::Locator;

macro_rules! accessors {
    ($get:ident, $get_mut:ident, $handle:ty, $variant:ident, $data:ty) => {
        pub fn $get(&self, handle: $handle) -> Option<&$data> {
            if handle.0.map() != self.map {
                return None;
            }
            match self.constructs.get(&handle.seq()) {
                Some(Construct::$variant(data)) => Some(data),
                _ => None,
            }
        }
        pub fn $get_mut(&mut self, handle: $handle) -> Option<&mut $data> {
            if handle.0.map() != self.map {
                return None;
            }
            match self.constructs.get_mut(&handle.seq()) {
                Some(Construct::$variant(data)) => Some(data),
                _ => None,
            }
        }
    };
}

#[derive(Debug, Clone)]
pub(crate) struct Store {
    map: MapId,
    generator: IdGenerator,
    constructs: HashMap<u64, Construct, IdHasher>,
    topics: BTreeSet<TopicId>,
    associations: BTreeSet<AssociationId>,
    map_item_identifiers: LocatorSet,
    // identity indices
    item_identifiers: HashMap<Locator, ConstructRef, OtherHasher>,
    subject_identifiers: HashMap<Locator, TopicId, OtherHasher>,
    subject_locators: HashMap<Locator, TopicId, OtherHasher>,
    // left is the reifier, right the reified construct
    reification: BiMap<TopicId, ConstructRef>,
    // owns lookups between constructs (similar to database indexes)
    typed: Lookup<TopicId, ConstructRef>,
    themed: Lookup<TopicId, ConstructRef>,
    instances: Lookup<TopicId, TopicId>,
}

impl Store {
    pub fn new(map: MapId) -> Self {
        Self {
            map,
            generator: IdGenerator::new(),
            constructs: HashMap::default(),
            topics: BTreeSet::new(),
            associations: BTreeSet::new(),
            map_item_identifiers: LocatorSet::default(),
            item_identifiers: HashMap::default(),
            subject_identifiers: HashMap::default(),
            subject_locators: HashMap::default(),
            reification: BiMap::new(),
            typed: Lookup::new(),
            themed: Lookup::new(),
            instances: Lookup::new(),
        }
    }
    pub fn topics(&self) -> &BTreeSet<TopicId> {
        &self.topics
    }
    pub fn associations(&self) -> &BTreeSet<AssociationId> {
        &self.associations
    }
    pub fn constructs(&self) -> impl Iterator<Item = (ConstructRef, &Construct)> {
        self.constructs
            .iter()
            .map(|(seq, construct)| (self.reference(*seq, construct), construct))
    }

    accessors!(topic, topic_mut, TopicId, Topic, TopicData);
    accessors!(association, association_mut, AssociationId, Association, AssociationData);
    accessors!(role, role_mut, RoleId, Role, RoleData);
    accessors!(occurrence, occurrence_mut, OccurrenceId, Occurrence, OccurrenceData);
    accessors!(name, name_mut, NameId, Name, NameData);
    accessors!(variant, variant_mut, VariantId, Variant, VariantData);

    pub fn get(&self, construct: ConstructRef) -> Option<&Construct> {
        if construct.map() != self.map {
            return None;
        }
        let found = self.constructs.get(&construct.id().seq())?;
        (self.reference(construct.id().seq(), found) == construct).then_some(found)
    }
    pub fn get_mut(&mut self, construct: ConstructRef) -> Option<&mut Construct> {
        self.get(construct)?;
        self.constructs.get_mut(&construct.id().seq())
    }
    pub fn contains(&self, construct: ConstructRef) -> bool {
        match construct {
            ConstructRef::TopicMap(map) => map == self.map,
            _ => self.get(construct).is_some(),
        }
    }
    pub fn by_id(&self, id: ConstructId) -> Option<ConstructRef> {
        if id.map() != self.map {
            return None;
        }
        if id.seq() == crate::construct::GENESIS {
            return Some(ConstructRef::TopicMap(self.map));
        }
        self.constructs
            .get(&id.seq())
            .map(|construct| self.reference(id.seq(), construct))
    }
    fn reference(&self, seq: u64, construct: &Construct) -> ConstructRef {
        let id = ConstructId::new(self.map, seq);
        match construct {
            Construct::Topic(_) => ConstructRef::Topic(TopicId(id)),
            Construct::Association(_) => ConstructRef::Association(AssociationId(id)),
            Construct::Role(_) => ConstructRef::Role(RoleId(id)),
            Construct::Occurrence(_) => ConstructRef::Occurrence(OccurrenceId(id)),
            Construct::Name(_) => ConstructRef::Name(NameId(id)),
            Construct::Variant(_) => ConstructRef::Variant(VariantId(id)),
        }
    }

    // ------------- Creation -------------
    // Registers the construct with the kind sets, its parent and the reverse lookups.
    // Item identifiers are attached separately.
    pub fn insert(&mut self, construct: Construct) -> ConstructRef {
        let seq = self.generator.generate();
        let reference = self.reference(seq, &construct);
        if let Some(type_) = construct.type_() {
            self.typed.insert(type_, reference);
        }
        if let Some(themes) = construct.themes() {
            for theme in themes {
                self.themed.insert(*theme, reference);
            }
        }
        match (&construct, reference) {
            (Construct::Topic(data), ConstructRef::Topic(topic)) => {
                for type_ in &data.types {
                    self.instances.insert(*type_, topic);
                }
                self.topics.insert(topic);
            }
            (Construct::Association(_), ConstructRef::Association(association)) => {
                self.associations.insert(association);
            }
            _ => (),
        }
        self.constructs.insert(seq, construct);
        match reference {
            ConstructRef::Role(role) => {
                let (parent, player) = match self.role(role) {
                    Some(data) => (data.parent, data.player),
                    None => return reference,
                };
                if let Some(association) = self.association_mut(parent) {
                    association.roles.insert(role);
                }
                if let Some(topic) = self.topic_mut(player) {
                    topic.roles_played.insert(role);
                }
            }
            ConstructRef::Occurrence(occurrence) => {
                if let Some(parent) = self.occurrence(occurrence).map(|o| o.parent) {
                    if let Some(topic) = self.topic_mut(parent) {
                        topic.occurrences.insert(occurrence);
                    }
                }
            }
            ConstructRef::Name(name) => {
                if let Some(parent) = self.name(name).map(|n| n.parent) {
                    if let Some(topic) = self.topic_mut(parent) {
                        topic.names.insert(name);
                    }
                }
            }
            ConstructRef::Variant(variant) => {
                if let Some(parent) = self.variant(variant).map(|v| v.parent) {
                    if let Some(name) = self.name_mut(parent) {
                        name.variants.insert(variant);
                    }
                }
            }
            _ => (),
        }
        reference
    }

    // ------------- Removal -------------
    // Unlinks a single construct and releases its identifiers and its reifier.
    // Children must have been detached by the caller.
    pub fn detach(&mut self, construct: ConstructRef) -> Option<Construct> {
        self.get(construct)?;
        let seq = construct.id().seq();
        let removed = self.constructs.remove(&seq)?;
        for locator in removed.item_identifiers() {
            self.item_identifiers.remove(locator);
        }
        if let Some(type_) = removed.type_() {
            self.typed.remove(&type_, &construct);
        }
        if let Some(themes) = removed.themes() {
            for theme in themes {
                self.themed.remove(theme, &construct);
            }
        }
        self.reification.remove_by_right(&construct);
        match (&removed, construct) {
            (Construct::Topic(data), ConstructRef::Topic(topic)) => {
                for locator in &data.subject_identifiers {
                    self.subject_identifiers.remove(locator);
                }
                for locator in &data.subject_locators {
                    self.subject_locators.remove(locator);
                }
                for type_ in &data.types {
                    self.instances.remove(type_, &topic);
                }
                self.reification.remove_by_left(&topic);
                self.topics.remove(&topic);
            }
            (Construct::Association(_), ConstructRef::Association(association)) => {
                self.associations.remove(&association);
            }
            (Construct::Role(data), ConstructRef::Role(role)) => {
                if let Some(association) = self.association_mut(data.parent) {
                    association.roles.remove(&role);
                }
                if let Some(player) = self.topic_mut(data.player) {
                    player.roles_played.remove(&role);
                }
            }
            (Construct::Occurrence(data), ConstructRef::Occurrence(occurrence)) => {
                if let Some(parent) = self.topic_mut(data.parent) {
                    parent.occurrences.remove(&occurrence);
                }
            }
            (Construct::Name(data), ConstructRef::Name(name)) => {
                if let Some(parent) = self.topic_mut(data.parent) {
                    parent.names.remove(&name);
                }
            }
            (Construct::Variant(data), ConstructRef::Variant(variant)) => {
                if let Some(parent) = self.name_mut(data.parent) {
                    parent.variants.remove(&variant);
                }
            }
            _ => (),
        }
        Some(removed)
    }
    pub fn clear(&mut self) {
        self.constructs.clear();
        self.topics.clear();
        self.associations.clear();
        self.item_identifiers.clear();
        self.subject_identifiers.clear();
        self.subject_locators.clear();
        self.reification.clear();
        self.typed.clear();
        self.themed.clear();
        self.instances.clear();
        // the map keeps its own item identifiers
        for locator in &self.map_item_identifiers {
            self.item_identifiers
                .insert(locator.clone(), ConstructRef::TopicMap(self.map));
        }
    }

    // ------------- Identity indices -------------
    pub fn by_item_identifier(&self, locator: &Locator) -> Option<ConstructRef> {
        self.item_identifiers.get(locator).copied()
    }
    pub fn by_subject_identifier(&self, locator: &Locator) -> Option<TopicId> {
        self.subject_identifiers.get(locator).copied()
    }
    pub fn by_subject_locator(&self, locator: &Locator) -> Option<TopicId> {
        self.subject_locators.get(locator).copied()
    }
    pub fn item_identifiers(&self, construct: ConstructRef) -> Option<&LocatorSet> {
        match construct {
            ConstructRef::TopicMap(map) if map == self.map => Some(&self.map_item_identifiers),
            _ => self.get(construct).map(|c| c.item_identifiers()),
        }
    }
    pub fn attach_item_identifier(&mut self, construct: ConstructRef, locator: Locator) {
        let set = match construct {
            ConstructRef::TopicMap(_) => Some(&mut self.map_item_identifiers),
            _ => self.get_mut(construct).map(|c| c.item_identifiers_mut()),
        };
        if let Some(set) = set {
            set.insert(locator.clone());
            self.item_identifiers.insert(locator, construct);
        }
    }
    pub fn detach_item_identifier(&mut self, construct: ConstructRef, locator: &Locator) {
        let set = match construct {
            ConstructRef::TopicMap(_) => Some(&mut self.map_item_identifiers),
            _ => self.get_mut(construct).map(|c| c.item_identifiers_mut()),
        };
        if let Some(set) = set {
            if set.remove(locator) {
                self.item_identifiers.remove(locator);
            }
        }
    }
    pub fn attach_subject_identifier(&mut self, topic: TopicId, locator: Locator) {
        if let Some(data) = self.topic_mut(topic) {
            data.subject_identifiers.insert(locator.clone());
            self.subject_identifiers.insert(locator, topic);
        }
    }
    pub fn detach_subject_identifier(&mut self, topic: TopicId, locator: &Locator) {
        if let Some(data) = self.topic_mut(topic) {
            if data.subject_identifiers.remove(locator) {
                self.subject_identifiers.remove(locator);
            }
        }
    }
    pub fn attach_subject_locator(&mut self, topic: TopicId, locator: Locator) {
        if let Some(data) = self.topic_mut(topic) {
            data.subject_locators.insert(locator.clone());
            self.subject_locators.insert(locator, topic);
        }
    }
    pub fn detach_subject_locator(&mut self, topic: TopicId, locator: &Locator) {
        if let Some(data) = self.topic_mut(topic) {
            if data.subject_locators.remove(locator) {
                self.subject_locators.remove(locator);
            }
        }
    }

    // ------------- Reification -------------
    pub fn reifier_of(&self, construct: ConstructRef) -> Option<TopicId> {
        self.reification.get_by_right(&construct).copied()
    }
    pub fn reified_by(&self, topic: TopicId) -> Option<ConstructRef> {
        self.reification.get_by_left(&topic).copied()
    }
    pub fn bind_reifier(&mut self, topic: TopicId, construct: ConstructRef) {
        self.reification.insert(topic, construct);
    }
    pub fn unbind_reifier_of(&mut self, construct: ConstructRef) -> Option<TopicId> {
        self.reification
            .remove_by_right(&construct)
            .map(|(topic, _)| topic)
    }

    // ------------- References -------------
    pub fn typed_by(&self, topic: TopicId) -> Vec<ConstructRef> {
        self.typed
            .lookup(&topic)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
    pub fn themed_by(&self, topic: TopicId) -> Vec<ConstructRef> {
        self.themed
            .lookup(&topic)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
    pub fn instances_of(&self, type_: TopicId) -> Vec<TopicId> {
        self.instances
            .lookup(&type_)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
    pub fn assign_type(&mut self, construct: ConstructRef, type_: TopicId) {
        let previous = match self.get_mut(construct).and_then(|c| c.type_mut()) {
            Some(slot) => std::mem::replace(slot, type_),
            None => return,
        };
        self.typed.remove(&previous, &construct);
        self.typed.insert(type_, construct);
    }
    pub fn add_theme(&mut self, construct: ConstructRef, theme: TopicId) {
        if let Some(themes) = self.get_mut(construct).and_then(|c| c.themes_mut()) {
            if themes.insert(theme) {
                self.themed.insert(theme, construct);
            }
        }
    }
    pub fn remove_theme(&mut self, construct: ConstructRef, theme: TopicId) {
        if let Some(themes) = self.get_mut(construct).and_then(|c| c.themes_mut()) {
            if themes.remove(&theme) {
                self.themed.remove(&theme, &construct);
            }
        }
    }
    pub fn add_topic_type(&mut self, topic: TopicId, type_: TopicId) {
        if let Some(data) = self.topic_mut(topic) {
            if data.types.insert(type_) {
                self.instances.insert(type_, topic);
            }
        }
    }
    pub fn remove_topic_type(&mut self, topic: TopicId, type_: TopicId) {
        if let Some(data) = self.topic_mut(topic) {
            if data.types.remove(&type_) {
                self.instances.remove(&type_, &topic);
            }
        }
    }
    pub fn assign_player(&mut self, role: RoleId, player: TopicId) {
        let previous = match self.role_mut(role) {
            Some(data) => std::mem::replace(&mut data.player, player),
            None => return,
        };
        if let Some(data) = self.topic_mut(previous) {
            data.roles_played.remove(&role);
        }
        if let Some(data) = self.topic_mut(player) {
            data.roles_played.insert(role);
        }
    }
    // Moves a name or an occurrence to another topic.
    pub fn reparent_characteristic(&mut self, construct: ConstructRef, parent: TopicId) {
        match construct {
            ConstructRef::Name(name) => {
                let previous = match self.name_mut(name) {
                    Some(data) => std::mem::replace(&mut data.parent, parent),
                    None => return,
                };
                if let Some(data) = self.topic_mut(previous) {
                    data.names.remove(&name);
                }
                if let Some(data) = self.topic_mut(parent) {
                    data.names.insert(name);
                }
            }
            ConstructRef::Occurrence(occurrence) => {
                let previous = match self.occurrence_mut(occurrence) {
                    Some(data) => std::mem::replace(&mut data.parent, parent),
                    None => return,
                };
                if let Some(data) = self.topic_mut(previous) {
                    data.occurrences.remove(&occurrence);
                }
                if let Some(data) = self.topic_mut(parent) {
                    data.occurrences.insert(occurrence);
                }
            }
            _ => (),
        }
    }
    pub fn reparent_variant(&mut self, variant: VariantId, parent: NameId) {
        let previous = match self.variant_mut(variant) {
            Some(data) => std::mem::replace(&mut data.parent, parent),
            None => return,
        };
        if let Some(data) = self.name_mut(previous) {
            data.variants.remove(&variant);
        }
        if let Some(data) = self.name_mut(parent) {
            data.variants.insert(variant);
        }
    }
    pub fn reparent_role(&mut self, role: RoleId, parent: AssociationId) {
        let previous = match self.role_mut(role) {
            Some(data) => std::mem::replace(&mut data.parent, parent),
            None => return,
        };
        if let Some(data) = self.association_mut(previous) {
            data.roles.remove(&role);
        }
        if let Some(data) = self.association_mut(parent) {
            data.roles.insert(role);
        }
    }
}
