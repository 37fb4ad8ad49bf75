//! Merging of topics and of topic maps.
//!
//! A topic merge moves every identifier, type, played role, name and
//! occurrence of the absorbed topic onto the surviving one, re-points every
//! reference to it, removes it and then suppresses the duplicates this may
//! have produced. Duplicates keep the older construct; the union of their
//! item identifiers lives on, and differing reifiers are merged in turn.
//! Such follow-up merges are queued on a [`Merger`] rather than recursing.
//!
//! A topic map merge copies the other map into a working copy of this one and
//! only commits when every step succeeded, so the other map is never touched
//! and a failed merge leaves this map as it was.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, VecDeque};

use tracing::{debug, trace};

use crate::construct::{
    AssociationData, AssociationId, Construct, ConstructRef, IdHasher, LocatorSet, NameData, NameId,
    OccurrenceData, OtherHasher, RoleData, Themes, TopicId, VariantData,
};
use crate::error::{Result, TopicMapError};
use crate::locator::Locator;
use crate::topicmap::TopicMap;

/// Bookkeeping for one merge operation: topic merges still to run and what
/// absorbed constructs have become.
#[derive(Debug, Default)]
pub(crate) struct Merger {
    pending: VecDeque<(TopicId, TopicId)>,
    topics: HashMap<TopicId, TopicId, IdHasher>,
    constructs: HashMap<ConstructRef, ConstructRef, IdHasher>,
}

impl Merger {
    fn topic(&self, mut topic: TopicId) -> TopicId {
        while let Some(next) = self.topics.get(&topic) {
            topic = *next;
        }
        topic
    }
    fn construct(&self, mut construct: ConstructRef) -> ConstructRef {
        loop {
            if let ConstructRef::Topic(topic) = construct {
                return ConstructRef::Topic(self.topic(topic));
            }
            match self.constructs.get(&construct) {
                Some(next) => construct = *next,
                None => return construct,
            }
        }
    }
    fn next(&mut self) -> Option<(TopicId, TopicId)> {
        while let Some((target, other)) = self.pending.pop_front() {
            let (target, other) = (self.topic(target), self.topic(other));
            if target != other {
                return Some((target, other));
            }
        }
        None
    }
}

type AssociationSignature = (TopicId, Themes, BTreeSet<(TopicId, TopicId)>);

impl TopicMap {
    /// Merges `other` into `target`; `target` survives. Merging a topic with
    /// itself changes nothing.
    pub fn merge_in(&mut self, target: TopicId, other: TopicId) -> Result<()> {
        self.check(target)?;
        self.check_reference(target.into(), other)?;
        self.merge_topics(target, other)
    }

    pub(crate) fn merge_topics(&mut self, target: TopicId, other: TopicId) -> Result<()> {
        if target == other {
            return Ok(());
        }
        // Only this pair can clash: a queued reifier pair always has its
        // second topic unbound before it is queued.
        self.check_reification(target, other)?;
        let mut merger = Merger::default();
        merger.pending.push_back((target, other));
        self.run_merges(&mut merger)
    }

    fn check_reification(&self, target: TopicId, other: TopicId) -> Result<()> {
        if let (Some(reified), Some(other_reified)) =
            (self.store.reified_by(target), self.store.reified_by(other))
        {
            if reified != other_reified {
                return Err(TopicMapError::model(
                    target,
                    format!("{} reifies {} while {} reifies {}", target, reified, other, other_reified),
                ));
            }
        }
        Ok(())
    }

    fn run_merges(&mut self, merger: &mut Merger) -> Result<()> {
        while let Some((target, other)) = merger.next() {
            self.absorb_topic(target, other, merger)?;
        }
        Ok(())
    }

    fn absorb_topic(&mut self, target: TopicId, other: TopicId, merger: &mut Merger) -> Result<()> {
        self.check_reification(target, other)?;
        let Some(data) = self.store.topic(other).cloned() else {
            return Ok(());
        };
        debug!(survivor = %target, absorbed = %other, "merging topics");
        for locator in &data.item_identifiers {
            self.store.detach_item_identifier(other.into(), locator);
            self.store.attach_item_identifier(target.into(), locator.clone());
        }
        for locator in &data.subject_identifiers {
            self.store.detach_subject_identifier(other, locator);
            self.store.attach_subject_identifier(target, locator.clone());
        }
        for locator in &data.subject_locators {
            self.store.detach_subject_locator(other, locator);
            self.store.attach_subject_locator(target, locator.clone());
        }
        for type_ in &data.types {
            self.store.remove_topic_type(other, *type_);
            let type_ = if *type_ == other { target } else { *type_ };
            self.store.add_topic_type(target, type_);
        }
        for instance in self.store.instances_of(other) {
            self.store.remove_topic_type(instance, other);
            self.store.add_topic_type(instance, target);
        }
        for role in &data.roles_played {
            self.store.assign_player(*role, target);
        }
        for construct in self.store.typed_by(other) {
            self.store.assign_type(construct, target);
        }
        for construct in self.store.themed_by(other) {
            self.store.remove_theme(construct, other);
            self.store.add_theme(construct, target);
        }
        if let Some(reified) = self.store.reified_by(other) {
            self.store.unbind_reifier_of(reified);
            self.store.bind_reifier(target, reified);
        }
        for name in &data.names {
            self.store.reparent_characteristic((*name).into(), target);
        }
        for occurrence in &data.occurrences {
            self.store.reparent_characteristic((*occurrence).into(), target);
        }
        self.store.detach(other.into());
        merger.topics.insert(other, target);
        self.normalize(target, merger);
        Ok(())
    }

    // Suppresses duplicates among everything that now refers to `topic`.
    fn normalize(&mut self, topic: TopicId, merger: &mut Merger) {
        let mut parents = BTreeSet::from([topic]);
        let mut names = BTreeSet::new();
        let mut associations = BTreeSet::new();
        let mut referencing = self.store.typed_by(topic);
        referencing.extend(self.store.themed_by(topic));
        for construct in referencing {
            match construct {
                ConstructRef::Name(name) => {
                    if let Some(data) = self.store.name(name) {
                        parents.insert(data.parent);
                    }
                }
                ConstructRef::Occurrence(occurrence) => {
                    if let Some(data) = self.store.occurrence(occurrence) {
                        parents.insert(data.parent);
                    }
                }
                ConstructRef::Variant(variant) => {
                    if let Some(data) = self.store.variant(variant) {
                        names.insert(data.parent);
                    }
                }
                ConstructRef::Role(role) => {
                    if let Some(data) = self.store.role(role) {
                        associations.insert(data.parent);
                    }
                }
                ConstructRef::Association(association) => {
                    associations.insert(association);
                }
                _ => (),
            }
        }
        if let Some(data) = self.store.topic(topic) {
            for role in &data.roles_played {
                if let Some(role) = self.store.role(*role) {
                    associations.insert(role.parent);
                }
            }
        }
        for association in &associations {
            self.deduplicate_roles(*association, merger);
        }
        self.deduplicate_associations(associations, merger);
        for parent in parents {
            self.deduplicate_characteristics(parent, merger);
        }
        for name in names {
            self.deduplicate_variants(name, merger);
        }
    }

    // ------------- Duplicate suppression -------------
    fn deduplicate_characteristics(&mut self, topic: TopicId, merger: &mut Merger) {
        let Some(data) = self.store.topic(topic) else {
            return;
        };
        let names: Vec<_> = data.names.iter().copied().collect();
        let occurrences: Vec<_> = data.occurrences.iter().copied().collect();
        let mut kept_names: HashMap<(TopicId, Themes, String), NameId, OtherHasher> = HashMap::default();
        for name in names {
            let Some(data) = self.store.name(name) else {
                continue;
            };
            match kept_names.entry((data.type_, data.scope.clone(), data.value.clone())) {
                Entry::Occupied(kept) => self.absorb_duplicate((*kept.get()).into(), name.into(), merger),
                Entry::Vacant(slot) => {
                    slot.insert(name);
                }
            }
        }
        for name in kept_names.into_values() {
            self.deduplicate_variants(name, merger);
        }
        let mut kept_occurrences: HashMap<_, ConstructRef, OtherHasher> = HashMap::default();
        for occurrence in occurrences {
            let Some(data) = self.store.occurrence(occurrence) else {
                continue;
            };
            let key = (data.type_, data.scope.clone(), data.value.clone(), data.datatype.clone());
            match kept_occurrences.entry(key) {
                Entry::Occupied(kept) => {
                    self.absorb_duplicate(*kept.get(), occurrence.into(), merger)
                }
                Entry::Vacant(slot) => {
                    slot.insert(ConstructRef::from(occurrence));
                }
            }
        }
    }
    fn deduplicate_variants(&mut self, name: NameId, merger: &mut Merger) {
        let Some(data) = self.store.name(name) else {
            return;
        };
        let variants: Vec<_> = data.variants.iter().copied().collect();
        let mut kept: HashMap<(Themes, String, Locator), ConstructRef, OtherHasher> = HashMap::default();
        for variant in variants {
            let Some(scope) = self.effective_scope(variant.into()) else {
                continue;
            };
            let Some(data) = self.store.variant(variant) else {
                continue;
            };
            match kept.entry((scope, data.value.clone(), data.datatype.clone())) {
                Entry::Occupied(survivor) => self.absorb_duplicate(*survivor.get(), variant.into(), merger),
                Entry::Vacant(slot) => {
                    slot.insert(variant.into());
                }
            }
        }
    }
    fn deduplicate_roles(&mut self, association: AssociationId, merger: &mut Merger) {
        let Some(data) = self.store.association(association) else {
            return;
        };
        let roles: Vec<_> = data.roles.iter().copied().collect();
        let mut kept: HashMap<(TopicId, TopicId), ConstructRef, IdHasher> = HashMap::default();
        for role in roles {
            let Some(data) = self.store.role(role) else {
                continue;
            };
            match kept.entry((data.type_, data.player)) {
                Entry::Occupied(survivor) => self.absorb_duplicate(*survivor.get(), role.into(), merger),
                Entry::Vacant(slot) => {
                    slot.insert(role.into());
                }
            }
        }
    }
    fn association_signature(&self, association: AssociationId) -> Option<AssociationSignature> {
        let data = self.store.association(association)?;
        let roles = data
            .roles
            .iter()
            .filter_map(|role| self.store.role(*role).map(|r| (r.type_, r.player)))
            .collect();
        Some((data.type_, data.scope.clone(), roles))
    }
    fn deduplicate_associations(&mut self, candidates: BTreeSet<AssociationId>, merger: &mut Merger) {
        for association in candidates {
            let Some(signature) = self.association_signature(association) else {
                continue;
            };
            let peers: Vec<_> = self
                .store
                .typed_by(signature.0)
                .into_iter()
                .filter_map(|c| c.as_association())
                .filter(|peer| *peer != association)
                .collect();
            for peer in peers {
                if self.store.association(association).is_none() {
                    break;
                }
                if self.association_signature(peer).as_ref() == Some(&signature) {
                    let (survivor, duplicate) = if peer < association {
                        (peer, association)
                    } else {
                        (association, peer)
                    };
                    self.absorb_duplicate(survivor.into(), duplicate.into(), merger);
                }
            }
        }
    }
    // Folds `duplicate` into the equal construct `survivor` and removes it.
    fn absorb_duplicate(&mut self, survivor: ConstructRef, duplicate: ConstructRef, merger: &mut Merger) {
        let Some(item_identifiers) = self.store.item_identifiers(duplicate).cloned() else {
            return;
        };
        trace!(survivor = %survivor, duplicate = %duplicate, "suppressing duplicate");
        for locator in item_identifiers {
            self.store.detach_item_identifier(duplicate, &locator);
            self.store.attach_item_identifier(survivor, locator);
        }
        match (self.store.reifier_of(survivor), self.store.reifier_of(duplicate)) {
            (_, None) => (),
            (None, Some(reifier)) => {
                self.store.unbind_reifier_of(duplicate);
                self.store.bind_reifier(reifier, survivor);
            }
            (Some(kept), Some(reifier)) => {
                self.store.unbind_reifier_of(duplicate);
                merger.pending.push_back((kept, reifier));
            }
        }
        match (survivor, duplicate) {
            (ConstructRef::Name(kept), ConstructRef::Name(name)) => {
                let variants: Vec<_> = self
                    .store
                    .name(name)
                    .map(|n| n.variants.iter().copied().collect())
                    .unwrap_or_default();
                for variant in variants {
                    self.store.reparent_variant(variant, kept);
                }
            }
            (ConstructRef::Association(kept), ConstructRef::Association(association)) => {
                let roles: Vec<_> = self
                    .store
                    .association(association)
                    .map(|a| a.roles.iter().copied().collect())
                    .unwrap_or_default();
                for role in roles {
                    let Some(key) = self.store.role(role).map(|r| (r.type_, r.player)) else {
                        continue;
                    };
                    let counterpart = self.store.association(kept).and_then(|a| {
                        a.roles.iter().copied().find(|candidate| {
                            self.store
                                .role(*candidate)
                                .is_some_and(|r| (r.type_, r.player) == key)
                        })
                    });
                    match counterpart {
                        Some(counterpart) => self.absorb_duplicate(counterpart.into(), role.into(), merger),
                        None => self.store.reparent_role(role, kept),
                    }
                }
            }
            _ => (),
        }
        self.store.detach(duplicate);
        merger.constructs.insert(duplicate, survivor);
    }

    // ------------- Topic maps -------------
    /// Merges a copy of `other` into this topic map; `other` is left untouched.
    pub fn merge_topic_map(&mut self, other: &TopicMap) -> Result<()> {
        self.ensure_open()?;
        other.ensure_open()?;
        if self.id() == other.id() {
            return Ok(());
        }
        debug!(map = self.id().value(), source = other.id().value(), "merging topic maps");
        let mut work = self.snapshot();
        work.absorb_topic_map(other)?;
        self.store = work.store;
        Ok(())
    }

    fn absorb_topic_map(&mut self, other: &TopicMap) -> Result<()> {
        let reporter = self.as_construct();
        let mut merger = Merger::default();
        let mut topics: HashMap<TopicId, TopicId, IdHasher> = HashMap::default();

        // topics, matched by every kind of identity
        for &source in other.topics() {
            let data = other.topic_data(source)?;
            let mut matches = BTreeSet::new();
            for locator in data.item_identifiers.iter().chain(data.subject_identifiers.iter()) {
                match self.store.by_item_identifier(locator) {
                    Some(ConstructRef::Topic(topic)) => {
                        matches.insert(topic);
                    }
                    Some(existing) => return Err(TopicMapError::identity(reporter, existing, locator)),
                    None => (),
                }
                if let Some(topic) = self.store.by_subject_identifier(locator) {
                    matches.insert(topic);
                }
            }
            for locator in &data.subject_locators {
                if let Some(topic) = self.store.by_subject_locator(locator) {
                    matches.insert(topic);
                }
            }
            let mut matches = matches.into_iter();
            let target = match matches.next() {
                Some(first) => {
                    for topic in matches {
                        merger.pending.push_back((first, topic));
                    }
                    self.run_merges(&mut merger)?;
                    merger.topic(first)
                }
                None => self.insert_topic(),
            };
            for locator in &data.item_identifiers {
                self.store.attach_item_identifier(target.into(), locator.clone());
            }
            for locator in &data.subject_identifiers {
                self.store.attach_subject_identifier(target, locator.clone());
            }
            for locator in &data.subject_locators {
                self.store.attach_subject_locator(target, locator.clone());
            }
            topics.insert(source, target);
        }
        let resolve = |merger: &Merger, topic: TopicId| -> Result<TopicId> {
            topics
                .get(&topic)
                .map(|t| merger.topic(*t))
                .ok_or_else(|| TopicMapError::model(topic, "the topic is not part of the merged topic map"))
        };
        let resolve_all = |merger: &Merger, themes: &Themes| -> Result<Themes> {
            themes.iter().map(|theme| resolve(merger, *theme)).collect()
        };

        for &source in other.topics() {
            let instance = resolve(&merger, source)?;
            for type_ in &other.topic_data(source)?.types {
                let type_ = resolve(&merger, *type_)?;
                self.add_type(instance, type_)?;
            }
        }

        // characteristics and associations, identifiers and reifiers come last
        let mut copies: Vec<(ConstructRef, ConstructRef)> = Vec::new();
        for &source in other.topics() {
            let data = other.topic_data(source)?;
            let parent = resolve(&merger, source)?;
            for &name in &data.names {
                let original = other.name_data(name)?;
                let copy = self.store.insert(Construct::Name(NameData {
                    item_identifiers: LocatorSet::default(),
                    parent,
                    type_: resolve(&merger, original.type_)?,
                    scope: resolve_all(&merger, &original.scope)?,
                    value: original.value.clone(),
                    variants: BTreeSet::new(),
                }));
                copies.push((name.into(), copy));
                let Some(copied_name) = copy.as_name() else {
                    continue;
                };
                for &variant in &original.variants {
                    let original = other.variant_data(variant)?;
                    let copy = self.store.insert(Construct::Variant(VariantData {
                        item_identifiers: LocatorSet::default(),
                        parent: copied_name,
                        own_themes: resolve_all(&merger, &original.own_themes)?,
                        value: original.value.clone(),
                        datatype: original.datatype.clone(),
                    }));
                    copies.push((variant.into(), copy));
                }
            }
            for &occurrence in &data.occurrences {
                let original = other.occurrence_data(occurrence)?;
                let copy = self.store.insert(Construct::Occurrence(OccurrenceData {
                    item_identifiers: LocatorSet::default(),
                    parent,
                    type_: resolve(&merger, original.type_)?,
                    scope: resolve_all(&merger, &original.scope)?,
                    value: original.value.clone(),
                    datatype: original.datatype.clone(),
                }));
                copies.push((occurrence.into(), copy));
            }
        }
        let mut copied_associations = BTreeSet::new();
        for &association in other.associations() {
            let original = other.association_data(association)?;
            let copy = self.store.insert(Construct::Association(AssociationData {
                item_identifiers: LocatorSet::default(),
                type_: resolve(&merger, original.type_)?,
                scope: resolve_all(&merger, &original.scope)?,
                roles: BTreeSet::new(),
            }));
            copies.push((association.into(), copy));
            let Some(copied_association) = copy.as_association() else {
                continue;
            };
            copied_associations.insert(copied_association);
            for &role in &original.roles {
                let original = other.role_data(role)?;
                let copy = self.store.insert(Construct::Role(RoleData {
                    item_identifiers: LocatorSet::default(),
                    parent: copied_association,
                    type_: resolve(&merger, original.type_)?,
                    player: resolve(&merger, original.player)?,
                }));
                copies.push((role.into(), copy));
            }
        }

        let touched: BTreeSet<TopicId> = topics.values().map(|t| merger.topic(*t)).collect();
        for topic in touched {
            self.deduplicate_characteristics(topic, &mut merger);
        }
        for association in &copied_associations {
            self.deduplicate_roles(*association, &mut merger);
        }
        self.deduplicate_associations(copied_associations, &mut merger);
        self.run_merges(&mut merger)?;

        let mut reifications: Vec<(ConstructRef, TopicId)> = copies
            .iter()
            .filter_map(|(source, copy)| other.store.reifier_of(*source).map(|r| (*copy, r)))
            .collect();
        if let Some(reifier) = other.store.reifier_of(other.as_construct()) {
            reifications.push((reporter, reifier));
        }
        for (copy, reifier) in reifications {
            let construct = merger.construct(copy);
            let reifier = resolve(&merger, reifier)?;
            match (self.store.reifier_of(construct), self.store.reified_by(reifier)) {
                (Some(current), _) if current == reifier => (),
                (_, Some(reified)) if reified != construct => {
                    return Err(TopicMapError::model(
                        construct,
                        format!("{} already reifies {}", reifier, reified),
                    ));
                }
                (Some(current), _) => {
                    merger.pending.push_back((current, reifier));
                    self.run_merges(&mut merger)?;
                }
                (None, _) => self.store.bind_reifier(reifier, construct),
            }
        }

        let mut identified: Vec<(ConstructRef, &Locator)> = Vec::new();
        for (source, copy) in &copies {
            if let Some(item_identifiers) = other.store.item_identifiers(*source) {
                identified.extend(item_identifiers.iter().map(|locator| (*copy, locator)));
            }
        }
        if let Some(item_identifiers) = other.store.item_identifiers(other.as_construct()) {
            identified.extend(item_identifiers.iter().map(|locator| (reporter, locator)));
        }
        for (copy, locator) in identified {
            let construct = merger.construct(copy);
            if let Some(topic) = self.store.by_subject_identifier(locator) {
                return Err(TopicMapError::identity(construct, topic, locator));
            }
            match self.store.by_item_identifier(locator) {
                None => self.store.attach_item_identifier(construct, locator.clone()),
                Some(existing) if existing == construct => (),
                Some(existing) => return Err(TopicMapError::identity(construct, existing, locator)),
            }
        }
        Ok(())
    }
}
