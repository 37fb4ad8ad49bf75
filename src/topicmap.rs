//! The topic map: root construct and the only way to create, read and change
//! the constructs it owns.
//!
//! Every operation validates all of its arguments (same topic map, construct
//! still alive, capability of the construct kind) before the first mutation,
//! so a failed call leaves the topic map as it was. Identifier handling lives
//! in `identity`, scopes in `scope`, removal in `removal` and merging in
//! `merge`; they all extend `TopicMap`.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::construct::{
    AssociationData, AssociationId, Construct, ConstructId, ConstructRef, DatatypeAware, LocatorSet,
    MapId, NameData, NameId, OccurrenceData, OccurrenceId, Reifiable, RoleData, RoleId, Themes,
    TopicData, TopicId, Typed, VariantData, VariantId,
};
use crate::datatype::{
    INSTANCE_LOCATOR, Literal, TOPIC_NAME_LOCATOR, TYPE_INSTANCE_LOCATOR, TYPE_LOCATOR,
    XSD_STRING_LOCATOR,
};
use crate::error::{Result, TopicMapError};
use crate::locator::Locator;
use crate::store::Store;
use crate::system::Features;

#[derive(Debug)]
pub struct TopicMap {
    id: MapId,
    locator: Locator,
    features: Features,
    pub(crate) store: Store,
    closed: bool,
}

impl TopicMap {
    pub(crate) fn new(locator: Locator, features: Features) -> Self {
        let id = MapId::generate();
        info!(map = id.value(), locator = %locator, "created topic map");
        Self {
            id,
            locator,
            features,
            store: Store::new(id),
            closed: false,
        }
    }
    pub fn id(&self) -> MapId {
        self.id
    }
    /// The storage address the topic map was created with.
    pub fn locator(&self) -> &Locator {
        &self.locator
    }
    pub fn features(&self) -> Features {
        self.features
    }
    pub fn is_closed(&self) -> bool {
        self.closed
    }
    pub fn as_construct(&self) -> ConstructRef {
        ConstructRef::TopicMap(self.id)
    }
    // Same identity as `self`; only for work that is committed back into this map.
    pub(crate) fn snapshot(&self) -> Self {
        Self {
            id: self.id,
            locator: self.locator.clone(),
            features: self.features,
            store: self.store.clone(),
            closed: self.closed,
        }
    }
    pub(crate) fn close(&mut self) {
        self.store.clear();
        self.closed = true;
    }

    // ------------- Checks -------------
    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(TopicMapError::model(self.id, "the topic map has been closed"));
        }
        Ok(())
    }
    pub(crate) fn check(&self, construct: impl Into<ConstructRef>) -> Result<ConstructRef> {
        let construct = construct.into();
        self.ensure_open()?;
        if self.store.contains(construct) {
            Ok(construct)
        } else {
            Err(self.missing(construct))
        }
    }
    pub(crate) fn missing(&self, construct: impl Into<ConstructRef>) -> TopicMapError {
        let construct = construct.into();
        let message = if self.closed {
            "the topic map has been closed"
        } else if construct.map() != self.id {
            "the construct belongs to another topic map"
        } else {
            "the construct has been removed"
        };
        TopicMapError::model(construct, message)
    }
    // Cross references must point at live topics of this very topic map.
    pub(crate) fn check_reference(&self, reporter: ConstructRef, topic: TopicId) -> Result<()> {
        if topic.id().map() != self.id {
            return Err(TopicMapError::model(
                reporter,
                format!("{} belongs to another topic map", topic),
            ));
        }
        if self.store.topic(topic).is_none() {
            return Err(TopicMapError::model(reporter, format!("{} has been removed", topic)));
        }
        Ok(())
    }
    pub(crate) fn check_themes(&self, reporter: ConstructRef, themes: &[TopicId]) -> Result<Themes> {
        for theme in themes {
            self.check_reference(reporter, *theme)?;
        }
        Ok(themes.iter().copied().collect())
    }
    pub(crate) fn topic_data(&self, topic: TopicId) -> Result<&TopicData> {
        self.ensure_open()?;
        self.store.topic(topic).ok_or_else(|| self.missing(topic))
    }
    pub(crate) fn association_data(&self, association: AssociationId) -> Result<&AssociationData> {
        self.ensure_open()?;
        self.store
            .association(association)
            .ok_or_else(|| self.missing(association))
    }
    pub(crate) fn role_data(&self, role: RoleId) -> Result<&RoleData> {
        self.ensure_open()?;
        self.store.role(role).ok_or_else(|| self.missing(role))
    }
    pub(crate) fn name_data(&self, name: NameId) -> Result<&NameData> {
        self.ensure_open()?;
        self.store.name(name).ok_or_else(|| self.missing(name))
    }
    pub(crate) fn occurrence_data(&self, occurrence: OccurrenceId) -> Result<&OccurrenceData> {
        self.ensure_open()?;
        self.store
            .occurrence(occurrence)
            .ok_or_else(|| self.missing(occurrence))
    }
    pub(crate) fn variant_data(&self, variant: VariantId) -> Result<&VariantData> {
        self.ensure_open()?;
        self.store.variant(variant).ok_or_else(|| self.missing(variant))
    }

    // ------------- Topic map -------------
    pub fn topics(&self) -> &BTreeSet<TopicId> {
        self.store.topics()
    }
    pub fn associations(&self) -> &BTreeSet<AssociationId> {
        self.store.associations()
    }
    pub fn construct_by_item_identifier(&self, locator: &Locator) -> Option<ConstructRef> {
        self.store.by_item_identifier(locator)
    }
    pub fn construct_by_id(&self, id: ConstructId) -> Option<ConstructRef> {
        self.store.by_id(id)
    }
    pub fn topic_by_subject_identifier(&self, locator: &Locator) -> Option<TopicId> {
        self.store.by_subject_identifier(locator)
    }
    pub fn topic_by_subject_locator(&self, locator: &Locator) -> Option<TopicId> {
        self.store.by_subject_locator(locator)
    }
    /// The construct's parent; `None` for the topic map itself.
    pub fn parent(&self, construct: impl Into<ConstructRef>) -> Result<Option<ConstructRef>> {
        let construct = self.check(construct)?;
        let parent = match construct {
            ConstructRef::TopicMap(_) => None,
            ConstructRef::Topic(_) | ConstructRef::Association(_) => Some(self.as_construct()),
            ConstructRef::Role(role) => Some(self.role_data(role)?.parent.into()),
            ConstructRef::Occurrence(occurrence) => {
                Some(self.occurrence_data(occurrence)?.parent.into())
            }
            ConstructRef::Name(name) => Some(self.name_data(name)?.parent.into()),
            ConstructRef::Variant(variant) => Some(self.variant_data(variant)?.parent.into()),
        };
        Ok(parent)
    }
    /// Removes every topic and association, ignoring whether topics are in use.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_open()?;
        debug!(map = self.id.value(), "clearing topic map");
        self.store.clear();
        Ok(())
    }

    // ------------- Typed -------------
    pub fn type_of(&self, typed: impl Typed) -> Result<TopicId> {
        let construct = self.check(typed)?;
        self.store
            .get(construct)
            .and_then(|c| c.type_())
            .ok_or_else(|| TopicMapError::model(construct, "the construct is not typed"))
    }
    pub fn set_type(&mut self, typed: impl Typed, type_: TopicId) -> Result<()> {
        let construct = self.check(typed)?;
        if !construct.is_typed() {
            return Err(TopicMapError::model(construct, "the construct is not typed"));
        }
        self.check_reference(construct, type_)?;
        self.store.assign_type(construct, type_);
        Ok(())
    }

    // ------------- Reifiable -------------
    pub fn reifier(&self, reifiable: impl Reifiable) -> Result<Option<TopicId>> {
        let construct = self.check(reifiable)?;
        Ok(self.store.reifier_of(construct))
    }
    /// Binds `reifier` to the construct, or unbinds the current reifier with `None`.
    pub fn set_reifier(&mut self, reifiable: impl Reifiable, reifier: Option<TopicId>) -> Result<()> {
        let construct = self.check(reifiable)?;
        if !construct.is_reifiable() {
            return Err(TopicMapError::model(construct, "topics cannot be reified"));
        }
        match reifier {
            None => {
                self.store.unbind_reifier_of(construct);
            }
            Some(topic) => {
                self.check_reference(construct, topic)?;
                match self.store.reified_by(topic) {
                    Some(reified) if reified == construct => return Ok(()),
                    Some(reified) => {
                        return Err(TopicMapError::model(
                            construct,
                            format!("{} already reifies {}", topic, reified),
                        ));
                    }
                    None => (),
                }
                self.store.unbind_reifier_of(construct);
                self.store.bind_reifier(topic, construct);
            }
        }
        Ok(())
    }
    /// The construct reified by `topic`, if any.
    pub fn reified(&self, topic: TopicId) -> Result<Option<ConstructRef>> {
        self.topic_data(topic)?;
        Ok(self.store.reified_by(topic))
    }

    // ------------- Topic -------------
    pub fn subject_identifiers(&self, topic: TopicId) -> Result<&LocatorSet> {
        Ok(&self.topic_data(topic)?.subject_identifiers)
    }
    pub fn subject_locators(&self, topic: TopicId) -> Result<&LocatorSet> {
        Ok(&self.topic_data(topic)?.subject_locators)
    }
    pub fn types(&self, topic: TopicId) -> Result<&BTreeSet<TopicId>> {
        Ok(&self.topic_data(topic)?.types)
    }
    pub fn add_type(&mut self, topic: TopicId, type_: TopicId) -> Result<()> {
        self.check(topic)?;
        self.check_reference(topic.into(), type_)?;
        if self.topic_data(topic)?.types.contains(&type_) {
            return Ok(());
        }
        if self.features.type_instance_associations {
            self.materialize_type_instance(topic, type_)?;
        }
        self.store.add_topic_type(topic, type_);
        Ok(())
    }
    pub fn remove_type(&mut self, topic: TopicId, type_: TopicId) -> Result<()> {
        self.check(topic)?;
        if self.features.type_instance_associations {
            for association in self.type_instance_associations(topic, type_) {
                self.remove(association)?;
            }
        }
        self.store.remove_topic_type(topic, type_);
        Ok(())
    }
    pub fn names(&self, topic: TopicId) -> Result<&BTreeSet<NameId>> {
        Ok(&self.topic_data(topic)?.names)
    }
    pub fn names_of_type(&self, topic: TopicId, type_: TopicId) -> Result<Vec<NameId>> {
        let names = self.names(topic)?;
        Ok(names
            .iter()
            .copied()
            .filter(|name| self.store.name(*name).is_some_and(|n| n.type_ == type_))
            .collect())
    }
    pub fn occurrences(&self, topic: TopicId) -> Result<&BTreeSet<OccurrenceId>> {
        Ok(&self.topic_data(topic)?.occurrences)
    }
    pub fn occurrences_of_type(&self, topic: TopicId, type_: TopicId) -> Result<Vec<OccurrenceId>> {
        let occurrences = self.occurrences(topic)?;
        Ok(occurrences
            .iter()
            .copied()
            .filter(|o| self.store.occurrence(*o).is_some_and(|data| data.type_ == type_))
            .collect())
    }
    pub fn roles_played(&self, topic: TopicId) -> Result<&BTreeSet<RoleId>> {
        Ok(&self.topic_data(topic)?.roles_played)
    }
    pub fn roles_played_of_type(&self, topic: TopicId, type_: TopicId) -> Result<Vec<RoleId>> {
        let roles = self.roles_played(topic)?;
        Ok(roles
            .iter()
            .copied()
            .filter(|r| self.store.role(*r).is_some_and(|data| data.type_ == type_))
            .collect())
    }
    /// Roles of type `type_` played by `topic` in associations of type `association_type`.
    pub fn roles_played_in(
        &self,
        topic: TopicId,
        type_: TopicId,
        association_type: TopicId,
    ) -> Result<Vec<RoleId>> {
        let roles = self.roles_played_of_type(topic, type_)?;
        Ok(roles
            .into_iter()
            .filter(|r| {
                self.store
                    .role(*r)
                    .and_then(|data| self.store.association(data.parent))
                    .is_some_and(|a| a.type_ == association_type)
            })
            .collect())
    }
    pub fn create_name(&mut self, topic: TopicId, value: &str, scope: &[TopicId]) -> Result<NameId> {
        self.check(topic)?;
        self.check_themes(topic.into(), scope)?;
        let type_ = self.default_name_type()?;
        self.create_name_with_type(topic, type_, value, scope)
    }
    pub fn create_name_with_type(
        &mut self,
        topic: TopicId,
        type_: TopicId,
        value: &str,
        scope: &[TopicId],
    ) -> Result<NameId> {
        self.check(topic)?;
        self.check_reference(topic.into(), type_)?;
        let scope = self.check_themes(topic.into(), scope)?;
        let name = self.store.insert(Construct::Name(NameData {
            item_identifiers: LocatorSet::default(),
            parent: topic,
            type_,
            scope,
            value: value.to_string(),
            variants: BTreeSet::new(),
        }));
        name.as_name()
            .ok_or_else(|| TopicMapError::model(topic, "failed to create a name"))
    }
    /// The type given to names created without an explicit one.
    pub fn default_name_type(&mut self) -> Result<TopicId> {
        self.create_topic_by_subject_identifier(&TOPIC_NAME_LOCATOR)
    }
    pub fn create_occurrence(
        &mut self,
        topic: TopicId,
        type_: TopicId,
        value: &str,
        scope: &[TopicId],
    ) -> Result<OccurrenceId> {
        self.create_occurrence_with_datatype(topic, type_, value, &XSD_STRING_LOCATOR, scope)
    }
    pub fn create_occurrence_literal<V: Literal>(
        &mut self,
        topic: TopicId,
        type_: TopicId,
        value: &V,
        scope: &[TopicId],
    ) -> Result<OccurrenceId> {
        self.create_occurrence_with_datatype(topic, type_, &value.lexical(), &value.datatype(), scope)
    }
    pub fn create_occurrence_with_datatype(
        &mut self,
        topic: TopicId,
        type_: TopicId,
        value: &str,
        datatype: &Locator,
        scope: &[TopicId],
    ) -> Result<OccurrenceId> {
        self.check(topic)?;
        self.check_reference(topic.into(), type_)?;
        let scope = self.check_themes(topic.into(), scope)?;
        let occurrence = self.store.insert(Construct::Occurrence(OccurrenceData {
            item_identifiers: LocatorSet::default(),
            parent: topic,
            type_,
            scope,
            value: value.to_string(),
            datatype: datatype.clone(),
        }));
        occurrence
            .as_occurrence()
            .ok_or_else(|| TopicMapError::model(topic, "failed to create an occurrence"))
    }

    // ------------- Association & Role -------------
    pub fn create_association(&mut self, type_: TopicId, scope: &[TopicId]) -> Result<AssociationId> {
        self.ensure_open()?;
        let reporter = self.as_construct();
        self.check_reference(reporter, type_)?;
        let scope = self.check_themes(reporter, scope)?;
        let association = self.store.insert(Construct::Association(AssociationData {
            item_identifiers: LocatorSet::default(),
            type_,
            scope,
            roles: BTreeSet::new(),
        }));
        association
            .as_association()
            .ok_or_else(|| TopicMapError::model(reporter, "failed to create an association"))
    }
    pub fn create_role(&mut self, association: AssociationId, type_: TopicId, player: TopicId) -> Result<RoleId> {
        self.check(association)?;
        self.check_reference(association.into(), type_)?;
        self.check_reference(association.into(), player)?;
        let role = self.store.insert(Construct::Role(RoleData {
            item_identifiers: LocatorSet::default(),
            parent: association,
            type_,
            player,
        }));
        role.as_role()
            .ok_or_else(|| TopicMapError::model(association, "failed to create a role"))
    }
    pub fn roles(&self, association: AssociationId) -> Result<&BTreeSet<RoleId>> {
        Ok(&self.association_data(association)?.roles)
    }
    pub fn role_types(&self, association: AssociationId) -> Result<BTreeSet<TopicId>> {
        let roles = self.roles(association)?;
        Ok(roles
            .iter()
            .filter_map(|r| self.store.role(*r).map(|data| data.type_))
            .collect())
    }
    pub fn roles_of_type(&self, association: AssociationId, type_: TopicId) -> Result<Vec<RoleId>> {
        let roles = self.roles(association)?;
        Ok(roles
            .iter()
            .copied()
            .filter(|r| self.store.role(*r).is_some_and(|data| data.type_ == type_))
            .collect())
    }
    pub fn player(&self, role: RoleId) -> Result<TopicId> {
        Ok(self.role_data(role)?.player)
    }
    pub fn set_player(&mut self, role: RoleId, player: TopicId) -> Result<()> {
        self.check(role)?;
        self.check_reference(role.into(), player)?;
        self.store.assign_player(role, player);
        Ok(())
    }

    // ------------- Values -------------
    pub fn value(&self, construct: impl Into<ConstructRef>) -> Result<&str> {
        let construct = self.check(construct)?;
        match self.store.get(construct) {
            Some(Construct::Name(data)) => Ok(&data.value),
            Some(Construct::Occurrence(data)) => Ok(&data.value),
            Some(Construct::Variant(data)) => Ok(&data.value),
            _ => Err(TopicMapError::model(construct, "the construct has no value")),
        }
    }
    pub fn datatype(&self, construct: impl DatatypeAware) -> Result<&Locator> {
        let construct = self.check(construct)?;
        match self.store.get(construct) {
            Some(Construct::Occurrence(data)) => Ok(&data.datatype),
            Some(Construct::Variant(data)) => Ok(&data.datatype),
            _ => Err(TopicMapError::model(construct, "the construct has no datatype")),
        }
    }
    /// Sets a string value; occurrences and variants become `xsd:string`.
    pub fn set_value(&mut self, construct: impl Into<ConstructRef>, value: &str) -> Result<()> {
        let construct = self.check(construct)?;
        match self.store.get_mut(construct) {
            Some(Construct::Name(data)) => data.value = value.to_string(),
            Some(Construct::Occurrence(data)) => {
                data.value = value.to_string();
                data.datatype = XSD_STRING_LOCATOR.clone();
            }
            Some(Construct::Variant(data)) => {
                data.value = value.to_string();
                data.datatype = XSD_STRING_LOCATOR.clone();
            }
            _ => return Err(TopicMapError::model(construct, "the construct has no value")),
        }
        Ok(())
    }
    pub fn set_literal<V: Literal>(&mut self, construct: impl DatatypeAware, value: &V) -> Result<()> {
        self.set_value_with_datatype(construct, &value.lexical(), &value.datatype())
    }
    pub fn set_value_with_datatype(
        &mut self,
        construct: impl DatatypeAware,
        value: &str,
        datatype: &Locator,
    ) -> Result<()> {
        let construct = self.check(construct)?;
        match self.store.get_mut(construct) {
            Some(Construct::Occurrence(data)) => {
                data.value = value.to_string();
                data.datatype = datatype.clone();
            }
            Some(Construct::Variant(data)) => {
                data.value = value.to_string();
                data.datatype = datatype.clone();
            }
            _ => return Err(TopicMapError::model(construct, "the construct has no datatype")),
        }
        Ok(())
    }
    /// Reads the value back as `V`, failing when the lexical form does not parse.
    pub fn literal_as<V: Literal>(&self, construct: impl DatatypeAware) -> Result<V> {
        let construct: ConstructRef = construct.into();
        let lexical = self.value(construct)?;
        V::parse(lexical).ok_or_else(|| TopicMapError::InvalidLiteral {
            lexical: lexical.to_string(),
            datatype: Locator::trusted(V::DATATYPE),
        })
    }

    // ------------- Type-instance associations -------------
    fn materialize_type_instance(&mut self, topic: TopicId, type_: TopicId) -> Result<()> {
        if !self.type_instance_associations(topic, type_).is_empty() {
            return Ok(());
        }
        let association_type = self.create_topic_by_subject_identifier(&TYPE_INSTANCE_LOCATOR)?;
        let type_role = self.create_topic_by_subject_identifier(&TYPE_LOCATOR)?;
        let instance_role = self.create_topic_by_subject_identifier(&INSTANCE_LOCATOR)?;
        let association = self.create_association(association_type, &[])?;
        self.create_role(association, type_role, type_)?;
        self.create_role(association, instance_role, topic)?;
        Ok(())
    }
    // Unscoped type-instance associations pairing exactly `topic` as instance and `type_` as type.
    pub(crate) fn type_instance_associations(&self, topic: TopicId, type_: TopicId) -> Vec<AssociationId> {
        let Some(data) = self.store.topic(topic) else {
            return Vec::new();
        };
        data.roles_played
            .iter()
            .filter_map(|role| self.type_instance_pair(self.store.role(*role)?.parent))
            .filter(|(association, t, i)| {
                *t == type_ && *i == topic && self.store.association(*association).is_some_and(|a| a.scope.is_empty())
            })
            .map(|(association, _, _)| association)
            .collect()
    }
    // (association, type, instance) when the association is a well-formed type-instance association.
    pub(crate) fn type_instance_pair(&self, association: AssociationId) -> Option<(AssociationId, TopicId, TopicId)> {
        let data = self.store.association(association)?;
        let association_type = self.store.by_subject_identifier(&TYPE_INSTANCE_LOCATOR)?;
        if data.type_ != association_type || data.roles.len() != 2 {
            return None;
        }
        let type_role = self.store.by_subject_identifier(&TYPE_LOCATOR)?;
        let instance_role = self.store.by_subject_identifier(&INSTANCE_LOCATOR)?;
        let mut type_ = None;
        let mut instance = None;
        for role in &data.roles {
            let role = self.store.role(*role)?;
            if role.type_ == type_role {
                type_ = Some(role.player);
            } else if role.type_ == instance_role {
                instance = Some(role.player);
            }
        }
        Some((association, type_?, instance?))
    }
}
