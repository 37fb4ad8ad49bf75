//! Identifier assignment and identity-based topic creation.
//!
//! Item identifiers are unique among all constructs of a topic map, subject
//! identifiers and subject locators among its topics, and an item identifier
//! of one topic must not be the subject identifier of another. A collision
//! between two topics either merges them (automerge) or is refused with an
//! identity constraint error; any collision involving a construct that is not
//! a topic is always refused.

use tracing::trace;

use crate::construct::{Construct, ConstructRef, LocatorSet, TopicData, TopicId};
use crate::error::{Result, TopicMapError};
use crate::locator::Locator;
use crate::topicmap::TopicMap;

impl TopicMap {
    pub fn item_identifiers(&self, construct: impl Into<ConstructRef>) -> Result<&LocatorSet> {
        let construct = self.check(construct)?;
        self.store
            .item_identifiers(construct)
            .ok_or_else(|| self.missing(construct))
    }
    pub fn add_item_identifier(&mut self, construct: impl Into<ConstructRef>, locator: &Locator) -> Result<()> {
        let construct = self.check(construct)?;
        match self.store.by_item_identifier(locator) {
            Some(existing) if existing == construct => return Ok(()),
            Some(existing) => {
                return match (construct, existing) {
                    // the merge moves the identifier over
                    (ConstructRef::Topic(topic), ConstructRef::Topic(other)) => {
                        self.collide(topic, other, locator)
                    }
                    _ => Err(TopicMapError::identity(construct, existing, locator)),
                };
            }
            None => (),
        }
        if let Some(other) = self.store.by_subject_identifier(locator) {
            match construct {
                ConstructRef::Topic(topic) if topic == other => (),
                ConstructRef::Topic(topic) => self.collide(topic, other, locator)?,
                _ => return Err(TopicMapError::identity(construct, other, locator)),
            }
        }
        trace!(construct = %construct, locator = %locator, "adding item identifier");
        self.store.attach_item_identifier(construct, locator.clone());
        Ok(())
    }
    pub fn remove_item_identifier(&mut self, construct: impl Into<ConstructRef>, locator: &Locator) -> Result<()> {
        let construct = self.check(construct)?;
        self.store.detach_item_identifier(construct, locator);
        Ok(())
    }
    pub fn add_subject_identifier(&mut self, topic: TopicId, locator: &Locator) -> Result<()> {
        self.check(topic)?;
        if let Some(other) = self.store.by_subject_identifier(locator) {
            if other == topic {
                return Ok(());
            }
            return self.collide(topic, other, locator);
        }
        match self.store.by_item_identifier(locator) {
            Some(ConstructRef::Topic(other)) if other == topic => (),
            Some(ConstructRef::Topic(other)) => self.collide(topic, other, locator)?,
            Some(existing) => return Err(TopicMapError::identity(topic, existing, locator)),
            None => (),
        }
        trace!(topic = %topic, locator = %locator, "adding subject identifier");
        self.store.attach_subject_identifier(topic, locator.clone());
        Ok(())
    }
    pub fn remove_subject_identifier(&mut self, topic: TopicId, locator: &Locator) -> Result<()> {
        self.check(topic)?;
        self.store.detach_subject_identifier(topic, locator);
        Ok(())
    }
    pub fn add_subject_locator(&mut self, topic: TopicId, locator: &Locator) -> Result<()> {
        self.check(topic)?;
        if let Some(other) = self.store.by_subject_locator(locator) {
            if other == topic {
                return Ok(());
            }
            return self.collide(topic, other, locator);
        }
        trace!(topic = %topic, locator = %locator, "adding subject locator");
        self.store.attach_subject_locator(topic, locator.clone());
        Ok(())
    }
    pub fn remove_subject_locator(&mut self, topic: TopicId, locator: &Locator) -> Result<()> {
        self.check(topic)?;
        self.store.detach_subject_locator(topic, locator);
        Ok(())
    }

    // `topic` survives, so the caller keeps addressing the merged result.
    fn collide(&mut self, topic: TopicId, other: TopicId, locator: &Locator) -> Result<()> {
        if !self.features().automerge {
            return Err(TopicMapError::identity(topic, other, locator));
        }
        self.merge_topics(topic, other)
    }

    // ------------- Topic creation -------------
    /// Creates a topic identified by a generated item identifier.
    pub fn create_topic(&mut self) -> Result<TopicId> {
        self.ensure_open()?;
        let topic = self.insert_topic();
        let mut suffix = topic.id().seq();
        loop {
            let locator = self.locator().resolve(&format!("#t{}", suffix))?;
            if self.store.by_item_identifier(&locator).is_none()
                && self.store.by_subject_identifier(&locator).is_none()
            {
                self.store.attach_item_identifier(topic.into(), locator);
                return Ok(topic);
            }
            suffix += 1;
        }
    }
    /// Returns the topic already holding the identifier when automerge is on,
    /// refuses the collision when it is off, and creates a new topic otherwise.
    pub fn create_topic_by_item_identifier(&mut self, locator: &Locator) -> Result<TopicId> {
        self.ensure_open()?;
        let automerge = self.features().automerge;
        match self.store.by_item_identifier(locator) {
            Some(ConstructRef::Topic(existing)) if automerge => return Ok(existing),
            Some(existing) => return Err(TopicMapError::identity(self.id(), existing, locator)),
            None => (),
        }
        if let Some(existing) = self.store.by_subject_identifier(locator) {
            if !automerge {
                return Err(TopicMapError::identity(self.id(), existing, locator));
            }
            self.store.attach_item_identifier(existing.into(), locator.clone());
            return Ok(existing);
        }
        let topic = self.insert_topic();
        self.store.attach_item_identifier(topic.into(), locator.clone());
        Ok(topic)
    }
    /// Returns the topic with this subject identifier, creating it when absent.
    pub fn create_topic_by_subject_identifier(&mut self, locator: &Locator) -> Result<TopicId> {
        self.ensure_open()?;
        if let Some(existing) = self.store.by_subject_identifier(locator) {
            return Ok(existing);
        }
        match self.store.by_item_identifier(locator) {
            Some(ConstructRef::Topic(existing)) => {
                self.store.attach_subject_identifier(existing, locator.clone());
                return Ok(existing);
            }
            Some(existing) => return Err(TopicMapError::identity(self.id(), existing, locator)),
            None => (),
        }
        let topic = self.insert_topic();
        self.store.attach_subject_identifier(topic, locator.clone());
        Ok(topic)
    }
    /// Returns the topic with this subject locator, creating it when absent.
    pub fn create_topic_by_subject_locator(&mut self, locator: &Locator) -> Result<TopicId> {
        self.ensure_open()?;
        if let Some(existing) = self.store.by_subject_locator(locator) {
            return Ok(existing);
        }
        let topic = self.insert_topic();
        self.store.attach_subject_locator(topic, locator.clone());
        Ok(topic)
    }
    pub(crate) fn insert_topic(&mut self) -> TopicId {
        match self.store.insert(Construct::Topic(TopicData::default())) {
            ConstructRef::Topic(topic) => topic,
            // insert hands back the kind it was given
            other => unreachable!("inserted a topic but got {}", other),
        }
    }
}
