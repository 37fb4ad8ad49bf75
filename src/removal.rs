//! Removal of constructs.
//!
//! Removal cascades to children (association to roles, name to variants,
//! topic to names and occurrences), unbinds reifiers and releases item
//! identifiers so they can be used again. Topics are only removed while
//! nothing references them.

use tracing::debug;

use crate::construct::{ConstructRef, RoleId, TopicId};
use crate::error::{Result, TopicMapError};
use crate::topicmap::TopicMap;

impl TopicMap {
    /// Removes any construct; removing the topic map itself clears it.
    ///
    /// A cleared topic map stays registered with its system; use
    /// [`TopicMapSystem::remove_topic_map`](crate::system::TopicMapSystem::remove_topic_map)
    /// to unregister it.
    pub fn remove(&mut self, construct: impl Into<ConstructRef>) -> Result<()> {
        let construct = self.check(construct)?;
        match construct {
            ConstructRef::TopicMap(_) => self.clear(),
            ConstructRef::Topic(topic) => self.remove_topic(topic),
            ConstructRef::Association(association) => {
                let roles: Vec<_> = self.association_data(association)?.roles.iter().copied().collect();
                for role in roles {
                    self.store.detach(role.into());
                }
                self.store.detach(construct);
                Ok(())
            }
            ConstructRef::Name(name) => {
                let variants: Vec<_> = self.name_data(name)?.variants.iter().copied().collect();
                for variant in variants {
                    self.store.detach(variant.into());
                }
                self.store.detach(construct);
                Ok(())
            }
            ConstructRef::Role(_) | ConstructRef::Occurrence(_) | ConstructRef::Variant(_) => {
                self.store.detach(construct);
                Ok(())
            }
        }
    }
    /// Removes a topic unless it is still a player, type, theme or reifier.
    pub fn remove_topic(&mut self, topic: TopicId) -> Result<()> {
        self.check(topic)?;
        if self.is_in_use(topic)? {
            return Err(TopicMapError::TopicInUse { topic });
        }
        debug!(topic = %topic, "removing topic");
        let data = self.topic_data(topic)?;
        let names: Vec<_> = data.names.iter().copied().collect();
        let occurrences: Vec<_> = data.occurrences.iter().copied().collect();
        let roles: Vec<_> = data.roles_played.iter().copied().collect();
        // only type-instance associations can be left here, see `is_in_use`
        for role in roles {
            if let Ok(association) = self.role_data(role).map(|r| r.parent) {
                self.remove(association)?;
            }
        }
        for name in names {
            self.remove(name)?;
        }
        for occurrence in occurrences {
            self.remove(occurrence)?;
        }
        self.store.detach(topic.into());
        Ok(())
    }
    /// True when the topic is referenced as a player, type, theme or reifier.
    pub fn is_in_use(&self, topic: TopicId) -> Result<bool> {
        let data = self.topic_data(topic)?;
        let playing = data
            .roles_played
            .iter()
            .any(|role| !self.is_own_type_instance_role(topic, *role));
        let typing = !self.store.typed_by(topic).is_empty();
        let theming = !self.store.themed_by(topic).is_empty();
        let reifying = self.store.reified_by(topic).is_some();
        let classifying = self
            .store
            .instances_of(topic)
            .into_iter()
            .any(|instance| instance != topic);
        Ok(playing || typing || theming || reifying || classifying)
    }
    // Roles in materialized type-instance associations where the topic is the instance.
    fn is_own_type_instance_role(&self, topic: TopicId, role: RoleId) -> bool {
        if !self.features().type_instance_associations {
            return false;
        }
        self.store
            .role(role)
            .and_then(|r| self.type_instance_pair(r.parent))
            .is_some_and(|(_, type_, instance)| instance == topic && type_ != topic)
    }
}
