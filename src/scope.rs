//! Scopes and variants.
//!
//! A variant only stores the themes it declares; its scope is always read as
//! the union of those themes and the current scope of its parent name, so a
//! theme removed from the name disappears from the variant unless the variant
//! declares it too.

use std::collections::BTreeSet;

use crate::construct::{
    Construct, ConstructRef, LocatorSet, NameId, Scoped, Themes, TopicId, VariantData, VariantId,
};
use crate::datatype::{Literal, XSD_STRING_LOCATOR};
use crate::error::{Result, TopicMapError};
use crate::locator::Locator;
use crate::topicmap::TopicMap;

impl TopicMap {
    /// The scope of a statement; for variants the effective scope.
    ///
    /// A variant's scope is re-derived from its name on every read. Adding a
    /// theme to the name, or merging a variant's own theme into one of the
    /// name's themes, can therefore make it equal to the name's scope.
    pub fn scope(&self, scoped: impl Scoped) -> Result<Themes> {
        let construct = self.check(scoped)?;
        match self.store.get(construct) {
            Some(Construct::Variant(data)) => {
                let parent = self.name_data(data.parent)?;
                Ok(data.own_themes.union(&parent.scope).copied().collect())
            }
            Some(other) => other
                .themes()
                .cloned()
                .ok_or_else(|| TopicMapError::model(construct, "the construct is not scoped")),
            None => Err(self.missing(construct)),
        }
    }
    /// The themes a variant declares itself, without those of its name.
    pub fn own_themes(&self, variant: VariantId) -> Result<&Themes> {
        Ok(&self.variant_data(variant)?.own_themes)
    }
    pub fn add_theme(&mut self, scoped: impl Scoped, theme: TopicId) -> Result<()> {
        let construct = self.check(scoped)?;
        if !construct.is_scoped() {
            return Err(TopicMapError::model(construct, "the construct is not scoped"));
        }
        self.check_reference(construct, theme)?;
        self.store.add_theme(construct, theme);
        Ok(())
    }
    pub fn remove_theme(&mut self, scoped: impl Scoped, theme: TopicId) -> Result<()> {
        let construct = self.check(scoped)?;
        if !construct.is_scoped() {
            return Err(TopicMapError::model(construct, "the construct is not scoped"));
        }
        if let Some(variant) = construct.as_variant() {
            let data = self.variant_data(variant)?;
            if data.own_themes.contains(&theme) {
                let mut remaining = data.own_themes.clone();
                remaining.remove(&theme);
                if remaining.is_subset(&self.name_data(data.parent)?.scope) {
                    return Err(TopicMapError::model(
                        construct,
                        "the variant scope must stay a true superset of the name scope",
                    ));
                }
            }
        }
        self.store.remove_theme(construct, theme);
        Ok(())
    }

    // ------------- Variants -------------
    pub fn variants(&self, name: NameId) -> Result<&BTreeSet<VariantId>> {
        Ok(&self.name_data(name)?.variants)
    }
    pub fn create_variant(&mut self, name: NameId, value: &str, themes: &[TopicId]) -> Result<VariantId> {
        self.create_variant_with_datatype(name, value, &XSD_STRING_LOCATOR, themes)
    }
    pub fn create_variant_literal<V: Literal>(
        &mut self,
        name: NameId,
        value: &V,
        themes: &[TopicId],
    ) -> Result<VariantId> {
        self.create_variant_with_datatype(name, &value.lexical(), &value.datatype(), themes)
    }
    /// Creates a variant whose scope, joined with the name's, is a true superset of the name's scope.
    pub fn create_variant_with_datatype(
        &mut self,
        name: NameId,
        value: &str,
        datatype: &Locator,
        themes: &[TopicId],
    ) -> Result<VariantId> {
        self.check(name)?;
        if themes.is_empty() {
            return Err(TopicMapError::model(name, "a variant needs at least one theme"));
        }
        let own_themes = self.check_themes(name.into(), themes)?;
        if own_themes.is_subset(&self.name_data(name)?.scope) {
            return Err(TopicMapError::model(
                name,
                "the variant scope must be a true superset of the name scope",
            ));
        }
        let variant = self.store.insert(Construct::Variant(VariantData {
            item_identifiers: LocatorSet::default(),
            parent: name,
            own_themes,
            value: value.to_string(),
            datatype: datatype.clone(),
        }));
        variant
            .as_variant()
            .ok_or_else(|| TopicMapError::model(name, "failed to create a variant"))
    }
    pub(crate) fn effective_scope(&self, construct: ConstructRef) -> Option<Themes> {
        match self.store.get(construct)? {
            Construct::Variant(data) => {
                let parent = self.store.name(data.parent)?;
                Some(data.own_themes.union(&parent.scope).copied().collect())
            }
            other => other.themes().cloned(),
        }
    }
}
