use roaring::RoaringTreemap;

use crate::construct::{
    AssociationId, Construct, MapId, NameId, OccurrenceId, Themes, TopicId, VariantId,
};
use crate::error::Result;
use crate::index::{Index, Postings, Snapshot};
use crate::topicmap::TopicMap;

// statements of one kind by theme, plus those in the unconstrained scope
#[derive(Debug, Clone, Default)]
struct ScopeMembers {
    by_theme: Postings,
    unscoped: RoaringTreemap,
}

impl ScopeMembers {
    fn insert(&mut self, seq: u64, scope: &Themes) {
        if scope.is_empty() {
            self.unscoped.insert(seq);
        }
        for theme in scope {
            self.by_theme.insert(theme.seq(), seq);
        }
    }
    fn members(&self, theme: Option<TopicId>) -> Option<&RoaringTreemap> {
        match theme {
            Some(theme) => self.by_theme.get(&theme.seq()),
            None => Some(&self.unscoped),
        }
    }
    fn by_themes(&self, themes: &[TopicId], match_all: bool) -> RoaringTreemap {
        let keys: Vec<u64> = themes.iter().map(|t| t.seq()).collect();
        if match_all {
            self.by_theme.intersection(&keys)
        } else {
            self.by_theme.union(&keys)
        }
    }
    fn clear(&mut self) {
        self.by_theme.clear();
        self.unscoped.clear();
    }
}

/// Statements by the themes of their scope. Variants are indexed by their
/// effective scope, which is never empty.
#[derive(Debug, Clone)]
pub struct ScopedIndex {
    snapshot: Snapshot,
    associations: ScopeMembers,
    occurrences: ScopeMembers,
    names: ScopeMembers,
    variants: ScopeMembers,
}

macro_rules! scoped_queries {
    ($field:ident, $handle:ident, $by_themes:ident, $themes:ident) => {
        /// Members scoped by `theme`, or with `None` those in the unconstrained scope.
        pub fn $field(&self, theme: Option<TopicId>) -> Result<Vec<$handle>> {
            self.snapshot.ensure_open()?;
            Ok(self.snapshot.handles(self.$field.members(theme), $handle))
        }
        /// Members scoped by all of `themes` when `match_all`, else by any of them.
        pub fn $by_themes(&self, themes: &[TopicId], match_all: bool) -> Result<Vec<$handle>> {
            self.snapshot.ensure_open()?;
            let members = self.$field.by_themes(themes, match_all);
            Ok(self.snapshot.handles(Some(&members), $handle))
        }
        pub fn $themes(&self) -> Result<Vec<TopicId>> {
            self.snapshot.ensure_open()?;
            Ok(self.snapshot.topics(self.$field.by_theme.keys()))
        }
    };
}

impl ScopedIndex {
    pub fn new(map: MapId) -> Self {
        Self {
            snapshot: Snapshot::new(map),
            associations: ScopeMembers::default(),
            occurrences: ScopeMembers::default(),
            names: ScopeMembers::default(),
            variants: ScopeMembers::default(),
        }
    }

    scoped_queries!(associations, AssociationId, associations_by_themes, association_themes);
    scoped_queries!(occurrences, OccurrenceId, occurrences_by_themes, occurrence_themes);
    scoped_queries!(names, NameId, names_by_themes, name_themes);
    scoped_queries!(variants, VariantId, variants_by_themes, variant_themes);
}

impl Index for ScopedIndex {
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
        self.associations.clear();
        self.occurrences.clear();
        self.names.clear();
        self.variants.clear();
        for (construct, data) in map.store.constructs() {
            let seq = construct.id().seq();
            match data {
                Construct::Association(association) => self.associations.insert(seq, &association.scope),
                Construct::Occurrence(occurrence) => self.occurrences.insert(seq, &occurrence.scope),
                Construct::Name(name) => self.names.insert(seq, &name.scope),
                Construct::Variant(_) => {
                    if let Some(scope) = map.effective_scope(construct) {
                        self.variants.insert(seq, &scope);
                    }
                }
                Construct::Topic(_) | Construct::Role(_) => (),
            }
        }
        Ok(())
    }
}

