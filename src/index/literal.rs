use crate::construct::{Construct, MapId, NameId, OccurrenceId, VariantId};
use crate::datatype::{XSD_ANY_URI_LOCATOR, XSD_STRING_LOCATOR};
use crate::error::Result;
use crate::index::{Index, Postings, Snapshot};
use crate::locator::Locator;
use crate::topicmap::TopicMap;

/// Occurrences and variants by exact value and datatype, names by value.
#[derive(Debug, Clone)]
pub struct LiteralIndex {
    snapshot: Snapshot,
    occurrences: Postings<(String, Locator)>,
    variants: Postings<(String, Locator)>,
    names: Postings<String>,
}

impl LiteralIndex {
    pub fn new(map: MapId) -> Self {
        Self {
            snapshot: Snapshot::new(map),
            occurrences: Postings::new(),
            variants: Postings::new(),
            names: Postings::new(),
        }
    }

    /// Occurrences holding this string, as xsd:string.
    pub fn occurrences(&self, value: &str) -> Result<Vec<OccurrenceId>> {
        self.occurrences_with_datatype(value, &XSD_STRING_LOCATOR)
    }
    /// Occurrences holding this IRI, as xsd:anyURI.
    pub fn occurrences_by_locator(&self, value: &Locator) -> Result<Vec<OccurrenceId>> {
        self.occurrences_with_datatype(value.reference(), &XSD_ANY_URI_LOCATOR)
    }
    pub fn occurrences_with_datatype(&self, value: &str, datatype: &Locator) -> Result<Vec<OccurrenceId>> {
        self.snapshot.ensure_open()?;
        let key = (value.to_string(), datatype.clone());
        Ok(self.snapshot.handles(self.occurrences.get(&key), OccurrenceId))
    }
    pub fn variants(&self, value: &str) -> Result<Vec<VariantId>> {
        self.variants_with_datatype(value, &XSD_STRING_LOCATOR)
    }
    pub fn variants_by_locator(&self, value: &Locator) -> Result<Vec<VariantId>> {
        self.variants_with_datatype(value.reference(), &XSD_ANY_URI_LOCATOR)
    }
    pub fn variants_with_datatype(&self, value: &str, datatype: &Locator) -> Result<Vec<VariantId>> {
        self.snapshot.ensure_open()?;
        let key = (value.to_string(), datatype.clone());
        Ok(self.snapshot.handles(self.variants.get(&key), VariantId))
    }
    pub fn names(&self, value: &str) -> Result<Vec<NameId>> {
        self.snapshot.ensure_open()?;
        Ok(self.snapshot.handles(self.names.get(&value.to_string()), NameId))
    }
}

impl Index for LiteralIndex {
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
        self.occurrences.clear();
        self.variants.clear();
        self.names.clear();
        for (construct, data) in map.store.constructs() {
            let seq = construct.id().seq();
            match data {
                Construct::Occurrence(occurrence) => self
                    .occurrences
                    .insert((occurrence.value.clone(), occurrence.datatype.clone()), seq),
                Construct::Variant(variant) => self
                    .variants
                    .insert((variant.value.clone(), variant.datatype.clone()), seq),
                Construct::Name(name) => self.names.insert(name.value.clone(), seq),
                _ => (),
            }
        }
        Ok(())
    }
}
