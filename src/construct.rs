// other keepers use HashSet or HashMap
use core::hash::{BuildHasher, BuildHasherDefault};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use seahash::SeaHasher;

// used to print out readable forms of a construct
use std::fmt;

use crate::locator::Locator;

pub type IdHasher = BuildHasherDefault<SeaHasher>;
pub type OtherHasher = BuildHasherDefault<SeaHasher>;

/// Item identifiers, subject identifiers and subject locators.
pub type LocatorSet = HashSet<Locator, OtherHasher>;
/// A scope: the set of themes qualifying a statement.
pub type Themes = BTreeSet<TopicId>;

// the topic map itself is construct zero within its own map
pub const GENESIS: u64 = 0;

// ------------- Identities -------------
/// Identity of a topic map, unique within the process.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct MapId(u64);

impl MapId {
    pub(crate) fn generate() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
    pub fn value(self) -> u64 {
        self.0
    }
}

/// A store-assigned identifier, never reused within its topic map.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ConstructId {
    map: MapId,
    seq: u64,
}

impl ConstructId {
    pub(crate) fn new(map: MapId, seq: u64) -> Self {
        Self { map, seq }
    }
    pub fn map(self) -> MapId {
        self.map
    }
    pub fn seq(self) -> u64 {
        self.seq
    }
}
impl fmt::Display for ConstructId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.map.0, self.seq)
    }
}

#[derive(Debug, Clone)]
pub struct IdGenerator {
    lower_bound: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            lower_bound: GENESIS,
        }
    }
    pub fn generate(&mut self) -> u64 {
        self.lower_bound += 1;
        self.lower_bound
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// ------------- Handles -------------
macro_rules! handle {
    ($(#[$doc:meta])* $name:ident, $variant:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        pub struct $name(pub(crate) ConstructId);

        impl $name {
            pub fn id(self) -> ConstructId {
                self.0
            }
            pub(crate) fn seq(self) -> u64 {
                self.0.seq
            }
        }
        impl From<$name> for ConstructRef {
            fn from(handle: $name) -> Self {
                ConstructRef::$variant(handle)
            }
        }
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{} {}", stringify!($variant), self.0)
            }
        }
    };
}

handle!(
    /// A topic: the proxy for a subject.
    TopicId, Topic
);
handle!(AssociationId, Association);
handle!(
    /// A role within exactly one association.
    RoleId, Role
);
handle!(OccurrenceId, Occurrence);
handle!(NameId, Name);
handle!(
    /// A variant of exactly one name.
    VariantId, Variant
);

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum ConstructKind {
    TopicMap,
    Topic,
    Association,
    Role,
    Occurrence,
    Name,
    Variant,
}
impl fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::TopicMap => "topic map",
            Self::Topic => "topic",
            Self::Association => "association",
            Self::Role => "role",
            Self::Occurrence => "occurrence",
            Self::Name => "name",
            Self::Variant => "variant",
        };
        write!(f, "{}", name)
    }
}

/// Any construct, tagged by its kind.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum ConstructRef {
    TopicMap(MapId),
    Topic(TopicId),
    Association(AssociationId),
    Role(RoleId),
    Occurrence(OccurrenceId),
    Name(NameId),
    Variant(VariantId),
}

impl ConstructRef {
    pub fn id(self) -> ConstructId {
        match self {
            Self::TopicMap(map) => ConstructId::new(map, GENESIS),
            Self::Topic(h) => h.0,
            Self::Association(h) => h.0,
            Self::Role(h) => h.0,
            Self::Occurrence(h) => h.0,
            Self::Name(h) => h.0,
            Self::Variant(h) => h.0,
        }
    }
    pub fn kind(self) -> ConstructKind {
        match self {
            Self::TopicMap(_) => ConstructKind::TopicMap,
            Self::Topic(_) => ConstructKind::Topic,
            Self::Association(_) => ConstructKind::Association,
            Self::Role(_) => ConstructKind::Role,
            Self::Occurrence(_) => ConstructKind::Occurrence,
            Self::Name(_) => ConstructKind::Name,
            Self::Variant(_) => ConstructKind::Variant,
        }
    }
    pub fn map(self) -> MapId {
        self.id().map
    }
    pub fn as_topic(self) -> Option<TopicId> {
        match self {
            Self::Topic(topic) => Some(topic),
            _ => None,
        }
    }
    pub fn as_association(self) -> Option<AssociationId> {
        match self {
            Self::Association(association) => Some(association),
            _ => None,
        }
    }
    pub fn as_role(self) -> Option<RoleId> {
        match self {
            Self::Role(role) => Some(role),
            _ => None,
        }
    }
    pub fn as_occurrence(self) -> Option<OccurrenceId> {
        match self {
            Self::Occurrence(occurrence) => Some(occurrence),
            _ => None,
        }
    }
    pub fn as_name(self) -> Option<NameId> {
        match self {
            Self::Name(name) => Some(name),
            _ => None,
        }
    }
    pub fn as_variant(self) -> Option<VariantId> {
        match self {
            Self::Variant(variant) => Some(variant),
            _ => None,
        }
    }
    pub(crate) fn is_typed(self) -> bool {
        matches!(self, Self::Association(_) | Self::Role(_) | Self::Occurrence(_) | Self::Name(_))
    }
    pub(crate) fn is_scoped(self) -> bool {
        matches!(self, Self::Association(_) | Self::Occurrence(_) | Self::Name(_) | Self::Variant(_))
    }
    pub(crate) fn is_reifiable(self) -> bool {
        !matches!(self, Self::Topic(_))
    }
}
impl From<MapId> for ConstructRef {
    fn from(map: MapId) -> Self {
        ConstructRef::TopicMap(map)
    }
}
impl fmt::Display for ConstructRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

// ------------- Capabilities -------------
// A `ConstructRef` carries every capability and is checked at runtime instead.

/// Constructs carrying a single type topic.
pub trait Typed: Copy + Into<ConstructRef> {}
/// Constructs qualified by a scope.
pub trait Scoped: Copy + Into<ConstructRef> {}
/// Every construct except topics may be reified.
pub trait Reifiable: Copy + Into<ConstructRef> {}
/// Constructs holding a value together with its datatype.
pub trait DatatypeAware: Scoped {}

impl Typed for AssociationId {}
impl Typed for RoleId {}
impl Typed for OccurrenceId {}
impl Typed for NameId {}
impl Typed for ConstructRef {}

impl Scoped for AssociationId {}
impl Scoped for OccurrenceId {}
impl Scoped for NameId {}
impl Scoped for VariantId {}
impl Scoped for ConstructRef {}

impl Reifiable for MapId {}
impl Reifiable for AssociationId {}
impl Reifiable for RoleId {}
impl Reifiable for OccurrenceId {}
impl Reifiable for NameId {}
impl Reifiable for VariantId {}
impl Reifiable for ConstructRef {}

impl DatatypeAware for OccurrenceId {}
impl DatatypeAware for VariantId {}
impl DatatypeAware for ConstructRef {}

// ------------- Constructs -------------
#[derive(Debug, Clone, Default)]
pub(crate) struct TopicData {
    pub item_identifiers: LocatorSet,
    pub subject_identifiers: LocatorSet,
    pub subject_locators: LocatorSet,
    pub types: BTreeSet<TopicId>,
    pub roles_played: BTreeSet<RoleId>,
    pub names: BTreeSet<NameId>,
    pub occurrences: BTreeSet<OccurrenceId>,
}

#[derive(Debug, Clone)]
pub(crate) struct AssociationData {
    pub item_identifiers: LocatorSet,
    pub type_: TopicId,
    pub scope: Themes,
    pub roles: BTreeSet<RoleId>,
}

#[derive(Debug, Clone)]
pub(crate) struct RoleData {
    pub item_identifiers: LocatorSet,
    pub parent: AssociationId,
    pub type_: TopicId,
    pub player: TopicId,
}

#[derive(Debug, Clone)]
pub(crate) struct OccurrenceData {
    pub item_identifiers: LocatorSet,
    pub parent: TopicId,
    pub type_: TopicId,
    pub scope: Themes,
    pub value: String,
    pub datatype: Locator,
}

#[derive(Debug, Clone)]
pub(crate) struct NameData {
    pub item_identifiers: LocatorSet,
    pub parent: TopicId,
    pub type_: TopicId,
    pub scope: Themes,
    pub value: String,
    pub variants: BTreeSet<VariantId>,
}

#[derive(Debug, Clone)]
pub(crate) struct VariantData {
    pub item_identifiers: LocatorSet,
    pub parent: NameId,
    // only the themes the variant declares itself, see `scope`
    pub own_themes: Themes,
    pub value: String,
    pub datatype: Locator,
}

#[derive(Debug, Clone)]
pub(crate) enum Construct {
    Topic(TopicData),
    Association(AssociationData),
    Role(RoleData),
    Occurrence(OccurrenceData),
    Name(NameData),
    Variant(VariantData),
}

impl Construct {
    pub fn item_identifiers(&self) -> &LocatorSet {
        match self {
            Self::Topic(c) => &c.item_identifiers,
            Self::Association(c) => &c.item_identifiers,
            Self::Role(c) => &c.item_identifiers,
            Self::Occurrence(c) => &c.item_identifiers,
            Self::Name(c) => &c.item_identifiers,
            Self::Variant(c) => &c.item_identifiers,
        }
    }
    pub fn item_identifiers_mut(&mut self) -> &mut LocatorSet {
        match self {
            Self::Topic(c) => &mut c.item_identifiers,
            Self::Association(c) => &mut c.item_identifiers,
            Self::Role(c) => &mut c.item_identifiers,
            Self::Occurrence(c) => &mut c.item_identifiers,
            Self::Name(c) => &mut c.item_identifiers,
            Self::Variant(c) => &mut c.item_identifiers,
        }
    }
    pub fn type_(&self) -> Option<TopicId> {
        match self {
            Self::Association(c) => Some(c.type_),
            Self::Role(c) => Some(c.type_),
            Self::Occurrence(c) => Some(c.type_),
            Self::Name(c) => Some(c.type_),
            _ => None,
        }
    }
    pub fn type_mut(&mut self) -> Option<&mut TopicId> {
        match self {
            Self::Association(c) => Some(&mut c.type_),
            Self::Role(c) => Some(&mut c.type_),
            Self::Occurrence(c) => Some(&mut c.type_),
            Self::Name(c) => Some(&mut c.type_),
            _ => None,
        }
    }
    // For variants these are the declared themes only.
    pub fn themes(&self) -> Option<&Themes> {
        match self {
            Self::Association(c) => Some(&c.scope),
            Self::Occurrence(c) => Some(&c.scope),
            Self::Name(c) => Some(&c.scope),
            Self::Variant(c) => Some(&c.own_themes),
            _ => None,
        }
    }
    pub fn themes_mut(&mut self) -> Option<&mut Themes> {
        match self {
            Self::Association(c) => Some(&mut c.scope),
            Self::Occurrence(c) => Some(&mut c.scope),
            Self::Name(c) => Some(&mut c.scope),
            Self::Variant(c) => Some(&mut c.own_themes),
            _ => None,
        }
    }
}

// ------------- Lookups -------------
#[derive(Debug, Clone)]
pub struct Lookup<K, V, H = IdHasher> {
    index: HashMap<K, BTreeSet<V>, H>,
}
impl<K: Eq + Hash, V: Ord, H: BuildHasher + Default> Lookup<K, V, H> {
    pub fn new() -> Self {
        Self {
            index: HashMap::<K, BTreeSet<V>, H>::default(),
        }
    }
    pub fn insert(&mut self, key: K, value: V) {
        let set = self.index.entry(key).or_default();
        set.insert(value);
    }
    pub fn remove(&mut self, key: &K, value: &V) {
        if let Some(set) = self.index.get_mut(key) {
            set.remove(value);
            if set.is_empty() {
                self.index.remove(key);
            }
        }
    }
    pub fn lookup(&self, key: &K) -> Option<&BTreeSet<V>> {
        self.index.get(key)
    }
    pub fn clear(&mut self) {
        self.index.clear();
    }
}
impl<K: Eq + Hash, V: Ord, H: BuildHasher + Default> Default for Lookup<K, V, H> {
    fn default() -> Self {
        Self::new()
    }
}
