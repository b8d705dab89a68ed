use std::fmt;
use std::hash::{Hash, Hasher};

use ahash::AHashMap;
use compact_str::CompactString;

use crate::normalize::normalize_space;
use crate::taxonomy::{Concept, Taxonomy};

// ============================================================================
// Qualified names
// ============================================================================

/// A namespace-qualified name.
///
/// Equality and hashing use `(uri, local)` only; the prefix is whatever the
/// source document happened to use and never takes part in matching.
#[derive(Debug, Clone, Default)]
pub struct QName {
    prefix: CompactString,
    local: CompactString,
    uri: CompactString,
}

impl QName {
    pub fn new(
        prefix: impl Into<CompactString>,
        local: impl Into<CompactString>,
        uri: impl Into<CompactString>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            local: local.into(),
            uri: uri.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[inline]
    pub fn matches(&self, uri: &str, local: &str) -> bool {
        self.uri == uri && self.local == local
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.uri, &other.local)
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
        self.local.hash(state);
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.uri.is_empty() {
            write!(f, "{{{}}}{}", self.uri, self.local)
        } else if !self.prefix.is_empty() {
            write!(f, "{}:{}", self.prefix, self.local)
        } else {
            f.write_str(&self.local)
        }
    }
}

// ============================================================================
// Instance structures
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRef {
    pub(crate) href: CompactString,
}

impl SchemaRef {
    pub fn new(href: impl Into<CompactString>) -> Self {
        Self { href: href.into() }
    }

    pub fn href(&self) -> &str {
        &self.href
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identifier {
    pub scheme: CompactString,
    pub value: CompactString,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entity {
    pub identifier: Identifier,
}

/// The reporting period of a context. Exactly one form holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    Instant(CompactString),
    Duration {
        start: CompactString,
        end: CompactString,
    },
    Forever,
}

impl Period {
    pub fn instant(&self) -> Option<&str> {
        match self {
            Period::Instant(date) => Some(date.as_str()),
            _ => None,
        }
    }

    pub fn start_date(&self) -> Option<&str> {
        match self {
            Period::Duration { start, .. } => Some(start.as_str()),
            _ => None,
        }
    }

    pub fn end_date(&self) -> Option<&str> {
        match self {
            Period::Duration { end, .. } => Some(end.as_str()),
            _ => None,
        }
    }

    pub fn is_instant(&self) -> bool {
        matches!(self, Period::Instant(_))
    }

    pub fn is_duration(&self) -> bool {
        matches!(self, Period::Duration { .. })
    }

    pub fn is_forever(&self) -> bool {
        matches!(self, Period::Forever)
    }
}

/// A dimensional qualifier from a context's segment or scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dimension {
    Explicit { dimension: QName, member: QName },
    /// `value` is the member's raw inner XML, trimmed.
    Typed { dimension: QName, value: String },
}

impl Dimension {
    pub fn dimension(&self) -> &QName {
        match self {
            Dimension::Explicit { dimension, .. } | Dimension::Typed { dimension, .. } => dimension,
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, Dimension::Explicit { .. })
    }

    pub fn member(&self) -> Option<&QName> {
        match self {
            Dimension::Explicit { member, .. } => Some(member),
            Dimension::Typed { .. } => None,
        }
    }

    pub fn typed_value(&self) -> Option<&str> {
        match self {
            Dimension::Typed { value, .. } => Some(value.as_str()),
            Dimension::Explicit { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub id: CompactString,
    pub entity: Entity,
    pub period: Period,
    /// Segment dimensions followed by scenario dimensions, in document order.
    pub(crate) dimensions: Vec<Dimension>,
}

impl Context {
    pub fn new(id: impl Into<CompactString>, entity: Entity, period: Period) -> Self {
        Self {
            id: id.into(),
            entity,
            period,
            dimensions: Vec::new(),
        }
    }

    pub fn with_dimensions(mut self, dimensions: Vec<Dimension>) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// First dimension whose axis matches `dim` by URI and local name.
    pub fn dimension_by_qname(&self, dim: &QName) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.dimension() == dim)
    }

    /// True if an explicit dimension on this context carries `member` on axis `dim`.
    pub fn has_explicit_member(&self, dim: &QName, member: &QName) -> bool {
        self.dimensions.iter().any(|d| match d {
            Dimension::Explicit {
                dimension,
                member: m,
            } => dimension == dim && m == member,
            Dimension::Typed { .. } => false,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitType {
    Simple(Vec<QName>),
    Divide {
        numerator: Vec<QName>,
        denominator: Vec<QName>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub id: CompactString,
    pub unit_type: UnitType,
}

impl Unit {
    pub fn simple(id: impl Into<CompactString>, measures: Vec<QName>) -> Self {
        Self {
            id: id.into(),
            unit_type: UnitType::Simple(measures),
        }
    }

    pub fn divide(
        id: impl Into<CompactString>,
        numerator: Vec<QName>,
        denominator: Vec<QName>,
    ) -> Self {
        Self {
            id: id.into(),
            unit_type: UnitType::Divide {
                numerator,
                denominator,
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Measures of a simple unit; empty for a divide unit.
    pub fn measures(&self) -> &[QName] {
        match &self.unit_type {
            UnitType::Simple(measures) => measures.as_slice(),
            UnitType::Divide { .. } => &[],
        }
    }

    pub fn is_divide(&self) -> bool {
        matches!(self.unit_type, UnitType::Divide { .. })
    }

    pub fn numerator_measures(&self) -> &[QName] {
        match &self.unit_type {
            UnitType::Divide { numerator, .. } => numerator.as_slice(),
            UnitType::Simple(_) => &[],
        }
    }

    pub fn denominator_measures(&self) -> &[QName] {
        match &self.unit_type {
            UnitType::Divide { denominator, .. } => denominator.as_slice(),
            UnitType::Simple(_) => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FactKind {
    #[default]
    Item,
}

/// A reported item. Context and unit are referenced by id, not owned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fact {
    pub kind: FactKind,
    pub name: QName,
    /// Element text with leading and trailing whitespace removed.
    pub value: String,
    pub context_ref: CompactString,
    pub unit_ref: CompactString,
    pub decimals: CompactString,
    pub precision: CompactString,
    pub id: CompactString,
    pub lang: CompactString,
    pub nil: bool,
}

impl Fact {
    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Display form of the value; see [`normalize_space`].
    pub fn normalized_value(&self) -> String {
        normalize_space(&self.value)
    }

    pub fn context_ref(&self) -> &str {
        &self.context_ref
    }

    pub fn unit_ref(&self) -> &str {
        &self.unit_ref
    }

    pub fn decimals(&self) -> &str {
        &self.decimals
    }

    pub fn precision(&self) -> &str {
        &self.precision
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn is_nil(&self) -> bool {
        self.nil
    }
}

// ============================================================================
// Document
// ============================================================================

/// A parsed instance document.
///
/// Everything is read through shared borrows; the only mutation after parsing
/// is attaching or merging a taxonomy, which needs `&mut self`.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub(crate) schema_refs: Vec<SchemaRef>,
    pub(crate) contexts: AHashMap<CompactString, Context>,
    pub(crate) units: AHashMap<CompactString, Unit>,
    pub(crate) facts: Vec<Fact>,
    pub(crate) taxonomy: Option<Taxonomy>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a document from already-built parts; later duplicates of a
    /// context or unit id replace earlier ones.
    pub fn from_parts(
        schema_refs: Vec<SchemaRef>,
        contexts: Vec<Context>,
        units: Vec<Unit>,
        facts: Vec<Fact>,
    ) -> Self {
        Self {
            schema_refs,
            contexts: contexts.into_iter().map(|c| (c.id.clone(), c)).collect(),
            units: units.into_iter().map(|u| (u.id.clone(), u)).collect(),
            facts,
            taxonomy: None,
        }
    }

    pub fn schema_refs(&self) -> &[SchemaRef] {
        &self.schema_refs
    }

    pub fn contexts(&self) -> &AHashMap<CompactString, Context> {
        &self.contexts
    }

    pub fn units(&self) -> &AHashMap<CompactString, Unit> {
        &self.units
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn context_by_id(&self, id: &str) -> Option<&Context> {
        self.contexts.get(id)
    }

    pub fn unit_by_id(&self, id: &str) -> Option<&Unit> {
        self.units.get(id)
    }

    pub fn context_of(&self, fact: &Fact) -> Option<&Context> {
        self.context_by_id(fact.context_ref())
    }

    pub fn unit_of(&self, fact: &Fact) -> Option<&Unit> {
        self.unit_by_id(fact.unit_ref())
    }

    pub fn taxonomy(&self) -> Option<&Taxonomy> {
        self.taxonomy.as_ref()
    }

    /// Replace the attached taxonomy (or detach it with `None`).
    pub fn set_taxonomy(&mut self, taxonomy: impl Into<Option<Taxonomy>>) {
        self.taxonomy = taxonomy.into();
    }

    /// Merge `other` into the attached taxonomy, attaching an empty one first
    /// if none is present.
    pub fn merge_taxonomy(&mut self, other: Taxonomy) {
        self.taxonomy.get_or_insert_with(Taxonomy::new).merge(other);
    }

    /// Concept declared for the fact's name in the attached taxonomy.
    pub fn concept_of(&self, fact: &Fact) -> Option<&Concept> {
        self.taxonomy.as_ref()?.concept(fact.name())
    }
}
