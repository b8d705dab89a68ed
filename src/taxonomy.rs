// Concept registry built from taxonomy schemas
use crate::model::{Document, QName};
use crate::schema::parse_taxonomy;
use crate::value::{classify, ValueKind};
use crate::{Error, Result, NS_XBRLI};
use ahash::AHashMap;
use compact_str::CompactString;
use std::io::{self, BufReader, Read};
use tracing::debug;

/// A reportable concept declared by an `xs:element` in a taxonomy schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Concept {
    pub qname: QName,
    pub id: CompactString,
    pub substitution_group: QName,
    pub type_name: QName,
    pub is_abstract: bool,
    pub nillable: bool,
    /// `instant`, `duration`, `forever` or empty.
    pub period_type: CompactString,
    /// `debit`, `credit` or empty.
    pub balance: CompactString,
}

impl Concept {
    pub fn qname(&self) -> &QName {
        &self.qname
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn substitution_group(&self) -> &QName {
        &self.substitution_group
    }

    pub fn type_name(&self) -> &QName {
        &self.type_name
    }

    pub fn period_type(&self) -> &str {
        &self.period_type
    }

    pub fn balance(&self) -> &str {
        &self.balance
    }

    pub fn is_item(&self) -> bool {
        self.substitution_group.matches(NS_XBRLI, "item")
    }

    pub fn is_tuple(&self) -> bool {
        self.substitution_group.matches(NS_XBRLI, "tuple")
    }

    pub fn value_kind(&self) -> ValueKind {
        classify(&self.type_name)
    }
}

/// Concepts keyed by qualified name (URI and local name).
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    concepts: AHashMap<QName, Concept>,
}

impl Taxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn concepts(&self) -> &AHashMap<QName, Concept> {
        &self.concepts
    }

    pub fn concept(&self, name: &QName) -> Option<&Concept> {
        self.concepts.get(name)
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Insert or replace by qualified name.
    pub(crate) fn insert(&mut self, concept: Concept) {
        self.concepts.insert(concept.qname.clone(), concept);
    }

    /// Absorb every concept of `other`; colliding names take `other`'s concept.
    pub fn merge(&mut self, other: Taxonomy) {
        self.concepts.extend(other.concepts);
    }
}

impl FromIterator<Concept> for Taxonomy {
    fn from_iter<I: IntoIterator<Item = Concept>>(iter: I) -> Self {
        let mut taxonomy = Taxonomy::new();
        for concept in iter {
            taxonomy.insert(concept);
        }
        taxonomy
    }
}

/// Merge that tolerates a missing target or source; either being `None` is a no-op.
pub fn merge_into(target: Option<&mut Taxonomy>, source: Option<Taxonomy>) {
    if let (Some(target), Some(source)) = (target, source) {
        target.merge(source);
    }
}

fn load_schema_ref<F, R>(opener: &F, href: &str) -> Result<Taxonomy>
where
    F: Fn(&str) -> io::Result<R>,
    R: Read,
{
    let stream = opener(href).map_err(|source| Error::OpenSchemaRef {
        href: href.to_owned(),
        source,
    })?;
    parse_taxonomy(BufReader::new(stream)).map_err(|source| Error::ParseSchemaRef {
        href: href.to_owned(),
        source: Box::new(source),
    })
}

impl Document {
    /// Build a taxonomy from this document's schemaRefs, in order, and attach
    /// it in place of any taxonomy already attached.
    ///
    /// Empty hrefs are skipped without calling `opener`. The first failure
    /// aborts the load and leaves the document unchanged.
    pub fn load_taxonomy_from_schema_refs<F, R>(&mut self, opener: F) -> Result<&Taxonomy>
    where
        F: Fn(&str) -> io::Result<R>,
        R: Read,
    {
        let mut taxonomy = Taxonomy::new();
        for schema_ref in self.schema_refs.iter().filter(|s| !s.href().is_empty()) {
            taxonomy.merge(load_schema_ref(&opener, schema_ref.href())?);
        }
        debug!(concepts = taxonomy.len(), "loaded taxonomy from schemaRefs");
        Ok(self.taxonomy.insert(taxonomy))
    }

    /// Like [`load_taxonomy_from_schema_refs`](Self::load_taxonomy_from_schema_refs),
    /// parsing the schemas on the rayon pool. Results merge in schemaRef order,
    /// so the outcome matches the sequential form.
    #[cfg(feature = "parallel")]
    pub fn load_taxonomy_from_schema_refs_par<F, R>(&mut self, opener: F) -> Result<&Taxonomy>
    where
        F: Fn(&str) -> io::Result<R> + Sync,
        R: Read,
    {
        use rayon::prelude::*;

        let parsed = self
            .schema_refs
            .par_iter()
            .filter(|s| !s.href().is_empty())
            .map(|s| load_schema_ref(&opener, s.href()))
            .collect::<Result<Vec<_>>>()?;

        let mut taxonomy = Taxonomy::new();
        for part in parsed {
            taxonomy.merge(part);
        }
        debug!(concepts = taxonomy.len(), "loaded taxonomy from schemaRefs");
        Ok(self.taxonomy.insert(taxonomy))
    }
}
