// Fact queries over a parsed document
use crate::model::{Document, Fact, QName};
use compact_str::CompactString;

/// Criteria for selecting facts. Every set criterion must hold.
///
/// Empty strings leave a criterion unset. Dimension requirements match
/// explicit members by URI and local name; typed members never match.
#[derive(Debug, Clone, Default)]
pub struct FactFilter {
    concept_local: CompactString,
    concept_uri: CompactString,
    context_id: CompactString,
    unit_id: CompactString,
    nil: Option<bool>,
    dimensions: Vec<(QName, QName)>,
}

impl FactFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn concept_local(mut self, local: impl Into<CompactString>) -> Self {
        self.concept_local = local.into();
        self
    }

    pub fn concept_uri(mut self, uri: impl Into<CompactString>) -> Self {
        self.concept_uri = uri.into();
        self
    }

    pub fn context_id(mut self, id: impl Into<CompactString>) -> Self {
        self.context_id = id.into();
        self
    }

    pub fn unit_id(mut self, id: impl Into<CompactString>) -> Self {
        self.unit_id = id.into();
        self
    }

    /// Keep only nil facts. Replaces an earlier [`exclude_nil`](Self::exclude_nil).
    pub fn only_nil(mut self) -> Self {
        self.nil = Some(true);
        self
    }

    /// Drop nil facts. Replaces an earlier [`only_nil`](Self::only_nil).
    pub fn exclude_nil(mut self) -> Self {
        self.nil = Some(false);
        self
    }

    /// Require the fact's context to carry `member` on axis `dimension`.
    pub fn dimension(mut self, dimension: QName, member: QName) -> Self {
        self.dimensions.push((dimension, member));
        self
    }

    /// True when no criterion is set, so every fact matches.
    pub fn is_empty(&self) -> bool {
        self.concept_local.is_empty()
            && self.concept_uri.is_empty()
            && self.context_id.is_empty()
            && self.unit_id.is_empty()
            && self.nil.is_none()
            && self.dimensions.is_empty()
    }

    pub fn matches(&self, doc: &Document, fact: &Fact) -> bool {
        let name = fact.name();
        if !self.concept_local.is_empty() && self.concept_local != name.local() {
            return false;
        }
        if !self.concept_uri.is_empty() && self.concept_uri != name.uri() {
            return false;
        }
        if !self.context_id.is_empty() && self.context_id != fact.context_ref() {
            return false;
        }
        if !self.unit_id.is_empty() && self.unit_id != fact.unit_ref() {
            return false;
        }
        if self.nil.is_some_and(|nil| fact.is_nil() != nil) {
            return false;
        }
        if self.dimensions.is_empty() {
            return true;
        }

        match doc.context_of(fact) {
            Some(context) => self
                .dimensions
                .iter()
                .all(|(dim, member)| context.has_explicit_member(dim, member)),
            None => false,
        }
    }
}

/// Facts of `doc` matching `filter`, in document order. Either side missing
/// yields an empty result.
pub fn filter_facts<'a>(doc: Option<&'a Document>, filter: Option<&FactFilter>) -> Vec<&'a Fact> {
    match (doc, filter) {
        (Some(doc), Some(filter)) => doc
            .facts()
            .iter()
            .filter(|fact| filter.matches(doc, fact))
            .collect(),
        _ => Vec::new(),
    }
}

impl Document {
    pub fn filter_facts(&self, filter: &FactFilter) -> Vec<&Fact> {
        filter_facts(Some(self), Some(filter))
    }
}
