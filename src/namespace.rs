//! Prefix → URI scoping that mirrors XML lexical scoping.
//!
//! Every element start pushes a frame that copies the enclosing bindings and
//! overlays the element's own `xmlns` / `xmlns:p` declarations. Lookups only
//! ever consult the top frame, so inner declarations shadow outer ones and a
//! sibling subtree never sees another sibling's declarations.

use ahash::AHashMap;
use compact_str::CompactString;

use crate::model::QName;

pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

type Frame = AHashMap<CompactString, CompactString>;

#[derive(Debug, Clone)]
pub struct NamespaceStack {
    frames: Vec<Frame>,
}

impl Default for NamespaceStack {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceStack {
    pub fn new() -> Self {
        let mut base = Frame::default();
        base.insert(CompactString::new("xml"), CompactString::new(XML_NAMESPACE));
        Self { frames: vec![base] }
    }

    /// Enter an element. `declarations` are `(prefix, uri)` pairs, with the
    /// empty prefix standing for the default namespace.
    pub fn push<I, P, U>(&mut self, declarations: I)
    where
        I: IntoIterator<Item = (P, U)>,
        P: Into<CompactString>,
        U: Into<CompactString>,
    {
        let mut top = self.frames.last().cloned().unwrap_or_default();
        for (prefix, uri) in declarations {
            top.insert(prefix.into(), uri.into());
        }
        self.frames.push(top);
    }

    /// Leave an element. The base frame is never popped.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Number of open elements.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// URI bound to `prefix` in the current scope, or `""` when unbound.
    pub fn uri_for_prefix(&self, prefix: &str) -> &str {
        self.frames
            .last()
            .and_then(|top| top.get(prefix))
            .map(CompactString::as_str)
            .unwrap_or("")
    }

    /// A prefix bound to `uri` in the current scope.
    ///
    /// Several prefixes may share a URI; the smallest non-empty one wins so the
    /// answer does not depend on hash order. Returns `""` if nothing (or only the
    /// default namespace) is bound to it.
    pub fn prefix_for_uri(&self, uri: &str) -> &str {
        if uri.is_empty() {
            return "";
        }
        let Some(top) = self.frames.last() else {
            return "";
        };
        top.iter()
            .filter(|(prefix, bound)| !prefix.is_empty() && bound.as_str() == uri)
            .map(|(prefix, _)| prefix.as_str())
            .min()
            .unwrap_or("")
    }

    /// Resolve a lexical `prefix:local` (or bare `local`) name against the
    /// current scope. A bare name takes the default namespace.
    pub fn resolve(&self, lexical: &str) -> QName {
        let lexical = lexical.trim();
        let (prefix, local) = split_lexical(lexical);
        QName::new(prefix, local, self.uri_for_prefix(prefix))
    }
}

/// Split `p:local` into `("p", "local")`; a name without a colon has an empty prefix.
pub fn split_lexical(name: &str) -> (&str, &str) {
    match name.find(':') {
        Some(i) => (&name[..i], &name[i + 1..]),
        None => ("", name),
    }
}
