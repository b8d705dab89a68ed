// Taxonomy schema parsing: xs:element declarations become concepts
use crate::model::QName;
use crate::reader::{ScopedReader, StartTag, Token};
use crate::taxonomy::{Concept, Taxonomy};
use crate::{Error, Result};
use compact_str::CompactString;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn parse_taxonomy_file<P: AsRef<Path>>(path: P) -> Result<Taxonomy> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_taxonomy(BufReader::new(file))
}

/// Read concept declarations from a schema. Only attributes of `element`
/// declarations are looked at; their content is skipped.
pub fn parse_taxonomy<R: BufRead>(reader: R) -> Result<Taxonomy> {
    let mut reader = ScopedReader::new(reader);
    let mut taxonomy = Taxonomy::new();
    let mut target_namespace = CompactString::default();

    loop {
        match reader.next_token()? {
            Token::Start(tag) => match tag.local.as_str() {
                "schema" => {
                    target_namespace = tag
                        .attr("targetNamespace")
                        .map(|ns| CompactString::from(ns.trim()))
                        .unwrap_or_default();
                }
                "element" => {
                    match concept_from_element(&tag, &target_namespace, &reader) {
                        Some(concept) => taxonomy.insert(concept),
                        None => debug!(
                            name = tag.attr("name").unwrap_or_default(),
                            target_namespace = %target_namespace,
                            "skipping element declaration without name or target namespace"
                        ),
                    }
                    reader.skip("element")?;
                }
                _ => {}
            },
            Token::Eof => break,
            Token::End(_) | Token::Text(_) => {}
        }
    }

    if reader.open_elements() > 0 {
        return Err(Error::UnexpectedEof { element: "schema" });
    }

    debug!(concepts = taxonomy.len(), "parsed taxonomy schema");
    Ok(taxonomy)
}

fn concept_from_element<R: BufRead>(
    tag: &StartTag,
    target_namespace: &str,
    reader: &ScopedReader<R>,
) -> Option<Concept> {
    let attr = |local| tag.attr(local).map(str::trim).unwrap_or_default();

    let name = attr("name");
    if name.is_empty() || target_namespace.is_empty() {
        return None;
    }

    let ns = reader.namespaces();
    let resolve = |lexical: &str| {
        if lexical.is_empty() {
            QName::default()
        } else {
            ns.resolve(lexical)
        }
    };

    Some(Concept {
        qname: QName::new(ns.prefix_for_uri(target_namespace), name, target_namespace),
        id: attr("id").into(),
        substitution_group: resolve(attr("substitutionGroup")),
        type_name: resolve(attr("type")),
        is_abstract: parse_bool(attr("abstract")),
        nillable: parse_bool(attr("nillable")),
        period_type: attr("periodType").into(),
        balance: attr("balance").into(),
    })
}

/// Case-insensitive `true` or `1`; everything else is false.
fn parse_bool(s: &str) -> bool {
    s.eq_ignore_ascii_case("true") || s == "1"
}

/// Opens schemaRef hrefs as files under a base directory.
///
/// Relative hrefs are joined onto the base directory. Remote hrefs are not
/// fetched: the last path segment is looked up in the base directory, which
/// covers the usual layout of a filing with its extension schema alongside.
#[derive(Debug, Clone)]
pub struct SchemaFileOpener {
    base_dir: PathBuf,
}

impl SchemaFileOpener {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn resolve(&self, href: &str) -> PathBuf {
        if href.starts_with("http://") || href.starts_with("https://") {
            let file_name = href.rsplit('/').next().unwrap_or(href);
            return self.base_dir.join(file_name);
        }
        let path = Path::new(href);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn open(&self, href: &str) -> io::Result<File> {
        File::open(self.resolve(href))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;
    use crate::NS_XBRLI;
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema
    xmlns:xs="http://www.w3.org/2001/XMLSchema"
    xmlns:xbrli="http://www.xbrl.org/2003/instance"
    xmlns:ex="http://example.com/xbrl"
    targetNamespace="http://example.com/xbrl">
  <xs:element name="Revenue"
              id="ex_Revenue"
              type="xbrli:monetaryItemType"
              substitutionGroup="xbrli:item"
              abstract="TRUE"
              nillable="1"
              xbrli:periodType="duration"
              xbrli:balance="debit">
    <xs:annotation><xs:documentation>nested content is skipped</xs:documentation></xs:annotation>
  </xs:element>
  <xs:element name="Flag" type="xs:boolean" substitutionGroup="xbrli:item" abstract="yes"/>
  <xs:element name="Group" substitutionGroup="xbrli:tuple"/>
  <xs:element type="xs:string"/>
</xs:schema>"#;

    fn taxonomy(xml: &str) -> Taxonomy {
        parse_taxonomy(xml.as_bytes()).unwrap()
    }

    #[test]
    fn element_declarations_become_concepts() {
        let tax = taxonomy(SCHEMA);
        assert_eq!(tax.len(), 3);

        let revenue = tax
            .concept(&QName::new("", "Revenue", "http://example.com/xbrl"))
            .unwrap();
        assert_eq!(revenue.qname().prefix(), "ex");
        assert_eq!(revenue.id(), "ex_Revenue");
        assert_eq!(
            revenue.type_name(),
            &QName::new("xbrli", "monetaryItemType", NS_XBRLI)
        );
        assert!(revenue.is_item());
        assert!(revenue.is_abstract);
        assert!(revenue.nillable);
        assert_eq!(revenue.period_type(), "duration");
        assert_eq!(revenue.balance(), "debit");
        assert_eq!(revenue.value_kind(), ValueKind::Monetary);

        let flag = tax.concept(&QName::new("", "Flag", "http://example.com/xbrl")).unwrap();
        assert!(!flag.is_abstract);
        assert_eq!(flag.value_kind(), ValueKind::Boolean);

        let group = tax.concept(&QName::new("", "Group", "http://example.com/xbrl")).unwrap();
        assert!(group.is_tuple());
        assert_eq!(group.type_name(), &QName::default());
    }

    #[test]
    fn permissive_booleans() {
        for (input, want) in [
            ("true", true),
            ("True", true),
            ("1", true),
            ("", false),
            ("0", false),
            ("false", false),
            ("yes", false),
        ] {
            assert_eq!(parse_bool(input), want, "{input:?}");
        }
    }

    #[test]
    fn declarations_without_target_namespace_are_skipped() {
        let tax = taxonomy(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:element name="Orphan"/>
               </xs:schema>"#,
        );
        assert!(tax.is_empty());
    }

    #[test]
    fn concept_without_prefix_binding_has_empty_prefix() {
        let tax = taxonomy(
            r#"<schema xmlns="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:unbound">
                 <element name="X"/>
               </schema>"#,
        );
        let x = tax.concept(&QName::new("", "X", "urn:unbound")).unwrap();
        assert_eq!(x.qname().prefix(), "");
    }

    #[test]
    fn redeclaration_keeps_the_last() {
        let tax = taxonomy(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:ex">
                 <xs:element name="A" id="first"/>
                 <xs:element name="A" id="second"/>
               </xs:schema>"#,
        );
        assert_eq!(tax.len(), 1);
        assert_eq!(tax.concept(&QName::new("", "A", "urn:ex")).unwrap().id(), "second");
    }

    #[test]
    fn element_scope_does_not_leak_to_siblings() {
        let tax = taxonomy(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:ex"
                          xmlns:t="urn:types-outer">
                 <xs:element name="A" type="t:x" xmlns:t="urn:types-inner"><xs:annotation/></xs:element>
                 <xs:element name="B" type="t:x"/>
               </xs:schema>"#,
        );
        let a = tax.concept(&QName::new("", "A", "urn:ex")).unwrap();
        let b = tax.concept(&QName::new("", "B", "urn:ex")).unwrap();
        assert_eq!(a.type_name().uri(), "urn:types-inner");
        assert_eq!(b.type_name().uri(), "urn:types-outer");
    }

    #[test]
    fn malformed_schema_fails_without_partial_result() {
        let err = parse_taxonomy(
            r#"<xs:schema targetNamespace="urn:ex"><xs:element name="A"/><xs:element"#.as_bytes(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Decode(_)), "{err:?}");
    }

    #[test]
    fn opener_resolves_relative_and_remote_hrefs() {
        let opener = SchemaFileOpener::new("/filings/2025");
        assert_eq!(
            opener.resolve("ex-2025.xsd"),
            PathBuf::from("/filings/2025/ex-2025.xsd")
        );
        assert_eq!(
            opener.resolve("https://example.com/taxonomy/ex-2025.xsd"),
            PathBuf::from("/filings/2025/ex-2025.xsd")
        );
        assert_eq!(opener.resolve("/abs/s.xsd"), PathBuf::from("/abs/s.xsd"));
    }

    #[test]
    fn parse_taxonomy_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ex.xsd");
        std::fs::write(&path, SCHEMA).unwrap();
        assert_eq!(parse_taxonomy_file(&path).unwrap().len(), 3);

        let err = parse_taxonomy_file(dir.path().join("missing.xsd")).unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
    }
}
