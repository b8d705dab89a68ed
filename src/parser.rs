// XBRL instance parser: one forward pass over the token stream
use crate::model::*;
use crate::reader::{ScopedReader, StartTag, Token};
use crate::schema::SchemaFileOpener;
use crate::{Error, Result, NS_XSI};
use compact_str::CompactString;
#[cfg(feature = "mmap")]
use memmap2::Mmap;
use std::fs::File;
use std::io::BufRead;
#[cfg(not(feature = "mmap"))]
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, trace, warn};

pub struct Parser {
    load_schemas: bool,
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    parallel: bool,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            load_schemas: false,
            parallel: true,
        }
    }

    /// After [`parse_file`](Self::parse_file), resolve the document's schemaRefs
    /// against files next to the instance and attach the merged taxonomy.
    pub fn with_schema_loading(mut self, load: bool) -> Self {
        self.load_schemas = load;
        self
    }

    /// Load schemaRefs concurrently. Only has an effect with the `parallel` feature.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;

        #[cfg(feature = "mmap")]
        let mut doc = {
            // SAFETY: the map is read-only and dropped before this call returns.
            let map = unsafe { Mmap::map(&file) }.map_err(|source| Error::Open {
                path: path.to_path_buf(),
                source,
            })?;
            self.parse_bytes(&map)?
        };
        #[cfg(not(feature = "mmap"))]
        let mut doc = self.parse_reader(BufReader::new(file))?;

        if self.load_schemas {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            self.load_schemas_from(&mut doc, SchemaFileOpener::new(base))?;
        }
        Ok(doc)
    }

    pub fn parse_reader<R: BufRead>(&self, reader: R) -> Result<Document> {
        InstanceParser::new(reader).parse()
    }

    pub fn parse_bytes(&self, data: &[u8]) -> Result<Document> {
        // Skip BOM if present
        let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);
        self.parse_reader(data)
    }

    pub fn parse_str(&self, xml: &str) -> Result<Document> {
        self.parse_bytes(xml.as_bytes())
    }

    #[cfg(feature = "parallel")]
    fn load_schemas_from(&self, doc: &mut Document, opener: SchemaFileOpener) -> Result<()> {
        if self.parallel {
            doc.load_taxonomy_from_schema_refs_par(|href| opener.open(href))?;
        } else {
            doc.load_taxonomy_from_schema_refs(|href| opener.open(href))?;
        }
        Ok(())
    }

    #[cfg(not(feature = "parallel"))]
    fn load_schemas_from(&self, doc: &mut Document, opener: SchemaFileOpener) -> Result<()> {
        doc.load_taxonomy_from_schema_refs(|href| opener.open(href))?;
        Ok(())
    }
}

struct InstanceParser<R> {
    reader: ScopedReader<R>,
    doc: Document,
}

impl<R: BufRead> InstanceParser<R> {
    fn new(inner: R) -> Self {
        Self {
            reader: ScopedReader::new(inner),
            doc: Document::new(),
        }
    }

    fn parse(mut self) -> Result<Document> {
        loop {
            match self.reader.next_token()? {
                Token::Start(tag) => self.parse_element(tag)?,
                Token::Eof => break,
                Token::End(_) | Token::Text(_) => {}
            }
        }

        if self.reader.open_elements() > 0 {
            return Err(Error::UnexpectedEof { element: "document" });
        }

        debug!(
            schema_refs = self.doc.schema_refs.len(),
            contexts = self.doc.contexts.len(),
            units = self.doc.units.len(),
            facts = self.doc.facts.len(),
            "parsed instance document"
        );
        Ok(self.doc)
    }

    fn parse_element(&mut self, tag: StartTag) -> Result<()> {
        // The root only opens a scope; its children are handled as they arrive.
        if tag.local.eq_ignore_ascii_case("xbrl") {
            return Ok(());
        }

        match tag.local.as_str() {
            "schemaRef" => {
                let href = tag.attr("href").unwrap_or_default();
                self.doc.schema_refs.push(SchemaRef::new(href));
            }
            "context" => {
                let context = self.parse_context(&tag)?;
                if let Some(previous) = self.doc.contexts.insert(context.id.clone(), context) {
                    warn!(id = %previous.id, "duplicate context id, keeping the later one");
                }
            }
            "unit" => {
                let unit = self.parse_unit(&tag)?;
                if let Some(previous) = self.doc.units.insert(unit.id.clone(), unit) {
                    warn!(id = %previous.id, "duplicate unit id, keeping the later one");
                }
            }
            _ if tag.has_attr("contextRef") => {
                let fact = self.parse_fact(&tag)?;
                self.doc.facts.push(fact);
            }
            _ => trace!(element = %tag.local, "descending into unrecognized element"),
        }
        Ok(())
    }

    fn parse_context(&mut self, start: &StartTag) -> Result<Context> {
        let id = CompactString::from(start.attr("id").unwrap_or_default());

        let mut entity = Entity::default();
        let mut period = None;
        let mut dimensions = Vec::new();

        loop {
            match self.reader.next_token()? {
                Token::Start(child) => match child.local.as_str() {
                    "entity" => {
                        let (e, segment) = self.parse_entity()?;
                        entity = e;
                        dimensions.extend(segment);
                    }
                    "period" => period = Some(self.parse_period(&id)?),
                    "scenario" => dimensions.extend(self.parse_dimensions("dimensions (scenario)")?),
                    _ => self.reader.skip("context")?,
                },
                Token::End(_) => break,
                Token::Text(_) => {}
                Token::Eof => return Err(Error::UnexpectedEof { element: "context" }),
            }
        }

        let period = period.ok_or_else(|| Error::InvalidPeriod {
            context: id.to_string(),
            reason: "missing period",
        })?;

        Ok(Context::new(id, entity, period).with_dimensions(dimensions))
    }

    fn parse_entity(&mut self) -> Result<(Entity, Vec<Dimension>)> {
        let mut entity = Entity::default();
        let mut dimensions = Vec::new();

        loop {
            match self.reader.next_token()? {
                Token::Start(child) => match child.local.as_str() {
                    "identifier" => {
                        let scheme = CompactString::from(child.attr("scheme").unwrap_or_default());
                        let value = self.reader.read_text("entity")?;
                        entity.identifier = Identifier {
                            scheme,
                            value: CompactString::from(value.trim()),
                        };
                    }
                    "segment" => dimensions.extend(self.parse_dimensions("dimensions (segment)")?),
                    _ => self.reader.skip("entity")?,
                },
                Token::End(_) => return Ok((entity, dimensions)),
                Token::Text(_) => {}
                Token::Eof => return Err(Error::UnexpectedEof { element: "entity" }),
            }
        }
    }

    fn parse_period(&mut self, context: &str) -> Result<Period> {
        let mut instant = None;
        let mut start = None;
        let mut end = None;
        let mut forever = false;

        loop {
            match self.reader.next_token()? {
                Token::Start(child) => match child.local.as_str() {
                    "instant" => instant = Some(self.read_trimmed("period")?),
                    "startDate" => start = Some(self.read_trimmed("period")?),
                    "endDate" => end = Some(self.read_trimmed("period")?),
                    "forever" => {
                        self.reader.skip("period")?;
                        forever = true;
                    }
                    _ => self.reader.skip("period")?,
                },
                Token::End(_) => break,
                Token::Text(_) => {}
                Token::Eof => return Err(Error::UnexpectedEof { element: "period" }),
            }
        }

        let invalid = |reason| Error::InvalidPeriod {
            context: context.to_string(),
            reason,
        };
        match (instant, start, end, forever) {
            (Some(date), None, None, false) => Ok(Period::Instant(date)),
            (None, Some(start), Some(end), false) => Ok(Period::Duration { start, end }),
            (None, None, None, true) => Ok(Period::Forever),
            (None, None, None, false) => Err(invalid("empty period")),
            (None, Some(_), None, false) | (None, None, Some(_), false) => {
                Err(invalid("duration needs both startDate and endDate"))
            }
            _ => Err(invalid("more than one of instant, duration and forever")),
        }
    }

    fn parse_unit(&mut self, start: &StartTag) -> Result<Unit> {
        let id = CompactString::from(start.attr("id").unwrap_or_default());

        let mut measures = Vec::new();
        let mut divide = None;

        loop {
            match self.reader.next_token()? {
                Token::Start(child) => match child.local.as_str() {
                    "measure" => measures.push(self.parse_measure("unit")?),
                    "divide" => divide = Some(self.parse_divide()?),
                    _ => self.reader.skip("unit")?,
                },
                Token::End(_) => break,
                Token::Text(_) => {}
                Token::Eof => return Err(Error::UnexpectedEof { element: "unit" }),
            }
        }

        Ok(match divide {
            Some((numerator, denominator)) => {
                if !measures.is_empty() {
                    trace!(unit = %id, "ignoring top-level measures next to divide");
                }
                Unit::divide(id, numerator, denominator)
            }
            None => Unit::simple(id, measures),
        })
    }

    fn parse_divide(&mut self) -> Result<(Vec<QName>, Vec<QName>)> {
        let mut numerator = Vec::new();
        let mut denominator = Vec::new();

        loop {
            match self.reader.next_token()? {
                Token::Start(child) => match child.local.as_str() {
                    "unitNumerator" => numerator = self.parse_measure_container()?,
                    "unitDenominator" => denominator = self.parse_measure_container()?,
                    _ => self.reader.skip("divide")?,
                },
                Token::End(_) => return Ok((numerator, denominator)),
                Token::Text(_) => {}
                Token::Eof => return Err(Error::UnexpectedEof { element: "divide" }),
            }
        }
    }

    fn parse_measure_container(&mut self) -> Result<Vec<QName>> {
        let mut measures = Vec::new();
        loop {
            match self.reader.next_token()? {
                Token::Start(child) if child.local == "measure" => {
                    measures.push(self.parse_measure("unit measures")?)
                }
                Token::Start(_) => self.reader.skip("unit measures")?,
                Token::End(_) => return Ok(measures),
                Token::Text(_) => {}
                Token::Eof => return Err(Error::UnexpectedEof { element: "unit measures" }),
            }
        }
    }

    /// Measure text is a lexical QName resolved in the `<measure>` element's own scope.
    fn parse_measure(&mut self, element: &'static str) -> Result<QName> {
        let text = self.reader.read_text(element)?;
        Ok(self.reader.namespaces().resolve(&text))
    }

    fn parse_dimensions(&mut self, element: &'static str) -> Result<Vec<Dimension>> {
        let mut dimensions = Vec::new();

        loop {
            match self.reader.next_token()? {
                Token::Start(child) => match child.local.as_str() {
                    "explicitMember" => {
                        let dimension = self.dimension_axis(&child);
                        let text = self.reader.read_text(element)?;
                        let member = self.reader.namespaces().resolve(&text);
                        dimensions.push(Dimension::Explicit { dimension, member });
                    }
                    "typedMember" => {
                        let dimension = self.dimension_axis(&child);
                        let value = self.reader.read_inner_xml(element)?;
                        dimensions.push(Dimension::Typed {
                            dimension,
                            value: value.trim().to_owned(),
                        });
                    }
                    _ => self.reader.skip(element)?,
                },
                Token::End(_) => return Ok(dimensions),
                Token::Text(_) => {}
                Token::Eof => return Err(Error::UnexpectedEof { element }),
            }
        }
    }

    fn dimension_axis(&self, member: &StartTag) -> QName {
        self.reader
            .namespaces()
            .resolve(member.attr("dimension").unwrap_or_default())
    }

    fn parse_fact(&mut self, start: &StartTag) -> Result<Fact> {
        // Display prefix comes from the scope, not the tag as written.
        let prefix = self.reader.namespaces().prefix_for_uri(&start.uri);
        let mut fact = Fact {
            kind: FactKind::Item,
            name: QName::new(prefix, start.local.as_str(), start.uri.as_str()),
            ..Fact::default()
        };

        for attr in &start.attrs {
            let value = CompactString::from(attr.value.as_str());
            match attr.local.as_str() {
                "contextRef" => fact.context_ref = value,
                "unitRef" => fact.unit_ref = value,
                "decimals" => fact.decimals = value,
                "precision" => fact.precision = value,
                "id" => fact.id = value,
                "lang" => fact.lang = value,
                "nil" if attr.uri == NS_XSI => fact.nil = value.eq_ignore_ascii_case("true"),
                _ => {}
            }
        }

        let text = self.reader.read_text("fact")?;
        fact.value = text.trim().to_owned();
        Ok(fact)
    }

    fn read_trimmed(&mut self, element: &'static str) -> Result<CompactString> {
        let text = self.reader.read_text(element)?;
        Ok(CompactString::from(text.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MINIMAL_INSTANCE: &str = r#"
<xbrli:xbrl
    xmlns:xbrli="http://www.xbrl.org/2003/instance"
    xmlns:link="http://www.xbrl.org/2003/linkbase"
    xmlns:ex="http://example.com/xbrl">
  <link:schemaRef xlink:type="simple"
    xlink:href="http://example.com/schema.xsd"
    xmlns:xlink="http://www.w3.org/1999/xlink"/>
  <xbrli:context id="C1">
    <xbrli:entity>
      <xbrli:identifier scheme="http://example.com/entity">ABC</xbrli:identifier>
    </xbrli:entity>
    <xbrli:period>
      <xbrli:instant>2025-01-01</xbrli:instant>
    </xbrli:period>
  </xbrli:context>
  <xbrli:unit id="U1">
    <xbrli:measure>iso4217:JPY</xbrli:measure>
  </xbrli:unit>
  <ex:Revenue contextRef="C1" unitRef="U1" decimals="0">12345</ex:Revenue>
</xbrli:xbrl>
"#;

    const EXTENDED_INSTANCE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xbrli:xbrl
    xmlns:xbrli="http://www.xbrl.org/2003/instance"
    xmlns:xbrldi="http://xbrl.org/2006/xbrldi"
    xmlns:ex="http://example.com/xbrl"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xmlns:iso4217="http://www.xbrl.org/2003/iso4217">

  <!-- C1: segment explicit member, scenario typed member, duration -->
  <xbrli:context id="C1">
    <xbrli:entity>
      <xbrli:identifier scheme="http://example.com/entity">
        ABC
      </xbrli:identifier>
      <xbrli:segment>
        <xbrldi:explicitMember dimension="ex:Region">
          ex:Japan
        </xbrldi:explicitMember>
      </xbrli:segment>
    </xbrli:entity>
    <xbrli:period>
      <xbrli:startDate>2025-01-01</xbrli:startDate>
      <xbrli:endDate>2025-12-31</xbrli:endDate>
    </xbrli:period>
    <xbrli:scenario>
      <xbrldi:typedMember dimension="ex:Scenario">
        <ex:ScenarioType> Base </ex:ScenarioType>
      </xbrldi:typedMember>
    </xbrli:scenario>
  </xbrli:context>

  <xbrli:context id="C2">
    <xbrli:entity>
      <xbrli:identifier scheme="http://example.com/entity">XYZ</xbrli:identifier>
    </xbrli:entity>
    <xbrli:period>
      <xbrli:forever/>
    </xbrli:period>
  </xbrli:context>

  <xbrli:unit id="U1">
    <xbrli:measure>iso4217:JPY</xbrli:measure>
  </xbrli:unit>

  <xbrli:unit id="Udiv">
    <xbrli:divide>
      <xbrli:unitNumerator>
        <xbrli:measure>iso4217:JPY</xbrli:measure>
      </xbrli:unitNumerator>
      <xbrli:unitDenominator>
        <xbrli:measure>xbrli:shares</xbrli:measure>
      </xbrli:unitDenominator>
    </xbrli:divide>
  </xbrli:unit>

  <xbrli:unit id="U2" xmlns="urn:iso:std:iso:4217">
    <xbrli:measure>JPY</xbrli:measure>
  </xbrli:unit>

  <ex:Revenue contextRef="C1" unitRef="U1" decimals="0" precision="2" id="F1" xml:lang="ja">
    12345
  </ex:Revenue>

  <ex:NilFact contextRef="C1" xsi:nil="TRUE">ignored text</ex:NilFact>

  <ex:OtherElement>no contextRef, should be ignored</ex:OtherElement>
</xbrli:xbrl>
"#;

    fn parse(xml: &str) -> Result<Document> {
        Parser::new().parse_str(xml)
    }

    #[test]
    fn minimal_instance_counts() {
        let doc = parse(MINIMAL_INSTANCE).unwrap();
        assert_eq!(doc.schema_refs().len(), 1);
        assert_eq!(doc.contexts().len(), 1);
        assert_eq!(doc.units().len(), 1);
        assert_eq!(doc.facts().len(), 1);

        assert_eq!(doc.schema_refs()[0].href(), "http://example.com/schema.xsd");
        let fact = &doc.facts()[0];
        assert_eq!(fact.name().to_string(), "{http://example.com/xbrl}Revenue");
        assert_eq!(fact.name().prefix(), "ex");
        assert_eq!(fact.value(), "12345");
        assert_eq!(fact.decimals(), "0");
        assert!(doc.context_of(fact).unwrap().period.is_instant());
    }

    #[test]
    fn extended_instance_structure() {
        let doc = parse(EXTENDED_INSTANCE).unwrap();
        assert_eq!(doc.contexts().len(), 2);
        assert_eq!(doc.units().len(), 3);
        assert_eq!(doc.facts().len(), 2);

        let c1 = doc.context_by_id("C1").unwrap();
        assert_eq!(c1.entity.identifier.value, "ABC");
        assert_eq!(c1.entity.identifier.scheme, "http://example.com/entity");
        assert_eq!(c1.period.start_date(), Some("2025-01-01"));
        assert_eq!(c1.period.end_date(), Some("2025-12-31"));

        let dims = c1.dimensions();
        assert_eq!(dims.len(), 2);
        assert_eq!(
            dims[0],
            Dimension::Explicit {
                dimension: QName::new("ex", "Region", "http://example.com/xbrl"),
                member: QName::new("ex", "Japan", "http://example.com/xbrl"),
            }
        );
        assert_eq!(dims[1].dimension().local(), "Scenario");
        assert_eq!(
            dims[1].typed_value(),
            Some("<ex:ScenarioType> Base </ex:ScenarioType>")
        );

        assert!(doc.context_by_id("C2").unwrap().period.is_forever());
    }

    #[test]
    fn units_resolve_measures_in_scope() {
        let doc = parse(EXTENDED_INSTANCE).unwrap();

        let u1 = doc.unit_by_id("U1").unwrap();
        assert_eq!(
            u1.measures(),
            &[QName::new("iso4217", "JPY", "http://www.xbrl.org/2003/iso4217")]
        );

        let div = doc.unit_by_id("Udiv").unwrap();
        assert!(div.is_divide());
        assert_eq!(div.numerator_measures()[0].local(), "JPY");
        assert_eq!(
            div.denominator_measures()[0],
            QName::new("", "shares", "http://www.xbrl.org/2003/instance")
        );

        // default namespace declared on the unit itself
        let u2 = doc.unit_by_id("U2").unwrap();
        assert_eq!(u2.measures()[0].uri(), "urn:iso:std:iso:4217");
        assert_eq!(u2.measures()[0].prefix(), "");
    }

    #[test]
    fn fact_attributes_and_nil() {
        let doc = parse(EXTENDED_INSTANCE).unwrap();
        let revenue = &doc.facts()[0];
        assert_eq!(revenue.value(), "12345");
        assert_eq!(revenue.context_ref(), "C1");
        assert_eq!(revenue.unit_ref(), "U1");
        assert_eq!(revenue.precision(), "2");
        assert_eq!(revenue.id(), "F1");
        assert_eq!(revenue.lang(), "ja");
        assert!(!revenue.is_nil());

        let nil = &doc.facts()[1];
        assert_eq!(nil.name().local(), "NilFact");
        assert!(nil.is_nil());
        assert_eq!(nil.value(), "ignored text");
    }

    #[test]
    fn nil_requires_xsi_namespace() {
        let xml = r#"<xbrl xmlns:ex="urn:ex" xmlns:other="urn:other">
            <ex:A contextRef="C" other:nil="true">1</ex:A>
            <ex:B contextRef="C" nil="true">2</ex:B>
        </xbrl>"#;
        let doc = parse(xml).unwrap();
        assert!(doc.facts().iter().all(|f| !f.is_nil()));
    }

    #[test]
    fn member_resolves_against_scope_where_it_appears() {
        let xml = r#"<xbrl xmlns:ex="urn:outer" xmlns:xbrldi="http://xbrl.org/2006/xbrldi">
          <context id="C1">
            <entity>
              <identifier scheme="s">E</identifier>
              <segment xmlns:ex="urn:segment">
                <xbrldi:explicitMember dimension="ex:Axis">ex:Japan</xbrldi:explicitMember>
                <xbrldi:explicitMember xmlns:ex="urn:inner" dimension="ex:Axis">ex:Japan</xbrldi:explicitMember>
              </segment>
            </entity>
            <period><instant>2025-01-01</instant></period>
            <scenario>
              <xbrldi:explicitMember dimension="ex:Axis">ex:Japan</xbrldi:explicitMember>
            </scenario>
          </context>
        </xbrl>"#;
        let doc = parse(xml).unwrap();
        let dims = doc.context_by_id("C1").unwrap().dimensions();
        let uris: Vec<_> = dims.iter().map(|d| d.member().unwrap().uri()).collect();
        assert_eq!(uris, vec!["urn:segment", "urn:inner", "urn:outer"]);
        assert_eq!(dims[1].dimension().uri(), "urn:inner");
    }

    #[test]
    fn element_without_context_ref_is_not_a_fact() {
        let xml = r#"
        <xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance" xmlns:ex="http://example.com/xbrl">
          <xbrli:context id="C1">
            <xbrli:entity><xbrli:identifier scheme="s">ABC</xbrli:identifier></xbrli:entity>
            <xbrli:period><xbrli:instant>2025-01-01</xbrli:instant></xbrli:period>
          </xbrli:context>
          <ex:Something>no contextRef</ex:Something>
          <ex:Real contextRef="C1">1</ex:Real>
        </xbrli:xbrl>"#;
        let doc = parse(xml).unwrap();
        assert_eq!(doc.contexts().len(), 1);
        assert_eq!(doc.facts().len(), 1);
        assert_eq!(doc.facts()[0].name().local(), "Real");
    }

    #[test]
    fn facts_nested_in_unrecognized_wrappers_are_found() {
        let xml = r#"<XBRL xmlns:ex="urn:ex"><ex:Wrapper><ex:A contextRef="C">7</ex:A></ex:Wrapper></XBRL>"#;
        let doc = parse(xml).unwrap();
        assert_eq!(doc.facts().len(), 1);
        assert_eq!(doc.facts()[0].value(), "7");
    }

    #[test]
    fn malformed_root_is_a_decode_error() {
        let err = parse(r#"<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance""#).unwrap_err();
        assert!(matches!(err, Error::Decode(_)), "{err:?}");
        assert!(err.to_string().starts_with("xbrl: decode token"));
    }

    #[test]
    fn mismatched_end_tag_is_a_decode_error() {
        let err = parse("<xbrl><a></b></xbrl>").unwrap_err();
        assert!(matches!(err, Error::Decode(_)), "{err:?}");
    }

    #[test]
    fn truncated_structures_name_the_element() {
        let cases = [
            (
                r#"<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance">
                  <xbrli:context id="C1">
                    <xbrli:entity><xbrli:identifier scheme="s">ABC</xbrli:identifier></xbrli:entity>
                    <xbrli:period><xbrli:instant>2025-01-01</xbrli:instant></xbrli:period>
                  <!-- missing </xbrli:context> -->"#,
                "context",
            ),
            (
                r#"<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance">
                  <xbrli:unit id="U1">
                    <xbrli:measure>iso4217:JPY</xbrli:measure>"#,
                "unit",
            ),
            ("<xbrl><context id='C'><entity>", "entity"),
            ("<xbrl><context id='C'><period><instant>2025", "period"),
            ("<xbrl><unit id='U'><divide><unitNumerator>", "unit measures"),
            ("<xbrl><unit id='U'><divide>", "divide"),
            ("<xbrl><context id='C'><scenario>", "dimensions (scenario)"),
            ("<xbrl><context id='C'><entity><segment>", "dimensions (segment)"),
            ("<xbrl><ex:A contextRef='C'>1", "fact"),
            ("<xbrl>", "document"),
        ];
        for (xml, element) in cases {
            let err = parse(xml).unwrap_err();
            assert_eq!(err.element(), Some(element), "{xml}: {err}");
            assert!(err.to_string().starts_with("xbrl: parse "));
        }
    }

    #[test]
    fn periods_must_hold_exactly_one_form() {
        let period = |body: &str| {
            format!(
                "<xbrl><context id='C'><entity><identifier scheme='s'>E</identifier></entity>\
                 <period>{body}</period></context></xbrl>"
            )
        };
        for body in [
            "",
            "<startDate>2025-01-01</startDate>",
            "<instant>2025-01-01</instant><forever/>",
            "<instant>2025-01-01</instant><startDate>2025-01-01</startDate><endDate>2025-02-01</endDate>",
        ] {
            let err = parse(&period(body)).unwrap_err();
            assert!(matches!(err, Error::InvalidPeriod { .. }), "{body}: {err:?}");
        }

        let missing = parse("<xbrl><context id='C'><entity/></context></xbrl>").unwrap_err();
        assert!(matches!(missing, Error::InvalidPeriod { reason: "missing period", .. }));
    }

    #[test]
    fn fact_prefix_is_looked_up_from_its_namespace() {
        let xml = r#"<xbrl xmlns="urn:ex" xmlns:b="urn:ex" xmlns:a="urn:ex">
          <b:Written contextRef="C">1</b:Written>
          <Defaulted contextRef="C">2</Defaulted>
          <Bare xmlns="urn:other" contextRef="C">3</Bare>
        </xbrl>"#;
        let doc = parse(xml).unwrap();
        let prefixes: Vec<&str> = doc.facts().iter().map(|f| f.name().prefix()).collect();
        assert_eq!(prefixes, ["a", "a", ""]);
        assert_eq!(doc.facts()[0].name(), &QName::new("", "Written", "urn:ex"));
    }

    #[test]
    fn duplicate_ids_keep_the_last_definition() {
        let xml = r#"<xbrl>
          <unit id="U"><measure>a</measure></unit>
          <unit id="U"><measure>b</measure></unit>
        </xbrl>"#;
        let doc = parse(xml).unwrap();
        assert_eq!(doc.units().len(), 1);
        assert_eq!(doc.unit_by_id("U").unwrap().measures()[0].local(), "b");
    }

    #[test]
    fn byte_order_mark_is_skipped() {
        let mut data = vec![0xEF, 0xBB, 0xBF];
        data.extend_from_slice(MINIMAL_INSTANCE.as_bytes());
        let doc = Parser::new().parse_bytes(&data).unwrap();
        assert_eq!(doc.facts().len(), 1);
    }

    #[test]
    fn parse_file_reports_missing_files() {
        let err = Parser::new()
            .parse_file("this-file-does-not-exist-12345.xbrl")
            .unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
        assert!(err.to_string().starts_with("xbrl: open file"));
    }

    #[test]
    fn parse_file_reads_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instance.xbrl");
        std::fs::write(&path, MINIMAL_INSTANCE).unwrap();

        let doc = Parser::new().parse_file(&path).unwrap();
        assert_eq!(doc.facts().len(), 1);
        assert_eq!(doc.contexts().len(), 1);
    }
}
