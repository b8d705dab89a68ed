//! Concept type classification and typed fact values.
//!
//! A concept's declared type is mapped onto a coarse [`ValueKind`] using two
//! fixed tables, one for the XBRL instance item types and one for the XML
//! Schema built-ins. The typed accessors check their preconditions in a fixed
//! order and report the first one that fails as a [`ValueError`].

use crate::model::{Document, Fact, QName};
use crate::taxonomy::Concept;
use crate::{NS_XBRLI, NS_XSD};
use bitflags::bitflags;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueKind {
    /// No concept to classify.
    #[default]
    Unknown,
    String,
    Numeric,
    Monetary,
    Boolean,
    Date,
    DateTime,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Unknown => "unknown",
            ValueKind::String => "string",
            ValueKind::Numeric => "numeric",
            ValueKind::Monetary => "monetary",
            ValueKind::Boolean => "boolean",
            ValueKind::Date => "date",
            ValueKind::DateTime => "dateTime",
        }
    }

    fn flag(self) -> KindSet {
        match self {
            ValueKind::Unknown => KindSet::empty(),
            ValueKind::String => KindSet::STRING,
            ValueKind::Numeric => KindSet::NUMERIC,
            ValueKind::Monetary => KindSet::MONETARY,
            ValueKind::Boolean => KindSet::BOOLEAN,
            ValueKind::Date => KindSet::DATE,
            ValueKind::DateTime => KindSet::DATE_TIME,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Kinds an accessor accepts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct KindSet: u8 {
        const STRING = 1 << 0;
        const NUMERIC = 1 << 1;
        const MONETARY = 1 << 2;
        const BOOLEAN = 1 << 3;
        const DATE = 1 << 4;
        const DATE_TIME = 1 << 5;

        const NUMBER = Self::NUMERIC.bits() | Self::MONETARY.bits();
        const TIME = Self::DATE.bits() | Self::DATE_TIME.bits();
    }
}

static XBRLI_TYPES: &[(&str, ValueKind)] = &[
    ("monetaryItemType", ValueKind::Monetary),
    ("sharesItemType", ValueKind::Numeric),
    ("perShareItemType", ValueKind::Numeric),
    ("decimalItemType", ValueKind::Numeric),
    ("integerItemType", ValueKind::Numeric),
    ("nonNegativeIntegerItemType", ValueKind::Numeric),
    ("nonPositiveIntegerItemType", ValueKind::Numeric),
    ("positiveIntegerItemType", ValueKind::Numeric),
    ("negativeIntegerItemType", ValueKind::Numeric),
    ("pureItemType", ValueKind::Numeric),
    ("fractionItemType", ValueKind::Numeric),
    ("booleanItemType", ValueKind::Boolean),
    ("dateItemType", ValueKind::Date),
    ("dateTimeItemType", ValueKind::DateTime),
    ("stringItemType", ValueKind::String),
];

static XSD_TYPES: &[(&str, ValueKind)] = &[
    ("decimal", ValueKind::Numeric),
    ("integer", ValueKind::Numeric),
    ("nonNegativeInteger", ValueKind::Numeric),
    ("nonPositiveInteger", ValueKind::Numeric),
    ("positiveInteger", ValueKind::Numeric),
    ("negativeInteger", ValueKind::Numeric),
    ("int", ValueKind::Numeric),
    ("long", ValueKind::Numeric),
    ("short", ValueKind::Numeric),
    ("byte", ValueKind::Numeric),
    ("unsignedInt", ValueKind::Numeric),
    ("unsignedLong", ValueKind::Numeric),
    ("unsignedShort", ValueKind::Numeric),
    ("unsignedByte", ValueKind::Numeric),
    ("float", ValueKind::Numeric),
    ("double", ValueKind::Numeric),
    ("boolean", ValueKind::Boolean),
    ("date", ValueKind::Date),
    ("dateTime", ValueKind::DateTime),
    ("string", ValueKind::String),
    ("normalizedString", ValueKind::String),
];

/// Classify a declared type. Anything not in the tables is a string.
pub fn classify(type_name: &QName) -> ValueKind {
    let table = match type_name.uri() {
        NS_XBRLI => XBRLI_TYPES,
        NS_XSD => XSD_TYPES,
        _ => return ValueKind::String,
    };
    table
        .iter()
        .find(|(local, _)| *local == type_name.local())
        .map_or(ValueKind::String, |(_, kind)| *kind)
}

/// Kind of an optional concept; [`ValueKind::Unknown`] when there is none.
pub fn value_kind_of(concept: Option<&Concept>) -> ValueKind {
    concept.map_or(ValueKind::Unknown, Concept::value_kind)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("xbrl: document is absent")]
    NoDocument,
    #[error("xbrl: no taxonomy attached to document")]
    NoTaxonomy,
    #[error("xbrl: fact is absent or nil")]
    NilOrMissingFact,
    #[error("xbrl: concept not found for fact")]
    NoConcept,
    #[error("xbrl: unsupported value type for this conversion")]
    UnsupportedType,
    #[error("xbrl: invalid lexical form for type")]
    InvalidValue,
}

/// Runs the shared precondition chain and hands back the trimmed value with its kind.
fn typed_value<'a>(
    doc: Option<&Document>,
    fact: Option<&'a Fact>,
    accepted: KindSet,
) -> Result<(&'a str, ValueKind), ValueError> {
    let doc = doc.ok_or(ValueError::NoDocument)?;
    let taxonomy = doc.taxonomy().ok_or(ValueError::NoTaxonomy)?;
    let fact = fact
        .filter(|f| !f.is_nil())
        .ok_or(ValueError::NilOrMissingFact)?;
    let concept = taxonomy
        .concept(fact.name())
        .ok_or(ValueError::NoConcept)?;

    let kind = concept.value_kind();
    if !accepted.intersects(kind.flag()) {
        return Err(ValueError::UnsupportedType);
    }
    Ok((fact.value().trim(), kind))
}

pub fn as_i64(doc: Option<&Document>, fact: Option<&Fact>) -> Result<i64, ValueError> {
    let (value, _) = typed_value(doc, fact, KindSet::NUMBER)?;
    if value.contains(['.', 'e', 'E']) {
        return Err(ValueError::InvalidValue);
    }
    value.parse().map_err(|_| ValueError::InvalidValue)
}

pub fn as_f64(doc: Option<&Document>, fact: Option<&Fact>) -> Result<f64, ValueError> {
    let (value, _) = typed_value(doc, fact, KindSet::NUMBER)?;
    value.parse().map_err(|_| ValueError::InvalidValue)
}

/// `true`/`1` and `false`/`0`, any letter case. Nothing else is accepted.
pub fn as_bool(doc: Option<&Document>, fact: Option<&Fact>) -> Result<bool, ValueError> {
    let (value, _) = typed_value(doc, fact, KindSet::BOOLEAN)?;
    if value.eq_ignore_ascii_case("true") || value == "1" {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") || value == "0" {
        Ok(false)
    } else {
        Err(ValueError::InvalidValue)
    }
}

/// Date or dateTime value as a timestamp.
///
/// Dates are midnight in `offset`. A dateTime with its own offset keeps that
/// instant and is shown in `offset`; one without is read as local time in
/// `offset`. `offset` defaults to UTC.
pub fn as_time(
    doc: Option<&Document>,
    fact: Option<&Fact>,
    offset: Option<FixedOffset>,
) -> Result<DateTime<FixedOffset>, ValueError> {
    let (value, kind) = typed_value(doc, fact, KindSet::TIME)?;
    let offset = offset.unwrap_or_else(|| Utc.fix());

    match kind {
        ValueKind::Date => {
            let date = parse_date(value).ok_or(ValueError::InvalidValue)?;
            local_in(offset, date.and_time(NaiveTime::MIN))
        }
        _ => {
            // Upper-case `T` separator and `Z` designator only.
            if value.as_bytes().get(10) != Some(&b'T') || value.ends_with('z') {
                return Err(ValueError::InvalidValue);
            }
            if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
                return Ok(ts.with_timezone(&offset));
            }
            let local = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .map_err(|_| ValueError::InvalidValue)?;
            local_in(offset, local)
        }
    }
}

fn local_in(offset: FixedOffset, local: NaiveDateTime) -> Result<DateTime<FixedOffset>, ValueError> {
    offset
        .from_local_datetime(&local)
        .single()
        .ok_or(ValueError::InvalidValue)
}

/// `YYYY-MM-DD` with exactly four year digits and two-digit month and day.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let b = s.as_bytes();
    let shape_ok = b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

impl Document {
    pub fn as_i64(&self, fact: &Fact) -> Result<i64, ValueError> {
        as_i64(Some(self), Some(fact))
    }

    pub fn as_f64(&self, fact: &Fact) -> Result<f64, ValueError> {
        as_f64(Some(self), Some(fact))
    }

    pub fn as_bool(&self, fact: &Fact) -> Result<bool, ValueError> {
        as_bool(Some(self), Some(fact))
    }

    pub fn as_time(
        &self,
        fact: &Fact,
        offset: Option<FixedOffset>,
    ) -> Result<DateTime<FixedOffset>, ValueError> {
        as_time(Some(self), Some(fact), offset)
    }
}
