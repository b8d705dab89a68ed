//! xbrlstream - streaming XBRL instance and taxonomy schema parser
//!
//! Licensed under AGPL-3.0

use std::path::PathBuf;

pub mod export;
pub mod filter;
pub mod model;
pub mod namespace;
pub mod normalize;
pub mod parser;
mod reader;
pub mod schema;
pub mod taxonomy;
pub mod value;

pub use filter::FactFilter;
pub use model::{
    Context, Dimension, Document, Entity, Fact, FactKind, Identifier, Period, QName, SchemaRef,
    Unit, UnitType,
};
pub use normalize::normalize_space;
pub use parser::Parser;
pub use schema::{parse_taxonomy, parse_taxonomy_file, SchemaFileOpener};
pub use taxonomy::{Concept, Taxonomy};
pub use value::{ValueError, ValueKind};

/// Namespace of the XBRL 2.1 instance vocabulary.
pub const NS_XBRLI: &str = "http://www.xbrl.org/2003/instance";
/// Namespace of the XML Schema vocabulary.
pub const NS_XSD: &str = "http://www.w3.org/2001/XMLSchema";
/// Namespace of the XML Schema instance vocabulary (`xsi:nil`).
pub const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("xbrl: open file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("xbrl: io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("xbrl: decode token: {0}")]
    Decode(#[from] quick_xml::Error),

    #[error("xbrl: decode token: invalid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("xbrl: parse {element}: unexpected end of input")]
    UnexpectedEof { element: &'static str },

    #[error("xbrl: parse period of context {context:?}: {reason}")]
    InvalidPeriod { context: String, reason: &'static str },

    #[error("xbrl: open schemaRef {href:?}: {source}")]
    OpenSchemaRef {
        href: String,
        #[source]
        source: std::io::Error,
    },

    #[error("xbrl: parse schemaRef {href:?}: {source}")]
    ParseSchemaRef {
        href: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Name of the structural element being parsed when the failure happened.
    pub fn element(&self) -> Option<&'static str> {
        match self {
            Error::UnexpectedEof { element } => Some(*element),
            Error::InvalidPeriod { .. } => Some("period"),
            _ => None,
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Decode(err.into())
    }
}
