//! JSON rendering of facts.

use crate::model::{Document, Fact};
use serde::Serialize;
use std::io::Write;

/// One exported fact. `value` is empty for nil facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactJson {
    pub name: String,
    pub value: String,
    pub context: String,
    pub unit: String,
    pub nil: bool,
}

impl From<&Fact> for FactJson {
    fn from(fact: &Fact) -> Self {
        Self {
            name: fact.name().to_string(),
            value: if fact.is_nil() {
                String::new()
            } else {
                fact.value().to_owned()
            },
            context: fact.context_ref().to_owned(),
            unit: fact.unit_ref().to_owned(),
            nil: fact.is_nil(),
        }
    }
}

/// Write `facts` as a JSON array followed by a newline. Pretty output
/// indents by two spaces.
pub fn encode_facts_json<'a, W, I>(mut writer: W, facts: I, pretty: bool) -> serde_json::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Fact>,
{
    let dtos: Vec<FactJson> = facts.into_iter().map(FactJson::from).collect();
    if pretty {
        serde_json::to_writer_pretty(&mut writer, &dtos)?;
    } else {
        serde_json::to_writer(&mut writer, &dtos)?;
    }
    writer.write_all(b"\n").map_err(serde_json::Error::io)
}

impl Document {
    pub fn facts_as_json_dtos(&self) -> Vec<FactJson> {
        self.facts().iter().map(FactJson::from).collect()
    }

    pub fn encode_facts_json<W: Write>(&self, writer: W, pretty: bool) -> serde_json::Result<()> {
        encode_facts_json(writer, self.facts(), pretty)
    }
}
