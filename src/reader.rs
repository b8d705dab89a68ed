// Scoped token reader shared by the instance and taxonomy parsers.
//
// Wraps a quick-xml reader, turns its borrowed events into owned tokens and
// keeps a NamespaceStack in lockstep: a start tag pushes before it is handed
// out, an end tag pops on the *next* call so the closing element's own scope
// is still visible while the caller handles the end.

use std::borrow::Cow;
use std::io::BufRead;
use std::str;

use compact_str::CompactString;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::PrefixDeclaration;

use crate::model::QName;
use crate::namespace::NamespaceStack;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub(crate) struct Attr {
    pub local: CompactString,
    pub uri: CompactString,
    pub value: String,
}

#[derive(Debug, Clone)]
pub(crate) struct StartTag {
    pub prefix: CompactString,
    pub local: CompactString,
    pub uri: CompactString,
    pub attrs: Vec<Attr>,
    /// Tag content between `<` and `>` exactly as written.
    raw: String,
}

impl StartTag {
    pub fn name(&self) -> QName {
        QName::new(self.prefix.clone(), self.local.clone(), self.uri.clone())
    }

    /// First attribute with the given local name, whatever its namespace.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.local == local)
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, local: &str) -> bool {
        self.attrs.iter().any(|a| a.local == local)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Text {
    Escaped(String),
    CData(String),
}

impl Text {
    pub fn unescaped(&self) -> Result<Cow<'_, str>> {
        match self {
            Text::Escaped(raw) => {
                quick_xml::escape::unescape(raw).map_err(|e| Error::Decode(e.into()))
            }
            Text::CData(raw) => Ok(Cow::Borrowed(raw)),
        }
    }

    fn write_raw(&self, out: &mut String) {
        match self {
            Text::Escaped(raw) => out.push_str(raw),
            Text::CData(raw) => {
                out.push_str("<![CDATA[");
                out.push_str(raw);
                out.push_str("]]>");
            }
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Token {
    Start(StartTag),
    /// Qualified name of the closing tag as written.
    End(CompactString),
    Text(Text),
    Eof,
}

pub(crate) struct ScopedReader<R> {
    reader: quick_xml::Reader<R>,
    buf: Vec<u8>,
    ns: NamespaceStack,
    pending_pop: bool,
    /// End token owed for a self-closing tag.
    pending_end: Option<CompactString>,
}

impl<R: BufRead> ScopedReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: quick_xml::Reader::from_reader(inner),
            buf: Vec::with_capacity(4096),
            ns: NamespaceStack::new(),
            pending_pop: false,
            pending_end: None,
        }
    }

    pub fn namespaces(&self) -> &NamespaceStack {
        &self.ns
    }

    /// Elements opened and not yet closed.
    pub fn open_elements(&self) -> usize {
        self.ns.depth() - usize::from(self.pending_pop)
    }

    pub fn next_token(&mut self) -> Result<Token> {
        if self.pending_pop {
            self.ns.pop();
            self.pending_pop = false;
        }
        if let Some(name) = self.pending_end.take() {
            self.pending_pop = true;
            return Ok(Token::End(name));
        }

        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => return Ok(Token::Start(start_tag(&e, &mut self.ns)?)),
                Event::Empty(e) => {
                    let tag = start_tag(&e, &mut self.ns)?;
                    self.pending_end = Some(CompactString::from(str::from_utf8(e.name().as_ref())?));
                    return Ok(Token::Start(tag));
                }
                Event::End(e) => {
                    let name = CompactString::from(str::from_utf8(e.name().as_ref())?);
                    self.pending_pop = true;
                    return Ok(Token::End(name));
                }
                Event::Text(t) => return Ok(Token::Text(Text::Escaped(str::from_utf8(&t)?.to_owned()))),
                Event::CData(c) => return Ok(Token::Text(Text::CData(str::from_utf8(&c)?.to_owned()))),
                Event::Eof => return Ok(Token::Eof),
                // declarations, comments, processing instructions, doctype
                _ => continue,
            }
        }
    }

    /// Discard the rest of an element whose start tag was just consumed.
    pub fn skip(&mut self, element: &'static str) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.next_token()? {
                Token::Start(_) => depth += 1,
                Token::End(_) if depth == 0 => return Ok(()),
                Token::End(_) => depth -= 1,
                Token::Text(_) => {}
                Token::Eof => return Err(Error::UnexpectedEof { element }),
            }
        }
    }

    /// Character data of an element whose start tag was just consumed, up to
    /// and including its end tag. Text inside child elements is not included.
    pub fn read_text(&mut self, element: &'static str) -> Result<String> {
        let mut text = String::new();
        let mut depth = 0usize;
        loop {
            match self.next_token()? {
                Token::Start(_) => depth += 1,
                Token::End(_) if depth == 0 => return Ok(text),
                Token::End(_) => depth -= 1,
                Token::Text(t) if depth == 0 => text.push_str(&t.unescaped()?),
                Token::Text(_) => {}
                Token::Eof => return Err(Error::UnexpectedEof { element }),
            }
        }
    }

    /// Inner markup of an element whose start tag was just consumed, rebuilt
    /// from the token stream. Self-closing children come back as start/end pairs.
    pub fn read_inner_xml(&mut self, element: &'static str) -> Result<String> {
        let mut xml = String::new();
        let mut depth = 0usize;
        loop {
            match self.next_token()? {
                Token::Start(tag) => {
                    depth += 1;
                    xml.push('<');
                    xml.push_str(&tag.raw);
                    xml.push('>');
                }
                Token::End(_) if depth == 0 => return Ok(xml),
                Token::End(name) => {
                    depth -= 1;
                    xml.push_str("</");
                    xml.push_str(&name);
                    xml.push('>');
                }
                Token::Text(t) => t.write_raw(&mut xml),
                Token::Eof => return Err(Error::UnexpectedEof { element }),
            }
        }
    }
}

fn start_tag(e: &BytesStart<'_>, ns: &mut NamespaceStack) -> Result<StartTag> {
    let mut declarations: Vec<(CompactString, String)> = Vec::new();
    let mut plain = Vec::new();

    for attr in e.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.into_owned();
        match attr.key.as_namespace_binding() {
            Some(PrefixDeclaration::Default) => declarations.push((CompactString::default(), value)),
            Some(PrefixDeclaration::Named(prefix)) => {
                declarations.push((CompactString::from(str::from_utf8(prefix)?), value))
            }
            None => {
                let prefix = match attr.key.prefix() {
                    Some(p) => CompactString::from(str::from_utf8(p.as_ref())?),
                    None => CompactString::default(),
                };
                let local = CompactString::from(str::from_utf8(attr.key.local_name().as_ref())?);
                plain.push((prefix, local, value));
            }
        }
    }

    ns.push(declarations);

    // Unprefixed attributes are in no namespace; the default namespace does not apply.
    let attrs = plain
        .into_iter()
        .map(|(prefix, local, value)| Attr {
            uri: if prefix.is_empty() {
                CompactString::default()
            } else {
                CompactString::from(ns.uri_for_prefix(&prefix))
            },
            local,
            value,
        })
        .collect();

    let name = e.name();
    let prefix = match name.prefix() {
        Some(p) => CompactString::from(str::from_utf8(p.as_ref())?),
        None => CompactString::default(),
    };
    let local = CompactString::from(str::from_utf8(name.local_name().as_ref())?);
    let uri = CompactString::from(ns.uri_for_prefix(&prefix));

    Ok(StartTag {
        prefix,
        local,
        uri,
        attrs,
        raw: str::from_utf8(e)?.to_owned(),
    })
}
