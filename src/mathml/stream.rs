use std::collections::VecDeque;

use anyhow::{anyhow, Result};
use thiserror::Error;
use xml::common::Position;
use xml::reader::{EventReader, ParserConfig, XmlEvent};
use xml::writer::{self, EmitterConfig, EventWriter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub prefix: Option<String>,
    pub namespace: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlToken {
    Start {
        name: String,
        namespace: Option<String>,
        attributes: Vec<XmlAttribute>,
    },
    End {
        name: String,
    },
    Text(String),
}

impl XmlToken {
    pub fn is_start(&self) -> bool {
        matches!(self, XmlToken::Start { .. })
    }

    pub fn is_end(&self) -> bool {
        matches!(self, XmlToken::End { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self, XmlToken::Text(_))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            XmlToken::Start { name, .. } | XmlToken::End { name } => Some(name.as_str()),
            XmlToken::Text(_) => None,
        }
    }

    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        match self {
            XmlToken::Start { attributes, .. } => attributes
                .iter()
                .find(|attr| attr.name == local_name)
                .map(|attr| attr.value.as_str()),
            _ => None,
        }
    }

    pub fn attributes(&self) -> &[XmlAttribute] {
        match self {
            XmlToken::Start { attributes, .. } => attributes.as_slice(),
            _ => &[],
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            XmlToken::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedToken {
    pub token: XmlToken,
    pub line: u64,
    pub column: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {message}")]
pub struct XmlStreamError {
    pub message: String,
    pub line: u64,
    pub column: u64,
}

/// Cursor over an already tokenized XML fragment. Whitespace-only text is
/// dropped and remaining text is trimmed.
#[derive(Debug, Clone, Default)]
pub struct XmlInputStream {
    tokens: VecDeque<PositionedToken>,
    last_position: Option<(u64, u64)>,
}

impl XmlInputStream {
    pub fn parse(text: &str) -> Result<Self, XmlStreamError> {
        let config = ParserConfig::new()
            .trim_whitespace(true)
            .ignore_comments(true)
            .cdata_to_characters(true);
        let mut reader = EventReader::new_with_config(text.as_bytes(), config);
        let mut tokens = VecDeque::new();
        loop {
            let event = reader.next();
            let pos = reader.position();
            let (line, column) = (pos.row + 1, pos.column + 1);
            let token = match event {
                Ok(XmlEvent::StartElement {
                    name, attributes, ..
                }) => XmlToken::Start {
                    name: name.local_name,
                    namespace: name.namespace,
                    attributes: attributes
                        .into_iter()
                        .map(|attr| XmlAttribute {
                            name: attr.name.local_name,
                            prefix: attr.name.prefix,
                            namespace: attr.name.namespace,
                            value: attr.value,
                        })
                        .collect(),
                },
                Ok(XmlEvent::EndElement { name }) => XmlToken::End {
                    name: name.local_name,
                },
                Ok(XmlEvent::Characters(text)) | Ok(XmlEvent::CData(text)) => {
                    XmlToken::Text(text.trim().to_string())
                }
                Ok(XmlEvent::EndDocument) => break,
                Ok(_) => continue,
                Err(e) => {
                    return Err(XmlStreamError {
                        message: e.msg().to_string(),
                        line: e.position().row + 1,
                        column: e.position().column + 1,
                    })
                }
            };
            tokens.push_back(PositionedToken {
                token,
                line,
                column,
            });
        }
        Ok(Self {
            tokens,
            last_position: None,
        })
    }

    pub fn from_tokens(tokens: Vec<XmlToken>) -> Self {
        Self {
            tokens: tokens
                .into_iter()
                .map(|token| PositionedToken {
                    token,
                    line: 0,
                    column: 0,
                })
                .collect(),
            last_position: None,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn peek(&self) -> Option<&XmlToken> {
        self.tokens.front().map(|t| &t.token)
    }

    pub fn next(&mut self) -> Option<XmlToken> {
        let next = self.tokens.pop_front()?;
        self.last_position = Some((next.line, next.column));
        Some(next.token)
    }

    /// Location of the next token, or of the last one if the stream is
    /// exhausted.
    pub fn position(&self) -> Option<(u64, u64)> {
        self.tokens
            .front()
            .map(|t| (t.line, t.column))
            .or(self.last_position)
            .filter(|&(line, _)| line > 0)
    }

    pub fn last_position(&self) -> Option<(u64, u64)> {
        self.last_position.filter(|&(line, _)| line > 0)
    }

    pub fn peek_is_start(&self, name: &str) -> bool {
        matches!(self.peek(), Some(XmlToken::Start { name: n, .. }) if n == name)
    }

    pub fn peek_is_end(&self, name: &str) -> bool {
        matches!(self.peek(), Some(XmlToken::End { name: n }) if n == name)
    }

    pub fn skip_text(&mut self) {
        while matches!(self.peek(), Some(XmlToken::Text(_))) {
            self.next();
        }
    }

    /// Collects consecutive text tokens.
    pub fn read_text(&mut self) -> String {
        let mut text = String::new();
        while let Some(XmlToken::Text(t)) = self.peek() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(t);
            self.next();
        }
        text
    }

    /// Consumes tokens up to and including the end tag `name` that closes the
    /// currently open element, skipping any nested content.
    pub fn skip_past_end(&mut self, name: &str) {
        let mut depth = 0usize;
        while let Some(token) = self.next() {
            match token {
                XmlToken::Start { .. } => depth += 1,
                XmlToken::End { name: n } => {
                    if depth == 0 && n == name {
                        return;
                    }
                    depth = depth.saturating_sub(1);
                }
                XmlToken::Text(_) => (),
            }
        }
    }
}

struct PendingElement {
    name: String,
    attributes: Vec<(String, String)>,
    namespaces: Vec<(Option<String>, String)>,
}

/// XML sink with the start-element / attribute / end-element protocol.
/// Attributes and namespace declarations apply to the most recently started
/// element until its content or end is written.
pub struct XmlOutputStream {
    writer: EventWriter<Vec<u8>>,
    pending: Option<PendingElement>,
    // declared on the next element started
    deferred_namespaces: Vec<(Option<String>, String)>,
}

impl XmlOutputStream {
    pub fn new(indent: bool) -> Self {
        let config = EmitterConfig::new()
            .perform_indent(indent)
            .write_document_declaration(false);
        Self {
            writer: EventWriter::new_with_config(Vec::new(), config),
            pending: None,
            deferred_namespaces: Vec::new(),
        }
    }

    fn flush_pending(&mut self) -> Result<()> {
        if let Some(pending) = self.pending.take() {
            let mut event = writer::XmlEvent::start_element(pending.name.as_str());
            for (prefix, uri) in &pending.namespaces {
                event = match prefix {
                    Some(prefix) => event.ns(prefix.as_str(), uri.as_str()),
                    None => event.default_ns(uri.as_str()),
                };
            }
            for (name, value) in &pending.attributes {
                event = event.attr(name.as_str(), value.as_str());
            }
            self.writer.write(event)?;
        }
        Ok(())
    }

    pub fn start_element(&mut self, name: &str) -> Result<()> {
        self.flush_pending()?;
        self.pending = Some(PendingElement {
            name: name.to_string(),
            attributes: Vec::new(),
            namespaces: std::mem::take(&mut self.deferred_namespaces),
        });
        Ok(())
    }

    /// Declares a namespace on whichever element is started next.
    pub fn declare_on_next_element(&mut self, prefix: Option<&str>, uri: &str) {
        self.deferred_namespaces
            .push((prefix.map(str::to_string), uri.to_string()));
    }

    pub fn write_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        match self.pending.as_mut() {
            Some(pending) => {
                pending.attributes.push((name.to_string(), value.to_string()));
                Ok(())
            }
            None => Err(anyhow!("attribute '{}' written outside a start tag", name)),
        }
    }

    pub fn write_namespace(&mut self, prefix: Option<&str>, uri: &str) -> Result<()> {
        match self.pending.as_mut() {
            Some(pending) => {
                pending
                    .namespaces
                    .push((prefix.map(str::to_string), uri.to_string()));
                Ok(())
            }
            None => Err(anyhow!("namespace '{}' declared outside a start tag", uri)),
        }
    }

    pub fn write_characters(&mut self, text: &str) -> Result<()> {
        self.flush_pending()?;
        self.writer.write(writer::XmlEvent::characters(text))?;
        Ok(())
    }

    pub fn end_element(&mut self, name: &str) -> Result<()> {
        self.flush_pending()?;
        self.writer
            .write(writer::XmlEvent::end_element().name(name))?;
        Ok(())
    }

    /// Writes `<name/>`.
    pub fn start_end_element(&mut self, name: &str) -> Result<()> {
        self.start_element(name)?;
        self.end_element(name)
    }

    pub fn into_string(mut self) -> Result<String> {
        self.flush_pending()?;
        Ok(String::from_utf8(self.writer.into_inner())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_and_trims() {
        let mut stream =
            XmlInputStream::parse("<apply>\n  <plus/>\n  <ci> x </ci>\n</apply>").unwrap();
        assert!(stream.peek_is_start("apply"));
        assert!(stream.position().is_some());
        stream.next();
        assert!(stream.peek_is_start("plus"));
        stream.next();
        assert!(stream.peek_is_end("plus"));
        stream.next();
        stream.next();
        assert_eq!(stream.read_text(), "x");
        assert!(stream.peek_is_end("ci"));
    }

    #[test]
    fn skip_past_end_handles_nesting() {
        let mut stream =
            XmlInputStream::parse("<a><b><a/></b><c/></a><d/>").unwrap();
        stream.next();
        stream.skip_past_end("a");
        assert!(stream.peek_is_start("d"));
    }

    #[test]
    fn reports_malformed_xml() {
        let err = XmlInputStream::parse("<apply><plus/></times>").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn writes_nested_elements() {
        let mut out = XmlOutputStream::new(false);
        out.start_element("cn").unwrap();
        out.write_attribute("type", "integer").unwrap();
        out.write_characters(" 3 ").unwrap();
        out.end_element("cn").unwrap();
        let text = out.into_string().unwrap();
        assert_eq!(text, "<cn type=\"integer\"> 3 </cn>");
        let mut out = XmlOutputStream::new(false);
        assert!(out.write_attribute("type", "real").is_err());
    }
}
