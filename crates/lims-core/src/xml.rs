//! XML codec for [`Element`] trees.
//!
//! The writer carries its own prefix table: namespaces found in the
//! [`NamespaceMap`] are written with their registered prefix, any other
//! namespace gets a generated `ns0`, `ns1`, ... prefix. All declarations are
//! placed on the root element.

use crate::element::Element;
use crate::errors::{CoreError, Result};
use crate::namespaces::{split_qualified, NamespaceMap};
use log::{debug, trace};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::{NsReader, Writer};
use std::collections::BTreeMap;
use std::io::Write;

/// Serializes element trees with a fixed namespace table
#[derive(Debug, Clone)]
pub struct XmlWriter<'a> {
    namespaces: &'a NamespaceMap,
    indent: Option<usize>,
    declaration: bool,
}

impl Default for XmlWriter<'static> {
    fn default() -> Self {
        Self::new(NamespaceMap::standard())
    }
}

impl<'a> XmlWriter<'a> {
    pub fn new(namespaces: &'a NamespaceMap) -> Self {
        Self {
            namespaces,
            indent: None,
            declaration: true,
        }
    }

    /// Indent nested elements by `width` spaces
    pub fn indent(mut self, width: usize) -> Self {
        self.indent = Some(width);
        self
    }

    /// Emit the `<?xml ...?>` declaration (on by default)
    pub fn declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }

    pub fn to_bytes(&self, element: &Element) -> Result<Vec<u8>> {
        let mut writer = match self.indent {
            Some(width) => Writer::new_with_indent(Vec::new(), b' ', width),
            None => Writer::new(Vec::new()),
        };

        if self.declaration {
            writer.write_event(Event::Decl(BytesDecl::new(
                "1.0",
                Some("UTF-8"),
                Some("yes"),
            )))?;
        }

        let prefixes = self.assign_prefixes(element);
        write_element(&mut writer, element, &prefixes, true)?;
        Ok(writer.into_inner())
    }

    pub fn to_string(&self, element: &Element) -> Result<String> {
        let bytes = self.to_bytes(element)?;
        String::from_utf8(bytes).map_err(|e| CoreError::MalformedXml(e.to_string()))
    }

    /// Pick a prefix for every namespace used in the tree, in first-seen order
    fn assign_prefixes(&self, root: &Element) -> Vec<(String, String)> {
        let mut assigned: Vec<(String, String)> = Vec::new();
        let mut generated = 0;

        let mut visit = |name: &str| {
            if let (Some(uri), _) = split_qualified(name) {
                if assigned.iter().any(|(u, _)| u == uri) {
                    return;
                }
                let prefix = match self.namespaces.prefix(uri) {
                    Some(prefix) => prefix.to_string(),
                    None => loop {
                        let candidate = format!("ns{}", generated);
                        generated += 1;
                        if self.namespaces.uri(&candidate).is_none() {
                            break candidate;
                        }
                    },
                };
                assigned.push((uri.to_string(), prefix));
            }
        };

        for element in std::iter::once(root).chain(root.descendants()) {
            visit(element.tag());
            for name in element.attributes().keys() {
                visit(name);
            }
        }

        assigned
    }
}

fn qualified_name(name: &str, prefixes: &[(String, String)]) -> String {
    match split_qualified(name) {
        (Some(uri), local) => prefixes
            .iter()
            .find(|(u, _)| u == uri)
            .map(|(_, prefix)| format!("{}:{}", prefix, local))
            .unwrap_or_else(|| local.to_string()),
        (None, local) => local.to_string(),
    }
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    element: &Element,
    prefixes: &[(String, String)],
    is_root: bool,
) -> Result<()> {
    let name = qualified_name(element.tag(), prefixes);
    let mut start = BytesStart::new(name.as_str());

    if is_root {
        for (uri, prefix) in prefixes {
            let key = format!("xmlns:{}", prefix);
            start.push_attribute((key.as_str(), uri.as_str()));
        }
    }
    for (key, value) in element.attributes() {
        let key = qualified_name(key, prefixes);
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let text = element.text().filter(|t| !t.is_empty());
    if text.is_none() && element.children().is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in element.children() {
        write_element(writer, child, prefixes, false)?;
    }
    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
    Ok(())
}

/// Parse a complete XML document into its root element.
///
/// Whitespace-only text on elements that have children is dropped, as is
/// any text that follows a child element.
pub fn parse(xml: &[u8]) -> Result<Element> {
    let mut reader = NsReader::from_reader(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (namespace, event) = reader.read_resolved_event()?;
        let namespace = resolved_uri(namespace)?;

        match event {
            Event::Start(start) => {
                let element = start_element(&reader, namespace, &start)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = start_element(&reader, namespace, &start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| CoreError::MalformedXml("unexpected end tag".to_string()))?;
                if !element.children().is_empty()
                    && element.text().is_some_and(|t| t.trim().is_empty())
                {
                    element.set_text(None);
                }
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                append_text(&mut stack, &text);
            }
            Event::CData(data) => {
                let data = data.into_inner();
                append_text(&mut stack, &String::from_utf8_lossy(&data));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(CoreError::MalformedXml("unclosed element".to_string()));
    }
    let root = root.ok_or_else(|| CoreError::MalformedXml("no root element".to_string()))?;
    trace!("Parsed <{}> with {} children", root.tag(), root.children().len());
    Ok(root)
}

fn resolved_uri(namespace: ResolveResult) -> Result<Option<String>> {
    match namespace {
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8_lossy(ns.as_ref()).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(CoreError::MalformedXml(format!(
            "undeclared namespace prefix {}",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn qualify(namespace: Option<String>, local: &[u8]) -> Result<String> {
    let local = std::str::from_utf8(local).map_err(|e| CoreError::MalformedXml(e.to_string()))?;
    Ok(match namespace {
        Some(uri) => format!("{{{}}}{}", uri, local),
        None => local.to_string(),
    })
}

fn start_element(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart,
) -> Result<Element> {
    let tag = qualify(namespace, start.local_name().as_ref())?;

    let mut attributes = BTreeMap::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let (namespace, local) = reader.resolve_attribute(attribute.key);
        let key = qualify(resolved_uri(namespace)?, local.as_ref())?;
        let value = attribute.unescape_value()?.into_owned();
        attributes.insert(key, value);
    }

    Ok(Element::from_parts(tag, attributes))
}

/// Returns false when the text follows a child element and was not kept
fn append_text(stack: &mut [Element], text: &str) -> bool {
    let Some(current) = stack.last_mut() else {
        return false;
    };
    if !current.children().is_empty() {
        if !text.trim().is_empty() {
            debug!(
                "Dropping text after child element in <{}>: {:?}",
                current.tag(),
                text
            );
        }
        return false;
    }
    current
        .text_mut()
        .get_or_insert_with(String::new)
        .push_str(text);
    true
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push(element);
        }
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(CoreError::MalformedXml(
                "more than one root element".to_string(),
            ))
        }
    }
    Ok(())
}

impl Element {
    /// Parse a document into its root element
    pub fn parse(xml: &[u8]) -> Result<Element> {
        parse(xml)
    }

    /// Serialize with the standard namespace table
    pub fn to_xml_bytes(&self) -> Result<Vec<u8>> {
        XmlWriter::default().to_bytes(self)
    }

    pub fn to_xml_string(&self) -> Result<String> {
        XmlWriter::default().to_string(self)
    }

    /// Indented rendering for logs and terminals
    pub fn to_pretty_string(&self) -> Result<String> {
        XmlWriter::default().indent(4).to_string(self)
    }
}
