// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Lenient document tree for Netscape bookmark markup.
//!
//! Bookmark exports look like HTML but are far from well-formed: `<DT>` and
//! `<p>` are never closed, tag names are upper case, and `<META>` has no end
//! tag. This module tokenizes the text with `quick-xml` (end-name checking
//! off) and rebuilds the element tree with the handful of implicit-close
//! rules the format relies on:
//!
//! - `<DT>`, `<DD>` and `<DL>` close an open `<DT>`/`<DD>` of the enclosing
//!   list, so a folder's nested `<DL>` ends up as the *next sibling* of the
//!   folder's `<DT>`, never inside it.
//! - `<P>`, `<META>`, `<HR>`, `<BR>`, `<IMG>`, `<INPUT>` and `<LINK>` never
//!   have children.
//! - An end tag closes the nearest open element with that name along with
//!   everything opened after it. End tags with no open match are dropped.
//! - A `<` not followed by a letter, `/`, `!` or `?` is text, as in `1 < 2`.
//!
//! Element and attribute names are lower-cased. Entity references are
//! decoded one at a time; a reference that does not resolve is kept verbatim.

use quick_xml::Reader;
use quick_xml::escape::resolve_html5_entity;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;
use tracing::debug;

/// Elements that never contain anything.
const VOID_ELEMENTS: &[&str] = &["p", "meta", "hr", "br", "img", "input", "link"];

/// Name of the synthetic element at the top of every parsed document.
const DOCUMENT: &str = "#document";

/// A node in the parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A nested element.
    Element(Element),
    /// Character data, entity references already decoded.
    Text(String),
}

/// An element with its attributes and children in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn new(name: String, attributes: Vec<(String, String)>) -> Self {
        Self {
            name,
            attributes,
            children: Vec::new(),
        }
    }

    fn document() -> Self {
        Self::new(DOCUMENT.to_owned(), Vec::new())
    }

    /// Lower-cased tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if this element has the given (lower-case) name.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Looks up an attribute by its lower-case name.
    ///
    /// When an attribute is repeated the first occurrence wins.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over the direct child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Returns the first direct child element with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.elements().find(|element| element.is(name))
    }

    /// Finds the first descendant with the given name in document order.
    ///
    /// Returns the matching element's parent together with the match's
    /// position among the parent's [`elements`](Self::elements), so callers
    /// can look at the following siblings.
    #[must_use]
    pub fn locate(&self, name: &str) -> Option<(&Self, usize)> {
        for (index, child) in self.elements().enumerate() {
            if child.is(name) {
                return Some((self, index));
            }
            if let Some(found) = child.locate(name) {
                return Some(found);
            }
        }
        None
    }

    /// Finds the first descendant with the given name in document order.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Self> {
        let (parent, index) = self.locate(name)?;
        parent.elements().nth(index)
    }

    /// Concatenated text of all descendants with surrounding whitespace
    /// trimmed.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.trim().to_owned()
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }
}

/// Rebuilds the element tree from a flat event stream.
///
/// `open[0]` is the document element and is never popped before
/// [`finish`](Self::finish).
struct TreeBuilder {
    open: Vec<Element>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            open: vec![Element::document()],
        }
    }

    fn start(&mut self, element: Element) {
        if matches!(element.name(), "dt" | "dd" | "dl") {
            self.close_open_item();
        }

        if VOID_ELEMENTS.contains(&element.name()) {
            self.attach(Node::Element(element));
        } else {
            self.open.push(element);
        }
    }

    fn empty(&mut self, element: Element) {
        self.attach(Node::Element(element));
    }

    fn end(&mut self, name: &str) {
        if VOID_ELEMENTS.contains(&name) {
            return;
        }
        if let Some(pos) = self.open.iter().rposition(|element| element.is(name))
            && pos > 0
        {
            self.close_from(pos);
        }
    }

    fn text(&mut self, text: String) {
        if !text.is_empty() {
            self.attach(Node::Text(text));
        }
    }

    /// Closes the innermost open `<dt>`/`<dd>` unless a `<dl>` was opened
    /// after it.
    fn close_open_item(&mut self) {
        let innermost = self
            .open
            .iter()
            .rposition(|element| matches!(element.name(), "dt" | "dd" | "dl"));

        if let Some(pos) = innermost
            && !self.open[pos].is("dl")
        {
            self.close_from(pos);
        }
    }

    /// Pops `open[pos..]`, attaching each element to the one below it.
    fn close_from(&mut self, pos: usize) {
        while self.open.len() > pos.max(1) {
            if let Some(element) = self.open.pop() {
                self.attach(Node::Element(element));
            }
        }
    }

    fn attach(&mut self, node: Node) {
        if let Some(parent) = self.open.last_mut() {
            parent.children.push(node);
        }
    }

    fn finish(mut self) -> Element {
        self.close_from(1);
        self.open.pop().unwrap_or_else(Element::document)
    }
}

/// Longest entity reference looked at, `&` and `;` excluded.
const MAX_ENTITY_LEN: usize = 32;

/// Decodes entity references one at a time.
///
/// A reference that does not resolve, or an `&` with no `;` after it, is
/// kept as written while the rest of the value is still decoded.
fn decode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let resolved = rest
            .bytes()
            .skip(1)
            .take(MAX_ENTITY_LEN + 1)
            .position(|b| b == b';')
            .filter(|&end| end > 0)
            .and_then(|end| resolve_entity(&rest[1..=end]).map(|text| (text, end + 2)));

        match resolved {
            Some((text, consumed)) => {
                out.push_str(&text);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Resolves the body of one `&...;` reference, named or numeric.
fn resolve_entity(entity: &str) -> Option<Cow<'static, str>> {
    if let Some(number) = entity.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).map(|c| Cow::Owned(c.to_string()));
    }
    resolve_html5_entity(entity).map(Cow::Borrowed)
}

/// Rewrites each `<` that cannot start markup as `&lt;`.
///
/// The tokenizer would otherwise read `1 < 2` or `a <3 b` as the start of a
/// tag. Browsers treat such a `<` as text, so it is turned into a reference
/// that [`decode`] restores.
fn escape_stray_angles(markup: &str) -> Cow<'_, str> {
    let starts_markup = |next: Option<char>| {
        next.is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
    };

    let mut chars = markup.char_indices().peekable();
    let mut out: Option<String> = None;
    let mut copied = 0;

    while let Some((index, c)) = chars.next() {
        if c == '<' && !starts_markup(chars.peek().map(|&(_, next)| next)) {
            let out = out.get_or_insert_with(|| String::with_capacity(markup.len() + 16));
            out.push_str(&markup[copied..index]);
            out.push_str("&lt;");
            copied = index + 1;
        }
    }

    match out {
        Some(mut out) => {
            out.push_str(&markup[copied..]);
            Cow::Owned(out)
        }
        None => Cow::Borrowed(markup),
    }
}

fn element_from(start: &BytesStart<'_>) -> Element {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
    let attributes = start
        .html_attributes()
        .filter_map(Result::ok)
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
            let value = decode(&String::from_utf8_lossy(&attr.value));
            (key, value)
        })
        .collect();
    Element::new(name, attributes)
}

/// Parses markup into a document tree.
///
/// Never fails: a tokenizer error ends the document at that point and
/// everything read so far is kept. The returned element is a synthetic
/// document root whose children are the top-level nodes.
///
/// # Example
///
/// ```
/// use bmconv::markup::parse;
///
/// let doc = parse("<DL><p><DT><A HREF=\"https://a\">A</A></DL><p>");
/// let list = doc.find("dl").unwrap();
/// let link = list.child("dt").and_then(|dt| dt.child("a")).unwrap();
/// assert_eq!(link.attribute("href"), Some("https://a"));
/// ```
#[must_use]
pub fn parse(markup: &str) -> Element {
    let markup = escape_stray_angles(markup);
    let mut reader = Reader::from_str(&markup);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut builder = TreeBuilder::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => builder.start(element_from(&e)),
            Ok(Event::Empty(e)) => builder.empty(element_from(&e)),
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                builder.end(&name);
            }
            Ok(Event::Text(e)) => builder.text(decode(&String::from_utf8_lossy(&e))),
            Ok(Event::CData(e)) => builder.text(String::from_utf8_lossy(&e).into_owned()),
            Ok(Event::Eof) => break,
            Err(err) => {
                debug!(
                    position = reader.buffer_position(),
                    error = %err,
                    "stopped reading markup early"
                );
                break;
            }
            // Declarations, comments, doctype and processing instructions
            _ => {}
        }
    }

    builder.finish()
}
