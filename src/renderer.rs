// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Netscape bookmark markup generation for bookmark trees.
//!
//! This module turns a list of [`BookmarkNode`]s back into the markup
//! dialect every browser can import. The output is byte-for-byte the layout
//! importers expect:
//!
//! ```text
//! <!DOCTYPE NETSCAPE-Bookmark-file-1>
//! <!-- This is an automatically generated file. Do not edit! -->
//! <META HTTP-EQUIV="Content-Type" CONTENT="text/html; charset=UTF-8">
//! <TITLE>Bookmarks</TITLE>
//! <H1>Bookmarks</H1>
//! <DL><p>
//!     <DT><H3 ADD_DATE="1" LAST_MODIFIED="2">Folder</H3>
//!     <DL><p>
//!         <DT><A HREF="https://example.com" ADD_DATE="3" ICON="">Link</A>
//!     </DL><p>
//! </DL><p>
//! ```
//!
//! Every item line carries its attributes even when the tree does not have
//! them: missing dates and icons are written as `""`, a missing `HREF` as
//! `"#"`. Only `PERSONAL_TOOLBAR_FOLDER` is left out when absent.
//!
//! # Example
//!
//! ```
//! use bmconv::bookmark::{BookmarkNode, Link};
//! use bmconv::renderer::{render, RenderOptions};
//!
//! let nodes = vec![BookmarkNode::Link(Link {
//!     name: "Rust".into(),
//!     href: Some("https://www.rust-lang.org/".into()),
//!     ..Link::default()
//! })];
//!
//! let html = render(&nodes, &RenderOptions::default());
//! assert!(html.contains(r#"    <DT><A HREF="https://www.rust-lang.org/" ADD_DATE="" ICON="">Rust</A>"#));
//! ```

use crate::bookmark::{self, BookmarkNode, Folder, Link};
use quick_xml::escape::escape;
use snafu::prelude::*;
use std::borrow::Cow;
use std::fmt::Write;

/// Fixed lines preceding the bookmark list.
const HEADER: [&str; 5] = [
    "<!DOCTYPE NETSCAPE-Bookmark-file-1>",
    "<!-- This is an automatically generated file. Do not edit! -->",
    r#"<META HTTP-EQUIV="Content-Type" CONTENT="text/html; charset=UTF-8">"#,
    "<TITLE>Bookmarks</TITLE>",
    "<H1>Bookmarks</H1>",
];

const INDENT: &str = "    ";

/// `HREF` written for a link without a target.
const DEFAULT_HREF: &str = "#";

/// Error type for rendering a JSON document.
#[derive(Debug, Snafu)]
pub enum RenderError {
    /// The input is not a valid bookmark JSON document.
    #[snafu(display("invalid JSON: {source}"))]
    InvalidJson {
        /// The underlying JSON decoding error.
        source: serde_json::Error,
    },
}

/// Configuration options for markup rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Whether to escape `&`, `<`, `>` and quotes in names and attribute
    /// values.
    ///
    /// Off by default, which writes values exactly as stored. Turn it on
    /// when names may contain markup characters and the output has to parse
    /// back into the same tree.
    pub escape: bool,
}

/// Renders a bookmark tree as a complete bookmark document.
///
/// Lines are separated by `\n` and the document ends with the closing
/// `</DL><p>` without a trailing newline.
#[must_use]
pub fn render(nodes: &[BookmarkNode], opts: &RenderOptions) -> String {
    let mut out = String::new();
    for line in HEADER {
        writeln!(out, "{line}").unwrap();
    }

    writeln!(out, "<DL><p>").unwrap();
    for node in nodes {
        render_node(&mut out, node, 1, opts);
    }
    out.push_str("</DL><p>");

    out
}

/// Decodes a JSON bookmark document and renders it.
///
/// # Errors
///
/// Returns [`RenderError::InvalidJson`] if the document does not decode; no
/// partial output is produced in that case.
///
/// # Example
///
/// ```
/// use bmconv::renderer::{render_document, RenderError, RenderOptions};
///
/// let err = render_document("{not valid", &RenderOptions::default()).unwrap_err();
/// assert!(matches!(err, RenderError::InvalidJson { .. }));
/// ```
pub fn render_document(json: &str, opts: &RenderOptions) -> Result<String, RenderError> {
    let nodes = bookmark::from_json(json).context(InvalidJsonSnafu)?;
    Ok(render(&nodes, opts))
}

fn render_node(out: &mut String, node: &BookmarkNode, depth: usize, opts: &RenderOptions) {
    match node {
        BookmarkNode::Folder(folder) => render_folder(out, folder, depth, opts),
        BookmarkNode::Link(link) => render_link(out, link, depth, opts),
    }
}

fn render_folder(out: &mut String, folder: &Folder, depth: usize, opts: &RenderOptions) {
    let indent = INDENT.repeat(depth);

    write!(
        out,
        r#"{indent}<DT><H3 ADD_DATE="{}" LAST_MODIFIED="{}""#,
        value(folder.add_date.as_deref().unwrap_or_default(), opts),
        value(folder.last_modified.as_deref().unwrap_or_default(), opts),
    )
    .unwrap();
    if let Some(flag) = &folder.personal_toolbar_folder {
        write!(out, r#" PERSONAL_TOOLBAR_FOLDER="{}""#, value(flag, opts)).unwrap();
    }
    writeln!(out, ">{}</H3>", value(&folder.name, opts)).unwrap();

    if folder.children.is_empty() {
        return;
    }

    writeln!(out, "{indent}<DL><p>").unwrap();
    for child in &folder.children {
        render_node(out, child, depth + 1, opts);
    }
    writeln!(out, "{indent}</DL><p>").unwrap();
}

fn render_link(out: &mut String, link: &Link, depth: usize, opts: &RenderOptions) {
    let indent = INDENT.repeat(depth);

    writeln!(
        out,
        r#"{indent}<DT><A HREF="{}" ADD_DATE="{}" ICON="{}">{}</A>"#,
        value(link.href.as_deref().unwrap_or(DEFAULT_HREF), opts),
        value(link.add_date.as_deref().unwrap_or_default(), opts),
        value(link.icon.as_deref().unwrap_or_default(), opts),
        value(&link.name, opts),
    )
    .unwrap();
}

fn value<'a>(raw: &'a str, opts: &RenderOptions) -> Cow<'a, str> {
    if opts.escape {
        escape(raw)
    } else {
        Cow::Borrowed(raw)
    }
}
