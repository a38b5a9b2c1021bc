// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Parsing of Netscape bookmark markup into a bookmark tree.
//!
//! Browsers export bookmarks as a loose HTML dialect in which folders and
//! links are items of nested definition lists:
//!
//! ```html
//! <H1>Bookmarks</H1>
//! <DL><p>
//!     <DT><H3 ADD_DATE="1700000000" PERSONAL_TOOLBAR_FOLDER="true">Toolbar</H3>
//!     <DL><p>
//!         <DT><A HREF="https://www.rust-lang.org/" ADD_DATE="1700000001">Rust</A>
//!     </DL><p>
//! </DL><p>
//! ```
//!
//! An item holding an `<H3>` is a folder whose contents are the `<DL>` that
//! follows the item; an item holding an `<A>` is a link. Only direct children
//! are looked at on each level, so nested lists are visited exactly once.
//!
//! # Example
//!
//! ```
//! use bmconv::bookmark::BookmarkNode;
//! use bmconv::parser::parse;
//!
//! let html = r#"<H1>Bookmarks</H1>
//! <DL><p>
//!     <DT><A HREF="https://example.com" ADD_DATE="123">Example</A>
//! </DL><p>"#;
//!
//! let nodes = parse(html).unwrap();
//! assert_eq!(nodes.len(), 1);
//! assert!(matches!(&nodes[0], BookmarkNode::Link(link) if link.name == "Example"));
//! ```

use crate::bookmark::{BookmarkNode, Folder, Link};
use crate::markup::{self, Element};
use snafu::prelude::*;
use tracing::debug;

/// Error type for markup parsing failures.
#[derive(Debug, Snafu)]
pub enum ParseError {
    /// The document contains no bookmark list at all.
    #[snafu(display("no bookmark list (<DL>) found in the document"))]
    NoRootList,

    /// An attribute value was rejected.
    ///
    /// The parser copies attribute values verbatim and does not produce this
    /// today; it exists for callers that validate values themselves.
    #[snafu(display("invalid value for attribute {name}"))]
    InvalidAttribute {
        /// Lower-case name of the offending attribute.
        name: String,
    },
}

/// Parses bookmark markup into the top-level sequence of nodes.
///
/// The root list is the `<DL>` following the first `<H1>`; documents
/// without a heading fall back to the first `<DL>` anywhere. A root list
/// without items yields an empty vector.
///
/// # Errors
///
/// Returns [`ParseError::NoRootList`] if the document has no `<DL>`.
pub fn parse(markup: &str) -> Result<Vec<BookmarkNode>, ParseError> {
    let document = markup::parse(markup);
    let root = root_list(&document).context(NoRootListSnafu)?;
    Ok(parse_list(root))
}

fn root_list(document: &Element) -> Option<&Element> {
    document
        .locate("h1")
        .and_then(|(parent, index)| parent.elements().skip(index + 1).find(|e| e.is("dl")))
        .or_else(|| document.find("dl"))
}

/// Builds nodes from the direct `<DT>` children of a list.
fn parse_list(list: &Element) -> Vec<BookmarkNode> {
    let siblings: Vec<&Element> = list.elements().collect();

    siblings
        .iter()
        .enumerate()
        .filter(|(_, element)| element.is("dt"))
        .filter_map(|(index, item)| parse_item(item, &siblings[index + 1..]))
        .collect()
}

fn parse_item(item: &Element, following: &[&Element]) -> Option<BookmarkNode> {
    if let Some(heading) = item.child("h3") {
        let children = nested_list(following).map(parse_list).unwrap_or_default();
        return Some(BookmarkNode::Folder(Folder {
            name: heading.text(),
            add_date: owned_attribute(heading, "add_date"),
            last_modified: owned_attribute(heading, "last_modified"),
            personal_toolbar_folder: owned_attribute(heading, "personal_toolbar_folder"),
            children,
        }));
    }

    if let Some(anchor) = item.child("a") {
        return Some(BookmarkNode::Link(Link {
            name: anchor.text(),
            href: owned_attribute(anchor, "href"),
            add_date: owned_attribute(anchor, "add_date"),
            icon: owned_attribute(anchor, "icon"),
        }));
    }

    debug!(text = %item.text(), "skipping list item without heading or link");
    None
}

/// The `<DL>` belonging to a folder item: the first list among the item's
/// following siblings, up to the next item.
fn nested_list<'a>(following: &[&'a Element]) -> Option<&'a Element> {
    following
        .iter()
        .take_while(|element| !element.is("dt"))
        .find(|element| element.is("dl"))
        .copied()
}

fn owned_attribute(element: &Element, name: &str) -> Option<String> {
    element.attribute(name).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(body: &str) -> String {
        format!(
            "<!DOCTYPE NETSCAPE-Bookmark-file-1>\n\
             <META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=UTF-8\">\n\
             <TITLE>Bookmarks</TITLE>\n\
             <H1>Bookmarks</H1>\n\
             <DL><p>\n{body}\n</DL><p>\n"
        )
    }

    fn folder(node: &BookmarkNode) -> &Folder {
        match node {
            BookmarkNode::Folder(folder) => folder,
            other => panic!("Expected Folder, got {other:?}"),
        }
    }

    fn link(node: &BookmarkNode) -> &Link {
        match node {
            BookmarkNode::Link(link) => link,
            other => panic!("Expected Link, got {other:?}"),
        }
    }

    #[test]
    fn parses_link_attributes_verbatim() {
        let html = document(
            r#"    <DT><A HREF="https://x" ADD_DATE="123" ICON="data:image/png;base64,AAAA">  X  </A>"#,
        );
        let nodes = parse(&html).unwrap();

        assert_eq!(
            nodes,
            vec![BookmarkNode::Link(Link {
                name: "X".into(),
                href: Some("https://x".into()),
                add_date: Some("123".into()),
                icon: Some("data:image/png;base64,AAAA".into()),
            })]
        );
    }

    #[test]
    fn missing_link_attributes_are_absent() {
        let nodes = parse(&document("<DT><A>bare</A>")).unwrap();
        let link = link(&nodes[0]);

        assert_eq!(link.name, "bare");
        assert!(link.href.is_none());
        assert!(link.add_date.is_none());
        assert!(link.icon.is_none());
    }

    #[test]
    fn parses_folder_with_children() {
        let html = document(
            r#"    <DT><H3 ADD_DATE="1" LAST_MODIFIED="2">Dev</H3>
    <DL><p>
        <DT><A HREF="https://a">A</A>
        <DT><A HREF="https://b">B</A>
    </DL><p>"#,
        );
        let nodes = parse(&html).unwrap();
        let dev = folder(&nodes[0]);

        assert_eq!(nodes.len(), 1);
        assert_eq!(dev.name, "Dev");
        assert_eq!(dev.add_date.as_deref(), Some("1"));
        assert_eq!(dev.last_modified.as_deref(), Some("2"));
        let names: Vec<_> = dev.children.iter().map(BookmarkNode::name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn toolbar_flag_only_when_present() {
        let html = document(
            r#"<DT><H3 PERSONAL_TOOLBAR_FOLDER="true">Bar</H3>
<DT><H3>Other</H3>"#,
        );
        let nodes = parse(&html).unwrap();

        assert_eq!(folder(&nodes[0]).personal_toolbar_folder.as_deref(), Some("true"));
        assert!(folder(&nodes[1]).personal_toolbar_folder.is_none());
    }

    #[test]
    fn folder_without_list_is_empty() {
        let nodes = parse(&document("<DT><H3>Empty</H3>\n<DT><A HREF=\"#\">after</A>")).unwrap();

        assert_eq!(nodes.len(), 2);
        assert!(folder(&nodes[0]).children.is_empty());
        assert_eq!(link(&nodes[1]).name, "after");
    }

    #[test]
    fn folder_does_not_take_a_later_items_list() {
        let html = document(
            r"<DT><H3>First</H3>
<DT><H3>Second</H3>
<DL><p>
    <DT><A>inside second</A>
</DL><p>",
        );
        let nodes = parse(&html).unwrap();

        assert!(folder(&nodes[0]).children.is_empty());
        assert_eq!(folder(&nodes[1]).children.len(), 1);
    }

    #[test]
    fn description_between_heading_and_list_is_tolerated() {
        let html = document(
            r"<DT><H3>Notes</H3>
<DD>Folder description
<DL><p>
    <DT><A>child</A>
</DL><p>",
        );
        let nodes = parse(&html).unwrap();

        assert_eq!(folder(&nodes[0]).children.len(), 1);
    }

    #[test]
    fn keeps_document_order() {
        let html = document("<DT><A>z</A>\n<DT><H3>m</H3>\n<DT><A>a</A>");
        let nodes = parse(&html).unwrap();

        let names: Vec<_> = nodes.iter().map(BookmarkNode::name).collect();
        assert_eq!(names, vec!["z", "m", "a"]);
    }

    #[test]
    fn skips_items_without_heading_or_link() {
        let nodes = parse(&document("<DT>plain text\n<DT><HR>\n<DT><A>kept</A>")).unwrap();

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name(), "kept");
    }

    #[test]
    fn nested_three_levels_only_counts_direct_children() {
        let html = document(
            r"<DT><H3>L1</H3>
<DL><p>
    <DT><H3>L2</H3>
    <DL><p>
        <DT><H3>L3</H3>
        <DL><p>
            <DT><A>deep1</A>
            <DT><A>deep2</A>
        </DL><p>
    </DL><p>
    <DT><A>l1-link</A>
</DL><p>",
        );
        let nodes = parse(&html).unwrap();

        assert_eq!(nodes.len(), 1);
        let l1 = folder(&nodes[0]);
        let names: Vec<_> = l1.children.iter().map(BookmarkNode::name).collect();
        assert_eq!(names, vec!["L2", "l1-link"]);

        let l2 = folder(&l1.children[0]);
        assert_eq!(l2.children.len(), 1);
        let l3 = folder(&l2.children[0]);
        assert_eq!(l3.children.len(), 2);
    }

    #[test]
    fn empty_root_list_is_not_an_error() {
        let nodes = parse(&document("")).unwrap();

        assert!(nodes.is_empty());
    }

    #[test]
    fn falls_back_to_first_list_without_heading() {
        let nodes = parse("<DL><p><DT><A HREF=\"https://a\">A</A></DL><p>").unwrap();

        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn heading_without_sibling_list_falls_back() {
        let html = "<DIV><H1>Bookmarks</H1></DIV><DL><p><DT><A>A</A></DL><p>";
        let nodes = parse(html).unwrap();

        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn reports_missing_root_list() {
        let err = parse("<html><body><p>nothing here</p></body></html>").unwrap_err();

        assert!(matches!(err, ParseError::NoRootList));
        assert!(err.to_string().contains("no bookmark list"));
    }

    #[test]
    fn empty_input_has_no_root_list() {
        assert!(matches!(parse(""), Err(ParseError::NoRootList)));
    }

    #[test]
    fn lowercase_markup_is_accepted() {
        let html = r#"<h1>b</h1><dl><p><dt><a href="https://a" add_date="5">A</a></dl><p>"#;
        let nodes = parse(html).unwrap();

        assert_eq!(link(&nodes[0]).add_date.as_deref(), Some("5"));
    }
}
