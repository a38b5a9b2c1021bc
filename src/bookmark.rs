// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! The bookmark tree shared by both conversion directions.
//!
//! A bookmark export is an ordered sequence of [`BookmarkNode`]s. Each node
//! is either a [`Folder`] owning its children or a [`Link`] leaf.
//!
//! # JSON Format
//!
//! In JSON every node is an object carrying an explicit `type` tag:
//!
//! ```json
//! [
//!     {
//!         "type": "folder",
//!         "name": "Toolbar",
//!         "add_date": "1700000000",
//!         "last_modified": null,
//!         "personal_toolbar_folder": "true",
//!         "children": [
//!             {
//!                 "type": "bookmark",
//!                 "name": "Rust",
//!                 "href": "https://www.rust-lang.org/",
//!                 "add_date": "1700000001",
//!                 "icon": null
//!             }
//!         ]
//!     }
//! ]
//! ```
//!
//! Markup has no such tag; the [`parser`](crate::parser) infers the variant
//! from the element that is present instead. Both paths produce the same
//! enum, so the [`renderer`](crate::renderer) only ever matches on it.

use serde::ser::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name given to a decoded folder record without a `name` field.
pub const UNTITLED_FOLDER: &str = "Untitled Folder";

/// Name given to a decoded bookmark record without a `name` field.
pub const UNTITLED_BOOKMARK: &str = "Untitled Bookmark";

/// A single entry in a bookmark tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum BookmarkNode {
    /// A named container of further nodes.
    #[serde(rename = "folder")]
    Folder(Folder),

    /// A bookmarked URL.
    #[serde(rename = "bookmark")]
    Link(Link),
}

/// A bookmark folder.
///
/// Timestamps are kept as the raw attribute text. They are never parsed,
/// so whatever the exporting browser wrote survives unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Folder {
    /// Display name of the folder.
    pub name: String,

    /// Creation timestamp (`ADD_DATE`).
    pub add_date: Option<String>,

    /// Modification timestamp (`LAST_MODIFIED`).
    pub last_modified: Option<String>,

    /// Toolbar marker (`PERSONAL_TOOLBAR_FOLDER`).
    ///
    /// `None` when the attribute was not present at all. Unlike the other
    /// optional fields this one is left out of the JSON entirely when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_toolbar_folder: Option<String>,

    /// Child nodes in document order.
    pub children: Vec<BookmarkNode>,
}

/// A bookmarked URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Link {
    /// Display name of the bookmark.
    pub name: String,

    /// Target URL (`HREF`), copied verbatim.
    pub href: Option<String>,

    /// Creation timestamp (`ADD_DATE`).
    pub add_date: Option<String>,

    /// Favicon (`ICON`), usually a `data:` URI.
    pub icon: Option<String>,
}

impl BookmarkNode {
    /// Returns the display name of the node.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Folder(folder) => &folder.name,
            Self::Link(link) => &link.name,
        }
    }

    /// Decodes one JSON record, recursing into folder children.
    ///
    /// A record whose `type` is `"folder"` becomes a [`Folder`]; every other
    /// tag, including a missing one, becomes a [`Link`].
    fn from_value<E: serde::de::Error>(value: Value) -> Result<Self, E> {
        let mut record = match value {
            Value::Object(record) => record,
            other => {
                return Err(E::custom(format!(
                    "expected a bookmark record object, found {}",
                    kind_of(&other)
                )));
            }
        };

        let is_folder = record.get("type").and_then(Value::as_str) == Some("folder");

        if is_folder {
            let children = match record.remove("children") {
                Some(Value::Array(children)) => children
                    .into_iter()
                    .map(Self::from_value)
                    .collect::<Result<Vec<_>, E>>()?,
                _ => Vec::new(),
            };

            Ok(Self::Folder(Folder {
                name: take_attribute(&mut record, "name")
                    .unwrap_or_else(|| UNTITLED_FOLDER.to_owned()),
                add_date: take_attribute(&mut record, "add_date"),
                last_modified: take_attribute(&mut record, "last_modified"),
                personal_toolbar_folder: take_attribute(&mut record, "personal_toolbar_folder"),
                children,
            }))
        } else {
            Ok(Self::Link(Link {
                name: take_attribute(&mut record, "name")
                    .unwrap_or_else(|| UNTITLED_BOOKMARK.to_owned()),
                href: take_attribute(&mut record, "href"),
                add_date: take_attribute(&mut record, "add_date"),
                icon: take_attribute(&mut record, "icon"),
            }))
        }
    }
}

impl<'de> Deserialize<'de> for BookmarkNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value)
    }
}

/// Removes `key` from a record and returns its textual value.
///
/// Strings are taken as-is. Numbers and booleans keep their JSON spelling,
/// since hand-edited files often write timestamps as bare numbers. `null`,
/// arrays and objects count as absent.
fn take_attribute(record: &mut Map<String, Value>, key: &str) -> Option<String> {
    match record.remove(key)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decodes a JSON document into a bookmark tree.
///
/// # Errors
///
/// Returns an error if `json` is not valid JSON, if the top level is not an
/// array, or if any entry is not an object.
///
/// # Example
///
/// ```
/// use bmconv::bookmark::{from_json, BookmarkNode};
///
/// let nodes = from_json(r#"[{"type": "bookmark", "name": "Rust"}]"#).unwrap();
/// assert!(matches!(&nodes[0], BookmarkNode::Link(link) if link.href.is_none()));
/// ```
pub fn from_json(json: &str) -> Result<Vec<BookmarkNode>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Encodes a bookmark tree as pretty-printed JSON.
///
/// Uses four-space indentation and leaves non-ASCII text unescaped.
///
/// # Errors
///
/// Returns an error if the serializer fails or emits invalid UTF-8, neither
/// of which happens for an in-memory buffer and this model.
pub fn to_json(nodes: &[BookmarkNode]) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    nodes.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(serde_json::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(name: &str, href: &str) -> BookmarkNode {
        BookmarkNode::Link(Link {
            name: name.into(),
            href: Some(href.into()),
            add_date: Some("1700000000".into()),
            icon: None,
        })
    }

    #[test]
    fn decodes_folder_and_bookmark() {
        let json = r#"[
            {
                "type": "folder",
                "name": "Dev",
                "add_date": "1",
                "last_modified": "2",
                "children": [
                    {"type": "bookmark", "name": "Docs", "href": "https://docs.rs", "add_date": "3", "icon": "data:x"}
                ]
            }
        ]"#;
        let nodes = from_json(json).unwrap();

        match &nodes[0] {
            BookmarkNode::Folder(folder) => {
                assert_eq!(folder.name, "Dev");
                assert_eq!(folder.add_date.as_deref(), Some("1"));
                assert_eq!(folder.last_modified.as_deref(), Some("2"));
                assert!(folder.personal_toolbar_folder.is_none());
                assert_eq!(folder.children.len(), 1);
                match &folder.children[0] {
                    BookmarkNode::Link(link) => {
                        assert_eq!(link.name, "Docs");
                        assert_eq!(link.href.as_deref(), Some("https://docs.rs"));
                        assert_eq!(link.icon.as_deref(), Some("data:x"));
                    }
                    other => panic!("Expected Link, got {other:?}"),
                }
            }
            other => panic!("Expected Folder, got {other:?}"),
        }
    }

    #[test]
    fn unknown_or_missing_type_decodes_as_link() {
        let nodes =
            from_json(r#"[{"type": "separator", "name": "a"}, {"name": "b"}]"#).unwrap();

        assert!(matches!(&nodes[0], BookmarkNode::Link(l) if l.name == "a"));
        assert!(matches!(&nodes[1], BookmarkNode::Link(l) if l.name == "b"));
    }

    #[test]
    fn missing_name_gets_default() {
        let nodes = from_json(r#"[{"type": "folder"}, {"type": "bookmark"}]"#).unwrap();

        assert_eq!(nodes[0].name(), UNTITLED_FOLDER);
        assert_eq!(nodes[1].name(), UNTITLED_BOOKMARK);
    }

    #[test]
    fn null_name_gets_default() {
        let nodes = from_json(r#"[{"type": "bookmark", "name": null}]"#).unwrap();

        assert_eq!(nodes[0].name(), UNTITLED_BOOKMARK);
    }

    #[test]
    fn empty_name_is_kept() {
        let nodes = from_json(r#"[{"type": "folder", "name": ""}]"#).unwrap();

        assert_eq!(nodes[0].name(), "");
    }

    #[test]
    fn null_attributes_are_absent() {
        let nodes = from_json(
            r#"[{"type": "bookmark", "name": "x", "href": null, "add_date": null, "icon": null}]"#,
        )
        .unwrap();

        assert_eq!(
            nodes[0],
            BookmarkNode::Link(Link {
                name: "x".into(),
                ..Link::default()
            })
        );
    }

    #[test]
    fn numeric_timestamps_keep_their_text() {
        let nodes = from_json(r#"[{"type": "bookmark", "name": "x", "add_date": 1700000000}]"#)
            .unwrap();

        match &nodes[0] {
            BookmarkNode::Link(link) => assert_eq!(link.add_date.as_deref(), Some("1700000000")),
            other => panic!("Expected Link, got {other:?}"),
        }
    }

    #[test]
    fn non_array_children_are_empty() {
        let nodes = from_json(r#"[{"type": "folder", "name": "f", "children": "nope"}]"#).unwrap();

        assert!(matches!(&nodes[0], BookmarkNode::Folder(f) if f.children.is_empty()));
    }

    #[test]
    fn rejects_non_object_record() {
        let err = from_json(r#"[{"type": "folder", "children": [42]}]"#).unwrap_err();

        assert!(err.to_string().contains("bookmark record"));
    }

    #[test]
    fn rejects_non_array_document() {
        assert!(from_json(r#"{"type": "folder"}"#).is_err());
    }

    #[test]
    fn encodes_with_type_tag_first_and_nulls() {
        let json = to_json(&[link("Rust", "https://www.rust-lang.org/")]).unwrap();

        assert_eq!(
            json,
            r#"[
    {
        "type": "bookmark",
        "name": "Rust",
        "href": "https://www.rust-lang.org/",
        "add_date": "1700000000",
        "icon": null
    }
]"#
        );
    }

    #[test]
    fn omits_absent_toolbar_flag() {
        let folder = BookmarkNode::Folder(Folder {
            name: "f".into(),
            ..Folder::default()
        });
        let json = to_json(&[folder]).unwrap();

        assert!(!json.contains("personal_toolbar_folder"));
        assert!(json.contains(r#""last_modified": null"#));
        assert!(json.contains(r#""children": []"#));
    }

    #[test]
    fn keeps_non_ascii_unescaped() {
        let json = to_json(&[link("书签", "#")]).unwrap();

        assert!(json.contains("书签"));
    }

    #[test]
    fn json_round_trip_is_exact() {
        let tree = vec![BookmarkNode::Folder(Folder {
            name: "Toolbar".into(),
            add_date: Some("1".into()),
            last_modified: None,
            personal_toolbar_folder: Some("true".into()),
            children: vec![link("a", "https://a"), link("b", "https://b")],
        })];

        let decoded = from_json(&to_json(&tree).unwrap()).unwrap();
        assert_eq!(decoded, tree);
    }
}
