// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Convert browser bookmark exports between Netscape HTML and JSON.
//!
//! Every browser can export and import bookmarks as a loosely structured
//! HTML file (the "Netscape bookmark file" format). This crate turns such a
//! file into a JSON tree that is easy to edit or process, and turns the
//! JSON back into markup any browser will import.
//!
//! # Overview
//!
//! 1. [`parser`] reads the markup into a tree of [`bookmark::BookmarkNode`]s
//! 2. [`bookmark`] encodes and decodes that tree as JSON
//! 3. [`renderer`] writes the tree back out as bookmark markup
//!
//! All conversions are pure functions from text to text; reading and
//! writing files is left to the caller.
//!
//! # Example
//!
//! ```
//! use bmconv::{bookmark, parser, renderer};
//!
//! let html = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
//! <H1>Bookmarks</H1>
//! <DL><p>
//!     <DT><H3 ADD_DATE="1700000000">Reading</H3>
//!     <DL><p>
//!         <DT><A HREF="https://doc.rust-lang.org/book/" ADD_DATE="1700000001">The Book</A>
//!     </DL><p>
//! </DL><p>"#;
//!
//! let nodes = parser::parse(html).unwrap();
//! let json = bookmark::to_json(&nodes).unwrap();
//!
//! let markup = renderer::render_document(&json, &renderer::RenderOptions::default()).unwrap();
//! assert!(markup.contains("The Book</A>"));
//! ```
//!
//! # Modules
//!
//! - [`bookmark`]: the bookmark tree and its JSON form
//! - [`markup`]: lenient document tree for bookmark markup
//! - [`parser`]: markup to bookmark tree
//! - [`renderer`]: bookmark tree to markup

#![deny(missing_docs)]

pub mod bookmark;
pub mod markup;
pub mod parser;
pub mod renderer;
