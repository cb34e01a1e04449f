//! Structured document extraction
//!
//! This module turns one fetched HTML page into a [`Document`]: a title plus an
//! ordered sequence of semantic [`Block`]s. Extraction is a pure function of the
//! page URL and its content; the same input always yields the same blocks.
//!
//! The classification pass is written against the [`ContentNode`] capability
//! rather than a concrete DOM type, so any tree that can report tags,
//! attributes, children and text can be flattened the same way.

mod blocks;
mod extractor;
mod node;
mod text;

use url::Url;

pub use blocks::{BlockRules, Blocks};
pub use extractor::BlockExtractor;
pub use node::{Ancestors, ContentNode};
pub use text::normalize_whitespace;

/// One semantic unit of extracted page content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Section heading, level 2 to 4
    Heading { level: u8, text: String },

    /// Prose paragraph
    Paragraph { text: String },

    /// Preformatted code; `text` is the raw character content, never normalized
    CodeBlock {
        language: Option<String>,
        text: String,
    },

    /// List entry; `indent` is 0 for a top-level list
    ListItem {
        indent: usize,
        ordered: bool,
        text: String,
    },

    /// Callout box such as a note or warning; `kind` is upper-cased
    Admonition { kind: String, text: String },
}

impl Block {
    /// Returns the block's text content
    pub fn text(&self) -> &str {
        match self {
            Self::Heading { text, .. }
            | Self::Paragraph { text }
            | Self::CodeBlock { text, .. }
            | Self::ListItem { text, .. }
            | Self::Admonition { text, .. } => text,
        }
    }
}

/// The extraction result for a single page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Canonical URL of the page
    pub source_url: Url,

    /// Page title
    pub title: String,

    /// Blocks in document order
    pub blocks: Vec<Block>,
}
