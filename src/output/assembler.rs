//! Corpus rendering
//!
//! This module renders [`Document`]s into the plain-text corpus. The format is
//! Markdown-flavoured so that the result reads well both to people and to
//! language models:
//!
//! ```text
//! # Corpus Title
//! Source: https://lit.dev/docs/
//! Generated: 2026-01-01T00:00:00+00:00
//!
//!
//! # Page Title
//! Source: https://lit.dev/docs/components/
//!
//! ## Heading
//! Paragraph text.
//!
//! --------------------------------------------------------------------------------
//! ```

use crate::extract::{Block, Document};
use chrono::{DateTime, SecondsFormat, Utc};
use std::io::{self, Write};

/// Width of the line written between pages
const SEPARATOR_WIDTH: usize = 80;

/// Notice appended when a run was cancelled before the frontier drained
pub const TRUNCATION_NOTICE: &str =
    "[Harvest cancelled before completion; the corpus above is partial.]";

/// Streams documents into a corpus sink
///
/// The assembler is append-only: each document is rendered and written as soon
/// as it is appended, and nothing is retained afterwards.
pub struct DocumentAssembler<W: Write> {
    sink: W,
    documents_written: usize,
}

impl<W: Write> DocumentAssembler<W> {
    /// Creates an assembler writing to `sink`
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            documents_written: 0,
        }
    }

    /// Writes the corpus header
    ///
    /// # Arguments
    ///
    /// * `title` - Corpus title
    /// * `source` - Where the corpus was harvested from, usually the first seed
    /// * `generated_at` - Generation timestamp
    pub fn write_header(
        &mut self,
        title: &str,
        source: &str,
        generated_at: DateTime<Utc>,
    ) -> io::Result<()> {
        write!(
            self.sink,
            "# {}\nSource: {}\nGenerated: {}\n",
            title,
            source,
            generated_at.to_rfc3339_opts(SecondsFormat::Secs, false)
        )
    }

    /// Renders and writes one document
    pub fn append(&mut self, document: &Document) -> io::Result<()> {
        self.sink.write_all(render_document(document).as_bytes())?;
        self.documents_written += 1;
        Ok(())
    }

    /// Writes the truncation notice if needed and flushes the sink
    pub fn finish(&mut self, truncated: bool) -> io::Result<()> {
        if truncated {
            write!(self.sink, "\n{}\n", TRUNCATION_NOTICE)?;
        }
        self.sink.flush()
    }

    /// Number of documents appended so far
    pub fn documents_written(&self) -> usize {
        self.documents_written
    }

    /// Consumes the assembler and returns the sink
    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Renders a document with its page frame and trailing separator
pub fn render_document(document: &Document) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\n\n# {}\nSource: {}\n\n",
        document.title, document.source_url
    ));

    let mut in_list = false;
    for block in &document.blocks {
        let is_list_item = matches!(block, Block::ListItem { .. });
        if in_list && !is_list_item {
            out.push('\n');
        }
        in_list = is_list_item;

        render_block(block, &mut out);
    }
    if in_list {
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&"-".repeat(SEPARATOR_WIDTH));
    out.push('\n');
    out
}

/// Renders one block into `out`
pub fn render_block(block: &Block, out: &mut String) {
    match block {
        Block::Heading { level, text } => {
            out.push_str(&format!("\n{} {}\n", "#".repeat(*level as usize), text));
        }
        Block::Paragraph { text } => {
            out.push_str(text);
            out.push_str("\n\n");
        }
        Block::CodeBlock { language, text } => {
            out.push_str("```");
            out.push_str(language.as_deref().unwrap_or(""));
            out.push('\n');
            out.push_str(text);
            if !text.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n\n");
        }
        Block::ListItem {
            indent,
            ordered,
            text,
        } => {
            let marker = if *ordered { "1." } else { "-" };
            out.push_str(&format!("{}{} {}\n", "  ".repeat(*indent), marker, text));
        }
        Block::Admonition { kind, text } => {
            out.push_str(&format!("> **{}:** {}\n\n", kind, text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use url::Url;

    fn document(blocks: Vec<Block>) -> Document {
        Document {
            source_url: Url::parse("https://lit.dev/docs/components/").unwrap(),
            title: "Components".to_string(),
            blocks,
        }
    }

    fn separator() -> String {
        "-".repeat(80)
    }

    #[test]
    fn test_header() {
        let mut assembler = DocumentAssembler::new(Vec::new());
        let generated = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assembler
            .write_header("Lit Docs", "https://lit.dev/docs/", generated)
            .unwrap();

        let out = String::from_utf8(assembler.into_inner()).unwrap();
        assert_eq!(
            out,
            "# Lit Docs\nSource: https://lit.dev/docs/\nGenerated: 2026-03-01T12:00:00+00:00\n"
        );
    }

    #[test]
    fn test_render_all_block_kinds() {
        let doc = document(vec![
            Block::Heading {
                level: 2,
                text: "Defining".into(),
            },
            Block::Paragraph {
                text: "A component is a class.".into(),
            },
            Block::CodeBlock {
                language: Some("ts".into()),
                text: "class A {}".into(),
            },
            Block::ListItem {
                indent: 0,
                ordered: false,
                text: "one".into(),
            },
            Block::ListItem {
                indent: 1,
                ordered: true,
                text: "one.a".into(),
            },
            Block::Admonition {
                kind: "NOTE".into(),
                text: "Use decorators.".into(),
            },
        ]);

        let expected = format!(
            "\n\n# Components\nSource: https://lit.dev/docs/components/\n\n\
             \n## Defining\n\
             A component is a class.\n\n\
             ```ts\nclass A {{}}\n```\n\n\
             - one\n\
             \x20\x201. one.a\n\
             \n\
             > **NOTE:** Use decorators.\n\n\
             \n{}\n",
            separator()
        );
        assert_eq!(render_document(&doc), expected);
    }

    #[test]
    fn test_code_block_without_language_keeps_text() {
        let mut out = String::new();
        render_block(
            &Block::CodeBlock {
                language: None,
                text: "  indented\n".into(),
            },
            &mut out,
        );
        assert_eq!(out, "```\n  indented\n```\n\n");
    }

    #[test]
    fn test_list_run_at_end_of_document() {
        let doc = document(vec![Block::ListItem {
            indent: 0,
            ordered: true,
            text: "last".into(),
        }]);
        let rendered = render_document(&doc);
        assert!(rendered.ends_with(&format!("1. last\n\n\n{}\n", separator())));
    }

    #[test]
    fn test_append_and_finish() {
        let mut assembler = DocumentAssembler::new(Vec::new());
        assembler.append(&document(vec![])).unwrap();
        assembler.finish(false).unwrap();
        assert_eq!(assembler.documents_written(), 1);

        let out = String::from_utf8(assembler.into_inner()).unwrap();
        assert!(out.contains("# Components\nSource: https://lit.dev/docs/components/\n"));
        assert!(!out.contains(TRUNCATION_NOTICE));
    }

    #[test]
    fn test_finish_truncated() {
        let mut assembler = DocumentAssembler::new(Vec::new());
        assembler.finish(true).unwrap();
        let out = String::from_utf8(assembler.into_inner()).unwrap();
        assert!(out.ends_with(&format!("{}\n", TRUNCATION_NOTICE)));
    }
}
