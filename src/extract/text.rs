//! Text collection and whitespace normalization

use super::node::ContentNode;

/// Tags whose content starts on a new line when flattened to text
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "div", "dl", "dt",
    "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "ol", "p", "pre", "section", "summary", "table", "tr", "ul",
];

/// Normalizes whitespace in extracted prose
///
/// Runs of horizontal whitespace collapse to a single space, any run of blank
/// lines collapses to exactly one, and the result is trimmed.
///
/// # Examples
///
/// ```
/// use sumi_scribe::extract::normalize_whitespace;
///
/// assert_eq!(normalize_whitespace("  a \t b  "), "a b");
/// assert_eq!(normalize_whitespace("one\n\n\n\ntwo"), "one\n\ntwo");
/// ```
pub fn normalize_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_blank = false;

    for line in raw.lines() {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            pending_blank = !out.is_empty();
            continue;
        };

        if !out.is_empty() {
            out.push('\n');
            if pending_blank {
                out.push('\n');
            }
        }
        pending_blank = false;

        out.push_str(first);
        for word in words {
            out.push(' ');
            out.push_str(word);
        }
    }

    out
}

/// Flattens a node's subtree into text suitable for normalization
///
/// Source newlines inside text nodes are treated as plain spaces. Line breaks
/// come only from `<br>` and from block-level elements, so a paragraph split
/// across several source lines reads as one line. Children for which `skip`
/// returns true are left out together with their subtrees.
pub fn collect_text<N, F>(node: &N, skip: F) -> String
where
    N: ContentNode,
    F: Fn(&N) -> bool,
{
    let mut out = String::new();
    push_text(node, &skip, &mut out);
    out
}

fn push_text<N, F>(node: &N, skip: &F, out: &mut String)
where
    N: ContentNode,
    F: Fn(&N) -> bool,
{
    if let Some(text) = node.text() {
        out.extend(text.chars().map(|c| if c == '\n' { ' ' } else { c }));
        return;
    }

    let tag = node.tag();
    if tag == Some("br") {
        out.push('\n');
        return;
    }

    let is_block = tag.map_or(false, |t| BLOCK_TAGS.contains(&t));
    if is_block {
        out.push('\n');
    }

    for child in node.children() {
        if !skip(&child) {
            push_text(&child, skip, out);
        }
    }

    if is_block {
        out.push('\n');
    } else if matches!(tag, Some("td") | Some("th")) {
        out.push(' ');
    }
}

/// Concatenates every text descendant exactly as written
pub fn raw_text<N: ContentNode>(node: &N) -> String {
    let mut out = String::new();
    push_raw(node, &mut out);
    out
}

fn push_raw<N: ContentNode>(node: &N, out: &mut String) {
    if let Some(text) = node.text() {
        out.push_str(text);
        return;
    }
    for child in node.children() {
        push_raw(&child, out);
    }
}
