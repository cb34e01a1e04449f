//! Block classification over a content tree

use super::node::ContentNode;
use super::text::{collect_text, normalize_whitespace, raw_text};
use super::Block;
use crate::config::ExtractConfig;

/// Kind tokens recognised in an admonition container's class list
const ADMONITION_KINDS: &[&str] = &[
    "note",
    "tip",
    "info",
    "warning",
    "caution",
    "danger",
    "important",
];

const DEFAULT_ADMONITION_KIND: &str = "NOTE";

/// Classification rules applied to each node of a content tree
#[derive(Debug, Clone)]
pub struct BlockRules {
    admonition_classes: Vec<String>,
    title_classes: Vec<String>,
    default_language: Option<String>,
}

/// Outcome of classifying one node
enum Visit {
    /// The node's subtree is fully handled; do not walk into it
    Consume(Option<Block>),
    /// Keep walking into the node's children
    Descend(Option<Block>),
}

impl BlockRules {
    /// Creates rules from the extraction configuration
    pub fn from_config(config: &ExtractConfig) -> Self {
        Self {
            admonition_classes: config.admonition_classes.clone(),
            title_classes: config.admonition_title_classes.clone(),
            default_language: config.default_code_language.clone(),
        }
    }

    /// Lazily classifies the subtree rooted at `root` in document order
    ///
    /// The walk is pre-order and includes `root` itself.
    pub fn blocks<N: ContentNode>(&self, root: N) -> Blocks<'_, N> {
        Blocks {
            rules: self,
            stack: vec![root],
        }
    }

    fn classify<N: ContentNode>(&self, node: &N) -> Visit {
        let Some(tag) = node.tag() else {
            return Visit::Descend(None);
        };

        match tag {
            // h1 text is reported as the document title instead
            "h1" => Visit::Consume(None),
            "h2" | "h3" | "h4" | "h5" | "h6" => Visit::Consume(heading(node, tag)),
            "p" => {
                if node
                    .ancestors()
                    .any(|a| matches!(a.tag(), Some("td") | Some("th") | Some("li")))
                {
                    Visit::Consume(None)
                } else {
                    Visit::Consume(prose(node).map(|text| Block::Paragraph { text }))
                }
            }
            "pre" => Visit::Consume(self.code_block(node)),
            "tr" => Visit::Consume(table_row(node)),
            "li" if node
                .parent()
                .map_or(false, |p| is_list(&p)) =>
            {
                Visit::Descend(self.list_item(node))
            }
            _ if self.is_admonition(node) => Visit::Consume(self.admonition(node)),
            _ => Visit::Descend(None),
        }
    }

    fn code_block<N: ContentNode>(&self, pre: &N) -> Option<Block> {
        let text = raw_text(pre);
        if text.trim().is_empty() {
            return None;
        }

        let language = language_class(pre)
            .or_else(|| {
                find_descendant(pre, &|n: &N| n.is_tag("code")).and_then(|c| language_class(&c))
            })
            .or_else(|| pre.ancestors().find_map(|a| language_class(&a)))
            .or_else(|| self.default_language.clone());

        Some(Block::CodeBlock { language, text })
    }

    fn list_item<N: ContentNode>(&self, node: &N) -> Option<Block> {
        let ordered = node.parent().map_or(false, |p| p.is_tag("ol"));
        let indent = node.ancestors().filter(|a| is_list(a)).count().saturating_sub(1);
        // Elements the walk reaches later emit their own blocks
        let text = normalize_whitespace(&collect_text(node, |n| self.emits_own_block(n)));
        let text = text
            .lines()
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return None;
        }

        Some(Block::ListItem {
            indent,
            ordered,
            text,
        })
    }

    /// True for elements inside a list item that are classified on their own
    fn emits_own_block<N: ContentNode>(&self, node: &N) -> bool {
        matches!(
            node.tag(),
            Some("ul" | "ol" | "pre" | "table" | "tr" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
        ) || self.is_admonition(node)
    }

    fn is_admonition<N: ContentNode>(&self, node: &N) -> bool {
        node.classes()
            .any(|c| self.admonition_classes.iter().any(|a| a == c))
    }

    fn is_admonition_title<N: ContentNode>(&self, node: &N) -> bool {
        node.classes()
            .any(|c| self.title_classes.iter().any(|t| t == c))
    }

    fn admonition<N: ContentNode>(&self, node: &N) -> Option<Block> {
        let kind = self.admonition_kind(node);
        let text = normalize_whitespace(&collect_text(node, |n| self.is_admonition_title(n)));
        let text = strip_label(&text, &kind);
        if text.is_empty() {
            return None;
        }

        Some(Block::Admonition {
            kind,
            text: text.to_string(),
        })
    }

    /// Title sub-element text, else a known kind class token, else the default
    fn admonition_kind<N: ContentNode>(&self, node: &N) -> String {
        let from_title = find_descendant(node, &|n: &N| self.is_admonition_title(n))
            .map(|title| normalize_whitespace(&collect_text(&title, |_| false)))
            .filter(|text| !text.is_empty());

        let kind = from_title
            .or_else(|| {
                node.classes().find_map(|class| {
                    ADMONITION_KINDS
                        .iter()
                        .find(|kind| {
                            class == **kind
                                || class
                                    .strip_suffix(**kind)
                                    .map_or(false, |rest| rest.ends_with('-'))
                        })
                        .map(|kind| kind.to_string())
                })
            })
            .unwrap_or_else(|| DEFAULT_ADMONITION_KIND.to_string());

        kind.replace('\n', " ")
            .trim()
            .trim_end_matches(':')
            .trim()
            .to_uppercase()
    }
}

/// Lazy pre-order iterator over the blocks of a content tree
pub struct Blocks<'r, N> {
    rules: &'r BlockRules,
    stack: Vec<N>,
}

impl<'r, N: ContentNode> Iterator for Blocks<'r, N> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        while let Some(node) = self.stack.pop() {
            let block = match self.rules.classify(&node) {
                Visit::Consume(block) => block,
                Visit::Descend(block) => {
                    self.stack.extend(node.children().into_iter().rev());
                    block
                }
            };

            if block.is_some() {
                return block;
            }
        }
        None
    }
}

/// Cleans heading text: whitespace is normalized and permalink glyphs are trimmed
pub(crate) fn heading_text(raw: &str) -> String {
    normalize_whitespace(&raw.replace('\n', " "))
        .trim_matches(|c: char| c == '#' || c == '¶' || c == '\u{200b}' || c.is_whitespace())
        .to_string()
}

fn heading<N: ContentNode>(node: &N, tag: &str) -> Option<Block> {
    let level = tag[1..].parse::<u8>().ok()?.clamp(2, 4);
    let text = heading_text(&collect_text(node, |_| false));
    if text.is_empty() {
        return None;
    }
    Some(Block::Heading { level, text })
}

fn prose<N: ContentNode>(node: &N) -> Option<String> {
    let text = normalize_whitespace(&collect_text(node, |_| false));
    (!text.is_empty()).then_some(text)
}

fn is_list<N: ContentNode>(node: &N) -> bool {
    node.is_tag("ul") || node.is_tag("ol")
}

fn table_row<N: ContentNode>(row: &N) -> Option<Block> {
    let cells: Vec<String> = row
        .children()
        .iter()
        .filter(|c| c.is_tag("td") || c.is_tag("th"))
        .map(|cell| {
            normalize_whitespace(&collect_text(cell, |_| false))
                .lines()
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    if cells.iter().all(|c| c.is_empty()) {
        return None;
    }

    Some(Block::Paragraph {
        text: cells.join(" | "),
    })
}

/// `language-xxx` or `lang-xxx` class token
fn language_class<N: ContentNode>(node: &N) -> Option<String> {
    node.classes()
        .find_map(|class| {
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
        })
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
}

/// First descendant (pre-order, excluding `node`) matching `pred`
fn find_descendant<N, F>(node: &N, pred: &F) -> Option<N>
where
    N: ContentNode,
    F: Fn(&N) -> bool,
{
    for child in node.children() {
        if pred(&child) {
            return Some(child);
        }
        if let Some(found) = find_descendant(&child, pred) {
            return Some(found);
        }
    }
    None
}

/// Removes an inline echo of the admonition label from the start of its text
fn strip_label<'t>(text: &'t str, kind: &str) -> &'t str {
    let Some(head) = text.get(..kind.len()) else {
        return text;
    };
    if !head.eq_ignore_ascii_case(kind) {
        return text;
    }

    let rest = &text[kind.len()..];
    if rest.is_empty() || rest.starts_with(':') || rest.starts_with('\n') {
        rest.trim_start_matches(|c: char| c == ':' || c.is_whitespace())
    } else {
        text
    }
}
