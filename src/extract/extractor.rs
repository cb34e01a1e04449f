//! Page-level extraction: content root selection, noise removal and title

use super::blocks::{heading_text, BlockRules};
use super::text::collect_text;
use super::Document;
use crate::config::ExtractConfig;
use crate::url::last_path_segment;
use crate::ExtractionError;
use ego_tree::NodeId;
use scraper::{Html, Selector};
use url::Url;

/// Flattens HTML pages into [`Document`]s
///
/// The extractor holds only configuration, so one instance can be shared by
/// every worker of a harvest. The parsed DOM never outlives a call to
/// [`extract`](Self::extract).
#[derive(Debug, Clone)]
pub struct BlockExtractor {
    content_selectors: Vec<String>,
    noise_selectors: Vec<String>,
    rules: BlockRules,
}

impl BlockExtractor {
    /// Creates an extractor from the extraction configuration
    pub fn new(config: &ExtractConfig) -> Self {
        Self {
            content_selectors: config.content_selectors.clone(),
            noise_selectors: config.noise_selectors.clone(),
            rules: BlockRules::from_config(config),
        }
    }

    /// Extracts a document from one page
    ///
    /// # Arguments
    ///
    /// * `url` - The canonical URL of the page, used for the title fallback
    /// * `content` - The raw HTML of the page
    ///
    /// # Returns
    ///
    /// * `Ok(Document)` - The page title and its blocks in document order
    /// * `Err(ExtractionError::NoContentRoot)` - No content selector matched
    pub fn extract(&self, url: &Url, content: &str) -> Result<Document, ExtractionError> {
        let mut html = Html::parse_document(content);

        let root_id = self.select_root(&html, url)?;
        self.remove_noise(&mut html, root_id)?;

        let title = page_title(&html).unwrap_or_else(|| last_path_segment(url));

        let root = html
            .tree
            .get(root_id)
            .ok_or_else(|| self.no_content_root(url))?;
        let blocks: Vec<_> = self.rules.blocks(root).collect();

        tracing::debug!("Extracted {} blocks from {}", blocks.len(), url);

        Ok(Document {
            source_url: url.clone(),
            title,
            blocks,
        })
    }

    /// Finds the first element matching any content selector, trying selectors in order
    fn select_root(&self, html: &Html, url: &Url) -> Result<NodeId, ExtractionError> {
        for raw in &self.content_selectors {
            let selector = compile(raw)?;
            if let Some(element) = html.select(&selector).next() {
                return Ok(element.id());
            }
        }

        Err(self.no_content_root(url))
    }

    /// Detaches every noise subtree other than the content root itself
    fn remove_noise(&self, html: &mut Html, root_id: NodeId) -> Result<(), ExtractionError> {
        let mut noise = Vec::new();
        for raw in &self.noise_selectors {
            let selector = compile(raw)?;
            noise.extend(
                html.select(&selector)
                    .map(|element| element.id())
                    .filter(|id| *id != root_id),
            );
        }

        for id in noise {
            if let Some(mut node) = html.tree.get_mut(id) {
                node.detach();
            }
        }

        Ok(())
    }

    fn no_content_root(&self, url: &Url) -> ExtractionError {
        ExtractionError::NoContentRoot {
            url: url.to_string(),
            selectors: self.content_selectors.join(", "),
        }
    }
}

fn compile(raw: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(raw).map_err(|e| ExtractionError::InvalidSelector {
        selector: raw.to_string(),
        message: format!("{:?}", e),
    })
}

/// Text of the first non-empty `h1` still attached to the document
fn page_title(html: &Html) -> Option<String> {
    let selector = Selector::parse("h1").ok()?;

    html.select(&selector)
        .map(|element| heading_text(&collect_text(&*element, |_| false)))
        .find(|title| !title.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Block;

    fn extractor() -> BlockExtractor {
        BlockExtractor::new(&ExtractConfig::default())
    }

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://lit.dev{}", path)).unwrap()
    }

    #[test]
    fn test_round_trip_synthetic_page() {
        let html = r#"
            <html><body>
            <article>
                <h2>Reactive properties</h2>
                <p>Properties trigger an update.</p>
                <pre><code class="language-foo">let x = 1;</code></pre>
                <ul>
                    <li>outer
                        <ul><li>inner</li></ul>
                    </li>
                </ul>
            </article>
            </body></html>
        "#;

        let doc = extractor().extract(&url("/docs/properties/"), html).unwrap();
        assert_eq!(
            doc.blocks,
            vec![
                Block::Heading {
                    level: 2,
                    text: "Reactive properties".into()
                },
                Block::Paragraph {
                    text: "Properties trigger an update.".into()
                },
                Block::CodeBlock {
                    language: Some("foo".into()),
                    text: "let x = 1;".into()
                },
                Block::ListItem {
                    indent: 0,
                    ordered: false,
                    text: "outer".into()
                },
                Block::ListItem {
                    indent: 1,
                    ordered: false,
                    text: "inner".into()
                },
            ]
        );
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let html = r#"<main><h2>A</h2><p>one   two</p><div class="admonition tip"><p>x</p></div></main>"#;
        let first = extractor().extract(&url("/a"), html).unwrap();
        let second = extractor().extract(&url("/a"), html).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_content_root() {
        let html = "<html><body><div><p>loose</p></div></body></html>";
        let err = extractor().extract(&url("/docs/x"), html).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::NoContentRoot {
                url: "https://lit.dev/docs/x".into(),
                selectors: "article, main".into(),
            }
        );
    }

    #[test]
    fn test_content_selectors_tried_in_order() {
        let html = "<main><p>from main</p></main><article><p>from article</p></article>";
        let doc = extractor().extract(&url("/"), html).unwrap();
        assert_eq!(doc.blocks, vec![Block::Paragraph { text: "from article".into() }]);
    }

    #[test]
    fn test_noise_removed_before_walk() {
        let html = r#"
            <main>
                <nav><p>Navigation</p></nav>
                <p>Body text.</p>
                <div class="toc"><ul><li>Contents</li></ul></div>
                <script>var secret = 1;</script>
                <a class="edit-page-link" href="/edit">Edit this page</a>
                <footer><p>Footer</p></footer>
            </main>
        "#;
        let doc = extractor().extract(&url("/"), html).unwrap();
        assert_eq!(doc.blocks, vec![Block::Paragraph { text: "Body text.".into() }]);
    }

    #[test]
    fn test_noise_inside_paragraph_text() {
        let html = r#"<article><p>Keep <span class="edit-page-link">drop</span>this.</p></article>"#;
        let doc = extractor().extract(&url("/"), html).unwrap();
        assert_eq!(doc.blocks[0].text(), "Keep this.");
    }

    #[test]
    fn test_title_from_h1() {
        let html = r##"<article><h1>Lifecycle <a href="#lifecycle">#</a></h1><p>text</p></article>"##;
        let doc = extractor().extract(&url("/docs/components/lifecycle/"), html).unwrap();
        assert_eq!(doc.title, "Lifecycle");
        assert_eq!(doc.blocks, vec![Block::Paragraph { text: "text".into() }]);
    }

    #[test]
    fn test_title_falls_back_to_path() {
        let html = "<article><h2>Section</h2></article>";
        let doc = extractor()
            .extract(&url("/docs/components/lifecycle/"), html)
            .unwrap();
        assert_eq!(doc.title, "lifecycle");
    }

    #[test]
    fn test_source_url_preserved() {
        let html = "<main><p>x</p></main>";
        let page = url("/docs/");
        let doc = extractor().extract(&page, html).unwrap();
        assert_eq!(doc.source_url, page);
    }

    #[test]
    fn test_invalid_selector_reported() {
        let config = ExtractConfig {
            content_selectors: vec!["div[".to_string()],
            ..ExtractConfig::default()
        };
        let err = BlockExtractor::new(&config)
            .extract(&url("/"), "<div></div>")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidSelector { .. }));
    }
}
