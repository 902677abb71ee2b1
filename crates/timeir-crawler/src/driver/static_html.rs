//! Static-markup page driver: one HTTP GET, then CSS lookups with scraper.
//!
//! Suitable when the data-bearing widgets are present in the server-rendered
//! HTML. Nothing is re-rendered after load, so waits resolve immediately.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use super::{direct_child_selector, NodeRef, PageDriver};
use crate::types::{CrawlerError, CrawlerResult};

const USER_AGENT: &str = concat!("timeir-crawler/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Page driver backed by reqwest and scraper.
///
/// The parsed document is not `Send`, so only the source is kept and it is
/// re-parsed per lookup. Handles record an element's position in document
/// order, which is stable across parses of the same source.
pub struct StaticPageDriver {
    client: Client,
    source: Option<String>,
    nodes: Vec<usize>,
    closed: bool,
}

impl StaticPageDriver {
    /// Driver with its own HTTP client. Fails if the TLS backend cannot start.
    pub fn new() -> CrawlerResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CrawlerError::Launch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            source: None,
            nodes: Vec::new(),
            closed: false,
        }
    }

    fn document(&self) -> CrawlerResult<Html> {
        if self.closed {
            return Err(CrawlerError::Closed);
        }
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| CrawlerError::Navigation("no document loaded".to_string()))?;
        Ok(Html::parse_document(source))
    }

    fn register(&mut self, position: usize) -> NodeRef {
        self.nodes.push(position);
        NodeRef(self.nodes.len() - 1)
    }

    /// Run a lookup synchronously against a fresh parse of the document,
    /// returning document positions of the matches.
    fn select(&self, scope: Option<NodeRef>, selector: &str) -> CrawlerResult<Vec<usize>> {
        let html = self.document()?;

        let (css, direct) = match direct_child_selector(selector) {
            Some(rest) => (rest, true),
            None => (selector, false),
        };
        let parsed = Selector::parse(css).map_err(|e| CrawlerError::InvalidSelector {
            selector: selector.to_string(),
            message: e.to_string(),
        })?;

        let matches: Vec<ElementRef> = match scope {
            None if direct => html
                .root_element()
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|el| parsed.matches(el))
                .collect(),
            None => html.select(&parsed).collect(),
            Some(node) => {
                let root = self.resolve(&html, node)?;
                if direct {
                    root.children()
                        .filter_map(ElementRef::wrap)
                        .filter(|el| parsed.matches(el))
                        .collect()
                } else {
                    root.select(&parsed).collect()
                }
            }
        };

        let order: HashMap<_, usize> = html
            .tree
            .root()
            .descendants()
            .enumerate()
            .map(|(position, node)| (node.id(), position))
            .collect();
        Ok(matches
            .iter()
            .filter_map(|el| order.get(&el.id()).copied())
            .collect())
    }

    fn resolve<'a>(&self, html: &'a Html, node: NodeRef) -> CrawlerResult<ElementRef<'a>> {
        let position = *self
            .nodes
            .get(node.0)
            .ok_or(CrawlerError::StaleNode(node.0))?;
        html.tree
            .root()
            .descendants()
            .nth(position)
            .and_then(ElementRef::wrap)
            .ok_or(CrawlerError::StaleNode(node.0))
    }
}

/// Text of `element` as a browser would render it: script, style and
/// similar bodies are left out.
fn visible_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in element.descendants() {
        let Some(chunk) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != element.id())
            .filter_map(|ancestor| ancestor.value().as_element())
            .any(|el| matches!(el.name(), "script" | "style" | "noscript" | "template"));
        if !hidden {
            text.push_str(chunk);
        }
    }
    text
}

#[async_trait]
impl PageDriver for StaticPageDriver {
    async fn navigate(&mut self, url: &str) -> CrawlerResult<()> {
        if self.closed {
            return Err(CrawlerError::Closed);
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CrawlerError::Navigation(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlerError::Navigation(format!("{url}: HTTP {status}")));
        }

        let body = response.text().await?;
        tracing::debug!("Fetched {url} ({} bytes)", body.len());

        self.nodes.clear();
        self.source = Some(body);
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> CrawlerResult<NodeRef> {
        match self.select(None, selector)?.into_iter().next() {
            Some(position) => Ok(self.register(position)),
            None => Err(CrawlerError::WaitTimeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn find_one(
        &mut self,
        scope: Option<NodeRef>,
        selector: &str,
    ) -> CrawlerResult<Option<NodeRef>> {
        let first = self.select(scope, selector)?.into_iter().next();
        Ok(first.map(|position| self.register(position)))
    }

    async fn find_all(
        &mut self,
        scope: Option<NodeRef>,
        selector: &str,
    ) -> CrawlerResult<Vec<NodeRef>> {
        let positions = self.select(scope, selector)?;
        Ok(positions.into_iter().map(|p| self.register(p)).collect())
    }

    async fn read_text(&mut self, node: NodeRef) -> CrawlerResult<String> {
        let html = self.document()?;
        let element = self.resolve(&html, node)?;
        Ok(visible_text(element).trim().to_string())
    }

    async fn close(&mut self) -> CrawlerResult<()> {
        self.closed = true;
        self.source = None;
        self.nodes.clear();
        Ok(())
    }
}
