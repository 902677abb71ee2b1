//! Chromium-based page driver using chromiumoxide.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;

use super::{NodeRef, PageDriver};
use crate::types::{CrawlerError, CrawlerResult};

/// Interval between element lookups while waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Upper bound on a single page load.
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

const WINDOW_WIDTH: u32 = 1920;
const WINDOW_HEIGHT: u32 = 1080;

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. TIMEIR_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("TIMEIR_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.timeir/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".timeir/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".timeir/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".timeir/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".timeir/chromium/chrome-linux64/chrome"),
                home.join(".timeir/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Headless Chromium driving a single tab.
pub struct ChromiumDriver {
    browser: Option<Browser>,
    page: Option<Page>,
    elements: Vec<Element>,
    handler_task: Option<JoinHandle<()>>,
}

impl ChromiumDriver {
    /// Launch a headless Chromium found via [`find_chromium`].
    pub async fn launch() -> CrawlerResult<Self> {
        let chrome_path = find_chromium().ok_or_else(|| {
            CrawlerError::Launch(
                "Chromium not found. Set TIMEIR_CHROMIUM_PATH or install Chrome.".to_string(),
            )
        })?;
        Self::launch_with(chrome_path).await
    }

    /// Launch a headless Chromium from an explicit executable path.
    pub async fn launch_with(chrome_path: PathBuf) -> CrawlerResult<Self> {
        tracing::info!("Launching headless Chromium: {}", chrome_path.display());

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
            .no_sandbox()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .build()
            .map_err(|e| CrawlerError::Launch(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CrawlerError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            let drained = drain_events(&mut handler).await;
            tracing::debug!("CDP handler event loop ended after {drained} events");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| CrawlerError::Launch(format!("failed to create page: {e}")))?;

        Ok(Self {
            browser: Some(browser),
            page: Some(page),
            elements: Vec::new(),
            handler_task: Some(handler_task),
        })
    }

    fn page(&self) -> CrawlerResult<&Page> {
        self.page.as_ref().ok_or(CrawlerError::Closed)
    }

    fn element(&self, node: NodeRef) -> CrawlerResult<&Element> {
        self.elements
            .get(node.0)
            .ok_or(CrawlerError::StaleNode(node.0))
    }

    fn register(&mut self, element: Element) -> NodeRef {
        self.elements.push(element);
        NodeRef(self.elements.len() - 1)
    }

    async fn query(&self, scope: Option<NodeRef>, selector: &str) -> CrawlerResult<Vec<Element>> {
        let found = match scope {
            Some(node) => self.element(node)?.find_elements(selector).await?,
            None => self.page()?.find_elements(selector).await?,
        };
        Ok(found)
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(&mut self, url: &str) -> CrawlerResult<()> {
        let page = self.page()?;
        let start = Instant::now();

        // `goto` resolves once the load has committed.
        match tokio::time::timeout(NAVIGATION_TIMEOUT, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(CrawlerError::Navigation(format!("{url}: {e}"))),
            Err(_) => {
                return Err(CrawlerError::Navigation(format!(
                    "{url}: timed out after {}ms",
                    NAVIGATION_TIMEOUT.as_millis()
                )))
            }
        }

        self.elements.clear();
        tracing::debug!("Loaded {url} in {}ms", start.elapsed().as_millis());
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> CrawlerResult<NodeRef> {
        let start = Instant::now();

        loop {
            // Lookup errors while the page is still settling count as "not yet".
            if let Ok(mut found) = self.query(None, selector).await {
                if !found.is_empty() {
                    let element = found.swap_remove(0);
                    return Ok(self.register(element));
                }
            }

            if start.elapsed() >= timeout {
                return Err(CrawlerError::WaitTimeout {
                    selector: selector.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn find_one(
        &mut self,
        scope: Option<NodeRef>,
        selector: &str,
    ) -> CrawlerResult<Option<NodeRef>> {
        let found = self.query(scope, selector).await?;
        Ok(found.into_iter().next().map(|el| self.register(el)))
    }

    async fn find_all(
        &mut self,
        scope: Option<NodeRef>,
        selector: &str,
    ) -> CrawlerResult<Vec<NodeRef>> {
        let found = self.query(scope, selector).await?;
        Ok(found.into_iter().map(|el| self.register(el)).collect())
    }

    async fn read_text(&mut self, node: NodeRef) -> CrawlerResult<String> {
        let text = self.element(node)?.inner_text().await?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    async fn close(&mut self) -> CrawlerResult<()> {
        self.elements.clear();
        self.page = None;

        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };

        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            tracing::warn!("Chromium did not exit cleanly: {e}");
        }
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }

        closed?;
        tracing::info!("Chromium closed");
        Ok(())
    }
}

/// Poll the CDP handler until the connection ends.
///
/// Individual event errors (e.g. a message that fails to deserialize) are
/// not fatal; commands only get replies while this stream is polled.
async fn drain_events<S, E>(events: &mut S) -> usize
where
    S: Stream<Item = Result<(), E>> + Unpin,
    E: std::fmt::Display,
{
    let mut count = 0;
    while let Some(event) = events.next().await {
        if let Err(e) = event {
            tracing::debug!("CDP handler error: {e}");
        }
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_events_survives_errors() {
        let mut events = futures::stream::iter(vec![
            Ok(()),
            Err("bad message"),
            Ok(()),
            Err("another"),
            Ok(()),
        ]);
        assert_eq!(drain_events(&mut events).await, 5);
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_wait_and_read() {
        let mut driver = ChromiumDriver::launch().await.expect("failed to launch");

        driver
            .navigate("data:text/html,<div class='todayDate x'><span>Hello</span> World</div>")
            .await
            .expect("navigation failed");

        let node = driver
            .wait_for("div[class*='todayDate']", Duration::from_secs(5))
            .await
            .expect("marker not found");
        assert_eq!(driver.read_text(node).await.unwrap(), "Hello World");

        let spans = driver.find_all(Some(node), "span").await.unwrap();
        assert_eq!(spans.len(), 1);

        let missing = driver.wait_for("#absent", Duration::from_millis(600)).await;
        assert!(matches!(missing, Err(CrawlerError::WaitTimeout { .. })));

        driver.close().await.expect("close failed");
        driver.close().await.expect("second close failed");
    }
}
