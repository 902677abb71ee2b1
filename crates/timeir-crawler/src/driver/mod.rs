//! Page driver abstraction over the browser automation backend.
//!
//! The extractor only talks to a `PageDriver`, so the same selector logic
//! runs against headless Chromium (via chromiumoxide) or against static
//! markup fetched over plain HTTP.

pub mod chromium;
pub mod static_html;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::CrawlerResult;

pub use chromium::{find_chromium, ChromiumDriver};
pub use static_html::StaticPageDriver;

/// Opaque handle to an element the driver has located.
///
/// Handles are only meaningful to the driver that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(pub(crate) usize);

/// The capability the extractor needs from a browser.
#[async_trait]
pub trait PageDriver: Send {
    /// Load the given URL, replacing the current document.
    async fn navigate(&mut self, url: &str) -> CrawlerResult<()>;
    /// Wait up to `timeout` for an element matching `selector` to appear.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> CrawlerResult<NodeRef>;
    /// First match of `selector`, searched under `scope` or the whole document.
    async fn find_one(
        &mut self,
        scope: Option<NodeRef>,
        selector: &str,
    ) -> CrawlerResult<Option<NodeRef>>;
    /// All matches of `selector` in document order.
    async fn find_all(&mut self, scope: Option<NodeRef>, selector: &str)
        -> CrawlerResult<Vec<NodeRef>>;
    /// Visible text of an element, trimmed.
    async fn read_text(&mut self, node: NodeRef) -> CrawlerResult<String>;
    /// Release the underlying browser. Safe to call more than once.
    async fn close(&mut self) -> CrawlerResult<()>;
}

/// Which backend to construct for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    #[default]
    Chromium,
    Static,
}

impl std::fmt::Display for DriverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverKind::Chromium => write!(f, "chromium"),
            DriverKind::Static => write!(f, "static"),
        }
    }
}

impl std::str::FromStr for DriverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" | "browser" => Ok(DriverKind::Chromium),
            "static" | "http" => Ok(DriverKind::Static),
            other => Err(format!(
                "unknown driver '{other}', expected 'chromium' or 'static'"
            )),
        }
    }
}

/// Split a `:scope > rest` selector into its child part.
///
/// Browsers evaluate `:scope` natively; the static backend matches direct
/// children by hand.
pub(crate) fn direct_child_selector(selector: &str) -> Option<&str> {
    selector
        .trim()
        .strip_prefix(":scope")
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('>'))
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_kind_parse() {
        assert_eq!("chromium".parse::<DriverKind>().unwrap(), DriverKind::Chromium);
        assert_eq!("STATIC".parse::<DriverKind>().unwrap(), DriverKind::Static);
        assert!("firefox".parse::<DriverKind>().is_err());
        assert_eq!(DriverKind::Static.to_string(), "static");
    }

    #[test]
    fn test_direct_child_selector() {
        assert_eq!(direct_child_selector(":scope > li"), Some("li"));
        assert_eq!(direct_child_selector(":scope>li.event"), Some("li.event"));
        assert_eq!(direct_child_selector("ul > li"), None);
    }
}
