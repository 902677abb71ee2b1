//! Extraction session lifecycle: open the page once, serve reads, close once.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::calendar::fallback_now;
use crate::driver::{ChromiumDriver, DriverKind, PageDriver, StaticPageDriver};
use crate::extract::{extract_events, extract_time_snapshot, MARKER_SELECTOR};
use crate::types::{CalendarEvent, SessionState, TimeSnapshot};

pub const DEFAULT_TARGET_URL: &str = "https://www.time.ir";
pub const DEFAULT_WAIT_SECS: u64 = 10;

/// Where to go and how long to wait for each element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub target_url: String,
    pub wait_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            wait_timeout: Duration::from_secs(DEFAULT_WAIT_SECS),
        }
    }
}

/// Owns the page driver and decides whether live extraction is possible.
///
/// Initialization never fails: if the page cannot be opened the session is
/// `Degraded` for its whole lifetime and every read answers from the local
/// clock (time data) or with an empty list (events). There is no retry.
///
/// Reads take `&mut self`; share a session behind a mutex to serialize callers.
pub struct ExtractionSession {
    driver: Option<Box<dyn PageDriver>>,
    state: SessionState,
    config: SessionConfig,
}

impl ExtractionSession {
    /// Navigate `driver` to the target page and wait for the marker element.
    pub async fn initialize(driver: Box<dyn PageDriver>, config: SessionConfig) -> Self {
        let mut session = Self {
            driver: Some(driver),
            state: SessionState::Uninitialized,
            config,
        };
        session.open().await;
        session
    }

    async fn open(&mut self) {
        let Some(driver) = self.driver.as_mut() else {
            return;
        };
        if self.state != SessionState::Uninitialized {
            return;
        }

        let url = &self.config.target_url;
        let wait = self.config.wait_timeout;

        tracing::info!("Navigating to {url}");
        let opened = async {
            driver.navigate(url).await?;
            driver.wait_for(MARKER_SELECTOR, wait).await.map(|_| ())
        }
        .await;

        self.state = match opened {
            Ok(()) => {
                tracing::info!("Extraction session ready");
                SessionState::Ready
            }
            Err(e) => {
                tracing::error!("Error initializing extraction session: {e}");
                SessionState::Degraded {
                    reason: e.to_string(),
                }
            }
        };
    }

    /// A session that never had a browser, e.g. because the launch failed.
    pub fn degraded(reason: impl Into<String>, config: SessionConfig) -> Self {
        Self {
            driver: None,
            state: SessionState::Degraded {
                reason: reason.into(),
            },
            config,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current time and dates; falls back to the local clock on any failure.
    pub async fn current_time_data(&mut self) -> TimeSnapshot {
        let driver = match (&self.state, self.driver.as_mut()) {
            (SessionState::Ready, Some(driver)) => driver,
            _ => {
                tracing::warn!("Page driver not ready. Using fallback time data.");
                return fallback_now();
            }
        };

        tracing::info!("Getting current time data");
        match extract_time_snapshot(&mut **driver, self.config.wait_timeout).await {
            Ok(snapshot) => {
                tracing::info!("Successfully retrieved time data");
                snapshot
            }
            Err(e) => {
                tracing::error!("Error fetching time data: {e}");
                fallback_now()
            }
        }
    }

    /// Monthly events in page order; empty when the page is unavailable.
    pub async fn events_data(&mut self) -> Vec<CalendarEvent> {
        let driver = match (&self.state, self.driver.as_mut()) {
            (SessionState::Ready, Some(driver)) => driver,
            _ => {
                tracing::warn!("Page driver not ready. Returning no events.");
                return Vec::new();
            }
        };

        tracing::info!("Getting events data");
        match extract_events(&mut **driver).await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Error fetching events data: {e}");
                Vec::new()
            }
        }
    }

    /// Release the browser. Teardown errors are logged, never returned.
    pub async fn close(&mut self) {
        let Some(mut driver) = self.driver.take() else {
            tracing::debug!("Extraction session already closed");
            return;
        };

        tracing::info!("Closing extraction session");
        if let Err(e) = driver.close().await {
            tracing::error!("Error closing page driver: {e}");
        }
        if self.state.is_ready() {
            self.state = SessionState::Degraded {
                reason: "session closed".to_string(),
            };
        }
    }
}

/// Build the requested driver and open a session on it.
///
/// A driver that cannot be built yields a degraded session rather than an error.
pub async fn open_session(kind: DriverKind, config: SessionConfig) -> ExtractionSession {
    let driver: Box<dyn PageDriver> = match kind {
        DriverKind::Chromium => match ChromiumDriver::launch().await {
            Ok(driver) => Box::new(driver),
            Err(e) => {
                tracing::error!("Error initializing extraction session: {e}");
                return ExtractionSession::degraded(e.to_string(), config);
            }
        },
        DriverKind::Static => match StaticPageDriver::new() {
            Ok(driver) => Box::new(driver),
            Err(e) => {
                tracing::error!("Error initializing extraction session: {e}");
                return ExtractionSession::degraded(e.to_string(), config);
            }
        },
    };

    ExtractionSession::initialize(driver, config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::NodeRef;
    use crate::types::{CrawlerError, CrawlerResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Driver that answers every lookup with a fixed text and counts calls.
    struct ScriptedDriver {
        navigate_ok: bool,
        close_ok: bool,
        calls: Arc<AtomicUsize>,
        closes: Arc<AtomicUsize>,
    }

    impl ScriptedDriver {
        fn new(navigate_ok: bool, close_ok: bool) -> Self {
            Self {
                navigate_ok,
                close_ok,
                calls: Arc::new(AtomicUsize::new(0)),
                closes: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl PageDriver for ScriptedDriver {
        async fn navigate(&mut self, url: &str) -> CrawlerResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.navigate_ok {
                Ok(())
            } else {
                Err(CrawlerError::Navigation(format!("{url}: unreachable")))
            }
        }

        async fn wait_for(&mut self, _selector: &str, _timeout: Duration) -> CrawlerResult<NodeRef> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(NodeRef(0))
        }

        async fn find_one(
            &mut self,
            _scope: Option<NodeRef>,
            selector: &str,
        ) -> CrawlerResult<Option<NodeRef>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CrawlerError::ElementNotFound(selector.to_string()))
        }

        async fn find_all(
            &mut self,
            _scope: Option<NodeRef>,
            _selector: &str,
        ) -> CrawlerResult<Vec<NodeRef>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn read_text(&mut self, _node: NodeRef) -> CrawlerResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("live".to_string())
        }

        async fn close(&mut self) -> CrawlerResult<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.close_ok {
                Ok(())
            } else {
                Err(CrawlerError::Closed)
            }
        }
    }

    #[tokio::test]
    async fn test_ready_session_reads_live_fields() {
        let mut session =
            ExtractionSession::initialize(Box::new(ScriptedDriver::new(true, true)), SessionConfig::default())
                .await;
        assert_eq!(session.state(), &SessionState::Ready);

        let snapshot = session.current_time_data().await;
        assert_eq!(snapshot.current_time, "live");
        assert_eq!(snapshot.gregorian_date, "live");
    }

    #[tokio::test]
    async fn test_failed_navigation_never_touches_driver_again() {
        let driver = ScriptedDriver::new(false, true);
        let calls = Arc::clone(&driver.calls);
        let mut session =
            ExtractionSession::initialize(Box::new(driver), SessionConfig::default()).await;

        assert!(matches!(session.state(), SessionState::Degraded { .. }));
        let after_init = calls.load(Ordering::SeqCst);

        let snapshot = session.current_time_data().await;
        assert_ne!(snapshot.current_time, "live");
        assert!(session.events_data().await.is_empty());
        assert!(session.events_data().await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), after_init);
        assert!(!session.is_ready());
    }

    #[tokio::test]
    async fn test_events_container_error_yields_empty_list() {
        let mut session =
            ExtractionSession::initialize(Box::new(ScriptedDriver::new(true, true)), SessionConfig::default())
                .await;
        assert!(session.events_data().await.is_empty());
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_swallows_errors() {
        let driver = ScriptedDriver::new(true, false);
        let closes = Arc::clone(&driver.closes);
        let mut session =
            ExtractionSession::initialize(Box::new(driver), SessionConfig::default()).await;

        session.close().await;
        session.close().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(!session.is_ready());

        let snapshot = session.current_time_data().await;
        assert_ne!(snapshot.current_time, "live");
    }

    #[tokio::test]
    async fn test_degraded_without_driver() {
        let mut session = ExtractionSession::degraded("launch failed", SessionConfig::default());
        assert_eq!(
            session.state(),
            &SessionState::Degraded {
                reason: "launch failed".to_string()
            }
        );
        assert!(session.events_data().await.is_empty());
        session.close().await;
    }
}
