//! Core data types for extracted time data and calendar events.

use serde::{Deserialize, Serialize};

/// Current clock value and today's date in the three calendars shown on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSnapshot {
    pub current_time: String,
    /// Solar Hijri (Persian) date.
    pub current_date: String,
    /// Lunar Hijri date.
    pub hijri_date: String,
    pub gregorian_date: String,
}

/// A single entry from the page's monthly events list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub date: String,
    /// Item text with the leading date stripped.
    pub title: String,
    /// Secondary date rendering, commonly empty.
    pub extra: String,
}

/// Lifecycle state of an extraction session.
///
/// A session moves out of `Uninitialized` exactly once and never returns to
/// `Ready` after becoming `Degraded`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Ready,
    Degraded { reason: String },
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready)
    }
}

/// Errors raised by page drivers and extraction.
///
/// None of these cross the session boundary; the session logs them and
/// answers with fallback data instead.
#[derive(thiserror::Error, Debug)]
pub enum CrawlerError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Timed out after {timeout_ms}ms waiting for '{selector}'")]
    WaitTimeout { selector: String, timeout_ms: u64 },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Stale element handle: {0}")]
    StaleNode(usize),

    #[error("Page driver is closed")]
    Closed,

    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convenience result type.
pub type CrawlerResult<T> = Result<T, CrawlerError>;
