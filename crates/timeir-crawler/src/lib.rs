//! TimeIr crawler: current time, calendar dates and monthly events read from
//! time.ir, with locally computed fallback data.

pub mod calendar;
pub mod driver;
pub mod extract;
pub mod session;
pub mod types;

pub use calendar::{fallback_now, fallback_snapshot};
pub use driver::{ChromiumDriver, DriverKind, NodeRef, PageDriver, StaticPageDriver};
pub use extract::{extract_events, extract_time_snapshot};
pub use session::{open_session, ExtractionSession, SessionConfig, DEFAULT_TARGET_URL};
pub use types::*;
