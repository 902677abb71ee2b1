//! Field extraction from a rendered time.ir page.
//!
//! Selectors are fixed and mirror the page's markup; a redesign of the page
//! shows up as lookup failures, which callers turn into fallback data.

use std::time::Duration;

use crate::driver::{NodeRef, PageDriver};
use crate::types::{CalendarEvent, CrawlerError, CrawlerResult, TimeSnapshot};

/// Present once the date widgets have rendered.
pub const MARKER_SELECTOR: &str = "div[class*='todayDate']";
pub const CLOCK_SELECTOR: &str = "div#digitalClock";
pub const SHAMSI_DATE_SELECTOR: &str = "div[class*='today-shamsi'] span[class*='date']";
pub const HIJRI_DATE_SELECTOR: &str = "div[class*='today-hijri'] span[class*='date']";
pub const GREGORIAN_DATE_SELECTOR: &str = "div[class*='today-gregorian'] span[class*='date']";
pub const EVENTS_LIST_SELECTOR: &str = "ul[class*='list-unstyled']";
pub const EVENT_ITEM_SELECTOR: &str = ":scope > li";
pub const SPAN_SELECTOR: &str = "span";

/// Read the clock and the three dates. Any failed lookup fails the whole read.
pub async fn extract_time_snapshot(
    driver: &mut dyn PageDriver,
    wait: Duration,
) -> CrawlerResult<TimeSnapshot> {
    let current_time = read_field(driver, CLOCK_SELECTOR, wait).await?;
    tracing::debug!("Current time: {current_time}");

    let current_date = read_field(driver, SHAMSI_DATE_SELECTOR, wait).await?;
    tracing::debug!("Current date: {current_date}");

    let hijri_date = read_field(driver, HIJRI_DATE_SELECTOR, wait).await?;
    tracing::debug!("Hijri date: {hijri_date}");

    let gregorian_date = read_field(driver, GREGORIAN_DATE_SELECTOR, wait).await?;
    tracing::debug!("Gregorian date: {gregorian_date}");

    Ok(TimeSnapshot {
        current_time,
        current_date,
        hijri_date,
        gregorian_date,
    })
}

async fn read_field(
    driver: &mut dyn PageDriver,
    selector: &str,
    wait: Duration,
) -> CrawlerResult<String> {
    let node = driver.wait_for(selector, wait).await?;
    driver.read_text(node).await
}

/// Read the monthly events list in document order.
///
/// Items without a date span are logged and skipped; the container missing
/// is an error.
pub async fn extract_events(driver: &mut dyn PageDriver) -> CrawlerResult<Vec<CalendarEvent>> {
    let list = driver
        .find_one(None, EVENTS_LIST_SELECTOR)
        .await?
        .ok_or_else(|| CrawlerError::ElementNotFound(EVENTS_LIST_SELECTOR.to_string()))?;

    let items = driver.find_all(Some(list), EVENT_ITEM_SELECTOR).await?;
    let mut events = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        match extract_event(driver, item).await {
            Ok(event) => events.push(event),
            Err(e) => tracing::warn!("Skipping event item {index}: {e}"),
        }
    }

    tracing::info!("Extracted {} events", events.len());
    Ok(events)
}

async fn extract_event(driver: &mut dyn PageDriver, item: NodeRef) -> CrawlerResult<CalendarEvent> {
    let date_node = driver
        .find_one(Some(item), SPAN_SELECTOR)
        .await?
        .ok_or_else(|| CrawlerError::ElementNotFound(format!("{SPAN_SELECTOR} in event item")))?;
    let date = driver.read_text(date_node).await?;

    let full_text = driver.read_text(item).await?;
    let title = strip_date_prefix(&full_text, &date);

    let spans = driver.find_all(Some(item), SPAN_SELECTOR).await?;
    let extra = match spans.get(1) {
        Some(node) => driver.read_text(*node).await?,
        None => String::new(),
    };

    Ok(CalendarEvent { date, title, extra })
}

/// Drop a leading `date` from `text`. Text not starting with it is kept whole.
pub fn strip_date_prefix(text: &str, date: &str) -> String {
    match text.strip_prefix(date) {
        Some(rest) if !date.is_empty() => rest.trim().to_string(),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_date_prefix() {
        assert_eq!(strip_date_prefix("1 فروردین  جشن نوروز", "1 فروردین"), "جشن نوروز");
        assert_eq!(strip_date_prefix("Nowruz 1 Farvardin", "1 Farvardin"), "Nowruz 1 Farvardin");
        assert_eq!(strip_date_prefix("title only", ""), "title only");
        assert_eq!(strip_date_prefix("12", "12"), "");
    }
}
