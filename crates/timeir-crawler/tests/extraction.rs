//! Session and extraction tests against a local copy of the page markup.

use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use timeir_crawler::{
    fallback_snapshot, ExtractionSession, SessionConfig, SessionState, StaticPageDriver,
};

const FIXTURE: &str = include_str!("fixtures/time_ir.html");

// ─────────────────────── helpers ───────────────────────

async fn serve(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;
    server
}

fn config(url: String) -> SessionConfig {
    SessionConfig {
        target_url: url,
        wait_timeout: Duration::from_millis(200),
    }
}

async fn session_for(url: String) -> ExtractionSession {
    ExtractionSession::initialize(Box::new(StaticPageDriver::new().unwrap()), config(url)).await
}

/// True when `snapshot` matches the fallback for `before` or `after`.
fn within_tick(snapshot: &timeir_crawler::TimeSnapshot, before: NaiveDateTime, after: NaiveDateTime) -> bool {
    let mut t = before;
    while t <= after + chrono::Duration::seconds(1) {
        if &fallback_snapshot(t) == snapshot {
            return true;
        }
        t += chrono::Duration::seconds(1);
    }
    false
}

// ═══════════════════════ live path ═══════════════════════

#[tokio::test]
async fn test_live_snapshot_is_verbatim_trimmed_text() {
    let server = serve(FIXTURE).await;
    let mut session = session_for(server.uri()).await;
    assert_eq!(session.state(), &SessionState::Ready);

    let snapshot = session.current_time_data().await;
    assert_eq!(snapshot.current_time, "۱۳:۰۵:۰۹");
    assert_eq!(snapshot.current_date, "۱ فروردین ۱۴۰۳");
    assert_eq!(snapshot.hijri_date, "۱۰ رمضان ۱۴۴۵");
    assert_eq!(snapshot.gregorian_date, "2024-03-20");
}

#[tokio::test]
async fn test_events_skip_items_without_span() {
    let server = serve(FIXTURE).await;
    let mut session = session_for(server.uri()).await;

    let events = session.events_data().await;
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|e| !e.date.is_empty() && !e.title.is_empty()));

    assert_eq!(events[0].date, "۱ فروردین");
    assert_eq!(events[0].title, "جشن نوروز/جشن سال نو");
    assert_eq!(events[0].extra, "");

    assert_eq!(events[1].date, "۲ فروردین");
    assert!(events[1].title.starts_with("عیدنوروز"));
    assert_eq!(events[1].extra, "[21 March]");

    assert_eq!(events[2].date, "۱۲ فروردین");
    assert_eq!(events[3].extra, "[1 April]");

    for event in &events {
        assert!(!event.title.starts_with(&event.date));
    }
}

#[tokio::test]
async fn test_repeated_reads_are_independent() {
    let server = serve(FIXTURE).await;
    let mut session = session_for(server.uri()).await;

    let first = session.events_data().await;
    let second = session.events_data().await;
    assert_eq!(first, second);

    assert_eq!(
        session.current_time_data().await,
        session.current_time_data().await
    );
}

#[tokio::test]
async fn test_missing_field_discards_partial_live_data() {
    let without_hijri = FIXTURE.replace("today-hijri", "today-lunar");
    let server = serve(&without_hijri).await;
    let mut session = session_for(server.uri()).await;
    assert!(session.is_ready());

    let before = Local::now().naive_local();
    let snapshot = session.current_time_data().await;
    let after = Local::now().naive_local();

    assert_ne!(snapshot.current_time, "۱۳:۰۵:۰۹");
    assert!(within_tick(&snapshot, before, after), "not a fallback: {snapshot:?}");
}

#[tokio::test]
async fn test_missing_events_container_yields_empty_list() {
    let server = serve(&FIXTURE.replace("list-unstyled", "list-styled")).await;
    let mut session = session_for(server.uri()).await;
    assert!(session.is_ready());
    assert!(session.events_data().await.is_empty());
}

// ═══════════════════════ degraded path ═══════════════════════

#[tokio::test]
async fn test_unreachable_page_degrades_to_fallback() {
    // Nothing listens on port 9 on a test machine.
    let mut session = session_for("http://127.0.0.1:9/".to_string()).await;
    assert!(matches!(session.state(), SessionState::Degraded { .. }));

    let before = Local::now().naive_local();
    let snapshot = session.current_time_data().await;
    let after = Local::now().naive_local();

    assert!(within_tick(&snapshot, before, after), "not a fallback: {snapshot:?}");
    assert_eq!(snapshot.current_time.len(), 8);
    assert!(session.events_data().await.is_empty());
}

#[tokio::test]
async fn test_missing_marker_degrades_permanently() {
    let server = serve(&FIXTURE.replace("todayDate", "yesterday")).await;
    let mut session = session_for(server.uri()).await;
    assert!(matches!(session.state(), SessionState::Degraded { .. }));

    // The page is fine apart from the marker, but the session never retries.
    assert!(session.events_data().await.is_empty());
    assert!(!session.is_ready());
}

#[tokio::test]
async fn test_double_close_is_harmless() {
    let server = serve(FIXTURE).await;
    let mut session = session_for(server.uri()).await;
    session.close().await;
    session.close().await;
    assert!(session.events_data().await.is_empty());
}
