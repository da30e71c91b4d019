#![allow(clippy::unwrap_used)]
// Coordinator lifecycle tests against a wiremock portal.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nrgym_api::Credentials;
use nrgym_core::{ConnectionState, Coordinator, CoreError, EntityState, PortalConfig, convert};

// ── Helpers ─────────────────────────────────────────────────────────

fn portal(suffix: &str) -> String {
    format!("/clientportal2/{suffix}")
}

fn config(server: &MockServer) -> PortalConfig {
    PortalConfig::new(
        Url::parse(&server.uri()).unwrap(),
        Credentials::new("member@example.com", "hunter2".to_string()),
    )
}

async fn mount(server: &MockServer, verb: &str, suffix: &str, response: ResponseTemplate) {
    Mock::given(method(verb))
        .and(path(portal(suffix)))
        .respond_with(response)
        .mount(server)
        .await;
}

fn json_ok(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

async fn mount_login(server: &MockServer) {
    mount(
        server,
        "POST",
        "Auth/Login",
        ResponseTemplate::new(200)
            .insert_header("Set-Cookie", "CpAuthToken=abc; Path=/")
            .set_body_json(json!({})),
    )
    .await;
}

async fn mount_portal(server: &MockServer) {
    mount_login(server).await;
    mount(
        server,
        "POST",
        "Auth/Login/Identity",
        json_ok(json!({ "Member": { "Id": 42, "HomeClubId": 9, "Email": "member@example.com" } })),
    )
    .await;
    mount(
        server,
        "GET",
        "MyCalendar/MyCalendar/GetCalendar",
        json_ok(json!({
            "FutureItems": { "Items": [
                { "ClassName": "Spin", "StartTimeUtc": "2099-01-01T10:00:00Z", "Zone": "Studio" }
            ] }
        })),
    )
    .await;
    mount(
        server,
        "POST",
        "Profile/Profile/GetProfileForEdit",
        json_ok(json!({
            "Model": { "UserId": 42, "PersonalData": { "FirstName": "Alex", "LastName": "Rivera" } }
        })),
    )
    .await;
    mount(
        server,
        "GET",
        "Products/ChooseProducts/GetProductsForUser",
        json_ok(json!({ "ClubName": "Leeds" })),
    )
    .await;
    mount(
        server,
        "POST",
        "Profile/Contracts/ContractList",
        json_ok(json!({ "Contracts": [{ "Name": "Flex", "Cost": { "Gross": 20 } }] })),
    )
    .await;
}

async fn mount_occupancy(server: &MockServer) {
    mount(
        server,
        "POST",
        "Clubs/Clubs/GetMembersInClubs",
        json_ok(json!({
            "UsersInClubList": [
                { "ClubId": 5, "ClubName": "Manchester", "UsersCountCurrentlyInClub": 10 },
                { "ClubId": 9, "ClubName": "Leeds", "UsersCountCurrentlyInClub": 4 }
            ]
        })),
    )
    .await;
}

// ── connect ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_adopts_home_club() {
    let server = MockServer::start().await;
    mount_portal(&server).await;

    let coordinator = Coordinator::new(config(&server)).unwrap();
    coordinator.connect().await.unwrap();

    assert_eq!(coordinator.club_id(), 9);
    assert_eq!(
        *coordinator.connection_state().borrow(),
        ConnectionState::Connected
    );
}

#[tokio::test]
async fn test_connect_keeps_configured_club() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path(portal("Auth/Login/Identity")))
        .respond_with(json_ok(json!({ "Member": { "HomeClubId": 9 } })))
        .expect(0)
        .mount(&server)
        .await;

    let mut cfg = config(&server);
    cfg.club_id = Some(12);
    let coordinator = Coordinator::new(cfg).unwrap();
    coordinator.connect().await.unwrap();

    assert_eq!(coordinator.club_id(), 12);
}

#[tokio::test]
async fn test_connect_falls_back_to_default_club() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount(
        &server,
        "POST",
        "Auth/Login/Identity",
        ResponseTemplate::new(500),
    )
    .await;

    let coordinator = Coordinator::new(config(&server)).unwrap();
    coordinator.connect().await.unwrap();

    assert_eq!(coordinator.club_id(), 5);
}

#[tokio::test]
async fn test_connect_rejected_credentials() {
    let server = MockServer::start().await;
    mount(&server, "POST", "Auth/Login", ResponseTemplate::new(401)).await;

    let coordinator = Coordinator::new(config(&server)).unwrap();
    let err = coordinator.connect().await.unwrap_err();

    assert!(err.is_auth(), "got: {err:?}");
    assert_eq!(
        *coordinator.connection_state().borrow(),
        ConnectionState::Failed
    );
}

// ── refresh ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_fills_every_section() {
    let server = MockServer::start().await;
    mount_portal(&server).await;
    mount_occupancy(&server).await;

    let coordinator = Coordinator::new(config(&server)).unwrap();
    coordinator.connect().await.unwrap();
    let snapshot = coordinator.refresh().await;

    assert!(snapshot.unavailable_sections().is_empty());
    assert_eq!(snapshot.club_id, 9);
    assert_eq!(snapshot.occupancy.get().unwrap().total, 14);
    assert_eq!(
        snapshot.profile.get().unwrap().club_name.as_deref(),
        Some("Leeds")
    );
    assert!(snapshot.refreshed_at.is_some());

    // The published snapshot is the one returned.
    assert_eq!(coordinator.snapshot().refreshed_at, snapshot.refreshed_at);
}

#[tokio::test]
async fn test_failed_section_is_isolated() {
    let server = MockServer::start().await;
    mount_portal(&server).await;
    mount(
        &server,
        "POST",
        "Clubs/Clubs/GetMembersInClubs",
        ResponseTemplate::new(503),
    )
    .await;

    let coordinator = Coordinator::new(config(&server)).unwrap();
    coordinator.connect().await.unwrap();
    let snapshot = coordinator.refresh().await;

    assert_eq!(snapshot.unavailable_sections(), vec!["occupancy"]);
    assert!(snapshot.bookings.is_available());

    let sensors = convert::sensors(&snapshot, chrono::Utc::now());
    let total = sensors.iter().find(|e| e.key == "occupancy_total").unwrap();
    assert_eq!(total.state, EntityState::Unavailable);
    let count = sensors.iter().find(|e| e.key == "count").unwrap();
    assert_eq!(count.state, EntityState::Value(1.into()));
}

// ── start / shutdown ────────────────────────────────────────────────

#[tokio::test]
async fn test_start_publishes_and_shutdown_disconnects() {
    let server = MockServer::start().await;
    mount_portal(&server).await;
    mount_occupancy(&server).await;

    let coordinator = Coordinator::new(config(&server)).unwrap();
    let mut updates = coordinator.subscribe();
    coordinator.connect().await.unwrap();

    let snapshot = coordinator.start().await;
    assert!(updates.has_changed().unwrap());
    assert_eq!(
        updates.borrow_and_update().refreshed_at,
        snapshot.refreshed_at
    );

    coordinator.shutdown().await;
    assert!(!coordinator.client().is_authenticated());
    assert_eq!(
        *coordinator.connection_state().borrow(),
        ConnectionState::Disconnected
    );
}

async fn calendar_hits(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == portal("MyCalendar/MyCalendar/GetCalendar"))
        .count()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_background_refresh_runs_each_interval_until_shutdown() {
    let server = MockServer::start().await;
    mount_portal(&server).await;
    mount_occupancy(&server).await;

    let mut cfg = config(&server);
    cfg.update_interval = Duration::from_millis(400);
    let coordinator = Coordinator::new(cfg).unwrap();
    let mut updates = coordinator.subscribe();
    coordinator.connect().await.unwrap();

    let first = coordinator.start().await;
    updates.borrow_and_update();

    // The interval's immediate tick is swallowed; no second refresh yet.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(calendar_hits(&server).await, 1);

    tokio::time::timeout(Duration::from_secs(5), updates.changed())
        .await
        .expect("no periodic refresh published")
        .unwrap();
    let second = updates.borrow_and_update().clone();
    assert!(second.refreshed_at > first.refreshed_at);
    assert_eq!(calendar_hits(&server).await, 2);

    coordinator.shutdown().await;
    let after_shutdown = calendar_hits(&server).await;
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(calendar_hits(&server).await, after_shutdown);
}

// ── oneshot ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_oneshot_runs_closure() {
    let server = MockServer::start().await;
    mount_portal(&server).await;
    mount_occupancy(&server).await;

    let total = Coordinator::oneshot(config(&server), |c| async move {
        Ok(c.client().get_occupancy().await?.total)
    })
    .await
    .unwrap();

    assert_eq!(total, 14);
}

#[tokio::test]
async fn test_oneshot_surfaces_login_failure() {
    let server = MockServer::start().await;
    mount(&server, "POST", "Auth/Login", ResponseTemplate::new(403)).await;

    let result = Coordinator::oneshot(config(&server), |_| async { Ok(()) }).await;

    assert!(matches!(result, Err(CoreError::AuthenticationFailed { .. })));
}
