#![allow(clippy::unwrap_used)]
// End-to-end tests for the device controls against a wiremock backend.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vandash_api::ApiClient;
use vandash_core::{
    Command, CommandResult, Dashboard, DashboardConfig, MutationStatus, ToastStatus,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn dashboard(server: &MockServer) -> Dashboard {
    let url = Url::parse(&server.uri()).unwrap();
    let client = ApiClient::with_client(reqwest::Client::new(), url.clone());
    Dashboard::with_client(DashboardConfig::new(url), client)
}

async fn mount_led_status(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/leds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "on": false,
            "brightness": 50,
            "color": [255, 255, 255]
        })))
        .mount(server)
        .await;
}

async fn configure_posts(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "POST" && r.url.path() == "/leds/configure")
        .count()
}

// ── LEDs ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_led_edits_collapse_into_one_configure() {
    let server = MockServer::start().await;
    mount_led_status(&server).await;
    Mock::given(method("POST"))
        .and(path("/leds/configure"))
        .and(body_partial_json(json!({"on": true, "brightness": 80})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "on": true,
            "brightness": 80,
            "color": [255, 255, 255]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    let leds = dashboard.leds();
    let seeded = leds.ready().await.unwrap();
    assert!(!seeded.on);
    assert_eq!(seeded.brightness, 50);
    assert_eq!(leds.toggle_label(), "On");

    let mut results = leds.mutations();
    assert!(leds.toggle());
    // The label follows the local buffer before anything is sent.
    assert_eq!(leds.toggle_label(), "Off");
    assert!(leds.set_brightness(80));
    assert!(leds.is_pending());
    assert_eq!(configure_posts(&server).await, 0);

    tokio::time::timeout(Duration::from_secs(5), results.changed())
        .await
        .unwrap()
        .unwrap();
    let state = results.borrow().clone().unwrap();
    assert_eq!(state.status, MutationStatus::Success);

    let toast = dashboard.toaster().current();
    assert_eq!(toast.message.as_deref(), Some("LEDs are on"));
    assert_eq!(toast.status, ToastStatus::Success);

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(configure_posts(&server).await, 1);
}

#[tokio::test]
async fn test_led_failure_keeps_local_edit_and_toasts_error() {
    let server = MockServer::start().await;
    mount_led_status(&server).await;
    Mock::given(method("POST"))
        .and(path("/leds/configure"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "Invalid color format"})),
        )
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    let leds = dashboard.leds();
    leds.ready().await.unwrap();

    let mut results = leds.mutations();
    assert!(leds.set_brightness(20));
    tokio::time::timeout(Duration::from_secs(5), results.changed())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(leds.settings().unwrap().brightness, 20);
    let toast = dashboard.toaster().current();
    assert_eq!(toast.message.as_deref(), Some("Invalid color format"));
    assert_eq!(toast.status, ToastStatus::Error);
}

#[tokio::test]
async fn test_unmount_cancels_pending_debounce() {
    let server = MockServer::start().await;
    mount_led_status(&server).await;
    Mock::given(method("POST"))
        .and(path("/leds/configure"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"on": true})))
        .expect(0)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    let leds = dashboard.leds();
    leds.ready().await.unwrap();
    assert!(leds.toggle());
    drop(leds);

    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(configure_posts(&server).await, 0);
}

#[tokio::test]
async fn test_unmount_lets_in_flight_request_finish_without_toast() {
    let server = MockServer::start().await;
    mount_led_status(&server).await;
    Mock::given(method("POST"))
        .and(path("/leds/configure"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"on": true}))
                .set_delay(Duration::from_millis(400)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    let leds = dashboard.leds();
    leds.ready().await.unwrap();
    assert!(leds.toggle());

    // Past the debounce, while the request is still in flight.
    tokio::time::sleep(Duration::from_millis(650)).await;
    drop(leds);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(configure_posts(&server).await, 1);
    assert!(!dashboard.toaster().current().is_visible());
}

// ── Inverter ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_inverter_toggle_updates_label_and_toasts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inverter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"on": false})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/inverter/toggle"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "on": true})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    let inverter = dashboard.inverter();
    let mut status = inverter.status().watch();
    status
        .wait_for(|s| s.data.is_some() && !s.is_fetching())
        .await
        .unwrap();
    assert_eq!(inverter.label(), "Turn Inverter On");

    let mut toasts = dashboard.toaster().subscribe();
    let handle = inverter.toggle();
    assert_eq!(handle.settled().await.status, MutationStatus::Success);

    tokio::time::timeout(Duration::from_secs(2), toasts.wait_for(|t| t.is_visible()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        dashboard.toaster().current().message.as_deref(),
        Some("Inverter is on")
    );
    assert_eq!(inverter.label(), "Turn Inverter Off");
}

#[tokio::test]
async fn test_inverter_refetches_on_every_mount() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inverter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"on": true})))
        .expect(2)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    for _ in 0..2 {
        let inverter = dashboard.inverter();
        let mut status = inverter.status().watch();
        status
            .wait_for(|s| s.data.is_some() && !s.is_fetching())
            .await
            .unwrap();
        assert_eq!(inverter.is_on(), Some(true));
    }
}

#[tokio::test]
async fn test_mutate_runs_command_in_background() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/inverter/toggle"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "on": false})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server);
    let handle = dashboard.mutate(Command::ToggleInverter);
    let state = handle.settled().await;
    assert_eq!(state.id, handle.id());
    assert_eq!(state.status, MutationStatus::Success);
    match state.into_result().unwrap() {
        CommandResult::Inverter(resp) => assert!(resp.success && !resp.on),
        other => panic!("unexpected result: {other:?}"),
    }
    // Bare mutations don't toast; that is left to the controls.
    assert!(!dashboard.toaster().current().is_visible());
}

// ── Snapshot ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_snapshot_reports_each_resource_independently() {
    let server = MockServer::start().await;
    mount_led_status(&server).await;
    Mock::given(method("GET"))
        .and(path("/inverter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"on": true})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/smartshunt/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "voltage": 13.2,
            "current": -4.5,
            "power": -59.4,
            "state_of_charge_percent": "87%",
            "consumed_ah": -12.0,
            "time_to_go_min": "2 Days remaining"
        })))
        .mount(&server)
        .await;

    let snapshot = dashboard(&server).snapshot().await;
    assert!(snapshot.inverter.unwrap().on);
    assert_eq!(snapshot.leds.unwrap().brightness, Some(50));
    assert!(snapshot.level.is_err());
    let battery = snapshot.battery.unwrap();
    assert_eq!(battery.state_of_charge_percent.as_f64(), Some(87.0));
}
