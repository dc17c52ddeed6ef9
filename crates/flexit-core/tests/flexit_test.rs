#![allow(clippy::unwrap_used)]
// Session-level tests for `Flexit` against a wiremock Climatix IC.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use flexit_api::points;
use flexit_core::{ConnectionState, Flexit, FlexitConfig, FlexitError, Mode, ReportedMode};

const PLANT: &str = "PLANT1";

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer) -> FlexitConfig {
    FlexitConfig {
        api_url: server.uri(),
        update_interval: Duration::ZERO,
        ..FlexitConfig::new("user@example.com", SecretString::from("pw".to_owned()))
    }
}

async fn mount_account(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/Token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "expires_in": 3600,
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Plants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": PLANT }])))
        .mount(server)
        .await;
}

async fn mount_points(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/DataPoints/Values"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn count(server: &MockServer, p: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == p)
        .count()
}

async fn connected(server: &MockServer) -> Flexit {
    mount_account(server).await;
    mount_points(
        server,
        json!([
            { "path": points::MODE, "value": "1" },
            { "path": points::HOME_AIR_TEMPERATURE, "value": 20.0 },
            { "path": points::MODEL_NAME, "value": "Nordic S3" },
        ]),
    )
    .await;
    let flexit = Flexit::new(config(server));
    flexit.connect().await.unwrap();
    flexit
}

// ── Setup ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_loads_snapshot_and_info() {
    let server = MockServer::start().await;
    let flexit = connected(&server).await;

    assert_eq!(*flexit.connection_state().borrow(), ConnectionState::Ready);
    assert_eq!(flexit.plant_id().as_deref(), Some(PLANT));
    assert_eq!(flexit.state().mode(), Some(ReportedMode::Known(Mode::Away)));
    assert_eq!(flexit.state().home_temperature(), Some(20.0));
    assert_eq!(flexit.device_info().model_name.as_deref(), Some("Nordic S3"));
    assert!(flexit.last_refresh().is_some());

    let identity = flexit.identity();
    assert_eq!(identity.name, "Flexit");
    assert_eq!(identity.manufacturer, "Flexit");
    assert_eq!(identity.model, "Nordic S3");
}

#[tokio::test]
async fn test_connect_with_bad_credentials_is_not_ready() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;

    let flexit = Flexit::new(config(&server));
    let err = flexit.connect().await.unwrap_err();

    assert!(matches!(err, FlexitError::NotReady(_)), "got: {err:?}");
    assert!(err.is_auth());
    assert_eq!(*flexit.connection_state().borrow(), ConnectionState::Failed);
    assert_eq!(count(&server, "/Plants").await, 0);
}

#[tokio::test]
async fn test_connect_without_plant_is_not_ready() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "expires_in": 3600,
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Plants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let flexit = Flexit::new(config(&server));
    let err = flexit.connect().await.unwrap_err();

    assert!(matches!(err.root(), FlexitError::Api { .. }), "got: {err:?}");
    assert_eq!(*flexit.connection_state().borrow(), ConnectionState::Failed);
}

#[tokio::test]
async fn test_failed_session_refuses_work_until_reconnected() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    Mock::given(method("GET"))
        .and(path("/DataPoints/Values"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_points(&server, json!([{ "path": points::MODE, "value": "2" }])).await;

    let flexit = Flexit::new(config(&server));
    assert!(flexit.connect().await.is_err());
    assert_eq!(*flexit.connection_state().borrow(), ConnectionState::Failed);

    let err = flexit.update_data().await.unwrap_err();
    assert!(matches!(err, FlexitError::NotReady(_)), "got: {err:?}");
    assert!(matches!(
        flexit.update_device_info().await,
        Err(FlexitError::NotReady(_))
    ));
    assert!(matches!(
        flexit.set_mode("Home").await,
        Err(FlexitError::NotReady(_))
    ));
    assert!(matches!(
        flexit.set_away_temperature(16.0).await,
        Err(FlexitError::NotReady(_))
    ));

    assert!(flexit.state().is_empty());
    assert_eq!(*flexit.connection_state().borrow(), ConnectionState::Failed);
    assert_eq!(count(&server, "/DataPoints/Values").await, 1);
    let writes = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "PUT")
        .count();
    assert_eq!(writes, 0);

    // A later successful connect makes the session usable again.
    flexit.connect().await.unwrap();
    assert_eq!(*flexit.connection_state().borrow(), ConnectionState::Ready);
    assert_eq!(flexit.state().mode(), Some(ReportedMode::Known(Mode::Home)));
}

#[tokio::test]
async fn test_identity_uses_configured_name() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    mount_points(&server, json!([{ "path": points::MODEL_NAME, "value": "Nordic S4" }])).await;

    let flexit = Flexit::new(FlexitConfig {
        name: "Ventilation".into(),
        ..config(&server)
    });
    flexit.connect().await.unwrap();

    let identity = flexit.identity();
    assert_eq!(identity.name, "Ventilation");
    assert_eq!(identity.identifiers[0].1, PLANT);
}

// ── Refresh ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_data_decodes_mode_code() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    mount_points(&server, json!([{ "path": points::MODE, "value": "1" }])).await;

    let flexit = Flexit::new(config(&server));
    let state = flexit.update_data().await.unwrap();

    assert_eq!(state.mode().unwrap().to_string(), "Away");
    assert_eq!(flexit.state(), state);
}

#[tokio::test]
async fn test_update_data_retries_once_after_unauthorized() {
    let server = MockServer::start().await;
    let flexit = connected(&server).await;

    let tokens_before = count(&server, "/Token").await;
    let reads_before = count(&server, "/DataPoints/Values").await;

    Mock::given(method("GET"))
        .and(path("/DataPoints/Values"))
        .respond_with(ResponseTemplate::new(401))
        .with_priority(1)
        .up_to_n_times(1)
        .mount(&server)
        .await;

    flexit.update_data().await.unwrap();

    assert_eq!(count(&server, "/DataPoints/Values").await - reads_before, 2);
    assert_eq!(count(&server, "/Token").await - tokens_before, 1);
    assert_eq!(*flexit.connection_state().borrow(), ConnectionState::Ready);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let server = MockServer::start().await;
    let flexit = connected(&server).await;
    let before = flexit.state();
    let refreshed_at = flexit.last_refresh();

    Mock::given(method("GET"))
        .and(path("/DataPoints/Values"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .with_priority(1)
        .mount(&server)
        .await;

    let err = flexit.update_data().await.unwrap_err();

    assert!(matches!(err, FlexitError::Api { status: Some(500), .. }), "got: {err:?}");
    assert_eq!(flexit.state(), before);
    assert_eq!(flexit.last_refresh(), refreshed_at);
    assert_eq!(*flexit.connection_state().borrow(), ConnectionState::Ready);
}

#[tokio::test]
async fn test_refresh_task_publishes_and_stops() {
    let server = MockServer::start().await;
    let flexit = connected(&server).await;
    let mut rx = flexit.subscribe();

    flexit.spawn_refresh(Duration::from_millis(50)).await;
    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("refresh task did not publish")
        .unwrap();

    flexit.shutdown().await;
    assert_eq!(
        *flexit.connection_state().borrow(),
        ConnectionState::Uninitialized
    );

    let reads = count(&server, "/DataPoints/Values").await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(count(&server, "/DataPoints/Values").await, reads);
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_mode_writes_code_to_put_path() {
    let server = MockServer::start().await;
    let flexit = connected(&server).await;

    Mock::given(method("PUT"))
        .and(path(format!(
            "/DataPoints/{PLANT}%3B1%21{}",
            &points::MODE_PUT[3..]
        )))
        .and(body_json(json!({ "Value": "2" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(flexit.set_mode("Home").await.unwrap(), 2);
}

#[tokio::test]
async fn test_set_mode_invalid_leaves_state_untouched() {
    let server = MockServer::start().await;
    let flexit = connected(&server).await;
    let before = flexit.state();

    let err = flexit.set_mode("Invalid").await.unwrap_err();

    assert!(matches!(err, FlexitError::InvalidMode { ref name } if name == "Invalid"));
    assert_eq!(flexit.state(), before);
    let puts = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method == wiremock::http::Method::PUT)
        .count();
    assert_eq!(puts, 0);
}

#[tokio::test]
async fn test_set_mode_rejected_surfaces_write_error() {
    let server = MockServer::start().await;
    let flexit = connected(&server).await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403).set_body_string("read only"))
        .mount(&server)
        .await;

    let err = flexit.set_mode("High").await.unwrap_err();
    match err {
        FlexitError::ApiWrite { path, message } => {
            assert_eq!(path, points::MODE_PUT);
            assert!(message.contains("read only"));
        }
        other => panic!("expected ApiWrite, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_setpoints_write_celsius() {
    let server = MockServer::start().await;
    let flexit = connected(&server).await;

    Mock::given(method("PUT"))
        .and(body_json(json!({ "Value": "21.5" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(body_json(json!({ "Value": "16" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    flexit.set_home_temperature(21.5).await.unwrap();
    flexit.set_away_temperature(16.0).await.unwrap();
}

#[tokio::test]
async fn test_setpoint_out_of_range_is_rejected_locally() {
    let server = MockServer::start().await;
    let flexit = connected(&server).await;

    for bad in [5.0, 35.0, f64::NAN] {
        let err = flexit.set_home_temperature(bad).await.unwrap_err();
        assert!(matches!(err, FlexitError::InvalidSetpoint { .. }), "got: {err:?}");
    }
    let puts = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method == wiremock::http::Method::PUT)
        .count();
    assert_eq!(puts, 0);
}

// ── One-shot ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_oneshot_runs_closure_and_shuts_down() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    mount_points(&server, json!([{ "path": points::MODE, "value": 3 }])).await;

    let mode = Flexit::oneshot(config(&server), |flexit| async move {
        Ok(flexit.state().mode())
    })
    .await
    .unwrap();

    assert_eq!(mode, Some(ReportedMode::Known(Mode::High)));
}
