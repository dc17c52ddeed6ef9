#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use flexit_api::points;
use flexit_api::{
    ApiClient, Credentials, DEFAULT_SUBSCRIPTION_KEY, Error, PointValue, Token, TransportConfig,
};

const PLANT: &str = "PLANT1";

// ── Helpers ─────────────────────────────────────────────────────────

fn credentials() -> Credentials {
    Credentials::new("user@example.com", SecretString::from("hunter2".to_owned()))
}

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client =
        ApiClient::new(&server.uri(), &credentials(), &TransportConfig::default()).unwrap();
    (server, client)
}

fn token_response(token: &str, expires_in: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": token,
        "token_type": "bearer",
        "expires_in": expires_in,
    }))
}

async fn mount_token(server: &MockServer, token: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/Token"))
        .respond_with(token_response(token, 3600))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_plants(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/Plants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": PLANT, "name": "Home" }]
        })))
        .mount(server)
        .await;
}

fn values_body() -> serde_json::Value {
    json!({
        "values": {
            format!("{PLANT}{}", points::MODE): { "value": { "value": 2 } },
            format!("{PLANT}{}", points::ROOM_TEMPERATURE): { "value": { "value": 21.5 } },
        }
    })
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_authenticate_sends_password_grant() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/Token"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=user%40example.com"))
        .and(body_string_contains("password=hunter2"))
        .and(header("Ocp-Apim-Subscription-Key", DEFAULT_SUBSCRIPTION_KEY))
        .respond_with(token_response("tok-1", 3600))
        .expect(1)
        .mount(&server)
        .await;

    let before = Utc::now();
    let token = client.authenticator().authenticate().await.unwrap();

    assert_eq!(token.access_token(), "tok-1");
    // now + 3600 - 60s margin
    let expected = before + TimeDelta::seconds(3540);
    let drift = (token.expires_at() - expected).num_seconds().abs();
    assert!(drift <= 5, "expiry off by {drift}s");
}

#[tokio::test]
async fn test_authenticate_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/Token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;

    let result = client.authenticator().authenticate().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_authenticate_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/Token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "nope" })))
        .mount(&server)
        .await;

    let result = client.authenticator().authenticate().await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
}

#[tokio::test]
async fn test_ensure_valid_keeps_fresh_token() {
    let (server, client) = setup().await;
    mount_token(&server, "unused", 0).await;

    let fresh = Token::new("fresh", Utc::now() + TimeDelta::seconds(600));
    let token = client.authenticator().ensure_valid(fresh).await.unwrap();

    assert_eq!(token.access_token(), "fresh");
}

#[tokio::test]
async fn test_ensure_valid_refreshes_expired_token() {
    let (server, client) = setup().await;
    mount_token(&server, "renewed", 1).await;

    let stale = Token::new("stale", Utc::now() - TimeDelta::seconds(1));
    let token = client.authenticator().ensure_valid(stale).await.unwrap();

    assert_eq!(token.access_token(), "renewed");
}

#[tokio::test]
async fn test_token_reused_across_requests() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 1).await;
    mount_plants(&server).await;

    Mock::given(method("GET"))
        .and(path("/DataPoints/Values"))
        .respond_with(ResponseTemplate::new(200).set_body_json(values_body()))
        .expect(2)
        .mount(&server)
        .await;

    client.fetch_points(PLANT, &[points::MODE]).await.unwrap();
    client.fetch_points(PLANT, &[points::MODE]).await.unwrap();
}

#[tokio::test]
async fn test_margin_larger_than_lifetime_forces_login_each_time() {
    let server = MockServer::start().await;
    let client = ApiClient::new(&server.uri(), &credentials(), &TransportConfig::default())
        .unwrap()
        .with_token_margin(Duration::from_secs(7200));
    mount_token(&server, "short", 2).await;

    Mock::given(method("GET"))
        .and(path("/DataPoints/Values"))
        .respond_with(ResponseTemplate::new(200).set_body_json(values_body()))
        .mount(&server)
        .await;

    client.fetch_points(PLANT, &[points::MODE]).await.unwrap();
    client.fetch_points(PLANT, &[points::MODE]).await.unwrap();
}

// ── 401 retry tests ─────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_retries_once_after_reauth() {
    let (server, client) = setup().await;
    mount_token(&server, "tok", 2).await;

    // First data request is rejected, the second succeeds.
    Mock::given(method("GET"))
        .and(path("/DataPoints/Values"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/DataPoints/Values"))
        .respond_with(ResponseTemplate::new(200).set_body_json(values_body()))
        .expect(1)
        .mount(&server)
        .await;

    let map = client.fetch_points(PLANT, &[points::MODE]).await.unwrap();
    assert_eq!(map[points::MODE].value, Some(PointValue::Number(2.0)));
}

#[tokio::test]
async fn test_persistent_unauthorized_is_not_retried_twice() {
    let (server, client) = setup().await;
    mount_token(&server, "tok", 2).await;

    Mock::given(method("GET"))
        .and(path("/DataPoints/Values"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .expect(2)
        .mount(&server)
        .await;

    let result = client.fetch_points(PLANT, &[points::MODE]).await;
    match result {
        Err(Error::Api { status, .. }) => assert_eq!(status, 401),
        other => panic!("expected Api 401, got: {other:?}"),
    }
}

// ── Plant tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_resolve_plant_is_cached() {
    let (server, client) = setup().await;
    mount_token(&server, "tok", 1).await;

    Mock::given(method("GET"))
        .and(path("/Plants"))
        .and(header("Authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": PLANT }])))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.plant_id(), None);
    assert_eq!(client.resolve_plant().await.unwrap(), PLANT);
    assert_eq!(client.resolve_plant().await.unwrap(), PLANT);
    assert_eq!(client.plant_id(), Some(PLANT));
}

#[tokio::test]
async fn test_resolve_plant_empty_list() {
    let (server, client) = setup().await;
    mount_token(&server, "tok", 1).await;

    Mock::given(method("GET"))
        .and(path("/Plants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;

    let result = client.resolve_plant().await;
    assert!(
        matches!(result, Err(Error::NoPlant)),
        "expected NoPlant, got: {result:?}"
    );
    assert_eq!(client.plant_id(), None);
}

// ── Read tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_points_sends_filter_and_headers() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-xyz", 1).await;

    let filter = format!(
        r#"[{{"DataPoints":"{PLANT}{}"}},{{"DataPoints":"{PLANT}{}"}}]"#,
        points::MODE,
        points::ROOM_TEMPERATURE
    );

    Mock::given(method("GET"))
        .and(path("/DataPoints/Values"))
        .and(query_param("filterId", filter.as_str()))
        .and(header("Authorization", "Bearer tok-xyz"))
        .and(header("Ocp-Apim-Subscription-Key", DEFAULT_SUBSCRIPTION_KEY))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(values_body()))
        .expect(1)
        .mount(&server)
        .await;

    let map = client
        .fetch_points(PLANT, &[points::MODE, points::ROOM_TEMPERATURE])
        .await
        .unwrap();

    assert_eq!(map.len(), 2);
    assert_eq!(
        map[points::ROOM_TEMPERATURE].value,
        Some(PointValue::Number(21.5))
    );
}

#[tokio::test]
async fn test_fetch_points_list_shape() {
    let (server, client) = setup().await;
    mount_token(&server, "tok", 1).await;

    Mock::given(method("GET"))
        .and(path("/DataPoints/Values"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "path": points::MODE, "value": "1" },
            { "path": points::HEATER, "value": true },
        ])))
        .mount(&server)
        .await;

    let map = client
        .fetch_points(PLANT, &[points::MODE, points::HEATER])
        .await
        .unwrap();

    assert_eq!(map[points::MODE].value, Some(PointValue::Text("1".into())));
    assert_eq!(map[points::HEATER].value, Some(PointValue::Bool(true)));
}

#[tokio::test]
async fn test_fetch_points_server_error() {
    let (server, client) = setup().await;
    mount_token(&server, "tok", 1).await;

    Mock::given(method("GET"))
        .and(path("/DataPoints/Values"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client.fetch_points(PLANT, &[points::MODE]).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_fetch_device_info() {
    let (server, client) = setup().await;
    mount_token(&server, "tok", 1).await;

    Mock::given(method("GET"))
        .and(path("/DataPoints/Values"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": {
                format!("{PLANT}{}", points::MODEL_NAME): { "value": { "value": "Nordic S4" } },
                format!("{PLANT}{}", points::SERIAL_NUMBER): { "value": { "value": "800110-123" } },
                format!("{PLANT}{}", points::FIRMWARE_REVISION): { "value": { "value": "1.11.2" } },
            }
        })))
        .mount(&server)
        .await;

    let info = client.fetch_device_info(PLANT).await.unwrap();
    assert_eq!(info.model_name.as_deref(), Some("Nordic S4"));
    assert_eq!(info.serial_info.as_deref(), Some("800110-123"));
    assert_eq!(info.fw.as_deref(), Some("1.11.2"));
    assert_eq!(info.system_status, None);
}

// ── Write tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_write_point_escapes_id_and_sends_string_value() {
    let (server, client) = setup().await;
    mount_token(&server, "tok", 1).await;

    Mock::given(method("PUT"))
        .and(path("/DataPoints/PLANT1%3B1%2101300002A000055"))
        .and(body_json(json!({ "Value": "2" })))
        .and(header("Authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "stateTexts": {} })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .write_point(PLANT, points::MODE_PUT, &PointValue::from(2u8))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_write_point_rejected() {
    let (server, client) = setup().await;
    mount_token(&server, "tok", 1).await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(400).set_body_string("value out of range"))
        .mount(&server)
        .await;

    let result = client
        .write_point(PLANT, points::HOME_AIR_TEMPERATURE, &PointValue::from(99.0))
        .await;

    match result {
        Err(Error::Write {
            path, status, message,
        }) => {
            assert_eq!(path, points::HOME_AIR_TEMPERATURE);
            assert_eq!(status, 400);
            assert_eq!(message, "value out of range");
        }
        other => panic!("expected Write error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_write_point_retries_after_unauthorized() {
    let (server, client) = setup().await;
    mount_token(&server, "tok", 2).await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client
        .write_point(PLANT, points::AWAY_AIR_TEMPERATURE, &PointValue::from(16.5))
        .await
        .unwrap();
}
