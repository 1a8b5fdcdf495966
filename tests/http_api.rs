use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, StatusCode, header},
};
use data_api::app::{self, App};
use data_api::async_trait;
use data_api::config::{AppConfig, ConfigService};
use data_api::infrastructure::{ConnectionState, Connector, DatabaseError, Endpoint, Session};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt; // for oneshot

struct AlwaysUp;

#[async_trait]
impl Connector for AlwaysUp {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Session, DatabaseError> {
        Ok(Session::detached(endpoint.addr()))
    }
}

struct AlwaysDown;

#[async_trait]
impl Connector for AlwaysDown {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Session, DatabaseError> {
        Err(DatabaseError::Unreachable {
            addr: endpoint.addr(),
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        })
    }
}

fn test_config(overrides: &[(&str, &str)]) -> AppConfig {
    let source = ConfigService::default();
    source.set("DATABASE_CONNECT_ATTEMPTS", "2");
    source.set("DATABASE_RETRY_INITIAL_MS", "1");
    source.set("DATABASE_RETRY_MAX_MS", "2");
    for (key, value) in overrides {
        source.set(key, value);
    }
    AppConfig::from_service(&source).unwrap()
}

async fn connected_app() -> App {
    let app = App::with_connector(&test_config(&[]), Arc::new(AlwaysUp))
        .await
        .unwrap();
    assert!(
        app.database()
            .wait_for_state(ConnectionState::Connected, Duration::from_secs(2))
            .await
    );
    app
}

async fn unreachable_db_app() -> App {
    let app = App::with_connector(&test_config(&[]), Arc::new(AlwaysDown))
        .await
        .unwrap();

    for _ in 0..200 {
        if app.database().attempts() >= 2
            && app.database().state() == ConnectionState::Disconnected
        {
            return app;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("database retries did not finish");
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<(&str, &str)>,
) -> (StatusCode, Bytes) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some((content_type, payload)) => {
            builder = builder.header(header::CONTENT_TYPE, content_type);
            Body::from(payload.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes)
}

fn json_of(bytes: &Bytes) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn get_data_returns_fixed_message() {
    let app = connected_app().await;

    let (status, body) = send(&app.router(), "GET", "/api/data", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], br#"{"message":"Data retrieved successfully"}"#);
}

#[tokio::test]
async fn post_data_saves_with_or_without_body() {
    let app = connected_app().await;
    let router = app.router();

    let (status, body) = send(&router, "POST", "/api/data", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(&body[..], br#"{"message":"Data saved successfully"}"#);

    let (status, body) = send(
        &router,
        "POST",
        "/api/data",
        Some(("application/json", r#"{"anything":[1,2,3]}"#)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json_of(&body), json!({ "message": "Data saved successfully" }));
}

#[tokio::test]
async fn empty_bodies_are_accepted_repeatedly() {
    let app = connected_app().await;
    let router = app.router();

    for _ in 0..3 {
        let (status, _) = send(&router, "GET", "/api/data", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&router, "POST", "/api/data", None).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(&router, "POST", "/api/data", Some(("application/json", ""))).await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = connected_app().await;

    let (status, body) = send(
        &app.router(),
        "POST",
        "/api/data",
        Some(("application/json", "{not json")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = json_of(&body);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn non_json_bodies_pass_through() {
    let app = connected_app().await;

    let (status, _) = send(
        &app.router(),
        "POST",
        "/api/data",
        Some(("text/plain", "{not json")),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let config = test_config(&[("BODY_LIMIT_BYTES", "16")]);
    let app = App::with_connector(&config, Arc::new(AlwaysUp)).await.unwrap();

    let payload = json!({ "padding": "x".repeat(64) }).to_string();
    let (status, body) = send(
        &app.router(),
        "POST",
        "/api/data",
        Some(("application/json", &payload)),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json_of(&body)["error"], "payload_too_large");
}

#[tokio::test]
async fn declared_length_over_limit_is_rejected_before_reading() {
    let config = test_config(&[("BODY_LIMIT_BYTES", "16")]);
    let app = App::with_connector(&config, Arc::new(AlwaysUp)).await.unwrap();

    let payload = json!({ "padding": "x".repeat(64) }).to_string();
    let request = Request::builder()
        .method("POST")
        .uri("/api/data")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, payload.len())
        .body(Body::from(payload))
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(json_of(&body)["error"], "payload_too_large");
}

#[tokio::test]
async fn broken_body_stream_is_a_bad_request() {
    let app = connected_app().await;

    let chunks = futures::stream::iter(vec![
        Ok::<_, std::io::Error>("{"),
        Err(std::io::Error::from(std::io::ErrorKind::ConnectionReset)),
    ]);
    let request = Request::builder()
        .method("POST")
        .uri("/api/data")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from_stream(chunks))
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body = json_of(&body);
    assert_eq!(body["error"], "bad_request");
    assert_eq!(body["message"], "Failed to read request body");
}

#[tokio::test]
async fn unknown_routes_and_methods() {
    let app = connected_app().await;
    let router = app.router();

    let (status, _) = send(&router, "GET", "/api/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&router, "PUT", "/api/data", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn unreachable_database_does_not_stop_the_server() {
    let app = unreachable_db_app().await;
    let router = app.router();

    let (status, body) = send(&router, "GET", "/api/data", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body), json!({ "message": "Data retrieved successfully" }));

    let (status, body) = send(&router, "GET", "/api/users", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_of(&body)["error"], "database_unavailable");

    let (status, body) = send(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_of(&body);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn user_crud_round_trip() {
    let app = connected_app().await;
    let router = app.router();

    let (status, body) = send(
        &router,
        "POST",
        "/api/users",
        Some((
            "application/json",
            r#"{"name":"Ada","email":"ada@example.com"}"#,
        )),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = json_of(&body);
    assert_eq!(created["success"], true);
    assert_eq!(created["message"], "User created");
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&router, "GET", &format!("/api/users/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_of(&body),
        json!({
            "success": true,
            "data": { "id": id, "name": "Ada", "email": "ada@example.com" }
        })
    );

    let update = json!({ "id": id, "name": "Ada Lovelace" }).to_string();
    let (status, body) = send(
        &router,
        "PATCH",
        "/api/users",
        Some(("application/json", &update)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated = json_of(&body);
    assert_eq!(updated["data"]["name"], "Ada Lovelace");
    assert_eq!(updated["data"]["email"], "ada@example.com");

    let (status, body) = send(&router, "GET", "/api/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(&router, "DELETE", &format!("/api/users/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body), json!({ "success": true, "message": "User deleted" }));

    let (status, body) = send(&router, "GET", &format!("/api/users/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json_of(&body)["error"], "not_found");
}

#[tokio::test]
async fn create_user_requires_payload_fields() {
    let app = connected_app().await;
    let router = app.router();

    let (status, body) = send(&router, "POST", "/api/users", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["message"], "Request body required");

    let (status, body) = send(
        &router,
        "POST",
        "/api/users",
        Some(("application/json", r#"{"name":"Ada"}"#)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["error"], "bad_request");
}

#[tokio::test]
async fn serves_on_configured_address_and_shuts_down() {
    let config = test_config(&[("HOST", "127.0.0.1"), ("PORT", "0")]);
    let app = App::with_connector(&config, Arc::new(AlwaysUp)).await.unwrap();
    let database = app.database().clone();
    assert!(
        database
            .wait_for_state(ConnectionState::Connected, Duration::from_secs(2))
            .await
    );

    let listener = app::bind(&config.server).await.unwrap();
    let addr = listener.local_addr().unwrap();
    assert!(addr.ip().is_loopback());

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(app.serve_with_shutdown(listener, async move {
        let _ = stop_rx.await;
    }));

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /api/data HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8_lossy(&raw);
    assert!(raw.starts_with("HTTP/1.1 200"));
    assert!(raw.ends_with(r#"{"message":"Data retrieved successfully"}"#));

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
    assert_eq!(database.state(), ConnectionState::Disconnected);
}
