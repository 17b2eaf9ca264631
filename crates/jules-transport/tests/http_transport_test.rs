//! `HttpTransport` against a local axum server.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::Query,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use jules_core::{ClientError, HttpMethod, SdkConfig, Transport, TransportError};
use jules_transport::{API_KEY_HEADER, HttpTransport};
use serde_json::{Value, json};

async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn transport(base_url: &str) -> HttpTransport {
    let config = SdkConfig::default().with_base_url(base_url);
    HttpTransport::new(&config, "test-key").unwrap()
}

#[tokio::test]
async fn sends_api_key_and_decodes_json() {
    let app = Router::new().route(
        "/sources",
        get(|headers: HeaderMap| async move {
            let key = headers
                .get(API_KEY_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            Json(json!({ "sources": [{ "name": "sources/a" }], "key": key }))
        }),
    );
    let base = spawn_server(app).await;

    let value = transport(&base)
        .request(HttpMethod::Get, "/sources", None)
        .await
        .unwrap();

    assert_eq!(value["key"], "test-key");
    assert_eq!(value["sources"][0]["name"], "sources/a");
}

#[tokio::test]
async fn posts_json_body() {
    let app = Router::new().route(
        "/sessions",
        post(|Json(body): Json<Value>| async move { Json(json!({ "echo": body })) }),
    );
    let base = spawn_server(app).await;

    let value = transport(&base)
        .request(
            HttpMethod::Post,
            "/sessions",
            Some(json!({ "prompt": "Test Application" })),
        )
        .await
        .unwrap();

    assert_eq!(value["echo"]["prompt"], "Test Application");
}

#[tokio::test]
async fn forwards_query_string() {
    let app = Router::new().route(
        "/sources",
        get(|Query(params): Query<HashMap<String, String>>| async move { Json(json!(params)) }),
    );
    let base = spawn_server(app).await;

    let value = transport(&base)
        .request(HttpMethod::Get, "/sources?pageSize=2&pageToken=abc", None)
        .await
        .unwrap();

    assert_eq!(value["pageSize"], "2");
    assert_eq!(value["pageToken"], "abc");
}

#[tokio::test]
async fn non_success_status_is_api_error_with_body() {
    let app = Router::new().route(
        "/sessions/s1/activities",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base = spawn_server(app).await;

    let err = transport(&base)
        .request(HttpMethod::Get, "/sessions/s1/activities", None)
        .await
        .unwrap_err();

    match err {
        ClientError::Api { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_route_is_api_error() {
    let base = spawn_server(Router::new()).await;

    let err = transport(&base)
        .request(HttpMethod::Get, "/missing", None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn empty_success_body_decodes_as_empty_object() {
    let app = Router::new().route("/approve", post(|| async { StatusCode::OK }));
    let base = spawn_server(app).await;

    let value = transport(&base)
        .request(HttpMethod::Post, "/approve", Some(json!({})))
        .await
        .unwrap();

    assert_eq!(value, json!({}));
}

#[tokio::test]
async fn malformed_success_body_is_decode_error() {
    let app = Router::new().route("/sources", get(|| async { "not json" }));
    let base = spawn_server(app).await;

    let err = transport(&base)
        .request(HttpMethod::Get, "/sources", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Transport(TransportError::Decode(_))
    ));
}

#[tokio::test]
async fn refused_connection_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = transport(&format!("http://{addr}"))
        .request(HttpMethod::Get, "/sources", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Transport(TransportError::Request(_))
    ));
}
