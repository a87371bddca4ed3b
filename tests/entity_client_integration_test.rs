// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 The Arachne Project

//! Tests for the REST binding and its credential handling against a local
//! mock of the data service.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use arachne_client::models::entity::EntityRecord;
use arachne_client::models::query::Query;
use arachne_client::models::search::{FacetSummary, SearchResponse};
use arachne_client::services::auth::Credentials;
use arachne_client::services::entity::{DataserviceConfig, EntityClient};
use arachne_client::ClientError;

#[derive(Clone, Default)]
struct MockBackend {
    /// When set, the login probe on the service root demands exactly this
    /// `Authorization` header.
    required_token: Option<String>,
    /// `Authorization` header of every entity request, in arrival order.
    auth_seen: Arc<Mutex<Vec<Option<String>>>>,
}

impl MockBackend {
    fn open() -> Self {
        Self::default()
    }

    fn with_required_token(token: String) -> Self {
        Self {
            required_token: Some(token),
            ..Self::default()
        }
    }

    fn last_auth(&self) -> Option<String> {
        self.auth_seen.lock().unwrap().last().cloned().flatten()
    }

    async fn serve(&self) -> String {
        let app = Router::new()
            .route("/", get(root_handler))
            .route("/entity/{id}", get(entity_handler))
            .route("/news/{lang}", get(news_handler))
            .with_state(self.clone());
        spawn_server(app).await
    }
}

async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn root_handler(
    State(mock): State<MockBackend>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    match &mock.required_token {
        Some(required) if auth_header(&headers).as_deref() != Some(required.as_str()) => {
            Err(StatusCode::UNAUTHORIZED)
        }
        _ => Ok(Json(json!({"status": "ok"}))),
    }
}

async fn entity_handler(
    State(mock): State<MockBackend>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Json<Value> {
    mock.auth_seen.lock().unwrap().push(auth_header(&headers));
    Json(json!({"entityId": id, "title": format!("Record {id}")}))
}

async fn news_handler(Path(lang): Path<String>) -> Json<Value> {
    Json(json!([{"title": "Grabungsbericht", "language": lang}]))
}

fn auth_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn client_at(base_url: &str) -> EntityClient {
    let config = DataserviceConfig {
        base_url: base_url.to_string(),
        ..DataserviceConfig::default()
    };
    EntityClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_login_attaches_credentials_to_later_requests() {
    let expected = Credentials::new("scholar", "secret").authorization_header();
    let mock = MockBackend::with_required_token(expected.clone());
    let base = mock.serve().await;
    let client = client_at(&base);

    assert_eq!(client.current_user(), None);
    let user = client.login("scholar", "secret").await.unwrap();
    assert_eq!(user.username, "scholar");
    assert_eq!(client.current_user().unwrap().username, "scholar");

    client.get_entity(17).await.unwrap();
    assert_eq!(mock.last_auth(), Some(expected));

    client.clear_credentials();
    assert_eq!(client.current_user(), None);
    client.get_entity(17).await.unwrap();
    assert_eq!(mock.last_auth(), None);
}

#[tokio::test]
async fn test_rejected_login_keeps_the_client_anonymous() {
    let expected = Credentials::new("scholar", "secret").authorization_header();
    let mock = MockBackend::with_required_token(expected);
    let base = mock.serve().await;
    let client = client_at(&base);

    let error = client.login("scholar", "wrong").await.unwrap_err();
    assert!(matches!(&error, ClientError::Http(e) if e.status() == Some(reqwest::StatusCode::UNAUTHORIZED)));
    assert_eq!(client.current_user(), None);

    // requests after the failed login still go out anonymous
    client.get_entity(17).await.unwrap();
    assert_eq!(mock.last_auth(), None);
}

#[tokio::test]
async fn test_get_entity_returns_the_raw_document() {
    let mock = MockBackend::open();
    let base = mock.serve().await;
    let client = client_at(&base);

    let document = client.get_entity(1234).await.unwrap();
    assert_eq!(document["entityId"], 1234);
    assert_eq!(document["title"], "Record 1234");
}

#[tokio::test]
async fn test_get_news_returns_the_feed_for_a_language() {
    let mock = MockBackend::open();
    let base = mock.serve().await;
    let client = client_at(&base);

    let news = client.get_news("de").await.unwrap();
    assert_eq!(news[0]["language"], "de");
    assert_eq!(news[0]["title"], "Grabungsbericht");
}

async fn nested_search_handler() -> Json<SearchResponse> {
    Json(SearchResponse {
        size: 1,
        facets: FacetSummary::new(),
        entities: vec![EntityRecord {
            entity_id: 1,
            entity_type: Some("object".to_string()),
            title: Some("Record 1".to_string()),
            subtitle: None,
            thumbnail_id: None,
        }],
    })
}

#[tokio::test]
async fn test_search_joins_routes_under_a_base_path() {
    let app = Router::new().route("/data/search", get(nested_search_handler));
    let base = spawn_server(app).await;

    // the base path survives whether or not it is given with a trailing slash
    for suffix in ["/data", "/data/"] {
        let client = client_at(&format!("{base}{suffix}"));
        let response = client.search(&Query::new().to_flat(), 0, 50).await.unwrap();
        assert_eq!(response.size, 1);
        assert_eq!(response.entities[0].entity_id, 1);
    }
}

#[tokio::test]
async fn test_missing_route_surfaces_as_http_error() {
    let app = Router::new().route("/data/search", get(nested_search_handler));
    let base = spawn_server(app).await;
    let client = client_at(&base);

    let error = client.get_entity(1).await.unwrap_err();
    assert!(matches!(&error, ClientError::Http(e) if e.status() == Some(reqwest::StatusCode::NOT_FOUND)));
}
