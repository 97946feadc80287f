#![allow(clippy::unwrap_used)]
// Integration tests for `Connection` and the lookup aggregator using wiremock.

use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use qpw_api::{SessionKey, SessionStore};
use qpw_core::{
    Connection, ConnectionConfig, CoreError, LOOKUP_SPECS, LookupKind, LookupOption,
    MemoryStorage,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn connect(server: &MockServer, storage: MemoryStorage) -> Connection {
    let mut config = ConnectionConfig::new(
        "client-1",
        Url::parse("https://app.example.com/callback").unwrap(),
    );
    config.api_base = Some(Url::parse(&server.uri()).unwrap());
    config.max_pages = 5;
    Connection::with_client(config, reqwest::Client::new(), SessionStore::new(storage))
}

fn logged_in() -> MemoryStorage {
    MemoryStorage::with_entries([
        (SessionKey::Token, "test-token"),
        (SessionKey::Region, "mypurecloud.ie"),
    ])
}

async fn mount_page(server: &MockServer, resource: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(resource))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// One single-page resource per lookup, each with one named entity.
async fn mount_all(server: &MockServer) {
    for spec in &LOOKUP_SPECS {
        if spec.kind == LookupKind::Users {
            continue;
        }
        mount_page(
            server,
            spec.path,
            json!({ "entities": [{ "id": format!("{}-1", spec.kind), "name": "One" }] }),
        )
        .await;
    }
    Mock::given(method("GET"))
        .and(path("/api/v2/users"))
        .and(query_param("state", "active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entities": [
                { "id": "u1", "name": "Ada" },
                { "id": "u2", "username": "bob@example.com" },
                { "id": "u3", "email": "cy@example.com" },
                { "id": "u4" }
            ]
        })))
        .mount(server)
        .await;
}

// ── load_lookups ────────────────────────────────────────────────────

#[tokio::test]
async fn test_load_lookups_populates_every_kind() {
    let server = MockServer::start().await;
    mount_all(&server).await;
    let conn = connect(&server, logged_in());

    let load = conn.load_lookups().await;
    assert!(load.is_complete());
    let lookups = load.into_result().unwrap();

    for spec in &LOOKUP_SPECS {
        assert!(!lookups.get(spec.kind).is_empty(), "{} empty", spec.kind);
    }
    let labels: Vec<&str> = lookups
        .get(LookupKind::Users)
        .iter()
        .map(|o| o.label.as_str())
        .collect();
    assert_eq!(labels, ["Ada", "bob@example.com", "cy@example.com", "u4"]);
}

#[tokio::test]
async fn test_load_lookups_runs_walks_concurrently() {
    let server = MockServer::start().await;
    let delay = Duration::from_millis(300);
    for spec in &LOOKUP_SPECS {
        Mock::given(method("GET"))
            .and(path(spec.path))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "entities": [{ "id": "x", "name": "X" }] }))
                    .set_delay(delay),
            )
            .expect(1)
            .mount(&server)
            .await;
    }
    let conn = connect(&server, logged_in());

    let started = Instant::now();
    let load = conn.load_lookups().await;
    let elapsed = started.elapsed();

    assert!(load.is_complete());
    assert!(
        elapsed < delay * 4,
        "lookups took {elapsed:?}, expected overlapping walks"
    );
}

#[tokio::test]
async fn test_one_failing_lookup_empties_all_and_keeps_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/routing/skills"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_all(&server).await;
    let conn = connect(&server, logged_in());

    let load = conn.load_lookups().await;

    assert!(load.lookups.is_empty());
    assert_eq!(load.lookups.iter().count(), 8);
    assert_eq!(load.failures.len(), 1);
    assert_eq!(load.failures[0].kind, LookupKind::Skills);
    assert_eq!(load.failures[0].path, "/api/v2/routing/skills");
    assert!(!load.requires_login());
    assert!(conn.is_logged_in());
}

#[tokio::test]
async fn test_rejected_lookup_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/teams"))
        .respond_with(ResponseTemplate::new(401))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_all(&server).await;
    let conn = connect(&server, logged_in());

    let load = conn.load_lookups().await;

    assert!(load.lookups.is_empty());
    assert!(load.requires_login());
    assert!(!conn.is_logged_in());
    assert!(conn.session().token().is_none());
}

#[tokio::test]
async fn test_lookups_without_session_fail_without_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "entities": [] })))
        .expect(0)
        .mount(&server)
        .await;
    let conn = connect(&server, MemoryStorage::new());

    let load = conn.load_lookups().await;
    assert_eq!(load.failures.len(), 8);
    assert!(matches!(
        load.failures[0].error,
        CoreError::NotAuthenticated { .. }
    ));
}

#[tokio::test]
async fn test_load_lookup_walks_pages_and_dedupes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/routing/queues"))
        .and(query_param("pageNumber", "1"))
        .and(query_param("pageSize", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entities": [{ "id": "q1", "name": "Sales" }, { "id": "q2", "name": "Support" }],
            "nextUri": "/api/v2/routing/queues?pageNumber=2"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/routing/queues"))
        .and(query_param("pageNumber", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entities": [{ "id": "q2", "name": "Support again" }, { "name": "no id" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let conn = connect(&server, logged_in());

    let options = conn.load_lookup(LookupKind::Queues).await.unwrap();
    assert_eq!(
        options,
        vec![
            LookupOption {
                id: "q1".into(),
                label: "Sales".into(),
            },
            LookupOption {
                id: "q2".into(),
                label: "Support".into(),
            },
        ]
    );
}

// ── Login & identity ────────────────────────────────────────────────

#[tokio::test]
async fn test_complete_login_then_whoami() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "me-1", "name": "Ada Agent", "email": "ada@example.com"
        })))
        .mount(&server)
        .await;
    let conn = connect(&server, MemoryStorage::new());
    assert!(!conn.is_logged_in());

    let mut location = Url::parse(
        "https://app.example.com/callback#access_token=abc1234&token_type=bearer&expires_in=3600&state=qpw%7Cmypurecloud.ie",
    )
    .unwrap();
    let outcome = conn.complete_login(&mut location).await.unwrap();

    assert_eq!(outcome.region.as_deref(), Some("mypurecloud.ie"));
    assert_eq!(outcome.identity.unwrap().id, "me-1");
    assert!(location.fragment().is_none());
    assert!(conn.is_logged_in());
    assert_eq!(conn.token_hint().as_deref(), Some("…1234"));

    let me = conn.whoami().await.unwrap();
    assert_eq!(me.name.as_deref(), Some("Ada Agent"));
}

#[tokio::test]
async fn test_whoami_rejected_token_logs_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/users/me"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "token expired" })),
        )
        .mount(&server)
        .await;
    let conn = connect(&server, logged_in());

    let err = conn.whoami().await.unwrap_err();
    assert!(err.requires_login());
    assert_eq!(
        err.to_string(),
        "API error on /api/v2/users/me (HTTP 401): token expired"
    );
    assert!(!conn.is_logged_in());
}

#[tokio::test]
async fn test_whoami_server_error_keeps_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/users/me"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let conn = connect(&server, logged_in());

    assert!(conn.whoami().await.is_err());
    assert!(conn.is_logged_in());
}
