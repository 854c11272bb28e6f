use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::json;

use totalum_auth_client::{ClientConfig, LazyClient, TotalumClient};
use totalum_auth_core::db::value::{record_from_json, Value};
use totalum_auth_core::error::RemoteError;
use totalum_auth_core::remote::{
    FilterNode, Predicate, RecordQuery, RemoteFilter, RemoteRecordApi, RemoteSort,
};

const KEY: &str = "test-key";

fn client_for(server: &MockServer) -> TotalumClient {
    TotalumClient::new(ClientConfig::new(KEY, server.base_url())).unwrap()
}

#[tokio::test]
async fn test_create_record() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/crud/user")
                .header("api-key", KEY)
                .json_body(json!({"name": "Alice", "email_verified": false}));
            then.status(200)
                .json_body(json!({"data": {"_id": "u1", "name": "Alice", "email_verified": false}}));
        })
        .await;

    let record = client_for(&server)
        .create_record(
            "user",
            record_from_json(json!({"name": "Alice", "email_verified": false})),
        )
        .await
        .unwrap()
        .unwrap_record()
        .unwrap();

    mock.assert_async().await;
    assert_eq!(record["_id"], Value::from("u1"));
}

#[tokio::test]
async fn test_get_records_sends_query_json() {
    let server = MockServer::start_async().await;
    let query = RecordQuery::new(
        RemoteFilter {
            conditions: vec![FilterNode::field("email", Predicate::Equals(Value::from("a@x.io")))],
        },
        1,
        0,
    );
    let expected = r#"{"filter":[{"email":"a@x.io"}],"pagination":{"limit":1,"page":0}}"#;

    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/crud/user")
                .header("api-key", KEY)
                .query_param("query", expected);
            then.status(200)
                .json_body(json!({"data": [{"_id": "u1", "email": "a@x.io"}]}));
        })
        .await;

    let records = client_for(&server)
        .get_records("user", &query)
        .await
        .unwrap()
        .unwrap_records();

    mock.assert_async().await;
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_get_records_with_sort() {
    let server = MockServer::start_async().await;
    let query = RecordQuery::new(RemoteFilter::default(), 50, 0).with_sort(RemoteSort {
        field: "createdAt".into(),
        ascending: false,
    });
    let expected = r#"{"pagination":{"limit":50,"page":0},"sort":{"createdAt":-1}}"#;

    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/crud/session")
                .query_param("query", expected);
            then.status(200).json_body(json!({"data": []}));
        })
        .await;

    let records = client_for(&server)
        .get_records("session", &query)
        .await
        .unwrap()
        .unwrap_records();

    mock.assert_async().await;
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_edit_record_by_id() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path("/api/v1/crud/user/u1")
                .header("api-key", KEY)
                .json_body(json!({"name": "Bob"}));
            then.status(200)
                .json_body(json!({"data": {"_id": "u1", "name": "Bob"}}));
        })
        .await;

    let record = client_for(&server)
        .edit_record_by_id("user", "u1", record_from_json(json!({"name": "Bob"})))
        .await
        .unwrap()
        .unwrap_record()
        .unwrap();

    mock.assert_async().await;
    assert_eq!(record["name"], Value::from("Bob"));
}

#[tokio::test]
async fn test_delete_record_by_id() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/api/v1/crud/session/s1")
                .header("api-key", KEY);
            then.status(200).json_body(json!({"data": {"acknowledged": true}}));
        })
        .await;

    client_for(&server)
        .delete_record_by_id("session", "s1")
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/v1/crud/user/missing");
            then.status(404).body("record not found");
        })
        .await;

    let err = client_for(&server)
        .delete_record_by_id("user", "missing")
        .await
        .unwrap_err();

    match err {
        RemoteError::Status { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "record not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_undecodable_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/crud/user");
            then.status(200).body("<html>oops</html>");
        })
        .await;

    let err = client_for(&server)
        .create_record("user", record_from_json(json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::Decode(_)));
}

#[tokio::test]
async fn test_transport_failure() {
    // Nothing listens on port 9 of localhost in the test environment.
    let client = TotalumClient::new(ClientConfig::new(KEY, "http://127.0.0.1:9")).unwrap();
    let err = client.delete_record_by_id("user", "u1").await.unwrap_err();
    assert!(matches!(err, RemoteError::Transport(_)));
}

#[tokio::test]
async fn test_lazy_client_forwards_calls() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/crud/account")
                .header("api-key", KEY);
            then.status(201).json_body(json!({"data": {"_id": "a1"}}));
        })
        .await;

    let handle = LazyClient::new(ClientConfig::new(KEY, server.base_url()));
    assert!(!handle.is_initialized());

    let record = handle
        .create_record("account", record_from_json(json!({"provider_id": "github"})))
        .await
        .unwrap()
        .unwrap_record();

    mock.assert_async().await;
    assert!(handle.is_initialized());
    assert!(record.is_some());
}
