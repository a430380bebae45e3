//! Client behavior against a mocked relay.

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use desu_client::{Client, ClientConfig, HttpRelay, USER_AGENT};
use desu_core::error::{Error, ProtocolError};
use desu_core::{ListQuery, NewMessage, Relay, ServerUrl, Window};
use desu_store::directory::{DEFAULT_SERVER_ICON, DEFAULT_SERVER_NAME};

fn mock_url(server: &MockServer) -> ServerUrl {
    ServerUrl::new(server.uri()).unwrap()
}

async fn mount_info(server: &MockServer, info: serde_json::Value, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(info))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_connect_records_server_metadata() {
    let server = MockServer::start().await;
    mount_info(
        &server,
        json!({
            "version": 1,
            "name": "Test Server",
            "icon": "http://cdn.example.com/test.png",
            "lifetime": 604800000u64,
            "time": 1
        }),
        1,
    )
    .await;

    let client = Client::memory().unwrap();
    let entry = client.connect(&mock_url(&server)).await.unwrap();

    assert_eq!(entry.data.url, mock_url(&server).as_str());
    assert_eq!(entry.data.name, "Test Server");
    assert_eq!(entry.data.icon, "http://cdn.example.com/test.png");
    assert_eq!(entry.data.lifetime, 604_800_000);
    assert_eq!(entry.data.version, 1);
}

#[tokio::test]
async fn test_connect_sanitizes_empty_info() {
    let server = MockServer::start().await;
    mount_info(&server, json!({}), 1).await;

    let client = Client::memory().unwrap();
    let entry = client.connect(&mock_url(&server)).await.unwrap();

    assert_eq!(entry.data.version, 1);
    assert_eq!(entry.data.name, DEFAULT_SERVER_NAME);
    assert_eq!(entry.data.icon, DEFAULT_SERVER_ICON);
    assert_eq!(entry.data.lifetime, 0);
}

#[tokio::test]
async fn test_client_requests_carry_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "Agent" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "messages": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::memory().unwrap();
    let entry = client.connect(&mock_url(&server)).await.unwrap();
    assert_eq!(entry.data.name, "Agent");
    assert_eq!(client.sync_channel(&entry, "general").await.unwrap(), 0);
    assert!(USER_AGENT.starts_with("desu/"));
}

#[tokio::test]
async fn test_connect_twice_does_not_duplicate() {
    let server = MockServer::start().await;
    mount_info(&server, json!({ "name": "Once" }), 1).await;

    let client = Client::memory().unwrap();
    let first = client.connect(&mock_url(&server)).await.unwrap();
    let second = client.connect(&mock_url(&server)).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(client.get_servers().unwrap().len(), 1);
}

#[tokio::test]
async fn test_connect_rejects_non_json_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let client = Client::memory().unwrap();
    let err = client.connect(&mock_url(&server)).await.unwrap_err();

    assert!(matches!(err, Error::Protocol(ProtocolError::NotJson { .. })), "{err}");
    assert!(client.get_servers().unwrap().is_empty());
}

#[tokio::test]
async fn test_connect_rejects_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "boom" })))
        .mount(&server)
        .await;

    let client = Client::memory().unwrap();
    let err = client.connect(&mock_url(&server)).await.unwrap_err();

    match err {
        Error::Protocol(e) => assert_eq!(e.status(), Some(500)),
        other => panic!("unexpected error: {other}"),
    }
    assert!(client.get_servers().unwrap().is_empty());
}

#[tokio::test]
async fn test_connect_unreachable_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let url = ServerUrl::new(format!("http://127.0.0.1:{port}")).unwrap();

    let client = Client::memory().unwrap();
    let err = client.connect(&url).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "{err}");
}

#[tokio::test]
async fn test_http_relay_sends_list_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("minTime", "42"))
        .and(query_param("offset", "1"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{ "id": 7, "body": "hi", "received": 50 }]
        })))
        .mount(&server)
        .await;

    let relay = HttpRelay::new(mock_url(&server)).unwrap();
    let messages = relay
        .list(&ListQuery::since(42).with_offset(1).with_limit(2))
        .await
        .unwrap();

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].body, json!("hi"));
    assert_eq!(messages[0].received, 50);
}

#[tokio::test]
async fn test_http_relay_wraps_submitted_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_json(json!({ "body": { "text": "hello" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "submitted": true, "received": 1000
        })))
        .mount(&server)
        .await;

    let relay = HttpRelay::new(mock_url(&server)).unwrap();
    let receipt = relay.submit(json!({ "text": "hello" })).await.unwrap();

    assert!(receipt.submitted);
    assert_eq!(receipt.received, 1000);
}

#[tokio::test]
async fn test_http_relay_posts_every_message_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_json(json!({ "body": "A", "channel": "general" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "submitted": true, "received": 1000
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{ "id": 1, "body": "A", "channel": "general", "received": 1000 }]
        })))
        .mount(&server)
        .await;

    let relay = HttpRelay::new(mock_url(&server)).unwrap();
    let receipt = relay
        .post(NewMessage::new("A").with_field("channel", "general"))
        .await
        .unwrap();
    assert_eq!(receipt.id.get(), 1);

    let messages = relay.list(&ListQuery::default()).await.unwrap();
    assert_eq!(messages[0].extra.get("channel"), Some(&json!("general")));
}

#[tokio::test]
async fn test_sync_channel_stores_new_messages_once() {
    let server = MockServer::start().await;
    mount_info(&server, json!({ "name": "Sync" }), 1).await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("minTime", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                { "id": 1, "body": "first", "received": 10 },
                { "id": 2, "body": "second", "received": 20 }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("minTime", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{ "id": 2, "body": "second", "received": 20 }]
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = Client::open(ClientConfig::at(dir.path().join("client.json"))).unwrap();
    let entry = client.connect(&mock_url(&server)).await.unwrap();

    assert_eq!(client.sync_channel(&entry, "general").await.unwrap(), 2);
    // The remote still reports the message at the newest post date.
    assert_eq!(client.sync_channel(&entry, "general").await.unwrap(), 0);

    let messages = client.messages(&entry, "general", Window::default()).unwrap();
    let bodies: Vec<_> = messages.iter().map(|m| m.data.body.clone()).collect();
    assert_eq!(bodies, vec![json!("first"), json!("second")]);
    assert_eq!(messages[1].data.post_date, 20);

    assert!(client.messages(&entry, "random", Window::default()).unwrap().is_empty());
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_directory_survives_reopen() {
    let server = MockServer::start().await;
    mount_info(&server, json!({ "name": "Persistent" }), 1).await;

    let dir = TempDir::new().unwrap();
    let config = ClientConfig::at(dir.path().join("client.json"));

    let client = Client::open(config.clone()).unwrap();
    client.connect(&mock_url(&server)).await.unwrap();
    client.close().await.unwrap();

    let client = Client::open(config).unwrap();
    let known = client.get_server(&mock_url(&server)).unwrap().unwrap();
    assert_eq!(known.data.name, "Persistent");
    client.close().await.unwrap();
}
