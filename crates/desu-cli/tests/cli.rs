//! CLI integration tests against a relay started in-process.

mod common;

use std::io::{BufRead, BufReader};
use std::net::{IpAddr, Ipv4Addr};
use std::process::Stdio;

use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{desu, run_cli, run_cli_success};
use desu_server::{Server, ServerConfig};

async fn start_server(dir: &TempDir) -> Server {
    Server::start(ServerConfig {
        storage: dir.path().join("server.json"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        name: "CLI Test Server".to_string(),
        ..ServerConfig::default()
    })
    .await
    .unwrap()
}

fn json_lines(stdout: &str) -> Vec<Value> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    let output = desu(&dir.path().join("client.json"))
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["serve", "connect", "servers", "info", "post", "list", "watch", "sync", "messages"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn test_version_is_embedded() {
    let dir = TempDir::new().unwrap();
    let output = desu(&dir.path().join("client.json"))
        .arg("--version")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version = stdout.trim().strip_prefix("desu ").unwrap();
    assert!(!version.is_empty());
    assert!(!version.starts_with('v'), "{version}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_post_then_list() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("client.json");
    let server = start_server(&dir).await;
    let url = server.url().to_string();

    let receipt = run_cli_success(&["post", &url, r#"{"text":"hello"}"#, "--json"], &data).await;
    let receipt: Value = serde_json::from_str(receipt.trim()).unwrap();
    assert_eq!(receipt["submitted"], json!(true));

    run_cli_success(&["post", &url, "plain words"], &data).await;

    let listed = json_lines(&run_cli_success(&["list", &url], &data).await);
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["body"], json!({ "text": "hello" }));
    assert_eq!(listed[1]["body"], json!("plain words"));

    let page = json_lines(&run_cli_success(&["list", &url, "--offset", "1", "--limit", "1"], &data).await);
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["body"], json!("plain words"));

    server.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_info_prints_server_description() {
    let dir = TempDir::new().unwrap();
    let server = start_server(&dir).await;
    let url = server.url().to_string();

    let stdout = run_cli_success(&["info", &url], &dir.path().join("client.json")).await;
    let info: Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(info["name"], json!("CLI Test Server"));
    assert_eq!(info["version"], json!(1));

    server.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_is_idempotent_and_persisted() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("client.json");
    let server = start_server(&dir).await;
    let url = server.url().to_string();

    run_cli_success(&["connect", &url], &data).await;
    run_cli_success(&["connect", &url], &data).await;

    let servers = json_lines(&run_cli_success(&["servers", "--json"], &data).await);
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0]["data"]["name"], json!("CLI Test Server"));
    assert_eq!(servers[0]["data"]["url"], json!(url));

    server.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_sanitizes_remote_metadata() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("client.json");
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "" })))
        .mount(&mock)
        .await;

    let stdout = run_cli_success(&["connect", &mock.uri(), "--json"], &data).await;
    let entry: Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(entry["data"]["name"], json!("Unnamed Server"));
    assert_eq!(entry["data"]["icon"], json!("https://www.rioki.org/favicon.ico"));
    assert_eq!(entry["data"]["lifetime"], json!(0));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sync_then_messages() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("client.json");
    let server = start_server(&dir).await;
    let url = server.url().to_string();

    run_cli_success(&["post", &url, "\"one\""], &data).await;
    run_cli_success(&["post", &url, "\"two\""], &data).await;

    let synced = run_cli_success(&["sync", &url, "--channel", "general"], &data).await;
    assert!(synced.contains("Synced 2"), "{synced}");
    let again = run_cli_success(&["sync", &url, "--channel", "general"], &data).await;
    assert!(again.contains("Synced 0"), "{again}");

    let stored = json_lines(&run_cli_success(&["messages", &url, "--channel", "general"], &data).await);
    let bodies: Vec<&Value> = stored.iter().map(|m| &m["body"]).collect();
    assert_eq!(bodies, vec![&json!("one"), &json!("two")]);

    server.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_messages_for_unknown_server_fails() {
    let dir = TempDir::new().unwrap();
    let output = run_cli(
        &["messages", "http://127.0.0.1:9"],
        &dir.path().join("client.json"),
    )
    .await;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown server"));
}

#[test]
fn test_invalid_url_is_rejected() {
    let dir = TempDir::new().unwrap();
    let output = desu(&dir.path().join("client.json"))
        .args(["info", "ftp://example.com"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid server URL"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_serve_answers_info() {
    let dir = TempDir::new().unwrap();
    let storage = dir.path().join("served.json");
    let data = dir.path().join("client.json");

    let mut child = desu(&data)
        .args(["serve", "--host", "127.0.0.1", "--port", "0", "--name", "Spawned"])
        .arg("--storage")
        .arg(&storage)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let stdout = child.stdout.take().unwrap();
    let url = tokio::task::spawn_blocking(move || {
        let mut line = String::new();
        BufReader::new(stdout).read_line(&mut line).unwrap();
        line.split_whitespace().last().unwrap().to_string()
    })
    .await
    .unwrap();

    let stdout = run_cli_success(&["info", &url], &data).await;
    let info: Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(info["name"], json!("Spawned"));

    child.kill().unwrap();
    child.wait().unwrap();
}
