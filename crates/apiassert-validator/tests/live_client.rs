//! RecordingClient against a one-shot local HTTP server.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use apiassert_core::{Config, RestClient};
use apiassert_validator::{AssertionProvider, ModuleBuilder, RecordingClient};

const PETS_API: &str = r#"{
  "openapi": "3.0.3",
  "paths": {
    "/pets": {
      "post": {
        "requestBody": {
          "required": true,
          "content": {"application/json": {"schema": {
            "type": "object", "required": ["name"],
            "properties": {"name": {"type": "string"}}
          }}}
        },
        "responses": {
          "201": {"content": {"application/json": {"schema": {
            "type": "object", "required": ["id"],
            "properties": {"id": {"type": "integer"}}
          }}}}
        }
      }
    }
  }
}"#;

/// Serve one request with `body`; the raw request head and body are sent back.
fn serve_once(status: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);
        let mut head = String::new();
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
            head.push_str(&line);
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }
        let mut request_body = vec![0; content_length];
        reader.read_exact(&mut request_body).unwrap();
        head.push_str(&String::from_utf8_lossy(&request_body));
        tx.send(head).unwrap();

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        reader.get_mut().write_all(response.as_bytes()).unwrap();
    });
    (format!("http://{addr}"), rx)
}

#[test]
fn records_exchange_and_validates_it() {
    let (base_url, rx) = serve_once("201 Created", r#"{"id":1}"#);
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("openapi.json"), PETS_API).unwrap();

    let mut config = Config::with_schema("openapi.json").with_project_root(dir.path());
    config.base_url = Some(base_url);
    config.headers.insert("X-Api-Key".into(), "k".into());

    let mut client = RecordingClient::from_config(&config).unwrap();
    let response = client
        .send_json("post", "/pets", &serde_json::json!({"name": "rex"}))
        .unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(response.content, r#"{"id":1}"#);

    let seen = rx.recv().unwrap();
    assert!(seen.starts_with("POST /pets HTTP/1.1\r\n"), "{seen}");
    assert!(seen.to_ascii_lowercase().contains("x-api-key: k"), "{seen}");
    assert!(seen.ends_with(r#"{"name":"rex"}"#), "{seen}");

    assert_eq!(client.last_request().unwrap().method, "POST");
    let facade = ModuleBuilder::new(config)
        .with_rest(&client)
        .with_browser(&client)
        .build()
        .unwrap();
    facade.see_request_is_valid().unwrap();
    facade.see_response_is_valid().unwrap();
}

#[test]
fn invalid_live_response_fails_assertion() {
    let (base_url, _rx) = serve_once("201 Created", r#"{"id":"one"}"#);
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("openapi.json"), PETS_API).unwrap();

    let mut client = RecordingClient::new(&base_url).unwrap();
    client
        .send_json("POST", "/pets", &serde_json::json!({"name": "rex"}))
        .unwrap();

    let config = Config::with_schema("openapi.json").with_project_root(dir.path());
    let facade = ModuleBuilder::new(config)
        .with_rest(&client)
        .with_browser(&client)
        .build()
        .unwrap();
    assert!(facade.validate_request().unwrap().valid);
    let outcome = facade.validate_response().unwrap();
    assert!(!outcome.valid);
    assert!(outcome.message.contains("integer"), "{}", outcome.message);
}
