use std::sync::Arc;
use std::time::Duration;

use resource_server::{Config, server, storage::MemoryStorage};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

async fn roundtrip(addr: std::net::SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8(buf).unwrap()
}

fn config(args: &[&str]) -> Config {
    use clap::Parser;
    let mut argv = vec!["resource-server"];
    argv.extend_from_slice(args);
    Config::try_parse_from(argv).unwrap()
}

#[tokio::test]
async fn serves_over_tcp_and_stops_on_signal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = resource_server::app(&config(&[]), Arc::new(MemoryStorage::new()));

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server::run(listener, app, async {
        let _ = stop_rx.await;
    }));

    let body = r#"{"name":"Widget"}"#;
    let created = roundtrip(
        addr,
        &format!(
            "POST /resources/add HTTP/1.1\r\nhost: test\r\ncontent-type: application/json\r\n\
             content-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        ),
    )
    .await;
    assert!(created.starts_with("HTTP/1.1 201"), "{created}");
    assert!(created.ends_with(r#"{"id":1,"name":"Widget"}"#), "{created}");

    let listed = roundtrip(addr, "GET /resources HTTP/1.1\r\nhost: test\r\nconnection: close\r\n\r\n").await;
    assert!(listed.starts_with("HTTP/1.1 200"), "{listed}");
    assert!(listed.contains("content-type: application/json"), "{listed}");
    assert!(listed.ends_with(r#"[{"id":1,"name":"Widget"}]"#), "{listed}");

    stop_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn demo_routes_are_mounted_on_request() {
    let static_dir = tempfile::tempdir().unwrap();
    std::fs::write(static_dir.path().join("index.html"), "<h1>hi</h1>").unwrap();
    let dir = static_dir.path().to_str().unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = resource_server::app(
        &config(&["--demo-routes", "--static-dir", dir]),
        Arc::new(MemoryStorage::new()),
    );

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server::run(listener, app, async {
        let _ = stop_rx.await;
    }));

    let hello = roundtrip(addr, "GET / HTTP/1.1\r\nhost: test\r\nconnection: close\r\n\r\n").await;
    assert!(hello.ends_with("Hello World!"), "{hello}");

    let page = roundtrip(addr, "GET /static/index.html HTTP/1.1\r\nhost: test\r\nconnection: close\r\n\r\n").await;
    assert!(page.starts_with("HTTP/1.1 200"), "{page}");
    assert!(page.contains("content-type: text/html; charset=utf-8"), "{page}");

    let escape = roundtrip(addr, "GET /static/../Cargo.toml HTTP/1.1\r\nhost: test\r\nconnection: close\r\n\r\n").await;
    assert!(escape.starts_with("HTTP/1.1 404"), "{escape}");

    stop_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_closes_idle_keep_alive_connections() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = resource_server::app(&config(&[]), Arc::new(MemoryStorage::new()));

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server::run(listener, app, async {
        let _ = stop_rx.await;
    }));

    // No `connection: close`: the socket stays open after the response.
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /resources HTTP/1.1\r\nhost: test\r\n\r\n")
        .await
        .unwrap();
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.ends_with(b"[]") {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before the response was complete");
        buf.extend_from_slice(&chunk[..n]);
    }
    assert!(buf.starts_with(b"HTTP/1.1 200"));

    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop while a keep-alive connection was idle")
        .unwrap()
        .unwrap();

    // The server hung up on the idle connection.
    let n = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut chunk))
        .await
        .unwrap()
        .unwrap_or(0);
    assert_eq!(n, 0);
}
