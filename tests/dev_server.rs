mod common;
use crate::common::{init_tracing, with_timeout, SiteFixture};

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use sitedag::devserver::{DevServer, ReloadHub, RELOAD_PATH};
use sitedag::types::Environment;

/// Minimal HTTP/1.1 GET. The path goes on the wire untouched so that
/// traversal attempts reach the server as written.
async fn get(addr: SocketAddr, path: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8_lossy(&raw).into_owned();
    let status = text
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("no status line in {text:?}"));
    (status, text)
}

fn served_site() -> (SiteFixture, std::path::PathBuf) {
    let site = SiteFixture::empty();
    site.write("static/index.html", "<html><body><h1>HI</h1></body></html>")
        .write("static/index.min.css", ".x .y{color:red}")
        .write("secret.txt", "top secret");
    let build = site.config(Environment::Development).build_path();
    (site, build)
}

#[tokio::test]
async fn index_is_served_with_reload_script() {
    init_tracing();
    let (_site, build) = served_site();
    let server = DevServer::start(build, "127.0.0.1:0".parse().unwrap(), ReloadHub::new())
        .await
        .unwrap();

    let (status, page) = with_timeout(get(server.addr(), "/")).await;
    assert_eq!(status, 200);
    assert!(page.contains("<h1>HI</h1>"));
    assert!(page.contains(RELOAD_PATH));
    assert!(page.find("EventSource").unwrap() < page.find("</body>").unwrap());
    assert!(page.to_ascii_lowercase().contains("cache-control: no-cache"));

    let (status, css) = with_timeout(get(server.addr(), "/index.min.css")).await;
    assert_eq!(status, 200);
    assert!(css.contains("text/css"));
    assert!(!css.contains("EventSource"));

    let (status, _) = with_timeout(get(server.addr(), "/missing.html")).await;
    assert_eq!(status, 404);

    server.stop().await;
}

#[tokio::test]
async fn paths_outside_the_build_dir_are_refused() {
    init_tracing();
    let (_site, build) = served_site();
    let server = DevServer::start(build, "127.0.0.1:0".parse().unwrap(), ReloadHub::new())
        .await
        .unwrap();

    for path in ["/../secret.txt", "/%2e%2e/secret.txt", "/a/%2E%2E/%2e%2e/secret.txt"] {
        let (status, body) = with_timeout(get(server.addr(), path)).await;
        assert!((400..500).contains(&status), "{path} gave {status}");
        assert!(!body.contains("top secret"), "{path} leaked the file");
    }

    server.stop().await;
}

#[tokio::test]
async fn reload_reaches_a_connected_browser() {
    init_tracing();
    let (_site, build) = served_site();
    let hub = ReloadHub::new();
    let server = DevServer::start(build, "127.0.0.1:0".parse().unwrap(), hub.clone())
        .await
        .unwrap();

    let mut stream = TcpStream::connect(server.addr()).await.unwrap();
    let request = format!("GET {RELOAD_PATH} HTTP/1.1\r\nHost: localhost\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    with_timeout(async {
        while hub.listeners() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert_eq!(hub.reload(), 1);

    let received = with_timeout(async {
        let mut seen = String::new();
        let mut buf = [0u8; 1024];
        while !seen.contains("event: reload") {
            let n = stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "stream closed before the reload event: {seen:?}");
            seen.push_str(&String::from_utf8_lossy(&buf[..n]));
        }
        seen
    })
    .await;
    assert!(received.contains("text/event-stream"));

    drop(stream);
    with_timeout(server.stop()).await;
}

#[tokio::test]
async fn stop_releases_the_port() {
    init_tracing();
    let (_site, build) = served_site();
    let server = DevServer::start(build, "127.0.0.1:0".parse().unwrap(), ReloadHub::new())
        .await
        .unwrap();
    let addr = server.addr();
    let (status, _) = with_timeout(get(addr, "/")).await;
    assert_eq!(status, 200);

    with_timeout(server.stop()).await;

    assert!(TcpStream::connect(addr).await.is_err());
    let rebound = tokio::net::TcpListener::bind(addr).await;
    assert!(rebound.is_ok(), "port still taken: {rebound:?}");
}
