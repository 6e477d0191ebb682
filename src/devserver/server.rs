// src/devserver/server.rs

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::stream::{self, Stream};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

use crate::devserver::ReloadHub;
use crate::errors::{BuildError, Result};

/// Server-sent events endpoint the injected script listens on.
pub const RELOAD_PATH: &str = "/__sitedag/reload";

const RELOAD_SCRIPT: &str = r#"<script>
(function () {
  var source = new EventSource("/__sitedag/reload");
  source.addEventListener("reload", function () { window.location.reload(); });
})();
</script>
"#;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Pages larger than this are not buffered for script injection.
const MAX_HTML_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
struct AppState {
    files: ServeDir,
    hub: ReloadHub,
    shutdown: watch::Receiver<bool>,
}

/// Static file server over the build directory with live reload.
pub struct DevServer;

impl DevServer {
    /// Bind `addr` and serve `base_dir` in the background.
    ///
    /// Port 0 picks a free port; see [`DevServerHandle::addr`].
    pub async fn start(
        base_dir: impl Into<PathBuf>,
        addr: SocketAddr,
        hub: ReloadHub,
    ) -> Result<DevServerHandle> {
        let base_dir = base_dir.into();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let state = AppState {
            files: ServeDir::new(&base_dir),
            hub,
            shutdown: shutdown_rx.clone(),
        };
        let app = Router::new()
            .route(RELOAD_PATH, get(reload_events))
            .fallback(serve_file)
            .with_state(state);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| BuildError::Server(format!("binding {addr}: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| BuildError::Server(e.to_string()))?;

        let mut signal = shutdown_rx;
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = signal.wait_for(|stop| *stop).await;
                })
                .await
        });

        info!(%addr, dir = ?base_dir, "dev server listening on http://{addr}");
        Ok(DevServerHandle {
            addr,
            shutdown: shutdown_tx,
            task,
        })
    }
}

/// Running server; [`stop`](Self::stop) shuts it down gracefully.
pub struct DevServerHandle {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<std::io::Result<()>>,
}

impl std::fmt::Debug for DevServerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevServerHandle")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

impl DevServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let mut task = self.task;
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await {
            Ok(Ok(Ok(()))) => info!(addr = %self.addr, "dev server stopped"),
            Ok(Ok(Err(err))) => warn!(error = %err, "dev server ended with an error"),
            Ok(Err(err)) => warn!(error = %err, "dev server task failed"),
            Err(_) => {
                warn!("dev server did not stop in time; aborting");
                task.abort();
            }
        }
    }
}

async fn reload_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    debug!("browser connected for reloads");
    let rx = state.hub.subscribe();
    let events = stream::unfold((rx, state.shutdown), |(mut rx, mut shutdown)| async move {
        loop {
            if *shutdown.borrow() {
                return None;
            }
            tokio::select! {
                msg = rx.recv() => match msg {
                    Ok(()) => {
                        let event = Event::default().event("reload").data("reload");
                        return Some((Ok(event), (rx, shutdown)));
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                }
            }
        }
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

async fn serve_file(State(state): State<AppState>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    let response = match state.files.clone().oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };
    if !response.status().is_success() {
        debug!(%path, status = %response.status(), "not served");
    }

    let (mut parts, body) = response.into_parts();
    parts
        .headers
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    if !is_html(&parts.headers) {
        return Response::from_parts(parts, body);
    }

    let bytes = match axum::body::to_bytes(body, MAX_HTML_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(%path, error = %err, "could not buffer html page");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    parts.headers.remove(header::CONTENT_LENGTH);
    let html = inject_reload_script(&String::from_utf8_lossy(&bytes));
    Response::from_parts(parts, Body::from(html))
}

fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"))
}

/// Insert the reload script before `</body>`, or append it.
fn inject_reload_script(html: &str) -> String {
    match html.rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + RELOAD_SCRIPT.len());
            out.push_str(&html[..idx]);
            out.push_str(RELOAD_SCRIPT);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{html}{RELOAD_SCRIPT}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_goes_before_body_end() {
        let html = inject_reload_script("<html><body><p>x</p></body></html>");
        assert!(html.contains("EventSource"));
        assert!(html.find("EventSource").unwrap() < html.find("</body>").unwrap());
        assert!(inject_reload_script("<p>x</p>").ends_with("</script>\n"));
    }

    #[test]
    fn html_detection_uses_content_type() {
        let mut headers = HeaderMap::new();
        assert!(!is_html(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        assert!(is_html(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/css"));
        assert!(!is_html(&headers));
    }
}
