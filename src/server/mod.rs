// src/server/mod.rs

//! Development HTTP server.
//!
//! Serves the output root, injects the reload client into HTML pages, and
//! streams [`ReloadNotice`]s to browsers as server-sent events.

pub mod reload;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

use crate::config::ServerSection;
use crate::types::ReloadNotice;

pub use reload::ReloadHub;

/// Server-sent-events endpoint the reload client subscribes to.
pub const EVENTS_PATH: &str = "/__sitepipe/events";
/// Reload client script.
pub const CLIENT_PATH: &str = "/__sitepipe/reload.js";

const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Routes for the dev server: reload endpoints plus static files from
/// `output_root`.
pub fn router(output_root: &Path, hub: ReloadHub) -> Router {
    let files = ServeDir::new(output_root).append_index_html_on_directories(true);

    Router::new()
        .route(EVENTS_PATH, get(reload_events))
        .route(CLIENT_PATH, get(reload_client))
        .fallback_service(files)
        .layer(middleware::from_fn(inject_reload_client))
        .with_state(hub)
}

async fn reload_events(
    State(hub): State<ReloadHub>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("reload client connected");

    let stream = BroadcastStream::new(hub.subscribe()).filter_map(|message| match message {
        Ok(notice) => reload_event(&notice).map(Ok),
        // A lagging client skips notices; the next one reloads it anyway.
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn reload_event(notice: &ReloadNotice) -> Option<Event> {
    match Event::default().event("reload").json_data(notice) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, "failed to encode reload notice");
            None
        }
    }
}

async fn reload_client() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        reload::CLIENT_JS,
    )
}

async fn inject_reload_client(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::OK || !is_html(response.headers()) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "failed to buffer html response");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = reload::inject_client(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(html))
}

fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/html"))
}

/// A running dev server.
#[derive(Debug)]
pub struct DevServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<Result<()>>,
}

impl DevServer {
    /// Bind `host:port` from `[server]`.
    pub async fn bind(settings: &ServerSection) -> Result<TcpListener> {
        let address = format!("{}:{}", settings.host, settings.port);
        TcpListener::bind(&address)
            .await
            .with_context(|| format!("binding dev server to {address}"))
    }

    /// Serve on an already bound listener.
    pub fn serve(listener: TcpListener, output_root: &Path, hub: ReloadHub) -> Result<Self> {
        let addr = listener.local_addr().context("reading dev server address")?;
        let app = router(output_root, hub);
        let (shutdown, stop) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop.await;
                })
                .await
                .context("dev server stopped with an error")
        });

        info!(%addr, root = ?output_root, "dev server listening on http://{addr}");
        Ok(Self {
            addr,
            shutdown,
            handle,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for the server task.
    ///
    /// Event streams never end on their own, so connections still open after
    /// a short grace period are dropped.
    pub async fn shutdown(mut self) -> Result<()> {
        let _ = self.shutdown.send(());
        if let Ok(joined) = tokio::time::timeout(SHUTDOWN_GRACE, &mut self.handle).await {
            return joined.context("dev server task panicked")?;
        }

        self.handle.abort();
        match self.handle.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Ok(()),
            Err(err) => Err(err).context("dev server task panicked"),
        }
    }
}
