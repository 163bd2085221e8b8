//! Reload server.
//!
//! The reload client bundled into the development background connects to
//! `/__wext/events` and receives one JSON [`ReloadEvent`] per SSE message.
//!
//! [`ReloadEvent`]: wext_bundler::ReloadEvent

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{
        IntoResponse, Sse,
        sse::{Event, KeepAlive},
    },
    routing::get,
};
use tokio::net::TcpListener;
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

use crate::dev::state::{SharedState, StatusReport};
use crate::error::{CliError, Result};

pub const EVENTS_PATH: &str = "/__wext/events";
pub const STATUS_PATH: &str = "/__wext/status";
pub const CLIENT_PATH: &str = "/__wext/client.js";

#[derive(Clone)]
struct ServerContext {
    state: SharedState,
    client_script: Arc<str>,
}

pub struct ReloadServer {
    listener: TcpListener,
    context: ServerContext,
}

impl ReloadServer {
    /// Bind to `addr` (`host:port`). The client script served at
    /// [`CLIENT_PATH`] connects back to `origin`.
    pub async fn bind(addr: &str, origin: &str, state: SharedState) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind to {addr}: {e}")))?;
        Ok(Self {
            listener,
            context: ServerContext {
                state,
                client_script: wext_bundler::dev_client_script(origin).into(),
            },
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the task is dropped or the listener fails.
    pub async fn serve(self) -> Result<()> {
        let app = router(self.context);
        axum::serve(self.listener, app)
            .await
            .map_err(|e| CliError::Server(e.to_string()))
    }
}

fn router(context: ServerContext) -> Router {
    Router::new()
        .route(EVENTS_PATH, get(handle_events))
        .route(STATUS_PATH, get(handle_status))
        .route(CLIENT_PATH, get(handle_client))
        .layer(
            // Extension origins are chrome-extension://<id> and friends.
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(context)
}

async fn handle_events(
    State(context): State<ServerContext>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (id, rx) = context.state.register_client();
    debug!(client = id, "reload client connected");

    let stream = ReceiverStream::new(rx).map(|data| Ok(Event::default().data(data)));
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

async fn handle_status(State(context): State<ServerContext>) -> Json<StatusReport> {
    Json(context.state.report())
}

async fn handle_client(State(context): State<ServerContext>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        context.client_script.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev::state::DevState;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    async fn start() -> (SocketAddr, SharedState) {
        let state: SharedState = Arc::new(DevState::new());
        let server = ReloadServer::bind("127.0.0.1:0", "http://localhost:3000", state.clone())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.serve());
        (addr, state)
    }

    #[tokio::test]
    async fn status_reports_build_state() {
        let (addr, state) = start().await;
        state.complete_build(10);

        let response = get(addr, STATUS_PATH).await;
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains(r#"{"status":"ok","clients":0}"#), "{response}");
    }

    #[tokio::test]
    async fn client_script_points_at_origin() {
        let (addr, _) = start().await;
        let response = get(addr, CLIENT_PATH).await;
        assert!(response.contains("application/javascript"));
        assert!(response.contains("http://localhost:3000"));
    }

    #[tokio::test]
    async fn bind_failure_is_a_server_error() {
        let (addr, _) = start().await;
        let err = ReloadServer::bind(&addr.to_string(), "http://x", Arc::new(DevState::new()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, CliError::Server(_)));
    }
}
