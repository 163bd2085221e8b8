//! State shared between the dev loop and the reload server.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;
use wext_bundler::ReloadEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    NotStarted,
    InProgress { started_at: Instant },
    Success { duration_ms: u64 },
    Failed { error: String },
}

impl BuildStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, BuildStatus::InProgress { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildStatus::Success { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            BuildStatus::Failed { error } => Some(error),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            BuildStatus::NotStarted => "not-started",
            BuildStatus::InProgress { .. } => "building",
            BuildStatus::Success { .. } => "ok",
            BuildStatus::Failed { .. } => "failed",
        }
    }
}

/// Snapshot served at `/__wext/status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub clients: usize,
}

type ClientRegistry = RwLock<HashMap<usize, mpsc::Sender<String>>>;

pub struct DevState {
    status: RwLock<BuildStatus>,
    clients: ClientRegistry,
    next_client_id: RwLock<usize>,
}

pub type SharedState = Arc<DevState>;

impl DevState {
    pub fn new() -> Self {
        Self {
            status: RwLock::new(BuildStatus::NotStarted),
            clients: RwLock::new(HashMap::new()),
            next_client_id: RwLock::new(0),
        }
    }

    pub fn start_build(&self) {
        *self.status.write() = BuildStatus::InProgress {
            started_at: Instant::now(),
        };
    }

    pub fn complete_build(&self, duration_ms: u64) {
        *self.status.write() = BuildStatus::Success { duration_ms };
    }

    pub fn fail_build(&self, error: String) {
        *self.status.write() = BuildStatus::Failed { error };
    }

    pub fn status(&self) -> BuildStatus {
        self.status.read().clone()
    }

    pub fn report(&self) -> StatusReport {
        let status = self.status();
        StatusReport {
            status: status.label(),
            error: status.error().map(str::to_string),
            clients: self.client_count(),
        }
    }

    /// Register an SSE client; events arrive on the returned receiver.
    pub fn register_client(&self) -> (usize, mpsc::Receiver<String>) {
        let id = {
            let mut next_id = self.next_client_id.write();
            let id = *next_id;
            *next_id += 1;
            id
        };

        let (tx, rx) = mpsc::channel(100);
        self.clients.write().insert(id, tx);
        (id, rx)
    }

    pub fn unregister_client(&self, id: usize) {
        self.clients.write().remove(&id);
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Send `event` to every client, dropping those that have gone away.
    pub async fn broadcast(&self, event: &ReloadEvent) {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(err) => {
                debug!(%err, "failed to serialize reload event");
                return;
            }
        };

        let clients = self.clients.read().clone();
        let mut gone = Vec::new();
        for (id, tx) in clients {
            if tx.send(json.clone()).await.is_err() {
                gone.push(id);
            }
        }
        for id in gone {
            self.unregister_client(id);
        }
    }
}

impl Default for DevState {
    fn default() -> Self {
        Self::new()
    }
}
