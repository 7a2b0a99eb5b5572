//! Named process registry.
//!
//! Tracks at most one running process per service name. Every lookup that
//! feeds a mutation, and every mutation, happens under one async mutex, so
//! two concurrent restarts of the same name cannot both observe a free slot.

pub mod handle;

use std::collections::{BTreeMap, HashMap};
use std::io;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{CoreError, CoreResult};
use crate::types::{Pid, Timestamp};

pub use handle::ServiceHandle;

struct ServiceEntry {
    pid: Pid,
    started_at: Timestamp,
    handle: Box<dyn ServiceHandle>,
}

/// Point-in-time description of one tracked service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub name: String,
    pub pid: Pid,
    pub started_at: Timestamp,
}

/// Per-name result of [`ProcessRegistry::stop_all`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StopOutcome {
    Stopped { pid: Pid },
    Failed { pid: Pid, reason: String },
}

impl StopOutcome {
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped { .. })
    }
}

/// Lock-guarded table of running services keyed by name.
#[derive(Default)]
pub struct ProcessRegistry {
    services: Mutex<HashMap<String, ServiceEntry>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminate the process tracked under `name`, if any.
    ///
    /// An absent name is a no-op. When termination fails the record is kept
    /// and a [`CoreError::Supervision`] is returned: the slot must not look
    /// free while the old process may still be alive.
    pub async fn check_and_kill_service(&self, name: &str) -> CoreResult<()> {
        let mut services = self.services.lock().await;
        kill_tracked(&mut services, name).await.map(|_| ())
    }

    /// Record a process that was launched after `name` was cleared.
    ///
    /// Fails without touching the table if the slot is still occupied; the
    /// new process is killed in that case so it cannot run untracked.
    pub async fn register_started(
        &self,
        name: &str,
        handle: Box<dyn ServiceHandle>,
    ) -> CoreResult<Pid> {
        let mut services = self.services.lock().await;
        insert_tracked(&mut services, name, handle).await
    }

    /// Replace whatever runs under `name` with a freshly spawned process.
    ///
    /// Kill, spawn, and register happen inside a single critical section.
    /// `spawn` is only called once the previous instance is confirmed dead,
    /// and nothing is recorded if it fails.
    pub async fn launch<H, F>(&self, name: &str, spawn: F) -> CoreResult<Pid>
    where
        H: ServiceHandle,
        F: FnOnce() -> io::Result<H>,
    {
        let mut services = self.services.lock().await;

        if let Some(old_pid) = kill_tracked(&mut services, name).await? {
            tracing::info!(service = name, old_pid, "Previous instance terminated");
        }

        let handle = spawn().map_err(|e| {
            tracing::error!(service = name, error = %e, "Launch failed");
            CoreError::Launch {
                name: name.to_string(),
                reason: e.to_string(),
            }
        })?;

        insert_tracked(&mut services, name, Box::new(handle)).await
    }

    /// Stop one service by name. Unlike [`check_and_kill_service`], an
    /// unknown name is an error.
    ///
    /// [`check_and_kill_service`]: Self::check_and_kill_service
    pub async fn stop(&self, name: &str) -> CoreResult<Pid> {
        let mut services = self.services.lock().await;
        kill_tracked(&mut services, name)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "service",
                key: name.to_string(),
            })
    }

    /// Stop every tracked service, collecting one outcome per name.
    ///
    /// Names come from a snapshot taken up front; a failure on one name
    /// never prevents attempts on the rest.
    pub async fn stop_all(&self) -> BTreeMap<String, StopOutcome> {
        let snapshot = self.status_snapshot().await;
        self.stop_names(snapshot).await
    }

    /// Stop each name in `snapshot`. Names that vanished since the snapshot
    /// (stopped elsewhere in the meantime) are left out of the result; a
    /// stopped entry carries the pid this call actually killed.
    async fn stop_names(&self, snapshot: BTreeMap<String, Pid>) -> BTreeMap<String, StopOutcome> {
        let mut outcomes = BTreeMap::new();

        for (name, seen_pid) in snapshot {
            let result = {
                let mut services = self.services.lock().await;
                kill_tracked(&mut services, &name).await
            };
            let outcome = match result {
                Ok(Some(pid)) => StopOutcome::Stopped { pid },
                Ok(None) => {
                    tracing::debug!(service = %name, pid = seen_pid, "Already stopped");
                    continue;
                }
                Err(e) => StopOutcome::Failed {
                    pid: seen_pid,
                    reason: e.to_string(),
                },
            };
            outcomes.insert(name, outcome);
        }

        let failed = outcomes.values().filter(|o| !o.is_stopped()).count();
        tracing::info!(total = outcomes.len(), failed, "Stop-all finished");
        outcomes
    }

    /// Copy of the current name → pid mapping.
    pub async fn status_snapshot(&self) -> BTreeMap<String, Pid> {
        self.services
            .lock()
            .await
            .iter()
            .map(|(name, entry)| (name.clone(), entry.pid))
            .collect()
    }

    /// Detailed listing, sorted by name.
    pub async fn list(&self) -> Vec<ServiceStatus> {
        let services = self.services.lock().await;
        let mut list: Vec<_> = services
            .iter()
            .map(|(name, entry)| ServiceStatus {
                name: name.clone(),
                pid: entry.pid,
                started_at: entry.started_at,
            })
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    pub async fn len(&self) -> usize {
        self.services.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.services.lock().await.is_empty()
    }
}

/// Kill and untrack `name`. Returns the pid that was stopped, or `None` if
/// nothing was tracked. Caller holds the registry lock.
async fn kill_tracked(
    services: &mut HashMap<String, ServiceEntry>,
    name: &str,
) -> CoreResult<Option<Pid>> {
    let Some(entry) = services.get_mut(name) else {
        return Ok(None);
    };

    let pid = entry.pid;
    match entry.handle.terminate().await {
        Ok(()) => {
            services.remove(name);
            tracing::info!(service = name, pid, "Service terminated");
            Ok(Some(pid))
        }
        Err(e) => {
            tracing::warn!(service = name, pid, error = %e, "Failed to terminate service");
            Err(CoreError::Supervision {
                name: name.to_string(),
                reason: e.to_string(),
            })
        }
    }
}

/// Insert a freshly launched handle. Caller holds the registry lock.
async fn insert_tracked(
    services: &mut HashMap<String, ServiceEntry>,
    name: &str,
    mut handle: Box<dyn ServiceHandle>,
) -> CoreResult<Pid> {
    if let Some(existing) = services.get(name) {
        let reason = format!("slot still held by pid {}", existing.pid);
        if let Err(e) = handle.terminate().await {
            tracing::error!(service = name, error = %e, "Failed to kill rejected launch");
        }
        return Err(CoreError::Supervision {
            name: name.to_string(),
            reason,
        });
    }

    let Some(pid) = handle.pid() else {
        return Err(CoreError::Launch {
            name: name.to_string(),
            reason: "process exited before it could be registered".to_string(),
        });
    };

    services.insert(
        name.to_string(),
        ServiceEntry {
            pid,
            started_at: chrono::Utc::now(),
            handle,
        },
    );
    tracing::info!(service = name, pid, "Service registered");
    Ok(pid)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
