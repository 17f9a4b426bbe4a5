//! Local agent registry.
//!
//! A single file-backed key-value table mapping agent ids to network
//! addresses, consulted only in local mode when no explicit address is
//! configured. Counter updates are best-effort telemetry: each operation is
//! atomic on its own, and no lock is held across operations.
//!
//! The store is capability-gated: builds without the `local-registry`
//! feature get a stub that reports unavailable instead of failing at load
//! time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One registry row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub agent_id: String,
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    pub status: String,
    pub run_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
}

impl AgentRecord {
    pub fn new(agent_id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            agent_id: agent_id.into(),
            host: host.into(),
            port,
            framework: None,
            status: "registered".to_string(),
            run_count: 0,
            success_count: 0,
            error_count: 0,
            created_at: Utc::now(),
            last_run: None,
        }
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }
}

#[cfg(feature = "local-registry")]
mod backend {
    use std::path::Path;

    use chrono::Utc;

    use super::AgentRecord;
    use crate::core::{ClientError, Result};

    /// sled-backed registry store with an explicit open/close lifecycle.
    #[derive(Debug)]
    pub struct LocalRegistry {
        db: sled::Db,
    }

    impl LocalRegistry {
        /// Whether registry storage is compiled into this build.
        pub fn is_available() -> bool {
            true
        }

        pub fn open(path: impl AsRef<Path>) -> Result<Self> {
            let path = path.as_ref();
            let db = sled::open(path).map_err(|e| ClientError::Unknown {
                message: format!("failed to open registry at {}: {e}", path.display()),
            })?;
            Ok(Self { db })
        }

        pub fn register(&self, record: &AgentRecord) -> Result<()> {
            let bytes = serde_json::to_vec(record)?;
            self.db
                .insert(record.agent_id.as_bytes(), bytes)
                .map_err(store_error)?;
            self.db.flush().map_err(store_error)?;
            Ok(())
        }

        pub fn get(&self, agent_id: &str) -> Result<Option<AgentRecord>> {
            match self.db.get(agent_id.as_bytes()).map_err(store_error)? {
                Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
                None => Ok(None),
            }
        }

        /// Resolve an agent id to the address it is reachable on.
        pub fn resolve(&self, agent_id: &str) -> Result<(String, u16)> {
            match self.get(agent_id)? {
                Some(record) => Ok((record.host, record.port)),
                None => Err(ClientError::NotFound {
                    message: format!("agent '{agent_id}' is not present in the local registry"),
                }),
            }
        }

        /// Bump run counters and the last-run timestamp. One atomic store
        /// operation; a record that fails to decode is left untouched.
        pub fn record_run(&self, agent_id: &str, success: bool) -> Result<()> {
            let previous = self
                .db
                .fetch_and_update(agent_id.as_bytes(), move |existing| {
                    let bytes = existing?;
                    match serde_json::from_slice::<AgentRecord>(bytes) {
                        Ok(mut record) => {
                            record.run_count += 1;
                            if success {
                                record.success_count += 1;
                            } else {
                                record.error_count += 1;
                            }
                            record.last_run = Some(Utc::now());
                            serde_json::to_vec(&record).ok().or_else(|| Some(bytes.to_vec()))
                        }
                        Err(_) => Some(bytes.to_vec()),
                    }
                })
                .map_err(store_error)?;
            if previous.is_none() {
                return Err(ClientError::NotFound {
                    message: format!("agent '{agent_id}' is not present in the local registry"),
                });
            }
            self.db.flush().map_err(store_error)?;
            Ok(())
        }

        pub fn remove(&self, agent_id: &str) -> Result<()> {
            self.db.remove(agent_id.as_bytes()).map_err(store_error)?;
            self.db.flush().map_err(store_error)?;
            Ok(())
        }

        pub fn list(&self) -> Result<Vec<AgentRecord>> {
            let mut records = Vec::new();
            for entry in self.db.iter() {
                let (_, bytes) = entry.map_err(store_error)?;
                records.push(serde_json::from_slice(&bytes)?);
            }
            Ok(records)
        }

        pub fn close(self) -> Result<()> {
            self.db.flush().map_err(store_error)?;
            Ok(())
        }
    }

    fn store_error(e: sled::Error) -> ClientError {
        ClientError::Unknown {
            message: format!("registry store error: {e}"),
        }
    }

}

#[cfg(feature = "local-registry")]
pub use backend::LocalRegistry;

#[cfg(not(feature = "local-registry"))]
mod stub {
    use std::path::Path;

    use super::AgentRecord;
    use crate::core::{ClientError, Result};

    /// Placeholder used when registry storage is not compiled in.
    #[derive(Debug)]
    pub struct LocalRegistry;

    impl LocalRegistry {
        /// Whether registry storage is compiled into this build.
        pub fn is_available() -> bool {
            false
        }

        pub fn open(_path: impl AsRef<Path>) -> Result<Self> {
            Err(unavailable())
        }

        pub fn register(&self, _record: &AgentRecord) -> Result<()> {
            Err(unavailable())
        }

        pub fn get(&self, _agent_id: &str) -> Result<Option<AgentRecord>> {
            Err(unavailable())
        }

        pub fn resolve(&self, _agent_id: &str) -> Result<(String, u16)> {
            Err(unavailable())
        }

        pub fn record_run(&self, _agent_id: &str, _success: bool) -> Result<()> {
            Err(unavailable())
        }

        pub fn remove(&self, _agent_id: &str) -> Result<()> {
            Err(unavailable())
        }

        pub fn list(&self) -> Result<Vec<AgentRecord>> {
            Err(unavailable())
        }

        pub fn close(self) -> Result<()> {
            Ok(())
        }
    }

    fn unavailable() -> ClientError {
        ClientError::NotFound {
            message: "local registry support is not enabled in this build".to_string(),
        }
    }
}

#[cfg(not(feature = "local-registry"))]
pub use stub::LocalRegistry;
