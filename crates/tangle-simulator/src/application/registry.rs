//! Handle registry
//!
//! Maps opaque handles to sessions. The map lock is only held for lookup,
//! insertion and removal; each session has its own lock, so distinct handles
//! execute in parallel.

use super::service::Session;
use crate::codec::Codec;
use crate::config::RegistryConfig;
use crate::domain::errors::{SimulatorError, SimulatorResult};
use crate::ports::inbound::TangleSimulatorApi;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Opaque session identifier. Never reused within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimulatorHandle(u64);

impl SimulatorHandle {
    pub fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SimulatorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Response bytes owned by the caller until released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseBuffer {
    id: u64,
    bytes: Vec<u8>,
}

impl ResponseBuffer {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Owns every live session.
pub struct SimulatorRegistry {
    config: RegistryConfig,
    sessions: RwLock<HashMap<SimulatorHandle, Arc<Mutex<Session>>>>,
    outstanding: Mutex<HashSet<u64>>,
    next_handle: AtomicU64,
    next_buffer: AtomicU64,
    /// Encodes responses for calls that never reach a session
    codec: Codec,
}

impl SimulatorRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        let codec = Codec::new(config.simulator.max_request_bytes);
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
            outstanding: Mutex::new(HashSet::new()),
            next_handle: AtomicU64::new(1),
            next_buffer: AtomicU64::new(1),
            codec,
        }
    }

    /// Allocate a fresh session seeded with genesis.
    ///
    /// ## Errors
    ///
    /// - `Allocation`: `max_sessions` sessions are already live
    /// - `Config`: the session configuration is unusable
    pub fn create(&self) -> SimulatorResult<SimulatorHandle> {
        let mut sessions = self.sessions.write();
        if sessions.len() >= self.config.max_sessions {
            warn!(max = self.config.max_sessions, "Session limit reached");
            return Err(SimulatorError::Allocation(format!(
                "session limit of {} reached",
                self.config.max_sessions
            )));
        }

        let session = Session::new(self.config.simulator.clone())?;
        let handle = SimulatorHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        sessions.insert(handle, Arc::new(Mutex::new(session)));

        info!(%handle, live = sessions.len(), "Simulator created");
        Ok(handle)
    }

    /// Run one request against a session.
    ///
    /// Always returns a response frame; an unknown handle yields an encoded
    /// `InvalidHandle` error.
    pub fn execute(&self, handle: SimulatorHandle, request: &[u8]) -> ResponseBuffer {
        let session = self.sessions.read().get(&handle).cloned();
        let bytes = match session {
            Some(session) => session.lock().execute(request),
            None => {
                warn!(%handle, "Execute on unknown handle");
                self.codec
                    .encode_error(&SimulatorError::InvalidHandle(handle.as_raw()))
            }
        };

        let id = self.next_buffer.fetch_add(1, Ordering::Relaxed);
        self.outstanding.lock().insert(id);
        debug!(%handle, buffer = id, len = bytes.len(), "Response issued");
        ResponseBuffer { id, bytes }
    }

    /// Release a session and everything it owns.
    pub fn destroy(&self, handle: SimulatorHandle) -> SimulatorResult<()> {
        match self.sessions.write().remove(&handle) {
            Some(_) => {
                info!(%handle, "Simulator destroyed");
                Ok(())
            }
            None => {
                warn!(%handle, "Destroy on unknown handle");
                Err(SimulatorError::InvalidHandle(handle.as_raw()))
            }
        }
    }

    /// Return a response buffer. Each buffer id is accepted exactly once.
    pub fn release_response_buffer(&self, buffer: ResponseBuffer) -> SimulatorResult<()> {
        if self.outstanding.lock().remove(&buffer.id) {
            Ok(())
        } else {
            warn!(buffer = buffer.id, "Release of unknown response buffer");
            Err(SimulatorError::UnknownBuffer(buffer.id))
        }
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn contains(&self, handle: SimulatorHandle) -> bool {
        self.sessions.read().contains_key(&handle)
    }

    /// Buffers handed out and not yet released
    pub fn outstanding_buffers(&self) -> usize {
        self.outstanding.lock().len()
    }
}

impl Default for SimulatorRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}
