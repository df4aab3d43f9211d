//! Browse session manager.
//!
//! Bridges the engine's asynchronous browse notifications back into
//! console output. Sessions are keyed by `(service, proto)`; the session
//! map is the only state shared between the dispatch loop and engine
//! callback threads, so it lives in a concurrent map and every
//! notification is rendered immediately with no buffering.

use std::io::Write;
use std::sync::Arc;

use dashmap::DashMap;
use mdnsctl_engine::{DiscoveryEngine, QueryResult};
use tracing::{debug, warn};

use crate::error::BrowseError;
use crate::format::format_results;

type SessionKey = (String, String);

/// Registry of active browse sessions.
pub struct BrowseManager {
    engine: Arc<dyn DiscoveryEngine>,
    sessions: DashMap<SessionKey, ()>,
}

impl BrowseManager {
    pub fn new(engine: Arc<dyn DiscoveryEngine>) -> Self {
        Self {
            engine,
            sessions: DashMap::new(),
        }
    }

    /// Starts a session for `(service, proto)`.
    ///
    /// A duplicate start is rejected with `AlreadyBrowsing`; the engine
    /// callback renders every notification as it arrives, repeats
    /// included.
    pub fn start(&self, service: &str, proto: &str) -> Result<(), BrowseError> {
        let key = (service.to_string(), proto.to_string());
        let entry = match self.sessions.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(BrowseError::AlreadyBrowsing(
                    service.to_string(),
                    proto.to_string(),
                ));
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => vacant,
        };

        self.engine
            .start_browse(service, proto, Arc::new(render_notification))?;
        debug!(service, proto, "Browse session started");
        entry.insert(());
        Ok(())
    }

    /// Stops the session for `(service, proto)`, failing with
    /// `NotBrowsing` when none is active.
    pub fn stop(&self, service: &str, proto: &str) -> Result<(), BrowseError> {
        let key = (service.to_string(), proto.to_string());
        if self.sessions.remove(&key).is_none() {
            return Err(BrowseError::NotBrowsing(
                service.to_string(),
                proto.to_string(),
            ));
        }
        self.engine.stop_browse(service, proto)?;
        debug!(service, proto, "Browse session stopped");
        Ok(())
    }

    pub fn is_active(&self, service: &str, proto: &str) -> bool {
        self.sessions
            .contains_key(&(service.to_string(), proto.to_string()))
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    /// Deregisters every active session. Called on engine stop and at
    /// process shutdown so the engine cannot fire a callback into a
    /// console that no longer exists.
    pub fn stop_all(&self) {
        let keys: Vec<SessionKey> = self
            .sessions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for (service, proto) in keys {
            if self.sessions.remove(&(service.clone(), proto.clone())).is_none() {
                continue;
            }
            if let Err(e) = self.engine.stop_browse(&service, &proto) {
                warn!(service, proto, error = %e, "Failed to stop browse session");
            }
        }
    }
}

/// The notification callback registered with the engine. Runs on an
/// engine thread; the formatter is pure, and stdout locking is the only
/// synchronization needed.
fn render_notification(result: QueryResult) {
    let text = format_results(&result);
    if text.is_empty() {
        return;
    }
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}
