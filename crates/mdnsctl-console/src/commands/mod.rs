//! The console command set.
//!
//! One module per command family; [`register_all`] populates the
//! registry with every command at startup.

use std::sync::Arc;

use mdnsctl_engine::DiscoveryEngine;

use crate::browse::BrowseManager;
use crate::registry::{CommandRegistry, RegistryResult};

mod browse;
mod host;
pub mod query;
mod server;
mod service;

pub use query::{
    clamp_max_results, effective_timeout, MAX_RESULTS, SERVICE_TIMEOUT_MS, SINGLE_HOST_TIMEOUT_MS,
};

/// Registers the full command surface.
pub fn register_all(
    registry: &mut CommandRegistry,
    engine: &Arc<dyn DiscoveryEngine>,
    browser: &Arc<BrowseManager>,
) -> RegistryResult {
    server::register(registry, engine, browser)?;
    service::register(registry, engine)?;
    host::register(registry, engine)?;
    browse::register(registry, browser)?;
    query::register(registry, engine)?;
    Ok(())
}
