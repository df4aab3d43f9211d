//! The engine trait the console programs against.
//!
//! Everything network-facing lives behind [`DiscoveryEngine`]: record
//! storage, wire encoding, timers and transport are the engine's problem.
//! The console validates input, calls one of these operations and renders
//! the outcome. Production uses [`crate::MdnsEngine`]; tests substitute a
//! recording stub.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use crate::error::Result;
use crate::types::{QueryResult, RecordKind, TxtRecordSet};

/// Callback invoked by the engine for every browse notification.
///
/// Runs on an engine thread, concurrently with console command dispatch,
/// so implementations must not touch mutable console state without
/// synchronization.
pub type BrowseCallback = dyn Fn(QueryResult) + Send + Sync;

/// Operations the console consumes from the mDNS discovery engine.
///
/// Single-shot queries block the calling thread until the engine responds
/// or the given timeout elapses; the console has no way to cancel a query
/// in flight. Browse notifications arrive asynchronously on engine threads
/// until the matching `stop_browse`.
pub trait DiscoveryEngine: Send + Sync {
    /// Starts the engine. Fails with `AlreadyRunning` when it is up.
    fn init(&self) -> Result<()>;

    /// Stops the engine, unregistering all services and browse sessions.
    fn shutdown(&self) -> Result<()>;

    fn is_running(&self) -> bool;

    /// Sets the hostname advertised for self-hosted services.
    fn set_hostname(&self, hostname: &str) -> Result<()>;

    /// Sets the default instance name used when a service is added
    /// without one.
    fn set_instance_name(&self, instance: &str) -> Result<()>;

    /// Advertises a service. `host` selects a delegated host; `None`
    /// advertises for this machine.
    fn add_service(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
        port: u16,
        txt: TxtRecordSet,
    ) -> Result<()>;

    fn remove_service(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
    ) -> Result<()>;

    fn remove_all_services(&self) -> Result<()>;

    fn set_service_instance_name(
        &self,
        old_instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
        instance: &str,
    ) -> Result<()>;

    fn set_service_port(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
        port: u16,
    ) -> Result<()>;

    /// Replaces the full TXT set of an advertised service.
    fn replace_service_txt(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
        txt: TxtRecordSet,
    ) -> Result<()>;

    /// Adds or overwrites a single TXT item of an advertised service.
    fn set_service_txt_item(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
        key: &str,
        value: &str,
    ) -> Result<()>;

    fn remove_service_txt_item(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
        key: &str,
    ) -> Result<()>;

    fn add_service_subtype(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
        subtype: &str,
    ) -> Result<()>;

    /// Resolves a hostname to one IPv4 address.
    fn query_a(&self, hostname: &str, timeout_ms: u64) -> Result<Ipv4Addr>;

    /// Resolves a hostname to one IPv6 address.
    fn query_aaaa(&self, hostname: &str, timeout_ms: u64) -> Result<Ipv6Addr>;

    /// Generic single-shot query. `name` is an instance name when a
    /// service type is given, a hostname otherwise. Collects up to
    /// `max_results` entries within `timeout_ms`.
    fn query(
        &self,
        name: Option<&str>,
        service: Option<&str>,
        proto: Option<&str>,
        kind: RecordKind,
        timeout_ms: u64,
        max_results: usize,
    ) -> Result<QueryResult>;

    /// Looks up services advertised by this engine instance, either
    /// self-hosted or delegated.
    fn lookup_local_service(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        max_results: usize,
        delegated: bool,
    ) -> Result<QueryResult>;

    /// Advertises `hostname` on behalf of a device that cannot advertise
    /// itself.
    fn delegate_hostname(&self, hostname: &str, address: IpAddr) -> Result<()>;

    fn undelegate_hostname(&self, hostname: &str) -> Result<()>;

    /// Starts a standing browse for `service`/`proto`. The callback fires
    /// once per notification until `stop_browse`.
    fn start_browse(&self, service: &str, proto: &str, callback: Arc<BrowseCallback>)
        -> Result<()>;

    fn stop_browse(&self, service: &str, proto: &str) -> Result<()>;
}
