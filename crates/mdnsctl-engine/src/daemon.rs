//! mDNS engine backed by the `mdns-sd` service daemon.
//!
//! All wire-level work (multicast sockets, record caching, probing and
//! announcing) is delegated to [`mdns_sd::ServiceDaemon`]. This adapter
//! keeps the console-visible state the daemon does not: the table of
//! advertised services in insertion order, the delegated-host table and
//! the hostname/instance defaults. Browse sessions pump daemon events on
//! a plain consumer thread per session and invoke the console callback
//! for every resolved notification.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use mdns_sd::{
    HostnameResolutionEvent, ServiceDaemon, ServiceEvent as DaemonEvent, ServiceInfo,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::engine::{BrowseCallback, DiscoveryEngine};
use crate::error::{EngineError, Result};
use crate::types::{QueryResult, RecordKind, ResultEntry, ServiceKey, TxtEntry, TxtRecordSet};

/// An advertised service as the console described it, in registration
/// order of its TXT entries.
#[derive(Debug, Clone)]
struct ServiceRecord {
    port: u16,
    txt: TxtRecordSet,
    subtypes: Vec<String>,
}

/// Engine state that only exists while the daemon runs.
struct DaemonState {
    daemon: ServiceDaemon,
    /// Hostname advertised for self-hosted services, without `.local.`.
    hostname: String,
    /// Instance name used when a service is added without one.
    default_instance: String,
    services: Vec<(ServiceKey, ServiceRecord)>,
    delegated: HashMap<String, IpAddr>,
}

/// Production [`DiscoveryEngine`] implementation.
pub struct MdnsEngine {
    state: Mutex<Option<DaemonState>>,
    /// Consumer threads of active browse sessions, keyed by type domain.
    browsers: DashMap<String, JoinHandle<()>>,
}

impl MdnsEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(None),
            browsers: DashMap::new(),
        }
    }

    /// Default hostname advertised before `set_hostname`, taken from the
    /// operating system.
    fn os_hostname() -> String {
        hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "mdnsctl".to_string())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut DaemonState) -> Result<T>) -> Result<T> {
        let mut guard = self.state.lock();
        match guard.as_mut() {
            Some(state) => f(state),
            None => Err(EngineError::NotRunning),
        }
    }

    /// Builds the daemon-facing service info for a record and announces it,
    /// including one extra announcement per subtype domain.
    fn announce(state: &DaemonState, key: &ServiceKey, record: &ServiceRecord) -> Result<()> {
        let mut domains = vec![key.type_domain()];
        for sub in &record.subtypes {
            domains.push(format!("{}._sub.{}", sub, key.type_domain()));
        }

        for domain in domains {
            let info = build_service_info(state, key, record, &domain)?;
            state
                .daemon
                .register(info)
                .map_err(|e| EngineError::Daemon(e.to_string()))?;
        }
        Ok(())
    }

    fn withdraw(state: &DaemonState, key: &ServiceKey, record: &ServiceRecord) -> Result<()> {
        let mut domains = vec![key.type_domain()];
        for sub in &record.subtypes {
            domains.push(format!("{}._sub.{}", sub, key.type_domain()));
        }
        for domain in domains {
            let fullname = format!("{}.{}", key.instance, domain);
            if let Err(e) = state.daemon.unregister(&fullname) {
                warn!(fullname, error = %e, "Failed to unregister service");
            }
        }
        Ok(())
    }

    /// Finds the position of the record matching the console's service
    /// coordinates. A missing instance matches any instance of the
    /// service/proto/host triple, the way the original engine resolved it.
    fn find_service(
        state: &DaemonState,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
    ) -> Result<usize> {
        state
            .services
            .iter()
            .position(|(key, _)| {
                key.service == service
                    && key.proto == proto
                    && key.host.as_deref() == host
                    && instance.is_none_or(|i| key.instance == i)
            })
            .ok_or_else(|| {
                EngineError::InvalidArgument(format!(
                    "no advertised service matches {}.{}",
                    service, proto
                ))
            })
    }
}

impl Default for MdnsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryEngine for MdnsEngine {
    fn init(&self) -> Result<()> {
        let mut guard = self.state.lock();
        if guard.is_some() {
            return Err(EngineError::AlreadyRunning);
        }

        let daemon = ServiceDaemon::new().map_err(|e| EngineError::Daemon(e.to_string()))?;
        let hostname = Self::os_hostname();
        info!(hostname, "mDNS engine started");

        *guard = Some(DaemonState {
            daemon,
            default_instance: hostname.clone(),
            hostname,
            services: Vec::new(),
            delegated: HashMap::new(),
        });
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        let Some(state) = self.state.lock().take() else {
            return Err(EngineError::NotRunning);
        };

        // Stop browse pumps first so no callback fires into torn-down
        // console state; the threads exit when the daemon channel closes.
        for entry in self.browsers.iter() {
            if let Err(e) = state.daemon.stop_browse(entry.key()) {
                debug!(ty_domain = entry.key(), error = %e, "stop_browse on shutdown");
            }
        }
        self.browsers.clear();

        state
            .daemon
            .shutdown()
            .map_err(|e| EngineError::Daemon(e.to_string()))?;
        info!("mDNS engine stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.state.lock().is_some()
    }

    fn set_hostname(&self, hostname: &str) -> Result<()> {
        self.with_state(|state| {
            state.hostname = hostname.to_string();
            info!(hostname, "Hostname set");
            Ok(())
        })
    }

    fn set_instance_name(&self, instance: &str) -> Result<()> {
        self.with_state(|state| {
            state.default_instance = instance.to_string();
            info!(instance, "Default instance name set");
            Ok(())
        })
    }

    fn add_service(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
        port: u16,
        txt: TxtRecordSet,
    ) -> Result<()> {
        self.with_state(|state| {
            if let Some(host) = host {
                if !state.delegated.contains_key(host) {
                    return Err(EngineError::InvalidArgument(format!(
                        "unknown delegated host '{}'",
                        host
                    )));
                }
            }

            let instance = instance.unwrap_or(state.default_instance.as_str());
            let key = ServiceKey::new(instance, service, proto, host);
            if state.services.iter().any(|(k, _)| *k == key) {
                return Err(EngineError::InvalidArgument(format!(
                    "service {} already advertised",
                    key
                )));
            }

            let record = ServiceRecord {
                port,
                txt,
                subtypes: Vec::new(),
            };
            Self::announce(state, &key, &record)?;
            info!(service = %key, port, "Service advertised");
            state.services.push((key, record));
            Ok(())
        })
    }

    fn remove_service(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
    ) -> Result<()> {
        self.with_state(|state| {
            let idx = Self::find_service(state, instance, service, proto, host)?;
            let (key, record) = state.services.remove(idx);
            Self::withdraw(state, &key, &record)?;
            info!(service = %key, "Service withdrawn");
            Ok(())
        })
    }

    fn remove_all_services(&self) -> Result<()> {
        self.with_state(|state| {
            let services = std::mem::take(&mut state.services);
            for (key, record) in &services {
                Self::withdraw(state, key, record)?;
            }
            info!(count = services.len(), "All services withdrawn");
            Ok(())
        })
    }

    fn set_service_instance_name(
        &self,
        old_instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
        instance: &str,
    ) -> Result<()> {
        self.with_state(|state| {
            let idx = Self::find_service(state, old_instance, service, proto, host)?;
            let (old_key, record) = state.services.remove(idx);
            Self::withdraw(state, &old_key, &record)?;

            let key = ServiceKey::new(instance, service, proto, host);
            Self::announce(state, &key, &record)?;
            info!(from = %old_key, to = %key, "Service instance renamed");
            state.services.push((key, record));
            Ok(())
        })
    }

    fn set_service_port(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
        port: u16,
    ) -> Result<()> {
        self.with_state(|state| {
            let idx = Self::find_service(state, instance, service, proto, host)?;
            state.services[idx].1.port = port;
            let (key, record) = state.services[idx].clone();
            Self::announce(state, &key, &record)?;
            info!(service = %key, port, "Service port updated");
            Ok(())
        })
    }

    fn replace_service_txt(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
        txt: TxtRecordSet,
    ) -> Result<()> {
        self.with_state(|state| {
            let idx = Self::find_service(state, instance, service, proto, host)?;
            state.services[idx].1.txt = txt;
            let (key, record) = state.services[idx].clone();
            Self::announce(state, &key, &record)?;
            debug!(service = %key, items = record.txt.len(), "TXT set replaced");
            Ok(())
        })
    }

    fn set_service_txt_item(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.with_state(|state| {
            let idx = Self::find_service(state, instance, service, proto, host)?;
            let txt = &mut state.services[idx].1.txt;
            match txt.iter_mut().find(|entry| entry.key == key) {
                Some(entry) => entry.value = value.to_string(),
                None => txt.push(TxtEntry::new(key, value)),
            }
            let (service_key, record) = state.services[idx].clone();
            Self::announce(state, &service_key, &record)?;
            Ok(())
        })
    }

    fn remove_service_txt_item(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
        key: &str,
    ) -> Result<()> {
        self.with_state(|state| {
            let idx = Self::find_service(state, instance, service, proto, host)?;
            let txt = &mut state.services[idx].1.txt;
            let before = txt.len();
            txt.retain(|entry| entry.key != key);
            if txt.len() == before {
                return Err(EngineError::InvalidArgument(format!(
                    "no TXT item '{}'",
                    key
                )));
            }
            let (service_key, record) = state.services[idx].clone();
            Self::announce(state, &service_key, &record)?;
            Ok(())
        })
    }

    fn add_service_subtype(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
        subtype: &str,
    ) -> Result<()> {
        self.with_state(|state| {
            let idx = Self::find_service(state, instance, service, proto, host)?;
            let record = &mut state.services[idx].1;
            if record.subtypes.iter().any(|s| s == subtype) {
                return Ok(());
            }
            record.subtypes.push(subtype.to_string());

            let (key, record) = state.services[idx].clone();
            let domain = format!("{}._sub.{}", subtype, key.type_domain());
            let info = build_service_info(state, &key, &record, &domain)?;
            state
                .daemon
                .register(info)
                .map_err(|e| EngineError::Daemon(e.to_string()))?;
            info!(service = %key, subtype, "Subtype announced");
            Ok(())
        })
    }

    fn query_a(&self, hostname: &str, timeout_ms: u64) -> Result<Ipv4Addr> {
        let addrs = self.resolve_addresses(hostname, timeout_ms)?;
        addrs
            .into_iter()
            .find_map(|addr| match addr {
                IpAddr::V4(v4) => Some(v4),
                IpAddr::V6(_) => None,
            })
            .ok_or(EngineError::NotFound)
    }

    fn query_aaaa(&self, hostname: &str, timeout_ms: u64) -> Result<Ipv6Addr> {
        let addrs = self.resolve_addresses(hostname, timeout_ms)?;
        addrs
            .into_iter()
            .find_map(|addr| match addr {
                IpAddr::V4(_) => None,
                IpAddr::V6(v6) => Some(v6),
            })
            .ok_or(EngineError::NotFound)
    }

    fn query(
        &self,
        name: Option<&str>,
        service: Option<&str>,
        proto: Option<&str>,
        kind: RecordKind,
        timeout_ms: u64,
        max_results: usize,
    ) -> Result<QueryResult> {
        match (service, proto) {
            (Some(service), Some(proto)) => {
                self.query_service(name, service, proto, kind, timeout_ms, max_results)
            }
            _ => {
                // Hostname-only query: every address record for the host,
                // rendered as one entry.
                let hostname = name.ok_or_else(|| {
                    EngineError::InvalidArgument("query needs a hostname or a service".into())
                })?;
                let addresses = self.resolve_addresses(hostname, timeout_ms)?;
                let entry = ResultEntry {
                    hostname: Some(hostname.to_string()),
                    addresses: addresses.into_iter().take(max_results).collect(),
                    ..Default::default()
                };
                Ok(QueryResult::new(vec![entry]))
            }
        }
    }

    fn lookup_local_service(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        max_results: usize,
        delegated: bool,
    ) -> Result<QueryResult> {
        self.with_state(|state| {
            let entries: Vec<ResultEntry> = state
                .services
                .iter()
                .filter(|(key, _)| {
                    key.service == service
                        && key.proto == proto
                        && key.host.is_some() == delegated
                        && instance.is_none_or(|i| key.instance == i)
                })
                .take(max_results)
                .map(|(key, record)| {
                    let host = key.host.as_deref().unwrap_or(&state.hostname);
                    let addresses = key
                        .host
                        .as_deref()
                        .and_then(|h| state.delegated.get(h))
                        .map(|addr| vec![*addr])
                        .unwrap_or_default();
                    ResultEntry {
                        instance: Some(key.instance.clone()),
                        hostname: Some(host.to_string()),
                        port: Some(record.port),
                        txt: record.txt.clone(),
                        addresses,
                        ..Default::default()
                    }
                })
                .collect();

            if entries.is_empty() {
                return Err(EngineError::NotFound);
            }
            Ok(QueryResult::new(entries))
        })
    }

    fn delegate_hostname(&self, hostname: &str, address: IpAddr) -> Result<()> {
        self.with_state(|state| {
            state.delegated.insert(hostname.to_string(), address);
            info!(hostname, %address, "Hostname delegated");
            Ok(())
        })
    }

    fn undelegate_hostname(&self, hostname: &str) -> Result<()> {
        self.with_state(|state| {
            if state.delegated.remove(hostname).is_none() {
                return Err(EngineError::InvalidArgument(format!(
                    "hostname '{}' is not delegated",
                    hostname
                )));
            }
            // Withdraw services that were advertised for this host.
            let mut withdrawn = Vec::new();
            state.services.retain(|(key, record)| {
                if key.host.as_deref() == Some(hostname) {
                    withdrawn.push((key.clone(), record.clone()));
                    false
                } else {
                    true
                }
            });
            for (key, record) in &withdrawn {
                Self::withdraw(state, key, record)?;
            }
            info!(hostname, services = withdrawn.len(), "Hostname undelegated");
            Ok(())
        })
    }

    fn start_browse(
        &self,
        service: &str,
        proto: &str,
        callback: Arc<BrowseCallback>,
    ) -> Result<()> {
        let ty_domain = format!("{}.{}.local.", service, proto);
        let receiver = self.with_state(|state| {
            state
                .daemon
                .browse(&ty_domain)
                .map_err(|e| EngineError::Daemon(e.to_string()))
        })?;

        let domain = ty_domain.clone();
        let handle = std::thread::spawn(move || {
            while let Ok(event) = receiver.recv() {
                match event {
                    DaemonEvent::ServiceResolved(info) => {
                        callback(QueryResult::new(vec![entry_from_info(&info)]));
                    }
                    DaemonEvent::ServiceRemoved(ty, fullname) => {
                        debug!(ty, fullname, "Browsed service removed");
                    }
                    DaemonEvent::SearchStopped(_) => break,
                    _ => {}
                }
            }
            debug!(ty_domain = domain, "Browse pump stopped");
        });
        self.browsers.insert(ty_domain, handle);
        Ok(())
    }

    fn stop_browse(&self, service: &str, proto: &str) -> Result<()> {
        let ty_domain = format!("{}.{}.local.", service, proto);
        self.browsers.remove(&ty_domain);
        self.with_state(|state| {
            state
                .daemon
                .stop_browse(&ty_domain)
                .map_err(|e| EngineError::Daemon(e.to_string()))
        })
    }
}

impl MdnsEngine {
    /// Collects every address the daemon resolves for `hostname` within
    /// the timeout, IPv4 before IPv6, each family in address order.
    fn resolve_addresses(&self, hostname: &str, timeout_ms: u64) -> Result<Vec<IpAddr>> {
        let fqdn = format!("{}.local.", hostname);
        let receiver = self.with_state(|state| {
            state
                .daemon
                .resolve_hostname(&fqdn, Some(timeout_ms))
                .map_err(|e| EngineError::Daemon(e.to_string()))
        })?;

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut found: Vec<IpAddr> = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match receiver.recv_timeout(remaining) {
                Ok(HostnameResolutionEvent::AddressesFound(_, addrs)) => {
                    for addr in addrs {
                        if !found.contains(&addr) {
                            found.push(addr);
                        }
                    }
                }
                Ok(HostnameResolutionEvent::SearchTimeout(_)) => break,
                Ok(_) => {}
                Err(_) => break,
            }
        }

        if found.is_empty() {
            return Err(EngineError::NotFound);
        }
        found.sort_by_key(|addr| (addr.is_ipv6(), *addr));
        Ok(found)
    }

    /// Timed browse collecting resolved instances of a service type.
    fn query_service(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        kind: RecordKind,
        timeout_ms: u64,
        max_results: usize,
    ) -> Result<QueryResult> {
        let ty_domain = format!("{}.{}.local.", service, proto);
        let receiver = self.with_state(|state| {
            state
                .daemon
                .browse(&ty_domain)
                .map_err(|e| EngineError::Daemon(e.to_string()))
        })?;

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut entries: Vec<ResultEntry> = Vec::new();
        loop {
            if entries.len() >= max_results {
                break;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match receiver.recv_timeout(remaining) {
                Ok(DaemonEvent::ServiceResolved(info)) => {
                    let entry = entry_from_info(&info);
                    let matches_instance = instance.is_none_or(|wanted| {
                        entry.instance.as_deref() == Some(wanted)
                    });
                    if matches_instance {
                        entries.push(prune_entry(entry, kind));
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }

        if let Err(e) = self.with_state(|state| {
            state
                .daemon
                .stop_browse(&ty_domain)
                .map_err(|e| EngineError::Daemon(e.to_string()))
        }) {
            debug!(ty_domain, error = %e, "stop_browse after query");
        }

        if entries.is_empty() {
            return Err(EngineError::NotFound);
        }
        Ok(QueryResult::new(entries))
    }
}

/// Maps a resolved daemon record into a result entry. The daemon exposes
/// no interface identity, so the header fields stay empty.
fn entry_from_info(info: &ServiceInfo) -> ResultEntry {
    let instance = info
        .get_fullname()
        .split('.')
        .next()
        .map(str::to_owned);
    let hostname = info
        .get_hostname()
        .trim_end_matches('.')
        .trim_end_matches(".local")
        .to_string();

    let mut txt: TxtRecordSet = Vec::new();
    for prop in info.get_properties().iter() {
        txt.push(TxtEntry::new(prop.key(), prop.val_str()));
    }

    let mut addresses: Vec<IpAddr> = info.get_addresses().iter().copied().collect();
    addresses.sort_by_key(|addr| (addr.is_ipv6(), *addr));

    ResultEntry {
        interface: None,
        instance,
        hostname: Some(hostname),
        port: Some(info.get_port()),
        txt,
        addresses,
    }
}

/// Restricts an entry to the fields the requested record kind answers
/// with. `Ptr` and `Any` return the fully resolved block; `Srv` drops
/// the attribute and address records; `Txt` keeps the instance line and
/// attributes; address kinds keep only their family.
fn prune_entry(mut entry: ResultEntry, kind: RecordKind) -> ResultEntry {
    match kind {
        RecordKind::Any | RecordKind::Ptr => {}
        RecordKind::Srv => {
            entry.txt.clear();
            entry.addresses.clear();
        }
        RecordKind::Txt => {
            entry.hostname = None;
            entry.port = None;
            entry.addresses.clear();
        }
        RecordKind::A => {
            entry.addresses.retain(IpAddr::is_ipv4);
            entry.hostname = None;
            entry.port = None;
            entry.txt.clear();
        }
        RecordKind::Aaaa => {
            entry.addresses.retain(IpAddr::is_ipv6);
            entry.hostname = None;
            entry.port = None;
            entry.txt.clear();
        }
    }
    entry
}

fn build_service_info(
    state: &DaemonState,
    key: &ServiceKey,
    record: &ServiceRecord,
    domain: &str,
) -> Result<ServiceInfo> {
    let properties: HashMap<String, String> = record
        .txt
        .iter()
        .map(|entry| (entry.key.clone(), entry.value.clone()))
        .collect();

    let info = match key.host.as_deref() {
        Some(host) => {
            let address = state.delegated.get(host).ok_or_else(|| {
                EngineError::InvalidArgument(format!("unknown delegated host '{}'", host))
            })?;
            ServiceInfo::new(
                domain,
                &key.instance,
                &format!("{}.local.", host),
                *address,
                record.port,
                properties,
            )
            .map_err(|e| EngineError::Daemon(e.to_string()))?
        }
        None => ServiceInfo::new(
            domain,
            &key.instance,
            &format!("{}.local.", state.hostname),
            "",
            record.port,
            properties,
        )
        .map_err(|e| EngineError::Daemon(e.to_string()))?
        .enable_addr_auto(),
    };
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_entry_kinds() {
        let full = || ResultEntry {
            instance: Some("printer".into()),
            hostname: Some("host".into()),
            port: Some(80),
            txt: vec![TxtEntry::new("a", "1")],
            addresses: vec![
                IpAddr::V4(Ipv4Addr::new(192, 168, 1, 2)),
                IpAddr::V6(Ipv6Addr::LOCALHOST),
            ],
            ..Default::default()
        };

        let ptr = prune_entry(full(), RecordKind::Ptr);
        assert_eq!(ptr.instance.as_deref(), Some("printer"));
        assert_eq!(ptr.port, Some(80));

        let srv = prune_entry(full(), RecordKind::Srv);
        assert_eq!(srv.port, Some(80));
        assert!(srv.txt.is_empty() && srv.addresses.is_empty());

        let txt = prune_entry(full(), RecordKind::Txt);
        assert!(txt.hostname.is_none());
        assert_eq!(txt.txt.len(), 1);

        let a = prune_entry(full(), RecordKind::A);
        assert_eq!(a.addresses.len(), 1);
        assert!(a.addresses[0].is_ipv4());

        let any = prune_entry(full(), RecordKind::Any);
        assert_eq!(any.addresses.len(), 2);
    }

    #[test]
    fn test_engine_requires_init() {
        let engine = MdnsEngine::new();
        assert!(!engine.is_running());
        assert!(matches!(
            engine.set_hostname("host"),
            Err(EngineError::NotRunning)
        ));
        assert!(matches!(engine.shutdown(), Err(EngineError::NotRunning)));
    }
}
