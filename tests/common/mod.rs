//! Test doubles shared by the console integration tests.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, Mutex};

use mdnsctl_engine::error::Result as EngineResult;
use mdnsctl_engine::{
    BrowseCallback, DiscoveryEngine, EngineError, QueryResult, RecordKind, ResultEntry,
    TxtRecordSet,
};

#[derive(Debug, Clone)]
pub struct StubService {
    pub instance: String,
    pub service: String,
    pub proto: String,
    pub host: Option<String>,
    pub port: u16,
    pub txt: TxtRecordSet,
}

/// A scriptable, call-recording [`DiscoveryEngine`].
///
/// Every operation appends one line to the call log so tests can assert
/// exactly what reached the engine (or that nothing did). Advertised
/// services are kept in a real table so `lookup_local_service` behaves
/// like the production engine's local registry.
#[derive(Default)]
pub struct StubEngine {
    pub hostname: Mutex<String>,
    pub services: Mutex<Vec<StubService>>,
    pub log: Mutex<Vec<String>>,
    /// Address returned by `query_a`; `None` means not found.
    pub a_answer: Mutex<Option<Ipv4Addr>>,
}

impl StubEngine {
    pub fn new() -> Arc<Self> {
        let stub = Self {
            hostname: Mutex::new("test-host".to_string()),
            ..Default::default()
        };
        Arc::new(stub)
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, line: String) {
        self.log.lock().unwrap().push(line);
    }
}

impl DiscoveryEngine for StubEngine {
    fn init(&self) -> EngineResult<()> {
        self.record("init".to_string());
        Ok(())
    }

    fn shutdown(&self) -> EngineResult<()> {
        self.record("shutdown".to_string());
        Ok(())
    }

    fn is_running(&self) -> bool {
        true
    }

    fn set_hostname(&self, hostname: &str) -> EngineResult<()> {
        self.record(format!("set_hostname {hostname}"));
        *self.hostname.lock().unwrap() = hostname.to_string();
        Ok(())
    }

    fn set_instance_name(&self, instance: &str) -> EngineResult<()> {
        self.record(format!("set_instance_name {instance}"));
        Ok(())
    }

    fn add_service(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
        port: u16,
        txt: TxtRecordSet,
    ) -> EngineResult<()> {
        self.record(format!(
            "add_service {} {service} {proto} {port}",
            instance.unwrap_or("-")
        ));
        self.services.lock().unwrap().push(StubService {
            instance: instance.unwrap_or("test-host").to_string(),
            service: service.to_string(),
            proto: proto.to_string(),
            host: host.map(str::to_owned),
            port,
            txt,
        });
        Ok(())
    }

    fn remove_service(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        host: Option<&str>,
    ) -> EngineResult<()> {
        self.record(format!("remove_service {service} {proto}"));
        let mut services = self.services.lock().unwrap();
        let before = services.len();
        services.retain(|s| {
            !(s.service == service
                && s.proto == proto
                && s.host.as_deref() == host
                && instance.is_none_or(|i| s.instance == i))
        });
        if services.len() == before {
            return Err(EngineError::InvalidArgument(format!(
                "no advertised service matches {service}.{proto}"
            )));
        }
        Ok(())
    }

    fn remove_all_services(&self) -> EngineResult<()> {
        self.record("remove_all_services".to_string());
        self.services.lock().unwrap().clear();
        Ok(())
    }

    fn set_service_instance_name(
        &self,
        _old_instance: Option<&str>,
        service: &str,
        proto: &str,
        _host: Option<&str>,
        instance: &str,
    ) -> EngineResult<()> {
        self.record(format!("set_service_instance_name {service} {proto} {instance}"));
        Ok(())
    }

    fn set_service_port(
        &self,
        _instance: Option<&str>,
        service: &str,
        proto: &str,
        _host: Option<&str>,
        port: u16,
    ) -> EngineResult<()> {
        self.record(format!("set_service_port {service} {proto} {port}"));
        Ok(())
    }

    fn replace_service_txt(
        &self,
        _instance: Option<&str>,
        service: &str,
        proto: &str,
        _host: Option<&str>,
        txt: TxtRecordSet,
    ) -> EngineResult<()> {
        self.record(format!("replace_service_txt {service} {proto} [{}]", txt.len()));
        Ok(())
    }

    fn set_service_txt_item(
        &self,
        _instance: Option<&str>,
        service: &str,
        proto: &str,
        _host: Option<&str>,
        key: &str,
        value: &str,
    ) -> EngineResult<()> {
        self.record(format!("set_service_txt_item {service} {proto} {key}={value}"));
        Ok(())
    }

    fn remove_service_txt_item(
        &self,
        _instance: Option<&str>,
        service: &str,
        proto: &str,
        _host: Option<&str>,
        key: &str,
    ) -> EngineResult<()> {
        self.record(format!("remove_service_txt_item {service} {proto} {key}"));
        Ok(())
    }

    fn add_service_subtype(
        &self,
        _instance: Option<&str>,
        service: &str,
        proto: &str,
        _host: Option<&str>,
        subtype: &str,
    ) -> EngineResult<()> {
        self.record(format!("add_service_subtype {service} {proto} {subtype}"));
        Ok(())
    }

    fn query_a(&self, hostname: &str, timeout_ms: u64) -> EngineResult<Ipv4Addr> {
        self.record(format!("query_a {hostname} {timeout_ms}"));
        self.a_answer.lock().unwrap().ok_or(EngineError::NotFound)
    }

    fn query_aaaa(&self, hostname: &str, timeout_ms: u64) -> EngineResult<Ipv6Addr> {
        self.record(format!("query_aaaa {hostname} {timeout_ms}"));
        Err(EngineError::NotFound)
    }

    fn query(
        &self,
        name: Option<&str>,
        service: Option<&str>,
        proto: Option<&str>,
        kind: RecordKind,
        timeout_ms: u64,
        max_results: usize,
    ) -> EngineResult<QueryResult> {
        self.record(format!(
            "query {} {} {} {kind:?} {timeout_ms} {max_results}",
            name.unwrap_or("-"),
            service.unwrap_or("-"),
            proto.unwrap_or("-"),
        ));
        Err(EngineError::NotFound)
    }

    fn lookup_local_service(
        &self,
        instance: Option<&str>,
        service: &str,
        proto: &str,
        max_results: usize,
        delegated: bool,
    ) -> EngineResult<QueryResult> {
        self.record(format!("lookup_local_service {service} {proto} {delegated}"));
        let hostname = self.hostname.lock().unwrap().clone();
        let entries: Vec<ResultEntry> = self
            .services
            .lock()
            .unwrap()
            .iter()
            .filter(|s| {
                s.service == service
                    && s.proto == proto
                    && s.host.is_some() == delegated
                    && instance.is_none_or(|i| s.instance == i)
            })
            .take(max_results)
            .map(|s| ResultEntry {
                instance: Some(s.instance.clone()),
                hostname: Some(s.host.clone().unwrap_or_else(|| hostname.clone())),
                port: Some(s.port),
                txt: s.txt.clone(),
                ..Default::default()
            })
            .collect();

        if entries.is_empty() {
            return Err(EngineError::NotFound);
        }
        Ok(QueryResult::new(entries))
    }

    fn delegate_hostname(&self, hostname: &str, address: IpAddr) -> EngineResult<()> {
        self.record(format!("delegate_hostname {hostname} {address}"));
        Ok(())
    }

    fn undelegate_hostname(&self, hostname: &str) -> EngineResult<()> {
        self.record(format!("undelegate_hostname {hostname}"));
        Ok(())
    }

    fn start_browse(
        &self,
        service: &str,
        proto: &str,
        _callback: Arc<BrowseCallback>,
    ) -> EngineResult<()> {
        self.record(format!("start_browse {service} {proto}"));
        Ok(())
    }

    fn stop_browse(&self, service: &str, proto: &str) -> EngineResult<()> {
        self.record(format!("stop_browse {service} {proto}"));
        Ok(())
    }
}
