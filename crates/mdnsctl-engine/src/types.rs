//! Shared types for discovery results and service records

use std::fmt;
use std::net::IpAddr;

/// A single `key=value` attribute of a TXT record.
///
/// Keys are non-empty and contain no `=`; values may be empty. Both
/// invariants are enforced by the console's TXT codec before an entry
/// reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxtEntry {
    pub key: String,
    pub value: String,
}

impl TxtEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An ordered set of TXT entries.
///
/// Order is preserved from the source because TXT record order can be
/// observed by discovery listeners.
pub type TxtRecordSet = Vec<TxtEntry>;

/// IP protocol of a result entry or address record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    V4,
    V6,
}

impl IpProtocol {
    /// Label used by the result formatter.
    pub fn label(&self) -> &'static str {
        match self {
            IpProtocol::V4 => "V4",
            IpProtocol::V6 => "V6",
        }
    }
}

impl fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Record kind requested by a generic query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    A,
    Aaaa,
    Ptr,
    Srv,
    Txt,
    Any,
}

/// Identity of the network interface a result arrived on, with the
/// protocol and TTL of the answering record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    /// Interface key, e.g. `en0`.
    pub ifkey: String,
    pub protocol: IpProtocol,
    pub ttl: u32,
}

/// One entry of a discovery result.
///
/// Every field except the address list is optional; which fields are
/// populated depends on the record kinds the query resolved.
#[derive(Debug, Default)]
pub struct ResultEntry {
    /// Interface the answer arrived on, when the engine knows it.
    pub interface: Option<InterfaceInfo>,
    /// Service instance name (PTR).
    pub instance: Option<String>,
    /// Target hostname and port (SRV). The hostname carries no `.local`
    /// suffix; the formatter appends it.
    pub hostname: Option<String>,
    pub port: Option<u16>,
    /// TXT attributes in record order.
    pub txt: TxtRecordSet,
    /// Associated A/AAAA addresses in record order.
    pub addresses: Vec<IpAddr>,
}

impl ResultEntry {
    /// True when no record populated any field, i.e. the formatter would
    /// render nothing for this entry.
    pub fn is_empty(&self) -> bool {
        self.interface.is_none()
            && self.instance.is_none()
            && self.hostname.is_none()
            && self.txt.is_empty()
            && self.addresses.is_empty()
    }
}

/// An ordered discovery result set, owned by the caller.
///
/// Deliberately neither `Clone` nor `Copy`: the engine hands each result
/// set out once and dropping it is the single release point, so no entry
/// can be retained or released twice.
#[derive(Debug, Default)]
pub struct QueryResult {
    entries: Vec<ResultEntry>,
}

impl QueryResult {
    pub fn new(entries: Vec<ResultEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Identity of an advertised service: instance name plus service type,
/// protocol and the (possibly delegated) host it is advertised for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    pub instance: String,
    pub service: String,
    pub proto: String,
    pub host: Option<String>,
}

impl ServiceKey {
    pub fn new(
        instance: impl Into<String>,
        service: impl Into<String>,
        proto: impl Into<String>,
        host: Option<&str>,
    ) -> Self {
        Self {
            instance: instance.into(),
            service: service.into(),
            proto: proto.into(),
            host: host.map(str::to_owned),
        }
    }

    /// `_service._proto.local.` type domain used on the wire.
    pub fn type_domain(&self) -> String {
        format!("{}.{}.local.", self.service, self.proto)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.instance, self.service, self.proto)
    }
}
