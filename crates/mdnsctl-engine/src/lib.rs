//! Discovery-engine boundary for the mDNS control console.
//!
//! This crate defines the seam between the console and the mDNS protocol
//! engine:
//!
//! - [`DiscoveryEngine`]: the operation set the console consumes:
//!   lifecycle, service advertisement and mutation, single-shot queries,
//!   local lookup, delegated hosts and standing browse sessions.
//! - [`MdnsEngine`]: the production implementation backed by the
//!   `mdns-sd` service daemon.
//! - Result and record types ([`QueryResult`], [`ResultEntry`],
//!   [`TxtEntry`]) shared with the console's codec and formatter.
//!
//! The console never touches the wire: record storage, encoding, timers
//! and multicast I/O all live behind the trait.

pub mod daemon;
pub mod engine;
pub mod error;
pub mod types;

pub use daemon::MdnsEngine;
pub use engine::{BrowseCallback, DiscoveryEngine};
pub use error::{EngineError, Result};
pub use types::{
    InterfaceInfo, IpProtocol, QueryResult, RecordKind, ResultEntry, ServiceKey, TxtEntry,
    TxtRecordSet,
};
