//! Command framework for the mDNS control console.
//!
//! This crate is the console's core: a registry of named commands with
//! data-described, validated argument schemas, a TXT-record textual
//! codec with all-or-nothing failure semantics, a deterministic result
//! formatter, synchronous query orchestration and a browse-session
//! manager bridging asynchronous engine notifications back to console
//! output.
//!
//! The dispatch loop itself lives in the `mdnsctl` binary; everything
//! here is runnable against any [`mdnsctl_engine::DiscoveryEngine`]
//! implementation, which is how the test suite drives the full command
//! surface without touching the network.

pub mod args;
pub mod browse;
pub mod commands;
pub mod error;
pub mod format;
pub mod registry;
pub mod txt;

pub use args::{ArgKind, ArgSpec, ArgValue, ParsedArgs};
pub use browse::BrowseManager;
pub use error::{
    BrowseError, CodecError, CommandError, RegistryError, ValidationError, ValidationFailure,
};
pub use format::format_results;
pub use registry::{CommandRegistry, CommandResult, CommandSpec, Handler, RegistryResult};
