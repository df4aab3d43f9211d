//! Single-shot query commands and their defaulting policy.
//!
//! Raw validation knows nothing about timeouts or result bounds; the
//! domain convention lives here. Single-host queries default to 1000 ms,
//! service-class queries to 5000 ms, and the result bound is clamped to
//! [1, 255] with out-of-range input forgiven to the maximum rather than
//! rejected.

use std::sync::Arc;

use mdnsctl_engine::{DiscoveryEngine, EngineError, QueryResult, RecordKind};

use crate::args::{ArgSpec, ParsedArgs};
use crate::error::CommandError;
use crate::format::format_results;
use crate::registry::{CommandRegistry, CommandResult, CommandSpec, RegistryResult};

/// Default timeout for queries that resolve a single host.
pub const SINGLE_HOST_TIMEOUT_MS: u64 = 1000;

/// Default timeout for queries that sweep a service class.
pub const SERVICE_TIMEOUT_MS: u64 = 5000;

/// Upper bound on requested result counts.
pub const MAX_RESULTS: usize = 255;

/// Applies the per-command timeout convention: non-positive input means
/// "use the default".
pub fn effective_timeout(requested: i64, default_ms: u64) -> u64 {
    if requested <= 0 {
        default_ms
    } else {
        requested as u64
    }
}

/// Clamps a requested result count to [1, 255]. Non-positive and
/// out-of-range input silently maps to the maximum, keeping interactive
/// use forgiving.
pub fn clamp_max_results(requested: i64) -> usize {
    if requested <= 0 || requested > MAX_RESULTS as i64 {
        MAX_RESULTS
    } else {
        requested as usize
    }
}

/// Renders a query outcome: results are formatted and released, a
/// not-found outcome is a successful empty query, anything else fails
/// the command.
fn render_outcome(outcome: Result<QueryResult, EngineError>) -> CommandResult {
    match outcome {
        Ok(result) => {
            if result.is_empty() {
                println!("No results found!");
            } else {
                print!("{}", format_results(&result));
            }
            Ok(())
        }
        Err(EngineError::NotFound) => {
            println!("No results found!");
            Ok(())
        }
        Err(_) => Err(CommandError::new("Query Failed")),
    }
}

fn hostname_arg(args: &ParsedArgs) -> Result<&str, CommandError> {
    let hostname = args.str("hostname");
    if hostname.is_empty() {
        return Err(CommandError::new("Hostname not supplied"));
    }
    Ok(hostname)
}

fn host_specs() -> Vec<ArgSpec> {
    vec![
        ArgSpec::positional("hostname", "Hostname that is searched for"),
        ArgSpec::opt_int("timeout", 't', "timeout", "Timeout for this query"),
    ]
}

fn instance_specs() -> Vec<ArgSpec> {
    vec![
        ArgSpec::positional("instance", "Instance to search for"),
        ArgSpec::positional("service", "Service to search for (ex. _http, _smb, etc.)"),
        ArgSpec::positional("proto", "Protocol to search for (_tcp, _udp, etc.)"),
        ArgSpec::opt_int("timeout", 't', "timeout", "Timeout for this query"),
    ]
}

pub fn register(
    registry: &mut CommandRegistry,
    engine: &Arc<dyn DiscoveryEngine>,
) -> RegistryResult {
    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_query_a",
        "Query MDNS for IPv4",
        host_specs(),
        move |args| {
            let hostname = hostname_arg(args)?;
            let timeout = effective_timeout(args.int("timeout"), SINGLE_HOST_TIMEOUT_MS);
            println!("Query A: {}.local, Timeout: {}", hostname, timeout);
            match eng.query_a(hostname, timeout) {
                Ok(addr) => {
                    println!("{}", addr);
                    Ok(())
                }
                Err(EngineError::NotFound) => {
                    println!("Host was not found!");
                    Ok(())
                }
                Err(_) => Err(CommandError::new("Query Failed")),
            }
        },
    ))?;

    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_query_aaaa",
        "Query MDNS for IPv6",
        host_specs(),
        move |args| {
            let hostname = hostname_arg(args)?;
            let timeout = effective_timeout(args.int("timeout"), SINGLE_HOST_TIMEOUT_MS);
            println!("Query AAAA: {}.local, Timeout: {}", hostname, timeout);
            match eng.query_aaaa(hostname, timeout) {
                Ok(addr) => {
                    println!("{}", addr);
                    Ok(())
                }
                Err(EngineError::NotFound) => {
                    println!("Host was not found!");
                    Ok(())
                }
                Err(_) => Err(CommandError::new("Query Failed")),
            }
        },
    ))?;

    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_query_srv",
        "Query MDNS for Service SRV",
        instance_specs(),
        move |args| {
            let (instance, service, proto) =
                (args.str("instance"), args.str("service"), args.str("proto"));
            let timeout = effective_timeout(args.int("timeout"), SINGLE_HOST_TIMEOUT_MS);
            println!(
                "Query SRV: {}.{}.{}.local, Timeout: {}",
                instance, service, proto, timeout
            );
            render_outcome(eng.query(
                Some(instance),
                Some(service),
                Some(proto),
                RecordKind::Srv,
                timeout,
                1,
            ))
        },
    ))?;

    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_query_txt",
        "Query MDNS for Service TXT",
        instance_specs(),
        move |args| {
            let (instance, service, proto) =
                (args.str("instance"), args.str("service"), args.str("proto"));
            let timeout = effective_timeout(args.int("timeout"), SERVICE_TIMEOUT_MS);
            println!(
                "Query TXT: {}.{}.{}.local, Timeout: {}",
                instance, service, proto, timeout
            );
            render_outcome(eng.query(
                Some(instance),
                Some(service),
                Some(proto),
                RecordKind::Txt,
                timeout,
                1,
            ))
        },
    ))?;

    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_query_ptr",
        "Query MDNS for Service",
        vec![
            ArgSpec::positional("service", "Service to search for (ex. _http, _smb, etc.)"),
            ArgSpec::positional("proto", "Protocol to search for (_tcp, _udp, etc.)"),
            ArgSpec::opt_int("timeout", 't', "timeout", "Timeout for this query"),
            ArgSpec::opt_int("max_results", 'm', "max_results", "Maximum results returned"),
        ],
        move |args| {
            let (service, proto) = (args.str("service"), args.str("proto"));
            let timeout = effective_timeout(args.int("timeout"), SERVICE_TIMEOUT_MS);
            let max_results = clamp_max_results(args.int("max_results"));
            println!(
                "Query PTR: {}.{}.local, Timeout: {}, Max Results: {}",
                service, proto, timeout, max_results
            );
            render_outcome(eng.query(
                None,
                Some(service),
                Some(proto),
                RecordKind::Ptr,
                timeout,
                max_results,
            ))
        },
    ))?;

    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_query_ip",
        "Query MDNS for IP",
        vec![
            ArgSpec::positional("hostname", "Hostname that is searched for"),
            ArgSpec::opt_int("timeout", 't', "timeout", "Timeout for this query"),
            ArgSpec::opt_int("max_results", 'm', "max_results", "Maximum results returned"),
        ],
        move |args| {
            let hostname = hostname_arg(args)?;
            let timeout = effective_timeout(args.int("timeout"), SINGLE_HOST_TIMEOUT_MS);
            let max_results = clamp_max_results(args.int("max_results"));
            println!(
                "Query IP: {}.local, Timeout: {}, Max Results: {}",
                hostname, timeout, max_results
            );
            render_outcome(eng.query(
                Some(hostname),
                None,
                None,
                RecordKind::Any,
                timeout,
                max_results,
            ))
        },
    ))?;

    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_query_svc",
        "Query MDNS for Service TXT & SRV",
        vec![
            ArgSpec::positional("instance", "Instance to search for"),
            ArgSpec::positional("service", "Service to search for (ex. _http, _smb, etc.)"),
            ArgSpec::positional("proto", "Protocol to search for (_tcp, _udp, etc.)"),
            ArgSpec::opt_int("timeout", 't', "timeout", "Timeout for this query"),
            ArgSpec::opt_int("max_results", 'm', "max_results", "Maximum results returned"),
        ],
        move |args| {
            let (instance, service, proto) =
                (args.str("instance"), args.str("service"), args.str("proto"));
            let timeout = effective_timeout(args.int("timeout"), SERVICE_TIMEOUT_MS);
            let max_results = clamp_max_results(args.int("max_results"));
            println!(
                "Query SVC: {}.{}.{}.local, Timeout: {}, Max Results: {}",
                instance, service, proto, timeout, max_results
            );
            render_outcome(eng.query(
                Some(instance),
                Some(service),
                Some(proto),
                RecordKind::Any,
                timeout,
                max_results,
            ))
        },
    ))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_defaulting() {
        assert_eq!(effective_timeout(-1, SINGLE_HOST_TIMEOUT_MS), 1000);
        assert_eq!(effective_timeout(0, SERVICE_TIMEOUT_MS), 5000);
        assert_eq!(effective_timeout(250, SINGLE_HOST_TIMEOUT_MS), 250);
        assert_eq!(effective_timeout(250, SERVICE_TIMEOUT_MS), 250);
    }

    #[test]
    fn test_max_results_clamping() {
        assert_eq!(clamp_max_results(0), 255);
        assert_eq!(clamp_max_results(-5), 255);
        assert_eq!(clamp_max_results(999), 255);
        assert_eq!(clamp_max_results(10), 10);
        assert_eq!(clamp_max_results(255), 255);
        assert_eq!(clamp_max_results(1), 1);
    }
}
