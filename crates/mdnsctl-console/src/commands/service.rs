//! Service advertisement and mutation commands.

use std::sync::Arc;

use mdnsctl_engine::{DiscoveryEngine, EngineError};

use crate::args::{ArgSpec, ParsedArgs};
use crate::error::CommandError;
use crate::format::format_results;
use crate::registry::{CommandRegistry, CommandSpec, RegistryResult};
use crate::txt;

/// Result bound for local service lookups, matching the engine's
/// advertised-service capacity.
const MAX_LOOKUP_RESULTS: usize = 10;

/// TXT items accepted on a single command line.
const MAX_TXT_ITEMS: usize = 30;

fn instance_opt(help: &'static str) -> ArgSpec {
    ArgSpec::opt_str("instance", 'i', "instance", help)
}

fn host_opt() -> ArgSpec {
    ArgSpec::opt_str("host", 'h', "host", "Service for this (delegated) host")
}

fn port_from(args: &ParsedArgs) -> Result<u16, CommandError> {
    let port = args.int("port");
    if port <= 0 || port > u16::MAX as i64 {
        return Err(CommandError::new("Bad arguments!"));
    }
    Ok(port as u16)
}

pub fn register(
    registry: &mut CommandRegistry,
    engine: &Arc<dyn DiscoveryEngine>,
) -> RegistryResult {
    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_service_add",
        "Add service to MDNS",
        vec![
            ArgSpec::positional("service", "MDNS Service"),
            ArgSpec::positional("proto", "IP Protocol"),
            ArgSpec::positional_int("port", "Service Port"),
            instance_opt("Instance name"),
            host_opt(),
            ArgSpec::rest("item", MAX_TXT_ITEMS, "TXT Items (name=value)"),
        ],
        move |args| {
            let port = port_from(args)?;
            let instance = args.opt_str("instance");
            if let Some(instance) = instance {
                println!("MDNS: Service Instance: {}", instance);
            }
            let host = args.opt_str("host");
            if let Some(host) = host {
                println!("MDNS: Service for delegated host: {}", host);
            }
            let txt_set = txt::decode(args.list("item"))?;
            eng.add_service(
                instance,
                args.str("service"),
                args.str("proto"),
                host,
                port,
                txt_set,
            )?;
            Ok(())
        },
    ))?;

    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_service_remove",
        "Remove service from MDNS",
        vec![
            ArgSpec::positional("service", "MDNS Service"),
            ArgSpec::positional("proto", "IP Protocol"),
            host_opt(),
            instance_opt("Instance name"),
        ],
        move |args| {
            eng.remove_service(
                args.opt_str("instance"),
                args.str("service"),
                args.str("proto"),
                args.opt_str("host"),
            )?;
            Ok(())
        },
    ))?;

    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_service_instance_set",
        "Set MDNS Service Instance Name",
        vec![
            ArgSpec::positional("service", "MDNS Service"),
            ArgSpec::positional("proto", "IP Protocol"),
            ArgSpec::positional("instance", "Instance name"),
            host_opt(),
            ArgSpec::opt_str(
                "old_instance",
                'i',
                "old_instance",
                "Instance name before update",
            ),
        ],
        move |args| {
            eng.set_service_instance_name(
                args.opt_str("old_instance"),
                args.str("service"),
                args.str("proto"),
                args.opt_str("host"),
                args.str("instance"),
            )
            .map_err(|e| CommandError::new(format!("set_service_instance_name failed: {}", e)))
        },
    ))?;

    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_service_port_set",
        "Set MDNS Service port",
        vec![
            ArgSpec::positional("service", "MDNS Service"),
            ArgSpec::positional("proto", "IP Protocol"),
            ArgSpec::positional_int("port", "Service Port"),
            host_opt(),
            instance_opt("Instance name"),
        ],
        move |args| {
            let port = port_from(args)?;
            eng.set_service_port(
                args.opt_str("instance"),
                args.str("service"),
                args.str("proto"),
                args.opt_str("host"),
                port,
            )
            .map_err(|e| CommandError::new(format!("set_service_port failed: {}", e)))
        },
    ))?;

    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_service_txt_replace",
        "Replace MDNS service TXT items",
        vec![
            ArgSpec::positional("service", "MDNS Service"),
            ArgSpec::positional("proto", "IP Protocol"),
            instance_opt("Instance name"),
            host_opt(),
            ArgSpec::rest("item", MAX_TXT_ITEMS, "TXT Items (name=value)"),
        ],
        move |args| {
            let txt_set = txt::decode(args.list("item"))?;
            eng.replace_service_txt(
                args.opt_str("instance"),
                args.str("service"),
                args.str("proto"),
                args.opt_str("host"),
                txt_set,
            )?;
            Ok(())
        },
    ))?;

    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_service_txt_set",
        "Add/Set MDNS service TXT item",
        vec![
            ArgSpec::positional("service", "MDNS Service"),
            ArgSpec::positional("proto", "IP Protocol"),
            ArgSpec::positional("var", "Item Name"),
            ArgSpec::positional("value", "Item Value"),
            instance_opt("Instance name"),
            host_opt(),
        ],
        move |args| {
            eng.set_service_txt_item(
                args.opt_str("instance"),
                args.str("service"),
                args.str("proto"),
                args.opt_str("host"),
                args.str("var"),
                args.str("value"),
            )?;
            Ok(())
        },
    ))?;

    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_service_txt_remove",
        "Remove MDNS service TXT item",
        vec![
            ArgSpec::positional("service", "MDNS Service"),
            ArgSpec::positional("proto", "IP Protocol"),
            ArgSpec::positional("var", "Item Name"),
            instance_opt("Instance name"),
            host_opt(),
        ],
        move |args| {
            eng.remove_service_txt_item(
                args.opt_str("instance"),
                args.str("service"),
                args.str("proto"),
                args.opt_str("host"),
                args.str("var"),
            )?;
            Ok(())
        },
    ))?;

    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_service_remove_all",
        "Remove all MDNS services",
        Vec::new(),
        move |_| {
            eng.remove_all_services()?;
            Ok(())
        },
    ))?;

    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_service_subtype",
        "Adds subtype for service",
        vec![
            ArgSpec::positional("service", "MDNS Service"),
            ArgSpec::positional("proto", "IP Protocol"),
            ArgSpec::positional("sub", "Subtype"),
            instance_opt("Instance name"),
            host_opt(),
        ],
        move |args| {
            eng.add_service_subtype(
                args.opt_str("instance"),
                args.str("service"),
                args.str("proto"),
                args.opt_str("host"),
                args.str("sub"),
            )?;
            Ok(())
        },
    ))?;

    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_service_lookup",
        "Lookup registered service",
        vec![
            ArgSpec::positional("service", "MDNS Service"),
            ArgSpec::positional("proto", "IP Protocol"),
            instance_opt("Instance name"),
            ArgSpec::flag("delegated", 'd', "delegated", "Lookup delegated services"),
        ],
        move |args| {
            match eng.lookup_local_service(
                args.opt_str("instance"),
                args.str("service"),
                args.str("proto"),
                MAX_LOOKUP_RESULTS,
                args.flag("delegated"),
            ) {
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
                Err(_) => Err(CommandError::new("Service lookup failed")),
            }
        },
    ))?;

    Ok(())
}
