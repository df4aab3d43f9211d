//! Delegated-hostname commands.

use std::net::IpAddr;
use std::sync::Arc;

use mdnsctl_engine::DiscoveryEngine;

use crate::args::ArgSpec;
use crate::error::CommandError;
use crate::registry::{CommandRegistry, CommandSpec, RegistryResult};

pub fn register(
    registry: &mut CommandRegistry,
    engine: &Arc<dyn DiscoveryEngine>,
) -> RegistryResult {
    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_delegate_host",
        "Add delegated hostname",
        vec![
            ArgSpec::positional("hostname", "Delegated hostname"),
            ArgSpec::positional("address", "Delegated hosts address"),
        ],
        move |args| {
            let address: IpAddr = args
                .str("address")
                .parse()
                .map_err(|_| CommandError::new(format!("invalid address '{}'", args.str("address"))))?;
            eng.delegate_hostname(args.str("hostname"), address)?;
            Ok(())
        },
    ))?;

    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_undelegate_host",
        "Remove delegated hostname",
        vec![ArgSpec::positional("hostname", "Delegated hostname")],
        move |args| {
            eng.undelegate_hostname(args.str("hostname"))?;
            Ok(())
        },
    ))?;

    Ok(())
}
