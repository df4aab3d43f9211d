//! Browse session commands.

use std::sync::Arc;

use crate::args::ArgSpec;
use crate::browse::BrowseManager;
use crate::registry::{CommandRegistry, CommandSpec, RegistryResult};

fn browse_specs() -> Vec<ArgSpec> {
    vec![
        ArgSpec::positional("service", "MDNS Service"),
        ArgSpec::positional("proto", "IP Protocol"),
    ]
}

pub fn register(registry: &mut CommandRegistry, browser: &Arc<BrowseManager>) -> RegistryResult {
    let sessions = Arc::clone(browser);
    registry.register(CommandSpec::new(
        "mdns_browse",
        "Start browsing",
        browse_specs(),
        move |args| {
            sessions.start(args.str("service"), args.str("proto"))?;
            Ok(())
        },
    ))?;

    let sessions = Arc::clone(browser);
    registry.register(CommandSpec::new(
        "mdns_browse_del",
        "Stop browsing",
        browse_specs(),
        move |args| {
            sessions.stop(args.str("service"), args.str("proto"))?;
            Ok(())
        },
    ))?;

    Ok(())
}
