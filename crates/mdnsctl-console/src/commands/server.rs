//! Engine lifecycle and identity commands.

use std::sync::Arc;

use mdnsctl_engine::{DiscoveryEngine, EngineError};

use crate::args::ArgSpec;
use crate::browse::BrowseManager;
use crate::registry::{CommandRegistry, CommandSpec, RegistryResult};

pub fn register(
    registry: &mut CommandRegistry,
    engine: &Arc<dyn DiscoveryEngine>,
    browser: &Arc<BrowseManager>,
) -> RegistryResult {
    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_init",
        "Start MDNS Server",
        vec![
            ArgSpec::opt_str(
                "hostname",
                'h',
                "hostname",
                "Hostname that the server will advertise",
            ),
            ArgSpec::opt_str(
                "instance",
                'i',
                "instance",
                "Default instance name for services",
            ),
        ],
        move |args| {
            eng.init()?;
            if let Some(hostname) = args.opt_str("hostname") {
                eng.set_hostname(hostname)?;
                println!("MDNS: Hostname: {}", hostname);
            }
            if let Some(instance) = args.opt_str("instance") {
                eng.set_instance_name(instance)?;
                println!("MDNS: Instance: {}", instance);
            }
            Ok(())
        },
    ))?;

    let eng = Arc::clone(engine);
    let sessions = Arc::clone(browser);
    registry.register(CommandSpec::new(
        "mdns_free",
        "Stop MDNS Server",
        Vec::new(),
        move |_| {
            // Browse sessions go first so the engine cannot notify a
            // console that is tearing down; stopping an engine that was
            // never started is a no-op, like the original console.
            sessions.stop_all();
            match eng.shutdown() {
                Ok(()) | Err(EngineError::NotRunning) => Ok(()),
                Err(err) => Err(err.into()),
            }
        },
    ))?;

    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_set_hostname",
        "Set MDNS Server hostname",
        vec![ArgSpec::positional(
            "hostname",
            "Hostname that the server will advertise",
        )],
        move |args| {
            eng.set_hostname(args.str("hostname"))?;
            Ok(())
        },
    ))?;

    let eng = Arc::clone(engine);
    registry.register(CommandSpec::new(
        "mdns_set_instance",
        "Set MDNS Server Instance Name",
        vec![ArgSpec::positional(
            "instance",
            "Default instance name for services",
        )],
        move |args| {
            eng.set_instance_name(args.str("instance"))?;
            Ok(())
        },
    ))?;

    Ok(())
}
