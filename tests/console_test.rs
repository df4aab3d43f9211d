//! End-to-end console tests against a recording stub engine.
//!
//! Each test builds the full registry the way the binary does, drives it
//! through `dispatch`, and asserts on exit codes, the stub's call log
//! and the formatter's rendering.

mod common;

use std::sync::Arc;

use common::StubEngine;
use mdnsctl_console::{commands, format_results, BrowseManager, CommandRegistry};
use mdnsctl_engine::DiscoveryEngine;

struct Console {
    engine: Arc<StubEngine>,
    registry: CommandRegistry,
}

fn console() -> Console {
    let engine = StubEngine::new();
    let dyn_engine: Arc<dyn DiscoveryEngine> = engine.clone();
    let browser = Arc::new(BrowseManager::new(Arc::clone(&dyn_engine)));

    let mut registry = CommandRegistry::new();
    commands::register_all(&mut registry, &dyn_engine, &browser)
        .expect("command registration must not collide");
    Console { engine, registry }
}

fn toks(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_add_then_lookup_renders_srv_line() {
    let console = console();
    let status = console.registry.dispatch(&toks(&[
        "mdns_service_add",
        "_http",
        "_tcp",
        "80",
        "-i",
        "printer",
    ]));
    assert_eq!(status, 0);
    assert_eq!(
        console.engine.calls(),
        vec!["add_service printer _http _tcp 80".to_string()]
    );

    let result = console
        .engine
        .lookup_local_service(None, "_http", "_tcp", 10, false)
        .expect("self-hosted lookup finds the advertised service");
    assert_eq!(result.len(), 1);

    let text = format_results(&result);
    assert!(text.contains("  PTR : printer\n"), "rendered: {text:?}");
    assert!(text.contains("  SRV : test-host.local:80\n"), "rendered: {text:?}");
}

#[test]
fn test_lookup_command_succeeds_on_empty_result() {
    let console = console();
    // not-found is a successful query, not a failure
    let status = console
        .registry
        .dispatch(&toks(&["mdns_service_lookup", "_http", "_tcp"]));
    assert_eq!(status, 0);
}

#[test]
fn test_validation_failure_never_reaches_engine() {
    let console = console();
    let status = console
        .registry
        .dispatch(&toks(&["mdns_service_add", "_http"]));
    assert_eq!(status, 1);
    assert!(console.engine.calls().is_empty());
}

#[test]
fn test_unknown_command() {
    let console = console();
    assert_eq!(console.registry.dispatch(&toks(&["mdns_nonsense"])), 1);
    assert!(console.engine.calls().is_empty());
}

#[test]
fn test_malformed_txt_item_aborts_add() {
    let console = console();
    let status = console.registry.dispatch(&toks(&[
        "mdns_service_add",
        "_http",
        "_tcp",
        "80",
        "a=1",
        "bad",
    ]));
    assert_eq!(status, 1);
    // the decode failed as a whole: nothing was advertised
    assert!(console.engine.calls().is_empty());
    assert!(console.engine.services.lock().unwrap().is_empty());
}

#[test]
fn test_single_host_timeout_default() {
    let console = console();
    let status = console
        .registry
        .dispatch(&toks(&["mdns_query_a", "host1", "-t", "-1"]));
    assert_eq!(status, 0); // not found is still a successful query
    assert_eq!(console.engine.calls(), vec!["query_a host1 1000".to_string()]);
}

#[test]
fn test_service_class_timeout_default() {
    let console = console();
    let status = console
        .registry
        .dispatch(&toks(&["mdns_query_txt", "printer", "_http", "_tcp", "-t", "0"]));
    assert_eq!(status, 0);
    assert_eq!(
        console.engine.calls(),
        vec!["query printer _http _tcp Txt 5000 1".to_string()]
    );
}

#[test]
fn test_max_results_clamping_through_dispatch() {
    let console = console();
    for (given, resolved) in [("0", 255), ("-5", 255), ("999", 255), ("10", 10)] {
        console.engine.log.lock().unwrap().clear();
        let status = console
            .registry
            .dispatch(&toks(&["mdns_query_ptr", "_http", "_tcp", "-m", given]));
        assert_eq!(status, 0);
        assert_eq!(
            console.engine.calls(),
            vec![format!("query - _http _tcp Ptr 5000 {resolved}")]
        );
    }
}

#[test]
fn test_browse_lifecycle_through_dispatch() {
    let console = console();

    assert_eq!(
        console.registry.dispatch(&toks(&["mdns_browse", "_http", "_tcp"])),
        0
    );
    // duplicate start is rejected without touching the engine again
    assert_eq!(
        console.registry.dispatch(&toks(&["mdns_browse", "_http", "_tcp"])),
        1
    );
    assert_eq!(
        console.engine.calls(),
        vec!["start_browse _http _tcp".to_string()]
    );

    assert_eq!(
        console
            .registry
            .dispatch(&toks(&["mdns_browse_del", "_http", "_tcp"])),
        0
    );
    // stopping a never-started key fails
    assert_eq!(
        console
            .registry
            .dispatch(&toks(&["mdns_browse_del", "_smb", "_tcp"])),
        1
    );
    assert_eq!(
        console.engine.calls(),
        vec![
            "start_browse _http _tcp".to_string(),
            "stop_browse _http _tcp".to_string(),
        ]
    );
}

#[test]
fn test_free_stops_active_browse_sessions() {
    let console = console();
    console
        .registry
        .dispatch(&toks(&["mdns_browse", "_http", "_tcp"]));
    console
        .registry
        .dispatch(&toks(&["mdns_browse", "_smb", "_tcp"]));

    assert_eq!(console.registry.dispatch(&toks(&["mdns_free"])), 0);

    let calls = console.engine.calls();
    assert!(calls.contains(&"stop_browse _http _tcp".to_string()));
    assert!(calls.contains(&"stop_browse _smb _tcp".to_string()));
    assert_eq!(calls.last(), Some(&"shutdown".to_string()));
}

#[test]
fn test_init_with_identity_flags() {
    let console = console();
    let status = console.registry.dispatch(&toks(&[
        "mdns_init",
        "-h",
        "lab-host",
        "-i",
        "Lab Device",
    ]));
    assert_eq!(status, 0);
    assert_eq!(
        console.engine.calls(),
        vec![
            "init".to_string(),
            "set_hostname lab-host".to_string(),
            "set_instance_name Lab Device".to_string(),
        ]
    );
}

#[test]
fn test_delegated_host_commands() {
    let console = console();
    assert_eq!(
        console.registry.dispatch(&toks(&[
            "mdns_delegate_host",
            "sensor-7",
            "192.168.1.44"
        ])),
        0
    );
    // an unparsable address fails before the engine is involved
    assert_eq!(
        console
            .registry
            .dispatch(&toks(&["mdns_delegate_host", "sensor-8", "not-an-ip"])),
        1
    );
    assert_eq!(
        console.engine.calls(),
        vec!["delegate_hostname sensor-7 192.168.1.44".to_string()]
    );
}
