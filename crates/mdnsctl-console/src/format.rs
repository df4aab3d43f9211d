//! Deterministic rendering of discovery results.
//!
//! One block per result entry, in engine order. Absent fields produce no
//! line. A pure function over a borrowed result, so browse callbacks can
//! format concurrently with the dispatch loop.

use std::fmt::Write;
use std::net::IpAddr;

use mdnsctl_engine::QueryResult;

/// Renders a result set into the console's line-oriented text form:
///
/// ```text
/// 1: Interface: en0, Type: V4, TTL: 120
///   PTR : printer
///   SRV : host.local:80
///   TXT : [2] a=1; b=2;
///   A   : 192.168.1.2
/// ```
///
/// Sequence numbers are 1-based and only count entries that carry an
/// interface identity, matching the numbering operators see from the
/// discovery engine's own tooling.
pub fn format_results(result: &QueryResult) -> String {
    let mut out = String::new();
    let mut seq = 1;

    for entry in result.entries() {
        if let Some(iface) = &entry.interface {
            let _ = writeln!(
                out,
                "{}: Interface: {}, Type: {}, TTL: {}",
                seq, iface.ifkey, iface.protocol, iface.ttl
            );
            seq += 1;
        }
        if let Some(instance) = &entry.instance {
            let _ = writeln!(out, "  PTR : {}", instance);
        }
        if let (Some(hostname), Some(port)) = (&entry.hostname, entry.port) {
            let _ = writeln!(out, "  SRV : {}.local:{}", hostname, port);
        }
        if !entry.txt.is_empty() {
            let _ = write!(out, "  TXT : [{}] ", entry.txt.len());
            for item in &entry.txt {
                let _ = write!(out, "{}={}; ", item.key, item.value);
            }
            out.push('\n');
        }
        for address in &entry.addresses {
            match address {
                IpAddr::V4(v4) => {
                    let _ = writeln!(out, "  A   : {}", v4);
                }
                IpAddr::V6(v6) => {
                    let _ = writeln!(out, "  AAAA: {}", v6);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdnsctl_engine::{InterfaceInfo, IpProtocol, ResultEntry, TxtEntry};
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_full_entry_block() {
        let entry = ResultEntry {
            interface: Some(InterfaceInfo {
                ifkey: "en0".to_string(),
                protocol: IpProtocol::V4,
                ttl: 120,
            }),
            instance: Some("printer".to_string()),
            hostname: Some("host".to_string()),
            port: Some(80),
            txt: vec![TxtEntry::new("a", "1"), TxtEntry::new("b", "2")],
            addresses: vec![
                IpAddr::V4(Ipv4Addr::new(192, 168, 1, 2)),
                IpAddr::V6(Ipv6Addr::LOCALHOST),
            ],
        };

        let text = format_results(&QueryResult::new(vec![entry]));
        assert_eq!(
            text,
            "1: Interface: en0, Type: V4, TTL: 120\n\
             \x20 PTR : printer\n\
             \x20 SRV : host.local:80\n\
             \x20 TXT : [2] a=1; b=2; \n\
             \x20 A   : 192.168.1.2\n\
             \x20 AAAA: ::1\n"
        );
    }

    #[test]
    fn test_absent_fields_render_no_lines() {
        let text = format_results(&QueryResult::new(vec![ResultEntry::default()]));
        assert!(text.is_empty());
    }

    #[test]
    fn test_srv_needs_host_and_port() {
        let entry = ResultEntry {
            hostname: Some("host".to_string()),
            ..Default::default()
        };
        let text = format_results(&QueryResult::new(vec![entry]));
        assert!(text.is_empty());
    }

    #[test]
    fn test_sequence_counts_only_interface_entries() {
        let headed = |ifkey: &str| ResultEntry {
            interface: Some(InterfaceInfo {
                ifkey: ifkey.to_string(),
                protocol: IpProtocol::V6,
                ttl: 60,
            }),
            ..Default::default()
        };
        let bare = ResultEntry {
            instance: Some("printer".to_string()),
            ..Default::default()
        };

        let text = format_results(&QueryResult::new(vec![headed("en0"), bare, headed("en1")]));
        assert!(text.contains("1: Interface: en0, Type: V6, TTL: 60"));
        assert!(text.contains("2: Interface: en1, Type: V6, TTL: 60"));
    }

    #[test]
    fn test_txt_order_preserved() {
        let entry = ResultEntry {
            txt: vec![TxtEntry::new("z", "26"), TxtEntry::new("a", "1")],
            ..Default::default()
        };
        let text = format_results(&QueryResult::new(vec![entry]));
        assert_eq!(text, "  TXT : [2] z=26; a=1; \n");
    }
}
