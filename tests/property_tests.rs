//! Property tests for the verb grammar.
//!
//! Runs on host (x86_64) only — proptest is not available for ESP32
//! targets.

#![cfg(not(target_os = "espidf"))]

use gardlink::app::verbs::{SystemVerb, Verb};
use gardlink::devices::DeviceKind;
use proptest::prelude::*;

fn any_kind() -> impl Strategy<Value = DeviceKind> {
    prop_oneof![
        Just(DeviceKind::Mosfet),
        Just(DeviceKind::Switch),
        Just(DeviceKind::SensorI2c),
        Just(DeviceKind::Inert),
    ]
}

proptest! {
    /// Arbitrary payloads never panic the parser, for any device type.
    #[test]
    fn link_verb_parse_total(kind in any_kind(), raw in ".*") {
        let _ = Verb::parse(kind, &raw);
    }

    /// Arbitrary payloads never panic the system-verb parser.
    #[test]
    fn system_verb_parse_total(raw in ".*") {
        let _ = SystemVerb::parse(&raw);
    }

    /// Every well-formed numeric operand round-trips through the grammar.
    #[test]
    fn on_operand_roundtrip(n in any::<i32>()) {
        let parsed = Verb::parse(DeviceKind::Mosfet, &format!("on:{n}")).unwrap();
        prop_assert_eq!(parsed, Verb::On { timeout_secs: Some(n) });
    }

    #[test]
    fn timeout_set_operand_roundtrip(n in any::<i32>()) {
        let parsed = Verb::parse(DeviceKind::Switch, &format!("timeout_set:{n}")).unwrap();
        prop_assert_eq!(parsed, Verb::TimeoutSet { secs: n });
    }

    #[test]
    fn set_kat_operand_roundtrip(n in any::<u32>()) {
        let parsed = SystemVerb::parse(&format!("set_kat:{n}")).unwrap();
        prop_assert_eq!(parsed, SystemVerb::SetKat { secs: n });
    }

    /// The empty payload is always an autonomous poll and `?` always a
    /// query, whatever the device type.
    #[test]
    fn poll_and_query_are_universal(kind in any_kind()) {
        prop_assert_eq!(Verb::parse(kind, "").unwrap(), Verb::Poll);
        prop_assert_eq!(Verb::parse(kind, "?").unwrap(), Verb::Query);
    }
}
