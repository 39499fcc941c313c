//! Binary input: a float switch, door contact or similar digital sensor.
//!
//! Reported on every change of level and, optionally, unconditionally
//! every `report_timeout` seconds so the controlling side can tell a
//! quiet input from a dead one. The change clock (`changed_at`) and the
//! report clock (`last_report`) are separate: once the report timeout has
//! elapsed the input republishes once and rearms, instead of flooding
//! every tick.

use crate::app::TickMs;
use crate::app::ports::{TransportPort, publish_status};
use crate::drivers::hw_init::{self, HwInitError};

#[derive(Debug)]
pub struct Switch {
    pin: u8,
    value: bool,
    changed_at: TickMs,
    last_report: TickMs,
    report_timeout: i32,
}

impl Switch {
    pub fn init(pin: u8, report_timeout_secs: i32, now: TickMs) -> Result<Self, HwInitError> {
        hw_init::gpio_config_input(pin)?;
        Ok(Self {
            pin,
            value: hw_init::gpio_read(pin),
            changed_at: now,
            last_report: now,
            report_timeout: normalize(report_timeout_secs),
        })
    }

    /// Autonomous tick: sample the pin; publish on change or when the
    /// report timeout elapses.
    pub fn poll(&mut self, topic: &str, now: TickMs, transport: &mut dyn TransportPort) {
        let changed = self.observe(now);
        let due =
            self.report_timeout != -1 && now.secs_since(self.last_report) >= self.report_timeout as u32;
        if changed || due {
            self.report(topic, now, transport);
        }
    }

    /// `?` — sample and publish unconditionally.
    pub fn query(&mut self, topic: &str, now: TickMs, transport: &mut dyn TransportPort) {
        self.observe(now);
        self.report(topic, now, transport);
    }

    /// `timeout_get` — reply with the current report timeout.
    pub fn timeout_get(&self, topic: &str, transport: &mut dyn TransportPort) {
        publish_status(transport, topic, &format!("{}", self.report_timeout));
    }

    /// `timeout_set:<n>` — replace the report timeout and rearm the
    /// report clock. Any negative value disables autonomous reporting.
    pub fn timeout_set(
        &mut self,
        topic: &str,
        secs: i32,
        now: TickMs,
        transport: &mut dyn TransportPort,
    ) {
        self.report_timeout = normalize(secs);
        self.last_report = now;
        publish_status(transport, topic, &format!("{}", self.report_timeout));
    }

    /// Sample the pin; returns whether the level changed.
    fn observe(&mut self, now: TickMs) -> bool {
        let level = hw_init::gpio_read(self.pin);
        if level != self.value {
            self.value = level;
            self.changed_at = now;
            return true;
        }
        false
    }

    /// `<on|off> <seconds-since-last-change>`.
    fn report(&mut self, topic: &str, now: TickMs, transport: &mut dyn TransportPort) {
        let state = if self.value { "on" } else { "off" };
        let elapsed = now.secs_since(self.changed_at);
        publish_status(transport, topic, &format!("{state} {elapsed}"));
        self.last_report = now;
    }
}

fn normalize(secs: i32) -> i32 {
    if secs < 0 { -1 } else { secs }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use crate::app::ports::InboundMessage;
    use crate::error::TransportError;

    struct Sink(Vec<(String, String)>);

    impl TransportPort for Sink {
        fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
            self.0.push((topic.to_string(), payload.to_string()));
            Ok(())
        }
        fn try_recv(&mut self) -> Option<InboundMessage> {
            None
        }
    }

    #[test]
    fn publishes_on_change_only() {
        let mut tr = Sink(Vec::new());
        hw_init::sim_set_pin(55, false);
        let mut s = Switch::init(55, -1, TickMs(0)).unwrap();

        s.poll("t", TickMs(1_000), &mut tr);
        assert!(tr.0.is_empty());

        hw_init::sim_set_pin(55, true);
        s.poll("t", TickMs(2_000), &mut tr);
        assert_eq!(tr.0.last().unwrap().1, "on 0");

        // Stable level, disabled report timeout: silent again.
        s.poll("t", TickMs(3_000), &mut tr);
        assert_eq!(tr.0.len(), 1);
    }

    #[test]
    fn report_timeout_republishes_once_then_rearms() {
        let mut tr = Sink(Vec::new());
        hw_init::sim_set_pin(56, false);
        let mut s = Switch::init(56, 5, TickMs(0)).unwrap();

        s.poll("t", TickMs(4_000), &mut tr);
        assert!(tr.0.is_empty());
        s.poll("t", TickMs(5_000), &mut tr);
        assert_eq!(tr.0.last().unwrap().1, "off 5");
        // Rearmed: nothing for another period.
        s.poll("t", TickMs(6_000), &mut tr);
        assert_eq!(tr.0.len(), 1);
        s.poll("t", TickMs(10_000), &mut tr);
        assert_eq!(tr.0.len(), 2);
    }

    #[test]
    fn query_reports_elapsed_since_change() {
        let mut tr = Sink(Vec::new());
        hw_init::sim_set_pin(57, true);
        let mut s = Switch::init(57, -1, TickMs(0)).unwrap();
        s.query("t", TickMs(12_000), &mut tr);
        assert_eq!(tr.0.last().unwrap().1, "on 12");
    }

    #[test]
    fn timeout_set_replies_and_rearms() {
        let mut tr = Sink(Vec::new());
        hw_init::sim_set_pin(58, false);
        let mut s = Switch::init(58, 5, TickMs(0)).unwrap();

        s.timeout_set("t", 60, TickMs(4_000), &mut tr);
        assert_eq!(tr.0.last().unwrap().1, "60");
        // Old 5s deadline no longer applies.
        s.poll("t", TickMs(9_000), &mut tr);
        assert_eq!(tr.0.len(), 1);

        s.timeout_set("t", -7, TickMs(9_000), &mut tr);
        assert_eq!(tr.0.last().unwrap().1, "-1");
        s.timeout_get("t", &mut tr);
        assert_eq!(tr.0.last().unwrap().1, "-1");
    }
}
