//! Static controller configuration.
//!
//! One topic per controllable link, plus the controller's own identity and
//! broker address. The table is immutable after init; there is no runtime
//! provisioning and no persistence beyond this compiled-in (or JSON-loaded)
//! configuration.

use serde::{Deserialize, Serialize};

use crate::devices::group::{GroupId, GroupMode};
use crate::pins;
use crate::sensors::SensorKind;

/// Top-level configuration consumed once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// MQTT client identity; also the controller's own command topic.
    pub client_name: String,
    /// Broker URL, e.g. `mqtt://broker.local:1883`.
    pub broker_url: String,
    /// Link table, in autonomous-poll order.
    pub links: Vec<LinkConfig>,
}

/// One link: a command topic bound to a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    pub topic: String,
    pub device: DeviceConfig,
}

/// Per-type static configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DeviceConfig {
    /// MOSFET-switched load (pump, valve, lamp).
    #[serde(rename = "MOSFET")]
    Mosfet {
        pin: u8,
        /// Level driven at init.
        #[serde(default)]
        default_on: bool,
        /// Auto-off timeout in seconds; `-1` = never.
        default_timeout_secs: i32,
        /// Mutual-exclusion group, if any.
        #[serde(default)]
        group: Option<GroupId>,
        #[serde(default)]
        group_mode: GroupMode,
    },

    /// Debounced digital input reported on change or timeout.
    #[serde(rename = "SWITCH")]
    Switch {
        pin: u8,
        /// Unconditional re-report interval in seconds; `-1` = never.
        report_timeout_secs: i32,
    },

    /// I2C environmental sensor polled on a timeout.
    #[serde(rename = "SENSOR_I2C")]
    SensorI2c {
        scl: u8,
        sda: u8,
        kind: SensorKind,
        /// Read interval in seconds; `-1` = never read autonomously.
        poll_timeout_secs: i32,
    },

    /// Placeholder for hardware that is wired but not yet supported.
    #[serde(rename = "INERT")]
    Inert,
}

impl ControllerConfig {
    /// Parse a configuration from its JSON representation.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

impl Default for ControllerConfig {
    /// The garden board this firmware ships on: two irrigation pumps and
    /// one GY-21P weather station.
    fn default() -> Self {
        let client_name = String::from("gard-01");
        let links = vec![
            LinkConfig {
                topic: format!("{client_name}/pump_control/tomatoes"),
                device: DeviceConfig::Mosfet {
                    pin: pins::PUMP_TOMATOES_GPIO,
                    default_on: false,
                    default_timeout_secs: 30,
                    group: None,
                    group_mode: GroupMode::None,
                },
            },
            LinkConfig {
                topic: format!("{client_name}/pump_control/cucumbers"),
                device: DeviceConfig::Mosfet {
                    pin: pins::PUMP_CUCUMBERS_GPIO,
                    default_on: false,
                    default_timeout_secs: 30,
                    group: None,
                    group_mode: GroupMode::None,
                },
            },
            LinkConfig {
                topic: format!("{client_name}/w_station/outside"),
                device: DeviceConfig::SensorI2c {
                    scl: pins::I2C_SCL_GPIO,
                    sda: pins::I2C_SDA_GPIO,
                    kind: SensorKind::Gy21p,
                    poll_timeout_secs: 60,
                },
            },
        ];

        Self {
            client_name,
            broker_url: String::from("mqtt://broker.local:1883"),
            links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = ControllerConfig::default();
        assert!(!c.client_name.is_empty());
        assert!(c.broker_url.starts_with("mqtt://"));
        assert_eq!(c.links.len(), 3);
        for link in &c.links {
            assert!(link.topic.starts_with(&c.client_name));
        }
    }

    #[test]
    fn serde_roundtrip() {
        let c = ControllerConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2 = ControllerConfig::from_json(&json).unwrap();
        assert_eq!(c.client_name, c2.client_name);
        assert_eq!(c.links.len(), c2.links.len());
        match (&c.links[0].device, &c2.links[0].device) {
            (
                DeviceConfig::Mosfet {
                    pin: a,
                    default_timeout_secs: ta,
                    ..
                },
                DeviceConfig::Mosfet {
                    pin: b,
                    default_timeout_secs: tb,
                    ..
                },
            ) => {
                assert_eq!(a, b);
                assert_eq!(ta, tb);
            }
            other => panic!("unexpected device configs: {other:?}"),
        }
    }

    #[test]
    fn unknown_device_type_is_rejected() {
        let raw = r#"{
            "client_name": "gard-99",
            "broker_url": "mqtt://broker.local:1883",
            "links": [
                { "topic": "gard-99/x", "device": { "type": "SERVO", "pin": 3 } }
            ]
        }"#;
        assert!(ControllerConfig::from_json(raw).is_err());
    }

    #[test]
    fn grouped_mosfets_parse() {
        let raw = r#"{
            "client_name": "gard-99",
            "broker_url": "mqtt://broker.local:1883",
            "links": [
                { "topic": "gard-99/a",
                  "device": { "type": "MOSFET", "pin": 20,
                              "default_timeout_secs": 10,
                              "group": 1, "group_mode": "sequential" } },
                { "topic": "gard-99/b",
                  "device": { "type": "MOSFET", "pin": 21,
                              "default_timeout_secs": 10,
                              "group": 1, "group_mode": "sequential" } }
            ]
        }"#;
        let c = ControllerConfig::from_json(raw).unwrap();
        match &c.links[0].device {
            DeviceConfig::Mosfet {
                group, group_mode, ..
            } => {
                assert_eq!(*group, Some(1));
                assert_eq!(*group_mode, GroupMode::Sequential);
            }
            other => panic!("unexpected device config: {other:?}"),
        }
    }
}
