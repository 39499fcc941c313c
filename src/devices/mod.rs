//! Controllable devices and the topic registry binding them to links.
//!
//! Every device type implements the same shape of contract — init from
//! static config, autonomous poll, a small set of commands — expressed as
//! a closed enum rather than a trait object so dispatch is exhaustive and
//! adding a type is a compile-checked extension point.

use core::fmt;

use crate::app::TickMs;
use crate::config::{DeviceConfig, LinkConfig};
use crate::error::InitError;

pub mod group;
pub mod inert;
pub mod mosfet;
pub mod sensor;
pub mod switch;

use group::GroupTable;

/// Wire-visible device type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Mosfet,
    Switch,
    SensorI2c,
    Inert,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Mosfet => "MOSFET",
            Self::Switch => "SWITCH",
            Self::SensorI2c => "SENSOR_I2C",
            Self::Inert => "INERT",
        };
        f.write_str(s)
    }
}

/// Runtime device bound to one link.
#[derive(Debug)]
pub enum LinkDevice {
    Mosfet(mosfet::Mosfet),
    Switch(switch::Switch),
    SensorI2c(sensor::PolledSensor),
    Inert(inert::Inert),
}

impl LinkDevice {
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Mosfet(_) => DeviceKind::Mosfet,
            Self::Switch(_) => DeviceKind::Switch,
            Self::SensorI2c(_) => DeviceKind::SensorI2c,
            Self::Inert(_) => DeviceKind::Inert,
        }
    }
}

/// One registry entry: a command topic and its device.
#[derive(Debug)]
pub struct Link {
    pub topic: String,
    pub device: LinkDevice,
}

/// Static topic → device mapping, built once at startup.
///
/// Iteration order is configuration order; autonomous polls follow it.
#[derive(Debug)]
pub struct LinkRegistry {
    links: Vec<Link>,
}

impl LinkRegistry {
    /// Build every device and the group table from the configuration.
    ///
    /// Fails fast on the first problem — duplicate topic, GPIO/bus setup
    /// failure, unhealthy sensor, oversized group — so a misconfigured
    /// controller never enters the run loop.
    pub fn from_config(
        links: &[LinkConfig],
        now: TickMs,
    ) -> Result<(Self, GroupTable), InitError> {
        let mut groups = GroupTable::default();

        // Enroll group members first: configuration order fixes both the
        // member order and a Sequential group's initial pointer.
        for lc in links {
            if let DeviceConfig::Mosfet {
                pin,
                group: Some(id),
                group_mode,
                ..
            } = &lc.device
            {
                groups.enroll(*id, *pin, *group_mode)?;
            }
        }

        let mut built: Vec<Link> = Vec::with_capacity(links.len());
        for lc in links {
            if built.iter().any(|l| l.topic == lc.topic) {
                return Err(InitError::DuplicateTopic(lc.topic.clone()));
            }
            let device = match &lc.device {
                DeviceConfig::Mosfet {
                    pin,
                    default_on,
                    default_timeout_secs,
                    group,
                    ..
                } => {
                    let m =
                        mosfet::Mosfet::init(*pin, *default_on, *default_timeout_secs, *group, now)?;
                    if *default_on {
                        if let Some(g) = group.and_then(|id| groups.get_mut(id)) {
                            g.note_on(*pin);
                        }
                    }
                    LinkDevice::Mosfet(m)
                }
                DeviceConfig::Switch {
                    pin,
                    report_timeout_secs,
                } => LinkDevice::Switch(switch::Switch::init(*pin, *report_timeout_secs, now)?),
                DeviceConfig::SensorI2c {
                    scl,
                    sda,
                    kind,
                    poll_timeout_secs,
                } => LinkDevice::SensorI2c(sensor::PolledSensor::init(
                    *kind,
                    *scl,
                    *sda,
                    *poll_timeout_secs,
                    now,
                )?),
                DeviceConfig::Inert => LinkDevice::Inert(inert::Inert),
            };
            built.push(Link {
                topic: lc.topic.clone(),
                device,
            });
        }

        Ok((Self { links: built }, groups))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(|l| l.topic.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    pub fn get_mut(&mut self, topic: &str) -> Option<&mut Link> {
        self.links.iter_mut().find(|l| l.topic == topic)
    }

    pub fn links_mut(&mut self) -> &mut [Link] {
        &mut self.links
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use crate::config::ControllerConfig;
    use crate::devices::group::GroupMode;

    #[test]
    fn registry_keys_equal_configured_topics() {
        let cfg = ControllerConfig::default();
        let (reg, _groups) = LinkRegistry::from_config(&cfg.links, TickMs(0)).unwrap();
        let topics: Vec<&str> = reg.topics().collect();
        let expected: Vec<&str> = cfg.links.iter().map(|l| l.topic.as_str()).collect();
        assert_eq!(topics, expected);
    }

    #[test]
    fn duplicate_topic_is_fatal() {
        let mut cfg = ControllerConfig::default();
        let dup = cfg.links[0].clone();
        cfg.links.push(dup);
        let err = LinkRegistry::from_config(&cfg.links, TickMs(0)).unwrap_err();
        assert!(matches!(err, InitError::DuplicateTopic(_)));
    }

    #[test]
    fn sequential_group_pointer_starts_at_first_declared_member() {
        let raw = r#"{
            "client_name": "gard-99",
            "broker_url": "mqtt://broker.local:1883",
            "links": [
                { "topic": "gard-99/a",
                  "device": { "type": "MOSFET", "pin": 60,
                              "default_timeout_secs": 10,
                              "group": 4, "group_mode": "sequential" } },
                { "topic": "gard-99/b",
                  "device": { "type": "MOSFET", "pin": 61,
                              "default_timeout_secs": 10,
                              "group": 4, "group_mode": "sequential" } }
            ]
        }"#;
        let cfg = ControllerConfig::from_json(raw).unwrap();
        let (_reg, groups) = LinkRegistry::from_config(&cfg.links, TickMs(0)).unwrap();
        let g = groups.get(4).unwrap();
        assert_eq!(g.mode(), GroupMode::Sequential);
        assert_eq!(g.next_member(), Some(60));
    }
}
