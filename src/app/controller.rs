//! The controller: topic registry, command dispatch and the cooperative
//! control loop, all behind one owned object.
//!
//! The outer loop calls [`Controller::tick`] with a fresh time snapshot;
//! everything else — message draining, verb dispatch, autonomous polls,
//! the heartbeat — happens inside. No globals, no interior threads.

use log::{debug, info};

use crate::app::ports::{InboundMessage, TransportPort, publish_status};
use crate::app::verbs::{SystemVerb, SystemVerbError, Verb, VerbError};
use crate::app::{Now, Step, TickMs};
use crate::config::ControllerConfig;
use crate::devices::group::GroupTable;
use crate::devices::{LinkDevice, LinkRegistry};
use crate::error::InitError;

/// Poll cadence of the control loop: messages are drained and every link
/// is polled once per interval.
pub const CHECK_INTERVAL_MS: u32 = 1000;

/// Default heartbeat (keep-alive) interval: 5 minutes.
pub const DEFAULT_KAT_MS: u32 = 300_000;

pub struct Controller {
    client_name: String,
    registry: LinkRegistry,
    groups: GroupTable,
    /// Heartbeat interval, milliseconds. Mutable via `set_kat`.
    kat_ms: u32,
    last_poll: TickMs,
    last_heartbeat: TickMs,
}

impl Controller {
    /// Build the registry and group table; any failure here is fatal and
    /// keeps the firmware out of the run loop.
    pub fn init(config: &ControllerConfig, now: Now) -> Result<Self, InitError> {
        let (registry, groups) = LinkRegistry::from_config(&config.links, now.ticks)?;
        info!(
            "controller '{}' up with {} links",
            config.client_name,
            registry.len()
        );
        for topic in registry.topics() {
            info!("  link {topic}");
        }
        Ok(Self {
            client_name: config.client_name.clone(),
            registry,
            groups,
            kat_ms: DEFAULT_KAT_MS,
            // Backdate so the first tick polls immediately.
            last_poll: TickMs(now.ticks.0.wrapping_sub(CHECK_INTERVAL_MS)),
            last_heartbeat: now.ticks,
        })
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Every topic the transport must subscribe to: one per link plus the
    /// controller's own command topic.
    pub fn command_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.registry.topics().map(str::to_string).collect();
        topics.push(self.client_name.clone());
        topics
    }

    /// Announce startup on the controller's status topic.
    pub fn announce_ready(&self, transport: &mut dyn TransportPort) {
        publish_status(transport, &self.client_name, "READY");
    }

    /// One scheduler iteration.
    ///
    /// Once per [`CHECK_INTERVAL_MS`]: drain the messages the transport
    /// has buffered (in arrival order), then poll every link in registry
    /// order. Independently, emit `STEADY:<uptime>` once per heartbeat
    /// interval.
    pub fn tick(&mut self, now: Now, transport: &mut dyn TransportPort) -> Step {
        if now.ticks.millis_since(self.last_poll) >= CHECK_INTERVAL_MS {
            while let Some(msg) = transport.try_recv() {
                if self.dispatch(&msg, now, transport) == Step::Reset {
                    return Step::Reset;
                }
            }
            self.poll_links(now.ticks, transport);
            self.last_poll = now.ticks;
        }

        if now.ticks.millis_since(self.last_heartbeat) >= self.kat_ms {
            publish_status(
                transport,
                &self.client_name,
                &format!("STEADY:{}", now.uptime_secs),
            );
            self.last_heartbeat = now.ticks;
        }

        Step::Continue
    }

    fn poll_links(&mut self, now: TickMs, transport: &mut dyn TransportPort) {
        for link in self.registry.links_mut() {
            match &mut link.device {
                LinkDevice::Mosfet(m) => m.poll(&link.topic, now, &mut self.groups, transport),
                LinkDevice::Switch(s) => s.poll(&link.topic, now, transport),
                LinkDevice::SensorI2c(s) => s.poll(&link.topic, now, transport),
                LinkDevice::Inert(_) => {}
            }
        }
    }

    /// Route one inbound message to its link or to the system-verb
    /// handler. Malformed input becomes an `ERROR:` status publication;
    /// nothing propagates past this boundary.
    pub fn dispatch(
        &mut self,
        msg: &InboundMessage,
        now: Now,
        transport: &mut dyn TransportPort,
    ) -> Step {
        debug!("==> [{}] from [{}]", msg.payload, msg.topic);

        if msg.topic == self.client_name {
            return self.system_verb(msg, now, transport);
        }

        let Some(link) = self.registry.get_mut(&msg.topic) else {
            // Unreachable under normal subscription discipline.
            publish_status(
                transport,
                &self.client_name,
                &format!("ERROR: Unregistered topic: {}", msg.topic),
            );
            return Step::Continue;
        };

        if let LinkDevice::Inert(inert) = &link.device {
            inert.reject(&link.topic, transport);
            return Step::Continue;
        }

        let verb = match Verb::parse(link.device.kind(), &msg.payload) {
            Ok(v) => v,
            Err(VerbError::Unregistered) => {
                publish_status(
                    transport,
                    &msg.topic,
                    &format!("ERROR: Unregistered verb: {}", msg.payload),
                );
                return Step::Continue;
            }
            Err(VerbError::InvalidOperand) => {
                let reply = if msg.payload.starts_with("on:") {
                    format!("ERROR: Invalid timeout value in {}", msg.payload)
                } else {
                    format!("ERROR: Invalid timeout set command {}", msg.payload)
                };
                publish_status(transport, &msg.topic, &reply);
                return Step::Continue;
            }
        };

        let topic = &link.topic;
        match &mut link.device {
            LinkDevice::Mosfet(m) => match verb {
                Verb::Poll => m.poll(topic, now.ticks, &mut self.groups, transport),
                Verb::Query => m.query(topic, now.ticks, transport),
                Verb::On { timeout_secs } => {
                    m.command_on(topic, timeout_secs, now.ticks, &mut self.groups, transport);
                }
                Verb::Off => m.command_off(topic, now.ticks, &mut self.groups, transport),
                _ => {}
            },
            LinkDevice::Switch(s) => match verb {
                Verb::Poll => s.poll(topic, now.ticks, transport),
                Verb::Query => s.query(topic, now.ticks, transport),
                Verb::TimeoutGet => s.timeout_get(topic, transport),
                Verb::TimeoutSet { secs } => s.timeout_set(topic, secs, now.ticks, transport),
                _ => {}
            },
            LinkDevice::SensorI2c(s) => match verb {
                Verb::Poll => s.poll(topic, now.ticks, transport),
                Verb::Query => s.query(topic, now.ticks, transport),
                Verb::TimeoutGet => s.timeout_get(topic, transport),
                Verb::TimeoutSet { secs } => s.timeout_set(topic, secs, now.ticks, transport),
                _ => {}
            },
            LinkDevice::Inert(_) => {}
        }

        Step::Continue
    }

    fn system_verb(
        &mut self,
        msg: &InboundMessage,
        now: Now,
        transport: &mut dyn TransportPort,
    ) -> Step {
        match SystemVerb::parse(&msg.payload) {
            Ok(SystemVerb::Query) => {
                let reply = format!(
                    "{}:{}:{}",
                    self.client_name,
                    now.uptime_secs,
                    self.kat_ms / 1000
                );
                publish_status(transport, &self.client_name, &reply);
            }
            Ok(SystemVerb::Reset) => {
                publish_status(transport, &self.client_name, "GOING RESET");
                return Step::Reset;
            }
            Ok(SystemVerb::GetLinks) => {
                let mut reply = String::new();
                for link in self.registry.iter() {
                    let kind = link.device.kind();
                    match &link.device {
                        LinkDevice::Mosfet(m) => {
                            let state = if m.is_on() { "on" } else { "off" };
                            reply.push_str(&format!("{}:{kind}:{state}\n", link.topic));
                        }
                        LinkDevice::SensorI2c(s) => {
                            reply.push_str(&format!(
                                "{}:{kind}:{}:{}\n",
                                link.topic,
                                s.kind(),
                                s.poll_timeout()
                            ));
                        }
                        _ => reply.push_str(&format!("{}:{kind}\n", link.topic)),
                    }
                }
                publish_status(transport, &self.client_name, &reply);
            }
            Ok(SystemVerb::SetKat { secs }) => {
                self.kat_ms = secs.saturating_mul(1000);
                publish_status(transport, &self.client_name, &format!("new_kat:{secs}"));
            }
            Err(SystemVerbError::InvalidKat) => {
                publish_status(
                    transport,
                    &self.client_name,
                    &format!("ERROR: couldn't set new KAT from [{}]", msg.payload),
                );
            }
            Err(SystemVerbError::Unknown) => {
                publish_status(
                    transport,
                    &self.client_name,
                    &format!("ERROR: Invalid system verb: {}", msg.payload),
                );
            }
        }
        Step::Continue
    }
}
