//! MOSFET-switched load: a pump, valve or lamp behind a logic-level gate.
//!
//! Runtime state is ON/OFF plus two timeouts: `active_timeout` bounds the
//! current ON period (auto-off) and can be changed per activation with
//! `on:<seconds>`; `static_timeout` is the configured default reported on
//! status queries. `-1` means unbounded in both.

use log::info;

use crate::app::TickMs;
use crate::app::ports::{TransportPort, publish_status};
use crate::devices::group::{GroupId, GroupTable};
use crate::drivers::hw_init::{self, HwInitError};

#[derive(Debug)]
pub struct Mosfet {
    pin: u8,
    static_timeout: i32,
    group: Option<GroupId>,
    on: bool,
    changed_at: TickMs,
    active_timeout: i32,
}

impl Mosfet {
    /// Configure the gate pin and drive the configured default level.
    pub fn init(
        pin: u8,
        default_on: bool,
        default_timeout_secs: i32,
        group: Option<GroupId>,
        now: TickMs,
    ) -> Result<Self, HwInitError> {
        hw_init::gpio_config_output(pin, default_on)?;
        let timeout = if default_timeout_secs < 0 {
            -1
        } else {
            default_timeout_secs
        };
        Ok(Self {
            pin,
            static_timeout: timeout,
            group,
            on: default_on,
            changed_at: now,
            active_timeout: timeout,
        })
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    /// Autonomous tick: enforce the auto-off timeout.
    ///
    /// Publishes exactly once, on the tick that performs the transition;
    /// an already-OFF actuator stays silent.
    pub fn poll(
        &mut self,
        topic: &str,
        now: TickMs,
        groups: &mut GroupTable,
        transport: &mut dyn TransportPort,
    ) {
        if self.on
            && self.active_timeout != -1
            && now.secs_since(self.changed_at) >= self.active_timeout as u32
        {
            info!("{topic}: auto-off after {}s", self.active_timeout);
            self.set_off(now, groups);
            self.publish(topic, now, false, transport);
        }
    }

    /// `?` — status without mutation, default timeout appended.
    pub fn query(&self, topic: &str, now: TickMs, transport: &mut dyn TransportPort) {
        self.publish(topic, now, true, transport);
    }

    /// `on` / `on:<seconds>` — activate, subject to group policy.
    ///
    /// A refused activation still publishes the (unchanged) status, after
    /// a WARNING naming the conflicting group.
    pub fn command_on(
        &mut self,
        topic: &str,
        timeout_secs: Option<i32>,
        now: TickMs,
        groups: &mut GroupTable,
        transport: &mut dyn TransportPort,
    ) {
        if let Some(n) = timeout_secs {
            self.apply_timeout(n, now);
        }
        if !self.on {
            if self.may_activate(groups) {
                self.set_on(now, groups);
            } else if let Some(id) = self.group {
                publish_status(
                    transport,
                    topic,
                    &format!("WARNING: Could not start {topic} due to group [{id}] conflict"),
                );
            }
        }
        self.publish(topic, now, false, transport);
    }

    /// `off` — deactivate. Idempotent: an already-OFF actuator keeps its
    /// `changed_at`, so repeated `off` does not reset the elapsed counter.
    pub fn command_off(
        &mut self,
        topic: &str,
        now: TickMs,
        groups: &mut GroupTable,
        transport: &mut dyn TransportPort,
    ) {
        if self.on {
            self.set_off(now, groups);
        }
        self.publish(topic, now, false, transport);
    }

    /// Fold an `on:<n>` operand into `active_timeout`.
    ///
    /// `n <= 0` requests an unbounded run. While already ON with a bounded
    /// timeout the new bound never extends the current period: it becomes
    /// min(remaining, n).
    fn apply_timeout(&mut self, n: i32, now: TickMs) {
        let t = if n <= 0 { -1 } else { n };
        if t != -1 && self.on && self.active_timeout != -1 {
            let elapsed = now.secs_since(self.changed_at) as i32;
            let remaining = (self.active_timeout - elapsed).max(0);
            self.active_timeout = remaining.min(t);
        } else {
            self.active_timeout = t;
        }
    }

    fn may_activate(&self, groups: &GroupTable) -> bool {
        match self.group {
            None => true,
            Some(id) => groups.get(id).is_none_or(|g| g.may_activate(self.pin)),
        }
    }

    fn set_on(&mut self, now: TickMs, groups: &mut GroupTable) {
        hw_init::gpio_write(self.pin, true);
        self.on = true;
        self.changed_at = now;
        if let Some(g) = self.group.and_then(|id| groups.get_mut(id)) {
            g.note_on(self.pin);
        }
    }

    fn set_off(&mut self, now: TickMs, groups: &mut GroupTable) {
        hw_init::gpio_write(self.pin, false);
        self.on = false;
        self.changed_at = now;
        if let Some(g) = self.group.and_then(|id| groups.get_mut(id)) {
            g.note_off(self.pin);
        }
    }

    /// `on <elapsed>/<active_timeout>` or `off <elapsed>`, with
    /// `:<default_timeout>` appended for query responses.
    fn publish(&self, topic: &str, now: TickMs, query: bool, transport: &mut dyn TransportPort) {
        let elapsed = now.secs_since(self.changed_at);
        let mut reply = if self.on {
            format!("on {elapsed}/{}", self.active_timeout)
        } else {
            format!("off {elapsed}")
        };
        if query {
            reply.push_str(&format!(":{}", self.static_timeout));
        }
        publish_status(transport, topic, &reply);
    }
}
