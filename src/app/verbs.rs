//! Command verb grammar.
//!
//! Inbound payloads are parsed once into typed verbs before any handler
//! runs. This replaces prefix matching on raw bytes: `on` can never shadow
//! `on:5`, and a malformed numeric operand is rejected here instead of
//! surfacing inside a handler. Parsing is fallible-by-value — no panics,
//! no exceptions across the dispatch boundary.

use crate::devices::DeviceKind;

// ---------------------------------------------------------------------------
// Link verbs
// ---------------------------------------------------------------------------

/// A command addressed to a link topic.
///
/// Which variants a given link accepts depends on its [`DeviceKind`];
/// [`Verb::parse`] enforces the per-type allowed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Empty payload: autonomous poll (also issued by the scheduler).
    Poll,
    /// `?` — status query, no mutation.
    Query,
    /// `on` / `on:<seconds>` — activate, optionally bounding the run time.
    /// An operand `<= 0` requests an unlimited run.
    On { timeout_secs: Option<i32> },
    /// `off` — deactivate.
    Off,
    /// `timeout_get` — report the link's report/poll timeout.
    TimeoutGet,
    /// `timeout_set:<seconds>` — replace the timeout (`-1` disables it).
    TimeoutSet { secs: i32 },
}

/// Why a payload failed to parse as a [`Verb`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbError {
    /// The verb is not in this device type's allowed set.
    Unregistered,
    /// The verb was recognised but its numeric operand was malformed.
    InvalidOperand,
}

impl Verb {
    /// Parse `raw` against the allowed verb set of `kind`.
    ///
    /// [`DeviceKind::Inert`] accepts nothing; the dispatcher special-cases
    /// it before calling here.
    pub fn parse(kind: DeviceKind, raw: &str) -> Result<Verb, VerbError> {
        match raw {
            "" => return Ok(Verb::Poll),
            "?" => return Ok(Verb::Query),
            _ => {}
        }

        match kind {
            DeviceKind::Mosfet => match raw {
                "on" => Ok(Verb::On { timeout_secs: None }),
                "off" => Ok(Verb::Off),
                _ => match raw.strip_prefix("on:") {
                    Some(operand) => operand
                        .parse::<i32>()
                        .map(|n| Verb::On {
                            timeout_secs: Some(n),
                        })
                        .map_err(|_| VerbError::InvalidOperand),
                    None => Err(VerbError::Unregistered),
                },
            },

            DeviceKind::Switch | DeviceKind::SensorI2c => match raw {
                "timeout_get" => Ok(Verb::TimeoutGet),
                _ => match raw.strip_prefix("timeout_set:") {
                    Some(operand) => operand
                        .parse::<i32>()
                        .map(|secs| Verb::TimeoutSet { secs })
                        .map_err(|_| VerbError::InvalidOperand),
                    None => Err(VerbError::Unregistered),
                },
            },

            DeviceKind::Inert => Err(VerbError::Unregistered),
        }
    }
}

// ---------------------------------------------------------------------------
// System verbs
// ---------------------------------------------------------------------------

/// A command addressed to the controller's own topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemVerb {
    /// `?` — identity, uptime, heartbeat interval.
    Query,
    /// `reset` — announce and reboot.
    Reset,
    /// `get_links` — list every registered link.
    GetLinks,
    /// `set_kat:<seconds>` — change the heartbeat (keep-alive) interval.
    SetKat { secs: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemVerbError {
    Unknown,
    /// `set_kat` with a missing or non-numeric operand.
    InvalidKat,
}

impl SystemVerb {
    pub fn parse(raw: &str) -> Result<SystemVerb, SystemVerbError> {
        match raw {
            "?" => Ok(SystemVerb::Query),
            "reset" => Ok(SystemVerb::Reset),
            "get_links" => Ok(SystemVerb::GetLinks),
            _ => match raw.strip_prefix("set_kat:") {
                Some(operand) => operand
                    .parse::<u32>()
                    .map(|secs| SystemVerb::SetKat { secs })
                    .map_err(|_| SystemVerbError::InvalidKat),
                None if raw == "set_kat" => Err(SystemVerbError::InvalidKat),
                None => Err(SystemVerbError::Unknown),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mosfet_verbs() {
        let k = DeviceKind::Mosfet;
        assert_eq!(Verb::parse(k, ""), Ok(Verb::Poll));
        assert_eq!(Verb::parse(k, "?"), Ok(Verb::Query));
        assert_eq!(Verb::parse(k, "on"), Ok(Verb::On { timeout_secs: None }));
        assert_eq!(
            Verb::parse(k, "on:45"),
            Ok(Verb::On {
                timeout_secs: Some(45)
            })
        );
        assert_eq!(
            Verb::parse(k, "on:-1"),
            Ok(Verb::On {
                timeout_secs: Some(-1)
            })
        );
        assert_eq!(Verb::parse(k, "off"), Ok(Verb::Off));
    }

    #[test]
    fn mosfet_rejects_foreign_and_malformed() {
        let k = DeviceKind::Mosfet;
        assert_eq!(Verb::parse(k, "timeout_get"), Err(VerbError::Unregistered));
        assert_eq!(Verb::parse(k, "on:abc"), Err(VerbError::InvalidOperand));
        assert_eq!(Verb::parse(k, "on:"), Err(VerbError::InvalidOperand));
        assert_eq!(Verb::parse(k, "onwards"), Err(VerbError::Unregistered));
    }

    #[test]
    fn switch_and_sensor_share_timeout_verbs() {
        for k in [DeviceKind::Switch, DeviceKind::SensorI2c] {
            assert_eq!(Verb::parse(k, "timeout_get"), Ok(Verb::TimeoutGet));
            assert_eq!(
                Verb::parse(k, "timeout_set:90"),
                Ok(Verb::TimeoutSet { secs: 90 })
            );
            assert_eq!(
                Verb::parse(k, "timeout_set:-1"),
                Ok(Verb::TimeoutSet { secs: -1 })
            );
            assert_eq!(
                Verb::parse(k, "timeout_set:x"),
                Err(VerbError::InvalidOperand)
            );
            assert_eq!(Verb::parse(k, "on"), Err(VerbError::Unregistered));
        }
    }

    #[test]
    fn inert_accepts_nothing_but_poll_and_query() {
        assert_eq!(Verb::parse(DeviceKind::Inert, ""), Ok(Verb::Poll));
        assert_eq!(Verb::parse(DeviceKind::Inert, "?"), Ok(Verb::Query));
        assert_eq!(
            Verb::parse(DeviceKind::Inert, "on"),
            Err(VerbError::Unregistered)
        );
    }

    #[test]
    fn system_verbs() {
        assert_eq!(SystemVerb::parse("?"), Ok(SystemVerb::Query));
        assert_eq!(SystemVerb::parse("reset"), Ok(SystemVerb::Reset));
        assert_eq!(SystemVerb::parse("get_links"), Ok(SystemVerb::GetLinks));
        assert_eq!(
            SystemVerb::parse("set_kat:60"),
            Ok(SystemVerb::SetKat { secs: 60 })
        );
        assert_eq!(
            SystemVerb::parse("set_kat:nope"),
            Err(SystemVerbError::InvalidKat)
        );
        assert_eq!(SystemVerb::parse("set_kat"), Err(SystemVerbError::InvalidKat));
        assert_eq!(SystemVerb::parse("halt"), Err(SystemVerbError::Unknown));
        assert_eq!(SystemVerb::parse(""), Err(SystemVerbError::Unknown));
    }
}
