//! Actuator group coordination.
//!
//! A group constrains which members of a set of actuators may be ON at
//! the same time — typically pumps sharing one water line or one power
//! budget. Policy only engages once a group has more than one member; a
//! single-member group behaves exactly like an ungrouped actuator.

use serde::{Deserialize, Serialize};

use crate::error::InitError;

/// Stable group key from the configuration.
pub type GroupId = u8;

/// Fixed membership bound per group.
pub const MAX_GROUP_MEMBERS: usize = 8;

/// Activation policy shared by a group's members.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    /// No exclusion; membership is recorded but never enforced.
    #[default]
    None,
    /// At most one member ON at any instant.
    Parallel,
    /// Members take turns in fixed round-robin order.
    Sequential,
}

/// One group's coordination record.
///
/// Members are identified by their GPIO pin, the one identifier that is
/// stable for an actuator's whole lifetime. `active` tracks the member
/// currently ON so conflict checks never depend on re-deriving state from
/// the registry.
#[derive(Debug)]
pub struct Group {
    id: GroupId,
    mode: GroupMode,
    members: heapless::Vec<u8, MAX_GROUP_MEMBERS>,
    /// Pin of the member currently ON, if any.
    active: Option<u8>,
    /// Index into `members` of the next member permitted ON (Sequential).
    next_idx: usize,
}

impl Group {
    fn new(id: GroupId) -> Self {
        Self {
            id,
            mode: GroupMode::None,
            members: heapless::Vec::new(),
            active: None,
            next_idx: 0,
        }
    }

    pub fn mode(&self) -> GroupMode {
        self.mode
    }

    /// Pin of the member the round-robin pointer designates.
    pub fn next_member(&self) -> Option<u8> {
        self.members.get(self.next_idx).copied()
    }

    fn enroll(&mut self, pin: u8, mode: GroupMode) -> Result<(), InitError> {
        self.members
            .push(pin)
            .map_err(|_| InitError::GroupFull(self.id))?;
        // The strictest mode any member declares wins for the whole group.
        self.mode = self.mode.max(mode);
        Ok(())
    }

    /// Policy engages only once membership exceeds one.
    fn engaged(&self) -> bool {
        self.members.len() > 1 && self.mode != GroupMode::None
    }

    /// May `pin` transition OFF→ON right now?
    pub fn may_activate(&self, pin: u8) -> bool {
        if !self.engaged() {
            return true;
        }
        match self.mode {
            GroupMode::None => true,
            GroupMode::Parallel => self.active.is_none() || self.active == Some(pin),
            GroupMode::Sequential => self.next_member() == Some(pin),
        }
    }

    /// Record that `pin` transitioned OFF→ON.
    pub fn note_on(&mut self, pin: u8) {
        self.active = Some(pin);
    }

    /// Record that `pin` transitioned ON→OFF; a Sequential group advances
    /// its round-robin pointer past the member that just finished.
    pub fn note_off(&mut self, pin: u8) {
        if self.active == Some(pin) {
            self.active = None;
        }
        if self.mode == GroupMode::Sequential
            && !self.members.is_empty()
            && self.next_member() == Some(pin)
        {
            self.next_idx = (self.next_idx + 1) % self.members.len();
        }
    }
}

/// All groups, built once at init by scanning actuator configs.
#[derive(Debug, Default)]
pub struct GroupTable {
    groups: Vec<Group>,
}

impl GroupTable {
    /// Add `pin` to group `id`, creating the group on first sight.
    ///
    /// Call order fixes member order, so a Sequential group's pointer
    /// starts at the first member in configuration order.
    pub fn enroll(&mut self, id: GroupId, pin: u8, mode: GroupMode) -> Result<(), InitError> {
        if let Some(g) = self.groups.iter_mut().find(|g| g.id == id) {
            return g.enroll(pin, mode);
        }
        let mut g = Group::new(id);
        g.enroll(pin, mode)?;
        self.groups.push(g);
        Ok(())
    }

    pub fn get(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn get_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq_group(pins: &[u8]) -> GroupTable {
        let mut t = GroupTable::default();
        for &p in pins {
            t.enroll(7, p, GroupMode::Sequential).unwrap();
        }
        t
    }

    #[test]
    fn sequential_pointer_rotates_through_members() {
        let mut t = seq_group(&[10, 11, 12]);
        let g = t.get_mut(7).unwrap();

        assert!(g.may_activate(10));
        assert!(!g.may_activate(11));
        g.note_on(10);
        g.note_off(10);

        assert!(g.may_activate(11));
        g.note_on(11);
        g.note_off(11);
        g.note_on(12);
        g.note_off(12);

        // Wraps back to the first member.
        assert!(g.may_activate(10));
    }

    #[test]
    fn parallel_admits_one_member_at_a_time() {
        let mut t = GroupTable::default();
        t.enroll(3, 20, GroupMode::Parallel).unwrap();
        t.enroll(3, 21, GroupMode::Parallel).unwrap();
        let g = t.get_mut(3).unwrap();

        assert!(g.may_activate(20));
        g.note_on(20);
        assert!(!g.may_activate(21));
        // The active member itself is never blocked.
        assert!(g.may_activate(20));
        g.note_off(20);
        assert!(g.may_activate(21));
    }

    #[test]
    fn single_member_group_bypasses_policy() {
        let mut t = GroupTable::default();
        t.enroll(1, 30, GroupMode::Sequential).unwrap();
        let g = t.get_mut(1).unwrap();
        g.note_on(30);
        assert!(g.may_activate(30));
    }

    #[test]
    fn strictest_declared_mode_wins() {
        let mut t = GroupTable::default();
        t.enroll(2, 40, GroupMode::None).unwrap();
        t.enroll(2, 41, GroupMode::Sequential).unwrap();
        assert_eq!(t.get(2).unwrap().mode(), GroupMode::Sequential);
    }

    #[test]
    fn membership_bound_is_enforced() {
        let mut t = GroupTable::default();
        for p in 0..MAX_GROUP_MEMBERS as u8 {
            t.enroll(9, p, GroupMode::Parallel).unwrap();
        }
        assert!(t.enroll(9, 99, GroupMode::Parallel).is_err());
    }
}
