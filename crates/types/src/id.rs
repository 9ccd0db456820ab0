/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::ReplicaId;
use std::fmt;

/// Replica id of the mailbox a session is logged on to. Anything else is a
/// ghost hosted by a foreign replica.
pub const REPLID_LOCAL: ReplicaId = 1;

const COUNTER_MASK: u64 = (1 << 48) - 1;

/// Folder or message id: a 16-bit replica prefix over a 48-bit global
/// counter allocated by the store.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Eid(u64);

impl Eid {
    #[inline(always)]
    pub const fn new(id: u64) -> Self {
        Eid(id)
    }

    #[inline(always)]
    pub const fn from_parts(replica_id: ReplicaId, counter: u64) -> Self {
        Eid(((replica_id as u64) << 48) | (counter & COUNTER_MASK))
    }

    pub const fn local(counter: u64) -> Self {
        Self::from_parts(REPLID_LOCAL, counter)
    }

    #[inline(always)]
    pub const fn replica_id(&self) -> ReplicaId {
        (self.0 >> 48) as ReplicaId
    }

    #[inline(always)]
    pub const fn counter(&self) -> u64 {
        self.0 & COUNTER_MASK
    }

    #[inline(always)]
    pub const fn is_local(&self) -> bool {
        self.replica_id() == REPLID_LOCAL
    }

    #[inline(always)]
    pub const fn id(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Eid {
    fn from(id: u64) -> Self {
        Eid(id)
    }
}

impl From<Eid> for u64 {
    fn from(id: Eid) -> Self {
        id.0
    }
}

impl fmt::Display for Eid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:x}", self.replica_id(), self.counter())
    }
}

/// Change number: per-mailbox monotonic counter, 48 bits on the wire.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Cn(u64);

impl Cn {
    #[inline(always)]
    pub const fn new(value: u64) -> Self {
        Cn(value & COUNTER_MASK)
    }

    #[inline(always)]
    pub const fn value(&self) -> u64 {
        self.0
    }

    pub const fn local_id(&self) -> [u8; 6] {
        counter_to_bytes(self.0)
    }
}

impl From<u64> for Cn {
    fn from(value: u64) -> Self {
        Cn::new(value)
    }
}

impl From<Cn> for u64 {
    fn from(cn: Cn) -> Self {
        cn.0
    }
}

const fn counter_to_bytes(value: u64) -> [u8; 6] {
    [
        (value >> 40) as u8,
        (value >> 32) as u8,
        (value >> 24) as u8,
        (value >> 16) as u8,
        (value >> 8) as u8,
        value as u8,
    ]
}

pub const fn counter_from_bytes(bytes: [u8; 6]) -> u64 {
    ((bytes[0] as u64) << 40)
        | ((bytes[1] as u64) << 32)
        | ((bytes[2] as u64) << 24)
        | ((bytes[3] as u64) << 16)
        | ((bytes[4] as u64) << 8)
        | (bytes[5] as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_compose() {
        let id = Eid::from_parts(1, 0x0000_1234_5678_9abc);
        assert_eq!(id.replica_id(), 1);
        assert_eq!(id.counter(), 0x1234_5678_9abc);
        assert!(id.is_local());
        assert_eq!(Eid::from_parts(id.replica_id(), id.counter()), id);

        let ghost = Eid::from_parts(5, 9);
        assert_eq!(ghost.replica_id(), 5);
        assert!(!ghost.is_local());
    }

    #[test]
    fn counter_overflow_is_masked() {
        let id = Eid::from_parts(2, u64::MAX);
        assert_eq!(id.replica_id(), 2);
        assert_eq!(id.counter(), COUNTER_MASK);
    }

    #[test]
    fn counter_byte_order() {
        let cn = Cn::new(0x0102_0304_0506);
        assert_eq!(cn.local_id(), [1, 2, 3, 4, 5, 6]);
        assert_eq!(counter_from_bytes(cn.local_id()), cn.value());
    }
}
