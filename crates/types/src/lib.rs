/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod acl;
pub mod folder;
pub mod id;
pub mod message;
pub mod property;
pub mod restriction;
pub mod search;
pub mod table;
pub mod xid;

use std::time::SystemTime;

pub type AccountId = u32;
pub type Cpid = u16;
pub type ReplicaId = u16;

/// Seconds between the Windows epoch (1601) and the Unix epoch (1970).
const NT_EPOCH_DELTA: u64 = 11_644_473_600;

/// Current time as 100ns intervals since 1601, the unit of PT_SYSTIME
/// properties.
pub fn current_nt_time() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| (d.as_secs() + NT_EPOCH_DELTA) * 10_000_000 + d.subsec_nanos() as u64 / 100)
}

