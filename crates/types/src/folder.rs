/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::id::Eid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(u32)]
pub enum FolderType {
    Root = 0,
    Generic = 1,
    Search = 2,
}

impl FolderType {
    pub fn from_wire(value: u32) -> Option<Self> {
        match value {
            0 => Some(FolderType::Root),
            1 => Some(FolderType::Generic),
            2 => Some(FolderType::Search),
            _ => None,
        }
    }
}

/// Well-known counters of a private mailbox. Everything below
/// `PRIVATE_FID_CUSTOM` is a system folder that cannot be deleted, renamed
/// or moved.
pub const PRIVATE_FID_ROOT: u64 = 0x01;
pub const PRIVATE_FID_DEFERRED_ACTION: u64 = 0x02;
pub const PRIVATE_FID_SPOOLER_QUEUE: u64 = 0x03;
pub const PRIVATE_FID_SHORTCUTS: u64 = 0x04;
pub const PRIVATE_FID_FINDER: u64 = 0x05;
pub const PRIVATE_FID_VIEWS: u64 = 0x06;
pub const PRIVATE_FID_COMMON_VIEWS: u64 = 0x07;
pub const PRIVATE_FID_SCHEDULE: u64 = 0x08;
pub const PRIVATE_FID_IPMSUBTREE: u64 = 0x09;
pub const PRIVATE_FID_SENT_ITEMS: u64 = 0x0a;
pub const PRIVATE_FID_DELETED_ITEMS: u64 = 0x0b;
pub const PRIVATE_FID_OUTBOX: u64 = 0x0c;
pub const PRIVATE_FID_INBOX: u64 = 0x0d;
pub const PRIVATE_FID_DRAFT: u64 = 0x0e;
pub const PRIVATE_FID_CALENDAR: u64 = 0x0f;
pub const PRIVATE_FID_JOURNAL: u64 = 0x10;
pub const PRIVATE_FID_NOTES: u64 = 0x11;
pub const PRIVATE_FID_TASKS: u64 = 0x12;
pub const PRIVATE_FID_CONTACTS: u64 = 0x13;
pub const PRIVATE_FID_QUICKCONTACTS: u64 = 0x14;
pub const PRIVATE_FID_JUNK: u64 = 0x15;
pub const PRIVATE_FID_CONVERSATION_ACTION_SETTINGS: u64 = 0x16;
pub const PRIVATE_FID_CUSTOM: u64 = 0x17;

/// Well-known counters of the public store.
pub const PUBLIC_FID_ROOT: u64 = 0x01;
pub const PUBLIC_FID_IPMSUBTREE: u64 = 0x02;
pub const PUBLIC_FID_NONIPMSUBTREE: u64 = 0x03;
pub const PUBLIC_FID_EFORMSREGISTRY: u64 = 0x04;
pub const PUBLIC_FID_CUSTOM: u64 = 0x05;

pub fn is_system_folder(folder_id: Eid, private: bool) -> bool {
    let counter = folder_id.counter();
    if private {
        counter < PRIVATE_FID_CUSTOM
    } else {
        counter < PUBLIC_FID_CUSTOM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_folder_thresholds() {
        assert!(is_system_folder(Eid::local(PRIVATE_FID_INBOX), true));
        assert!(is_system_folder(Eid::local(PRIVATE_FID_CUSTOM - 1), true));
        assert!(!is_system_folder(Eid::local(PRIVATE_FID_CUSTOM), true));
        assert!(is_system_folder(Eid::local(PUBLIC_FID_IPMSUBTREE), false));
        assert!(!is_system_folder(Eid::local(0x100), false));
    }
}
