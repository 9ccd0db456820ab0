/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{AccountId, id::Cn};
use std::fmt;

pub const CHANGE_KEY_SIZE: usize = 22;

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
#[repr(transparent)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Guid(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Database GUID of a private mailbox; the account id is embedded so
    /// every mailbox owns a stable, distinct replica identity.
    pub fn private_mailbox(account_id: AccountId) -> Self {
        let mut bytes = [
            0x3e, 0xc9, 0x1d, 0xd7, 0x7f, 0x52, 0x45, 0x8e, 0x9c, 0xfe, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00,
        ];
        bytes[12..].copy_from_slice(&account_id.to_le_bytes());
        Guid(bytes)
    }

    pub fn public_store(account_id: AccountId) -> Self {
        let mut bytes = [
            0x91, 0x0e, 0x62, 0x4e, 0x3a, 0xb2, 0x47, 0xcd, 0xb4, 0x32, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00,
        ];
        bytes[12..].copy_from_slice(&account_id.to_le_bytes());
        Guid(bytes)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7], b[8], b[9], b[10], b[11], b[12], b[13],
            b[14], b[15]
        )
    }
}

/// Portable object identity: the mailbox GUID plus a local id derived from
/// a change number. Serialized as the 22-byte change key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Xid {
    pub guid: Guid,
    pub local_id: [u8; 6],
}

impl Xid {
    pub fn new(guid: Guid, cn: Cn) -> Self {
        Xid {
            guid,
            local_id: cn.local_id(),
        }
    }

    pub fn to_change_key(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(CHANGE_KEY_SIZE);
        key.extend_from_slice(self.guid.as_bytes());
        key.extend_from_slice(&self.local_id);
        key
    }

    pub fn from_change_key(key: &[u8]) -> Option<Self> {
        if key.len() != CHANGE_KEY_SIZE {
            return None;
        }
        let mut guid = [0u8; 16];
        guid.copy_from_slice(&key[..16]);
        let mut local_id = [0u8; 6];
        local_id.copy_from_slice(&key[16..]);
        Some(Xid {
            guid: Guid(guid),
            local_id,
        })
    }
}

/// Predecessor change list: one entry per replica that has mutated the
/// object, serialized as size-prefixed change-key blobs. Local ids may be
/// shorter than 6 bytes when produced by other implementations; ours are
/// always 6.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Pcl {
    entries: Vec<PclEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
struct PclEntry {
    guid: Guid,
    local_id: Vec<u8>,
}

impl Pcl {
    pub fn new() -> Self {
        Pcl::default()
    }

    pub fn parse(data: &[u8]) -> Option<Self> {
        let mut entries = Vec::new();
        let mut offset = 0;
        while offset < data.len() {
            let size = data[offset] as usize;
            offset += 1;
            if size < 17 || size > 24 || offset + size > data.len() {
                return None;
            }
            let mut guid = [0u8; 16];
            guid.copy_from_slice(&data[offset..offset + 16]);
            entries.push(PclEntry {
                guid: Guid(guid),
                local_id: data[offset + 16..offset + size].to_vec(),
            });
            offset += size;
        }
        Some(Pcl { entries })
    }

    /// Merge an XID into the list: an entry for the same replica is
    /// replaced when the new local id is not older, other replicas are
    /// left untouched.
    pub fn append(&mut self, xid: Xid) {
        for entry in self.entries.iter_mut() {
            if entry.guid == xid.guid {
                if compare_local_ids(&xid.local_id, &entry.local_id) != std::cmp::Ordering::Less {
                    entry.local_id = xid.local_id.to_vec();
                }
                return;
            }
        }
        self.entries.push(PclEntry {
            guid: xid.guid,
            local_id: xid.local_id.to_vec(),
        });
    }

    pub fn contains(&self, xid: &Xid) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.guid == xid.guid && entry.local_id == xid.local_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.entries.len() * (CHANGE_KEY_SIZE + 1));
        for entry in &self.entries {
            data.push((16 + entry.local_id.len()) as u8);
            data.extend_from_slice(entry.guid.as_bytes());
            data.extend_from_slice(&entry.local_id);
        }
        data
    }
}

/// Big-endian comparison with implicit left zero padding, so a 5-byte id
/// from a foreign replica compares correctly against our 6-byte ids.
fn compare_local_ids(left: &[u8], right: &[u8]) -> std::cmp::Ordering {
    let len = left.len().max(right.len());
    for i in 0..len {
        let l = left
            .len()
            .checked_sub(len - i)
            .map_or(0, |idx| left[idx]);
        let r = right
            .len()
            .checked_sub(len - i)
            .map_or(0, |idx| right[idx]);
        match l.cmp(&r) {
            std::cmp::Ordering::Equal => {}
            other => return other,
        }
    }
    std::cmp::Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_key_round_trip() {
        let xid = Xid::new(Guid::private_mailbox(7), Cn::new(0xfeed));
        let key = xid.to_change_key();
        assert_eq!(key.len(), CHANGE_KEY_SIZE);
        assert_eq!(Xid::from_change_key(&key), Some(xid));
        assert_eq!(Xid::from_change_key(&key[1..]), None);
    }

    #[test]
    fn pcl_append_merges_same_replica() {
        let guid = Guid::private_mailbox(1);
        let mut pcl = Pcl::new();
        pcl.append(Xid::new(guid, Cn::new(5)));
        pcl.append(Xid::new(guid, Cn::new(9)));
        assert_eq!(pcl.len(), 1);
        assert!(pcl.contains(&Xid::new(guid, Cn::new(9))));
        assert!(!pcl.contains(&Xid::new(guid, Cn::new(5))));

        // Older change numbers never move the entry backwards
        pcl.append(Xid::new(guid, Cn::new(2)));
        assert!(pcl.contains(&Xid::new(guid, Cn::new(9))));

        pcl.append(Xid::new(Guid::private_mailbox(2), Cn::new(1)));
        assert_eq!(pcl.len(), 2);
    }

    #[test]
    fn pcl_serialization_round_trip() {
        let mut pcl = Pcl::new();
        pcl.append(Xid::new(Guid::private_mailbox(1), Cn::new(77)));
        pcl.append(Xid::new(Guid::public_store(1), Cn::new(78)));
        let data = pcl.serialize();
        assert_eq!(data.len(), 2 * (1 + CHANGE_KEY_SIZE));
        assert_eq!(Pcl::parse(&data), Some(pcl));
        assert_eq!(Pcl::parse(&[3, 0, 0]), None);
        assert_eq!(Pcl::parse(&[]), Some(Pcl::new()));
    }

    #[test]
    fn foreign_local_id_widths_compare() {
        let guid = Guid::private_mailbox(1);
        let mut pcl = Pcl::parse(&{
            // 5-byte local id written by a foreign implementation
            let mut data = vec![21u8];
            data.extend_from_slice(guid.as_bytes());
            data.extend_from_slice(&[0, 0, 0, 1, 0]);
            data
        })
        .unwrap();
        pcl.append(Xid::new(guid, Cn::new(0x2_0000)));
        assert_eq!(pcl.len(), 1);
        assert!(pcl.contains(&Xid::new(guid, Cn::new(0x2_0000))));
    }

    #[test]
    fn mailbox_guids_are_distinct() {
        assert_ne!(Guid::private_mailbox(1), Guid::private_mailbox(2));
        assert_ne!(Guid::private_mailbox(1), Guid::public_store(1));
        assert_eq!(
            Guid::private_mailbox(3).to_string().len(),
            "00000000-0000-0000-0000-000000000000".len()
        );
    }
}
