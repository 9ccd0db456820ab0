/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use store::Store;
use types::{
    acl::{Right, Rights},
    folder,
    id::Eid,
};

use crate::logon::LogonObject;

/// Effective rights of the acting principal on a folder.
///
/// Owners get the full mask without a driver round trip. A delegate or
/// guest with no ACL entry is still allowed to see the mailbox root and
/// IPM subtree (private) or the public root, otherwise navigation into a
/// shared mailbox would dead-end at the top.
pub async fn effective_rights(
    store: &Store,
    logon: &LogonObject,
    folder_id: Eid,
) -> trc::Result<Rights> {
    if logon.is_owner() {
        return Ok(Right::owner_rights());
    }
    let mut rights = store
        .check_folder_permission(logon.dir(), folder_id, &logon.username)
        .await?;
    if rights.is_empty() && folder_id.is_local() {
        let counter = folder_id.counter();
        let promote = if logon.is_private() {
            counter == folder::PRIVATE_FID_ROOT || counter == folder::PRIVATE_FID_IPMSUBTREE
        } else {
            counter == folder::PUBLIC_FID_ROOT
        };
        if promote {
            rights.insert(Right::Visible);
        }
    }
    Ok(rights)
}

/// Acting username forwarded to the driver for scoped operations: owners
/// act with no restriction at all.
pub fn acting_user<'x>(logon: &'x LogonObject) -> Option<&'x str> {
    if logon.is_owner() {
        None
    } else {
        Some(logon.username.as_str())
    }
}
