/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use trc::MapiEvent;
use types::{
    acl::{PermissionData, Right, Rights},
    folder,
    id::Eid,
};

use crate::{
    object::{
        RopObject,
        table::{TableObject, TableType},
    },
    permission::effective_rights,
    session::SessionData,
};

pub const MODIFY_PERMISSIONS_FLAG_REPLACEROWS: u8 = 0x01;
pub const MODIFY_PERMISSIONS_FLAG_INCLUDEFREEBUSY: u8 = 0x02;

impl SessionData {
    pub async fn rop_modify_permissions(
        &self,
        logon_id: u8,
        hin: u32,
        flags: u8,
        rows: Vec<PermissionData>,
    ) -> trc::Result<()> {
        let logon = self.logon(logon_id)?;
        let target = self.folder(logon_id, hin)?;
        let mut include_freebusy = false;
        if flags & MODIFY_PERMISSIONS_FLAG_INCLUDEFREEBUSY != 0 {
            if !logon.is_private() {
                return Err(MapiEvent::NotSupported.into_err());
            }
            // Free/busy rows only exist on the calendar
            include_freebusy =
                target.folder_id == Eid::local(folder::PRIVATE_FID_CALENDAR);
        }
        let store = self.server.store();
        if !logon.is_owner() {
            let rights = effective_rights(&store, &logon, target.folder_id).await?;
            if !rights.contains(Right::Owner) {
                return Err(MapiEvent::AccessDenied.into_err());
            }
        }
        if flags & MODIFY_PERMISSIONS_FLAG_REPLACEROWS != 0 {
            store
                .empty_folder_permission(logon.dir(), target.folder_id)
                .await?;
        }
        if rows.is_empty() {
            // Replacing with nothing is a valid ACL clear
            return Ok(());
        }
        store
            .update_folder_permission(logon.dir(), target.folder_id, include_freebusy, rows)
            .await
    }

    pub async fn rop_get_permissions_table(
        &self,
        logon_id: u8,
        hin: u32,
        table_flags: u8,
    ) -> trc::Result<u32> {
        let logon = self.logon(logon_id)?;
        let target = self.folder(logon_id, hin)?;
        if !logon.is_owner() {
            let store = self.server.store();
            let rights = effective_rights(&store, &logon, target.folder_id).await?;
            if !rights.contains_any(Rights::from(Right::Owner).with_item(Right::Visible)) {
                return Err(MapiEvent::AccessDenied.into_err());
            }
        }
        self.add_object(
            logon_id,
            hin,
            RopObject::Table(TableObject::new(
                logon,
                target.folder_id,
                TableType::Permission,
                table_flags,
                self.cpid,
            )),
        )
    }
}
