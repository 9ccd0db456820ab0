/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use common::DeliveryEvent;
use trc::MapiEvent;
use types::{
    acl::{PERMISSION_DATA_FLAG_ADD_ROW, PermissionData, Right, Rights},
    current_nt_time,
    folder::{self, FolderType},
    id::Eid,
    property::{self, PropValue, PropvalList, TaggedPropval},
    table::{
        TABLE_FLAG_ASSOCIATED, TABLE_FLAG_CONVERSATIONMEMBERS, TABLE_FLAG_DEFERREDERRORS,
        TABLE_FLAG_DEPTH, TABLE_FLAG_NONOTIFICATIONS, TABLE_FLAG_SOFTDELETES,
        TABLE_FLAG_SUPPRESSNOTIFICATIONS, TABLE_FLAG_USEUNICODE,
    },
    xid::{Pcl, Xid},
};

use crate::{
    object::{
        ObjectType, RopObject,
        folder::{
            ACCESS_ALL, ACCESS_CONTENTS, ACCESS_FAI_CONTENTS, ACCESS_HIERARCHY, ACCESS_READ,
            FolderObject,
        },
        table::{TableObject, TableType},
    },
    op::{CreateFolderResponse, GhostServer, OpenFolderResponse, TableResponse},
    permission::{acting_user, effective_rights},
    session::SessionData,
};

pub const OPEN_FOLDER_FLAG_OPENSOFTDELETED: u8 = 0x04;

pub const DEL_MESSAGES: u8 = 0x01;
pub const DEL_FOLDERS: u8 = 0x04;
pub const DELETE_HARD_DELETE: u8 = 0x10;

const FOLDER_NAME_LIMIT: usize = 256;
const FOLDER_COMMENT_LIMIT: usize = 1024;
const FOLDER_MOVE_NAME_LIMIT: usize = 128;

impl SessionData {
    pub async fn rop_open_folder(
        &self,
        logon_id: u8,
        hin: u32,
        folder_id: Eid,
        open_flags: u8,
    ) -> trc::Result<OpenFolderResponse> {
        let logon = self.logon(logon_id)?;
        let parent = self.object(logon_id, hin)?;
        if !matches!(
            parent.object_type(),
            ObjectType::Logon | ObjectType::Folder
        ) {
            return Err(MapiEvent::NotSupported.into_err());
        }
        if !folder_id.is_local() {
            if logon.is_private() {
                return Err(MapiEvent::InvalidParam
                    .into_err()
                    .ctx(trc::Key::FolderId, folder_id.id()));
            }
            // Ghosted public folder; hand the client a referral
            let servers = self.server.replica_hosts(folder_id.replica_id());
            if servers.is_empty() {
                return Err(MapiEvent::Error
                    .into_err()
                    .details("no hosts known for replica")
                    .ctx(trc::Key::FolderId, folder_id.id()));
            }
            return Ok(OpenFolderResponse::Ghost(GhostServer { servers }));
        }
        let store = self.server.store();
        if !store.check_folder_id(logon.dir(), folder_id).await? {
            return Err(MapiEvent::NotFound.into_err());
        }
        if !logon.is_private()
            && store.check_folder_deleted(logon.dir(), folder_id).await?
            && open_flags & OPEN_FOLDER_FLAG_OPENSOFTDELETED == 0
        {
            return Err(MapiEvent::NotFound.into_err());
        }
        let folder_type = store
            .get_folder_property(logon.dir(), 0, folder_id, property::PR_FOLDER_TYPE)
            .await?
            .and_then(|value| value.as_u32())
            .and_then(FolderType::from_wire)
            .ok_or_else(|| MapiEvent::Error.into_err().details("folder type unreadable"))?;
        let tag_access = if logon.is_owner() {
            ACCESS_ALL
        } else {
            let rights = effective_rights(&store, &logon, folder_id).await?;
            if !rights.contains_any(
                Rights::from(Right::ReadAny)
                    .with_item(Right::Visible)
                    .with_item(Right::Owner),
            ) {
                /* same as exchange 2013, not AccessDenied */
                return Err(MapiEvent::NotFound.into_err());
            }
            if rights.contains(Right::Owner) {
                ACCESS_ALL
            } else {
                let mut tag_access = ACCESS_READ;
                if rights.contains(Right::Create) {
                    tag_access |= ACCESS_CONTENTS | ACCESS_FAI_CONTENTS;
                }
                if rights.contains(Right::CreateSubfolder) {
                    tag_access |= ACCESS_HIERARCHY;
                }
                tag_access
            }
        };
        let has_rules = store
            .get_folder_property(logon.dir(), 0, folder_id, property::PR_HAS_RULES)
            .await?
            .and_then(|value| value.as_bool())
            .unwrap_or(false);
        let handle = self.add_object(
            logon_id,
            hin,
            RopObject::Folder(FolderObject::new(folder_id, folder_type, tag_access)),
        )?;
        Ok(OpenFolderResponse::Opened { handle, has_rules })
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn rop_create_folder(
        &self,
        logon_id: u8,
        hin: u32,
        folder_type: FolderType,
        use_unicode: bool,
        open_existing: bool,
        name: &[u8],
        comment: &[u8],
    ) -> trc::Result<CreateFolderResponse> {
        if !matches!(folder_type, FolderType::Generic | FolderType::Search) {
            return Err(MapiEvent::InvalidParam.into_err());
        }
        let parent = self.folder(logon_id, hin)?;
        if !parent.folder_id.is_local() {
            return Err(MapiEvent::AccessDenied.into_err());
        }
        if parent.is_search() {
            return Err(MapiEvent::NotSupported.into_err());
        }
        let logon = self.logon(logon_id)?;
        if !logon.is_private() && folder_type == FolderType::Search {
            return Err(MapiEvent::NotSupported.into_err());
        }
        let folder_name = super::decode_wire_string(name, use_unicode, FOLDER_NAME_LIMIT)?;
        let folder_comment =
            super::decode_wire_string(comment, use_unicode, FOLDER_COMMENT_LIMIT)?;
        let store = self.server.store();
        if !logon.is_owner() {
            let rights = effective_rights(&store, &logon, parent.folder_id).await?;
            if !rights.contains_any(
                Rights::from(Right::Owner).with_item(Right::CreateSubfolder),
            ) {
                return Err(MapiEvent::AccessDenied.into_err());
            }
        }
        let folder_id = match store
            .get_folder_by_name(logon.dir(), parent.folder_id, &folder_name)
            .await?
        {
            Some(existing_id) => {
                let existing_type = store
                    .get_folder_property(logon.dir(), 0, existing_id, property::PR_FOLDER_TYPE)
                    .await?
                    .and_then(|value| value.as_u32())
                    .ok_or_else(|| {
                        MapiEvent::Error.into_err().details("folder type unreadable")
                    })?;
                if !open_existing || existing_type != folder_type as u32 {
                    return Err(MapiEvent::DuplicateName
                        .into_err()
                        .ctx(trc::Key::Name, folder_name));
                }
                existing_id
            }
            None => {
                let change_num = store.allocate_cn(logon.dir()).await?;
                let change_key = Xid::new(logon.mailbox_guid, change_num);
                let mut pcl = Pcl::new();
                pcl.append(change_key);
                let now = current_nt_time();
                let propvals = vec![
                    TaggedPropval::new(
                        property::PR_PARENT_FOLDER_ID,
                        PropValue::LongLong(parent.folder_id.id()),
                    ),
                    TaggedPropval::new(
                        property::PR_FOLDER_TYPE,
                        PropValue::Long(folder_type as u32),
                    ),
                    TaggedPropval::new(
                        property::PR_DISPLAY_NAME,
                        PropValue::Unicode(folder_name.clone()),
                    ),
                    TaggedPropval::new(
                        property::PR_COMMENT,
                        PropValue::Unicode(folder_comment),
                    ),
                    TaggedPropval::new(property::PR_CREATION_TIME, PropValue::SysTime(now)),
                    TaggedPropval::new(
                        property::PR_LAST_MODIFICATION_TIME,
                        PropValue::SysTime(now),
                    ),
                    TaggedPropval::new(
                        property::PR_CHANGE_NUMBER,
                        PropValue::LongLong(change_num.value()),
                    ),
                    TaggedPropval::new(
                        property::PR_CHANGE_KEY,
                        PropValue::Binary(change_key.to_change_key()),
                    ),
                    TaggedPropval::new(
                        property::PR_PREDECESSOR_CHANGE_LIST,
                        PropValue::Binary(pcl.serialize()),
                    ),
                ];
                let folder_id = store
                    .create_folder_by_properties(logon.dir(), self.cpid, propvals)
                    .await?
                    .ok_or_else(|| MapiEvent::Error.into_err().details("create failed"))?;
                if !logon.is_owner() {
                    // The creator gets a full-rights ACL row on their new
                    // folder inside someone else's mailbox
                    let row = PermissionData {
                        flags: PERMISSION_DATA_FLAG_ADD_ROW,
                        propvals: vec![
                            TaggedPropval::new(
                                property::PR_ENTRYID,
                                PropValue::Binary(logon.username.as_bytes().to_vec()),
                            ),
                            TaggedPropval::new(
                                property::PR_MEMBER_NAME,
                                PropValue::Unicode(logon.username.clone()),
                            ),
                            TaggedPropval::new(
                                property::PR_MEMBER_RIGHTS,
                                PropValue::Long(u64::from(Right::creator_rights()) as u32),
                            ),
                        ],
                    };
                    store
                        .update_folder_permission(logon.dir(), folder_id, false, vec![row])
                        .await?;
                }
                folder_id
            }
        };
        let handle = self.add_object(
            logon_id,
            hin,
            RopObject::Folder(FolderObject::new(folder_id, folder_type, ACCESS_ALL)),
        )?;
        Ok(CreateFolderResponse {
            handle,
            folder_id,
            is_existing: false,
        })
    }

    /// Delete a folder named by id; the input handle only scopes the
    /// logon. Returns the partial-completion flag.
    pub async fn rop_delete_folder(
        &self,
        logon_id: u8,
        hin: u32,
        flags: u8,
        folder_id: Eid,
    ) -> trc::Result<bool> {
        self.typed(logon_id, hin, ObjectType::Folder)?;
        let logon = self.logon(logon_id)?;
        if folder_is_reserved(&logon, folder_id) {
            return Err(MapiEvent::AccessDenied
                .into_err()
                .ctx(trc::Key::FolderId, folder_id.id()));
        }
        let store = self.server.store();
        let mut username = None;
        if !logon.is_owner() {
            let rights = effective_rights(&store, &logon, folder_id).await?;
            if !rights.contains(Right::Owner) {
                return Err(MapiEvent::AccessDenied.into_err());
            }
            username = Some(logon.username.as_str());
        }
        if !store.check_folder_id(logon.dir(), folder_id).await? {
            return Ok(false);
        }
        let normal = flags & DEL_MESSAGES != 0;
        let fai = normal;
        let sub = flags & DEL_FOLDERS != 0;
        let hard = flags & DELETE_HARD_DELETE != 0;
        let mut is_search = false;
        if logon.is_private() {
            match store
                .get_folder_property(logon.dir(), 0, folder_id, property::PR_FOLDER_TYPE)
                .await?
            {
                // Someone else removed it between the checks
                None => return Ok(false),
                Some(value) => {
                    is_search = value.as_u32() == Some(FolderType::Search as u32);
                }
            }
        }
        if !is_search && (sub || normal || fai) {
            let partial = store
                .empty_folder(
                    logon.dir(),
                    self.cpid,
                    username,
                    folder_id,
                    hard,
                    normal,
                    fai,
                    sub,
                )
                .await?;
            if partial {
                /* failure occurred, stop deleting the folder */
                return Ok(true);
            }
        }
        let done = store
            .delete_folder(logon.dir(), self.cpid, folder_id, hard)
            .await?;
        Ok(!done)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn rop_move_folder(
        &self,
        logon_id: u8,
        hsrc: u32,
        hdst: u32,
        use_unicode: bool,
        folder_id: Eid,
        new_name: &[u8],
    ) -> trc::Result<bool> {
        let src_parent = self.folder(logon_id, hsrc)?;
        let dst = self.folder(logon_id, hdst)?;
        if dst.is_search() {
            return Err(MapiEvent::NotSupported.into_err());
        }
        let logon = self.logon(logon_id)?;
        let new_name = super::decode_wire_string(new_name, use_unicode, FOLDER_MOVE_NAME_LIMIT)?;
        if folder_is_reserved(&logon, folder_id) {
            return Err(MapiEvent::AccessDenied.into_err());
        }
        let store = self.server.store();
        let guest = if logon.is_owner() {
            false
        } else {
            let rights = effective_rights(&store, &logon, folder_id).await?;
            if !rights.contains(Right::Owner) {
                return Err(MapiEvent::AccessDenied.into_err());
            }
            let rights = effective_rights(&store, &logon, dst.folder_id).await?;
            if !rights.contains_any(
                Rights::from(Right::Owner).with_item(Right::CreateSubfolder),
            ) {
                return Err(MapiEvent::AccessDenied.into_err());
            }
            true
        };
        if store
            .check_folder_cycle(logon.dir(), folder_id, dst.folder_id)
            .await?
        {
            return Err(MapiEvent::FolderCycle.into_err());
        }
        let change_num = store.allocate_cn(logon.dir()).await?;
        let mut pcl = store
            .get_folder_property(
                logon.dir(),
                0,
                folder_id,
                property::PR_PREDECESSOR_CHANGE_LIST,
            )
            .await?
            .as_ref()
            .and_then(|value| value.as_bytes())
            .and_then(Pcl::parse)
            .ok_or_else(|| MapiEvent::Error.into_err().details("PCL unreadable"))?;
        let change_key = Xid::new(logon.mailbox_guid, change_num);
        pcl.append(change_key);
        let result = store
            .movecopy_folder(
                logon.dir(),
                logon.account_id,
                self.cpid,
                guest,
                &logon.username,
                src_parent.folder_id,
                folder_id,
                dst.folder_id,
                &new_name,
                false,
            )
            .await?;
        if result.existed {
            return Err(MapiEvent::DuplicateName
                .into_err()
                .ctx(trc::Key::Name, new_name));
        }
        // Stamp the moved folder with its new change identity
        let propvals = vec![
            TaggedPropval::new(
                property::PR_CHANGE_NUMBER,
                PropValue::LongLong(change_num.value()),
            ),
            TaggedPropval::new(
                property::PR_CHANGE_KEY,
                PropValue::Binary(change_key.to_change_key()),
            ),
            TaggedPropval::new(
                property::PR_PREDECESSOR_CHANGE_LIST,
                PropValue::Binary(pcl.serialize()),
            ),
            TaggedPropval::new(
                property::PR_LAST_MODIFICATION_TIME,
                PropValue::SysTime(current_nt_time()),
            ),
        ];
        store
            .set_folder_properties(logon.dir(), 0, folder_id, propvals)
            .await?;
        Ok(result.partial)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn rop_copy_folder(
        &self,
        logon_id: u8,
        hsrc: u32,
        hdst: u32,
        use_unicode: bool,
        folder_id: Eid,
        new_name: &[u8],
    ) -> trc::Result<bool> {
        let src_parent = self.folder(logon_id, hsrc)?;
        let dst = self.folder(logon_id, hdst)?;
        if dst.is_search() {
            return Err(MapiEvent::NotSupported.into_err());
        }
        let logon = self.logon(logon_id)?;
        let new_name = super::decode_wire_string(new_name, use_unicode, FOLDER_MOVE_NAME_LIMIT)?;
        let root = if logon.is_private() {
            folder::PRIVATE_FID_ROOT
        } else {
            folder::PUBLIC_FID_ROOT
        };
        if folder_id.is_local() && folder_id.counter() == root {
            return Err(MapiEvent::AccessDenied.into_err());
        }
        let store = self.server.store();
        let guest = if logon.is_owner() {
            false
        } else {
            let rights = effective_rights(&store, &logon, folder_id).await?;
            if !rights.contains(Right::ReadAny) {
                return Err(MapiEvent::AccessDenied.into_err());
            }
            let rights = effective_rights(&store, &logon, dst.folder_id).await?;
            if !rights.contains_any(
                Rights::from(Right::Owner).with_item(Right::CreateSubfolder),
            ) {
                return Err(MapiEvent::AccessDenied.into_err());
            }
            true
        };
        if store
            .check_folder_cycle(logon.dir(), folder_id, dst.folder_id)
            .await?
        {
            return Err(MapiEvent::FolderCycle.into_err());
        }
        let result = store
            .movecopy_folder(
                logon.dir(),
                logon.account_id,
                self.cpid,
                guest,
                &logon.username,
                src_parent.folder_id,
                folder_id,
                dst.folder_id,
                &new_name,
                true,
            )
            .await?;
        if result.existed {
            return Err(MapiEvent::DuplicateName
                .into_err()
                .ctx(trc::Key::Name, new_name));
        }
        Ok(result.partial)
    }

    pub async fn rop_movecopy_messages(
        &self,
        logon_id: u8,
        hsrc: u32,
        hdst: u32,
        message_ids: &[Eid],
        want_copy: bool,
    ) -> trc::Result<bool> {
        if message_ids.is_empty() {
            return Ok(false);
        }
        let src = self.folder(logon_id, hsrc)?;
        let dst = self.folder(logon_id, hdst)?;
        if dst.is_search() {
            return Err(MapiEvent::NotSupported.into_err());
        }
        let logon = self.logon(logon_id)?;
        let store = self.server.store();
        let guest = if logon.is_owner() {
            false
        } else {
            let rights = effective_rights(&store, &logon, dst.folder_id).await?;
            if !rights.contains(Right::Create) {
                return Err(MapiEvent::AccessDenied.into_err());
            }
            true
        };
        store
            .movecopy_messages(
                logon.dir(),
                logon.account_id,
                self.cpid,
                guest,
                &logon.username,
                src.folder_id,
                dst.folder_id,
                want_copy,
                message_ids,
            )
            .await
    }

    pub async fn rop_empty_folder(
        &self,
        logon_id: u8,
        hin: u32,
        want_delete_associated: bool,
    ) -> trc::Result<bool> {
        self.empty_folder(logon_id, hin, false, want_delete_associated)
            .await
    }

    pub async fn rop_hard_delete_messages_and_subfolders(
        &self,
        logon_id: u8,
        hin: u32,
        want_delete_associated: bool,
    ) -> trc::Result<bool> {
        self.empty_folder(logon_id, hin, true, want_delete_associated)
            .await
    }

    async fn empty_folder(
        &self,
        logon_id: u8,
        hin: u32,
        hard: bool,
        want_delete_associated: bool,
    ) -> trc::Result<bool> {
        let target = self.folder(logon_id, hin)?;
        let logon = self.logon(logon_id)?;
        if !logon.is_private() {
            /* just like exchange 2013 or later */
            return Err(MapiEvent::NotSupported.into_err());
        }
        let counter = target.folder_id.counter();
        if target.folder_id.is_local()
            && (counter == folder::PRIVATE_FID_ROOT || counter == folder::PRIVATE_FID_IPMSUBTREE)
        {
            return Err(MapiEvent::AccessDenied.into_err());
        }
        let store = self.server.store();
        let mut username = None;
        if !logon.is_owner() {
            let rights = effective_rights(&store, &logon, target.folder_id).await?;
            if !rights.contains_any(
                Rights::from(Right::DeleteAny).with_item(Right::DeleteOwned),
            ) {
                return Err(MapiEvent::AccessDenied.into_err());
            }
            if !rights.contains(Right::DeleteAny) {
                // DeleteOwned only: the driver skips messages the
                // principal does not own and reports partial completion
                username = Some(logon.username.as_str());
            }
        }
        store
            .empty_folder(
                logon.dir(),
                self.cpid,
                username,
                target.folder_id,
                hard,
                true,
                want_delete_associated,
                true,
            )
            .await
    }

    pub async fn rop_delete_messages(
        &self,
        logon_id: u8,
        hin: u32,
        notify_non_read: bool,
        message_ids: &[Eid],
    ) -> trc::Result<bool> {
        self.delete_messages(logon_id, hin, false, notify_non_read, message_ids)
            .await
    }

    pub async fn rop_hard_delete_messages(
        &self,
        logon_id: u8,
        hin: u32,
        notify_non_read: bool,
        message_ids: &[Eid],
    ) -> trc::Result<bool> {
        self.delete_messages(logon_id, hin, true, notify_non_read, message_ids)
            .await
    }

    async fn delete_messages(
        &self,
        logon_id: u8,
        hin: u32,
        hard: bool,
        notify_non_read: bool,
        message_ids: &[Eid],
    ) -> trc::Result<bool> {
        let target = self.folder(logon_id, hin)?;
        let logon = self.logon(logon_id)?;
        let store = self.server.store();
        let username = if logon.is_owner() {
            None
        } else {
            let rights = effective_rights(&store, &logon, target.folder_id).await?;
            if rights.contains_any(Rights::from(Right::DeleteAny).with_item(Right::Owner)) {
                None
            } else if rights.contains(Right::DeleteOwned) {
                Some(logon.username.as_str())
            } else {
                return Err(MapiEvent::AccessDenied.into_err());
            }
        };
        if !notify_non_read {
            return store
                .delete_messages(
                    logon.dir(),
                    logon.account_id,
                    self.cpid,
                    username,
                    target.folder_id,
                    message_ids,
                    hard,
                )
                .await;
        }
        let mut partial = false;
        let mut deletable = Vec::with_capacity(message_ids.len());
        for &message_id in message_ids {
            if let Some(user) = username {
                if !store
                    .check_message_owner(logon.dir(), message_id, user)
                    .await?
                {
                    partial = true;
                    continue;
                }
            }
            let propvals = store
                .get_message_properties(
                    logon.dir(),
                    0,
                    message_id,
                    &[
                        property::PR_NON_RECEIPT_NOTIFICATION_REQUESTED,
                        property::PR_READ,
                    ],
                )
                .await?;
            let wants_receipt = propvals
                .get_value(property::PR_NON_RECEIPT_NOTIFICATION_REQUESTED)
                .and_then(|value| value.as_bool())
                .unwrap_or(false);
            let unread = !propvals
                .get_value(property::PR_READ)
                .and_then(|value| value.as_bool())
                .unwrap_or(false);
            let brief = if wants_receipt && unread {
                Some(
                    store
                        .get_message_brief(logon.dir(), self.cpid, message_id)
                        .await?
                        .ok_or_else(|| {
                            MapiEvent::Error.into_err().details("message brief unavailable")
                        })?,
                )
            } else {
                None
            };
            deletable.push(message_id);
            if let Some(brief) = brief {
                // The receipt must leave before the message does
                self.server.notify_delivery(DeliveryEvent::NonReadReceipt {
                    dir: logon.dir().to_string(),
                    brief,
                });
                trc::event!(
                    Session(trc::SessionEvent::NonReadReceipt),
                    SessionId = self.session_id,
                    MessageId = message_id.id(),
                );
            }
        }
        let batch_partial = store
            .delete_messages(
                logon.dir(),
                logon.account_id,
                self.cpid,
                username,
                target.folder_id,
                &deletable,
                hard,
            )
            .await?;
        Ok(partial || batch_partial)
    }

    pub async fn rop_get_hierarchy_table(
        &self,
        logon_id: u8,
        hin: u32,
        table_flags: u8,
    ) -> trc::Result<TableResponse> {
        if table_flags
            & !(TABLE_FLAG_DEPTH
                | TABLE_FLAG_DEFERREDERRORS
                | TABLE_FLAG_NONOTIFICATIONS
                | TABLE_FLAG_SOFTDELETES
                | TABLE_FLAG_USEUNICODE
                | TABLE_FLAG_SUPPRESSNOTIFICATIONS)
            != 0
        {
            return Err(MapiEvent::InvalidParam.into_err());
        }
        let logon = self.logon(logon_id)?;
        let target = self.folder(logon_id, hin)?;
        let store = self.server.store();
        let row_count = store
            .sum_hierarchy(
                logon.dir(),
                target.folder_id,
                acting_user(&logon),
                table_flags & TABLE_FLAG_DEPTH != 0,
            )
            .await?;
        let handle = self.add_object(
            logon_id,
            hin,
            RopObject::Table(TableObject::new(
                logon,
                target.folder_id,
                TableType::Hierarchy,
                table_flags,
                self.cpid,
            )),
        )?;
        Ok(TableResponse { handle, row_count })
    }

    pub async fn rop_get_contents_table(
        &self,
        logon_id: u8,
        hin: u32,
        table_flags: u8,
    ) -> trc::Result<TableResponse> {
        let logon = self.logon(logon_id)?;
        let target = self.folder(logon_id, hin)?;
        let conversation = if table_flags & TABLE_FLAG_CONVERSATIONMEMBERS != 0 {
            if logon.is_private() {
                // Private conversation views only exist on the root
                target.folder_id == Eid::local(folder::PRIVATE_FID_ROOT)
            } else {
                true
            }
        } else {
            false
        };
        if !conversation && table_flags & TABLE_FLAG_CONVERSATIONMEMBERS != 0 {
            return Err(MapiEvent::InvalidParam.into_err());
        }
        if table_flags & TABLE_FLAG_ASSOCIATED != 0
            && table_flags & TABLE_FLAG_CONVERSATIONMEMBERS != 0
        {
            return Err(MapiEvent::InvalidParam.into_err());
        }
        let store = self.server.store();
        let row_count = if conversation {
            /* arbitrary value; the real count appears once rows are queried */
            1
        } else {
            if !logon.is_owner() {
                let rights = effective_rights(&store, &logon, target.folder_id).await?;
                if !rights
                    .contains_any(Rights::from(Right::ReadAny).with_item(Right::Owner))
                {
                    return Err(MapiEvent::AccessDenied.into_err());
                }
            }
            store
                .sum_content(
                    logon.dir(),
                    target.folder_id,
                    table_flags & TABLE_FLAG_ASSOCIATED != 0,
                    table_flags & TABLE_FLAG_SOFTDELETES != 0,
                )
                .await?
        };
        let handle = self.add_object(
            logon_id,
            hin,
            RopObject::Table(TableObject::new(
                logon,
                target.folder_id,
                TableType::Content,
                table_flags,
                self.cpid,
            )),
        )?;
        Ok(TableResponse { handle, row_count })
    }
}

/// Well-known folders may not be deleted, renamed or moved.
fn folder_is_reserved(logon: &crate::logon::LogonObject, folder_id: Eid) -> bool {
    if logon.is_private() {
        folder_id.counter() < folder::PRIVATE_FID_CUSTOM
    } else {
        folder_id.is_local() && folder_id.counter() < folder::PUBLIC_FID_CUSTOM
    }
}

