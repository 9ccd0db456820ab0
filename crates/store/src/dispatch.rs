/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{LoadedTable, MoveCopyFolderResult, RowInstance, Store};
use trc::{AddContext, StoreEvent};
use types::{
    AccountId, Cpid,
    acl::{PermissionData, Rights},
    id::{Cn, Eid},
    message::MessageBrief,
    property::{PropValue, PropertyProblem, TaggedPropval},
    restriction::Restriction,
    search::SearchCriteria,
    table::SortOrderSet,
};

/// One match arm per backend, as every other dispatch in this workspace.
/// The `None` store reports itself instead of panicking so a half
/// configured server degrades into failed verbs rather than aborts.
macro_rules! dispatch {
    ($self:expr, $op:ident($($arg:expr),*)) => {
        match $self {
            Store::Rpc(store) => store.$op($($arg),*).await,
            Store::Memory(store) => store.$op($($arg),*).await,
            Store::None => Err(StoreEvent::NotConfigured.into()),
        }
        .caused_by(trc::location!())
    };
}

impl Store {
    pub async fn check_folder_id(&self, dir: &str, folder_id: Eid) -> trc::Result<bool> {
        dispatch!(self, check_folder_id(dir, folder_id))
    }

    pub async fn check_folder_deleted(&self, dir: &str, folder_id: Eid) -> trc::Result<bool> {
        dispatch!(self, check_folder_deleted(dir, folder_id))
    }

    pub async fn get_folder_property(
        &self,
        dir: &str,
        cpid: Cpid,
        folder_id: Eid,
        tag: u32,
    ) -> trc::Result<Option<PropValue>> {
        dispatch!(self, get_folder_property(dir, cpid, folder_id, tag))
    }

    pub async fn set_folder_properties(
        &self,
        dir: &str,
        cpid: Cpid,
        folder_id: Eid,
        propvals: Vec<TaggedPropval>,
    ) -> trc::Result<Vec<PropertyProblem>> {
        dispatch!(self, set_folder_properties(dir, cpid, folder_id, propvals))
    }

    pub async fn get_folder_by_name(
        &self,
        dir: &str,
        parent_id: Eid,
        name: &str,
    ) -> trc::Result<Option<Eid>> {
        dispatch!(self, get_folder_by_name(dir, parent_id, name))
    }

    pub async fn allocate_cn(&self, dir: &str) -> trc::Result<Cn> {
        dispatch!(self, allocate_cn(dir))
    }

    pub async fn check_folder_permission(
        &self,
        dir: &str,
        folder_id: Eid,
        username: &str,
    ) -> trc::Result<Rights> {
        dispatch!(self, check_folder_permission(dir, folder_id, username))
    }

    pub async fn check_folder_cycle(
        &self,
        dir: &str,
        src_fid: Eid,
        dst_fid: Eid,
    ) -> trc::Result<bool> {
        dispatch!(self, check_folder_cycle(dir, src_fid, dst_fid))
    }

    pub async fn create_folder_by_properties(
        &self,
        dir: &str,
        cpid: Cpid,
        propvals: Vec<TaggedPropval>,
    ) -> trc::Result<Option<Eid>> {
        dispatch!(self, create_folder_by_properties(dir, cpid, propvals))
    }

    pub async fn delete_folder(
        &self,
        dir: &str,
        cpid: Cpid,
        folder_id: Eid,
        hard: bool,
    ) -> trc::Result<bool> {
        dispatch!(self, delete_folder(dir, cpid, folder_id, hard))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn empty_folder(
        &self,
        dir: &str,
        cpid: Cpid,
        username: Option<&str>,
        folder_id: Eid,
        hard: bool,
        normal: bool,
        fai: bool,
        sub: bool,
    ) -> trc::Result<bool> {
        dispatch!(
            self,
            empty_folder(dir, cpid, username, folder_id, hard, normal, fai, sub)
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn movecopy_folder(
        &self,
        dir: &str,
        account_id: AccountId,
        cpid: Cpid,
        guest: bool,
        username: &str,
        src_parent_id: Eid,
        src_fid: Eid,
        dst_fid: Eid,
        new_name: &str,
        is_copy: bool,
    ) -> trc::Result<MoveCopyFolderResult> {
        dispatch!(
            self,
            movecopy_folder(
                dir,
                account_id,
                cpid,
                guest,
                username,
                src_parent_id,
                src_fid,
                dst_fid,
                new_name,
                is_copy
            )
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn movecopy_messages(
        &self,
        dir: &str,
        account_id: AccountId,
        cpid: Cpid,
        guest: bool,
        username: &str,
        src_fid: Eid,
        dst_fid: Eid,
        is_copy: bool,
        message_ids: &[Eid],
    ) -> trc::Result<bool> {
        dispatch!(
            self,
            movecopy_messages(
                dir,
                account_id,
                cpid,
                guest,
                username,
                src_fid,
                dst_fid,
                is_copy,
                message_ids
            )
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn delete_messages(
        &self,
        dir: &str,
        account_id: AccountId,
        cpid: Cpid,
        username: Option<&str>,
        folder_id: Eid,
        message_ids: &[Eid],
        hard: bool,
    ) -> trc::Result<bool> {
        dispatch!(
            self,
            delete_messages(dir, account_id, cpid, username, folder_id, message_ids, hard)
        )
    }

    pub async fn check_message_owner(
        &self,
        dir: &str,
        message_id: Eid,
        username: &str,
    ) -> trc::Result<bool> {
        dispatch!(self, check_message_owner(dir, message_id, username))
    }

    pub async fn get_message_properties(
        &self,
        dir: &str,
        cpid: Cpid,
        message_id: Eid,
        tags: &[u32],
    ) -> trc::Result<Vec<TaggedPropval>> {
        dispatch!(self, get_message_properties(dir, cpid, message_id, tags))
    }

    pub async fn set_message_properties(
        &self,
        dir: &str,
        cpid: Cpid,
        message_id: Eid,
        propvals: Vec<TaggedPropval>,
    ) -> trc::Result<Vec<PropertyProblem>> {
        dispatch!(self, set_message_properties(dir, cpid, message_id, propvals))
    }

    pub async fn get_message_brief(
        &self,
        dir: &str,
        cpid: Cpid,
        message_id: Eid,
    ) -> trc::Result<Option<MessageBrief>> {
        dispatch!(self, get_message_brief(dir, cpid, message_id))
    }

    pub async fn update_folder_permission(
        &self,
        dir: &str,
        folder_id: Eid,
        include_freebusy: bool,
        rows: Vec<PermissionData>,
    ) -> trc::Result<()> {
        dispatch!(
            self,
            update_folder_permission(dir, folder_id, include_freebusy, rows)
        )
    }

    pub async fn empty_folder_permission(&self, dir: &str, folder_id: Eid) -> trc::Result<()> {
        dispatch!(self, empty_folder_permission(dir, folder_id))
    }

    pub async fn set_search_criteria(
        &self,
        dir: &str,
        cpid: Cpid,
        folder_id: Eid,
        flags: u32,
        restriction: Option<Restriction>,
        scope: Vec<Eid>,
    ) -> trc::Result<bool> {
        dispatch!(
            self,
            set_search_criteria(dir, cpid, folder_id, flags, restriction, scope)
        )
    }

    pub async fn get_search_criteria(
        &self,
        dir: &str,
        folder_id: Eid,
    ) -> trc::Result<SearchCriteria> {
        dispatch!(self, get_search_criteria(dir, folder_id))
    }

    pub async fn sum_hierarchy(
        &self,
        dir: &str,
        folder_id: Eid,
        username: Option<&str>,
        depth: bool,
    ) -> trc::Result<u32> {
        dispatch!(self, sum_hierarchy(dir, folder_id, username, depth))
    }

    pub async fn sum_content(
        &self,
        dir: &str,
        folder_id: Eid,
        fai: bool,
        deleted: bool,
    ) -> trc::Result<u32> {
        dispatch!(self, sum_content(dir, folder_id, fai, deleted))
    }

    pub async fn load_hierarchy_table(
        &self,
        dir: &str,
        folder_id: Eid,
        username: Option<&str>,
        table_flags: u8,
        restriction: Option<&Restriction>,
    ) -> trc::Result<LoadedTable> {
        dispatch!(
            self,
            load_hierarchy_table(dir, folder_id, username, table_flags, restriction)
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn load_content_table(
        &self,
        dir: &str,
        cpid: Cpid,
        folder_id: Eid,
        username: Option<&str>,
        table_flags: u8,
        restriction: Option<&Restriction>,
        sorts: Option<&SortOrderSet>,
    ) -> trc::Result<LoadedTable> {
        dispatch!(
            self,
            load_content_table(dir, cpid, folder_id, username, table_flags, restriction, sorts)
        )
    }

    pub async fn load_permission_table(
        &self,
        dir: &str,
        folder_id: Eid,
        table_flags: u8,
    ) -> trc::Result<LoadedTable> {
        dispatch!(self, load_permission_table(dir, folder_id, table_flags))
    }

    pub async fn load_rule_table(
        &self,
        dir: &str,
        folder_id: Eid,
        table_flags: u8,
    ) -> trc::Result<LoadedTable> {
        dispatch!(self, load_rule_table(dir, folder_id, table_flags))
    }

    pub async fn unload_table(&self, dir: &str, table_id: u32) -> trc::Result<()> {
        dispatch!(self, unload_table(dir, table_id))
    }

    pub async fn sum_table(&self, dir: &str, table_id: u32) -> trc::Result<u32> {
        dispatch!(self, sum_table(dir, table_id))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn query_table(
        &self,
        dir: &str,
        username: Option<&str>,
        cpid: Cpid,
        table_id: u32,
        proptags: &[u32],
        start: u32,
        count: u32,
    ) -> trc::Result<Vec<Vec<TaggedPropval>>> {
        dispatch!(
            self,
            query_table(dir, username, cpid, table_id, proptags, start, count)
        )
    }

    pub async fn restrict_table(
        &self,
        dir: &str,
        table_id: u32,
        restriction: Option<&Restriction>,
    ) -> trc::Result<bool> {
        dispatch!(self, restrict_table(dir, table_id, restriction))
    }

    pub async fn sort_table(
        &self,
        dir: &str,
        table_id: u32,
        sorts: &SortOrderSet,
    ) -> trc::Result<bool> {
        dispatch!(self, sort_table(dir, table_id, sorts))
    }

    pub async fn mark_table(
        &self,
        dir: &str,
        table_id: u32,
        position: u32,
    ) -> trc::Result<Option<RowInstance>> {
        dispatch!(self, mark_table(dir, table_id, position))
    }

    pub async fn locate_table(
        &self,
        dir: &str,
        table_id: u32,
        instance: RowInstance,
    ) -> trc::Result<Option<u32>> {
        dispatch!(self, locate_table(dir, table_id, instance))
    }

    pub async fn match_table(
        &self,
        dir: &str,
        cpid: Cpid,
        table_id: u32,
        forward: bool,
        start: u32,
        restriction: &Restriction,
    ) -> trc::Result<Option<(u32, Vec<TaggedPropval>)>> {
        dispatch!(
            self,
            match_table(dir, cpid, table_id, forward, start, restriction)
        )
    }
}
