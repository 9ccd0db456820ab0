/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use super::{Request, Response, RpcStore};
use crate::{LoadedTable, MoveCopyFolderResult, RowInstance};
use trc::StoreEvent;
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

fn unexpected(response: Response) -> trc::Error {
    trc::Error::from(StoreEvent::UnexpectedValue)
        .details("response type does not match the request")
        .reason(format!("{response:?}"))
}

impl RpcStore {
    pub async fn check_folder_id(&self, dir: &str, folder_id: Eid) -> trc::Result<bool> {
        match self
            .call(Request::CheckFolderId {
                dir: dir.into(),
                folder_id,
            })
            .await?
        {
            Response::Bool(value) => Ok(value),
            other => Err(unexpected(other)),
        }
    }

    pub async fn check_folder_deleted(&self, dir: &str, folder_id: Eid) -> trc::Result<bool> {
        match self
            .call(Request::CheckFolderDeleted {
                dir: dir.into(),
                folder_id,
            })
            .await?
        {
            Response::Bool(value) => Ok(value),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_folder_property(
        &self,
        dir: &str,
        cpid: Cpid,
        folder_id: Eid,
        tag: u32,
    ) -> trc::Result<Option<PropValue>> {
        match self
            .call(Request::GetFolderProperty {
                dir: dir.into(),
                cpid,
                folder_id,
                tag,
            })
            .await?
        {
            Response::OptValue(value) => Ok(value),
            other => Err(unexpected(other)),
        }
    }

    pub async fn set_folder_properties(
        &self,
        dir: &str,
        cpid: Cpid,
        folder_id: Eid,
        propvals: Vec<TaggedPropval>,
    ) -> trc::Result<Vec<PropertyProblem>> {
        match self
            .call(Request::SetFolderProperties {
                dir: dir.into(),
                cpid,
                folder_id,
                propvals,
            })
            .await?
        {
            Response::Problems(problems) => Ok(problems),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_folder_by_name(
        &self,
        dir: &str,
        parent_id: Eid,
        name: &str,
    ) -> trc::Result<Option<Eid>> {
        match self
            .call(Request::GetFolderByName {
                dir: dir.into(),
                parent_id,
                name: name.into(),
            })
            .await?
        {
            Response::OptEid(folder_id) => Ok(folder_id),
            other => Err(unexpected(other)),
        }
    }

    pub async fn allocate_cn(&self, dir: &str) -> trc::Result<Cn> {
        match self.call(Request::AllocateCn { dir: dir.into() }).await? {
            Response::Cn(cn) => Ok(cn),
            other => Err(unexpected(other)),
        }
    }

    pub async fn check_folder_permission(
        &self,
        dir: &str,
        folder_id: Eid,
        username: &str,
    ) -> trc::Result<Rights> {
        match self
            .call(Request::CheckFolderPermission {
                dir: dir.into(),
                folder_id,
                username: username.into(),
            })
            .await?
        {
            Response::Rights(rights) => Ok(Rights::from(rights)),
            other => Err(unexpected(other)),
        }
    }

    pub async fn check_folder_cycle(
        &self,
        dir: &str,
        src_fid: Eid,
        dst_fid: Eid,
    ) -> trc::Result<bool> {
        match self
            .call(Request::CheckFolderCycle {
                dir: dir.into(),
                src_fid,
                dst_fid,
            })
            .await?
        {
            Response::Bool(value) => Ok(value),
            other => Err(unexpected(other)),
        }
    }

    pub async fn create_folder_by_properties(
        &self,
        dir: &str,
        cpid: Cpid,
        propvals: Vec<TaggedPropval>,
    ) -> trc::Result<Option<Eid>> {
        match self
            .call(Request::CreateFolderByProperties {
                dir: dir.into(),
                cpid,
                propvals,
            })
            .await?
        {
            Response::OptEid(folder_id) => Ok(folder_id),
            other => Err(unexpected(other)),
        }
    }

    pub async fn delete_folder(
        &self,
        dir: &str,
        cpid: Cpid,
        folder_id: Eid,
        hard: bool,
    ) -> trc::Result<bool> {
        match self
            .call(Request::DeleteFolder {
                dir: dir.into(),
                cpid,
                folder_id,
                hard,
            })
            .await?
        {
            Response::Bool(done) => Ok(done),
            other => Err(unexpected(other)),
        }
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
        match self
            .call(Request::EmptyFolder {
                dir: dir.into(),
                cpid,
                username: username.map(Into::into),
                folder_id,
                hard,
                normal,
                fai,
                sub,
            })
            .await?
        {
            Response::Bool(partial) => Ok(partial),
            other => Err(unexpected(other)),
        }
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
        match self
            .call(Request::MoveCopyFolder {
                dir: dir.into(),
                account_id,
                cpid,
                guest,
                username: username.into(),
                src_parent_id,
                src_fid,
                dst_fid,
                new_name: new_name.into(),
                is_copy,
            })
            .await?
        {
            Response::MoveCopy(result) => Ok(result),
            other => Err(unexpected(other)),
        }
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
        match self
            .call(Request::MoveCopyMessages {
                dir: dir.into(),
                account_id,
                cpid,
                guest,
                username: username.into(),
                src_fid,
                dst_fid,
                is_copy,
                message_ids: message_ids.to_vec(),
            })
            .await?
        {
            Response::Bool(partial) => Ok(partial),
            other => Err(unexpected(other)),
        }
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
        match self
            .call(Request::DeleteMessages {
                dir: dir.into(),
                account_id,
                cpid,
                username: username.map(Into::into),
                folder_id,
                message_ids: message_ids.to_vec(),
                hard,
            })
            .await?
        {
            Response::Bool(partial) => Ok(partial),
            other => Err(unexpected(other)),
        }
    }

    pub async fn check_message_owner(
        &self,
        dir: &str,
        message_id: Eid,
        username: &str,
    ) -> trc::Result<bool> {
        match self
            .call(Request::CheckMessageOwner {
                dir: dir.into(),
                message_id,
                username: username.into(),
            })
            .await?
        {
            Response::Bool(owner) => Ok(owner),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_message_properties(
        &self,
        dir: &str,
        cpid: Cpid,
        message_id: Eid,
        tags: &[u32],
    ) -> trc::Result<Vec<TaggedPropval>> {
        match self
            .call(Request::GetMessageProperties {
                dir: dir.into(),
                cpid,
                message_id,
                tags: tags.to_vec(),
            })
            .await?
        {
            Response::Propvals(propvals) => Ok(propvals),
            other => Err(unexpected(other)),
        }
    }

    pub async fn set_message_properties(
        &self,
        dir: &str,
        cpid: Cpid,
        message_id: Eid,
        propvals: Vec<TaggedPropval>,
    ) -> trc::Result<Vec<PropertyProblem>> {
        match self
            .call(Request::SetMessageProperties {
                dir: dir.into(),
                cpid,
                message_id,
                propvals,
            })
            .await?
        {
            Response::Problems(problems) => Ok(problems),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_message_brief(
        &self,
        dir: &str,
        cpid: Cpid,
        message_id: Eid,
    ) -> trc::Result<Option<MessageBrief>> {
        match self
            .call(Request::GetMessageBrief {
                dir: dir.into(),
                cpid,
                message_id,
            })
            .await?
        {
            Response::Brief(brief) => Ok(brief),
            other => Err(unexpected(other)),
        }
    }

    pub async fn update_folder_permission(
        &self,
        dir: &str,
        folder_id: Eid,
        include_freebusy: bool,
        rows: Vec<PermissionData>,
    ) -> trc::Result<()> {
        match self
            .call(Request::UpdateFolderPermission {
                dir: dir.into(),
                folder_id,
                include_freebusy,
                rows,
            })
            .await?
        {
            Response::Unit => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn empty_folder_permission(&self, dir: &str, folder_id: Eid) -> trc::Result<()> {
        match self
            .call(Request::EmptyFolderPermission {
                dir: dir.into(),
                folder_id,
            })
            .await?
        {
            Response::Unit => Ok(()),
            other => Err(unexpected(other)),
        }
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
        match self
            .call(Request::SetSearchCriteria {
                dir: dir.into(),
                cpid,
                folder_id,
                flags,
                restriction,
                scope,
            })
            .await?
        {
            Response::Bool(accepted) => Ok(accepted),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_search_criteria(
        &self,
        dir: &str,
        folder_id: Eid,
    ) -> trc::Result<SearchCriteria> {
        match self
            .call(Request::GetSearchCriteria {
                dir: dir.into(),
                folder_id,
            })
            .await?
        {
            Response::Criteria(criteria) => Ok(*criteria),
            other => Err(unexpected(other)),
        }
    }

    pub async fn sum_hierarchy(
        &self,
        dir: &str,
        folder_id: Eid,
        username: Option<&str>,
        depth: bool,
    ) -> trc::Result<u32> {
        match self
            .call(Request::SumHierarchy {
                dir: dir.into(),
                folder_id,
                username: username.map(Into::into),
                depth,
            })
            .await?
        {
            Response::U32(count) => Ok(count),
            other => Err(unexpected(other)),
        }
    }

    pub async fn sum_content(
        &self,
        dir: &str,
        folder_id: Eid,
        fai: bool,
        deleted: bool,
    ) -> trc::Result<u32> {
        match self
            .call(Request::SumContent {
                dir: dir.into(),
                folder_id,
                fai,
                deleted,
            })
            .await?
        {
            Response::U32(count) => Ok(count),
            other => Err(unexpected(other)),
        }
    }

    pub async fn load_hierarchy_table(
        &self,
        dir: &str,
        folder_id: Eid,
        username: Option<&str>,
        table_flags: u8,
        restriction: Option<&Restriction>,
    ) -> trc::Result<LoadedTable> {
        match self
            .call(Request::LoadHierarchyTable {
                dir: dir.into(),
                folder_id,
                username: username.map(Into::into),
                table_flags,
                restriction: restriction.cloned(),
            })
            .await?
        {
            Response::Table(table) => Ok(table),
            other => Err(unexpected(other)),
        }
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
        match self
            .call(Request::LoadContentTable {
                dir: dir.into(),
                cpid,
                folder_id,
                username: username.map(Into::into),
                table_flags,
                restriction: restriction.cloned(),
                sorts: sorts.cloned(),
            })
            .await?
        {
            Response::Table(table) => Ok(table),
            other => Err(unexpected(other)),
        }
    }

    pub async fn load_permission_table(
        &self,
        dir: &str,
        folder_id: Eid,
        table_flags: u8,
    ) -> trc::Result<LoadedTable> {
        match self
            .call(Request::LoadPermissionTable {
                dir: dir.into(),
                folder_id,
                table_flags,
            })
            .await?
        {
            Response::Table(table) => Ok(table),
            other => Err(unexpected(other)),
        }
    }

    pub async fn load_rule_table(
        &self,
        dir: &str,
        folder_id: Eid,
        table_flags: u8,
    ) -> trc::Result<LoadedTable> {
        match self
            .call(Request::LoadRuleTable {
                dir: dir.into(),
                folder_id,
                table_flags,
            })
            .await?
        {
            Response::Table(table) => Ok(table),
            other => Err(unexpected(other)),
        }
    }

    pub async fn unload_table(&self, dir: &str, table_id: u32) -> trc::Result<()> {
        match self
            .call(Request::UnloadTable {
                dir: dir.into(),
                table_id,
            })
            .await?
        {
            Response::Unit => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn sum_table(&self, dir: &str, table_id: u32) -> trc::Result<u32> {
        match self
            .call(Request::SumTable {
                dir: dir.into(),
                table_id,
            })
            .await?
        {
            Response::U32(count) => Ok(count),
            other => Err(unexpected(other)),
        }
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
        match self
            .call(Request::QueryTable {
                dir: dir.into(),
                username: username.map(Into::into),
                cpid,
                table_id,
                proptags: proptags.to_vec(),
                start,
                count,
            })
            .await?
        {
            Response::Rows(rows) => Ok(rows),
            other => Err(unexpected(other)),
        }
    }

    pub async fn restrict_table(
        &self,
        dir: &str,
        table_id: u32,
        restriction: Option<&Restriction>,
    ) -> trc::Result<bool> {
        match self
            .call(Request::RestrictTable {
                dir: dir.into(),
                table_id,
                restriction: restriction.cloned(),
            })
            .await?
        {
            Response::Bool(accepted) => Ok(accepted),
            other => Err(unexpected(other)),
        }
    }

    pub async fn sort_table(
        &self,
        dir: &str,
        table_id: u32,
        sorts: &SortOrderSet,
    ) -> trc::Result<bool> {
        match self
            .call(Request::SortTable {
                dir: dir.into(),
                table_id,
                sorts: sorts.clone(),
            })
            .await?
        {
            Response::Bool(accepted) => Ok(accepted),
            other => Err(unexpected(other)),
        }
    }

    pub async fn mark_table(
        &self,
        dir: &str,
        table_id: u32,
        position: u32,
    ) -> trc::Result<Option<RowInstance>> {
        match self
            .call(Request::MarkTable {
                dir: dir.into(),
                table_id,
                position,
            })
            .await?
        {
            Response::Instance(instance) => Ok(instance),
            other => Err(unexpected(other)),
        }
    }

    pub async fn locate_table(
        &self,
        dir: &str,
        table_id: u32,
        instance: RowInstance,
    ) -> trc::Result<Option<u32>> {
        match self
            .call(Request::LocateTable {
                dir: dir.into(),
                table_id,
                instance,
            })
            .await?
        {
            Response::OptU32(position) => Ok(position),
            other => Err(unexpected(other)),
        }
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
        match self
            .call(Request::MatchTable {
                dir: dir.into(),
                cpid,
                table_id,
                forward,
                start,
                restriction: restriction.clone(),
            })
            .await?
        {
            Response::Match(found) => Ok(found),
            other => Err(unexpected(other)),
        }
    }
}
