/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use trc::MapiEvent;
use types::{
    acl::{Right, Rights},
    id::Eid,
    restriction::Restriction,
    search::{
        SEARCH_FLAG_RECURSIVE, SEARCH_FLAG_RESTART, SEARCH_FLAG_SHALLOW, SEARCH_FLAG_STOP,
        SearchStatus,
    },
};

use crate::{
    op::GetSearchCriteriaResponse, permission::effective_rights, session::SessionData,
};

impl SessionData {
    pub async fn rop_set_search_criteria(
        &self,
        logon_id: u8,
        hin: u32,
        mut search_flags: u32,
        mut restriction: Option<Restriction>,
        folder_ids: Vec<Eid>,
    ) -> trc::Result<()> {
        if search_flags & (SEARCH_FLAG_RESTART | SEARCH_FLAG_STOP) == 0 {
            /* make the default search_flags */
            search_flags |= SEARCH_FLAG_STOP;
        }
        if search_flags & (SEARCH_FLAG_RECURSIVE | SEARCH_FLAG_SHALLOW) == 0 {
            /* make the default search_flags */
            search_flags |= SEARCH_FLAG_SHALLOW;
        }
        let logon = self.logon(logon_id)?;
        if !logon.is_private() {
            return Err(MapiEvent::NotSupported.into_err());
        }
        let target = self.folder(logon_id, hin)?;
        if !target.is_search() {
            return Err(MapiEvent::NotSearchFolder.into_err());
        }
        let store = self.server.store();
        if !logon.is_owner() {
            let rights = effective_rights(&store, &logon, target.folder_id).await?;
            if !rights.contains(Right::Owner) {
                return Err(MapiEvent::AccessDenied.into_err());
            }
        }
        if restriction.is_none() || folder_ids.is_empty() {
            let criteria = store
                .get_search_criteria(logon.dir(), target.folder_id)
                .await?;
            if criteria.status == SearchStatus::NotInitialized {
                return Err(MapiEvent::NotInitialized.into_err());
            }
            if search_flags & SEARCH_FLAG_RESTART == 0
                && restriction.is_none()
                && folder_ids.is_empty()
            {
                /* stopping a static search is meaningless, and a running
                   dynamic search cannot be changed */
                return Ok(());
            }
        }
        for &folder_id in &folder_ids {
            if !folder_id.is_local() {
                return Err(MapiEvent::SearchFolderScopeViolation
                    .into_err()
                    .ctx(trc::Key::FolderId, folder_id.id()));
            }
            if !logon.is_owner() {
                let rights = effective_rights(&store, &logon, folder_id).await?;
                if !rights.contains_any(Rights::from(Right::Owner).with_item(Right::ReadAny)) {
                    return Err(MapiEvent::AccessDenied.into_err());
                }
            }
        }
        if let Some(restriction) = restriction.as_mut() {
            restriction.convert_string_form(true);
        }
        if !store
            .set_search_criteria(
                logon.dir(),
                self.cpid,
                target.folder_id,
                search_flags,
                restriction,
                folder_ids,
            )
            .await?
        {
            return Err(MapiEvent::SearchFolderScopeViolation.into_err());
        }
        Ok(())
    }

    pub async fn rop_get_search_criteria(
        &self,
        logon_id: u8,
        hin: u32,
        use_unicode: bool,
        include_restriction: bool,
        include_folders: bool,
    ) -> trc::Result<GetSearchCriteriaResponse> {
        let logon = self.logon(logon_id)?;
        if !logon.is_private() {
            return Err(MapiEvent::NotSupported.into_err());
        }
        let target = self
            .object(logon_id, hin)?
            .as_folder()
            .copied()
            .ok_or_else(|| MapiEvent::NullObject.into_err())?;
        if target.folder_type != types::folder::FolderType::Search {
            return Err(MapiEvent::NotSearchFolder.into_err());
        }
        let criteria = self
            .server
            .store()
            .get_search_criteria(logon.dir(), target.folder_id)
            .await?;
        let mut restriction = if include_restriction {
            criteria.restriction
        } else {
            None
        };
        if !use_unicode {
            if let Some(restriction) = restriction.as_mut() {
                restriction.convert_string_form(false);
            }
        }
        Ok(GetSearchCriteriaResponse {
            search_flags: criteria.flags,
            search_status: criteria.status,
            restriction,
            folder_ids: if include_folders {
                criteria.scope
            } else {
                Vec::new()
            },
        })
    }
}
