/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::sync::Arc;

use trc::MapiEvent;
use types::{property::TaggedPropval, restriction::Restriction, table::SortOrderSet};

use crate::{
    object::{ObjectType, RopObject, table::TableType},
    session::SessionData,
};

impl SessionData {
    fn table(&self, logon_id: u8, hin: u32) -> trc::Result<Arc<RopObject>> {
        self.typed(logon_id, hin, ObjectType::Table)
    }

    pub async fn rop_set_columns(
        &self,
        logon_id: u8,
        hin: u32,
        proptags: Vec<u32>,
    ) -> trc::Result<()> {
        if proptags.is_empty() {
            return Err(MapiEvent::InvalidParam.into_err());
        }
        let object = self.table(logon_id, hin)?;
        let table = object
            .as_table()
            .ok_or_else(|| MapiEvent::NullObject.into_err())?;
        table.set_columns(proptags);
        Ok(())
    }

    pub async fn rop_sort_table(
        &self,
        logon_id: u8,
        hin: u32,
        sorts: SortOrderSet,
    ) -> trc::Result<()> {
        let object = self.table(logon_id, hin)?;
        let table = object
            .as_table()
            .ok_or_else(|| MapiEvent::NullObject.into_err())?;
        if table.table_type != TableType::Content {
            return Err(MapiEvent::NotSupported.into_err());
        }
        table.set_sorts(&self.server.store(), sorts).await
    }

    pub async fn rop_restrict(
        &self,
        logon_id: u8,
        hin: u32,
        restriction: Option<Restriction>,
    ) -> trc::Result<()> {
        let object = self.table(logon_id, hin)?;
        let table = object
            .as_table()
            .ok_or_else(|| MapiEvent::NullObject.into_err())?;
        if !matches!(
            table.table_type,
            TableType::Hierarchy | TableType::Content | TableType::Rule
        ) {
            return Err(MapiEvent::NotSupported.into_err());
        }
        table
            .set_restriction(&self.server.store(), restriction)
            .await
    }

    pub async fn rop_query_rows(
        &self,
        logon_id: u8,
        hin: u32,
        row_count: u16,
    ) -> trc::Result<Vec<Vec<TaggedPropval>>> {
        let object = self.table(logon_id, hin)?;
        let table = object
            .as_table()
            .ok_or_else(|| MapiEvent::NullObject.into_err())?;
        table
            .query_rows(&self.server.store(), row_count as u32)
            .await
    }

    /// Current cursor position and total row count.
    pub async fn rop_query_position(
        &self,
        logon_id: u8,
        hin: u32,
    ) -> trc::Result<(u32, u32)> {
        let object = self.table(logon_id, hin)?;
        let table = object
            .as_table()
            .ok_or_else(|| MapiEvent::NullObject.into_err())?;
        let total = table.get_total(&self.server.store()).await?;
        Ok((table.get_position(), total))
    }

    /// Move the cursor forward or backward, clamped at the table ends.
    /// Returns the signed number of rows actually moved.
    pub async fn rop_seek_row(
        &self,
        logon_id: u8,
        hin: u32,
        forward: bool,
        row_count: u32,
    ) -> trc::Result<i32> {
        let object = self.table(logon_id, hin)?;
        let table = object
            .as_table()
            .ok_or_else(|| MapiEvent::NullObject.into_err())?;
        table
            .seek_current(&self.server.store(), forward, row_count)
            .await
    }

    pub async fn rop_create_bookmark(&self, logon_id: u8, hin: u32) -> trc::Result<u32> {
        let object = self.table(logon_id, hin)?;
        let table = object
            .as_table()
            .ok_or_else(|| MapiEvent::NullObject.into_err())?;
        table.create_bookmark(&self.server.store()).await
    }

    pub async fn rop_free_bookmark(
        &self,
        logon_id: u8,
        hin: u32,
        bookmark: u32,
    ) -> trc::Result<()> {
        let object = self.table(logon_id, hin)?;
        let table = object
            .as_table()
            .ok_or_else(|| MapiEvent::NullObject.into_err())?;
        table.remove_bookmark(bookmark);
        Ok(())
    }

    /// Seek the cursor to a bookmark; reports whether the bookmarked row
    /// still exists.
    pub async fn rop_seek_row_bookmark(
        &self,
        logon_id: u8,
        hin: u32,
        bookmark: u32,
    ) -> trc::Result<bool> {
        let object = self.table(logon_id, hin)?;
        let table = object
            .as_table()
            .ok_or_else(|| MapiEvent::NullObject.into_err())?;
        table.retrieve_bookmark(&self.server.store(), bookmark).await
    }

    /// Find the first row matching a restriction, scanning from the
    /// cursor in either direction.
    pub async fn rop_find_row(
        &self,
        logon_id: u8,
        hin: u32,
        forward: bool,
        restriction: &Restriction,
    ) -> trc::Result<Option<(u32, Vec<TaggedPropval>)>> {
        let object = self.table(logon_id, hin)?;
        let table = object
            .as_table()
            .ok_or_else(|| MapiEvent::NullObject.into_err())?;
        table
            .match_row(&self.server.store(), forward, restriction)
            .await
    }
}
