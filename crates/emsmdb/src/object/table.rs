/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::sync::Arc;

use parking_lot::Mutex;
use store::{LoadedTable, RowInstance, Store};
use trc::MapiEvent;
use types::{
    Cpid,
    id::Eid,
    property::{self, TaggedPropval},
    restriction::Restriction,
    table::SortOrderSet,
};

use crate::logon::LogonObject;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableType {
    Hierarchy,
    Content,
    Permission,
    Rule,
    Attachment,
    Recipient,
    Container,
    User,
}

/// Columnar view over driver-side rows. The object owns only cursor,
/// column/restriction/sort state and bookmarks; rows stay behind the
/// driver table id until queried.
pub struct TableObject {
    pub logon: Arc<LogonObject>,
    pub folder_id: Eid,
    pub table_type: TableType,
    pub table_flags: u8,
    pub cpid: Cpid,
    state: Mutex<TableState>,
}

#[derive(Default)]
struct TableState {
    position: u32,
    columns: Option<Vec<u32>>,
    sorts: Option<SortOrderSet>,
    restriction: Option<Restriction>,
    bookmarks: Vec<Bookmark>,
    next_bookmark: u32,
    loaded: Option<LoadedTable>,
}

struct Bookmark {
    index: u32,
    instance: RowInstance,
    position: u32,
}

impl TableObject {
    pub fn new(
        logon: Arc<LogonObject>,
        folder_id: Eid,
        table_type: TableType,
        table_flags: u8,
        cpid: Cpid,
    ) -> Self {
        TableObject {
            logon,
            folder_id,
            table_type,
            table_flags,
            cpid,
            state: Mutex::new(TableState::default()),
        }
    }

    fn acting_user(&self) -> Option<&str> {
        if self.logon.is_owner() {
            None
        } else {
            Some(self.logon.username.as_str())
        }
    }

    /// Load the driver-side table on first use. State is snapshotted
    /// before the driver call; the lock is never held across an await.
    pub async fn check_load(&self, store: &Store) -> trc::Result<LoadedTable> {
        let (loaded, restriction, sorts) = {
            let state = self.state.lock();
            (
                state.loaded,
                state.restriction.clone(),
                state.sorts.clone(),
            )
        };
        if let Some(loaded) = loaded {
            return Ok(loaded);
        }
        let dir = self.logon.dir();
        let loaded = match self.table_type {
            TableType::Hierarchy => {
                store
                    .load_hierarchy_table(
                        dir,
                        self.folder_id,
                        self.acting_user(),
                        self.table_flags,
                        restriction.as_ref(),
                    )
                    .await?
            }
            TableType::Content => {
                store
                    .load_content_table(
                        dir,
                        self.cpid,
                        self.folder_id,
                        self.acting_user(),
                        self.table_flags,
                        restriction.as_ref(),
                        sorts.as_ref(),
                    )
                    .await?
            }
            TableType::Permission => {
                store
                    .load_permission_table(dir, self.folder_id, self.table_flags)
                    .await?
            }
            TableType::Rule => {
                store
                    .load_rule_table(dir, self.folder_id, self.table_flags)
                    .await?
            }
            _ => {
                return Err(MapiEvent::NotSupported
                    .into_err()
                    .details("table type not backed by a folder"));
            }
        };
        self.state.lock().loaded = Some(loaded);
        Ok(loaded)
    }

    pub async fn unload(&self, store: &Store) -> trc::Result<()> {
        let loaded = self.state.lock().loaded.take();
        if let Some(loaded) = loaded {
            store.unload_table(self.logon.dir(), loaded.table_id).await?;
        }
        Ok(())
    }

    pub fn set_columns(&self, columns: Vec<u32>) {
        self.state.lock().columns = Some(columns);
    }

    pub fn columns(&self) -> Option<Vec<u32>> {
        self.state.lock().columns.clone()
    }

    /// Changing the sort order invalidates the driver rows; the table is
    /// reloaded lazily with the new order.
    pub async fn set_sorts(&self, store: &Store, sorts: SortOrderSet) -> trc::Result<()> {
        self.unload(store).await?;
        let mut state = self.state.lock();
        state.sorts = Some(sorts);
        state.position = 0;
        Ok(())
    }

    pub async fn set_restriction(
        &self,
        store: &Store,
        restriction: Option<Restriction>,
    ) -> trc::Result<()> {
        self.unload(store).await?;
        let mut state = self.state.lock();
        state.restriction = restriction;
        state.position = 0;
        Ok(())
    }

    pub async fn query_rows(
        &self,
        store: &Store,
        count: u32,
    ) -> trc::Result<Vec<Vec<TaggedPropval>>> {
        let loaded = self.check_load(store).await?;
        let (position, columns) = {
            let state = self.state.lock();
            (
                state.position,
                state
                    .columns
                    .clone()
                    .unwrap_or_else(|| default_columns(self.table_type)),
            )
        };
        let rows = store
            .query_table(
                self.logon.dir(),
                self.acting_user(),
                self.cpid,
                loaded.table_id,
                &columns,
                position,
                count,
            )
            .await?;
        self.state.lock().position = position + rows.len() as u32;
        Ok(rows)
    }

    /// Move the cursor by `count` rows, clamping at both ends. Returns the
    /// number of rows actually moved, negative when seeking backwards.
    pub async fn seek_current(
        &self,
        store: &Store,
        forward: bool,
        count: u32,
    ) -> trc::Result<i32> {
        let loaded = self.check_load(store).await?;
        let total = store.sum_table(self.logon.dir(), loaded.table_id).await?;
        let mut state = self.state.lock();
        let old = state.position.min(total);
        let new = if forward {
            old.saturating_add(count).min(total)
        } else {
            old.saturating_sub(count)
        };
        state.position = new;
        Ok(new as i32 - old as i32)
    }

    pub fn get_position(&self) -> u32 {
        self.state.lock().position
    }

    pub fn set_position(&self, position: u32) {
        self.state.lock().position = position;
    }

    pub async fn get_total(&self, store: &Store) -> trc::Result<u32> {
        let loaded = self.check_load(store).await?;
        store.sum_table(self.logon.dir(), loaded.table_id).await
    }

    pub async fn create_bookmark(&self, store: &Store) -> trc::Result<u32> {
        let loaded = self.check_load(store).await?;
        let position = self.get_position();
        let instance = store
            .mark_table(self.logon.dir(), loaded.table_id, position)
            .await?
            .ok_or_else(|| {
                MapiEvent::Error
                    .into_err()
                    .details("cursor is past the last row")
            })?;
        let mut state = self.state.lock();
        let index = state.next_bookmark;
        state.next_bookmark += 1;
        state.bookmarks.push(Bookmark {
            index,
            instance,
            position,
        });
        Ok(index)
    }

    pub fn remove_bookmark(&self, index: u32) {
        self.state
            .lock()
            .bookmarks
            .retain(|bookmark| bookmark.index != index);
    }

    /// Seek to a bookmark. Returns whether the bookmarked row still
    /// exists; if it vanished the cursor lands on the remembered
    /// position, and retrieving again reports the same.
    pub async fn retrieve_bookmark(&self, store: &Store, index: u32) -> trc::Result<bool> {
        let loaded = self.check_load(store).await?;
        let (instance, fallback) = {
            let state = self.state.lock();
            let bookmark = state
                .bookmarks
                .iter()
                .find(|bookmark| bookmark.index == index)
                .ok_or_else(|| {
                    MapiEvent::InvalidParam.into_err().details("unknown bookmark")
                })?;
            (bookmark.instance, bookmark.position)
        };
        match store
            .locate_table(self.logon.dir(), loaded.table_id, instance)
            .await?
        {
            Some(position) => {
                self.state.lock().position = position;
                Ok(true)
            }
            None => {
                self.state.lock().position = fallback;
                Ok(false)
            }
        }
    }

    /// Scan from the cursor for the first row matching the restriction.
    /// The cursor itself does not move.
    pub async fn match_row(
        &self,
        store: &Store,
        forward: bool,
        restriction: &Restriction,
    ) -> trc::Result<Option<(u32, Vec<TaggedPropval>)>> {
        let loaded = self.check_load(store).await?;
        let position = self.get_position();
        store
            .match_table(
                self.logon.dir(),
                self.cpid,
                loaded.table_id,
                forward,
                position,
                restriction,
            )
            .await
    }
}

fn default_columns(table_type: TableType) -> Vec<u32> {
    match table_type {
        TableType::Hierarchy => vec![
            property::PR_FOLDER_ID,
            property::PR_DISPLAY_NAME,
            property::PR_FOLDER_TYPE,
        ],
        TableType::Content => vec![property::PR_MID, property::PR_SUBJECT, property::PR_READ],
        TableType::Permission => vec![
            property::PR_MEMBER_ID,
            property::PR_MEMBER_NAME,
            property::PR_MEMBER_RIGHTS,
        ],
        _ => Vec::new(),
    }
}
