/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod backend;
pub mod dispatch;
pub mod pool;

use std::sync::Arc;

use backend::{memory::MemoryStore, rpc::RpcStore};

/// Message store driver. All mailbox state lives behind this facade; the
/// object core never touches disk or the database layout directly.
#[derive(Clone, Default)]
pub enum Store {
    Rpc(Arc<RpcStore>),
    Memory(Arc<MemoryStore>),
    #[default]
    None,
}

/// Outcome of a folder move or copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MoveCopyFolderResult {
    /// The destination already had a child with the requested name.
    pub existed: bool,
    pub partial: bool,
}

/// Driver-side cursor handle plus the row count at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LoadedTable {
    pub table_id: u32,
    pub row_count: u32,
}

/// Position of one row, stable across cursor movement for bookmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct RowInstance {
    pub inst_id: u64,
    pub inst_num: u32,
}
