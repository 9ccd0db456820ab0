/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{id::Eid, restriction::Restriction};

pub const SEARCH_FLAG_STOP: u32 = 0x0000_0001;
pub const SEARCH_FLAG_RESTART: u32 = 0x0000_0002;
pub const SEARCH_FLAG_RECURSIVE: u32 = 0x0000_0004;
pub const SEARCH_FLAG_SHALLOW: u32 = 0x0000_0008;
pub const SEARCH_FLAG_FOREGROUND: u32 = 0x0000_0010;
pub const SEARCH_FLAG_CONTENT_INDEXED: u32 = 0x0001_0000;
pub const SEARCH_FLAG_NON_CONTENT_INDEXED: u32 = 0x0002_0000;
pub const SEARCH_FLAG_STATIC: u32 = 0x0004_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SearchStatus {
    NotInitialized,
    Stopped,
    Running,
    Complete,
}

/// Criteria of a search folder as held by the store.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SearchCriteria {
    pub status: SearchStatus,
    pub flags: u32,
    pub restriction: Option<Restriction>,
    pub scope: Vec<Eid>,
}

impl SearchCriteria {
    pub fn uninitialized() -> Self {
        SearchCriteria {
            status: SearchStatus::NotInitialized,
            flags: 0,
            restriction: None,
            scope: Vec::new(),
        }
    }
}
