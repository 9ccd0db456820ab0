/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use types::{folder::FolderType, id::Eid};

/// PR_ACCESS bits, frozen at open time.
pub const ACCESS_MODIFY: u32 = 0x01;
pub const ACCESS_READ: u32 = 0x02;
pub const ACCESS_DELETE: u32 = 0x04;
pub const ACCESS_HIERARCHY: u32 = 0x08;
pub const ACCESS_CONTENTS: u32 = 0x10;
pub const ACCESS_FAI_CONTENTS: u32 = 0x20;

pub const ACCESS_ALL: u32 = ACCESS_MODIFY
    | ACCESS_READ
    | ACCESS_DELETE
    | ACCESS_HIERARCHY
    | ACCESS_CONTENTS
    | ACCESS_FAI_CONTENTS;

/// An open folder. Holds identity and the rights snapshot taken by
/// OpenFolder; subfolders and messages live only in the store.
#[derive(Debug, Clone, Copy)]
pub struct FolderObject {
    pub folder_id: Eid,
    pub folder_type: FolderType,
    pub tag_access: u32,
}

impl FolderObject {
    pub fn new(folder_id: Eid, folder_type: FolderType, tag_access: u32) -> Self {
        FolderObject {
            folder_id,
            folder_type,
            tag_access,
        }
    }

    #[inline(always)]
    pub fn is_search(&self) -> bool {
        self.folder_type == FolderType::Search
    }
}
