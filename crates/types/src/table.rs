/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

/// Table open flags. Conversation views and FAI selection are mutually
/// exclusive; the verb layer enforces that.
pub const TABLE_FLAG_CONVERSATIONMEMBERS: u8 = 0x01;
pub const TABLE_FLAG_ASSOCIATED: u8 = 0x02;
pub const TABLE_FLAG_DEPTH: u8 = 0x04;
pub const TABLE_FLAG_DEFERREDERRORS: u8 = 0x08;
pub const TABLE_FLAG_NONOTIFICATIONS: u8 = 0x10;
pub const TABLE_FLAG_SOFTDELETES: u8 = 0x20;
pub const TABLE_FLAG_USEUNICODE: u8 = 0x40;
pub const TABLE_FLAG_SUPPRESSNOTIFICATIONS: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SortOrder {
    pub proptag: u32,
    pub ascending: bool,
}

pub type SortOrderSet = Vec<SortOrder>;
