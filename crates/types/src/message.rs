/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::id::Eid;

/// The subset of a message the delivery pipeline needs to build a
/// non-read receipt.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MessageBrief {
    pub message_id: Eid,
    pub parent_folder_id: Eid,
    pub sender: String,
    pub subject: String,
    pub delivery_time: u64,
}
