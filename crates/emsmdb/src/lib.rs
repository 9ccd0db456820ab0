/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod logon;
pub mod object;
pub mod op;
pub mod permission;
pub mod processor;
pub mod session;
