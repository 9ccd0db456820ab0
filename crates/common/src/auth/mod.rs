/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use types::AccountId;

/// The authenticated principal behind a session. Authentication itself
/// happens in the front end; verbs only consult the resolved identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub account_id: AccountId,
    pub name: String,
}

impl AccessToken {
    pub fn new(account_id: AccountId, name: impl Into<String>) -> Self {
        AccessToken {
            account_id,
            name: name.into(),
        }
    }
}
