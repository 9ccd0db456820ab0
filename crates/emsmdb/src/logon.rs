/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use types::{AccountId, xid::Guid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Private,
    Public,
}

/// How the acting principal relates to the mailbox. Owners skip ACL
/// evaluation entirely; delegates and guests are checked per folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogonMode {
    Owner,
    Delegate,
    Guest,
}

/// An authenticated mailbox session. One per logon slot, alive until the
/// client releases it or the session ends.
#[derive(Debug)]
pub struct LogonObject {
    pub kind: StoreKind,
    pub username: String,
    pub logon_mode: LogonMode,
    pub account_id: AccountId,
    pub dir: String,
    pub mailbox_guid: Guid,
}

impl LogonObject {
    pub fn new(
        kind: StoreKind,
        username: impl Into<String>,
        owner: bool,
        account_id: AccountId,
        dir: impl Into<String>,
    ) -> Self {
        let logon_mode = match kind {
            StoreKind::Private if owner => LogonMode::Owner,
            StoreKind::Private => LogonMode::Delegate,
            StoreKind::Public => LogonMode::Guest,
        };
        let mailbox_guid = match kind {
            StoreKind::Private => Guid::private_mailbox(account_id),
            StoreKind::Public => Guid::public_store(account_id),
        };
        LogonObject {
            kind,
            username: username.into(),
            logon_mode,
            account_id,
            dir: dir.into(),
            mailbox_guid,
        }
    }

    #[inline(always)]
    pub fn is_private(&self) -> bool {
        self.kind == StoreKind::Private
    }

    #[inline(always)]
    pub fn is_owner(&self) -> bool {
        self.logon_mode == LogonMode::Owner
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logon_mode_derivation() {
        let owner = LogonObject::new(StoreKind::Private, "ana", true, 7, "/var/mail/ana");
        assert_eq!(owner.logon_mode, LogonMode::Owner);
        assert!(owner.is_private());

        let delegate = LogonObject::new(StoreKind::Private, "bob", false, 7, "/var/mail/ana");
        assert_eq!(delegate.logon_mode, LogonMode::Delegate);

        let public = LogonObject::new(StoreKind::Public, "bob", true, 1, "/var/mail/public");
        assert_eq!(public.logon_mode, LogonMode::Guest);
        assert!(!public.is_private());
        assert_ne!(owner.mailbox_guid, public.mailbox_guid);
    }
}
