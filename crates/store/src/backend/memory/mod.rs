/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod tables;

use crate::{MoveCopyFolderResult, Store};
use ahash::AHashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use trc::StoreEvent;
use types::{
    AccountId, Cpid, current_nt_time,
    acl::{
        PERMISSION_DATA_FLAG_ADD_ROW, PERMISSION_DATA_FLAG_MODIFY_ROW,
        PERMISSION_DATA_FLAG_REMOVE_ROW, PermissionData, Rights,
    },
    folder::{self, FolderType},
    id::{Cn, Eid},
    message::MessageBrief,
    property::{self, PropValue, PropertyProblem, PropvalList, TaggedPropval},
    restriction::Restriction,
    search::{
        SEARCH_FLAG_STOP, SearchCriteria, SearchStatus,
    },
    xid::Guid,
};

/// In-process driver backend. Holds every mailbox behind one lock; good
/// enough for the test suite and single-node setups, never meant to scale.
#[derive(Default)]
pub struct MemoryStore {
    pub(crate) mailboxes: Mutex<AHashMap<String, Mailbox>>,
}

pub(crate) struct Mailbox {
    pub account_id: AccountId,
    pub private: bool,
    pub guid: Guid,
    pub next_cn: u64,
    pub next_eid: u64,
    pub next_table_id: u32,
    pub folders: AHashMap<Eid, FolderData>,
    pub messages: AHashMap<Eid, MessageData>,
    pub tables: AHashMap<u32, tables::TableData>,
}

/// Identity of a provisioned mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxInfo {
    pub account_id: AccountId,
    pub private: bool,
    pub guid: Guid,
}

#[derive(Default)]
pub(crate) struct FolderData {
    pub parent: Option<Eid>,
    pub props: AHashMap<u32, PropValue>,
    pub acl: Vec<AclRow>,
    pub search: Option<SearchCriteria>,
    pub soft_deleted: bool,
}

pub(crate) struct AclRow {
    pub member_id: u64,
    pub username: String,
    pub rights: Rights,
}

pub(crate) struct MessageData {
    pub parent: Eid,
    pub owner: String,
    pub fai: bool,
    pub soft_deleted: bool,
    pub props: AHashMap<u32, PropValue>,
}

const SYSTEM_PRIVATE: &[(u64, &str)] = &[
    (folder::PRIVATE_FID_ROOT, "Root Container"),
    (folder::PRIVATE_FID_DEFERRED_ACTION, "Deferred Action"),
    (folder::PRIVATE_FID_SPOOLER_QUEUE, "Spooler Queue"),
    (folder::PRIVATE_FID_SHORTCUTS, "Shortcuts"),
    (folder::PRIVATE_FID_FINDER, "Finder"),
    (folder::PRIVATE_FID_VIEWS, "Views"),
    (folder::PRIVATE_FID_COMMON_VIEWS, "Common Views"),
    (folder::PRIVATE_FID_SCHEDULE, "Schedule"),
    (folder::PRIVATE_FID_IPMSUBTREE, "Top of Information Store"),
    (folder::PRIVATE_FID_SENT_ITEMS, "Sent Items"),
    (folder::PRIVATE_FID_DELETED_ITEMS, "Deleted Items"),
    (folder::PRIVATE_FID_OUTBOX, "Outbox"),
    (folder::PRIVATE_FID_INBOX, "Inbox"),
    (folder::PRIVATE_FID_DRAFT, "Drafts"),
    (folder::PRIVATE_FID_CALENDAR, "Calendar"),
    (folder::PRIVATE_FID_JOURNAL, "Journal"),
    (folder::PRIVATE_FID_NOTES, "Notes"),
    (folder::PRIVATE_FID_TASKS, "Tasks"),
    (folder::PRIVATE_FID_CONTACTS, "Contacts"),
    (folder::PRIVATE_FID_QUICKCONTACTS, "Quick Contacts"),
    (folder::PRIVATE_FID_JUNK, "Junk E-mail"),
    (
        folder::PRIVATE_FID_CONVERSATION_ACTION_SETTINGS,
        "Conversation Action Settings",
    ),
];

const SYSTEM_PUBLIC: &[(u64, &str)] = &[
    (folder::PUBLIC_FID_ROOT, "Public Root"),
    (folder::PUBLIC_FID_IPMSUBTREE, "IPM_SUBTREE"),
    (folder::PUBLIC_FID_NONIPMSUBTREE, "NON_IPM_SUBTREE"),
    (folder::PUBLIC_FID_EFORMSREGISTRY, "EFORMS REGISTRY"),
];

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn into_store(self: Arc<Self>) -> Store {
        Store::Memory(self)
    }

    /// Provision a mailbox with its system folder tree.
    pub fn create_mailbox(&self, dir: &str, account_id: AccountId, private: bool) {
        let mut mailboxes = self.mailboxes.lock();
        let guid = if private {
            Guid::private_mailbox(account_id)
        } else {
            Guid::public_store(account_id)
        };
        let mut mailbox = Mailbox {
            account_id,
            private,
            guid,
            next_cn: 1,
            next_eid: if private {
                folder::PRIVATE_FID_CUSTOM
            } else {
                folder::PUBLIC_FID_CUSTOM
            },
            next_table_id: 1,
            folders: AHashMap::new(),
            messages: AHashMap::new(),
            tables: AHashMap::new(),
        };
        let system = if private { SYSTEM_PRIVATE } else { SYSTEM_PUBLIC };
        let root = if private {
            folder::PRIVATE_FID_ROOT
        } else {
            folder::PUBLIC_FID_ROOT
        };
        let subtree_parent = if private {
            folder::PRIVATE_FID_IPMSUBTREE
        } else {
            folder::PUBLIC_FID_IPMSUBTREE
        };
        let now = current_nt_time();
        for &(counter, name) in system {
            let parent = match counter {
                c if c == root => None,
                // User-visible defaults hang off the IPM subtree
                c if private
                    && (folder::PRIVATE_FID_SENT_ITEMS..=folder::PRIVATE_FID_CONVERSATION_ACTION_SETTINGS)
                        .contains(&c) =>
                {
                    Some(Eid::local(subtree_parent))
                }
                _ => Some(Eid::local(root)),
            };
            let mut props = AHashMap::new();
            props.insert(
                property::PR_DISPLAY_NAME,
                PropValue::Unicode(name.to_string()),
            );
            props.insert(
                property::PR_FOLDER_TYPE,
                PropValue::Long(FolderType::Generic as u32),
            );
            props.insert(property::PR_CREATION_TIME, PropValue::SysTime(now));
            props.insert(property::PR_LAST_MODIFICATION_TIME, PropValue::SysTime(now));
            mailbox.folders.insert(
                Eid::local(counter),
                FolderData {
                    parent,
                    props,
                    acl: Vec::new(),
                    search: None,
                    soft_deleted: false,
                },
            );
        }
        mailboxes.insert(dir.to_string(), mailbox);
    }

    /// Ingest surface used by delivery and the tests.
    pub fn create_message(
        &self,
        dir: &str,
        folder_id: Eid,
        owner: &str,
        fai: bool,
        propvals: Vec<TaggedPropval>,
    ) -> Option<Eid> {
        let mut mailboxes = self.mailboxes.lock();
        let mailbox = mailboxes.get_mut(dir)?;
        if !mailbox.folders.contains_key(&folder_id) {
            return None;
        }
        let message_id = mailbox.assign_eid();
        let mut props = AHashMap::new();
        for propval in propvals {
            props.insert(propval.tag, propval.value);
        }
        props
            .entry(property::PR_MESSAGE_DELIVERY_TIME)
            .or_insert_with(|| PropValue::SysTime(current_nt_time()));
        mailbox.messages.insert(
            message_id,
            MessageData {
                parent: folder_id,
                owner: owner.to_string(),
                fai,
                soft_deleted: false,
                props,
            },
        );
        Some(message_id)
    }

    pub fn mailbox_info(&self, dir: &str) -> Option<MailboxInfo> {
        self.mailboxes.lock().get(dir).map(|mailbox| MailboxInfo {
            account_id: mailbox.account_id,
            private: mailbox.private,
            guid: mailbox.guid,
        })
    }

    pub(crate) fn with_mailbox<R>(
        &self,
        dir: &str,
        f: impl FnOnce(&mut Mailbox) -> trc::Result<R>,
    ) -> trc::Result<R> {
        let mut mailboxes = self.mailboxes.lock();
        let mailbox = mailboxes.get_mut(dir).ok_or_else(|| {
            trc::Error::from(StoreEvent::DataError)
                .details("unknown mailbox directory")
                .ctx(trc::Key::Path, dir.to_string())
        })?;
        f(mailbox)
    }
}

impl Mailbox {
    pub(crate) fn assign_eid(&mut self) -> Eid {
        let counter = self.next_eid;
        self.next_eid += 1;
        Eid::local(counter)
    }

    pub(crate) fn assign_cn(&mut self) -> Cn {
        let value = self.next_cn;
        self.next_cn += 1;
        Cn::new(value)
    }

    /// Live (not soft-deleted) subfolders in counter order.
    fn children_of(&self, folder_id: Eid) -> Vec<Eid> {
        let mut children: Vec<Eid> = self
            .folders
            .iter()
            .filter(|(_, data)| data.parent == Some(folder_id) && !data.soft_deleted)
            .map(|(id, _)| *id)
            .collect();
        children.sort();
        children
    }

    /// Live messages in counter order.
    fn messages_of(&self, folder_id: Eid) -> Vec<Eid> {
        let mut ids: Vec<Eid> = self
            .messages
            .iter()
            .filter(|(_, data)| data.parent == folder_id && !data.soft_deleted)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    fn rights_of(&self, folder_id: Eid, username: &str) -> Rights {
        self.folders
            .get(&folder_id)
            .and_then(|data| {
                data.acl
                    .iter()
                    .find(|row| row.username == username)
                    .map(|row| row.rights)
            })
            .unwrap_or_default()
    }

    /// Remove a folder subtree from the maps. The caller has already
    /// decided this is allowed.
    fn remove_folder_tree(&mut self, folder_id: Eid, hard: bool) {
        for child in self.children_of(folder_id) {
            self.remove_folder_tree(child, hard);
        }
        for message_id in self.messages_of(folder_id) {
            if hard {
                self.messages.remove(&message_id);
            } else if let Some(message) = self.messages.get_mut(&message_id) {
                message.soft_deleted = true;
            }
        }
        if hard {
            self.folders.remove(&folder_id);
        } else if let Some(data) = self.folders.get_mut(&folder_id) {
            data.soft_deleted = true;
        }
    }

    fn copy_folder_tree(&mut self, src: Eid, dst_parent: Eid, name: Option<&str>) -> Option<Eid> {
        let mut props = self.folders.get(&src)?.props.clone();
        let new_id = self.assign_eid();
        if let Some(name) = name {
            props.insert(
                property::PR_DISPLAY_NAME,
                PropValue::Unicode(name.to_string()),
            );
        }
        self.folders.insert(
            new_id,
            FolderData {
                parent: Some(dst_parent),
                props,
                acl: Vec::new(),
                search: None,
                soft_deleted: false,
            },
        );
        for message_id in self.messages_of(src) {
            let message = &self.messages[&message_id];
            let copy = MessageData {
                parent: new_id,
                owner: message.owner.clone(),
                fai: message.fai,
                soft_deleted: false,
                props: message.props.clone(),
            };
            let copy_id = self.assign_eid();
            self.messages.insert(copy_id, copy);
        }
        for child in self.children_of(src) {
            self.copy_folder_tree(child, new_id, None);
        }
        Some(new_id)
    }
}

impl MemoryStore {
    pub async fn check_folder_id(&self, dir: &str, folder_id: Eid) -> trc::Result<bool> {
        self.with_mailbox(dir, |mailbox| Ok(mailbox.folders.contains_key(&folder_id)))
    }

    pub async fn check_folder_deleted(&self, dir: &str, folder_id: Eid) -> trc::Result<bool> {
        self.with_mailbox(dir, |mailbox| {
            Ok(mailbox
                .folders
                .get(&folder_id)
                .is_some_and(|data| data.soft_deleted))
        })
    }

    pub async fn get_folder_property(
        &self,
        dir: &str,
        _cpid: Cpid,
        folder_id: Eid,
        tag: u32,
    ) -> trc::Result<Option<PropValue>> {
        self.with_mailbox(dir, |mailbox| {
            let Some(data) = mailbox.folders.get(&folder_id) else {
                return Ok(None);
            };
            Ok(match tag {
                property::PR_FOLDER_ID => Some(PropValue::LongLong(folder_id.id())),
                property::PR_PARENT_FOLDER_ID => {
                    data.parent.map(|parent| PropValue::LongLong(parent.id()))
                }
                property::PR_CONTENT_COUNT => {
                    Some(PropValue::Long(mailbox.messages_of(folder_id).len() as u32))
                }
                property::PR_SUBFOLDERS => {
                    Some(PropValue::Bool(!mailbox.children_of(folder_id).is_empty()))
                }
                _ => data.props.get(&tag).cloned(),
            })
        })
    }

    pub async fn set_folder_properties(
        &self,
        dir: &str,
        _cpid: Cpid,
        folder_id: Eid,
        propvals: Vec<TaggedPropval>,
    ) -> trc::Result<Vec<PropertyProblem>> {
        self.with_mailbox(dir, |mailbox| {
            let mut problems = Vec::new();
            let Some(data) = mailbox.folders.get_mut(&folder_id) else {
                return Ok(propvals
                    .iter()
                    .enumerate()
                    .map(|(index, propval)| PropertyProblem {
                        index: index as u16,
                        tag: propval.tag,
                        status: trc::MapiEvent::NotFound.code(),
                    })
                    .collect());
            };
            for (index, propval) in propvals.into_iter().enumerate() {
                match propval.tag {
                    property::PR_FOLDER_ID | property::PR_PARENT_FOLDER_ID => {
                        problems.push(PropertyProblem {
                            index: index as u16,
                            tag: propval.tag,
                            status: trc::MapiEvent::AccessDenied.code(),
                        });
                    }
                    _ => {
                        data.props.insert(propval.tag, propval.value);
                    }
                }
            }
            Ok(problems)
        })
    }

    pub async fn get_folder_by_name(
        &self,
        dir: &str,
        parent_id: Eid,
        name: &str,
    ) -> trc::Result<Option<Eid>> {
        self.with_mailbox(dir, |mailbox| {
            for child in mailbox.children_of(parent_id) {
                let data = &mailbox.folders[&child];
                if !data.soft_deleted
                    && data
                        .props
                        .get(&property::PR_DISPLAY_NAME)
                        .and_then(|v| v.as_str())
                        .is_some_and(|v| v.eq_ignore_ascii_case(name))
                {
                    return Ok(Some(child));
                }
            }
            Ok(None)
        })
    }

    pub async fn allocate_cn(&self, dir: &str) -> trc::Result<Cn> {
        self.with_mailbox(dir, |mailbox| Ok(mailbox.assign_cn()))
    }

    pub async fn check_folder_permission(
        &self,
        dir: &str,
        folder_id: Eid,
        username: &str,
    ) -> trc::Result<Rights> {
        self.with_mailbox(dir, |mailbox| Ok(mailbox.rights_of(folder_id, username)))
    }

    pub async fn check_folder_cycle(
        &self,
        dir: &str,
        src_fid: Eid,
        dst_fid: Eid,
    ) -> trc::Result<bool> {
        self.with_mailbox(dir, |mailbox| {
            let mut current = Some(dst_fid);
            while let Some(folder_id) = current {
                if folder_id == src_fid {
                    return Ok(true);
                }
                current = mailbox.folders.get(&folder_id).and_then(|data| data.parent);
            }
            Ok(false)
        })
    }

    pub async fn create_folder_by_properties(
        &self,
        dir: &str,
        _cpid: Cpid,
        propvals: Vec<TaggedPropval>,
    ) -> trc::Result<Option<Eid>> {
        self.with_mailbox(dir, |mailbox| {
            let parent_id = match propvals
                .get_value(property::PR_PARENT_FOLDER_ID)
                .and_then(|v| v.as_u64())
            {
                Some(id) => Eid::new(id),
                None => return Ok(None),
            };
            let Some(name) = propvals
                .get_value(property::PR_DISPLAY_NAME)
                .and_then(|v| v.as_str())
                .map(|v| v.to_string())
            else {
                return Ok(None);
            };
            if !mailbox.folders.contains_key(&parent_id) {
                return Ok(None);
            }
            // Name collision on the parent loses the race
            for child in mailbox.children_of(parent_id) {
                if mailbox.folders[&child]
                    .props
                    .get(&property::PR_DISPLAY_NAME)
                    .and_then(|v| v.as_str())
                    .is_some_and(|v| v.eq_ignore_ascii_case(&name))
                {
                    return Ok(None);
                }
            }
            let folder_id = mailbox.assign_eid();
            let mut props = AHashMap::new();
            for propval in propvals {
                if propval.tag != property::PR_PARENT_FOLDER_ID {
                    props.insert(propval.tag, propval.value);
                }
            }
            mailbox.folders.insert(
                folder_id,
                FolderData {
                    parent: Some(parent_id),
                    props,
                    acl: Vec::new(),
                    search: None,
                    soft_deleted: false,
                },
            );
            Ok(Some(folder_id))
        })
    }

    pub async fn delete_folder(
        &self,
        dir: &str,
        _cpid: Cpid,
        folder_id: Eid,
        hard: bool,
    ) -> trc::Result<bool> {
        self.with_mailbox(dir, |mailbox| {
            if !mailbox.folders.contains_key(&folder_id) {
                return Ok(true);
            }
            let is_search = mailbox.folders[&folder_id]
                .props
                .get(&property::PR_FOLDER_TYPE)
                .and_then(|v| v.as_u32())
                == Some(FolderType::Search as u32);
            if !is_search
                && (!mailbox.children_of(folder_id).is_empty()
                    || !mailbox.messages_of(folder_id).is_empty())
            {
                // Still has content; the caller did not (or could not) empty it
                return Ok(false);
            }
            if hard {
                mailbox.folders.remove(&folder_id);
            } else if let Some(data) = mailbox.folders.get_mut(&folder_id) {
                data.soft_deleted = true;
            }
            Ok(true)
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn empty_folder(
        &self,
        dir: &str,
        _cpid: Cpid,
        username: Option<&str>,
        folder_id: Eid,
        hard: bool,
        normal: bool,
        fai: bool,
        sub: bool,
    ) -> trc::Result<bool> {
        self.with_mailbox(dir, |mailbox| {
            fn empty_recursive(
                mailbox: &mut Mailbox,
                username: Option<&str>,
                folder_id: Eid,
                hard: bool,
                normal: bool,
                fai: bool,
                sub: bool,
            ) -> bool {
                let mut partial = false;
                for message_id in mailbox.messages_of(folder_id) {
                    let message = &mailbox.messages[&message_id];
                    if (message.fai && !fai) || (!message.fai && !normal) {
                        continue;
                    }
                    if let Some(user) = username {
                        if message.owner != user {
                            partial = true;
                            continue;
                        }
                    }
                    if hard {
                        mailbox.messages.remove(&message_id);
                    } else if let Some(message) = mailbox.messages.get_mut(&message_id) {
                        message.soft_deleted = true;
                    }
                }
                if sub {
                    let private = mailbox.private;
                    for child in mailbox.children_of(folder_id) {
                        if folder::is_system_folder(child, private) {
                            partial = true;
                            continue;
                        }
                        if let Some(user) = username {
                            if !mailbox
                                .rights_of(child, user)
                                .contains(types::acl::Right::Owner)
                            {
                                partial = true;
                                continue;
                            }
                        }
                        partial |= empty_recursive(
                            mailbox, username, child, hard, normal, fai, true,
                        );
                        if mailbox.children_of(child).is_empty()
                            && mailbox.messages_of(child).is_empty()
                        {
                            mailbox.remove_folder_tree(child, hard);
                        } else {
                            partial = true;
                        }
                    }
                }
                partial
            }
            Ok(empty_recursive(
                mailbox, username, folder_id, hard, normal, fai, sub,
            ))
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn movecopy_folder(
        &self,
        dir: &str,
        _account_id: AccountId,
        _cpid: Cpid,
        _guest: bool,
        _username: &str,
        src_parent_id: Eid,
        src_fid: Eid,
        dst_fid: Eid,
        new_name: &str,
        is_copy: bool,
    ) -> trc::Result<MoveCopyFolderResult> {
        self.with_mailbox(dir, |mailbox| {
            if !mailbox.folders.contains_key(&src_fid)
                || !mailbox.folders.contains_key(&dst_fid)
                || mailbox.folders.get(&src_fid).and_then(|d| d.parent) != Some(src_parent_id)
            {
                return Err(trc::Error::from(StoreEvent::UnexpectedValue)
                    .details("source or destination folder vanished"));
            }
            for child in mailbox.children_of(dst_fid) {
                if child != src_fid
                    && mailbox.folders[&child]
                        .props
                        .get(&property::PR_DISPLAY_NAME)
                        .and_then(|v| v.as_str())
                        .is_some_and(|v| v.eq_ignore_ascii_case(new_name))
                {
                    return Ok(MoveCopyFolderResult {
                        existed: true,
                        partial: false,
                    });
                }
            }
            if is_copy {
                mailbox.copy_folder_tree(src_fid, dst_fid, Some(new_name));
            } else if let Some(data) = mailbox.folders.get_mut(&src_fid) {
                data.parent = Some(dst_fid);
                data.props.insert(
                    property::PR_DISPLAY_NAME,
                    PropValue::Unicode(new_name.to_string()),
                );
            }
            Ok(MoveCopyFolderResult {
                existed: false,
                partial: false,
            })
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn movecopy_messages(
        &self,
        dir: &str,
        _account_id: AccountId,
        _cpid: Cpid,
        guest: bool,
        username: &str,
        src_fid: Eid,
        dst_fid: Eid,
        is_copy: bool,
        message_ids: &[Eid],
    ) -> trc::Result<bool> {
        self.with_mailbox(dir, |mailbox| {
            if !mailbox.folders.contains_key(&dst_fid) {
                return Err(trc::Error::from(StoreEvent::UnexpectedValue)
                    .details("destination folder vanished"));
            }
            let can_delete_any = !guest
                || mailbox
                    .rights_of(src_fid, username)
                    .contains_any(Rights::from(types::acl::Right::DeleteAny).with_item(types::acl::Right::Owner));
            let mut partial = false;
            for &message_id in message_ids {
                let Some(message) = mailbox.messages.get(&message_id) else {
                    partial = true;
                    continue;
                };
                if message.parent != src_fid {
                    partial = true;
                    continue;
                }
                if !is_copy && !can_delete_any && message.owner != username {
                    partial = true;
                    continue;
                }
                if is_copy {
                    let copy = MessageData {
                        parent: dst_fid,
                        owner: message.owner.clone(),
                        fai: message.fai,
                        soft_deleted: false,
                        props: message.props.clone(),
                    };
                    let copy_id = mailbox.assign_eid();
                    mailbox.messages.insert(copy_id, copy);
                } else if let Some(message) = mailbox.messages.get_mut(&message_id) {
                    message.parent = dst_fid;
                }
            }
            Ok(partial)
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn delete_messages(
        &self,
        dir: &str,
        _account_id: AccountId,
        _cpid: Cpid,
        username: Option<&str>,
        folder_id: Eid,
        message_ids: &[Eid],
        hard: bool,
    ) -> trc::Result<bool> {
        self.with_mailbox(dir, |mailbox| {
            let mut partial = false;
            for &message_id in message_ids {
                let Some(message) = mailbox.messages.get(&message_id) else {
                    partial = true;
                    continue;
                };
                if message.parent != folder_id {
                    partial = true;
                    continue;
                }
                if let Some(user) = username {
                    if message.owner != user {
                        partial = true;
                        continue;
                    }
                }
                if hard {
                    mailbox.messages.remove(&message_id);
                } else if let Some(message) = mailbox.messages.get_mut(&message_id) {
                    message.soft_deleted = true;
                }
            }
            Ok(partial)
        })
    }

    pub async fn check_message_owner(
        &self,
        dir: &str,
        message_id: Eid,
        username: &str,
    ) -> trc::Result<bool> {
        self.with_mailbox(dir, |mailbox| {
            Ok(mailbox
                .messages
                .get(&message_id)
                .is_some_and(|message| message.owner == username))
        })
    }

    pub async fn get_message_properties(
        &self,
        dir: &str,
        _cpid: Cpid,
        message_id: Eid,
        tags: &[u32],
    ) -> trc::Result<Vec<TaggedPropval>> {
        self.with_mailbox(dir, |mailbox| {
            let Some(message) = mailbox.messages.get(&message_id) else {
                return Ok(Vec::new());
            };
            Ok(tags
                .iter()
                .filter_map(|&tag| {
                    message
                        .props
                        .get(&tag)
                        .map(|value| TaggedPropval::new(tag, value.clone()))
                })
                .collect())
        })
    }

    pub async fn set_message_properties(
        &self,
        dir: &str,
        _cpid: Cpid,
        message_id: Eid,
        propvals: Vec<TaggedPropval>,
    ) -> trc::Result<Vec<PropertyProblem>> {
        self.with_mailbox(dir, |mailbox| {
            let Some(message) = mailbox.messages.get_mut(&message_id) else {
                return Ok(propvals
                    .iter()
                    .enumerate()
                    .map(|(index, propval)| PropertyProblem {
                        index: index as u16,
                        tag: propval.tag,
                        status: trc::MapiEvent::NotFound.code(),
                    })
                    .collect());
            };
            for propval in propvals {
                message.props.insert(propval.tag, propval.value);
            }
            Ok(Vec::new())
        })
    }

    pub async fn get_message_brief(
        &self,
        dir: &str,
        _cpid: Cpid,
        message_id: Eid,
    ) -> trc::Result<Option<MessageBrief>> {
        self.with_mailbox(dir, |mailbox| {
            Ok(mailbox.messages.get(&message_id).map(|message| MessageBrief {
                message_id,
                parent_folder_id: message.parent,
                sender: message
                    .props
                    .get(&property::PR_SENDER_NAME)
                    .and_then(|v| v.as_str())
                    .unwrap_or(&message.owner)
                    .to_string(),
                subject: message
                    .props
                    .get(&property::PR_SUBJECT)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                delivery_time: message
                    .props
                    .get(&property::PR_MESSAGE_DELIVERY_TIME)
                    .and_then(|v| v.as_u64())
                    .unwrap_or_default(),
            }))
        })
    }

    pub async fn update_folder_permission(
        &self,
        dir: &str,
        folder_id: Eid,
        _include_freebusy: bool,
        rows: Vec<PermissionData>,
    ) -> trc::Result<()> {
        self.with_mailbox(dir, |mailbox| {
            let Some(data) = mailbox.folders.get_mut(&folder_id) else {
                return Err(trc::Error::from(StoreEvent::UnexpectedValue)
                    .details("folder vanished")
                    .ctx(trc::Key::FolderId, folder_id.id()));
            };
            for row in rows {
                match row.flags {
                    PERMISSION_DATA_FLAG_ADD_ROW => {
                        let Some(username) = row
                            .propvals
                            .get_value(property::PR_MEMBER_NAME)
                            .and_then(|v| v.as_str())
                            .map(|v| v.to_string())
                            .or_else(|| {
                                row.propvals
                                    .get_value(property::PR_ENTRYID)
                                    .and_then(|v| v.as_bytes())
                                    .map(|v| String::from_utf8_lossy(v).into_owned())
                            })
                        else {
                            continue;
                        };
                        let rights = Rights::from(
                            row.propvals
                                .get_value(property::PR_MEMBER_RIGHTS)
                                .and_then(|v| v.as_u32())
                                .unwrap_or_default() as u64,
                        );
                        let member_id = data
                            .acl
                            .iter()
                            .map(|row| row.member_id)
                            .max()
                            .unwrap_or_default()
                            + 1;
                        data.acl.push(AclRow {
                            member_id,
                            username,
                            rights,
                        });
                    }
                    PERMISSION_DATA_FLAG_MODIFY_ROW => {
                        let Some(member_id) = row
                            .propvals
                            .get_value(property::PR_MEMBER_ID)
                            .and_then(|v| v.as_u64())
                        else {
                            continue;
                        };
                        if let Some(acl_row) =
                            data.acl.iter_mut().find(|row| row.member_id == member_id)
                        {
                            acl_row.rights = Rights::from(
                                row.propvals
                                    .get_value(property::PR_MEMBER_RIGHTS)
                                    .and_then(|v| v.as_u32())
                                    .unwrap_or_default() as u64,
                            );
                        }
                    }
                    PERMISSION_DATA_FLAG_REMOVE_ROW => {
                        if let Some(member_id) = row
                            .propvals
                            .get_value(property::PR_MEMBER_ID)
                            .and_then(|v| v.as_u64())
                        {
                            data.acl.retain(|row| row.member_id != member_id);
                        }
                    }
                    _ => {}
                }
            }
            Ok(())
        })
    }

    pub async fn empty_folder_permission(&self, dir: &str, folder_id: Eid) -> trc::Result<()> {
        self.with_mailbox(dir, |mailbox| {
            if let Some(data) = mailbox.folders.get_mut(&folder_id) {
                data.acl.clear();
            }
            Ok(())
        })
    }

    pub async fn set_search_criteria(
        &self,
        dir: &str,
        _cpid: Cpid,
        folder_id: Eid,
        flags: u32,
        restriction: Option<Restriction>,
        scope: Vec<Eid>,
    ) -> trc::Result<bool> {
        self.with_mailbox(dir, |mailbox| {
            for scope_id in &scope {
                if !mailbox.folders.contains_key(scope_id) {
                    return Ok(false);
                }
            }
            let Some(data) = mailbox.folders.get_mut(&folder_id) else {
                return Ok(false);
            };
            let previous = data.search.take().unwrap_or_else(SearchCriteria::uninitialized);
            let status = if flags & SEARCH_FLAG_STOP != 0 {
                SearchStatus::Stopped
            } else {
                // The search engine that would feed this view runs
                // elsewhere; a restarted static search completes at once.
                SearchStatus::Complete
            };
            data.search = Some(SearchCriteria {
                status,
                flags,
                restriction: restriction.or(previous.restriction),
                scope: if scope.is_empty() {
                    previous.scope
                } else {
                    scope
                },
            });
            Ok(true)
        })
    }

    pub async fn get_search_criteria(
        &self,
        dir: &str,
        folder_id: Eid,
    ) -> trc::Result<SearchCriteria> {
        self.with_mailbox(dir, |mailbox| {
            Ok(mailbox
                .folders
                .get(&folder_id)
                .and_then(|data| data.search.clone())
                .unwrap_or_else(SearchCriteria::uninitialized))
        })
    }

    pub async fn sum_hierarchy(
        &self,
        dir: &str,
        folder_id: Eid,
        username: Option<&str>,
        depth: bool,
    ) -> trc::Result<u32> {
        self.with_mailbox(dir, |mailbox| {
            fn count(mailbox: &Mailbox, folder_id: Eid, username: Option<&str>, depth: bool) -> u32 {
                let mut total = 0;
                for child in mailbox.children_of(folder_id) {
                    if mailbox.folders[&child].soft_deleted {
                        continue;
                    }
                    if let Some(user) = username {
                        if !mailbox.rights_of(child, user).contains_any(
                            Rights::from(types::acl::Right::Visible)
                                .with_item(types::acl::Right::ReadAny)
                                .with_item(types::acl::Right::Owner),
                        ) {
                            continue;
                        }
                    }
                    total += 1;
                    if depth {
                        total += count(mailbox, child, username, true);
                    }
                }
                total
            }
            Ok(count(mailbox, folder_id, username, depth))
        })
    }

    pub async fn sum_content(
        &self,
        dir: &str,
        folder_id: Eid,
        fai: bool,
        deleted: bool,
    ) -> trc::Result<u32> {
        self.with_mailbox(dir, |mailbox| {
            Ok(mailbox
                .messages
                .values()
                .filter(|message| {
                    message.parent == folder_id
                        && message.fai == fai
                        && message.soft_deleted == deleted
                })
                .count() as u32)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::acl::Right;

    const DIR: &str = "/var/mailbox/test";

    fn seeded() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store.create_mailbox(DIR, 7, true);
        store
    }

    #[tokio::test]
    async fn change_numbers_are_monotonic() {
        let store = seeded();
        let first = store.allocate_cn(DIR).await.unwrap();
        let second = store.allocate_cn(DIR).await.unwrap();
        assert!(second > first);
        assert!(store.allocate_cn("/nowhere").await.is_err());
    }

    #[tokio::test]
    async fn folder_names_match_case_insensitively() {
        let store = seeded();
        let subtree = Eid::local(folder::PRIVATE_FID_IPMSUBTREE);
        let folder_id = store
            .create_folder_by_properties(
                DIR,
                0,
                vec![
                    TaggedPropval::new(
                        property::PR_PARENT_FOLDER_ID,
                        PropValue::LongLong(subtree.id()),
                    ),
                    TaggedPropval::new(
                        property::PR_FOLDER_TYPE,
                        PropValue::Long(FolderType::Generic as u32),
                    ),
                    TaggedPropval::new(
                        property::PR_DISPLAY_NAME,
                        PropValue::Unicode("Projects".to_string()),
                    ),
                ],
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            store.get_folder_by_name(DIR, subtree, "projects").await.unwrap(),
            Some(folder_id)
        );
        // A second create under the same name loses the race
        assert_eq!(
            store
                .create_folder_by_properties(
                    DIR,
                    0,
                    vec![
                        TaggedPropval::new(
                            property::PR_PARENT_FOLDER_ID,
                            PropValue::LongLong(subtree.id()),
                        ),
                        TaggedPropval::new(
                            property::PR_DISPLAY_NAME,
                            PropValue::Unicode("PROJECTS".to_string()),
                        ),
                    ],
                )
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn cycle_detection_walks_the_parent_chain() {
        let store = seeded();
        let subtree = Eid::local(folder::PRIVATE_FID_IPMSUBTREE);
        let mut parent = subtree;
        let mut chain = Vec::new();
        for name in ["a", "b", "c"] {
            let folder_id = store
                .create_folder_by_properties(
                    DIR,
                    0,
                    vec![
                        TaggedPropval::new(
                            property::PR_PARENT_FOLDER_ID,
                            PropValue::LongLong(parent.id()),
                        ),
                        TaggedPropval::new(
                            property::PR_DISPLAY_NAME,
                            PropValue::Unicode(name.to_string()),
                        ),
                    ],
                )
                .await
                .unwrap()
                .unwrap();
            chain.push(folder_id);
            parent = folder_id;
        }
        assert!(store.check_folder_cycle(DIR, chain[0], chain[2]).await.unwrap());
        assert!(!store.check_folder_cycle(DIR, chain[2], chain[0]).await.unwrap());
        assert!(!store.check_folder_cycle(DIR, chain[1], subtree).await.unwrap());
    }

    #[tokio::test]
    async fn empty_folder_respects_ownership() {
        let store = seeded();
        let inbox = Eid::local(folder::PRIVATE_FID_INBOX);
        store.create_message(DIR, inbox, "ana", false, Vec::new()).unwrap();
        store.create_message(DIR, inbox, "bob", false, Vec::new()).unwrap();

        let partial = store
            .empty_folder(DIR, 0, Some("bob"), inbox, true, true, false, false)
            .await
            .unwrap();
        assert!(partial);
        assert_eq!(store.sum_content(DIR, inbox, false, false).await.unwrap(), 1);

        let partial = store
            .empty_folder(DIR, 0, None, inbox, true, true, true, true)
            .await
            .unwrap();
        assert!(!partial);
        assert_eq!(store.sum_content(DIR, inbox, false, false).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn permissions_are_per_user() {
        let store = seeded();
        let inbox = Eid::local(folder::PRIVATE_FID_INBOX);
        store
            .update_folder_permission(
                DIR,
                inbox,
                false,
                vec![PermissionData {
                    flags: PERMISSION_DATA_FLAG_ADD_ROW,
                    propvals: vec![
                        TaggedPropval::new(
                            property::PR_MEMBER_NAME,
                            PropValue::Unicode("bob".to_string()),
                        ),
                        TaggedPropval::new(property::PR_MEMBER_RIGHTS, PropValue::Long(0x401)),
                    ],
                }],
            )
            .await
            .unwrap();
        let rights = store.check_folder_permission(DIR, inbox, "bob").await.unwrap();
        assert!(rights.contains(Right::ReadAny));
        assert!(rights.contains(Right::Visible));
        assert!(
            store
                .check_folder_permission(DIR, inbox, "carol")
                .await
                .unwrap()
                .is_empty()
        );

        store.empty_folder_permission(DIR, inbox).await.unwrap();
        assert!(
            store
                .check_folder_permission(DIR, inbox, "bob")
                .await
                .unwrap()
                .is_empty()
        );
    }
}
