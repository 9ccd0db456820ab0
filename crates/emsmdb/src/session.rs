/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::sync::Arc;

use common::{Server, auth::AccessToken};
use parking_lot::Mutex;
use trc::MapiEvent;
use types::{AccountId, Cpid, folder, id::Eid};

use crate::{
    logon::{LogonObject, StoreKind},
    object::{ObjectType, RopObject, folder::FolderObject},
    processor::{LOGON_HANDLE, LogonMap},
};

/// One client session. Verbs are methods on this type; the handle map is
/// private to the session and its lock is never held across an await.
pub struct SessionData {
    pub server: Server,
    pub access_token: Arc<AccessToken>,
    pub session_id: u64,
    pub cpid: Cpid,
    handles: Mutex<LogonMap>,
}

impl SessionData {
    pub fn new(
        server: Server,
        access_token: Arc<AccessToken>,
        session_id: u64,
        cpid: Cpid,
    ) -> Self {
        SessionData {
            server,
            access_token,
            session_id,
            cpid,
            handles: Mutex::new(LogonMap::new()),
        }
    }

    /// Open a mailbox on a logon slot. The slot's previous object graph,
    /// if any, is torn down first.
    pub async fn rop_logon(
        &self,
        logon_id: u8,
        private: bool,
        owner: bool,
        account_id: AccountId,
        dir: &str,
    ) -> trc::Result<u32> {
        let root = if private {
            folder::PRIVATE_FID_ROOT
        } else {
            folder::PUBLIC_FID_ROOT
        };
        if !self
            .server
            .store()
            .check_folder_id(dir, Eid::local(root))
            .await?
        {
            return Err(MapiEvent::NotFound
                .into_err()
                .details("mailbox does not exist")
                .ctx(trc::Key::Path, dir.to_string()));
        }
        let logon = Arc::new(LogonObject::new(
            if private {
                StoreKind::Private
            } else {
                StoreKind::Public
            },
            self.access_token.name.clone(),
            owner,
            account_id,
            dir,
        ));
        let released = {
            let mut handles = self.handles.lock();
            let (_, released) = handles.install_logon(logon_id, logon);
            released
        };
        self.flush_released(released).await;
        trc::event!(
            Session(trc::SessionEvent::Logon),
            SessionId = self.session_id,
            LogonId = logon_id,
            AccountId = account_id,
            Path = dir.to_string(),
        );
        Ok(LOGON_HANDLE)
    }

    /// The logon behind a slot; verbs treat a missing logon as a plain
    /// error rather than a bad handle.
    pub fn logon(&self, logon_id: u8) -> trc::Result<Arc<LogonObject>> {
        self.handles
            .lock()
            .get_logon(logon_id)
            .ok_or_else(|| MapiEvent::Error.into_err().details("logon slot is empty"))
    }

    pub(crate) fn object(&self, logon_id: u8, handle: u32) -> trc::Result<Arc<RopObject>> {
        self.handles
            .lock()
            .get(logon_id, handle)
            .ok_or_else(|| MapiEvent::NullObject.into_err().ctx(trc::Key::Handle, handle))
    }

    pub(crate) fn typed(
        &self,
        logon_id: u8,
        handle: u32,
        expected: ObjectType,
    ) -> trc::Result<Arc<RopObject>> {
        self.handles.lock().get_typed(logon_id, handle, expected)
    }

    /// Folder behind a handle; its fields are a snapshot taken at open
    /// time, so a copy is all any verb needs.
    pub(crate) fn folder(&self, logon_id: u8, handle: u32) -> trc::Result<FolderObject> {
        self.typed(logon_id, handle, ObjectType::Folder)?
            .as_folder()
            .copied()
            .ok_or_else(|| MapiEvent::NullObject.into_err())
    }

    pub(crate) fn add_object(
        &self,
        logon_id: u8,
        parent: u32,
        object: RopObject,
    ) -> trc::Result<u32> {
        self.handles.lock().add(logon_id, parent, object)
    }

    pub fn handle_count(&self, logon_id: u8) -> usize {
        self.handles.lock().handle_count(logon_id)
    }

    /// Release a handle and its descendants. Dirty streams are flushed
    /// and driver tables unloaded on the way out, best effort.
    pub async fn rop_release(&self, logon_id: u8, handle: u32) {
        let released = self.handles.lock().release(logon_id, handle);
        if !released.is_empty() {
            trc::event!(
                Session(trc::SessionEvent::ReleaseHandles),
                SessionId = self.session_id,
                LogonId = logon_id,
                Handle = handle,
                Total = released.len(),
            );
            self.flush_released(released).await;
        }
    }

    /// Session teardown: drop every logon slot and flush what they held.
    pub async fn close(&self) {
        let released = self.handles.lock().release_all();
        self.flush_released(released).await;
    }

    async fn flush_released(&self, released: Vec<Arc<RopObject>>) {
        let store = self.server.store();
        for object in released {
            match object.as_ref() {
                RopObject::Stream(stream) if stream.is_touched() => {
                    if let Err(err) = stream.commit(&store).await {
                        trc::event!(
                            Session(trc::SessionEvent::StreamFlushError),
                            SessionId = self.session_id,
                            Tag = stream.proptag,
                            Reason = err.to_string(),
                        );
                    }
                }
                RopObject::Table(table) => {
                    // A dangling driver cursor only wastes memory; the
                    // store reaps them with the session either way.
                    let _ = table.unload(&store).await;
                }
                _ => {}
            }
        }
    }
}
