/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::sync::Arc;

use parking_lot::Mutex;
use store::Store;
use trc::MapiEvent;
use types::property::{self, PT_BINARY, PT_STRING8, PT_UNICODE, PropValue, PropvalList};
use utils::codec::charset;

use crate::logon::LogonObject;
use types::id::Eid;

pub const MAX_LENGTH_FOR_FOLDER: usize = 64 * 1024;
pub const MAX_LENGTH_FOR_MESSAGE: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamParent {
    Folder(Eid),
    Message(Eid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpenMode {
    ReadOnly = 0,
    ReadWrite = 1,
    Create = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SeekOrigin {
    Begin = 0,
    Current = 1,
    End = 2,
}

impl SeekOrigin {
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(SeekOrigin::Begin),
            1 => Some(SeekOrigin::Current),
            2 => Some(SeekOrigin::End),
            _ => None,
        }
    }
}

/// Byte-addressable cached view over one long property. The buffer loads
/// lazily on first access and flushes on commit or handle release.
pub struct StreamObject {
    pub logon: Arc<LogonObject>,
    pub parent: StreamParent,
    pub proptag: u32,
    pub open_mode: OpenMode,
    pub max_length: usize,
    state: Mutex<StreamState>,
}

#[derive(Default)]
struct StreamState {
    content: Option<Vec<u8>>,
    seek: usize,
    touched: bool,
}

impl StreamObject {
    pub fn new(
        logon: Arc<LogonObject>,
        parent: StreamParent,
        proptag: u32,
        open_mode: OpenMode,
        max_length: usize,
    ) -> trc::Result<Self> {
        match property::prop_type(proptag) {
            PT_BINARY | PT_STRING8 | PT_UNICODE => Ok(StreamObject {
                logon,
                parent,
                proptag,
                open_mode,
                max_length,
                state: Mutex::new(StreamState::default()),
            }),
            _ => Err(MapiEvent::NotSupported
                .into_err()
                .details("property type is not streamable")
                .ctx(trc::Key::Tag, proptag)),
        }
    }

    async fn ensure_loaded(&self, store: &Store) -> trc::Result<()> {
        if self.state.lock().content.is_some() {
            return Ok(());
        }
        let dir = self.logon.dir();
        let value = match self.parent {
            StreamParent::Folder(folder_id) => {
                store
                    .get_folder_property(dir, 0, folder_id, self.proptag)
                    .await?
            }
            StreamParent::Message(message_id) => store
                .get_message_properties(dir, 0, message_id, &[self.proptag])
                .await?
                .get_value(self.proptag)
                .cloned(),
        };
        let content = match value {
            Some(PropValue::Binary(data)) => data,
            Some(PropValue::Unicode(text)) | Some(PropValue::String8(text)) => {
                text.into_bytes()
            }
            Some(_) => {
                return Err(MapiEvent::NotSupported
                    .into_err()
                    .details("stored value is not streamable"));
            }
            None if self.open_mode == OpenMode::Create => Vec::new(),
            None => {
                return Err(MapiEvent::NotFound
                    .into_err()
                    .details("property is not set")
                    .ctx(trc::Key::Tag, self.proptag));
            }
        };
        self.state.lock().content.get_or_insert(content);
        Ok(())
    }

    /// Read up to `len` bytes at the seek pointer, clamped at the end.
    pub async fn read(&self, store: &Store, len: usize) -> trc::Result<Vec<u8>> {
        self.ensure_loaded(store).await?;
        let mut state = self.state.lock();
        let seek = state.seek;
        let content = state.content.as_ref().map(|c| c.as_slice()).unwrap_or(&[]);
        let end = (seek + len).min(content.len());
        let data = content[seek.min(content.len())..end].to_vec();
        state.seek = end;
        Ok(data)
    }

    /// Append or overwrite at the seek pointer. Bytes past `max_length`
    /// are silently dropped; the short count is returned.
    pub async fn write(&self, store: &Store, data: &[u8]) -> trc::Result<usize> {
        if self.open_mode == OpenMode::ReadOnly {
            return Err(MapiEvent::AccessDenied
                .into_err()
                .details("stream is read only"));
        }
        self.ensure_loaded(store).await?;
        let mut state = self.state.lock();
        let seek = state.seek;
        let max_length = self.max_length;
        let content = state.content.get_or_insert_default();
        let writable = max_length.saturating_sub(seek).min(data.len());
        if writable > 0 {
            if content.len() < seek + writable {
                content.resize(seek + writable, 0);
            }
            content[seek..seek + writable].copy_from_slice(&data[..writable]);
            state.seek += writable;
            state.touched = true;
        }
        Ok(writable)
    }

    pub async fn seek(&self, store: &Store, origin: SeekOrigin, offset: i64) -> trc::Result<u64> {
        self.ensure_loaded(store).await?;
        let mut state = self.state.lock();
        let length = state.content.as_ref().map(|c| c.len()).unwrap_or_default() as i64;
        let base = match origin {
            SeekOrigin::Begin => 0,
            SeekOrigin::Current => state.seek as i64,
            SeekOrigin::End => length,
        };
        let target = base.checked_add(offset).ok_or_else(|| {
            MapiEvent::StreamSeekError.into_err()
        })?;
        if target < 0 {
            return Err(MapiEvent::StreamSeekError
                .into_err()
                .ctx(trc::Key::Size, offset.unsigned_abs()));
        }
        // Past-the-end seeks clamp to the current length
        state.seek = target.min(length) as usize;
        Ok(state.seek as u64)
    }

    pub fn get_seek_position(&self) -> usize {
        self.state.lock().seek
    }

    pub async fn get_length(&self, store: &Store) -> trc::Result<usize> {
        self.ensure_loaded(store).await?;
        Ok(self
            .state
            .lock()
            .content
            .as_ref()
            .map(|c| c.len())
            .unwrap_or_default())
    }

    /// Truncate or zero-extend, bounded by `max_length`.
    pub async fn set_length(&self, store: &Store, len: usize) -> trc::Result<()> {
        if self.open_mode == OpenMode::ReadOnly {
            return Err(MapiEvent::AccessDenied
                .into_err()
                .details("stream is read only"));
        }
        if len > self.max_length {
            return Err(MapiEvent::StreamSeekError
                .into_err()
                .details("length exceeds stream maximum")
                .ctx(trc::Key::Size, len));
        }
        self.ensure_loaded(store).await?;
        let mut state = self.state.lock();
        let content = state.content.get_or_insert_default();
        content.resize(len, 0);
        state.seek = state.seek.min(len);
        state.touched = true;
        Ok(())
    }

    pub fn is_touched(&self) -> bool {
        self.state.lock().touched
    }

    /// Write the buffer back to the owning property. A clean stream
    /// commits as a no-op.
    pub async fn commit(&self, store: &Store) -> trc::Result<()> {
        let content = {
            let state = self.state.lock();
            if !state.touched {
                return Ok(());
            }
            state.content.clone().unwrap_or_default()
        };
        let value = match property::prop_type(self.proptag) {
            PT_BINARY => PropValue::Binary(content),
            PT_STRING8 => PropValue::String8(charset::decode_string8(&content)),
            _ => PropValue::Unicode(String::from_utf8_lossy(&content).into_owned()),
        };
        let propvals = vec![types::property::TaggedPropval::new(self.proptag, value)];
        let dir = self.logon.dir();
        let problems = match self.parent {
            StreamParent::Folder(folder_id) => {
                store
                    .set_folder_properties(dir, 0, folder_id, propvals)
                    .await?
            }
            StreamParent::Message(message_id) => {
                store
                    .set_message_properties(dir, 0, message_id, propvals)
                    .await?
            }
        };
        if let Some(problem) = problems.first() {
            return Err(MapiEvent::Error
                .into_err()
                .details("property rejected the new value")
                .code(problem.status as u64)
                .ctx(trc::Key::Tag, problem.tag));
        }
        self.state.lock().touched = false;
        Ok(())
    }
}
