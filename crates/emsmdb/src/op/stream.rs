/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use trc::MapiEvent;

use crate::{
    object::{
        ObjectType, RopObject,
        folder::ACCESS_MODIFY,
        stream::{MAX_LENGTH_FOR_FOLDER, OpenMode, SeekOrigin, StreamObject, StreamParent},
    },
    session::SessionData,
};

impl SessionData {
    /// Open a byte stream over one long folder property. Message and
    /// attachment streams are installed by the message verbs.
    pub async fn rop_open_stream(
        &self,
        logon_id: u8,
        hin: u32,
        proptag: u32,
        open_mode: u8,
    ) -> trc::Result<u32> {
        let target = self.folder(logon_id, hin)?;
        let open_mode = match open_mode {
            0 => OpenMode::ReadOnly,
            1 => OpenMode::ReadWrite,
            2 => OpenMode::Create,
            _ => return Err(MapiEvent::InvalidParam.into_err()),
        };
        if open_mode != OpenMode::ReadOnly && target.tag_access & ACCESS_MODIFY == 0 {
            return Err(MapiEvent::AccessDenied.into_err());
        }
        let logon = self.logon(logon_id)?;
        let stream = StreamObject::new(
            logon,
            StreamParent::Folder(target.folder_id),
            proptag,
            open_mode,
            MAX_LENGTH_FOR_FOLDER,
        )?;
        self.add_object(logon_id, hin, RopObject::Stream(stream))
    }

    pub async fn rop_read_stream(
        &self,
        logon_id: u8,
        hin: u32,
        len: u16,
    ) -> trc::Result<Vec<u8>> {
        let object = self.typed(logon_id, hin, ObjectType::Stream)?;
        let stream = object
            .as_stream()
            .ok_or_else(|| MapiEvent::NullObject.into_err())?;
        stream.read(&self.server.store(), len as usize).await
    }

    pub async fn rop_write_stream(
        &self,
        logon_id: u8,
        hin: u32,
        data: &[u8],
    ) -> trc::Result<u16> {
        let object = self.typed(logon_id, hin, ObjectType::Stream)?;
        let stream = object
            .as_stream()
            .ok_or_else(|| MapiEvent::NullObject.into_err())?;
        stream
            .write(&self.server.store(), data)
            .await
            .map(|written| written as u16)
    }

    pub async fn rop_seek_stream(
        &self,
        logon_id: u8,
        hin: u32,
        origin: u8,
        offset: i64,
    ) -> trc::Result<u64> {
        let object = self.typed(logon_id, hin, ObjectType::Stream)?;
        let stream = object
            .as_stream()
            .ok_or_else(|| MapiEvent::NullObject.into_err())?;
        let origin =
            SeekOrigin::from_wire(origin).ok_or_else(|| MapiEvent::InvalidParam.into_err())?;
        stream.seek(&self.server.store(), origin, offset).await
    }

    pub async fn rop_get_stream_size(&self, logon_id: u8, hin: u32) -> trc::Result<u32> {
        let object = self.typed(logon_id, hin, ObjectType::Stream)?;
        let stream = object
            .as_stream()
            .ok_or_else(|| MapiEvent::NullObject.into_err())?;
        stream
            .get_length(&self.server.store())
            .await
            .map(|len| len as u32)
    }

    pub async fn rop_set_stream_size(
        &self,
        logon_id: u8,
        hin: u32,
        size: u64,
    ) -> trc::Result<()> {
        let object = self.typed(logon_id, hin, ObjectType::Stream)?;
        let stream = object
            .as_stream()
            .ok_or_else(|| MapiEvent::NullObject.into_err())?;
        stream
            .set_length(&self.server.store(), size as usize)
            .await
    }

    pub async fn rop_commit_stream(&self, logon_id: u8, hin: u32) -> trc::Result<()> {
        let object = self.typed(logon_id, hin, ObjectType::Stream)?;
        let stream = object
            .as_stream()
            .ok_or_else(|| MapiEvent::NullObject.into_err())?;
        stream.commit(&self.server.store()).await
    }
}
