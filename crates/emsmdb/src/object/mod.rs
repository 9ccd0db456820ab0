/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod folder;
pub mod stream;
pub mod table;

use std::sync::Arc;

use crate::logon::LogonObject;
use folder::FolderObject;
use stream::StreamObject;
use table::TableObject;

/// Wire tags of the session object kinds. Message and attachment handles
/// are installed by the message verbs, which live outside this crate; the
/// folder core still recognizes their tags in typed lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ObjectType {
    Logon = 1,
    Folder = 2,
    Message = 3,
    Table = 4,
    Attachment = 5,
    Stream = 6,
}

/// A session object as held by the handle map.
pub enum RopObject {
    Logon(Arc<LogonObject>),
    Folder(FolderObject),
    Table(TableObject),
    Stream(StreamObject),
}

impl std::fmt::Debug for RopObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RopObject")
            .field("type", &self.object_type())
            .finish()
    }
}

impl RopObject {
    pub fn object_type(&self) -> ObjectType {
        match self {
            RopObject::Logon(_) => ObjectType::Logon,
            RopObject::Folder(_) => ObjectType::Folder,
            RopObject::Table(_) => ObjectType::Table,
            RopObject::Stream(_) => ObjectType::Stream,
        }
    }

    pub fn as_logon(&self) -> Option<&Arc<LogonObject>> {
        match self {
            RopObject::Logon(logon) => Some(logon),
            _ => None,
        }
    }

    pub fn as_folder(&self) -> Option<&FolderObject> {
        match self {
            RopObject::Folder(folder) => Some(folder),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&TableObject> {
        match self {
            RopObject::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&StreamObject> {
        match self {
            RopObject::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}
