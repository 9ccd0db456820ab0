/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

mod ops;

use std::time::Duration;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time,
};
use trc::RpcEvent;
use types::{
    AccountId, Cpid,
    acl::PermissionData,
    id::{Cn, Eid},
    message::MessageBrief,
    property::{PropValue, PropertyProblem, TaggedPropval},
    restriction::Restriction,
    search::SearchCriteria,
    table::SortOrderSet,
};

use crate::{LoadedTable, MoveCopyFolderResult, RowInstance, pool::Pool};

const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Client for the message-store service. Connections are pooled; a call
/// that finds the server down rebuilds its connection and retries exactly
/// once, every other failure is surfaced.
pub struct RpcStore {
    pub(crate) pool: Pool<RpcConnection>,
    host: String,
    connect_timeout: Duration,
}

pub struct RpcConnection {
    stream: TcpStream,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub(crate) enum Request {
    CheckFolderId { dir: String, folder_id: Eid },
    CheckFolderDeleted { dir: String, folder_id: Eid },
    GetFolderProperty { dir: String, cpid: Cpid, folder_id: Eid, tag: u32 },
    SetFolderProperties { dir: String, cpid: Cpid, folder_id: Eid, propvals: Vec<TaggedPropval> },
    GetFolderByName { dir: String, parent_id: Eid, name: String },
    AllocateCn { dir: String },
    CheckFolderPermission { dir: String, folder_id: Eid, username: String },
    CheckFolderCycle { dir: String, src_fid: Eid, dst_fid: Eid },
    CreateFolderByProperties { dir: String, cpid: Cpid, propvals: Vec<TaggedPropval> },
    DeleteFolder { dir: String, cpid: Cpid, folder_id: Eid, hard: bool },
    EmptyFolder {
        dir: String,
        cpid: Cpid,
        username: Option<String>,
        folder_id: Eid,
        hard: bool,
        normal: bool,
        fai: bool,
        sub: bool,
    },
    MoveCopyFolder {
        dir: String,
        account_id: AccountId,
        cpid: Cpid,
        guest: bool,
        username: String,
        src_parent_id: Eid,
        src_fid: Eid,
        dst_fid: Eid,
        new_name: String,
        is_copy: bool,
    },
    MoveCopyMessages {
        dir: String,
        account_id: AccountId,
        cpid: Cpid,
        guest: bool,
        username: String,
        src_fid: Eid,
        dst_fid: Eid,
        is_copy: bool,
        message_ids: Vec<Eid>,
    },
    DeleteMessages {
        dir: String,
        account_id: AccountId,
        cpid: Cpid,
        username: Option<String>,
        folder_id: Eid,
        message_ids: Vec<Eid>,
        hard: bool,
    },
    CheckMessageOwner { dir: String, message_id: Eid, username: String },
    GetMessageProperties { dir: String, cpid: Cpid, message_id: Eid, tags: Vec<u32> },
    SetMessageProperties { dir: String, cpid: Cpid, message_id: Eid, propvals: Vec<TaggedPropval> },
    GetMessageBrief { dir: String, cpid: Cpid, message_id: Eid },
    UpdateFolderPermission {
        dir: String,
        folder_id: Eid,
        include_freebusy: bool,
        rows: Vec<PermissionData>,
    },
    EmptyFolderPermission { dir: String, folder_id: Eid },
    SetSearchCriteria {
        dir: String,
        cpid: Cpid,
        folder_id: Eid,
        flags: u32,
        restriction: Option<Restriction>,
        scope: Vec<Eid>,
    },
    GetSearchCriteria { dir: String, folder_id: Eid },
    SumHierarchy { dir: String, folder_id: Eid, username: Option<String>, depth: bool },
    SumContent { dir: String, folder_id: Eid, fai: bool, deleted: bool },
    LoadHierarchyTable {
        dir: String,
        folder_id: Eid,
        username: Option<String>,
        table_flags: u8,
        restriction: Option<Restriction>,
    },
    LoadContentTable {
        dir: String,
        cpid: Cpid,
        folder_id: Eid,
        username: Option<String>,
        table_flags: u8,
        restriction: Option<Restriction>,
        sorts: Option<SortOrderSet>,
    },
    LoadPermissionTable { dir: String, folder_id: Eid, table_flags: u8 },
    LoadRuleTable { dir: String, folder_id: Eid, table_flags: u8 },
    UnloadTable { dir: String, table_id: u32 },
    SumTable { dir: String, table_id: u32 },
    QueryTable {
        dir: String,
        username: Option<String>,
        cpid: Cpid,
        table_id: u32,
        proptags: Vec<u32>,
        start: u32,
        count: u32,
    },
    RestrictTable { dir: String, table_id: u32, restriction: Option<Restriction> },
    SortTable { dir: String, table_id: u32, sorts: SortOrderSet },
    MarkTable { dir: String, table_id: u32, position: u32 },
    LocateTable { dir: String, table_id: u32, instance: RowInstance },
    MatchTable {
        dir: String,
        cpid: Cpid,
        table_id: u32,
        forward: bool,
        start: u32,
        restriction: Restriction,
    },
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub(crate) enum Response {
    Unit,
    Bool(bool),
    U32(u32),
    OptU32(Option<u32>),
    OptEid(Option<Eid>),
    OptValue(Option<PropValue>),
    Cn(Cn),
    Rights(u64),
    Problems(Vec<PropertyProblem>),
    Propvals(Vec<TaggedPropval>),
    Rows(Vec<Vec<TaggedPropval>>),
    Criteria(Box<SearchCriteria>),
    Brief(Option<MessageBrief>),
    Table(LoadedTable),
    Instance(Option<RowInstance>),
    MoveCopy(MoveCopyFolderResult),
    Match(Option<(u32, Vec<TaggedPropval>)>),
    Error(u32),
}

impl RpcStore {
    pub fn open(host: impl Into<String>, pool_size: usize, connect_timeout: Duration) -> Self {
        RpcStore {
            pool: Pool::new(pool_size),
            host: host.into(),
            connect_timeout,
        }
    }

    /// Reload pool settings; pooled connections reconnect on next use.
    pub fn reload(&self, pool_size: usize) {
        self.pool.resize(pool_size);
        self.pool.bump();
        trc::event!(Rpc(RpcEvent::PoolResized), Total = pool_size);
    }

    async fn connect(&self) -> trc::Result<RpcConnection> {
        let stream = time::timeout(self.connect_timeout, TcpStream::connect(&self.host))
            .await
            .map_err(|_| {
                trc::Error::from(RpcEvent::ServerDown)
                    .details("connect timeout")
                    .ctx(trc::Key::Path, self.host.clone())
            })?
            .map_err(|err| {
                trc::Error::from(RpcEvent::ServerDown)
                    .reason(err)
                    .ctx(trc::Key::Path, self.host.clone())
            })?;
        stream.set_nodelay(true).map_err(|err| {
            trc::Error::from(RpcEvent::ConnectionError).reason(err)
        })?;
        trc::event!(Rpc(RpcEvent::ConnectionStart), Path = self.host.clone());
        Ok(RpcConnection { stream })
    }

    pub(crate) async fn call(&self, request: Request) -> trc::Result<Response> {
        let frame = bincode::serde::encode_to_vec(&request, bincode::config::standard())
            .map_err(|err| {
                trc::Error::from(trc::StoreEvent::DecodeError).reason(err)
            })?;
        let mut token = self.pool.get_wait().await;
        let connection = match token.value.as_mut() {
            Some(connection) => connection,
            None => token.value.insert(self.connect().await?),
        };
        let response = match exchange(connection, &frame).await {
            Ok(response) => Ok(response),
            Err(err) if err.matches(trc::EventType::Rpc(RpcEvent::ServerDown)) => {
                // One rebuild, one retry; anything beyond that is an outage
                trc::event!(Rpc(RpcEvent::Reconnected), Path = self.host.clone());
                let connection = token.value.insert(self.connect().await?);
                exchange(connection, &frame).await
            }
            Err(err) => Err(err),
        };
        if response.is_err() {
            token.value = None;
        }
        match response? {
            Response::Error(code) => Err(trc::Error::from(trc::StoreEvent::DataError)
                .details("backend reported failure")
                .code(code as u64)),
            response => Ok(response),
        }
    }
}

async fn exchange(connection: &mut RpcConnection, frame: &[u8]) -> trc::Result<Response> {
    write_frame(&mut connection.stream, frame)
        .await
        .map_err(|err| trc::Error::from(RpcEvent::ServerDown).reason(err))?;
    let payload = read_frame(&mut connection.stream)
        .await
        .map_err(|err| trc::Error::from(RpcEvent::ServerDown).reason(err))?;
    bincode::serde::decode_from_slice(&payload, bincode::config::standard())
        .map(|(response, _)| response)
        .map_err(|err| trc::Error::from(trc::StoreEvent::DecodeError).reason(err))
}

async fn write_frame(stream: &mut TcpStream, frame: &[u8]) -> std::io::Result<()> {
    stream.write_u32_le(frame.len() as u32).await?;
    stream.write_all(frame).await?;
    stream.flush().await
}

async fn read_frame(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let len = stream.read_u32_le().await? as usize;
    if len > MAX_FRAME_SIZE {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "frame too large",
        ));
    }
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await?;
    Ok(payload)
}
