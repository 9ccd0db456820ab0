/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::sync::Arc;

use common::{Core, DeliveryEvent, Ipc, Network, Server, auth::AccessToken};
use emsmdb::{
    op::{CreateFolderResponse, OpenFolderResponse},
    processor::LOGON_HANDLE,
    session::SessionData,
};
use store::backend::memory::MemoryStore;
use tokio::sync::mpsc;
use types::{folder::FolderType, id::Eid};

pub const DIR: &str = "/var/mailbox/ana";
pub const PUBLIC_DIR: &str = "/var/mailbox/public";
pub const OWNER_ACCOUNT: u32 = 100;
pub const PUBLIC_ACCOUNT: u32 = 1;
pub const CPID: u16 = 1252;

pub struct TestEnv {
    pub server: Server,
    pub memory: Arc<MemoryStore>,
    pub delivery_rx: mpsc::Receiver<DeliveryEvent>,
}

pub fn test_env() -> TestEnv {
    let memory = MemoryStore::new();
    memory.create_mailbox(DIR, OWNER_ACCOUNT, true);
    memory.create_mailbox(PUBLIC_DIR, PUBLIC_ACCOUNT, false);
    let mut network = Network::default();
    network
        .replica_hosts
        .insert(3, vec!["ghost.example.net".to_string()]);
    let core = Core {
        storage: memory.clone().into_store(),
        network,
    };
    let (ipc, delivery_rx) = Ipc::new();
    TestEnv {
        server: Server::new(core, ipc),
        memory,
        delivery_rx,
    }
}

pub async fn owner_session(env: &TestEnv) -> SessionData {
    let session = SessionData::new(
        env.server.clone(),
        Arc::new(AccessToken::new(OWNER_ACCOUNT, "ana")),
        1,
        CPID,
    );
    session
        .rop_logon(0, true, true, OWNER_ACCOUNT, DIR)
        .await
        .unwrap();
    session
}

pub async fn delegate_session(env: &TestEnv, name: &str) -> SessionData {
    let session = SessionData::new(
        env.server.clone(),
        Arc::new(AccessToken::new(OWNER_ACCOUNT + 1, name)),
        2,
        CPID,
    );
    session
        .rop_logon(0, true, false, OWNER_ACCOUNT, DIR)
        .await
        .unwrap();
    session
}

pub async fn public_session(env: &TestEnv, name: &str) -> SessionData {
    let session = SessionData::new(
        env.server.clone(),
        Arc::new(AccessToken::new(OWNER_ACCOUNT + 2, name)),
        3,
        CPID,
    );
    session
        .rop_logon(0, false, false, PUBLIC_ACCOUNT, PUBLIC_DIR)
        .await
        .unwrap();
    session
}

pub async fn open_folder(session: &SessionData, folder_id: Eid) -> (u32, bool) {
    match session
        .rop_open_folder(0, LOGON_HANDLE, folder_id, 0)
        .await
        .unwrap()
    {
        OpenFolderResponse::Opened { handle, has_rules } => (handle, has_rules),
        OpenFolderResponse::Ghost(_) => panic!("unexpected ghost referral"),
    }
}

pub async fn create_folder(
    session: &SessionData,
    hparent: u32,
    folder_type: FolderType,
    open_existing: bool,
    name: &str,
) -> trc::Result<CreateFolderResponse> {
    session
        .rop_create_folder(
            0,
            hparent,
            folder_type,
            false,
            open_existing,
            name.as_bytes(),
            b"",
        )
        .await
}
