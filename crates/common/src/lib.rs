/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod auth;
pub mod config;

use std::sync::Arc;

use arc_swap::ArcSwap;
use store::Store;
use tokio::sync::mpsc;
use types::{ReplicaId, message::MessageBrief};

pub const IPC_CHANNEL_BUFFER: usize = 1024;

pub type SharedCore = Arc<ArcSwap<Core>>;

/// Process-wide state. `Core` is immutable once published; a reload builds
/// a fresh one and swaps it in, so readers only ever take snapshots.
#[derive(Default)]
pub struct Core {
    pub storage: Store,
    pub network: Network,
}

/// Replica routing for public-folder ghosts.
#[derive(Default)]
pub struct Network {
    pub replica_hosts: ahash::AHashMap<ReplicaId, Vec<String>>,
}

#[derive(Clone)]
pub struct Server {
    pub core: SharedCore,
    pub ipc: Ipc,
}

#[derive(Clone)]
pub struct Ipc {
    pub delivery_tx: mpsc::Sender<DeliveryEvent>,
}

/// Work handed to the delivery pipeline, which runs outside this crate
/// set.
#[derive(Debug)]
pub enum DeliveryEvent {
    NonReadReceipt { dir: String, brief: MessageBrief },
    Stop,
}

impl Server {
    pub fn new(core: Core, ipc: Ipc) -> Self {
        Server {
            core: Arc::new(ArcSwap::from_pointee(core)),
            ipc,
        }
    }

    #[inline(always)]
    pub fn store(&self) -> Store {
        self.core.load().storage.clone()
    }

    pub fn replica_hosts(&self, replica_id: ReplicaId) -> Vec<String> {
        self.core
            .load()
            .network
            .replica_hosts
            .get(&replica_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Queue a delivery event without blocking the calling verb. A full
    /// channel drops the event; receipts are best effort.
    pub fn notify_delivery(&self, event: DeliveryEvent) -> bool {
        self.ipc.delivery_tx.try_send(event).is_ok()
    }

    /// Publish a new core; readers pick it up on their next snapshot.
    pub fn reload(&self, core: Core) {
        self.core.store(Arc::new(core));
    }
}

impl Ipc {
    pub fn new() -> (Self, mpsc::Receiver<DeliveryEvent>) {
        let (delivery_tx, delivery_rx) = mpsc::channel(IPC_CHANNEL_BUFFER);
        (Ipc { delivery_tx }, delivery_rx)
    }
}
