/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::time::Duration;

use ahash::AHashMap;
use store::{Store, backend::{memory::MemoryStore, rpc::RpcStore}};
use types::ReplicaId;
use utils::config::Config;

use crate::{Core, Network};

impl Core {
    /// Build a core from a parsed configuration. Defaults favor the
    /// in-process backend so a bare config file still boots.
    pub fn parse(config: &mut Config) -> Self {
        let storage = match config.value("store.backend").unwrap_or("memory") {
            "rpc" => {
                let host = config
                    .property_or_default::<String>("store.rpc.host", "127.0.0.1:5000".to_string());
                let pool_size = config.property_or_default::<usize>("store.rpc.pool-size", 4);
                let timeout = config.property_or_default::<Duration>(
                    "store.rpc.connect-timeout",
                    Duration::from_secs(10),
                );
                Store::Rpc(std::sync::Arc::new(RpcStore::open(host, pool_size, timeout)))
            }
            _ => Store::Memory(MemoryStore::new()),
        };
        let mut replica_hosts: AHashMap<ReplicaId, Vec<String>> = AHashMap::new();
        for (key, value) in &config.keys {
            if let Some(replica_id) = key
                .strip_prefix("network.replica.")
                .and_then(|id| id.parse::<ReplicaId>().ok())
            {
                replica_hosts.insert(
                    replica_id,
                    value
                        .split(',')
                        .map(|host| host.trim().to_string())
                        .filter(|host| !host.is_empty())
                        .collect(),
                );
            }
        }
        Core {
            storage,
            network: Network { replica_hosts },
        }
    }
}
