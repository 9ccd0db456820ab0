/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::sync::Arc;

use ahash::AHashMap;
use trc::MapiEvent;

use crate::{
    logon::LogonObject,
    object::{ObjectType, RopObject},
};

/// The logon handle; every rop may name it as its input object.
pub const LOGON_HANDLE: u32 = 0;

const MAX_HANDLE: u32 = i32::MAX as u32;

/// Per-session object graph: one handle space per logon slot, each handle
/// owning its object and remembering its parent. Children never outlive
/// their parent handle.
#[derive(Default)]
pub struct LogonMap {
    logons: AHashMap<u8, HandleStore>,
}

struct HandleStore {
    nodes: AHashMap<u32, HandleNode>,
    next_handle: u32,
}

struct HandleNode {
    object: Arc<RopObject>,
    parent: u32,
    children: Vec<u32>,
}

impl LogonMap {
    pub fn new() -> Self {
        LogonMap::default()
    }

    /// Install a logon at handle 0, releasing whatever a previous logon
    /// on this slot left behind.
    pub fn install_logon(
        &mut self,
        logon_id: u8,
        logon: Arc<LogonObject>,
    ) -> (u32, Vec<Arc<RopObject>>) {
        let released = self
            .logons
            .remove(&logon_id)
            .map(|store| store.collect(LOGON_HANDLE))
            .unwrap_or_default();
        let mut nodes = AHashMap::new();
        nodes.insert(
            LOGON_HANDLE,
            HandleNode {
                object: Arc::new(RopObject::Logon(logon)),
                parent: LOGON_HANDLE,
                children: Vec::new(),
            },
        );
        self.logons.insert(
            logon_id,
            HandleStore {
                nodes,
                next_handle: 1,
            },
        );
        (LOGON_HANDLE, released)
    }

    pub fn get_logon(&self, logon_id: u8) -> Option<Arc<LogonObject>> {
        self.logons
            .get(&logon_id)?
            .nodes
            .get(&LOGON_HANDLE)?
            .object
            .as_logon()
            .cloned()
    }

    pub fn get(&self, logon_id: u8, handle: u32) -> Option<Arc<RopObject>> {
        self.logons
            .get(&logon_id)?
            .nodes
            .get(&handle)
            .map(|node| node.object.clone())
    }

    /// Typed lookup: `NullObject` for a dangling handle, `NotSupported`
    /// when the object is of the wrong kind.
    pub fn get_typed(
        &self,
        logon_id: u8,
        handle: u32,
        expected: ObjectType,
    ) -> trc::Result<Arc<RopObject>> {
        let object = self
            .get(logon_id, handle)
            .ok_or_else(|| MapiEvent::NullObject.into_err().ctx(trc::Key::Handle, handle))?;
        if object.object_type() == expected {
            Ok(object)
        } else {
            Err(MapiEvent::NotSupported
                .into_err()
                .ctx(trc::Key::Handle, handle))
        }
    }

    /// Install an object under a parent handle. Fresh handles are always
    /// positive; running out of them is reported as a plain error.
    pub fn add(
        &mut self,
        logon_id: u8,
        parent: u32,
        object: RopObject,
    ) -> trc::Result<u32> {
        let store = self
            .logons
            .get_mut(&logon_id)
            .ok_or_else(|| MapiEvent::Error.into_err().details("logon slot is empty"))?;
        if !store.nodes.contains_key(&parent) {
            return Err(MapiEvent::NullObject
                .into_err()
                .ctx(trc::Key::Handle, parent));
        }
        if store.next_handle >= MAX_HANDLE {
            return Err(MapiEvent::Error
                .into_err()
                .details("handle space exhausted"));
        }
        let handle = store.next_handle;
        store.next_handle += 1;
        store.nodes.insert(
            handle,
            HandleNode {
                object: Arc::new(object),
                parent,
                children: Vec::new(),
            },
        );
        if let Some(parent_node) = store.nodes.get_mut(&parent) {
            parent_node.children.push(handle);
        }
        Ok(handle)
    }

    /// Release a handle and every descendant, children first. Releasing
    /// an unknown handle is a no-op, so release is idempotent.
    pub fn release(&mut self, logon_id: u8, handle: u32) -> Vec<Arc<RopObject>> {
        let Some(store) = self.logons.get_mut(&logon_id) else {
            return Vec::new();
        };
        if !store.nodes.contains_key(&handle) {
            return Vec::new();
        }
        let released = store.collect(handle);
        if handle == LOGON_HANDLE {
            self.logons.remove(&logon_id);
        } else if let Some(parent) = store.nodes.get(&handle).map(|node| node.parent) {
            if let Some(parent_node) = store.nodes.get_mut(&parent) {
                parent_node.children.retain(|&child| child != handle);
            }
            store.remove_subtree(handle);
        }
        released
    }

    /// Tear down every logon slot, returning all released objects.
    pub fn release_all(&mut self) -> Vec<Arc<RopObject>> {
        let mut released = Vec::new();
        for (_, store) in self.logons.drain() {
            released.extend(store.collect(LOGON_HANDLE));
        }
        released
    }

    pub fn handle_count(&self, logon_id: u8) -> usize {
        self.logons
            .get(&logon_id)
            .map(|store| store.nodes.len())
            .unwrap_or_default()
    }
}

impl HandleStore {
    /// Objects of a subtree in children-first order, so dirty streams are
    /// flushed before their parents go away.
    fn collect(&self, handle: u32) -> Vec<Arc<RopObject>> {
        let mut released = Vec::new();
        if let Some(node) = self.nodes.get(&handle) {
            for &child in &node.children {
                released.extend(self.collect(child));
            }
            released.push(node.object.clone());
        }
        released
    }

    fn remove_subtree(&mut self, handle: u32) {
        if let Some(node) = self.nodes.remove(&handle) {
            for child in node.children {
                self.remove_subtree(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        logon::{LogonObject, StoreKind},
        object::folder::{ACCESS_ALL, FolderObject},
    };
    use types::{folder::FolderType, id::Eid};

    fn folder(counter: u64) -> RopObject {
        RopObject::Folder(FolderObject::new(
            Eid::local(counter),
            FolderType::Generic,
            ACCESS_ALL,
        ))
    }

    fn logon_map() -> LogonMap {
        let mut map = LogonMap::new();
        map.install_logon(
            0,
            Arc::new(LogonObject::new(
                StoreKind::Private,
                "ana",
                true,
                7,
                "/var/mail/ana",
            )),
        );
        map
    }

    #[test]
    fn typed_lookup() {
        let mut map = logon_map();
        let handle = map.add(0, LOGON_HANDLE, folder(0x20)).unwrap();
        assert!(handle > 0);
        assert!(map.get_typed(0, handle, ObjectType::Folder).is_ok());
        assert!(
            map.get_typed(0, handle, ObjectType::Table)
                .unwrap_err()
                .is_mapi(MapiEvent::NotSupported)
        );
        assert!(
            map.get_typed(0, 999, ObjectType::Folder)
                .unwrap_err()
                .is_mapi(MapiEvent::NullObject)
        );
        assert!(map.get_typed(0, LOGON_HANDLE, ObjectType::Logon).is_ok());
    }

    #[test]
    fn release_cascades_to_descendants() {
        let mut map = logon_map();
        let parent = map.add(0, LOGON_HANDLE, folder(0x20)).unwrap();
        let child = map.add(0, parent, folder(0x21)).unwrap();
        let grandchild = map.add(0, child, folder(0x22)).unwrap();
        let sibling = map.add(0, LOGON_HANDLE, folder(0x23)).unwrap();

        let released = map.release(0, parent);
        assert_eq!(released.len(), 3);
        assert!(map.get(0, parent).is_none());
        assert!(map.get(0, child).is_none());
        assert!(map.get(0, grandchild).is_none());
        assert!(map.get(0, sibling).is_some());

        // Idempotent
        assert!(map.release(0, parent).is_empty());
    }

    #[test]
    fn releasing_the_logon_drops_the_slot() {
        let mut map = logon_map();
        let handle = map.add(0, LOGON_HANDLE, folder(0x20)).unwrap();
        let released = map.release(0, LOGON_HANDLE);
        assert_eq!(released.len(), 2);
        assert!(map.get(0, handle).is_none());
        assert!(map.get_logon(0).is_none());
        assert!(map.add(0, LOGON_HANDLE, folder(0x24)).is_err());
    }
}
