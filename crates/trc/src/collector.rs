/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{
    sync::{
        OnceLock,
        atomic::{AtomicU8, Ordering},
        mpsc::{Receiver, Sender, channel},
    },
    thread::Builder,
    time::SystemTime,
};

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::{Error, EventType, Level, MapiEvent, RpcEvent, SessionEvent, StoreEvent, TOTAL_EVENT_COUNT};

static EVENT_LEVELS: [AtomicU8; TOTAL_EVENT_COUNT] =
    [const { AtomicU8::new(u8::MAX) }; TOTAL_EVENT_COUNT];
static EVENT_TX: OnceLock<Mutex<Sender<Error>>> = OnceLock::new();

pub struct Collector;

impl Collector {
    /// Whether anyone cares about this event at its current level. Cheap
    /// enough to gate every `event!` call site.
    #[inline(always)]
    pub fn has_interest(typ: EventType) -> bool {
        Self::level_of(typ) != Level::Disable
    }

    pub fn level_of(typ: EventType) -> Level {
        match EVENT_LEVELS[typ.id()].load(Ordering::Relaxed) {
            u8::MAX => typ.level(),
            0 => Level::Disable,
            1 => Level::Error,
            2 => Level::Warn,
            3 => Level::Info,
            4 => Level::Debug,
            _ => Level::Trace,
        }
    }

    pub fn update_custom_levels(levels: AHashMap<EventType, Level>) {
        for (typ, level) in levels {
            EVENT_LEVELS[typ.id()].store(level as u8, Ordering::Relaxed);
        }
    }

    pub fn reset_levels() {
        for level in EVENT_LEVELS.iter() {
            level.store(u8::MAX, Ordering::Relaxed);
        }
    }

    pub(crate) fn submit(event: Error) {
        let tx = EVENT_TX.get_or_init(|| {
            let (tx, rx) = channel();
            spawn_collector(rx);
            Mutex::new(tx)
        });
        // A closed channel means the process is shutting down; drop the
        // event rather than block or panic.
        let _ = tx.lock().send(event);
    }
}

fn spawn_collector(rx: Receiver<Error>) {
    Builder::new()
        .name("emsmdb-collector".to_string())
        .spawn(move || {
            while let Ok(event) = rx.recv() {
                write_event(&event);
            }
        })
        .expect("Failed to start event collector");
}

fn write_event(event: &Error) {
    let timestamp = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    let level = match Collector::level_of(event.inner) {
        Level::Disable => return,
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    };
    let mut line = format!(
        "{timestamp} {level} {} {}",
        event_name(event.inner),
        event.inner.message()
    );
    for (key, value) in &event.keys {
        line.push_str(&format!(" {key:?}={value}"));
    }
    eprintln!("{line}");
}

fn event_name(typ: EventType) -> &'static str {
    match typ {
        EventType::Mapi(event) => match event {
            MapiEvent::Error => "mapi.error",
            MapiEvent::NullObject => "mapi.null-object",
            MapiEvent::NotSupported => "mapi.not-supported",
            MapiEvent::AccessDenied => "mapi.access-denied",
            MapiEvent::NotFound => "mapi.not-found",
            MapiEvent::DuplicateName => "mapi.duplicate-name",
            MapiEvent::InvalidParam => "mapi.invalid-param",
            MapiEvent::ServerOom => "mapi.server-oom",
            MapiEvent::NotSearchFolder => "mapi.not-search-folder",
            MapiEvent::SearchFolderScopeViolation => "mapi.search-scope-violation",
            MapiEvent::NotInitialized => "mapi.not-initialized",
            MapiEvent::FolderCycle => "mapi.folder-cycle",
            MapiEvent::StreamSeekError => "mapi.stream-seek",
        },
        EventType::Store(event) => match event {
            StoreEvent::NotConfigured => "store.not-configured",
            StoreEvent::DataError => "store.data-error",
            StoreEvent::DecodeError => "store.decode-error",
            StoreEvent::UnexpectedValue => "store.unexpected-value",
        },
        EventType::Rpc(event) => match event {
            RpcEvent::ConnectionStart => "rpc.connection-start",
            RpcEvent::ConnectionError => "rpc.connection-error",
            RpcEvent::ServerDown => "rpc.server-down",
            RpcEvent::Reconnected => "rpc.reconnected",
            RpcEvent::PoolResized => "rpc.pool-resized",
        },
        EventType::Session(event) => match event {
            SessionEvent::Logon => "session.logon",
            SessionEvent::ReleaseHandles => "session.release-handles",
            SessionEvent::StreamFlushError => "session.stream-flush-error",
            SessionEvent::NonReadReceipt => "session.non-read-receipt",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_overrides() {
        let typ = EventType::Mapi(MapiEvent::NotFound);
        assert_eq!(Collector::level_of(typ), Level::Debug);
        let mut levels = AHashMap::new();
        levels.insert(typ, Level::Disable);
        Collector::update_custom_levels(levels);
        assert!(!Collector::has_interest(typ));
        Collector::reset_levels();
        assert!(Collector::has_interest(typ));
    }
}
