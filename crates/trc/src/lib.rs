/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod collector;

use std::{fmt, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Disable = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Mapi(MapiEvent),
    Store(StoreEvent),
    Rpc(RpcEvent),
    Session(SessionEvent),
}

/// MAPI call status set. Everything a verb can report to a client other
/// than success maps onto exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapiEvent {
    Error = 0,
    NullObject = 1,
    NotSupported = 2,
    AccessDenied = 3,
    NotFound = 4,
    DuplicateName = 5,
    InvalidParam = 6,
    ServerOom = 7,
    NotSearchFolder = 8,
    SearchFolderScopeViolation = 9,
    NotInitialized = 10,
    FolderCycle = 11,
    StreamSeekError = 12,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreEvent {
    NotConfigured = 0,
    DataError = 1,
    DecodeError = 2,
    UnexpectedValue = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcEvent {
    ConnectionStart = 0,
    ConnectionError = 1,
    ServerDown = 2,
    Reconnected = 3,
    PoolResized = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    Logon = 0,
    ReleaseHandles = 1,
    StreamFlushError = 2,
    NonReadReceipt = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    AccountId,
    SessionId,
    LogonId,
    Handle,
    FolderId,
    MessageId,
    TableId,
    Tag,
    Details,
    Reason,
    CausedBy,
    Code,
    Path,
    Name,
    Size,
    Total,
    Elapsed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Static(&'static str),
    String(String),
    UInt(u64),
    Int(i64),
    Bool(bool),
    Elapsed(u64),
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event<T> {
    pub inner: T,
    pub keys: Vec<(Key, Value)>,
}

pub type Error = Event<EventType>;
pub type Result<T> = std::result::Result<T, Error>;

impl<T> Event<T> {
    pub fn new(inner: T) -> Self {
        Event {
            inner,
            keys: Vec::with_capacity(4),
        }
    }

    pub fn ctx(mut self, key: Key, value: impl Into<Value>) -> Self {
        self.keys.push((key, value.into()));
        self
    }

    pub fn value(&self, key: Key) -> Option<&Value> {
        self.keys.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

impl Error {
    pub fn details(self, details: impl Into<Value>) -> Self {
        self.ctx(Key::Details, details)
    }

    pub fn reason(self, reason: impl fmt::Display) -> Self {
        self.ctx(Key::Reason, reason.to_string())
    }

    pub fn code(self, code: u64) -> Self {
        self.ctx(Key::Code, code)
    }

    pub fn caused_by(self, location: &'static str) -> Self {
        self.ctx(Key::CausedBy, location)
    }

    pub fn matches(&self, typ: EventType) -> bool {
        self.inner == typ
    }

    pub fn is_mapi(&self, event: MapiEvent) -> bool {
        self.inner == EventType::Mapi(event)
    }

    /// Status code reported across the RPC boundary. Driver and transport
    /// failures collapse into the generic call-failed code.
    pub fn mapi_code(&self) -> u32 {
        match self.inner {
            EventType::Mapi(event) => event.code(),
            _ => MapiEvent::Error.code(),
        }
    }

    pub fn send(self) {
        collector::Collector::submit(self);
    }
}

impl EventType {
    pub fn message(&self) -> &'static str {
        match self {
            EventType::Mapi(event) => event.message(),
            EventType::Store(event) => match event {
                StoreEvent::NotConfigured => "Store not configured",
                StoreEvent::DataError => "Store data error",
                StoreEvent::DecodeError => "Failed to decode value",
                StoreEvent::UnexpectedValue => "Unexpected value",
            },
            EventType::Rpc(event) => match event {
                RpcEvent::ConnectionStart => "Backend connection established",
                RpcEvent::ConnectionError => "Backend connection error",
                RpcEvent::ServerDown => "Backend server down",
                RpcEvent::Reconnected => "Backend connection rebuilt",
                RpcEvent::PoolResized => "Connection pool resized",
            },
            EventType::Session(event) => match event {
                SessionEvent::Logon => "Mailbox logon",
                SessionEvent::ReleaseHandles => "Released object handles",
                SessionEvent::StreamFlushError => "Failed to flush stream on release",
                SessionEvent::NonReadReceipt => "Queued non-read receipt",
            },
        }
    }

    /// Default collector level. Per-request MAPI statuses are debug noise;
    /// infrastructure faults are warnings or errors.
    pub fn level(&self) -> Level {
        match self {
            EventType::Mapi(_) => Level::Debug,
            EventType::Store(_) => Level::Error,
            EventType::Rpc(RpcEvent::ConnectionStart | RpcEvent::PoolResized) => Level::Info,
            EventType::Rpc(_) => Level::Warn,
            EventType::Session(SessionEvent::StreamFlushError) => Level::Warn,
            EventType::Session(_) => Level::Debug,
        }
    }

    pub fn into_err(self) -> Error {
        Error::new(self)
    }

    pub(crate) const fn id(&self) -> usize {
        match self {
            EventType::Mapi(event) => *event as usize,
            EventType::Store(event) => MAPI_EVENT_COUNT + *event as usize,
            EventType::Rpc(event) => MAPI_EVENT_COUNT + STORE_EVENT_COUNT + *event as usize,
            EventType::Session(event) => {
                MAPI_EVENT_COUNT + STORE_EVENT_COUNT + RPC_EVENT_COUNT + *event as usize
            }
        }
    }
}

const MAPI_EVENT_COUNT: usize = 13;
const STORE_EVENT_COUNT: usize = 4;
const RPC_EVENT_COUNT: usize = 5;
const SESSION_EVENT_COUNT: usize = 4;
pub(crate) const TOTAL_EVENT_COUNT: usize =
    MAPI_EVENT_COUNT + STORE_EVENT_COUNT + RPC_EVENT_COUNT + SESSION_EVENT_COUNT;

impl MapiEvent {
    pub fn message(&self) -> &'static str {
        match self {
            MapiEvent::Error => "Call failed",
            MapiEvent::NullObject => "Handle does not reference an object",
            MapiEvent::NotSupported => "Operation not supported on this object",
            MapiEvent::AccessDenied => "Access denied",
            MapiEvent::NotFound => "Object not found",
            MapiEvent::DuplicateName => "An object with this name already exists",
            MapiEvent::InvalidParam => "Invalid parameter",
            MapiEvent::ServerOom => "Server out of memory",
            MapiEvent::NotSearchFolder => "Folder is not a search folder",
            MapiEvent::SearchFolderScopeViolation => "Search scope violation",
            MapiEvent::NotInitialized => "Search folder not initialized",
            MapiEvent::FolderCycle => "Destination is a descendant of the source",
            MapiEvent::StreamSeekError => "Seek offset outside stream bounds",
        }
    }

    /// Wire status codes (MS-OXCDATA error set).
    pub const fn code(&self) -> u32 {
        match self {
            MapiEvent::Error => 0x8000_4005,
            MapiEvent::NullObject => 0x0000_04b9,
            MapiEvent::NotSupported => 0x8004_0102,
            MapiEvent::AccessDenied => 0x8007_0005,
            MapiEvent::NotFound => 0x8004_010f,
            MapiEvent::DuplicateName => 0x8004_0604,
            MapiEvent::InvalidParam => 0x8007_0057,
            MapiEvent::ServerOom => 0x8007_000e,
            MapiEvent::NotSearchFolder => 0x0000_0461,
            MapiEvent::SearchFolderScopeViolation => 0x0000_0490,
            MapiEvent::NotInitialized => 0x8004_0605,
            MapiEvent::FolderCycle => 0x8004_060b,
            MapiEvent::StreamSeekError => 0x8004_0600,
        }
    }

    pub const fn success_code() -> u32 {
        0
    }
}

impl From<EventType> for Error {
    fn from(typ: EventType) -> Self {
        Error::new(typ)
    }
}

impl From<MapiEvent> for Error {
    fn from(event: MapiEvent) -> Self {
        Error::new(EventType::Mapi(event))
    }
}

impl From<StoreEvent> for Error {
    fn from(event: StoreEvent) -> Self {
        Error::new(EventType::Store(event))
    }
}

impl From<RpcEvent> for Error {
    fn from(event: RpcEvent) -> Self {
        Error::new(EventType::Rpc(event))
    }
}

impl MapiEvent {
    pub fn into_err(self) -> Error {
        Error::new(EventType::Mapi(self))
    }
}

pub trait AddContext<T> {
    fn caused_by(self, location: &'static str) -> Result<T>;
    fn add_context(self, f: impl FnOnce(Error) -> Error) -> Result<T>;
}

impl<T> AddContext<T> for Result<T> {
    #[inline(always)]
    fn caused_by(self, location: &'static str) -> Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(err.caused_by(location)),
        }
    }

    #[inline(always)]
    fn add_context(self, f: impl FnOnce(Error) -> Error) -> Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(f(err)),
        }
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Static(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UInt(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::UInt(value as u64)
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::UInt(value as u64)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::UInt(value as u64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::UInt(value as u64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Duration> for Value {
    fn from(value: Duration) -> Self {
        Value::Elapsed(value.as_millis() as u64)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Static(value) => f.write_str(value),
            Value::String(value) => f.write_str(value),
            Value::UInt(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Elapsed(value) => write!(f, "{value}ms"),
            Value::None => f.write_str("(none)"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.inner.message())?;
        for (key, value) in &self.keys {
            write!(f, " ({key:?}: {value})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

#[macro_export]
macro_rules! location {
    () => {
        concat!(file!(), ":", line!())
    };
}

#[macro_export]
macro_rules! event {
    ($category:ident($event:expr) $(, $key:ident = $value:expr)* $(,)?) => {{
        let typ = $crate::EventType::$category($event);
        if $crate::collector::Collector::has_interest(typ) {
            $crate::Event::new(typ)
                $(.ctx($crate::Key::$key, $value))*
                .send();
        }
    }};
}

#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($err.into());
    };
}
