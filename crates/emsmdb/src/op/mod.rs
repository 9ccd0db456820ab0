/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod folder;
pub mod permission;
pub mod search;
pub mod stream;
pub mod table;

use trc::MapiEvent;
use types::{id::Eid, restriction::Restriction, search::SearchStatus};
use utils::codec::charset;

/// Referral to the replica that owns a ghosted public folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostServer {
    pub servers: Vec<String>,
}

#[derive(Debug)]
pub enum OpenFolderResponse {
    Opened { handle: u32, has_rules: bool },
    Ghost(GhostServer),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateFolderResponse {
    pub handle: u32,
    pub folder_id: Eid,
    /// Always false, matching Exchange 2010 and later even when an
    /// existing folder was opened.
    pub is_existing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableResponse {
    pub handle: u32,
    pub row_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetSearchCriteriaResponse {
    pub search_flags: u32,
    pub search_status: SearchStatus,
    pub restriction: Option<Restriction>,
    pub folder_ids: Vec<Eid>,
}

/// Decode a wire string per the unicode flag, enforcing the verb's octet
/// limit. The limit counts the 8-bit form, terminator included.
pub(crate) fn decode_wire_string(
    data: &[u8],
    unicode: bool,
    limit: usize,
) -> trc::Result<String> {
    let value = if unicode {
        charset::decode_utf16_le(data).ok_or_else(|| {
            MapiEvent::InvalidParam
                .into_err()
                .details("malformed UTF-16 string")
        })?
    } else {
        charset::decode_string8(data)
    };
    if charset::encode_string8(&value).len() >= limit {
        return Err(MapiEvent::InvalidParam
            .into_err()
            .details("string exceeds the wire limit")
            .ctx(trc::Key::Size, value.len()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_string_limits() {
        assert_eq!(
            decode_wire_string(b"Projects\0", false, 256).unwrap(),
            "Projects"
        );
        let long = vec![b'x'; 256];
        assert!(
            decode_wire_string(&long, false, 256)
                .unwrap_err()
                .is_mapi(MapiEvent::InvalidParam)
        );
        let utf16 = charset::encode_utf16_le("Tâches");
        assert_eq!(decode_wire_string(&utf16, true, 256).unwrap(), "Tâches");
        assert!(
            decode_wire_string(&[0x41], true, 256)
                .unwrap_err()
                .is_mapi(MapiEvent::InvalidParam)
        );
    }
}
