/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

/// Property types (low word of a property tag).
pub const PT_SHORT: u16 = 0x0002;
pub const PT_LONG: u16 = 0x0003;
pub const PT_BOOLEAN: u16 = 0x000b;
pub const PT_I8: u16 = 0x0014;
pub const PT_STRING8: u16 = 0x001e;
pub const PT_UNICODE: u16 = 0x001f;
pub const PT_SYSTIME: u16 = 0x0040;
pub const PT_BINARY: u16 = 0x0102;

pub const PR_SUBJECT: u32 = 0x0037_001f;
pub const PR_SENDER_NAME: u32 = 0x0c1a_001f;
pub const PR_MESSAGE_DELIVERY_TIME: u32 = 0x0e06_0040;
pub const PR_ACCESS: u32 = 0x0ff4_0003;
pub const PR_NON_RECEIPT_NOTIFICATION_REQUESTED: u32 = 0x0c06_000b;
pub const PR_READ: u32 = 0x0e69_000b;
pub const PR_ENTRYID: u32 = 0x0fff_0102;
pub const PR_DISPLAY_NAME: u32 = 0x3001_001f;
pub const PR_COMMENT: u32 = 0x3004_001f;
pub const PR_CREATION_TIME: u32 = 0x3007_0040;
pub const PR_LAST_MODIFICATION_TIME: u32 = 0x3008_0040;
pub const PR_FOLDER_TYPE: u32 = 0x3601_0003;
pub const PR_CONTENT_COUNT: u32 = 0x3602_0003;
pub const PR_SUBFOLDERS: u32 = 0x360a_000b;
pub const PR_HAS_RULES: u32 = 0x663a_000b;
pub const PR_CHANGE_KEY: u32 = 0x65e2_0102;
pub const PR_PREDECESSOR_CHANGE_LIST: u32 = 0x65e3_0102;
pub const PR_MEMBER_ID: u32 = 0x6671_0014;
pub const PR_MEMBER_NAME: u32 = 0x6672_001f;
pub const PR_MEMBER_RIGHTS: u32 = 0x6673_0003;
pub const PR_FOLDER_ID: u32 = 0x6748_0014;
pub const PR_MID: u32 = 0x674a_0014;
pub const PR_PARENT_FOLDER_ID: u32 = 0x6749_0014;
pub const PR_CHANGE_NUMBER: u32 = 0x67a4_0014;

#[inline(always)]
pub const fn prop_type(tag: u32) -> u16 {
    tag as u16
}

#[inline(always)]
pub const fn prop_id(tag: u32) -> u16 {
    (tag >> 16) as u16
}

#[inline(always)]
pub const fn change_prop_type(tag: u32, prop_type: u16) -> u32 {
    (tag & 0xffff_0000) | prop_type as u32
}

/// Typed property value. The variant always matches the tag's type word.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PropValue {
    Short(u16),
    Long(u32),
    Bool(bool),
    LongLong(u64),
    SysTime(u64),
    String8(String),
    Unicode(String),
    Binary(Vec<u8>),
}

impl PropValue {
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            PropValue::Short(value) => Some(*value as u32),
            PropValue::Long(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            PropValue::Short(value) => Some(*value as u64),
            PropValue::Long(value) => Some(*value as u64),
            PropValue::LongLong(value) | PropValue::SysTime(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::String8(value) | PropValue::Unicode(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PropValue::Binary(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TaggedPropval {
    pub tag: u32,
    pub value: PropValue,
}

impl TaggedPropval {
    pub fn new(tag: u32, value: PropValue) -> Self {
        TaggedPropval { tag, value }
    }
}

pub trait PropvalList {
    fn get_value(&self, tag: u32) -> Option<&PropValue>;
}

impl PropvalList for [TaggedPropval] {
    fn get_value(&self, tag: u32) -> Option<&PropValue> {
        self.iter()
            .find(|propval| propval.tag == tag)
            .map(|propval| &propval.value)
    }
}

/// Property the driver could not apply, with its status code.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PropertyProblem {
    pub index: u16,
    pub tag: u32,
    pub status: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_words() {
        assert_eq!(prop_type(PR_DISPLAY_NAME), PT_UNICODE);
        assert_eq!(prop_id(PR_DISPLAY_NAME), 0x3001);
        assert_eq!(
            change_prop_type(PR_DISPLAY_NAME, PT_STRING8),
            0x3001_001e
        );
    }

    #[test]
    fn propval_lookup() {
        let propvals = [
            TaggedPropval::new(PR_FOLDER_TYPE, PropValue::Long(1)),
            TaggedPropval::new(PR_HAS_RULES, PropValue::Bool(true)),
        ];
        assert_eq!(
            propvals.get_value(PR_FOLDER_TYPE).and_then(|v| v.as_u32()),
            Some(1)
        );
        assert_eq!(
            propvals.get_value(PR_HAS_RULES).and_then(|v| v.as_bool()),
            Some(true)
        );
        assert_eq!(propvals.get_value(PR_READ), None);
    }
}
