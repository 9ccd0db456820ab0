/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::property::{self, PT_STRING8, PT_UNICODE, PropValue, TaggedPropval};
use utils::codec::charset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum RelOp {
    Lt = 0,
    Le = 1,
    Gt = 2,
    Ge = 3,
    Eq = 4,
    Ne = 5,
    RegexMatch = 6,
}

pub const FUZZY_LEVEL_FULL_STRING: u32 = 0;
pub const FUZZY_LEVEL_SUBSTRING: u32 = 1;
pub const FUZZY_LEVEL_PREFIX: u32 = 2;
pub const FL_IGNORECASE: u32 = 0x0001_0000;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Restriction {
    And(Vec<Restriction>),
    Or(Vec<Restriction>),
    Not(Box<Restriction>),
    Content {
        fuzzy_level: u32,
        proptag: u32,
        propval: TaggedPropval,
    },
    Property {
        relop: RelOp,
        proptag: u32,
        propval: TaggedPropval,
    },
    Bitmask {
        set: bool,
        proptag: u32,
        mask: u32,
    },
    Exist {
        proptag: u32,
    },
}

impl Restriction {
    /// Normalize every string comparand to the requested form, adjusting
    /// the tag's type word to match. The store evaluates Unicode only;
    /// the 8-bit form exists for callers that did not set the unicode bit.
    pub fn convert_string_form(&mut self, to_unicode: bool) {
        match self {
            Restriction::And(list) | Restriction::Or(list) => {
                for res in list {
                    res.convert_string_form(to_unicode);
                }
            }
            Restriction::Not(res) => res.convert_string_form(to_unicode),
            Restriction::Content { proptag, propval, .. }
            | Restriction::Property { proptag, propval, .. } => {
                convert_propval(propval, to_unicode);
                *proptag = convert_tag(*proptag, to_unicode);
            }
            Restriction::Bitmask { .. } | Restriction::Exist { .. } => {}
        }
    }
}

fn convert_tag(tag: u32, to_unicode: bool) -> u32 {
    match property::prop_type(tag) {
        PT_STRING8 if to_unicode => property::change_prop_type(tag, PT_UNICODE),
        PT_UNICODE if !to_unicode => property::change_prop_type(tag, PT_STRING8),
        _ => tag,
    }
}

fn convert_propval(propval: &mut TaggedPropval, to_unicode: bool) {
    propval.tag = convert_tag(propval.tag, to_unicode);
    let converted = match (&propval.value, to_unicode) {
        (PropValue::String8(value), true) => {
            // Stored 8-bit strings are already decoded; only the variant
            // and type word change.
            Some(PropValue::Unicode(value.clone()))
        }
        (PropValue::Unicode(value), false) => Some(PropValue::String8(
            charset::decode_string8(&charset::encode_string8(value)),
        )),
        _ => None,
    };
    if let Some(value) = converted {
        propval.value = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{PR_COMMENT, PR_DISPLAY_NAME};

    fn name_restriction(value: &str) -> Restriction {
        Restriction::Content {
            fuzzy_level: FUZZY_LEVEL_SUBSTRING,
            proptag: property::change_prop_type(PR_DISPLAY_NAME, PT_STRING8),
            propval: TaggedPropval::new(
                property::change_prop_type(PR_DISPLAY_NAME, PT_STRING8),
                PropValue::String8(value.to_string()),
            ),
        }
    }

    #[test]
    fn unicode_normalization_walks_the_tree() {
        let mut res = Restriction::And(vec![
            name_restriction("weekly"),
            Restriction::Not(Box::new(Restriction::Property {
                relop: RelOp::Eq,
                proptag: property::change_prop_type(PR_COMMENT, PT_STRING8),
                propval: TaggedPropval::new(
                    property::change_prop_type(PR_COMMENT, PT_STRING8),
                    PropValue::String8("done".to_string()),
                ),
            })),
            Restriction::Exist {
                proptag: PR_DISPLAY_NAME,
            },
        ]);
        res.convert_string_form(true);
        let Restriction::And(list) = &res else {
            unreachable!()
        };
        let Restriction::Content { proptag, propval, .. } = &list[0] else {
            unreachable!()
        };
        assert_eq!(*proptag, PR_DISPLAY_NAME);
        assert_eq!(propval.value, PropValue::Unicode("weekly".to_string()));
        let Restriction::Not(inner) = &list[1] else {
            unreachable!()
        };
        let Restriction::Property { proptag, .. } = &**inner else {
            unreachable!()
        };
        assert_eq!(*proptag, PR_COMMENT);

        // And back again
        res.convert_string_form(false);
        let Restriction::And(list) = &res else {
            unreachable!()
        };
        let Restriction::Content { propval, .. } = &list[0] else {
            unreachable!()
        };
        assert_eq!(propval.value, PropValue::String8("weekly".to_string()));
    }
}
