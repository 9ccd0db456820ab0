/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::property::TaggedPropval;
use std::fmt::{self, Display};
use utils::map::bitmap::{Bitmap, BitmapItem};

/// Folder rights. Discriminants are the wire bit positions, so
/// `Bitmap<Right>` packs to the PR_MEMBER_RIGHTS mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Deserialize)]
#[repr(u8)]
pub enum Right {
    ReadAny = 0,
    Create = 1,
    SendAs = 2,
    EditOwned = 3,
    DeleteOwned = 4,
    EditAny = 5,
    DeleteAny = 6,
    CreateSubfolder = 7,
    Owner = 8,
    Contact = 9,
    Visible = 10,
    FreeBusySimple = 11,
    FreeBusyDetailed = 12,
    None = 13,
}

pub type Rights = Bitmap<Right>;

impl Right {
    fn as_str(&self) -> &'static str {
        match self {
            Right::ReadAny => "readAny",
            Right::Create => "create",
            Right::SendAs => "sendAs",
            Right::EditOwned => "editOwned",
            Right::DeleteOwned => "deleteOwned",
            Right::EditAny => "editAny",
            Right::DeleteAny => "deleteAny",
            Right::CreateSubfolder => "createSubfolder",
            Right::Owner => "owner",
            Right::Contact => "contact",
            Right::Visible => "visible",
            Right::FreeBusySimple => "freeBusySimple",
            Right::FreeBusyDetailed => "freeBusyDetailed",
            Right::None => "",
        }
    }

    /// Everything a mailbox owner holds on their own folders.
    pub fn owner_rights() -> Rights {
        Rights::new()
            .with_item(Right::ReadAny)
            .with_item(Right::Create)
            .with_item(Right::EditOwned)
            .with_item(Right::DeleteOwned)
            .with_item(Right::EditAny)
            .with_item(Right::DeleteAny)
            .with_item(Right::CreateSubfolder)
            .with_item(Right::Owner)
            .with_item(Right::Visible)
    }

    /// Rights stamped on the initial ACL row for a delegate who created a
    /// folder inside someone else's mailbox.
    pub fn creator_rights() -> Rights {
        Right::owner_rights().with_item(Right::Contact)
    }
}

impl Display for Right {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl serde::Serialize for Right {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl BitmapItem for Right {
    fn max() -> u64 {
        Right::None as u64
    }

    fn is_valid(&self) -> bool {
        !matches!(self, Right::None)
    }
}

impl From<Right> for u64 {
    fn from(value: Right) -> Self {
        value as u64
    }
}

impl From<u64> for Right {
    fn from(value: u64) -> Self {
        match value {
            0 => Right::ReadAny,
            1 => Right::Create,
            2 => Right::SendAs,
            3 => Right::EditOwned,
            4 => Right::DeleteOwned,
            5 => Right::EditAny,
            6 => Right::DeleteAny,
            7 => Right::CreateSubfolder,
            8 => Right::Owner,
            9 => Right::Contact,
            10 => Right::Visible,
            11 => Right::FreeBusySimple,
            12 => Right::FreeBusyDetailed,
            _ => Right::None,
        }
    }
}

pub const PERMISSION_DATA_FLAG_ADD_ROW: u8 = 0x01;
pub const PERMISSION_DATA_FLAG_MODIFY_ROW: u8 = 0x02;
pub const PERMISSION_DATA_FLAG_REMOVE_ROW: u8 = 0x04;

/// One ACL table update forwarded to the driver by ModifyPermissions.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PermissionData {
    pub flags: u8,
    pub propvals: Vec<TaggedPropval>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rights_pack_to_wire_mask() {
        let rights = Rights::new()
            .with_item(Right::ReadAny)
            .with_item(Right::CreateSubfolder)
            .with_item(Right::Visible);
        assert_eq!(u64::from(rights), 0x481);
        assert_eq!(Rights::from(0x481u64), rights);
        assert!(Right::owner_rights().contains(Right::Owner));
        assert!(!Right::owner_rights().contains(Right::Contact));
        assert!(Right::creator_rights().contains(Right::Contact));
    }
}
