/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

mod harness;

use harness::*;
use emsmdb::{op::OpenFolderResponse, processor::LOGON_HANDLE};
use trc::MapiEvent;
use types::{
    acl::{PERMISSION_DATA_FLAG_ADD_ROW, PermissionData, Right, Rights},
    folder::{self, FolderType},
    id::Eid,
    property::{self, PropValue, TaggedPropval},
    xid::{Pcl, Xid},
};

fn subtree() -> Eid {
    Eid::local(folder::PRIVATE_FID_IPMSUBTREE)
}

#[tokio::test]
async fn create_open_delete_round_trip() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hsubtree, _) = open_folder(&session, subtree()).await;

    let created = create_folder(&session, hsubtree, FolderType::Generic, false, "X")
        .await
        .unwrap();
    assert!(!created.is_existing);
    assert!(created.handle > 0);

    // Reopening yields the same folder with the full access mask
    let OpenFolderResponse::Opened { handle, has_rules } = session
        .rop_open_folder(0, LOGON_HANDLE, created.folder_id, 0)
        .await
        .unwrap()
    else {
        panic!("expected an opened folder");
    };
    assert!(!has_rules);
    let store = env.server.store();
    assert_eq!(
        store
            .get_folder_property(DIR, 0, created.folder_id, property::PR_DISPLAY_NAME)
            .await
            .unwrap()
            .and_then(|v| v.as_str().map(String::from)),
        Some("X".to_string())
    );
    assert!(handle > 0);

    let partial = session
        .rop_delete_folder(
            0,
            hsubtree,
            emsmdb::op::folder::DEL_MESSAGES | emsmdb::op::folder::DEL_FOLDERS,
            created.folder_id,
        )
        .await
        .unwrap();
    assert!(!partial);
    assert!(
        !store.check_folder_id(DIR, created.folder_id).await.unwrap()
            || store
                .check_folder_deleted(DIR, created.folder_id)
                .await
                .unwrap()
    );

    // Deleting an already vanished folder is a clean no-op
    let partial = session
        .rop_delete_folder(
            0,
            hsubtree,
            emsmdb::op::folder::DELETE_HARD_DELETE,
            Eid::local(0xdead_beef),
        )
        .await
        .unwrap();
    assert!(!partial);
}

#[tokio::test]
async fn duplicate_names_are_rejected() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hsubtree, _) = open_folder(&session, subtree()).await;

    let first = create_folder(&session, hsubtree, FolderType::Generic, false, "X")
        .await
        .unwrap();
    let err = create_folder(&session, hsubtree, FolderType::Generic, false, "X")
        .await
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::DuplicateName));

    // open_existing with a mismatched type is still a collision
    let err = create_folder(&session, hsubtree, FolderType::Search, true, "X")
        .await
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::DuplicateName));

    let reopened = create_folder(&session, hsubtree, FolderType::Generic, true, "X")
        .await
        .unwrap();
    assert_eq!(reopened.folder_id, first.folder_id);
    assert!(!reopened.is_existing);
}

#[tokio::test]
async fn system_folders_are_protected() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hsubtree, _) = open_folder(&session, subtree()).await;

    let err = session
        .rop_delete_folder(0, hsubtree, 0, Eid::local(folder::PRIVATE_FID_INBOX))
        .await
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::AccessDenied));

    let err = session
        .rop_move_folder(
            0,
            hsubtree,
            hsubtree,
            false,
            Eid::local(folder::PRIVATE_FID_INBOX),
            b"Inbox2",
        )
        .await
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::AccessDenied));
}

#[tokio::test]
async fn move_into_descendant_is_a_cycle() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hsubtree, _) = open_folder(&session, subtree()).await;

    let a = create_folder(&session, hsubtree, FolderType::Generic, false, "A")
        .await
        .unwrap();
    let b = session
        .rop_create_folder(0, a.handle, FolderType::Generic, false, false, b"B", b"")
        .await
        .unwrap();
    let (hb, _) = open_folder(&session, b.folder_id).await;

    let err = session
        .rop_move_folder(0, hsubtree, hb, false, a.folder_id, b"A")
        .await
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::FolderCycle));
}

#[tokio::test]
async fn move_stamps_a_new_change_identity() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hsubtree, _) = open_folder(&session, subtree()).await;

    let a = create_folder(&session, hsubtree, FolderType::Generic, false, "A")
        .await
        .unwrap();
    let b = create_folder(&session, hsubtree, FolderType::Generic, false, "B")
        .await
        .unwrap();
    let (hb, _) = open_folder(&session, b.folder_id).await;

    let store = env.server.store();
    let cn_before = store
        .get_folder_property(DIR, 0, a.folder_id, property::PR_CHANGE_NUMBER)
        .await
        .unwrap()
        .and_then(|v| v.as_u64())
        .unwrap();

    let partial = session
        .rop_move_folder(0, hsubtree, hb, false, a.folder_id, b"A moved")
        .await
        .unwrap();
    assert!(!partial);

    let cn_after = store
        .get_folder_property(DIR, 0, a.folder_id, property::PR_CHANGE_NUMBER)
        .await
        .unwrap()
        .and_then(|v| v.as_u64())
        .unwrap();
    assert!(cn_after > cn_before);

    // The PCL carries exactly one entry for this mailbox, at the new CN
    let pcl = store
        .get_folder_property(DIR, 0, a.folder_id, property::PR_PREDECESSOR_CHANGE_LIST)
        .await
        .unwrap()
        .and_then(|v| v.as_bytes().map(|b| Pcl::parse(b).unwrap()))
        .unwrap();
    assert_eq!(pcl.len(), 1);
    let logon_guid = env.memory.mailbox_info(DIR).unwrap().guid;
    assert!(pcl.contains(&Xid::new(logon_guid, types::id::Cn::new(cn_after))));

    // Moving into a folder that already has the name collides
    let c = create_folder(&session, hb, FolderType::Generic, false, "C")
        .await
        .unwrap();
    let err = session
        .rop_move_folder(0, hb, hb, false, c.folder_id, b"A moved")
        .await
        .map(|_| ())
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::DuplicateName));
}

#[tokio::test]
async fn copy_folder_keeps_the_source() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hsubtree, _) = open_folder(&session, subtree()).await;

    let a = create_folder(&session, hsubtree, FolderType::Generic, false, "A")
        .await
        .unwrap();
    let b = create_folder(&session, hsubtree, FolderType::Generic, false, "B")
        .await
        .unwrap();
    let (hb, _) = open_folder(&session, b.folder_id).await;

    let partial = session
        .rop_copy_folder(0, hsubtree, hb, false, a.folder_id, b"A copy")
        .await
        .unwrap();
    assert!(!partial);

    let store = env.server.store();
    assert!(store.check_folder_id(DIR, a.folder_id).await.unwrap());
    assert!(
        store
            .get_folder_by_name(DIR, b.folder_id, "A copy")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn invisible_folders_read_as_missing() {
    let env = test_env();
    let owner = owner_session(&env).await;
    let (hsubtree, _) = open_folder(&owner, subtree()).await;
    let hidden = create_folder(&owner, hsubtree, FolderType::Generic, false, "Hidden")
        .await
        .unwrap();

    let delegate = delegate_session(&env, "bob").await;
    let err = delegate
        .rop_open_folder(0, LOGON_HANDLE, hidden.folder_id, 0)
        .await
        .map(|_| ())
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::NotFound), "expected NotFound, not AccessDenied");

    // Granting Visible turns the same call into a read-only open
    let (hf, _) = open_folder(&owner, hidden.folder_id).await;
    owner
        .rop_modify_permissions(
            0,
            hf,
            0,
            vec![PermissionData {
                flags: PERMISSION_DATA_FLAG_ADD_ROW,
                propvals: vec![
                    TaggedPropval::new(
                        property::PR_MEMBER_NAME,
                        PropValue::Unicode("bob".to_string()),
                    ),
                    TaggedPropval::new(
                        property::PR_MEMBER_RIGHTS,
                        PropValue::Long(u64::from(Rights::from(Right::Visible)) as u32),
                    ),
                ],
            }],
        )
        .await
        .unwrap();

    let OpenFolderResponse::Opened { handle, .. } = delegate
        .rop_open_folder(0, LOGON_HANDLE, hidden.folder_id, 0)
        .await
        .unwrap()
    else {
        panic!("expected an opened folder");
    };
    assert!(handle > 0);

    // Visible alone still leaves the folder browsable but empty-handed
    let table = delegate
        .rop_get_hierarchy_table(0, handle, 0)
        .await
        .unwrap();
    assert_eq!(table.row_count, 0);
}

#[tokio::test]
async fn ghosted_public_folders_refer_to_their_replica() {
    let env = test_env();
    let session = public_session(&env, "carol").await;
    match session
        .rop_open_folder(0, LOGON_HANDLE, Eid::from_parts(3, 0x99), 0)
        .await
        .unwrap()
    {
        OpenFolderResponse::Ghost(ghost) => {
            assert_eq!(ghost.servers, vec!["ghost.example.net".to_string()]);
        }
        OpenFolderResponse::Opened { .. } => panic!("expected a referral"),
    }

    // Private stores reject foreign replicas outright
    let owner = owner_session(&env).await;
    let err = owner
        .rop_open_folder(0, LOGON_HANDLE, Eid::from_parts(3, 0x99), 0)
        .await
        .map(|_| ())
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::InvalidParam));
}

#[tokio::test]
async fn handles_cascade_on_release() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hsubtree, _) = open_folder(&session, subtree()).await;
    let a = create_folder(&session, hsubtree, FolderType::Generic, false, "A")
        .await
        .unwrap();
    let table = session.rop_get_hierarchy_table(0, a.handle, 0).await.unwrap();

    session.rop_release(0, a.handle).await;
    let err = session
        .rop_get_hierarchy_table(0, a.handle, 0)
        .await
        .map(|_| ())
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::NullObject));
    let err = session
        .rop_query_rows(0, table.handle, 10)
        .await
        .map(|_| ())
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::NullObject));

    // Handles survive until then; the subtree handle is untouched
    assert!(session.rop_get_hierarchy_table(0, hsubtree, 0).await.is_ok());
}
