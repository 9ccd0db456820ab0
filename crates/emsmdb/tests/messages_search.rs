/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

mod harness;

use harness::*;
use common::DeliveryEvent;
use emsmdb::processor::LOGON_HANDLE;
use trc::MapiEvent;
use types::{
    acl::{PERMISSION_DATA_FLAG_ADD_ROW, PermissionData, Right, Rights},
    folder::{self, FolderType},
    id::Eid,
    property::{self, PropValue, TaggedPropval},
    restriction::{FUZZY_LEVEL_SUBSTRING, Restriction},
    search::{SEARCH_FLAG_RESTART, SearchStatus},
};

fn inbox() -> Eid {
    Eid::local(folder::PRIVATE_FID_INBOX)
}

fn unread_message(memory: &store::backend::memory::MemoryStore, owner: &str) -> Eid {
    memory
        .create_message(
            DIR,
            inbox(),
            owner,
            false,
            vec![
                TaggedPropval::new(
                    property::PR_SUBJECT,
                    PropValue::Unicode("hello".to_string()),
                ),
                TaggedPropval::new(
                    property::PR_NON_RECEIPT_NOTIFICATION_REQUESTED,
                    PropValue::Bool(true),
                ),
                TaggedPropval::new(property::PR_READ, PropValue::Bool(false)),
            ],
        )
        .unwrap()
}

#[tokio::test]
async fn delete_unread_message_emits_a_receipt() {
    let mut env = test_env();
    let session = owner_session(&env).await;
    let (hinbox, _) = open_folder(&session, inbox()).await;
    let message_id = unread_message(&env.memory, "ana");

    let partial = session
        .rop_delete_messages(0, hinbox, true, &[message_id])
        .await
        .unwrap();
    assert!(!partial);

    match env.delivery_rx.try_recv().unwrap() {
        DeliveryEvent::NonReadReceipt { dir, brief } => {
            assert_eq!(dir, DIR);
            assert_eq!(brief.message_id, message_id);
            assert_eq!(brief.subject, "hello");
        }
        other => panic!("unexpected delivery event: {other:?}"),
    }
    let store = env.server.store();
    assert_eq!(store.sum_content(DIR, inbox(), false, false).await.unwrap(), 0);

    // An empty id list is a no-op success
    let partial = session
        .rop_delete_messages(0, hinbox, true, &[])
        .await
        .unwrap();
    assert!(!partial);
    assert!(env.delivery_rx.try_recv().is_err());
}

#[tokio::test]
async fn read_messages_do_not_emit_receipts() {
    let mut env = test_env();
    let session = owner_session(&env).await;
    let (hinbox, _) = open_folder(&session, inbox()).await;
    let message_id = env
        .memory
        .create_message(
            DIR,
            inbox(),
            "ana",
            false,
            vec![
                TaggedPropval::new(
                    property::PR_NON_RECEIPT_NOTIFICATION_REQUESTED,
                    PropValue::Bool(true),
                ),
                TaggedPropval::new(property::PR_READ, PropValue::Bool(true)),
            ],
        )
        .unwrap();

    let partial = session
        .rop_delete_messages(0, hinbox, true, &[message_id])
        .await
        .unwrap();
    assert!(!partial);
    assert!(env.delivery_rx.try_recv().is_err());
}

#[tokio::test]
async fn delete_owned_restricts_the_scope() {
    let env = test_env();
    let owner = owner_session(&env).await;
    let (hinbox, _) = open_folder(&owner, inbox()).await;
    owner
        .rop_modify_permissions(
            0,
            hinbox,
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
                        PropValue::Long(
                            u64::from(
                                Rights::from(Right::Visible)
                                    .with_item(Right::ReadAny)
                                    .with_item(Right::DeleteOwned),
                            ) as u32,
                        ),
                    ),
                ],
            }],
        )
        .await
        .unwrap();

    let anas = env
        .memory
        .create_message(DIR, inbox(), "ana", false, Vec::new())
        .unwrap();
    let bobs = env
        .memory
        .create_message(DIR, inbox(), "bob", false, Vec::new())
        .unwrap();

    let delegate = delegate_session(&env, "bob").await;
    let (hinbox_bob, _) = open_folder(&delegate, inbox()).await;
    let partial = delegate
        .rop_delete_messages(0, hinbox_bob, false, &[anas, bobs])
        .await
        .unwrap();
    assert!(partial, "the foreign message must be skipped");

    let store = env.server.store();
    assert_eq!(store.sum_content(DIR, inbox(), false, false).await.unwrap(), 1);
    // The delete was soft: bob's message moved to the soft-deleted view
    assert_eq!(store.sum_content(DIR, inbox(), false, true).await.unwrap(), 1);
    assert!(store.check_message_owner(DIR, anas, "ana").await.unwrap());
}

#[tokio::test]
async fn empty_folder_scrubs_contents() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hinbox, _) = open_folder(&session, inbox()).await;
    env.memory
        .create_message(DIR, inbox(), "ana", false, Vec::new())
        .unwrap();
    env.memory
        .create_message(DIR, inbox(), "ana", true, Vec::new())
        .unwrap();

    let partial = session.rop_empty_folder(0, hinbox, true).await.unwrap();
    assert!(!partial);
    let store = env.server.store();
    assert_eq!(store.sum_content(DIR, inbox(), false, false).await.unwrap(), 0);
    assert_eq!(store.sum_content(DIR, inbox(), true, false).await.unwrap(), 0);

    // Root and IPM subtree refuse to be emptied
    let (hsubtree, _) = open_folder(&session, Eid::local(folder::PRIVATE_FID_IPMSUBTREE)).await;
    let err = session
        .rop_empty_folder(0, hsubtree, false)
        .await
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::AccessDenied));
}

#[tokio::test]
async fn empty_folder_is_private_only() {
    let env = test_env();
    let session = public_session(&env, "carol").await;
    let (hroot, _) = open_folder(&session, Eid::local(folder::PUBLIC_FID_ROOT)).await;
    let err = session.rop_empty_folder(0, hroot, false).await.unwrap_err();
    assert!(err.is_mapi(MapiEvent::NotSupported));
}

#[tokio::test]
async fn search_folder_constraints() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hsubtree, _) = open_folder(&session, Eid::local(folder::PRIVATE_FID_IPMSUBTREE)).await;

    // Search folders cannot exist in public stores
    let public = public_session(&env, "carol").await;
    let (hpub, _) = open_folder(&public, Eid::local(folder::PUBLIC_FID_ROOT)).await;
    let err = create_folder(&public, hpub, FolderType::Search, false, "Q")
        .await
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::NotSupported));

    // SetSearchCriteria on a generic folder is refused
    let generic = create_folder(&session, hsubtree, FolderType::Generic, false, "Plain")
        .await
        .unwrap();
    let err = session
        .rop_set_search_criteria(0, generic.handle, 0, None, vec![inbox()])
        .await
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::NotSearchFolder));

    let search = create_folder(&session, hsubtree, FolderType::Search, false, "Q")
        .await
        .unwrap();

    // Uninitialized searches cannot be stopped or restarted bare
    let err = session
        .rop_set_search_criteria(0, search.handle, 0, None, Vec::new())
        .await
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::NotInitialized));

    // Foreign-replica scope folders are rejected
    let restriction = Restriction::Content {
        fuzzy_level: FUZZY_LEVEL_SUBSTRING,
        proptag: property::PR_SUBJECT,
        propval: TaggedPropval::new(
            property::PR_SUBJECT,
            PropValue::Unicode("report".to_string()),
        ),
    };
    let err = session
        .rop_set_search_criteria(
            0,
            search.handle,
            0,
            Some(restriction.clone()),
            vec![Eid::from_parts(9, 0x10)],
        )
        .await
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::SearchFolderScopeViolation));

    session
        .rop_set_search_criteria(0, search.handle, 0, Some(restriction.clone()), vec![inbox()])
        .await
        .unwrap();

    let criteria = session
        .rop_get_search_criteria(0, search.handle, true, true, true)
        .await
        .unwrap();
    assert_eq!(criteria.folder_ids, vec![inbox()]);
    assert_eq!(criteria.restriction, Some(restriction));
    assert_eq!(criteria.search_status, SearchStatus::Stopped);
    assert_ne!(criteria.search_flags & types::search::SEARCH_FLAG_STOP, 0);

    // Restarting without new criteria reuses the stored ones
    session
        .rop_set_search_criteria(0, search.handle, SEARCH_FLAG_RESTART, None, Vec::new())
        .await
        .unwrap();
    let criteria = session
        .rop_get_search_criteria(0, search.handle, true, true, true)
        .await
        .unwrap();
    assert_eq!(criteria.search_status, SearchStatus::Complete);
    assert!(criteria.restriction.is_some());
}

#[tokio::test]
async fn get_search_criteria_converts_string_form() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hsubtree, _) = open_folder(&session, Eid::local(folder::PRIVATE_FID_IPMSUBTREE)).await;
    let search = create_folder(&session, hsubtree, FolderType::Search, false, "Q8")
        .await
        .unwrap();

    let restriction = Restriction::Content {
        fuzzy_level: FUZZY_LEVEL_SUBSTRING,
        proptag: types::property::change_prop_type(
            property::PR_SUBJECT,
            types::property::PT_STRING8,
        ),
        propval: TaggedPropval::new(
            types::property::change_prop_type(property::PR_SUBJECT, types::property::PT_STRING8),
            PropValue::String8("café".to_string()),
        ),
    };
    session
        .rop_set_search_criteria(0, search.handle, 0, Some(restriction), vec![inbox()])
        .await
        .unwrap();

    // Stored form is Unicode; the 8-bit caller gets it converted back
    let unicode = session
        .rop_get_search_criteria(0, search.handle, true, true, false)
        .await
        .unwrap();
    let Some(Restriction::Content { proptag, propval, .. }) = unicode.restriction else {
        panic!("expected a content restriction");
    };
    assert_eq!(proptag, property::PR_SUBJECT);
    assert_eq!(propval.value, PropValue::Unicode("café".to_string()));
    assert!(unicode.folder_ids.is_empty());

    let string8 = session
        .rop_get_search_criteria(0, search.handle, false, true, true)
        .await
        .unwrap();
    let Some(Restriction::Content { proptag, propval, .. }) = string8.restriction else {
        panic!("expected a content restriction");
    };
    assert_eq!(
        proptag,
        types::property::change_prop_type(property::PR_SUBJECT, types::property::PT_STRING8)
    );
    assert_eq!(propval.value, PropValue::String8("café".to_string()));
}

#[tokio::test]
async fn movecopy_messages_between_folders() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hinbox, _) = open_folder(&session, inbox()).await;
    let (hdrafts, _) = open_folder(&session, Eid::local(folder::PRIVATE_FID_DRAFT)).await;
    let message_id = env
        .memory
        .create_message(DIR, inbox(), "ana", false, Vec::new())
        .unwrap();

    // Copy leaves the original in place
    let partial = session
        .rop_movecopy_messages(0, hinbox, hdrafts, &[message_id], true)
        .await
        .unwrap();
    assert!(!partial);
    let store = env.server.store();
    assert_eq!(store.sum_content(DIR, inbox(), false, false).await.unwrap(), 1);
    assert_eq!(
        store
            .sum_content(DIR, Eid::local(folder::PRIVATE_FID_DRAFT), false, false)
            .await
            .unwrap(),
        1
    );

    // Move removes it
    let partial = session
        .rop_movecopy_messages(0, hinbox, hdrafts, &[message_id], false)
        .await
        .unwrap();
    assert!(!partial);
    assert_eq!(store.sum_content(DIR, inbox(), false, false).await.unwrap(), 0);
}
