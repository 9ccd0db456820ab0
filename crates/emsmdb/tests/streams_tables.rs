/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

mod harness;

use harness::*;
use emsmdb::object::stream::MAX_LENGTH_FOR_FOLDER;
use trc::MapiEvent;
use types::{
    acl::{PERMISSION_DATA_FLAG_ADD_ROW, PermissionData, Right, Rights},
    folder::{self, FolderType},
    id::Eid,
    property::{self, PropValue, PropvalList, TaggedPropval},
    restriction::{FUZZY_LEVEL_FULL_STRING, Restriction},
    table::SortOrder,
};

fn subtree() -> Eid {
    Eid::local(folder::PRIVATE_FID_IPMSUBTREE)
}

fn inbox() -> Eid {
    Eid::local(folder::PRIVATE_FID_INBOX)
}

#[tokio::test]
async fn stream_write_seek_read_round_trip() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hsubtree, _) = open_folder(&session, subtree()).await;
    let created = create_folder(&session, hsubtree, FolderType::Generic, false, "Notes")
        .await
        .unwrap();

    let hstream = session
        .rop_open_stream(0, created.handle, property::PR_COMMENT, 1)
        .await
        .unwrap();
    let written = session
        .rop_write_stream(0, hstream, b"team notes")
        .await
        .unwrap();
    assert_eq!(written as usize, b"team notes".len());

    let position = session.rop_seek_stream(0, hstream, 0, 0).await.unwrap();
    assert_eq!(position, 0);
    let data = session.rop_read_stream(0, hstream, 10).await.unwrap();
    assert_eq!(data, b"team notes");

    // Reads past the end clamp
    let data = session.rop_read_stream(0, hstream, 100).await.unwrap();
    assert!(data.is_empty());

    // Seeking below zero is a seek error; past the end clamps
    let err = session
        .rop_seek_stream(0, hstream, 0, -5)
        .await
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::StreamSeekError));
    let position = session
        .rop_seek_stream(0, hstream, 2, 1000)
        .await
        .unwrap();
    assert_eq!(position, b"team notes".len() as u64);

    session.rop_commit_stream(0, hstream).await.unwrap();
    // A clean stream commits as a no-op
    session.rop_commit_stream(0, hstream).await.unwrap();

    let store = env.server.store();
    assert_eq!(
        store
            .get_folder_property(DIR, 0, created.folder_id, property::PR_COMMENT)
            .await
            .unwrap()
            .and_then(|v| v.as_str().map(String::from)),
        Some("team notes".to_string())
    );
}

#[tokio::test]
async fn stream_honors_its_maximum_length() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hsubtree, _) = open_folder(&session, subtree()).await;
    let created = create_folder(&session, hsubtree, FolderType::Generic, false, "Big")
        .await
        .unwrap();

    let hstream = session
        .rop_open_stream(0, created.handle, property::PR_COMMENT, 1)
        .await
        .unwrap();
    session
        .rop_set_stream_size(0, hstream, MAX_LENGTH_FOR_FOLDER as u64)
        .await
        .unwrap();

    // At capacity, writes degrade to a short count of zero
    session
        .rop_seek_stream(0, hstream, 2, 0)
        .await
        .unwrap();
    let written = session
        .rop_write_stream(0, hstream, b"overflow")
        .await
        .unwrap();
    assert_eq!(written, 0);

    let err = session
        .rop_set_stream_size(0, hstream, MAX_LENGTH_FOR_FOLDER as u64 + 1)
        .await
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::StreamSeekError));

    session.rop_set_stream_size(0, hstream, 16).await.unwrap();
    assert_eq!(session.rop_get_stream_size(0, hstream).await.unwrap(), 16);
}

#[tokio::test]
async fn dirty_streams_flush_on_release() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hsubtree, _) = open_folder(&session, subtree()).await;
    let created = create_folder(&session, hsubtree, FolderType::Generic, false, "Flush")
        .await
        .unwrap();

    let hstream = session
        .rop_open_stream(0, created.handle, property::PR_COMMENT, 1)
        .await
        .unwrap();
    session
        .rop_write_stream(0, hstream, b"pending")
        .await
        .unwrap();

    // Releasing the folder cascades to the stream and flushes it
    session.rop_release(0, created.handle).await;
    let err = session
        .rop_read_stream(0, hstream, 1)
        .await
        .map(|_| ())
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::NullObject));

    let store = env.server.store();
    assert_eq!(
        store
            .get_folder_property(DIR, 0, created.folder_id, property::PR_COMMENT)
            .await
            .unwrap()
            .and_then(|v| v.as_str().map(String::from)),
        Some("pending".to_string())
    );
}

#[tokio::test]
async fn read_only_streams_reject_writes() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hsubtree, _) = open_folder(&session, subtree()).await;
    let created = create_folder(&session, hsubtree, FolderType::Generic, false, "RO")
        .await
        .unwrap();
    let hstream = session
        .rop_open_stream(0, created.handle, property::PR_COMMENT, 0)
        .await
        .unwrap();
    let err = session
        .rop_write_stream(0, hstream, b"nope")
        .await
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::AccessDenied));
}

#[tokio::test]
async fn hierarchy_table_counts_and_cursors() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hsubtree, _) = open_folder(&session, subtree()).await;
    for name in ["One", "Two", "Three"] {
        create_folder(&session, hsubtree, FolderType::Generic, false, name)
            .await
            .unwrap();
    }

    let table = session
        .rop_get_hierarchy_table(0, hsubtree, 0)
        .await
        .unwrap();
    // The subtree starts with the provisioned defaults plus ours
    assert!(table.row_count >= 3);

    let (position, total) = session.rop_query_position(0, table.handle).await.unwrap();
    assert_eq!(position, 0);
    assert_eq!(total, table.row_count);

    // Cursor clamps at both ends
    let moved = session
        .rop_seek_row(0, table.handle, true, total + 50)
        .await
        .unwrap();
    assert_eq!(moved, total as i32);
    let moved = session
        .rop_seek_row(0, table.handle, false, 1)
        .await
        .unwrap();
    assert_eq!(moved, -1);

    session
        .rop_set_columns(
            0,
            table.handle,
            vec![property::PR_FOLDER_ID, property::PR_DISPLAY_NAME],
        )
        .await
        .unwrap();
    let err = session
        .rop_set_columns(0, table.handle, Vec::new())
        .await
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::InvalidParam));

    // An unknown-flag bit is rejected outright
    let err = session
        .rop_get_hierarchy_table(0, hsubtree, 0x02)
        .await
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::InvalidParam));
}

#[tokio::test]
async fn contents_table_query_sort_and_bookmarks() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hinbox, _) = open_folder(&session, inbox()).await;
    for subject in ["beta", "alpha", "gamma"] {
        env.memory
            .create_message(
                DIR,
                inbox(),
                "ana",
                false,
                vec![TaggedPropval::new(
                    property::PR_SUBJECT,
                    PropValue::Unicode(subject.to_string()),
                )],
            )
            .unwrap();
    }

    let table = session.rop_get_contents_table(0, hinbox, 0).await.unwrap();
    assert_eq!(table.row_count, 3);

    session
        .rop_sort_table(
            0,
            table.handle,
            vec![SortOrder {
                proptag: property::PR_SUBJECT,
                ascending: true,
            }],
        )
        .await
        .unwrap();
    session
        .rop_set_columns(0, table.handle, vec![property::PR_MID, property::PR_SUBJECT])
        .await
        .unwrap();
    let rows = session.rop_query_rows(0, table.handle, 2).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0].get_value(property::PR_SUBJECT).and_then(|v| v.as_str()),
        Some("alpha")
    );
    assert_eq!(
        rows[1].get_value(property::PR_SUBJECT).and_then(|v| v.as_str()),
        Some("beta")
    );

    // The cursor advanced with the query
    let (position, _) = session.rop_query_position(0, table.handle).await.unwrap();
    assert_eq!(position, 2);

    // Bookmark the current row, wander off, and come back
    let bookmark = session.rop_create_bookmark(0, table.handle).await.unwrap();
    session
        .rop_seek_row(0, table.handle, false, 2)
        .await
        .unwrap();
    assert!(
        session
            .rop_seek_row_bookmark(0, table.handle, bookmark)
            .await
            .unwrap()
    );
    let (position, _) = session.rop_query_position(0, table.handle).await.unwrap();
    assert_eq!(position, 2);

    // Restricting away the bookmarked row reports it as gone
    session
        .rop_restrict(
            0,
            table.handle,
            Some(Restriction::Not(Box::new(Restriction::Content {
                fuzzy_level: FUZZY_LEVEL_FULL_STRING,
                proptag: property::PR_SUBJECT,
                propval: TaggedPropval::new(
                    property::PR_SUBJECT,
                    PropValue::Unicode("gamma".to_string()),
                ),
            }))),
        )
        .await
        .unwrap();
    assert!(
        !session
            .rop_seek_row_bookmark(0, table.handle, bookmark)
            .await
            .unwrap()
    );
    session
        .rop_free_bookmark(0, table.handle, bookmark)
        .await
        .unwrap();
    let err = session
        .rop_seek_row_bookmark(0, table.handle, bookmark)
        .await
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::InvalidParam));
}

#[tokio::test]
async fn find_row_scans_from_the_cursor() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hinbox, _) = open_folder(&session, inbox()).await;
    for subject in ["red", "green", "blue"] {
        env.memory
            .create_message(
                DIR,
                inbox(),
                "ana",
                false,
                vec![TaggedPropval::new(
                    property::PR_SUBJECT,
                    PropValue::Unicode(subject.to_string()),
                )],
            )
            .unwrap();
    }
    let table = session.rop_get_contents_table(0, hinbox, 0).await.unwrap();
    let found = session
        .rop_find_row(
            0,
            table.handle,
            true,
            &Restriction::Content {
                fuzzy_level: FUZZY_LEVEL_FULL_STRING,
                proptag: property::PR_SUBJECT,
                propval: TaggedPropval::new(
                    property::PR_SUBJECT,
                    PropValue::Unicode("blue".to_string()),
                ),
            },
        )
        .await
        .unwrap();
    let (position, row) = found.expect("row should match");
    assert_eq!(position, 2);
    assert_eq!(
        row.get_value(property::PR_SUBJECT).and_then(|v| v.as_str()),
        Some("blue")
    );
}

#[tokio::test]
async fn permissions_table_round_trip() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hinbox, _) = open_folder(&session, inbox()).await;

    let rights = Rights::from(Right::ReadAny).with_item(Right::Visible);
    session
        .rop_modify_permissions(
            0,
            hinbox,
            emsmdb::op::permission::MODIFY_PERMISSIONS_FLAG_REPLACEROWS,
            vec![PermissionData {
                flags: PERMISSION_DATA_FLAG_ADD_ROW,
                propvals: vec![
                    TaggedPropval::new(
                        property::PR_MEMBER_NAME,
                        PropValue::Unicode("bob".to_string()),
                    ),
                    TaggedPropval::new(
                        property::PR_MEMBER_RIGHTS,
                        PropValue::Long(u64::from(rights) as u32),
                    ),
                ],
            }],
        )
        .await
        .unwrap();

    let htable = session.rop_get_permissions_table(0, hinbox, 0).await.unwrap();
    let rows = session.rop_query_rows(0, htable, 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0]
            .get_value(property::PR_MEMBER_NAME)
            .and_then(|v| v.as_str()),
        Some("bob")
    );
    assert_eq!(
        rows[0]
            .get_value(property::PR_MEMBER_RIGHTS)
            .and_then(|v| v.as_u32()),
        Some(u64::from(rights) as u32)
    );

    // REPLACEROWS with no rows is a valid clear
    session
        .rop_modify_permissions(
            0,
            hinbox,
            emsmdb::op::permission::MODIFY_PERMISSIONS_FLAG_REPLACEROWS,
            Vec::new(),
        )
        .await
        .unwrap();
    let htable = session.rop_get_permissions_table(0, hinbox, 0).await.unwrap();
    let rows = session.rop_query_rows(0, htable, 10).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn conversation_views_have_their_own_rules() {
    let env = test_env();
    let session = owner_session(&env).await;
    let (hroot, _) = open_folder(&session, Eid::local(folder::PRIVATE_FID_ROOT)).await;
    let (hinbox, _) = open_folder(&session, inbox()).await;

    // Conversation members only exist on the private root
    let table = session
        .rop_get_contents_table(0, hroot, types::table::TABLE_FLAG_CONVERSATIONMEMBERS)
        .await
        .unwrap();
    assert_eq!(table.row_count, 1);

    let err = session
        .rop_get_contents_table(0, hinbox, types::table::TABLE_FLAG_CONVERSATIONMEMBERS)
        .await
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::InvalidParam));

    let err = session
        .rop_get_contents_table(
            0,
            hroot,
            types::table::TABLE_FLAG_CONVERSATIONMEMBERS | types::table::TABLE_FLAG_ASSOCIATED,
        )
        .await
        .unwrap_err();
    assert!(err.is_mapi(MapiEvent::InvalidParam));
}
