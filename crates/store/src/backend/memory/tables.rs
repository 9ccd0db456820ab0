/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use super::{Mailbox, MemoryStore};
use crate::{LoadedTable, RowInstance};
use trc::StoreEvent;
use types::{
    Cpid,
    acl::{Right, Rights},
    id::Eid,
    property::{self, PropValue, TaggedPropval, prop_id},
    restriction::{
        FL_IGNORECASE, FUZZY_LEVEL_PREFIX, FUZZY_LEVEL_SUBSTRING, RelOp, Restriction,
    },
    table::{
        SortOrderSet, TABLE_FLAG_ASSOCIATED, TABLE_FLAG_DEPTH, TABLE_FLAG_SOFTDELETES,
    },
};

pub(crate) struct TableData {
    /// Rows as loaded; `rows` is the view after restrict/sort.
    pub base: Vec<TableRow>,
    pub rows: Vec<TableRow>,
}

#[derive(Clone)]
pub(crate) struct TableRow {
    pub instance: RowInstance,
    pub props: Vec<TaggedPropval>,
}

impl Mailbox {
    fn install_table(&mut self, rows: Vec<TableRow>) -> LoadedTable {
        let table_id = self.next_table_id;
        self.next_table_id += 1;
        let row_count = rows.len() as u32;
        self.tables.insert(
            table_id,
            TableData {
                base: rows.clone(),
                rows,
            },
        );
        LoadedTable {
            table_id,
            row_count,
        }
    }

    fn folder_row(&self, folder_id: Eid) -> TableRow {
        let data = &self.folders[&folder_id];
        let mut props = vec![
            TaggedPropval::new(property::PR_FOLDER_ID, PropValue::LongLong(folder_id.id())),
            TaggedPropval::new(
                property::PR_CONTENT_COUNT,
                PropValue::Long(self.messages_of(folder_id).len() as u32),
            ),
            TaggedPropval::new(
                property::PR_SUBFOLDERS,
                PropValue::Bool(!self.children_of(folder_id).is_empty()),
            ),
        ];
        if let Some(parent) = data.parent {
            props.push(TaggedPropval::new(
                property::PR_PARENT_FOLDER_ID,
                PropValue::LongLong(parent.id()),
            ));
        }
        for (&tag, value) in &data.props {
            props.push(TaggedPropval::new(tag, value.clone()));
        }
        TableRow {
            instance: RowInstance {
                inst_id: folder_id.id(),
                inst_num: 0,
            },
            props,
        }
    }

    fn hierarchy_rows(
        &self,
        folder_id: Eid,
        username: Option<&str>,
        depth: bool,
        soft_deleted: bool,
        rows: &mut Vec<TableRow>,
    ) {
        let mut children: Vec<Eid> = self
            .folders
            .iter()
            .filter(|(_, data)| {
                data.parent == Some(folder_id) && data.soft_deleted == soft_deleted
            })
            .map(|(id, _)| *id)
            .collect();
        children.sort();
        for child in children {
            if let Some(user) = username {
                if !self.rights_of(child, user).contains_any(
                    Rights::from(Right::Visible)
                        .with_item(Right::ReadAny)
                        .with_item(Right::Owner),
                ) {
                    continue;
                }
            }
            rows.push(self.folder_row(child));
            if depth {
                self.hierarchy_rows(child, username, true, soft_deleted, rows);
            }
        }
    }
}

impl MemoryStore {
    pub async fn load_hierarchy_table(
        &self,
        dir: &str,
        folder_id: Eid,
        username: Option<&str>,
        table_flags: u8,
        restriction: Option<&Restriction>,
    ) -> trc::Result<LoadedTable> {
        self.with_mailbox(dir, |mailbox| {
            let mut rows = Vec::new();
            mailbox.hierarchy_rows(
                folder_id,
                username,
                table_flags & TABLE_FLAG_DEPTH != 0,
                table_flags & TABLE_FLAG_SOFTDELETES != 0,
                &mut rows,
            );
            if let Some(restriction) = restriction {
                rows.retain(|row| eval_restriction(&row.props, restriction));
            }
            Ok(mailbox.install_table(rows))
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn load_content_table(
        &self,
        dir: &str,
        _cpid: Cpid,
        folder_id: Eid,
        _username: Option<&str>,
        table_flags: u8,
        restriction: Option<&Restriction>,
        sorts: Option<&SortOrderSet>,
    ) -> trc::Result<LoadedTable> {
        self.with_mailbox(dir, |mailbox| {
            let fai = table_flags & TABLE_FLAG_ASSOCIATED != 0;
            let soft_deleted = table_flags & TABLE_FLAG_SOFTDELETES != 0;
            let mut message_ids: Vec<Eid> = mailbox
                .messages
                .iter()
                .filter(|(_, data)| {
                    data.parent == folder_id
                        && data.fai == fai
                        && data.soft_deleted == soft_deleted
                })
                .map(|(id, _)| *id)
                .collect();
            message_ids.sort();
            let mut rows: Vec<TableRow> = message_ids
                .into_iter()
                .map(|message_id| {
                    let message = &mailbox.messages[&message_id];
                    let mut props = vec![
                        TaggedPropval::new(property::PR_MID, PropValue::LongLong(message_id.id())),
                        TaggedPropval::new(
                            property::PR_PARENT_FOLDER_ID,
                            PropValue::LongLong(message.parent.id()),
                        ),
                    ];
                    for (&tag, value) in &message.props {
                        props.push(TaggedPropval::new(tag, value.clone()));
                    }
                    TableRow {
                        instance: RowInstance {
                            inst_id: message_id.id(),
                            inst_num: 0,
                        },
                        props,
                    }
                })
                .collect();
            if let Some(restriction) = restriction {
                rows.retain(|row| eval_restriction(&row.props, restriction));
            }
            if let Some(sorts) = sorts {
                sort_rows(&mut rows, sorts);
            }
            Ok(mailbox.install_table(rows))
        })
    }

    pub async fn load_permission_table(
        &self,
        dir: &str,
        folder_id: Eid,
        _table_flags: u8,
    ) -> trc::Result<LoadedTable> {
        self.with_mailbox(dir, |mailbox| {
            let rows = mailbox
                .folders
                .get(&folder_id)
                .map(|data| {
                    data.acl
                        .iter()
                        .map(|acl_row| TableRow {
                            instance: RowInstance {
                                inst_id: acl_row.member_id,
                                inst_num: 0,
                            },
                            props: vec![
                                TaggedPropval::new(
                                    property::PR_MEMBER_ID,
                                    PropValue::LongLong(acl_row.member_id),
                                ),
                                TaggedPropval::new(
                                    property::PR_MEMBER_NAME,
                                    PropValue::Unicode(acl_row.username.clone()),
                                ),
                                TaggedPropval::new(
                                    property::PR_MEMBER_RIGHTS,
                                    PropValue::Long(u64::from(acl_row.rights) as u32),
                                ),
                                TaggedPropval::new(
                                    property::PR_ENTRYID,
                                    PropValue::Binary(acl_row.username.as_bytes().to_vec()),
                                ),
                            ],
                        })
                        .collect()
                })
                .unwrap_or_default();
            Ok(mailbox.install_table(rows))
        })
    }

    pub async fn load_rule_table(
        &self,
        dir: &str,
        _folder_id: Eid,
        _table_flags: u8,
    ) -> trc::Result<LoadedTable> {
        self.with_mailbox(dir, |mailbox| {
            Ok(mailbox.install_table(Vec::new()))
        })
    }

    pub async fn unload_table(&self, dir: &str, table_id: u32) -> trc::Result<()> {
        self.with_mailbox(dir, |mailbox| {
            mailbox.tables.remove(&table_id);
            Ok(())
        })
    }

    pub async fn sum_table(&self, dir: &str, table_id: u32) -> trc::Result<u32> {
        self.with_table(dir, table_id, |table| Ok(table.rows.len() as u32))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn query_table(
        &self,
        dir: &str,
        _username: Option<&str>,
        _cpid: Cpid,
        table_id: u32,
        proptags: &[u32],
        start: u32,
        count: u32,
    ) -> trc::Result<Vec<Vec<TaggedPropval>>> {
        self.with_table(dir, table_id, |table| {
            let start = start as usize;
            let end = (start + count as usize).min(table.rows.len());
            if start >= table.rows.len() {
                return Ok(Vec::new());
            }
            Ok(table.rows[start..end]
                .iter()
                .map(|row| project_row(&row.props, proptags))
                .collect())
        })
    }

    pub async fn restrict_table(
        &self,
        dir: &str,
        table_id: u32,
        restriction: Option<&Restriction>,
    ) -> trc::Result<bool> {
        self.with_table(dir, table_id, |table| {
            table.rows = match restriction {
                Some(restriction) => table
                    .base
                    .iter()
                    .filter(|row| eval_restriction(&row.props, restriction))
                    .cloned()
                    .collect(),
                None => table.base.clone(),
            };
            Ok(true)
        })
    }

    pub async fn sort_table(
        &self,
        dir: &str,
        table_id: u32,
        sorts: &SortOrderSet,
    ) -> trc::Result<bool> {
        self.with_table(dir, table_id, |table| {
            sort_rows(&mut table.rows, sorts);
            Ok(true)
        })
    }

    pub async fn mark_table(
        &self,
        dir: &str,
        table_id: u32,
        position: u32,
    ) -> trc::Result<Option<RowInstance>> {
        self.with_table(dir, table_id, |table| {
            Ok(table.rows.get(position as usize).map(|row| row.instance))
        })
    }

    pub async fn locate_table(
        &self,
        dir: &str,
        table_id: u32,
        instance: RowInstance,
    ) -> trc::Result<Option<u32>> {
        self.with_table(dir, table_id, |table| {
            Ok(table
                .rows
                .iter()
                .position(|row| row.instance == instance)
                .map(|pos| pos as u32))
        })
    }

    pub async fn match_table(
        &self,
        dir: &str,
        _cpid: Cpid,
        table_id: u32,
        forward: bool,
        start: u32,
        restriction: &Restriction,
    ) -> trc::Result<Option<(u32, Vec<TaggedPropval>)>> {
        self.with_table(dir, table_id, |table| {
            let len = table.rows.len();
            let start = start as usize;
            let found = if forward {
                (start.min(len)..len)
                    .find(|&pos| eval_restriction(&table.rows[pos].props, restriction))
            } else if len == 0 {
                None
            } else {
                (0..=start.min(len - 1))
                    .rev()
                    .find(|&pos| eval_restriction(&table.rows[pos].props, restriction))
            };
            Ok(found.map(|pos| (pos as u32, table.rows[pos].props.clone())))
        })
    }

    fn with_table<R>(
        &self,
        dir: &str,
        table_id: u32,
        f: impl FnOnce(&mut TableData) -> trc::Result<R>,
    ) -> trc::Result<R> {
        self.with_mailbox(dir, |mailbox| {
            let table = mailbox.tables.get_mut(&table_id).ok_or_else(|| {
                trc::Error::from(StoreEvent::UnexpectedValue)
                    .details("unknown table handle")
                    .ctx(trc::Key::TableId, table_id)
            })?;
            f(table)
        })
    }
}

fn project_row(props: &[TaggedPropval], proptags: &[u32]) -> Vec<TaggedPropval> {
    proptags
        .iter()
        .filter_map(|&tag| {
            props
                .iter()
                .find(|propval| prop_id(propval.tag) == prop_id(tag))
                .cloned()
        })
        .collect()
}

fn find_prop<'x>(props: &'x [TaggedPropval], tag: u32) -> Option<&'x PropValue> {
    props
        .iter()
        .find(|propval| prop_id(propval.tag) == prop_id(tag))
        .map(|propval| &propval.value)
}

fn sort_rows(rows: &mut [TableRow], sorts: &SortOrderSet) {
    rows.sort_by(|left, right| {
        for sort in sorts {
            let ordering = compare_values(
                find_prop(&left.props, sort.proptag),
                find_prop(&right.props, sort.proptag),
            );
            let ordering = if sort.ascending {
                ordering
            } else {
                ordering.reverse()
            };
            if ordering != std::cmp::Ordering::Equal {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    });
}

fn compare_values(left: Option<&PropValue>, right: Option<&PropValue>) -> std::cmp::Ordering {
    match (left, right) {
        (Some(left), Some(right)) => match (left.as_u64(), right.as_u64()) {
            (Some(left), Some(right)) => left.cmp(&right),
            _ => left
                .as_str()
                .unwrap_or_default()
                .cmp(right.as_str().unwrap_or_default()),
        },
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    }
}

pub(crate) fn eval_restriction(props: &[TaggedPropval], restriction: &Restriction) -> bool {
    match restriction {
        Restriction::And(list) => list.iter().all(|res| eval_restriction(props, res)),
        Restriction::Or(list) => list.iter().any(|res| eval_restriction(props, res)),
        Restriction::Not(res) => !eval_restriction(props, res),
        Restriction::Content {
            fuzzy_level,
            proptag,
            propval,
        } => {
            let Some(haystack) = find_prop(props, *proptag).and_then(|v| v.as_str()) else {
                return false;
            };
            let Some(needle) = propval.value.as_str() else {
                return false;
            };
            let (haystack, needle) = if fuzzy_level & FL_IGNORECASE != 0 {
                (haystack.to_lowercase(), needle.to_lowercase())
            } else {
                (haystack.to_string(), needle.to_string())
            };
            match fuzzy_level & 0xffff {
                FUZZY_LEVEL_SUBSTRING => haystack.contains(&needle),
                FUZZY_LEVEL_PREFIX => haystack.starts_with(&needle),
                _ => haystack == needle,
            }
        }
        Restriction::Property {
            relop,
            proptag,
            propval,
        } => {
            let Some(value) = find_prop(props, *proptag) else {
                return matches!(relop, RelOp::Ne);
            };
            let ordering = match (value.as_u64(), propval.value.as_u64()) {
                (Some(left), Some(right)) => left.cmp(&right),
                _ => match (value.as_bool(), propval.value.as_bool()) {
                    (Some(left), Some(right)) => left.cmp(&right),
                    _ => match (value.as_str(), propval.value.as_str()) {
                        (Some(left), Some(right)) => left.cmp(right),
                        _ => return matches!(relop, RelOp::Ne),
                    },
                },
            };
            match relop {
                RelOp::Lt => ordering == std::cmp::Ordering::Less,
                RelOp::Le => ordering != std::cmp::Ordering::Greater,
                RelOp::Gt => ordering == std::cmp::Ordering::Greater,
                RelOp::Ge => ordering != std::cmp::Ordering::Less,
                RelOp::Eq => ordering == std::cmp::Ordering::Equal,
                RelOp::Ne => ordering != std::cmp::Ordering::Equal,
                RelOp::RegexMatch => false,
            }
        }
        Restriction::Bitmask { set, proptag, mask } => {
            let value = find_prop(props, *proptag)
                .and_then(|v| v.as_u32())
                .unwrap_or_default();
            (value & mask != 0) == *set
        }
        Restriction::Exist { proptag } => find_prop(props, *proptag).is_some(),
    }
}
