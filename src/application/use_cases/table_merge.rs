// ============================================================
// TABLE MERGE USE CASE
// ============================================================
// Grouped hash join of two uploaded tables on one key per side

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::domain::table::{JoinMode, JoinSelection, MergedTable, Row, Table};

pub const DEFAULT_COLLISION_SUFFIX: &str = "_r";

/// Rows of one table grouped by join key, keys kept in first-seen order
struct KeyGroups<'a> {
    order: Vec<&'a str>,
    groups: HashMap<&'a str, Vec<&'a Row>>,
}

impl<'a> KeyGroups<'a> {
    /// A key column missing from the header groups every row under ""
    fn build(table: &'a Table, key: &str) -> Self {
        let key_index = table.column_index(key);
        let mut order = Vec::new();
        let mut groups: HashMap<&'a str, Vec<&'a Row>> = HashMap::new();

        for row in table.rows() {
            let value = key_index.map(|idx| row.value_at(idx)).unwrap_or("");
            groups
                .entry(value)
                .or_insert_with(|| {
                    order.push(value);
                    Vec::new()
                })
                .push(row);
        }

        Self { order, groups }
    }

    fn get(&self, key: &str) -> &[&'a Row] {
        self.groups.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Output column layout: every left column, then the right columns other
/// than the right key, renamed on collision with a left column
struct MergedLayout {
    headers: Vec<String>,
    left_width: usize,
    right_columns: Vec<usize>,
}

pub struct TableMerger {
    collision_suffix: String,
}

impl Default for TableMerger {
    fn default() -> Self {
        Self::new(DEFAULT_COLLISION_SUFFIX)
    }
}

impl TableMerger {
    pub fn new(collision_suffix: impl Into<String>) -> Self {
        Self {
            collision_suffix: collision_suffix.into(),
        }
    }

    pub fn merge_with(&self, left: &Table, right: &Table, selection: &JoinSelection) -> MergedTable {
        self.merge(
            left,
            right,
            &selection.left_key,
            &selection.right_key,
            selection.join_type,
        )
    }

    /// Join `left` and `right` on `left_key` = `right_key`.
    ///
    /// Keys are visited in first-seen order scanning left rows, then right
    /// rows. A key present on both sides yields the full cross product of
    /// its groups (left-major) whatever the mode; unmatched groups are kept
    /// according to `mode`, with the missing side's columns left empty.
    pub fn merge(
        &self,
        left: &Table,
        right: &Table,
        left_key: &str,
        right_key: &str,
        mode: JoinMode,
    ) -> MergedTable {
        let layout = self.layout(left, right, right_key);
        let left_groups = KeyGroups::build(left, left_key);
        let right_groups = KeyGroups::build(right, right_key);

        let mut merged = Table::new(layout.headers.clone());

        for key in ordered_keys(&left_groups, &right_groups) {
            let l = left_groups.get(key);
            let r = right_groups.get(key);

            match (l.is_empty(), r.is_empty()) {
                (false, false) => {
                    for left_row in l {
                        for right_row in r {
                            merged.push_row(layout.row(Some(*left_row), Some(*right_row)));
                        }
                    }
                }
                (false, true) if mode.keeps_left_only() => {
                    for left_row in l {
                        merged.push_row(layout.row(Some(*left_row), None));
                    }
                }
                (true, false) if mode.keeps_right_only() => {
                    for right_row in r {
                        merged.push_row(layout.row(None, Some(*right_row)));
                    }
                }
                _ => {}
            }
        }

        debug!(
            mode = %mode,
            left_key,
            right_key,
            left_rows = left.row_count(),
            right_rows = right.row_count(),
            merged_rows = merged.row_count(),
            "Merged tables"
        );

        merged
    }

    fn layout(&self, left: &Table, right: &Table, right_key: &str) -> MergedLayout {
        let left_names: HashSet<&str> = left.headers().iter().map(String::as_str).collect();

        let mut headers = left.headers().to_vec();
        let mut right_columns = Vec::new();

        for (idx, name) in right.headers().iter().enumerate() {
            if name == right_key {
                continue;
            }
            if left_names.contains(name.as_str()) {
                headers.push(format!("{}{}", name, self.collision_suffix));
            } else {
                headers.push(name.clone());
            }
            right_columns.push(idx);
        }

        MergedLayout {
            headers,
            left_width: left.column_count(),
            right_columns,
        }
    }
}

impl MergedLayout {
    fn row(&self, left: Option<&Row>, right: Option<&Row>) -> Vec<String> {
        let mut values = Vec::with_capacity(self.headers.len());

        match left {
            Some(row) => values.extend((0..self.left_width).map(|i| row.value_at(i).to_string())),
            None => values.resize(self.left_width, String::new()),
        }

        for &idx in &self.right_columns {
            values.push(right.map(|row| row.value_at(idx).to_string()).unwrap_or_default());
        }

        values
    }
}

fn ordered_keys<'a>(left: &KeyGroups<'a>, right: &KeyGroups<'a>) -> Vec<&'a str> {
    let mut seen: HashSet<&'a str> = HashSet::with_capacity(left.order.len() + right.order.len());
    left.order
        .iter()
        .chain(right.order.iter())
        .copied()
        .filter(|key| seen.insert(*key))
        .collect()
}

/// Merge with the default `_r` collision suffix
pub fn merge_tables(
    left: &Table,
    right: &Table,
    left_key: &str,
    right_key: &str,
    mode: JoinMode,
) -> MergedTable {
    TableMerger::default().merge(left, right, left_key, right_key, mode)
}
