use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDateTime;
use tracing::debug;

use crate::categorizer::categorize;
use crate::table::{TableError, WideTable};
use crate::types::RawRecord;

/// Selects which label of a record becomes its wide-table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKey {
    GenerationSource,
    Category,
}

impl ColumnKey {
    pub fn column_for<'a>(&self, record: &'a RawRecord) -> &'a str {
        match self {
            ColumnKey::GenerationSource => record.generation_source.as_str(),
            ColumnKey::Category => categorize(&record.generation_source).as_str(),
        }
    }
}

fn epoch_millis(date_id: &NaiveDateTime) -> i64 {
    date_id.and_utc().timestamp_millis()
}

/// Pivots records into one row per (date_id, region) and one column per key value.
///
/// Rows are ordered by (date_id, region) and columns by name. Records landing in the same
/// cell are summed. Combinations that never occur, or only occur without a reading, stay
/// null.
pub fn shape_records(records: &[RawRecord], key: ColumnKey) -> Result<WideTable, TableError> {
    let mut row_keys: BTreeSet<(i64, &str)> = BTreeSet::new();
    let mut column_names: BTreeSet<&str> = BTreeSet::new();

    for record in records {
        row_keys.insert((epoch_millis(&record.date_id), record.region.as_str()));
        column_names.insert(key.column_for(record));
    }

    let row_positions: HashMap<(i64, &str), usize> = row_keys
        .iter()
        .enumerate()
        .map(|(position, row_key)| (*row_key, position))
        .collect();
    let column_positions: HashMap<&str, usize> = column_names
        .iter()
        .enumerate()
        .map(|(position, name)| (*name, position))
        .collect();

    let mut cells: Vec<Vec<Option<f64>>> = vec![vec![None; row_keys.len()]; column_names.len()];

    for record in records {
        let row = row_positions[&(epoch_millis(&record.date_id), record.region.as_str())];
        let column = column_positions[key.column_for(record)];
        if let Some(value) = record.value_gwh {
            let cell = &mut cells[column][row];
            *cell = Some(cell.unwrap_or(0.0) + value);
        }
    }

    debug!(
        ?key,
        records = records.len(),
        rows = row_keys.len(),
        columns = column_names.len(),
        "shaped records into wide table"
    );

    let (date_ids, regions): (Vec<i64>, Vec<String>) = row_keys
        .iter()
        .map(|(date_id, region)| (*date_id, region.to_string()))
        .unzip();
    let values = column_names
        .iter()
        .map(|name| name.to_string())
        .zip(cells)
        .collect();

    WideTable::from_columns(date_ids, regions, values)
}
