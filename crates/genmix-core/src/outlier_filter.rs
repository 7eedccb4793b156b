use std::collections::HashSet;

use tracing::debug;

use crate::table::{TableError, WideTable};

const LOWER_PERCENTILE: f64 = 0.10;
const UPPER_PERCENTILE: f64 = 0.90;
const FENCE_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    pub fn from_quantiles(q1: f64, q3: f64) -> Self {
        let iqr = q3 - q1;
        Self {
            q1,
            q3,
            lower: q1 - FENCE_FACTOR * iqr,
            upper: q3 + FENCE_FACTOR * iqr,
        }
    }

    pub fn is_outlier(&self, value: f64) -> bool {
        value <= self.lower || value >= self.upper
    }
}

/// Percentile of an ascending slice using midpoint interpolation.
///
/// The virtual index is `(n - 1) * fraction`; the result is the mean of the values at its
/// floor and ceiling ranks. Returns `None` for an empty slice.
pub fn percentile_midpoint(sorted: &[f64], fraction: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let position = (sorted.len() - 1) as f64 * fraction.clamp(0.0, 1.0);
    let low = position.floor() as usize;
    let high = position.ceil() as usize;
    Some((sorted[low] + sorted[high]) / 2.0)
}

/// Number of distinct cells, counting a missing cell as one more distinct value.
pub fn distinct_count(cells: &[Option<f64>]) -> usize {
    let mut seen: HashSet<u64> = HashSet::new();
    let mut has_missing = false;

    for cell in cells {
        match cell {
            Some(value) if !value.is_nan() => {
                // -0.0 and 0.0 are the same value.
                let normalized = if *value == 0.0 { 0.0f64 } else { *value };
                seen.insert(normalized.to_bits());
            }
            _ => has_missing = true,
        }
    }

    seen.len() + usize::from(has_missing)
}

/// Whether a column varies enough to be treated as continuous.
pub fn is_continuous(cells: &[Option<f64>]) -> bool {
    distinct_count(cells) as f64 > cells.len() as f64 / 2.0
}

/// Fences for one column.
///
/// A column with any missing or NaN cell has undefined percentiles and gets no bounds, so it
/// never flags a row. The same holds for an empty column.
pub fn column_bounds(cells: &[Option<f64>]) -> Option<OutlierBounds> {
    let mut values: Vec<f64> = cells
        .iter()
        .map(|cell| cell.filter(|value| !value.is_nan()))
        .collect::<Option<Vec<_>>>()?;
    values.sort_by(f64::total_cmp);

    let q1 = percentile_midpoint(&values, LOWER_PERCENTILE)?;
    let q3 = percentile_midpoint(&values, UPPER_PERCENTILE)?;
    Some(OutlierBounds::from_quantiles(q1, q3))
}

/// Flags the rows holding an outlier in any continuous numeric column.
pub fn flag_outliers(table: &WideTable) -> Result<Vec<bool>, TableError> {
    let mut flags = vec![false; table.height()];

    for name in table.value_columns() {
        let cells = table.numeric_cells(&name)?;
        if !is_continuous(&cells) {
            debug!(column = %name, "column exempt from outlier detection: low cardinality");
            continue;
        }

        let Some(bounds) = column_bounds(&cells) else {
            debug!(column = %name, "column exempt from outlier detection: missing values");
            continue;
        };

        let mut flagged = 0usize;
        for (row, cell) in cells.iter().enumerate() {
            if let Some(value) = cell {
                if bounds.is_outlier(*value) {
                    flags[row] = true;
                    flagged += 1;
                }
            }
        }

        debug!(
            column = %name,
            q1 = bounds.q1,
            q3 = bounds.q3,
            lower = bounds.lower,
            upper = bounds.upper,
            flagged,
            "outlier bounds computed"
        );
    }

    Ok(flags)
}

/// Drops every row flagged as an outlier, then fills the remaining gaps with zero.
pub fn remove_outliers(table: &WideTable) -> Result<WideTable, TableError> {
    let flags = flag_outliers(table)?;
    let keep: Vec<bool> = flags.iter().map(|flagged| !flagged).collect();
    let removed = flags.iter().filter(|flagged| **flagged).count();

    let retained = table.retain_rows(&keep)?;
    debug!(
        rows = table.height(),
        removed,
        "outlier rows removed"
    );

    retained.fill_missing(0.0)
}
