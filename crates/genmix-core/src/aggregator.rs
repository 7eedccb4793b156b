use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDateTime, NaiveTime, Timelike};
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::debug;

use crate::table::{TableError, WideTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Hourly,
    Daily,
    Monthly,
}

impl Resolution {
    /// Start of the half-open `[start, start + period)` bucket holding `timestamp`.
    pub fn bucket_start(&self, timestamp: NaiveDateTime) -> NaiveDateTime {
        let midnight = timestamp.date().and_time(NaiveTime::MIN);
        match self {
            Resolution::Hourly => midnight + Duration::hours(i64::from(timestamp.hour())),
            Resolution::Daily => midnight,
            Resolution::Monthly => midnight - Days::new(u64::from(timestamp.day0())),
        }
    }

    pub fn next_bucket(&self, start: NaiveDateTime) -> NaiveDateTime {
        match self {
            Resolution::Hourly => start + Duration::hours(1),
            Resolution::Daily => start + Duration::days(1),
            Resolution::Monthly => start + Months::new(1),
        }
    }
}

/// One resolution of aggregated rows: `date_id` (bucket start), `region`, then value columns.
#[derive(Debug, Clone)]
pub struct AggregateTable {
    table: WideTable,
}

impl AggregateTable {
    pub fn frame(&self) -> &DataFrame {
        self.table.frame()
    }

    pub fn height(&self) -> usize {
        self.table.height()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn value_columns(&self) -> Vec<String> {
        self.table.value_columns()
    }

    pub fn date_ids(&self) -> Result<Vec<i64>, TableError> {
        self.table.date_ids()
    }

    pub fn regions(&self) -> Result<Vec<String>, TableError> {
        self.table.regions()
    }

    /// Values of one column; NaN shares come back as `f64::NAN`.
    pub fn values(&self, column: &str) -> Result<Vec<f64>, TableError> {
        Ok(self
            .table
            .numeric_cells(column)?
            .into_iter()
            .map(|cell| cell.unwrap_or(f64::NAN))
            .collect())
    }
}

/// All resolutions computed for one pass. `hourly` is kept for callers but never serialized.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    #[serde(skip)]
    pub hourly: AggregateTable,
    pub daily: AggregateTable,
    pub monthly: AggregateTable,
    pub perc_daily: AggregateTable,
}

/// Bucketed sums for every region, column-major like the frame they become.
struct BucketRows {
    date_ids: Vec<i64>,
    regions: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl BucketRows {
    fn with_columns(width: usize) -> Self {
        Self {
            date_ids: Vec::new(),
            regions: Vec::new(),
            columns: vec![Vec::new(); width],
        }
    }

    fn push(&mut self, start: NaiveDateTime, region: &str, sums: &[f64]) {
        self.date_ids.push(start.and_utc().timestamp_millis());
        self.regions.push(region.to_string());
        for (column, value) in self.columns.iter_mut().zip(sums) {
            column.push(*value);
        }
    }

    /// Per-row shares of the row total; every share is NaN when the total is zero.
    fn shares(&self) -> BucketRows {
        let height = self.date_ids.len();
        let mut columns = vec![Vec::with_capacity(height); self.columns.len()];

        for row in 0..height {
            let total: f64 = self.columns.iter().map(|column| column[row]).sum();
            for (share, column) in columns.iter_mut().zip(&self.columns) {
                if total == 0.0 {
                    share.push(f64::NAN);
                } else {
                    share.push(column[row] / total);
                }
            }
        }

        BucketRows {
            date_ids: self.date_ids.clone(),
            regions: self.regions.clone(),
            columns,
        }
    }

    fn into_table(self, names: &[String]) -> Result<AggregateTable, TableError> {
        let values = names
            .iter()
            .cloned()
            .zip(
                self.columns
                    .into_iter()
                    .map(|column| column.into_iter().map(Some).collect()),
            )
            .collect();
        let table = WideTable::from_columns(self.date_ids, self.regions, values)?;
        Ok(AggregateTable { table })
    }
}

struct RegionRows<'a> {
    region: &'a str,
    rows: Vec<usize>,
}

fn resample(
    partitions: &[RegionRows<'_>],
    timestamps: &[NaiveDateTime],
    columns: &[Vec<f64>],
    resolution: Resolution,
) -> BucketRows {
    let mut output = BucketRows::with_columns(columns.len());

    for partition in partitions {
        let mut buckets: BTreeMap<NaiveDateTime, Vec<f64>> = BTreeMap::new();
        for &row in &partition.rows {
            let start = resolution.bucket_start(timestamps[row]);
            let sums = buckets
                .entry(start)
                .or_insert_with(|| vec![0.0; columns.len()]);
            for (sum, column) in sums.iter_mut().zip(columns) {
                *sum += column[row];
            }
        }

        let (Some(first), Some(last)) = (
            buckets.keys().next().copied(),
            buckets.keys().next_back().copied(),
        ) else {
            continue;
        };

        // Periods with no rows between the first and last bucket are emitted as zeros.
        let empty = vec![0.0; columns.len()];
        let mut start = first;
        while start <= last {
            let sums = buckets.get(&start).unwrap_or(&empty);
            output.push(start, partition.region, sums);
            start = resolution.next_bucket(start);
        }
    }

    output
}

/// Sums a cleaned table into hourly, daily and monthly buckets per region, plus daily shares.
pub fn aggregate(table: &WideTable) -> Result<AggregateResult, TableError> {
    let names = table.value_columns();

    let timestamps = table
        .date_ids()?
        .into_iter()
        .map(|millis| {
            DateTime::from_timestamp_millis(millis)
                .map(|dt| dt.naive_utc())
                .ok_or(TableError::TimestampOutOfRange(millis))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let regions = table.regions()?;

    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(names.len());
    for name in &names {
        let cells = table.numeric_cells(name)?;
        columns.push(cells.into_iter().map(|cell| cell.unwrap_or(0.0)).collect());
    }

    let mut by_region: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (row, region) in regions.iter().enumerate() {
        by_region.entry(region.as_str()).or_default().push(row);
    }
    let partitions: Vec<RegionRows<'_>> = by_region
        .into_iter()
        .map(|(region, rows)| RegionRows { region, rows })
        .collect();

    let hourly = resample(&partitions, &timestamps, &columns, Resolution::Hourly);
    let daily = resample(&partitions, &timestamps, &columns, Resolution::Daily);
    let monthly = resample(&partitions, &timestamps, &columns, Resolution::Monthly);
    let perc_daily = daily.shares();

    debug!(
        regions = partitions.len(),
        hourly_rows = hourly.date_ids.len(),
        daily_rows = daily.date_ids.len(),
        monthly_rows = monthly.date_ids.len(),
        "aggregated table"
    );

    Ok(AggregateResult {
        hourly: hourly.into_table(&names)?,
        daily: daily.into_table(&names)?,
        monthly: monthly.into_table(&names)?,
        perc_daily: perc_daily.into_table(&names)?,
    })
}
