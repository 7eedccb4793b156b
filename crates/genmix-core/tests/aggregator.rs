use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use genmix_core::aggregator::{aggregate, Resolution};
use genmix_core::shaper::{shape_records, ColumnKey};
use genmix_core::table::TableError;
use genmix_core::types::RawRecord;

fn at(month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn millis(ts: NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_millis()
}

fn record(date_id: NaiveDateTime, region: &str, source: &str, value_mwh: f64) -> RawRecord {
    RawRecord::from_mwh(date_id, region, source, value_mwh)
}

#[test]
fn bucket_starts_truncate_to_period() {
    let ts = at(10, 14, 17, 45);
    assert_eq!(Resolution::Hourly.bucket_start(ts), at(10, 14, 17, 0));
    assert_eq!(Resolution::Daily.bucket_start(ts), at(10, 14, 0, 0));
    assert_eq!(Resolution::Monthly.bucket_start(ts), at(10, 1, 0, 0));

    assert_eq!(Resolution::Monthly.next_bucket(at(12, 1, 0, 0)), {
        NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    });
    assert_eq!(Resolution::Daily.next_bucket(at(10, 31, 0, 0)), at(11, 1, 0, 0));
}

#[test]
fn boundary_record_belongs_to_the_bucket_it_starts() {
    let boundary = at(11, 1, 0, 0);
    assert_eq!(Resolution::Monthly.bucket_start(boundary), boundary);
    assert_eq!(Resolution::Daily.bucket_start(boundary), boundary);
    assert_eq!(Resolution::Hourly.bucket_start(boundary), boundary);
    assert_eq!(
        Resolution::Monthly.bucket_start(at(10, 31, 23, 59)),
        at(10, 1, 0, 0)
    );
}

#[test]
fn single_hour_scenario_totals_and_shares() -> Result<(), TableError> {
    let records = vec![
        record(at(10, 1, 0, 0), "DE", "Solar", 1000.0),
        record(at(10, 1, 0, 0), "DE", "Lignite", 3000.0),
    ];

    let by_type = aggregate(&shape_records(&records, ColumnKey::GenerationSource)?)?;
    assert_eq!(by_type.daily.height(), 1);
    assert_eq!(by_type.daily.values("Solar")?, vec![1.0]);
    assert_eq!(by_type.daily.values("Lignite")?, vec![3.0]);
    let total: f64 = by_type
        .daily
        .value_columns()
        .iter()
        .map(|name| by_type.daily.values(name).map(|values| values[0]))
        .sum::<Result<f64, _>>()?;
    assert_eq!(total, 4.0);
    assert_eq!(by_type.perc_daily.values("Solar")?, vec![0.25]);
    assert_eq!(by_type.perc_daily.values("Lignite")?, vec![0.75]);

    let categorized = aggregate(&shape_records(&records, ColumnKey::Category)?)?;
    assert_eq!(categorized.daily.values("renewable")?, vec![1.0]);
    assert_eq!(categorized.daily.values("non-renewable")?, vec![3.0]);
    Ok(())
}

#[test]
fn regions_are_resampled_separately_with_gap_filling() -> Result<(), TableError> {
    let records = vec![
        record(at(10, 30, 23, 0), "DE", "Solar", 1000.0),
        record(at(10, 31, 10, 0), "DE", "Solar", 2000.0),
        record(at(10, 31, 10, 30), "DE", "Solar", 500.0),
        record(at(11, 2, 1, 0), "DE", "Solar", 4000.0),
        record(at(11, 2, 1, 0), "DE", "Lignite", 1000.0),
        record(at(10, 5, 12, 0), "AT", "Solar", 700.0),
    ];

    let result = aggregate(&shape_records(&records, ColumnKey::GenerationSource)?)?;

    assert_eq!(result.daily.regions()?, vec!["AT", "DE", "DE", "DE", "DE"]);
    assert_eq!(
        result.daily.date_ids()?,
        vec![
            millis(at(10, 5, 0, 0)),
            millis(at(10, 30, 0, 0)),
            millis(at(10, 31, 0, 0)),
            millis(at(11, 1, 0, 0)),
            millis(at(11, 2, 0, 0)),
        ]
    );
    assert_eq!(result.daily.values("Solar")?, vec![0.7, 1.0, 2.5, 0.0, 4.0]);
    assert_eq!(result.daily.values("Lignite")?, vec![0.0, 0.0, 0.0, 0.0, 1.0]);

    assert_eq!(result.monthly.regions()?, vec!["AT", "DE", "DE"]);
    assert_eq!(
        result.monthly.date_ids()?,
        vec![
            millis(at(10, 1, 0, 0)),
            millis(at(10, 1, 0, 0)),
            millis(at(11, 1, 0, 0)),
        ]
    );
    assert_eq!(result.monthly.values("Solar")?, vec![0.7, 3.5, 4.0]);

    // The half-hour reading shares the 10:00 bucket.
    let hourly_regions = result.hourly.regions()?;
    let hourly_dates = result.hourly.date_ids()?;
    let hourly_solar = result.hourly.values("Solar")?;
    let ten_oclock = hourly_regions
        .iter()
        .zip(&hourly_dates)
        .position(|(region, date)| region == "DE" && *date == millis(at(10, 31, 10, 0)))
        .expect("10:00 bucket");
    assert_eq!(hourly_solar[ten_oclock], 2.5);
    // DE spans 2022-10-30 23:00 through 2022-11-02 01:00 inclusive.
    assert_eq!(hourly_regions.iter().filter(|r| *r == "DE").count(), 51);
    Ok(())
}

#[test]
fn monthly_totals_match_daily_totals() -> Result<(), TableError> {
    let mut records = Vec::new();
    for day in 1..=30u32 {
        for hour in [0u32, 6, 12, 18] {
            let value = f64::from(day * 100 + hour);
            records.push(record(at(11, day, hour, 0), "DE", "Wind onshore", value));
            records.push(record(at(11, day, hour, 0), "FR", "Nuclear", value * 2.0));
        }
    }
    records.push(record(at(12, 1, 0, 0), "DE", "Wind onshore", 900.0));

    let result = aggregate(&shape_records(&records, ColumnKey::Category)?)?;

    let mut daily_sums: BTreeMap<(String, i64), f64> = BTreeMap::new();
    let regions = result.daily.regions()?;
    let dates = result.daily.date_ids()?;
    let renewable = result.daily.values("renewable")?;
    for ((region, date), value) in regions.into_iter().zip(dates).zip(renewable) {
        let ts = chrono::DateTime::from_timestamp_millis(date).unwrap().naive_utc();
        let month = millis(Resolution::Monthly.bucket_start(ts));
        *daily_sums.entry((region, month)).or_default() += value;
    }

    let regions = result.monthly.regions()?;
    let dates = result.monthly.date_ids()?;
    let monthly = result.monthly.values("renewable")?;
    assert_eq!(monthly.len(), daily_sums.len());
    for ((region, date), value) in regions.into_iter().zip(dates).zip(monthly) {
        let daily_total = daily_sums[&(region, date)];
        assert!((daily_total - value).abs() < 1e-9);
    }
    Ok(())
}

#[test]
fn shares_sum_to_one_and_zero_days_are_nan() -> Result<(), TableError> {
    let records = vec![
        record(at(10, 1, 3, 0), "DE", "Solar", 1200.0),
        record(at(10, 1, 4, 0), "DE", "Biomass", 300.0),
        record(at(10, 1, 4, 0), "DE", "Oil", 500.0),
        record(at(10, 3, 4, 0), "DE", "Oil", 500.0),
    ];

    let result = aggregate(&shape_records(&records, ColumnKey::GenerationSource)?)?;
    let names = result.perc_daily.value_columns();
    let shares: Vec<Vec<f64>> = names
        .iter()
        .map(|name| result.perc_daily.values(name))
        .collect::<Result<_, _>>()?;

    assert_eq!(result.perc_daily.height(), 3);
    let first_day: f64 = shares.iter().map(|column| column[0]).sum();
    assert!((first_day - 1.0).abs() < 1e-12);
    assert!(shares.iter().all(|column| column[1].is_nan()));
    let third_day: f64 = shares.iter().map(|column| column[2]).sum();
    assert!((third_day - 1.0).abs() < 1e-12);
    assert!((result.perc_daily.values("Solar")?[0] - 0.6).abs() < 1e-12);
    Ok(())
}

#[test]
fn empty_table_aggregates_to_empty_tables() -> Result<(), TableError> {
    let result = aggregate(&shape_records(&[], ColumnKey::GenerationSource)?)?;
    assert!(result.daily.is_empty());
    assert!(result.monthly.is_empty());
    assert!(result.perc_daily.is_empty());
    assert!(result.hourly.is_empty());
    Ok(())
}
