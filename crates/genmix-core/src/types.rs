use chrono::NaiveDateTime;

pub const DATE_ID: &str = "date_id";
pub const REGION: &str = "region";

const MWH_PER_GWH: f64 = 1000.0;

/// One upstream measurement: generation of a single source in a region for one timestamp.
///
/// `value_gwh` is `None` when the provider reported no reading. The record still marks its
/// `(date_id, region)` row and its column as present.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub date_id: NaiveDateTime,
    pub region: String,
    pub generation_source: String,
    pub value_gwh: Option<f64>,
}

impl RawRecord {
    pub fn from_mwh(
        date_id: NaiveDateTime,
        region: impl Into<String>,
        generation_source: impl Into<String>,
        value_mwh: f64,
    ) -> Self {
        Self {
            date_id,
            region: region.into(),
            generation_source: generation_source.into(),
            value_gwh: Some(mwh_to_gwh(value_mwh)),
        }
    }

    pub fn without_value(
        date_id: NaiveDateTime,
        region: impl Into<String>,
        generation_source: impl Into<String>,
    ) -> Self {
        Self {
            date_id,
            region: region.into(),
            generation_source: generation_source.into(),
            value_gwh: None,
        }
    }
}

pub fn mwh_to_gwh(value_mwh: f64) -> f64 {
    value_mwh / MWH_PER_GWH
}

pub fn is_key_column(name: &str) -> bool {
    name == DATE_ID || name == REGION
}
