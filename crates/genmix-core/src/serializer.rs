//! JSON framing of pipeline output: each table becomes an array of flat row objects.

use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::aggregator::AggregateTable;
use crate::pipeline::PipelineResponse;
use crate::types::{DATE_ID, REGION};

struct Row<'a> {
    date_id: i64,
    region: &'a str,
    names: &'a [String],
    columns: &'a [Vec<f64>],
    index: usize,
}

impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.names.len() + 2))?;
        map.serialize_entry(DATE_ID, &self.date_id)?;
        map.serialize_entry(REGION, self.region)?;
        for (name, column) in self.names.iter().zip(self.columns) {
            let value = column[self.index];
            let cell = value.is_finite().then_some(value);
            map.serialize_entry(name, &cell)?;
        }
        map.end()
    }
}

/// Rows carry `date_id` as epoch milliseconds; NaN shares are written as `null`.
impl Serialize for AggregateTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let names = self.value_columns();
        let date_ids = self.date_ids().map_err(S::Error::custom)?;
        let regions = self.regions().map_err(S::Error::custom)?;
        let columns = names
            .iter()
            .map(|name| self.values(name))
            .collect::<Result<Vec<_>, _>>()
            .map_err(S::Error::custom)?;

        let mut seq = serializer.serialize_seq(Some(date_ids.len()))?;
        for (index, (date_id, region)) in date_ids.iter().zip(&regions).enumerate() {
            seq.serialize_element(&Row {
                date_id: *date_id,
                region: region.as_str(),
                names: &names,
                columns: &columns,
                index,
            })?;
        }
        seq.end()
    }
}

pub fn to_json_value(response: &PipelineResponse) -> serde_json::Result<Value> {
    serde_json::to_value(response)
}

pub fn to_json_string(response: &PipelineResponse) -> serde_json::Result<String> {
    serde_json::to_string(response)
}
