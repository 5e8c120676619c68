//! Request/response bodies of the scoring endpoint

use crate::parameters::RequestParameters;
use crate::table::TimeSeriesTable;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Name of the single input table
pub const INPUT_NAME: &str = "input1";

/// Column names sent with the input table
pub const INPUT_COLUMNS: [&str; 2] = ["timestamp", "count"];

/// POST body
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScoreRequest<'a> {
    pub inputs: BTreeMap<&'static str, StringTable<'a>>,
    pub global_parameters: BTreeMap<&'static str, String>,
}

impl<'a> ScoreRequest<'a> {
    pub fn new(table: &'a TimeSeriesTable, params: &RequestParameters) -> Self {
        let input = StringTable {
            column_names: INPUT_COLUMNS,
            values: table.values(),
        };

        Self {
            inputs: BTreeMap::from([(INPUT_NAME, input)]),
            global_parameters: params.global_parameters(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StringTable<'a> {
    pub column_names: [&'static str; 2],
    pub values: Vec<[&'a str; 2]>,
}

/// Outer response envelope
#[derive(Debug, Deserialize)]
pub struct ScoreResponseEnvelope {
    #[serde(rename = "Results")]
    pub results: Results,
}

#[derive(Debug, Deserialize)]
pub struct Results {
    pub output1: Output<TableValue>,
    #[serde(default)]
    pub output2: Option<SecondaryOutput>,
}

#[derive(Debug, Deserialize)]
pub struct Output<T> {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub value: T,
}

/// Scored table
#[derive(Debug, Deserialize)]
pub struct TableValue {
    #[serde(rename = "ColumnNames")]
    pub column_names: Vec<String>,
    #[serde(rename = "Values")]
    pub values: Vec<Vec<Option<String>>>,
}

/// Secondary output, kept untyped; `value.Values[0][0]` holds a JSON
/// document as a string. Any other shape means there is no document.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct SecondaryOutput(pub Value);

impl SecondaryOutput {
    pub fn document(&self) -> Option<&str> {
        self.0.get("value")?.get("Values")?.get(0)?.get(0)?.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Row;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let table = TimeSeriesTable::new(vec![Row::new("2020-01-01T00:00:00", "5")]);
        let params = RequestParameters::default();
        let body = serde_json::to_value(ScoreRequest::new(&table, &params)).unwrap();

        assert_eq!(
            body["Inputs"]["input1"],
            json!({
                "ColumnNames": ["timestamp", "count"],
                "Values": [["2020-01-01T00:00:00", "5"]]
            })
        );
        assert_eq!(body["GlobalParameters"]["Direction"], "both");
        assert_eq!(body["GlobalParameters"]["Log Scaling"], "");
        assert_eq!(body["GlobalParameters"].as_object().unwrap().len(), 14);
    }

    #[test]
    fn test_envelope_tolerates_missing_secondary_output() {
        let envelope: ScoreResponseEnvelope = serde_json::from_value(json!({
            "Results": {
                "output1": {
                    "type": "table",
                    "value": { "ColumnNames": ["a"], "ColumnTypes": ["String"], "Values": [["1"], [null]] }
                }
            }
        }))
        .unwrap();

        assert!(envelope.results.output2.is_none());
        assert_eq!(envelope.results.output1.kind.as_deref(), Some("table"));
        assert_eq!(envelope.results.output1.value.values[1][0], None);
    }
}
