//! Decoding of the index's response envelope.
//!
//! The `results` payload comes in several shapes depending on how many fields
//! were requested and whether anything matched:
//! * a table, one array of values per row;
//! * a flat column, one value per row (single-field queries);
//! * `null` or missing when nothing matched.

use serde::Deserialize;
use serde_json::Value;
use underlay_common::models::row::ResultRow;

use super::SearchError;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    errmsg: String,
    #[serde(default)]
    results: Option<Value>,
}

/// Accepted `results` shapes, tried in declaration order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Results {
    Table(Vec<Vec<String>>),
    Column(Vec<String>),
}

impl Results {
    fn into_rows(self) -> Vec<ResultRow> {
        match self {
            Results::Table(rows) => rows.into_iter().map(ResultRow::from).collect(),
            Results::Column(values) => values
                .into_iter()
                .map(|value| ResultRow::from(vec![value]))
                .collect(),
        }
    }
}

/// Decodes a response body into rows, dropping rows with an empty first column.
pub fn decode(body: &[u8]) -> Result<Vec<ResultRow>, SearchError> {
    let envelope: Envelope =
        serde_json::from_slice(body).map_err(|e| SearchError::Decode(e.to_string()))?;

    if envelope.error {
        return Err(SearchError::Remote(envelope.errmsg));
    }

    let rows = match envelope.results {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => {
            let raw = value.to_string();
            serde_json::from_value::<Results>(value)
                .map_err(|_| SearchError::Decode(raw))?
                .into_rows()
        }
    };

    Ok(rows.into_iter().filter(ResultRow::is_informative).collect())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
