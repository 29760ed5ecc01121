use std::collections::HashSet;

use tracing::warn;
use underlay_common::models::query::Query;
use underlay_common::models::row::Field;
use underlay_common::models::signal::Signal;
use underlay_common::target::Target;

use crate::ports::SearchIndex;

const OPEN: &str = "<title>";
const CLOSE: &str = "</title>";

/// Titles the index has already recorded for the target's host.
///
/// Best effort: a failed lookup is logged and contributes nothing.
pub async fn indexed_titles(index: &dyn SearchIndex, target: &Target) -> Vec<String> {
    let query = Query::new(Signal::Host(target.host().to_string()).predicate());
    match index.search(&query, &[Field::Title]).await {
        Ok(rows) => rows
            .iter()
            .filter_map(|row| row.first())
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
            .collect(),
        Err(e) => {
            warn!("Index title lookup for {target} failed: {e}");
            Vec::new()
        }
    }
}

/// Text between the first `<title>` and the following `</title>`, trimmed.
///
/// Tag matching ignores ASCII case; attributes on the tag are not supported.
pub fn extract_title(body: &str) -> Option<String> {
    let lower = body.to_ascii_lowercase();
    let start = lower.find(OPEN)? + OPEN.len();
    let end = start + lower[start..].find(CLOSE)?;

    let title = body[start..end].trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Indexed titles followed by the live one, without repeats.
pub fn merge(indexed: Vec<String>, live: Option<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    indexed
        .into_iter()
        .chain(live)
        .filter(|title| seen.insert(title.clone()))
        .collect()
}
