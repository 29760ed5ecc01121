use std::collections::HashSet;
use std::fmt;

use serde_json::{Map, Value};

/// A column the index can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Ip,
    Port,
    Host,
    Org,
    Country,
    Region,
    City,
    Title,
}

/// Columns requested for every discovery query, in display order.
pub const DISCOVERY_FIELDS: [Field; 7] = [
    Field::Ip,
    Field::Port,
    Field::Host,
    Field::Org,
    Field::Country,
    Field::Region,
    Field::City,
];

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Ip => "ip",
            Field::Port => "port",
            Field::Host => "host",
            Field::Org => "org",
            Field::Country => "country",
            Field::Region => "region",
            Field::City => "city",
            Field::Title => "title",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Ip => "IP",
            Field::Port => "Port",
            Field::Host => "Host",
            Field::Org => "Org",
            Field::Country => "Country",
            Field::Region => "Region",
            Field::City => "City",
            Field::Title => "Title",
        }
    }
}

/// Comma-joined field list as sent in the `fields` query parameter.
pub fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(Field::as_str)
        .collect::<Vec<&str>>()
        .join(",")
}

/// One row returned by the index.
///
/// Values are positional and follow the field list of the query that produced
/// them. Two rows are the same row when all their values are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultRow {
    values: Vec<String>,
}

impl From<Vec<String>> for ResultRow {
    fn from(values: Vec<String>) -> Self {
        Self { values }
    }
}

impl ResultRow {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// The first column; the IP address for discovery queries.
    pub fn first(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// A row whose first column is empty carries nothing useful.
    pub fn is_informative(&self) -> bool {
        self.first().is_some_and(|v| !v.is_empty())
    }

    /// Looks up a column by name, given the field list the row was fetched with.
    pub fn get(&self, fields: &[Field], field: Field) -> Option<&str> {
        let idx = fields.iter().position(|f| *f == field)?;
        self.values.get(idx).map(String::as_str)
    }

    /// Labelled pairs for every column that has a value.
    pub fn labelled<'a>(&'a self, fields: &'a [Field]) -> impl Iterator<Item = (Field, &'a str)> {
        fields
            .iter()
            .zip(self.values.iter())
            .filter(|(_, value)| !value.is_empty())
            .map(|(field, value)| (*field, value.as_str()))
    }

    pub fn to_json(&self, fields: &[Field]) -> Value {
        let object: Map<String, Value> = fields
            .iter()
            .zip(self.values.iter())
            .map(|(field, value)| (field.as_str().to_string(), Value::String(value.clone())))
            .collect();
        Value::Object(object)
    }
}

impl fmt::Display for ResultRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.values.join(", "))
    }
}

/// Removes repeated rows, keeping the first occurrence of each.
pub fn dedup_rows(rows: Vec<ResultRow>) -> Vec<ResultRow> {
    let mut seen: HashSet<ResultRow> = HashSet::with_capacity(rows.len());
    rows.into_iter()
        .filter(|row| seen.insert(row.clone()))
        .collect()
}
