use std::net::IpAddr;

use colored::*;
use underlay_common::models::row::{Field, ResultRow};

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

/// Colours an address by family; anything unparsable is left plain.
pub fn colorize_ip(ip: &str) -> ColoredString {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => ip.color(colors::IPV4_ADDR),
        Ok(IpAddr::V6(_)) => ip.color(colors::IPV6_ADDR),
        Err(_) => ip.normal(),
    }
}

/// `ip:port` heading for a result row.
pub fn row_title(row: &ResultRow, fields: &[Field]) -> String {
    let ip = row.get(fields, Field::Ip).unwrap_or("unknown");
    match row.get(fields, Field::Port) {
        Some(port) if !port.is_empty() => format!("{ip}:{port}"),
        _ => ip.to_string(),
    }
}

/// Non-empty columns of a row as labelled tree entries.
pub fn row_details(row: &ResultRow, fields: &[Field]) -> Vec<Detail> {
    row.labelled(fields)
        .map(|(field, value)| {
            let value = match field {
                Field::Ip => colorize_ip(value),
                Field::Port => value.color(colors::PORT),
                Field::Host => value.color(colors::HOSTNAME),
                _ => value.normal(),
            };
            (field.label().to_string(), value)
        })
        .collect()
}
