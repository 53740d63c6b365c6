//! Route rows shared by the BGP routing-table grammars.
//!
//! A primary row carries the network; the rows after it that omit the
//! network are further paths to the same destination. `MED` and `LocPrf`
//! cells are often blank, so the metric columns are read by position
//! against the table header.

use serde_json::Value;

use netlog_core::{Document, Row};

use crate::grammars::common::ColumnLayout;
use crate::rule::Fields;

pub const STANDARD_HEADER: &str = "        Network            NextHop        MED        LocPrf    PrefVal Path/Ogn";

const METRIC_COLUMNS: &[(&str, &str)] = &[
    ("MED", "med"),
    ("LocPrf", "local_pref"),
    ("PrefVal", "pref_val"),
    ("Path/Ogn", "path"),
];

pub const HEADER_PATTERN: &str = r"^\s*Network\s+NextHop\s+MED\s+LocPrf\b";

/// Status codes, network, next hop.
pub const PRIMARY_PATTERN: &str =
    r"^\s*(?P<status>[*#][>dhxisSaVIN ]*?)\s+(?P<network>[0-9A-Fa-f.:]+/\d+)\s+(?P<next_hop>[0-9A-Fa-f.:]+)(?P<tail>.*)$";

/// Status codes and next hop only. Also matches a primary row (reading the
/// network as the next hop), so it must follow the primary rule.
pub const SECONDARY_PATTERN: &str =
    r"^\s*(?P<status>[*#][>dhxisSaVIN ]*?)\s+(?P<next_hop>\d{1,3}(?:\.\d{1,3}){3}|[0-9A-Fa-f]*:[0-9A-Fa-f:]*)(?P<tail>.*)$";

pub fn layout(header: &str) -> ColumnLayout {
    ColumnLayout::from_header(header, METRIC_COLUMNS)
}

pub fn standard_layout() -> ColumnLayout {
    layout(STANDARD_HEADER)
}

/// Builds a route row from a primary or secondary match.
pub fn route(fields: &Fields<'_>, layout: &ColumnLayout) -> Row {
    let status = fields.get("status").unwrap_or_default();
    let mut row = Row::new();
    row.insert("status".to_string(), Value::from(status));
    row.insert("valid".to_string(), Value::from(status.contains('*')));
    row.insert("best".to_string(), Value::from(status.contains('>')));
    row.insert("internal".to_string(), Value::from(status.contains('i')));
    row.insert("network".to_string(), fields.value("network"));
    row.insert("next_hop".to_string(), fields.value("next_hop"));
    let from = fields.start("tail").unwrap_or(fields.line().len());
    row.extend(layout.assign(fields.line(), from));
    row
}

/// Counts primary routes plus the paths attached to them.
pub fn count_paths(routes: &[Value]) -> usize {
    routes
        .iter()
        .map(|route| 1 + route.get("paths").and_then(Value::as_array).map_or(0, Vec::len))
        .sum()
}

/// Compares `total_routes` with the parsed path count under `key`.
pub fn check_route_total(doc: &Document, key: &str) -> Result<(), String> {
    let Some(declared) = doc.get_i64("total_routes") else {
        return Ok(());
    };
    let parsed = count_paths(doc.rows(key)) as i64;
    if declared == parsed {
        Ok(())
    } else {
        Err(format!("total_routes declares {declared} but {parsed} paths were parsed"))
    }
}

#[cfg(test)]
mod tests {
    use regex::Regex;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_primary_row() {
        let re = Regex::new(PRIMARY_PATTERN).unwrap();
        let line = " *>i    2.2.2.2/32         10.1.1.2        0          100        0       65001 65002i";
        let fields = Fields::capture(&re, line).unwrap();
        let row = route(&fields, &standard_layout());
        assert_eq!(row["network"], "2.2.2.2/32");
        assert_eq!(row["next_hop"], "10.1.1.2");
        assert_eq!(row["best"], true);
        assert_eq!(row["internal"], true);
        assert_eq!(row["local_pref"], 100);
        assert_eq!(row["path"], "65001 65002i");
    }

    #[test]
    fn test_secondary_row_keeps_spaced_status() {
        let re = Regex::new(SECONDARY_PATTERN).unwrap();
        let line = " * i                       10.1.1.3        0          100        0       ?";
        let fields = Fields::capture(&re, line).unwrap();
        let row = route(&fields, &standard_layout());
        assert_eq!(row["status"], "* i");
        assert_eq!(row["network"], Value::Null);
        assert_eq!(row["next_hop"], "10.1.1.3");
        assert_eq!(row["best"], false);
    }

    #[test]
    fn test_count_paths() {
        let routes = vec![json!({"paths": [{}, {}]}), json!({"network": null})];
        assert_eq!(count_paths(&routes), 4);
    }
}
