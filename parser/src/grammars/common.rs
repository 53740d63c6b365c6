//! Helpers shared by the command grammars.

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use netlog_core::Row;

use crate::error::RuleError;
use crate::rule::{Fields, trimmed_value};

/// `Key : value` with the key starting at a letter. The key stops at the
/// first colon, so values such as `flash:/vrpcfg.zip` stay whole.
pub const KEY_VALUE_PATTERN: &str = r"^\s*(?P<key>[A-Za-z][^:]*?)\s*:\s*(?P<value>.*?)\s*$";

pub static KEY_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(KEY_VALUE_PATTERN).expect("static regex must compile"));

static COLUMN_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").expect("static regex must compile"));

/// Snake-cased key and coerced value of a [`KEY_VALUE_PATTERN`] match.
pub fn key_value(fields: &Fields<'_>) -> Result<(String, Value), RuleError> {
    let key = snake_key(fields.require("key")?);
    Ok((key, fields.value("value")))
}

/// Normalizes a device field label to a snake_case key.
///
/// ```
/// use netlog_parser::grammars::common::snake_key;
///
/// assert_eq!(snake_key("Patch Package Name"), "patch_package_name");
/// assert_eq!(snake_key("Wavelength(nm)"), "wavelength_nm");
/// assert_eq!(snake_key("Manu. Serial Number"), "manu_serial_number");
/// assert_eq!(snake_key("WorkingMode"), "working_mode");
/// ```
pub fn snake_key(label: &str) -> String {
    let mut key = String::with_capacity(label.len() + 4);
    let mut pending_sep = false;
    let mut prev_lower = false;
    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            // WorkingMode -> working_mode
            if ch.is_ascii_uppercase() && prev_lower {
                pending_sep = true;
            }
            if pending_sep && !key.is_empty() {
                key.push('_');
            }
            pending_sep = false;
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
            key.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
            prev_lower = false;
        }
    }
    key
}

/// Splits a table row on runs of two or more spaces.
pub fn split_columns(line: &str) -> Vec<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    COLUMN_GAP.split(trimmed).collect()
}

/// Parses a line holding several `Key: value` pairs separated by wide gaps,
/// as in `LAG ID: 1        WorkingMode: STATIC`.
pub fn kv_pairs(line: &str) -> Vec<(String, Value)> {
    split_columns(line)
        .into_iter()
        .filter_map(|segment| {
            let (key, value) = segment.split_once(':')?;
            let key = snake_key(key);
            (!key.is_empty()).then(|| (key, trimmed_value(value)))
        })
        .collect()
}

/// Parses comma-separated `Key: value` pairs, as in
/// `Speed : 1000,  Loopback: NONE`.
pub fn comma_pairs(line: &str) -> Vec<(String, Value)> {
    line.split(',')
        .filter_map(|segment| {
            let (key, value) = segment.split_once(':')?;
            let key = snake_key(key);
            (!key.is_empty()).then(|| (key, trimmed_value(value)))
        })
        .collect()
}

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").expect("static regex must compile"));

/// Column start offsets read from a table header, for tables whose cells
/// may be blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    columns: Vec<(usize, &'static str)>,
}

impl ColumnLayout {
    /// Locates each `(label, key)` pair in `header`; labels not present are
    /// left out.
    pub fn from_header(header: &str, labels: &[(&str, &'static str)]) -> Self {
        let mut columns: Vec<(usize, &'static str)> = labels
            .iter()
            .filter_map(|(label, key)| header.find(label).map(|offset| (offset, *key)))
            .collect();
        columns.sort_by_key(|(offset, _)| *offset);
        Self { columns }
    }

    /// Assigns each token at or after byte `from` to the column whose start
    /// is nearest. Tokens landing in the same column are joined by a space;
    /// columns without a token are `null`.
    pub fn assign(&self, line: &str, from: usize) -> Row {
        let mut cells: Vec<Vec<&str>> = vec![Vec::new(); self.columns.len()];
        for token in TOKEN.find_iter(line).filter(|token| token.start() >= from) {
            let nearest = self
                .columns
                .iter()
                .enumerate()
                .min_by_key(|(_, (offset, _))| offset.abs_diff(token.start()))
                .map(|(index, _)| index);
            if let Some(index) = nearest {
                cells[index].push(token.as_str());
            }
        }
        self.columns
            .iter()
            .zip(cells)
            .map(|((_, key), tokens)| (key.to_string(), trimmed_value(&tokens.join(" "))))
            .collect()
    }
}

/// Inserts pairs into `row`, later keys overwriting earlier ones.
pub fn extend_row(row: &mut Row, pairs: Vec<(String, Value)>) {
    for (key, value) in pairs {
        row.insert(key, value);
    }
}

/// Returns the object stored under `key` in `row`, creating it when absent.
pub fn object_entry<'a>(row: &'a mut Row, key: &str) -> &'a mut Row {
    let slot = row
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Row::new()));
    if !slot.is_object() {
        *slot = Value::Object(Row::new());
    }
    match slot {
        Value::Object(map) => map,
        _ => unreachable!("slot was just made an object"),
    }
}

/// Appends `text` to the string field `key`, joined by a single space.
pub fn append_text(row: &mut Row, key: &str, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    let joined = match row.get(key).and_then(Value::as_str) {
        Some(existing) if !existing.trim().is_empty() => format!("{} {text}", existing.trim_end()),
        _ => text.to_string(),
    };
    row.insert(key.to_string(), Value::String(joined));
}

/// Normalizes a device timestamp to ISO 8601.
///
/// Accepts `YYYY-MM-DD HH:MM:SS` with an optional `+HH:MM` offset, runs of
/// spaces between date and time, and `/` as the date separator. Returns
/// `None` for anything else.
pub fn iso_timestamp(text: &str) -> Option<String> {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ").replace('/', "-");
    if let Ok(stamp) = DateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(stamp.to_rfc3339());
    }
    NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|stamp| stamp.format("%Y-%m-%dT%H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_key_collapses_punctuation() {
        assert_eq!(snake_key("Number Of Up Port In Trunk"), "number_of_up_port_in_trunk");
        assert_eq!(snake_key("KASent/Rcv"), "kasent_rcv");
        assert_eq!(snake_key("  LAG ID "), "lag_id");
        assert_eq!(snake_key("Temperature(°C)"), "temperature_c");
    }

    #[test]
    fn test_split_columns() {
        assert_eq!(
            split_columns("  Local Intf       Neighbor Dev   Exptime(s) "),
            vec!["Local Intf", "Neighbor Dev", "Exptime(s)"]
        );
        assert!(split_columns("   ").is_empty());
    }

    #[test]
    fn test_kv_pairs_two_per_line() {
        let pairs = kv_pairs("Preempt Delay: Disabled     Hash arithmetic: According to SIP-XOR-DIP");
        assert_eq!(pairs[0], ("preempt_delay".to_string(), Value::from("Disabled")));
        assert_eq!(
            pairs[1],
            ("hash_arithmetic".to_string(), Value::from("According to SIP-XOR-DIP"))
        );
        assert_eq!(kv_pairs("LAG ID: 1        WorkingMode: STATIC")[0].1, Value::from(1));
    }

    #[test]
    fn test_comma_pairs() {
        let pairs = comma_pairs("Speed : 1000,  Loopback: NONE");
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("speed".to_string(), Value::from(1000)));
        assert_eq!(pairs[1], ("loopback".to_string(), Value::from("NONE")));
    }

    #[test]
    fn test_append_text_joins_with_single_space() {
        let mut row = Row::new();
        row.insert("info".to_string(), Value::from("power   "));
        append_text(&mut row, "info", "   supply abnormal ");
        assert_eq!(row["info"], "power supply abnormal");
    }

    #[test]
    fn test_object_entry_creates_nested_object() {
        let mut row = Row::new();
        object_entry(&mut row, "local").insert("lag_id".to_string(), Value::from(1));
        assert_eq!(row["local"]["lag_id"], 1);
    }

    #[test]
    fn test_column_layout_handles_blank_cells() {
        let header = "        Network            NextHop        MED        LocPrf    PrefVal Path/Ogn";
        let layout = ColumnLayout::from_header(
            header,
            &[("MED", "med"), ("LocPrf", "local_pref"), ("PrefVal", "pref_val"), ("Path/Ogn", "path")],
        );
        let row = layout.assign(
            " *>i    2.2.2.2/32         10.1.1.2        0          100        0       65001 65002i",
            35,
        );
        assert_eq!(row["med"], 0);
        assert_eq!(row["local_pref"], 100);
        assert_eq!(row["path"], "65001 65002i");

        let row = layout.assign(" *>     1.1.1.1/32         0.0.0.0         0                     0       ?", 35);
        assert_eq!(row["local_pref"], Value::Null);
        assert_eq!(row["pref_val"], 0);
        assert_eq!(row["path"], "?");
    }

    #[test]
    fn test_key_value_regex() {
        let caps = KEY_VALUE.captures(" Patch Package Version:V200R010SPH001").unwrap();
        assert_eq!(&caps["key"], "Patch Package Version");
        assert_eq!(&caps["value"], "V200R010SPH001");
    }

    #[test]
    fn test_iso_timestamp_forms() {
        assert_eq!(iso_timestamp("2023-01-01  10:00:00").as_deref(), Some("2023-01-01T10:00:00"));
        assert_eq!(
            iso_timestamp("2023-01-01 10:00:00+08:00").as_deref(),
            Some("2023-01-01T10:00:00+08:00")
        );
        assert_eq!(iso_timestamp("2023/01/01 10:00:00").as_deref(), Some("2023-01-01T10:00:00"));
        assert_eq!(iso_timestamp("yesterday"), None);
    }
}
