//! `display alarm active`.
//!
//! Alarm descriptions wrap onto unmarked continuation lines. Each one is
//! appended to the previous alarm's `info`, joined by a single space; a
//! continuation before any alarm row is dropped with a warning.

use chrono::NaiveDateTime;
use regex::Regex;
use serde_json::Value;

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::grammars::common::append_text;
use crate::rule::{Fields, Rule, RuleSet};

pub struct AlarmActive {
    entry: Regex,
    rules: RuleSet<AlarmCursor>,
}

#[derive(Debug, Default)]
pub struct AlarmCursor {
    last_alarm: Option<usize>,
}

fn alarm(cursor: &mut AlarmCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let date = fields.require("date")?;
    let time = fields.require("time")?;
    let raised_at = NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S")
        .map_err(|_| RuleError::InvalidValue {
            field: "time",
            value: format!("{date} {time}"),
        })?;

    let mut row = fields.row_of(&["index", "level", "date", "time"]);
    row.insert(
        "raised_at".to_string(),
        raised_at.format("%Y-%m-%dT%H:%M:%S").to_string().into(),
    );
    row.insert("info".to_string(), Value::String(fields.get("info").unwrap_or_default().to_string()));
    block.push_row("alarms", row);
    cursor.last_alarm = Some(block.row_count("alarms") - 1);
    Ok(())
}

fn continuation(cursor: &mut AlarmCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let Some(row) = block.record_mut("alarms", cursor.last_alarm) else {
        block.warn_orphan(fields.line(), "alarm text without a preceding alarm row");
        return Ok(());
    };
    append_text(row, "info", fields.require("text")?);
    Ok(())
}

impl Grammar for AlarmActive {
    const NAME: &'static str = "alarm_active";
    type Cursor = AlarmCursor;

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*Index\s+Level\s+Date\s+Time\s+Info\s*$")?,
            rules: RuleSet::new(vec![
                Rule::new(
                    "alarm",
                    r"^\s*(?P<index>\d+)\s+(?P<level>[A-Za-z]+)\s+(?P<date>\d{4}-\d{2}-\d{2})\s+(?P<time>\d{2}:\d{2}:\d{2})(?:\s+(?P<info>.*?))?\s*$",
                    alarm,
                )?,
                // Anything else that is not a separator rule continues the
                // previous alarm's text.
                Rule::new("continuation", r"^\s*(?P<text>[^\s\-=].*?)\s*$", continuation)?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        EntryMatch::capture(&self.entry, line)
    }

    fn rules(&self) -> &RuleSet<AlarmCursor> {
        &self.rules
    }

    fn start(&self, _: &mut AlarmCursor, block: &mut Block, _: &EntryMatch) -> Seed {
        block.set("alarms", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{BlockParser, GrammarParser};
    use crate::registry::ParserRegistry;
    use crate::scanner::scan_lines;

    const HEADER: &str = "Index  Level     Date       Time      Info";

    fn parser() -> GrammarParser<AlarmActive> {
        let mut parser = GrammarParser::<AlarmActive>::standalone().unwrap();
        let entry = parser.is_entry_point(HEADER).unwrap();
        parser.start_block(HEADER, &entry);
        parser
    }

    #[test]
    fn test_continuation_joins_with_single_space() {
        let mut p = parser();
        assert!(p.parse_line("1      Critical  2024-01-15 10:22:33 The power supply   "));
        assert!(p.parse_line("          is abnormal.   "));
        let doc = p.get_result().unwrap();
        let alarm = &doc.rows("alarms")[0];
        assert_eq!(alarm["info"], "The power supply is abnormal.");
        assert_eq!(alarm["raised_at"], "2024-01-15T10:22:33");
        assert_eq!(alarm["index"], 1);
        assert!(doc.is_clean());
    }

    #[test]
    fn test_orphan_continuation_is_dropped() {
        let mut p = parser();
        assert!(p.parse_line("   dangling text"));
        let doc = p.get_result().unwrap();
        assert!(doc.rows("alarms").is_empty());
        assert_eq!(doc.warnings.len(), 1);
    }

    #[test]
    fn test_bad_timestamp_is_handler_error() {
        let mut p = parser();
        assert!(!p.parse_line("2      Major     2024-13-45 10:22:33 Bad clock"));
        let doc = p.get_result().unwrap();
        assert_eq!(doc.errors.len(), 1);
        assert_eq!(doc.errors[0].rule.as_deref(), Some("alarm"));
    }

    #[test]
    fn test_separator_is_not_continuation() {
        let mut p = parser();
        p.parse_line("1      Minor     2024-01-15 10:22:33 Link down");
        assert!(!p.parse_line("--------------------------------------------------"));
        let doc = p.get_result().unwrap();
        assert_eq!(doc.rows("alarms")[0]["info"], "Link down");
        assert!(doc.is_clean());
    }

    #[test]
    fn test_back_to_back_blocks_split() {
        let mut registry = ParserRegistry::builtin();
        let docs = scan_lines(
            &mut registry,
            [
                HEADER,
                "1      Critical  2024-01-15 10:22:33 Power failure",
                HEADER,
                "1      Minor     2024-01-16 08:00:00 Fan speed low",
                "2      Minor     2024-01-16 08:00:01 Fan removed",
            ],
        );
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].rows("alarms").len(), 1);
        assert_eq!(docs[1].rows("alarms").len(), 2);
        assert_eq!(docs[1].rows("alarms")[0]["info"], "Fan speed low");
    }
}
