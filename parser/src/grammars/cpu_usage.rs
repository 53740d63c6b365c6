//! `display cpu-usage`: a summary followed by a per-task table.

use regex::Regex;
use serde_json::Value;

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::grammars::common::iso_timestamp;
use crate::rule::{Fields, Rule, RuleSet};

pub struct CpuUsage {
    entry: Regex,
    rules: RuleSet<()>,
}

fn usage(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("usage_percent", fields.int("usage")?);
    block.set("max_percent", fields.int("max")?);
    Ok(())
}

fn stat_time(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let raw = fields.require("time")?;
    let key = if fields.get("max").is_some() { "max_stat_time" } else { "stat_time" };
    let value = iso_timestamp(raw).unwrap_or_else(|| raw.to_string());
    block.set(key, value);
    Ok(())
}

fn averages(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("five_seconds_percent", fields.int("five_seconds")?);
    block.set("one_minute_percent", fields.int("one_minute")?);
    block.set("five_minutes_percent", fields.int("five_minutes")?);
    Ok(())
}

fn task(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let mut row = fields.row_of(&["task", "cpu_percent"]);
    let runtime: String = fields.get("runtime").unwrap_or_default().split_whitespace().collect();
    row.insert("runtime".to_string(), runtime.into());
    row.insert("explanation".to_string(), fields.value("explanation"));
    block.push_row("tasks", row);
    Ok(())
}

fn header(_: &mut (), _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    Ok(())
}

impl Grammar for CpuUsage {
    const NAME: &'static str = "cpu_usage";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*CPU Usage Stat\. Cycle:\s*(?P<cycle_seconds>\d+)\s*\(Second\)\s*$")?,
            rules: RuleSet::new(vec![
                Rule::new("usage", r"^\s*CPU Usage\s*:\s*(?P<usage>\d+)%\s*Max:\s*(?P<max>\d+)%\s*$", usage)?,
                Rule::new(
                    "stat_time",
                    r"^\s*(?P<max>Max )?CPU Usage Stat\. Time\s*:\s*(?P<time>.+?)\.?\s*$",
                    stat_time,
                )?,
                Rule::new(
                    "averages",
                    r"^\s*CPU utilization for five seconds:\s*(?P<five_seconds>\d+)%:?\s*one minute:\s*(?P<one_minute>\d+)%:?\s*five minutes:\s*(?P<five_minutes>\d+)%\s*$",
                    averages,
                )?,
                Rule::new("header", r"^\s*TaskName\s+CPU\b", header)?,
                Rule::new(
                    "task",
                    r"^\s*(?P<task>\S+)\s+(?P<cpu_percent>\d+)%\s+(?P<runtime>[0-9A-Fa-f]+/\s*[0-9A-Fa-f]+)\s*(?P<explanation>.*?)\s*$",
                    task,
                )?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        EntryMatch::capture(&self.entry, line)
    }

    fn rules(&self) -> &RuleSet<()> {
        &self.rules
    }

    fn start(&self, _: &mut (), block: &mut Block, entry: &EntryMatch) -> Seed {
        block.set_text("cycle_seconds", entry.get("cycle_seconds").unwrap_or_default());
        block.set("tasks", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{BlockParser, GrammarParser};

    #[test]
    fn test_summary_and_tasks() {
        let header = " CPU Usage Stat. Cycle: 60 (Second)";
        let mut parser = GrammarParser::<CpuUsage>::standalone().unwrap();
        let entry = parser.is_entry_point(header).unwrap();
        parser.start_block(header, &entry);
        for line in [
            " CPU Usage            : 8% Max: 13%",
            " CPU Usage Stat. Time : 2023-01-01  10:00:00",
            " CPU utilization for five seconds: 8%: one minute: 7%: five minutes: 6%",
            " Max CPU Usage Stat. Time : 2022-12-31 09:15:42.",
            "",
            " TaskName        CPU  Runtime(CPU Tick High/Tick Low)  Task Explanation",
            " BOX              0%         0/ 84e2d0b4       BOX Output",
            " VIDL            92%         0/5b4b6c9f        DOPRA IDLE",
            " TICK             0%         0/       0",
        ] {
            assert!(parser.parse_line(line), "{line}");
        }
        let doc = parser.get_result().unwrap();
        assert!(doc.is_clean());
        assert_eq!(doc.get_i64("cycle_seconds"), Some(60));
        assert_eq!(doc.get_i64("usage_percent"), Some(8));
        assert_eq!(doc.get_i64("max_percent"), Some(13));
        assert_eq!(doc.get_str("stat_time"), Some("2023-01-01T10:00:00"));
        assert_eq!(doc.get_str("max_stat_time"), Some("2022-12-31T09:15:42"));
        assert_eq!(doc.get_i64("five_minutes_percent"), Some(6));

        let tasks = doc.rows("tasks");
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0]["runtime"], "0/84e2d0b4");
        assert_eq!(tasks[1]["cpu_percent"], 92);
        assert_eq!(tasks[1]["explanation"], "DOPRA IDLE");
        assert_eq!(tasks[2]["explanation"], Value::Null);
    }
}
