//! `display clock`.
//!
//! The output carries no header of its own, so the block opens on the
//! prompt echoing the command.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};
use regex::Regex;

use netlog_core::{Document, ValidationRule};

use crate::block::{Block, EntryMatch};
use crate::classify::command_echo;
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

pub struct Clock {
    rules: RuleSet<()>,
}

fn datetime(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let date = fields.require("date")?;
    let time = fields.require("time")?;
    let invalid = || RuleError::InvalidValue {
        field: "time",
        value: format!("{date} {time}"),
    };
    let iso = match fields.get("offset") {
        Some(offset) => DateTime::parse_from_str(&format!("{date} {time}{offset}"), "%Y-%m-%d %H:%M:%S%:z")
            .map_err(|_| invalid())?
            .to_rfc3339(),
        None => NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S")
            .map_err(|_| invalid())?
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string(),
    };
    block.set("datetime", iso);
    block.set("date", date);
    block.set("time", time);
    block.set("utc_offset", fields.value("offset"));
    block.set("dst", fields.get("dst").is_some());
    Ok(())
}

fn weekday(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("weekday", fields.value("weekday"));
    Ok(())
}

fn time_zone(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("time_zone", fields.value("zone"));
    block.set("time_zone_offset", fields.value("offset"));
    Ok(())
}

fn weekday_matches_date(doc: &Document) -> Result<(), String> {
    let (Some(date), Some(weekday)) = (doc.get_str("date"), doc.get_str("weekday")) else {
        return Ok(());
    };
    let Ok(date) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
        return Ok(());
    };
    let printed: Weekday = weekday
        .parse()
        .map_err(|_| format!("unknown weekday {weekday}"))?;
    let actual = date.weekday();
    if printed == actual {
        Ok(())
    } else {
        Err(format!("{date} is a {actual} but the device printed {weekday}"))
    }
}

static VALIDATIONS: &[ValidationRule] = &[ValidationRule::warning("weekday_matches_date", weekday_matches_date)];

impl Grammar for Clock {
    const NAME: &'static str = "clock";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            rules: RuleSet::new(vec![
                Rule::new(
                    "datetime",
                    r"^\s*(?P<date>\d{4}-\d{2}-\d{2})\s+(?P<time>\d{2}:\d{2}:\d{2})(?P<offset>[+-]\d{2}:\d{2})?(?:\s+(?P<dst>DST))?\s*$",
                    datetime,
                )?,
                Rule::new(
                    "weekday",
                    r"^\s*(?P<weekday>Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday)\s*$",
                    weekday,
                )?,
                Rule::new(
                    "time_zone",
                    r"^\s*Time Zone\s*\((?P<zone>[^)]*)\)\s*:\s*(?P<offset>\S+)\s*$",
                    time_zone,
                )?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        command_echo(line, "display clock").map(|hostname| EntryMatch::bare().with("hostname", hostname))
    }

    fn rules(&self) -> &RuleSet<()> {
        &self.rules
    }

    fn start(&self, _: &mut (), block: &mut Block, entry: &EntryMatch) -> Seed {
        block.set_text("hostname", entry.get("hostname").unwrap_or_default());
        Seed::HeaderOnly
    }

    fn validations(&self) -> &'static [ValidationRule] {
        VALIDATIONS
    }
}
