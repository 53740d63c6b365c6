//! `display ntp status`.
//!
//! Measurements printed with a unit (`-0.1234 ms`, `100.0000 Hz`) are
//! stored as numbers under a key carrying the unit.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::grammars::common::{KEY_VALUE_PATTERN, key_value};
use crate::rule::{Fields, Rule, RuleSet};

static MEASUREMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<amount>-?\d+(?:\.\d+)?)\s*(?P<unit>ms|Hz)$").expect("static regex must compile")
});

pub struct NtpStatus {
    entry: Regex,
    rules: RuleSet<()>,
}

fn property(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let (key, value) = key_value(fields)?;
    let measurement = value
        .as_str()
        .and_then(|text| MEASUREMENT.captures(text))
        .and_then(|caps| {
            let amount: f64 = caps["amount"].parse().ok()?;
            Some((format!("{key}_{}", caps["unit"].to_ascii_lowercase()), amount))
        });
    match measurement {
        Some((key, amount)) => block.set(&key, amount),
        None => block.set(&key, value),
    }
    Ok(())
}

impl Grammar for NtpStatus {
    const NAME: &'static str = "ntp_status";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*clock status\s*:\s*\S")?,
            rules: RuleSet::new(vec![Rule::new("property", KEY_VALUE_PATTERN, property)?]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        self.entry.is_match(line).then(EntryMatch::bare)
    }

    fn rules(&self) -> &RuleSet<()> {
        &self.rules
    }

    fn start(&self, _: &mut (), _: &mut Block, _: &EntryMatch) -> Seed {
        Seed::ParseEntryLine
    }

    fn finish(&self, _: &mut (), block: &mut Block) {
        let synchronized = block
            .doc()
            .get_str("clock_status")
            .is_some_and(|status| status.eq_ignore_ascii_case("synchronized"));
        block.set("synchronized", Value::Bool(synchronized));
    }
}
