//! `display temperature all`.
//!
//! The header spans two lines; the second carries only the `Resume(C)`
//! labels of the lower and upper resume columns.

use regex::Regex;
use serde_json::Value;

use netlog_core::{Document, ValidationRule};

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

pub struct Temperature {
    entry: Regex,
    rules: RuleSet<()>,
}

fn sensor(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.push_row("sensors", fields.row());
    Ok(())
}

fn header(_: &mut (), _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    Ok(())
}

fn within_limits(doc: &Document) -> Result<(), String> {
    let out_of_range: Vec<String> = doc
        .rows("sensors")
        .iter()
        .filter_map(|sensor| {
            let reading = |key: &str| sensor.get(key).and_then(Value::as_i64);
            let current = reading("current")?;
            let low = reading("lower").is_some_and(|lower| current < lower);
            let high = reading("upper").is_some_and(|upper| current > upper);
            (low || high).then(|| {
                let slot = sensor.get("slot").map(Value::to_string).unwrap_or_default();
                let name = sensor.get("sensor").and_then(Value::as_str).unwrap_or("?");
                format!("slot {slot} {name} at {current}")
            })
        })
        .collect();
    if out_of_range.is_empty() {
        Ok(())
    } else {
        Err(format!("readings outside limits: {}", out_of_range.join(", ")))
    }
}

static VALIDATIONS: &[ValidationRule] = &[ValidationRule::warning("current_within_limits", within_limits)];

impl Grammar for Temperature {
    const NAME: &'static str = "temperature";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*SlotID\s+CardID\s+Sensor\s+Status\b")?,
            rules: RuleSet::new(vec![
                Rule::new(
                    "sensor",
                    r"^\s*(?P<slot>\d+)\s+(?P<card>\S+)\s+(?P<sensor>\S+)\s+(?P<status>\S+)\s+(?P<current>-?\d+)\s+(?P<lower>-?\d+)\s+(?P<lower_resume>-?\d+)\s+(?P<upper>-?\d+)\s+(?P<upper_resume>-?\d+)\s*$",
                    sensor,
                )?,
                Rule::new("header", r"^\s*Resume\(C\)\s+Resume\(C\)\s*$", header)?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        self.entry.is_match(line).then(EntryMatch::bare)
    }

    fn rules(&self) -> &RuleSet<()> {
        &self.rules
    }

    fn start(&self, _: &mut (), block: &mut Block, _: &EntryMatch) -> Seed {
        block.set("sensors", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }

    fn validations(&self) -> &'static [ValidationRule] {
        VALIDATIONS
    }
}
