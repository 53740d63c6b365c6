//! `display mpls ldp session`.
//!
//! A leading `*` marks a session being deleted. Session age is printed as
//! `DDDD:HH:MM` and the keepalive column as `sent/received`.

use regex::Regex;
use serde_json::Value;

use netlog_core::{Document, ValidationRule, check_declared_count};

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

pub struct MplsLdpSession {
    entry: Regex,
    rules: RuleSet<()>,
}

/// Minutes in a `DDDD:HH:MM` session age.
fn age_minutes(age: &str) -> Option<i64> {
    let mut parts = age.split(':').map(|part| part.parse::<i64>().ok());
    let (days, hours, minutes) = (parts.next()??, parts.next()??, parts.next()??);
    Some(days * 24 * 60 + hours * 60 + minutes)
}

fn session(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let age = fields.require("age")?;
    let minutes = age_minutes(age).ok_or_else(|| RuleError::InvalidValue {
        field: "age",
        value: age.to_string(),
    })?;
    let mut row = fields.row_of(&["peer_id", "label_space", "status", "lam", "role"]);
    row.insert("age".to_string(), age.into());
    row.insert("age_minutes".to_string(), minutes.into());
    row.insert("ka_sent".to_string(), fields.int("ka_sent")?.into());
    row.insert("ka_received".to_string(), fields.int("ka_received")?.into());
    row.insert("deleting".to_string(), fields.get("deleting").is_some().into());
    block.push_row("sessions", row);
    Ok(())
}

fn total(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("total", fields.int("total")?);
    Ok(())
}

fn legend(_: &mut (), _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    Ok(())
}

fn total_matches(doc: &Document) -> Result<(), String> {
    check_declared_count(doc, "total", "sessions")
}

static VALIDATIONS: &[ValidationRule] = &[ValidationRule::warning("session_total_matches", total_matches)];

impl Grammar for MplsLdpSession {
    const NAME: &'static str = "mpls_ldp_session";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*LDP Session\(s\) in\s+(?P<network>.+?)\s*$")?,
            rules: RuleSet::new(vec![
                Rule::new(
                    "session",
                    r"^\s*(?P<deleting>\*)?(?P<peer_id>\d{1,3}(?:\.\d{1,3}){3}):(?P<label_space>\d+)\s+(?P<status>\S+)\s+(?P<lam>\S+)\s+(?P<role>\S+)\s+(?P<age>\d+:\d+:\d+)\s+(?P<ka_sent>\d+)/(?P<ka_received>\d+)\s*$",
                    session,
                )?,
                Rule::new("total", r"^\s*TOTAL:\s*(?P<total>\d+)\s+Session\(s\) Found\.?\s*$", total)?,
                Rule::new("legend", r"^\s*(?:Codes:|A '\*' before|PeerID\s+Status\b)", legend)?,
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
        block.set_text("network", entry.get("network").unwrap_or_default());
        block.set("sessions", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }

    fn validations(&self) -> &'static [ValidationRule] {
        VALIDATIONS
    }
}
