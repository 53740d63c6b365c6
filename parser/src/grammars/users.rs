//! `display users`.
//!
//! A `+` marks the session running the command. Each session row is
//! followed by a `Username :` line naming the logged-in user.

use regex::Regex;
use serde_json::Value;

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

pub struct Users {
    entry: Regex,
    rules: RuleSet<()>,
}

fn session(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let mut row = fields.row_of(&["index"]);
    let interface = fields.require("interface")?.split_whitespace().collect::<Vec<_>>().join(" ");
    row.insert("interface".to_string(), interface.into());
    row.extend(fields.row_of(&["delay", "type", "address", "authen_status", "author_cmd_flag"]));
    row.insert("current".to_string(), fields.get("current").is_some().into());
    row.insert("username".to_string(), Value::Null);
    block.push_row("sessions", row);
    Ok(())
}

fn username(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let name = fields.value("username");
    match block.last_row_mut("sessions") {
        Some(row) => {
            row.insert("username".to_string(), name);
        }
        None => block.warn_orphan(fields.line(), "username without a session row"),
    }
    Ok(())
}

fn note(_: &mut (), _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    Ok(())
}

impl Grammar for Users {
    const NAME: &'static str = "users";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*User-Intf\s+Delay\s+Type\s+Network Address\b")?,
            rules: RuleSet::new(vec![
                Rule::new(
                    "session",
                    r"^\s*(?P<current>\+)?\s*(?P<index>\d+)\s+(?P<interface>[A-Za-z]+\s*\d+)\s+(?P<delay>\d+:\d+:\d+)\s+(?P<type>\S+)\s+(?P<address>\S+)(?:\s+(?P<authen_status>\S+))?(?:\s+(?P<author_cmd_flag>\S+))?\s*$",
                    session,
                )?,
                Rule::new("username", r"^\s*Username\s*:\s*(?P<username>\S*)\s*$", username)?,
                Rule::new("note", r"^\s*NOTE:", note)?,
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
        block.set("sessions", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }
}
