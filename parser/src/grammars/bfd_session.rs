//! `display bfd session all`.

use regex::Regex;
use serde_json::Value;

use netlog_core::{Document, ValidationRule};

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

pub struct BfdSession {
    entry: Regex,
    rules: RuleSet<()>,
}

fn session(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.push_row("sessions", fields.row());
    Ok(())
}

fn totals(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("total_up", fields.int("up")?);
    block.set("total_down", fields.int("down")?);
    Ok(())
}

/// Sessions in any state other than `Up` are reported as down.
fn totals_match(doc: &Document) -> Result<(), String> {
    let (Some(up), Some(down)) = (doc.get_i64("total_up"), doc.get_i64("total_down")) else {
        return Ok(());
    };
    let sessions = doc.rows("sessions");
    let found_up = sessions
        .iter()
        .filter(|session| {
            session
                .get("state")
                .and_then(Value::as_str)
                .is_some_and(|state| state.eq_ignore_ascii_case("up"))
        })
        .count() as i64;
    let found_down = sessions.len() as i64 - found_up;
    if (found_up, found_down) == (up, down) {
        Ok(())
    } else {
        Err(format!("totals declare {up}/{down} up/down but rows show {found_up}/{found_down}"))
    }
}

static VALIDATIONS: &[ValidationRule] = &[ValidationRule::warning("session_totals_match", totals_match)];

impl Grammar for BfdSession {
    const NAME: &'static str = "bfd_session";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*Local\s+Remote\s+PeerIpAddr\s+State\b")?,
            rules: RuleSet::new(vec![
                Rule::new(
                    "session",
                    r"^\s*(?P<local>\d+)\s+(?P<remote>\d+)\s+(?P<peer_ip>\S+)\s+(?P<state>\S+)\s+(?P<type>\S+)(?:\s+(?P<interface>\S+))?\s*$",
                    session,
                )?,
                Rule::new(
                    "totals",
                    r"^\s*Total UP/DOWN Session Number\s*:\s*(?P<up>\d+)/(?P<down>\d+)\s*$",
                    totals,
                )?,
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

    fn validations(&self) -> &'static [ValidationRule] {
        VALIDATIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ParserRegistry;
    use crate::scanner::scan_lines;

    #[test]
    fn test_sessions_and_totals() {
        let mut registry = ParserRegistry::builtin();
        let docs = scan_lines(
            &mut registry,
            [
                "--------------------------------------------------------------------------------",
                "Local Remote     PeerIpAddr      State     Type        InterfaceName",
                "--------------------------------------------------------------------------------",
                "8192  8192       10.1.1.2        Up        S_AUTO_PEER       GigabitEthernet0/0/1",
                "8193  8193       10.1.2.2        Down      S_AUTO_PEER       -",
                "--------------------------------------------------------------------------------",
                "     Total UP/DOWN Session Number : 1/1",
            ],
        );
        assert_eq!(docs.len(), 1);
        assert!(docs[0].is_clean(), "{:?}", docs[0].warnings);
        let sessions = docs[0].rows("sessions");
        assert_eq!(sessions[0]["interface"], "GigabitEthernet0/0/1");
        assert_eq!(sessions[1]["interface"], "-");
        assert_eq!(docs[0].get_i64("total_down"), Some(1));
    }

    #[test]
    fn test_totals_mismatch() {
        let mut doc = Document::new("bfd_session");
        let mut row = netlog_core::Row::new();
        row.insert("state".to_string(), "Down".into());
        doc.push_row("sessions", row);
        doc.set("total_up", 1);
        doc.set("total_down", 0);
        assert!(totals_match(&doc).is_err());
    }
}
