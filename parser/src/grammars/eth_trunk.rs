//! `display eth-trunk <id>`.
//!
//! Sections arrive in a fixed order: the trunk's own parameters (two
//! `Key: value` pairs per line), then the actor port table, then
//! `Partner:` and the partner port table. Static trunks print a single
//! member table instead of the actor/partner pair.

use regex::Regex;
use serde_json::Value;

use netlog_core::{Document, Row, ValidationRule};

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::grammars::common::{extend_row, kv_pairs};
use crate::rule::{Fields, Rule, RuleSet, trimmed_value};

const ACTOR_COLUMNS: &[&str] = &["status", "port_type", "port_priority", "port_no", "port_key", "port_state", "weight"];
const PARTNER_COLUMNS: &[&str] = &["system_priority", "system_id", "port_priority", "port_no", "port_key", "port_state"];
const MEMBER_COLUMNS: &[&str] = &["status", "weight"];

pub struct EthTrunk {
    entry: Regex,
    rules: RuleSet<TrunkCursor>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Section {
    #[default]
    Local,
    Actor,
    Partner,
    PartnerTable,
    Members,
}

#[derive(Debug, Default)]
pub struct TrunkCursor {
    section: Section,
}

fn local(cursor: &mut TrunkCursor, _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    cursor.section = Section::Local;
    Ok(())
}

fn partner(cursor: &mut TrunkCursor, _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    cursor.section = Section::Partner;
    Ok(())
}

fn actor_header(cursor: &mut TrunkCursor, _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    cursor.section = match cursor.section {
        Section::Partner => Section::PartnerTable,
        _ => Section::Actor,
    };
    Ok(())
}

fn partner_header(cursor: &mut TrunkCursor, _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    cursor.section = Section::PartnerTable;
    Ok(())
}

fn member_header(cursor: &mut TrunkCursor, _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    cursor.section = Section::Members;
    Ok(())
}

fn parameters(cursor: &mut TrunkCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    if cursor.section != Section::Local {
        return Err(RuleError::OutOfContext("trunk parameters after the port tables".to_string()));
    }
    extend_row(block.fields_mut(), kv_pairs(fields.line()));
    Ok(())
}

fn port_row(cursor: &mut TrunkCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let (key, columns) = match cursor.section {
        Section::Actor => ("actor_ports", ACTOR_COLUMNS),
        Section::PartnerTable => ("partner_ports", PARTNER_COLUMNS),
        Section::Members => ("members", MEMBER_COLUMNS),
        Section::Local | Section::Partner => {
            return Err(RuleError::OutOfContext("port row before any port table header".to_string()));
        }
    };
    let mut row = Row::new();
    row.insert("port".to_string(), fields.value("port"));
    let cells = fields.get("cells").unwrap_or_default().split_whitespace();
    for (column, cell) in columns.iter().zip(cells) {
        row.insert(column.to_string(), trimmed_value(cell));
    }
    block.push_row(key, row);
    Ok(())
}

fn up_ports_match(doc: &Document) -> Result<(), String> {
    let Some(declared) = doc.get_i64("number_of_up_port_in_trunk") else {
        return Ok(());
    };
    let status_is = |key: &str, wanted: &str| {
        doc.rows(key)
            .iter()
            .filter(|row| {
                row.get("status")
                    .and_then(Value::as_str)
                    .is_some_and(|status| status.eq_ignore_ascii_case(wanted))
            })
            .count()
    };
    let up = (status_is("actor_ports", "Selected") + status_is("members", "Up")) as i64;
    if up == declared {
        Ok(())
    } else {
        Err(format!("trunk declares {declared} up ports but {up} are selected or up"))
    }
}

static VALIDATIONS: &[ValidationRule] = &[ValidationRule::warning("up_port_count_matches", up_ports_match)];

impl Grammar for EthTrunk {
    const NAME: &'static str = "eth_trunk";
    type Cursor = TrunkCursor;

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*(?P<trunk>Eth-Trunk\d+)'s state information is:\s*$")?,
            rules: RuleSet::new(vec![
                Rule::new("local", r"^\s*Local:\s*$", local)?,
                Rule::new("partner", r"^\s*Partner:\s*$", partner)?,
                Rule::new("partner_header", r"^\s*ActorPortName\s+SysPri\b", partner_header)?,
                Rule::new("actor_header", r"^\s*ActorPortName\s+Status\b", actor_header)?,
                Rule::new("member_header", r"^\s*PortName\s+Status\s+Weight\s*$", member_header)?,
                Rule::new("parameters", r"^\s*[A-Za-z][\w\s\-./()]*?:\s*\S", parameters)?,
                Rule::new("port_row", r"^\s*(?P<port>[A-Za-z][\w\-./]*\d)\s+(?P<cells>\S.*?)\s*$", port_row)?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        EntryMatch::capture(&self.entry, line)
    }

    fn rules(&self) -> &RuleSet<TrunkCursor> {
        &self.rules
    }

    fn start(&self, _: &mut TrunkCursor, block: &mut Block, entry: &EntryMatch) -> Seed {
        block.set_text("trunk", entry.get("trunk").unwrap_or_default());
        for key in ["actor_ports", "partner_ports", "members"] {
            block.set(key, Value::Array(Vec::new()));
        }
        Seed::HeaderOnly
    }

    fn validations(&self) -> &'static [ValidationRule] {
        VALIDATIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{BlockParser, GrammarParser};
    use netlog_core::DiagnosticKind;

    const ENTRY: &str = "Eth-Trunk1's state information is:";

    fn parse(lines: &[&str]) -> Document {
        let mut parser = GrammarParser::<EthTrunk>::standalone().unwrap();
        let entry = parser.is_entry_point(ENTRY).unwrap();
        parser.start_block(ENTRY, &entry);
        for line in lines {
            parser.parse_line(line);
        }
        parser.get_result().unwrap()
    }

    #[test]
    fn test_lacp_trunk_sections() {
        let doc = parse(&[
            "Local:",
            "LAG ID: 1                   WorkingMode: LACP",
            "Preempt Delay: Disabled     Hash arithmetic: According to SIP-XOR-DIP",
            "System Priority: 32768      System ID: 00e0-fc12-3456",
            "Least Active-linknumber: 1  Max Active-linknumber: 8",
            "Operate status: up          Number Of Up Port In Trunk: 2",
            "--------------------------------------------------------------------------------",
            "ActorPortName          Status   PortType PortPri PortNo PortKey PortState Weight",
            "GigabitEthernet0/0/1   Selected 1GE      32768   2      305     10111100  1",
            "GigabitEthernet0/0/2   Selected 1GE      32768   3      305     10111100  1",
            "",
            "Partner:",
            "--------------------------------------------------------------------------------",
            "ActorPortName          SysPri   SystemID        PortPri PortNo PortKey PortState",
            "GigabitEthernet0/0/1   32768    00e0-fc65-4321  32768   2      305     10111100",
            "GigabitEthernet0/0/2   32768    00e0-fc65-4321  32768   3      305     10111100",
        ]);
        assert!(doc.is_clean(), "{:?} {:?}", doc.warnings, doc.errors);
        assert_eq!(doc.get_str("trunk"), Some("Eth-Trunk1"));
        assert_eq!(doc.get_i64("lag_id"), Some(1));
        assert_eq!(doc.get_str("working_mode"), Some("LACP"));
        assert_eq!(doc.get_str("hash_arithmetic"), Some("According to SIP-XOR-DIP"));
        assert_eq!(doc.get_i64("max_active_linknumber"), Some(8));

        let actor = doc.rows("actor_ports");
        assert_eq!(actor.len(), 2);
        assert_eq!(actor[0]["port_state"], 10111100);
        assert_eq!(actor[1]["port_no"], 3);
        let partner = doc.rows("partner_ports");
        assert_eq!(partner[0]["system_id"], "00e0-fc65-4321");
        assert_eq!(partner[1]["port_key"], 305);
    }

    #[test]
    fn test_static_trunk_members_and_up_count() {
        let doc = parse(&[
            "WorkingMode: NORMAL         Hash arithmetic: According to SIP-XOR-DIP",
            "Operate status: up          Number Of Up Port In Trunk: 2",
            "PortName                      Status      Weight",
            "GigabitEthernet0/0/1          Up          1",
            "GigabitEthernet0/0/2          Down        1",
        ]);
        let members = doc.rows("members");
        assert_eq!(members.len(), 2);
        assert_eq!(members[1]["status"], "Down");
        assert_eq!(doc.warnings.len(), 1);
        assert_eq!(doc.warnings[0].kind, DiagnosticKind::ValidationFailed);
    }

    #[test]
    fn test_port_row_before_header_is_error() {
        let doc = parse(&["GigabitEthernet0/0/1          Up          1"]);
        assert_eq!(doc.errors.len(), 1);
        assert_eq!(doc.errors[0].rule.as_deref(), Some("port_row"));
    }
}
