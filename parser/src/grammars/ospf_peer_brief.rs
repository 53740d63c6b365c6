//! `display ospf peer brief`. Each OSPF process prints its own table, so
//! every process is its own block.

use regex::Regex;
use serde_json::Value;

use netlog_core::{Document, ValidationRule, check_declared_count};

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

pub struct OspfPeerBrief {
    entry: Regex,
    rules: RuleSet<()>,
}

fn peer(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.push_row("peers", fields.row());
    Ok(())
}

fn total(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("total", fields.int("total")?);
    Ok(())
}

fn heading(_: &mut (), _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    Ok(())
}

fn total_matches(doc: &Document) -> Result<(), String> {
    check_declared_count(doc, "total", "peers")
}

static VALIDATIONS: &[ValidationRule] = &[ValidationRule::warning("peer_total_matches", total_matches)];

impl Grammar for OspfPeerBrief {
    const NAME: &'static str = "ospf_peer_brief";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*OSPF Process\s+(?P<process>\d+)\s+with Router ID\s+(?P<router_id>\S+)\s*$")?,
            rules: RuleSet::new(vec![
                Rule::new(
                    "peer",
                    r"^\s*(?P<area>\d{1,3}(?:\.\d{1,3}){3})\s+(?P<interface>\S+)\s+(?P<neighbor_id>\d{1,3}(?:\.\d{1,3}){3})\s+(?P<state>\S+)\s*$",
                    peer,
                )?,
                Rule::new("total", r"^\s*Total Peer\(s\)\s*:\s*(?P<total>\d+)\s*$", total)?,
                Rule::new(
                    "heading",
                    r"^\s*(?:Peer Statistic Information|Area Id\s+Interface\s+Neighbor id\s+State)\s*$",
                    heading,
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
        block.set_text("process", entry.get("process").unwrap_or_default());
        block.set_text("router_id", entry.get("router_id").unwrap_or_default());
        block.set("peers", Value::Array(Vec::new()));
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
    fn test_one_block_per_process() {
        let mut registry = ParserRegistry::builtin();
        let docs = scan_lines(
            &mut registry,
            [
                "         OSPF Process 1 with Router ID 1.1.1.1",
                "                  Peer Statistic Information",
                " ----------------------------------------------------------------------------",
                " Area Id          Interface                        Neighbor id      State",
                " 0.0.0.0          GigabitEthernet0/0/1             2.2.2.2          Full",
                " 0.0.0.1          Vlanif10                         3.3.3.3          Full",
                " ----------------------------------------------------------------------------",
                " Total Peer(s):     2",
                "         OSPF Process 2 with Router ID 1.1.1.2",
                " 0.0.0.0          GigabitEthernet0/0/3             4.4.4.4          ExStart",
                " Total Peer(s):     2",
            ],
        );
        assert_eq!(docs.len(), 2);
        assert!(docs[0].is_clean(), "{:?}", docs[0].warnings);
        assert_eq!(docs[0].get_i64("process"), Some(1));
        assert_eq!(docs[0].get_str("router_id"), Some("1.1.1.1"));
        let peers = docs[0].rows("peers");
        assert_eq!(peers[1]["area"], "0.0.0.1");
        assert_eq!(peers[1]["interface"], "Vlanif10");

        assert_eq!(docs[1].rows("peers")[0]["state"], "ExStart");
        assert_eq!(docs[1].warnings.len(), 1);
    }
}
