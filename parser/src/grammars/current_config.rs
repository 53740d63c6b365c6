//! `display current-configuration`.
//!
//! The configuration is a tree written by indentation: a top-level
//! command opens a section and deeper-indented lines nest under the
//! nearest shallower line. A `#` at column zero closes the section and the
//! fixed `return` trailer closes the block.
//!
//! Every line is meaningful here, so the grammar works line by line in
//! [`Grammar::handle`] rather than through patterns.

use regex::Regex;
use serde_json::Value;

use netlog_core::{Document, Row, ValidationRule};

use crate::block::{Block, EntryMatch};
use crate::classify::{command_echo, is_prompt};
use crate::grammar::{Grammar, Seed};
use crate::rule::RuleSet;

pub struct CurrentConfig {
    version: Regex,
    rules: RuleSet<ConfigCursor>,
}

#[derive(Debug, Default)]
pub struct ConfigCursor {
    /// Indentation and index of every open node, outermost first.
    path: Vec<(usize, usize)>,
    done: bool,
}

fn node(command: &str) -> Value {
    let mut row = Row::new();
    row.insert("command".to_string(), command.into());
    row.insert("children".to_string(), Value::Array(Vec::new()));
    Value::Object(row)
}

/// Returns the child list of the node addressed by `path`, or the
/// top-level section list for an empty path.
fn children_at<'a>(block: &'a mut Block, path: &[(usize, usize)]) -> Option<&'a mut Vec<Value>> {
    let mut children = block.doc_mut().get_mut("sections")?.as_array_mut()?;
    for &(_, index) in path {
        children = children.get_mut(index)?.get_mut("children")?.as_array_mut()?;
    }
    Some(children)
}

fn insert(cursor: &mut ConfigCursor, block: &mut Block, indent: usize, command: &str) -> bool {
    while cursor.path.last().is_some_and(|&(open, _)| open >= indent) {
        cursor.path.pop();
    }
    let Some(children) = children_at(block, &cursor.path) else {
        tracing::debug!(command, "configuration node has no parent");
        return false;
    };
    children.push(node(command));
    let index = children.len() - 1;
    cursor.path.push((indent, index));
    true
}

fn sysname_matches_prompt(doc: &Document) -> Result<(), String> {
    match (doc.get_str("hostname"), doc.get_str("sysname")) {
        (Some(hostname), Some(sysname)) if hostname != sysname => {
            Err(format!("prompt shows {hostname} but the configuration names {sysname}"))
        }
        _ => Ok(()),
    }
}

static VALIDATIONS: &[ValidationRule] = &[ValidationRule::warning("sysname_matches_prompt", sysname_matches_prompt)];

impl Grammar for CurrentConfig {
    const NAME: &'static str = "current_config";
    type Cursor = ConfigCursor;

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            version: Regex::new(r"^\s*!Software Version\s+(?P<version>\S+)\s*$")?,
            rules: RuleSet::default(),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        if let Some(hostname) = command_echo(line, "display current-configuration") {
            return Some(EntryMatch::bare().with("hostname", hostname));
        }
        self.version.is_match(line).then(EntryMatch::bare)
    }

    fn rules(&self) -> &RuleSet<ConfigCursor> {
        &self.rules
    }

    fn start(&self, _: &mut ConfigCursor, block: &mut Block, entry: &EntryMatch) -> Seed {
        block.set("sections", Value::Array(Vec::new()));
        match entry.get("hostname") {
            Some(hostname) => {
                block.set("hostname", hostname);
                Seed::HeaderOnly
            }
            None => Seed::ParseEntryLine,
        }
    }

    fn handle(&self, cursor: &mut ConfigCursor, block: &mut Block, line: &str) -> Option<bool> {
        let command = line.trim();
        if command.is_empty() {
            return Some(true);
        }
        let indent = line.len() - line.trim_start().len();

        if let Some(caps) = self.version.captures(line) {
            block.set("software_version", &caps["version"]);
            return Some(true);
        }
        if command.starts_with('!') {
            return Some(true);
        }
        if command == "#" {
            // An indented `#` separates views inside a section.
            if indent == 0 {
                cursor.path.clear();
            }
            return Some(true);
        }
        if command == "return" && indent == 0 {
            cursor.done = true;
            return Some(true);
        }
        if indent == 0 {
            if let Some(name) = command.strip_prefix("sysname ") {
                block.set("sysname", name.trim());
            }
        }
        Some(insert(cursor, block, indent, command))
    }

    fn ends_block(&self, cursor: &ConfigCursor, _: &Block, line: &str) -> Option<bool> {
        Some(cursor.done || is_prompt(line))
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

    const CONFIG: &[&str] = &[
        "<R1>display current-configuration",
        "!Software Version V200R010C00SPC600",
        "#",
        "sysname R1",
        "#",
        "vlan batch 10 20",
        "#",
        "interface Vlanif10",
        " ip address 10.1.1.1 255.255.255.0",
        "#",
        "bgp 100",
        " peer 2.2.2.2 as-number 100",
        " #",
        " ipv4-family unicast",
        "  undo synchronization",
        "  peer 2.2.2.2 enable",
        "#",
        "return",
        "<R1>display clock",
    ];

    #[test]
    fn test_sections_nest_by_indentation() {
        let mut registry = ParserRegistry::builtin();
        let docs = scan_lines(&mut registry, CONFIG.iter().copied());
        assert_eq!(docs[0].kind, "current_config");
        assert_eq!(docs[1].kind, "clock");

        let doc = &docs[0];
        assert!(doc.is_clean(), "{:?}", doc.warnings);
        assert_eq!(doc.get_str("software_version"), Some("V200R010C00SPC600"));
        assert_eq!(doc.get_str("sysname"), Some("R1"));

        let sections = doc.rows("sections");
        let commands: Vec<&str> = sections.iter().filter_map(|s| s["command"].as_str()).collect();
        assert_eq!(commands, ["sysname R1", "vlan batch 10 20", "interface Vlanif10", "bgp 100"]);
        assert_eq!(sections[2]["children"][0]["command"], "ip address 10.1.1.1 255.255.255.0");

        let bgp = &sections[3]["children"];
        assert_eq!(bgp.as_array().unwrap().len(), 2);
        assert_eq!(bgp[1]["command"], "ipv4-family unicast");
        assert_eq!(bgp[1]["children"][1]["command"], "peer 2.2.2.2 enable");
    }

    #[test]
    fn test_block_closes_after_return() {
        let mut registry = ParserRegistry::builtin();
        let docs = scan_lines(
            &mut registry,
            ["!Software Version V200R010C00SPC600", "sysname R2", "return", "stray trailing text"],
        );
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get_str("sysname"), Some("R2"));
        assert!(docs[0].get("hostname").is_none());
        assert_eq!(docs[0].rows("sections").len(), 1);
    }

    #[test]
    fn test_sysname_mismatch_warns() {
        let mut registry = ParserRegistry::builtin();
        let docs = scan_lines(&mut registry, ["<R1>dis cur", "sysname R9", "return"]);
        assert_eq!(docs[0].warnings.len(), 1);
        assert_eq!(docs[0].warnings[0].rule.as_deref(), Some("sysname_matches_prompt"));
    }
}
