//! `display startup`.
//!
//! The output holds one section per main-control board. The first board
//! line opens the block; later board lines open a new section instead of
//! a new block.

use regex::Regex;
use serde_json::Value;

use netlog_core::Row;

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::grammars::common::{KEY_VALUE_PATTERN, key_value};
use crate::rule::{Fields, Rule, RuleSet};

const BOARD_PATTERN: &str = r"^\s*(?P<board>MainBoard|SlaveBoard)\s*:\s*$";

pub struct Startup {
    entry: Regex,
    rules: RuleSet<()>,
}

fn push_board(block: &mut Block, name: &str) {
    let mut row = Row::new();
    row.insert("board".to_string(), name.into());
    block.push_row("boards", row);
}

fn board(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    push_board(block, fields.require("board")?);
    Ok(())
}

fn property(_: &mut (), block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let (key, value) = key_value(fields)?;
    let row = block
        .last_row_mut("boards")
        .ok_or_else(|| RuleError::OutOfContext(format!("{key} outside a board section")))?;
    row.insert(key, value);
    Ok(())
}

impl Grammar for Startup {
    const NAME: &'static str = "startup";
    type Cursor = ();

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(BOARD_PATTERN)?,
            rules: RuleSet::new(vec![
                Rule::new("board", BOARD_PATTERN, board)?,
                Rule::new("property", KEY_VALUE_PATTERN, property)?,
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
        block.set("boards", Value::Array(Vec::new()));
        push_board(block, entry.get("board").unwrap_or("MainBoard"));
        Seed::HeaderOnly
    }

    fn ends_block(&self, _: &(), _: &Block, line: &str) -> Option<bool> {
        self.entry.is_match(line).then_some(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ParserRegistry;
    use crate::scanner::scan_lines;

    #[test]
    fn test_board_sections() {
        let mut registry = ParserRegistry::builtin();
        let docs = scan_lines(
            &mut registry,
            [
                "<R1>display startup",
                "MainBoard:",
                "  Configured startup system software:        flash:/V200R010.cc",
                "  Startup system software:                   flash:/V200R010.cc",
                "  Next startup saved-configuration file:     flash:/vrpcfg.zip",
                "  Startup paf file:                          default",
                "SlaveBoard:",
                "  Startup system software:                   flash:/V200R009.cc",
                "<R1>",
            ],
        );
        assert_eq!(docs.len(), 1);
        let doc = &docs[0];
        assert!(doc.is_clean(), "{:?}", doc.warnings);

        let boards = doc.rows("boards");
        assert_eq!(boards.len(), 2);
        assert_eq!(boards[0]["board"], "MainBoard");
        assert_eq!(boards[0]["configured_startup_system_software"], "flash:/V200R010.cc");
        assert_eq!(boards[0]["next_startup_saved_configuration_file"], "flash:/vrpcfg.zip");
        assert_eq!(boards[1]["board"], "SlaveBoard");
        assert_eq!(boards[1]["startup_system_software"], "flash:/V200R009.cc");
    }
}
