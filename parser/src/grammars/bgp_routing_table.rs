//! `display bgp routing-table`.
//!
//! Secondary paths attach to the last primary route as `paths`. A secondary
//! row with no primary before it is kept as a top-level route with a `null`
//! network.

use regex::Regex;
use serde_json::Value;

use netlog_core::{Document, ValidationRule};

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::grammars::bgp_route::{self, HEADER_PATTERN, PRIMARY_PATTERN, SECONDARY_PATTERN};
use crate::grammars::common::ColumnLayout;
use crate::rule::{Fields, Rule, RuleSet};

pub struct BgpRoutingTable {
    entry: Regex,
    rules: RuleSet<RouteCursor>,
}

#[derive(Debug)]
pub struct RouteCursor {
    layout: ColumnLayout,
    last_primary: Option<usize>,
}

impl Default for RouteCursor {
    fn default() -> Self {
        Self {
            layout: bgp_route::standard_layout(),
            last_primary: None,
        }
    }
}

fn primary(cursor: &mut RouteCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let mut row = bgp_route::route(fields, &cursor.layout);
    row.insert("paths".to_string(), Value::Array(Vec::new()));
    block.push_row("routes", row);
    cursor.last_primary = Some(block.row_count("routes") - 1);
    Ok(())
}

fn secondary(cursor: &mut RouteCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let path = bgp_route::route(fields, &cursor.layout);
    let paths = match cursor.last_primary {
        Some(index) => block
            .row_mut("routes", index)
            .and_then(|row| row.get_mut("paths"))
            .and_then(Value::as_array_mut),
        None => None,
    };
    match paths {
        Some(paths) => paths.push(Value::Object(path)),
        None => {
            tracing::debug!(line = fields.line(), "secondary path without primary kept as route");
            block.push_row("routes", path);
        }
    }
    Ok(())
}

fn header(cursor: &mut RouteCursor, _: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    cursor.layout = bgp_route::layout(fields.line());
    Ok(())
}

fn router_id(_: &mut RouteCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("router_id", fields.value("router_id"));
    Ok(())
}

fn total_matches(doc: &Document) -> Result<(), String> {
    bgp_route::check_route_total(doc, "routes")
}

static VALIDATIONS: &[ValidationRule] = &[ValidationRule::warning("route_total_matches", total_matches)];

fn primary_rule() -> Result<Rule<RouteCursor>, regex::Error> {
    Rule::new("primary", PRIMARY_PATTERN, primary)
}

fn secondary_rule() -> Result<Rule<RouteCursor>, regex::Error> {
    Rule::new("secondary", SECONDARY_PATTERN, secondary)
}

impl Grammar for BgpRoutingTable {
    const NAME: &'static str = "bgp_routing_table";
    const PRIORITY: i32 = 40;
    type Cursor = RouteCursor;

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*Total Number of Routes:\s*(?P<total_routes>\d+)\s*$")?,
            rules: RuleSet::new(vec![
                primary_rule()?,
                secondary_rule()?,
                Rule::new("header", HEADER_PATTERN, header)?,
                Rule::new("router_id", r"^\s*BGP Local router ID is\s+(?P<router_id>\S+)\s*$", router_id)?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        EntryMatch::capture(&self.entry, line)
    }

    fn rules(&self) -> &RuleSet<RouteCursor> {
        &self.rules
    }

    fn start(&self, _: &mut RouteCursor, block: &mut Block, entry: &EntryMatch) -> Seed {
        block.set_text("total_routes", entry.get("total_routes").unwrap_or_default());
        block.set("routes", Value::Array(Vec::new()));
        Seed::HeaderOnly
    }

    fn validations(&self) -> &'static [ValidationRule] {
        VALIDATIONS
    }
}
