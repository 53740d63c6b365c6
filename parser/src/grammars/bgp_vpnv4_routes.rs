//! `display bgp vpnv4 all routing-table`.
//!
//! Routes are grouped under the most recent `Route Distinguisher:` or
//! `VPN-Instance <name>, Router ID <id>:` line. Secondary paths attach to
//! the last primary route of the current group; a secondary path with no
//! primary in that group is dropped with a warning.

use regex::Regex;
use serde_json::Value;

use netlog_core::{Document, Row, ValidationRule};

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::grammars::bgp_route::{self, HEADER_PATTERN, PRIMARY_PATTERN, SECONDARY_PATTERN};
use crate::grammars::common::ColumnLayout;
use crate::rule::{Fields, Rule, RuleSet};

pub struct BgpVpnv4Routes {
    entry: Regex,
    rules: RuleSet<Vpnv4Cursor>,
}

/// Group that route rows currently land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    RouteDistinguisher(usize),
    VpnInstance(usize),
}

impl Context {
    fn key(self) -> &'static str {
        match self {
            Self::RouteDistinguisher(_) => "route_distinguishers",
            Self::VpnInstance(_) => "vpn_instances",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::RouteDistinguisher(index) | Self::VpnInstance(index) => index,
        }
    }
}

#[derive(Debug)]
pub struct Vpnv4Cursor {
    layout: ColumnLayout,
    context: Option<Context>,
    last_primary: Option<usize>,
}

impl Default for Vpnv4Cursor {
    fn default() -> Self {
        Self {
            layout: bgp_route::standard_layout(),
            context: None,
            last_primary: None,
        }
    }
}

/// Returns the route list of the current group.
fn context_routes<'a>(block: &'a mut Block, context: Option<Context>) -> Option<&'a mut Vec<Value>> {
    let context = context?;
    block
        .row_mut(context.key(), context.index())?
        .get_mut("routes")
        .and_then(Value::as_array_mut)
}

fn open_group(block: &mut Block, key: &str, mut row: Row) -> usize {
    row.insert("routes".to_string(), Value::Array(Vec::new()));
    block.push_row(key, row);
    block.row_count(key) - 1
}

fn route_distinguisher(cursor: &mut Vpnv4Cursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let row = fields.row_of(&["rd"]);
    let index = open_group(block, "route_distinguishers", row);
    cursor.context = Some(Context::RouteDistinguisher(index));
    cursor.last_primary = None;
    Ok(())
}

fn vpn_instance(cursor: &mut Vpnv4Cursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let mut row = fields.row_of(&["name", "router_id"]);
    row.insert("total_routes".to_string(), Value::Null);
    let index = open_group(block, "vpn_instances", row);
    cursor.context = Some(Context::VpnInstance(index));
    cursor.last_primary = None;
    Ok(())
}

fn instance_total(cursor: &mut Vpnv4Cursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let total = fields.int("total_routes")?;
    let Some(Context::VpnInstance(index)) = cursor.context else {
        return Err(RuleError::OutOfContext("route total outside a VPN instance".to_string()));
    };
    if let Some(row) = block.row_mut("vpn_instances", index) {
        row.insert("total_routes".to_string(), total.into());
    }
    Ok(())
}

fn primary(cursor: &mut Vpnv4Cursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let mut route = bgp_route::route(fields, &cursor.layout);
    route.insert("paths".to_string(), Value::Array(Vec::new()));
    let routes = context_routes(block, cursor.context)
        .ok_or_else(|| RuleError::OutOfContext("route before any route distinguisher".to_string()))?;
    routes.push(Value::Object(route));
    cursor.last_primary = Some(routes.len() - 1);
    Ok(())
}

fn secondary(cursor: &mut Vpnv4Cursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let path = bgp_route::route(fields, &cursor.layout);
    let paths = match cursor.last_primary {
        Some(index) => context_routes(block, cursor.context)
            .and_then(|routes| routes.get_mut(index))
            .and_then(|route| route.get_mut("paths"))
            .and_then(Value::as_array_mut),
        None => None,
    };
    match paths {
        Some(paths) => paths.push(Value::Object(path)),
        None => block.warn_orphan(fields.line(), "secondary path without a primary route"),
    }
    Ok(())
}

fn header(cursor: &mut Vpnv4Cursor, _: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    cursor.layout = bgp_route::layout(fields.line());
    Ok(())
}

fn total_matches(doc: &Document) -> Result<(), String> {
    let Some(declared) = doc.get_i64("total_routes") else {
        return Ok(());
    };
    let parsed: usize = doc
        .rows("route_distinguishers")
        .iter()
        .filter_map(|rd| rd.get("routes").and_then(Value::as_array))
        .map(|routes| bgp_route::count_paths(routes))
        .sum();
    if declared == parsed as i64 {
        Ok(())
    } else {
        Err(format!("total_routes declares {declared} but {parsed} paths were parsed"))
    }
}

static VALIDATIONS: &[ValidationRule] = &[ValidationRule::warning("route_total_matches", total_matches)];

fn primary_rule() -> Result<Rule<Vpnv4Cursor>, regex::Error> {
    Rule::new("primary", PRIMARY_PATTERN, primary)
}

fn secondary_rule() -> Result<Rule<Vpnv4Cursor>, regex::Error> {
    Rule::new("secondary", SECONDARY_PATTERN, secondary)
}

impl Grammar for BgpVpnv4Routes {
    const NAME: &'static str = "bgp_vpnv4_routes";
    const PRIORITY: i32 = 40;
    type Cursor = Vpnv4Cursor;

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*Total number of routes from all PE:\s*(?P<total_routes>\d+)\s*$")?,
            rules: RuleSet::new(vec![
                primary_rule()?,
                secondary_rule()?,
                Rule::new("route_distinguisher", r"^\s*Route Distinguisher:\s*(?P<rd>\S+)\s*$", route_distinguisher)?,
                Rule::new(
                    "vpn_instance",
                    r"^\s*VPN-Instance\s+(?P<name>[^,\s]+),\s*Router ID\s+(?P<router_id>[^:\s]+):?\s*$",
                    vpn_instance,
                )?,
                Rule::new("instance_total", r"^\s*Total Number of Routes:\s*(?P<total_routes>\S+)\s*$", instance_total)?,
                Rule::new("header", HEADER_PATTERN, header)?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        EntryMatch::capture(&self.entry, line)
    }

    fn rules(&self) -> &RuleSet<Vpnv4Cursor> {
        &self.rules
    }

    fn start(&self, _: &mut Vpnv4Cursor, block: &mut Block, entry: &EntryMatch) -> Seed {
        block.set_text("total_routes", entry.get("total_routes").unwrap_or_default());
        block.set("route_distinguishers", Value::Array(Vec::new()));
        block.set("vpn_instances", Value::Array(Vec::new()));
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
    use crate::rule::RuleOutcome;
    use netlog_core::DiagnosticKind;

    const ENTRY: &str = " Total number of routes from all PE: 3";

    fn parse(lines: &[&str]) -> Document {
        let mut parser = GrammarParser::<BgpVpnv4Routes>::standalone().unwrap();
        let entry = parser.is_entry_point(ENTRY).unwrap();
        parser.start_block(ENTRY, &entry);
        for line in lines {
            parser.parse_line(line);
        }
        parser.get_result().unwrap()
    }

    #[test]
    fn test_routes_grouped_by_context() {
        let doc = parse(&[
            " Route Distinguisher: 100:1",
            "",
            "        Network            NextHop        MED        LocPrf    PrefVal Path/Ogn",
            "",
            " *>i    10.1.1.0/24        2.2.2.2         0          100        0       ?",
            " * i                       3.3.3.3         0          100        0       ?",
            "",
            " Route Distinguisher: 200:1",
            "",
            " *>i    10.2.2.0/24        2.2.2.2         0          100        0       ?",
            "",
            " VPN-Instance vpna, Router ID 1.1.1.1:",
            "",
            " Total Number of Routes: 2",
            " *>i    10.1.1.0/24        2.2.2.2         0          100        0       ?",
            " * i                       3.3.3.3         0          100        0       ?",
        ]);
        assert!(doc.is_clean(), "{:?} {:?}", doc.warnings, doc.errors);

        let rds = doc.rows("route_distinguishers");
        assert_eq!(rds.len(), 2);
        assert_eq!(rds[0]["rd"], "100:1");
        assert_eq!(rds[0]["routes"][0]["paths"][0]["next_hop"], "3.3.3.3");
        assert_eq!(rds[1]["routes"].as_array().unwrap().len(), 1);

        let instances = doc.rows("vpn_instances");
        assert_eq!(instances[0]["name"], "vpna");
        assert_eq!(instances[0]["router_id"], "1.1.1.1");
        assert_eq!(instances[0]["total_routes"], 2);
        assert_eq!(instances[0]["routes"][0]["paths"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_orphan_secondary_is_dropped_with_warning() {
        let doc = parse(&[
            " Route Distinguisher: 100:1",
            " * i                       3.3.3.3         0          100        0       ?",
        ]);
        assert!(doc.rows("route_distinguishers")[0]["routes"].as_array().unwrap().is_empty());
        assert_eq!(doc.warnings[0].kind, DiagnosticKind::OrphanContinuation);
    }

    #[test]
    fn test_route_outside_context_is_an_error() {
        let doc = parse(&[" *>i    10.1.1.0/24        2.2.2.2         0          100        0       ?"]);
        assert_eq!(doc.errors.len(), 1);
        assert_eq!(doc.errors[0].rule.as_deref(), Some("primary"));
    }

    #[test]
    fn test_rule_order_decides_primary_rows() {
        let line = " *>i    10.1.1.0/24        2.2.2.2         0          100        0       ?";
        let mut block = Block::new(BgpVpnv4Routes::NAME, ENTRY, 80);
        let mut cursor = Vpnv4Cursor::default();
        let context = Rule::new("route_distinguisher", r"^\s*Route Distinguisher:\s*(?P<rd>\S+)", route_distinguisher);
        RuleSet::new(vec![context.unwrap()]).apply(&mut cursor, &mut block, " Route Distinguisher: 100:1");

        let reversed = RuleSet::new(vec![secondary_rule().unwrap(), primary_rule().unwrap()]);
        assert_eq!(
            reversed.apply(&mut cursor, &mut block, line),
            RuleOutcome::Matched("secondary")
        );
        let ordered = RuleSet::new(vec![primary_rule().unwrap(), secondary_rule().unwrap()]);
        assert_eq!(ordered.apply(&mut cursor, &mut block, line), RuleOutcome::Matched("primary"));
    }
}
