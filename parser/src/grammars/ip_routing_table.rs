//! `display ip routing-table`.
//!
//! Equal-cost paths print the destination once; the remaining next hops
//! follow on indented lines with the destination column blank and are
//! collected into the route's `next_hops`.

use regex::Regex;
use serde_json::Value;

use netlog_core::{Document, Row, ValidationRule, check_declared_count};

use crate::block::{Block, EntryMatch};
use crate::error::RuleError;
use crate::grammar::{Grammar, Seed};
use crate::rule::{Fields, Rule, RuleSet};

const HOP_COLUMNS: &[&str] = &["proto", "preference", "cost", "flags", "next_hop", "interface"];

pub struct IpRoutingTable {
    entry: Regex,
    rules: RuleSet<RoutingCursor>,
}

#[derive(Debug, Default)]
pub struct RoutingCursor {
    last_route: Option<usize>,
}

fn table(cursor: &mut RoutingCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("table", fields.value("table"));
    cursor.last_route = None;
    Ok(())
}

fn summary(_: &mut RoutingCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    block.set("destinations", fields.int("destinations")?);
    block.set("total_routes", fields.int("routes")?);
    Ok(())
}

fn route(cursor: &mut RoutingCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let mut row = fields.row_of(&["destination", "mask_length"]);
    row.extend(fields.row_of(HOP_COLUMNS));
    row.insert("next_hops".to_string(), Value::Array(Vec::new()));
    block.push_row("routes", row);
    cursor.last_route = Some(block.row_count("routes") - 1);
    Ok(())
}

fn next_hop(cursor: &mut RoutingCursor, block: &mut Block, fields: &Fields<'_>) -> Result<(), RuleError> {
    let hop = fields.row_of(HOP_COLUMNS);
    let hops = block
        .record_mut("routes", cursor.last_route)
        .and_then(|row| row.get_mut("next_hops"))
        .and_then(Value::as_array_mut);
    match hops {
        Some(hops) => hops.push(Value::Object(hop)),
        None => {
            tracing::debug!(line = fields.line(), "next hop without a destination kept as route");
            let mut row = Row::new();
            row.insert("destination".to_string(), Value::Null);
            row.insert("mask_length".to_string(), Value::Null);
            row.extend(hop);
            row.insert("next_hops".to_string(), Value::Array(Vec::new()));
            block.push_row("routes", row);
        }
    }
    Ok(())
}

fn header(_: &mut RoutingCursor, _: &mut Block, _: &Fields<'_>) -> Result<(), RuleError> {
    Ok(())
}

fn destinations_match(doc: &Document) -> Result<(), String> {
    let promoted = doc
        .rows("routes")
        .iter()
        .filter(|route| route.get("destination").is_some_and(Value::is_null))
        .count();
    if promoted > 0 {
        return Ok(());
    }
    check_declared_count(doc, "destinations", "routes")
}

fn routes_match(doc: &Document) -> Result<(), String> {
    let Some(declared) = doc.get_i64("total_routes") else {
        return Ok(());
    };
    let routes = doc.rows("routes");
    let hops: usize = routes
        .iter()
        .filter_map(|route| route.get("next_hops").and_then(Value::as_array))
        .map(Vec::len)
        .sum();
    let found = (routes.len() + hops) as i64;
    if found == declared {
        Ok(())
    } else {
        Err(format!("table declares {declared} routes but {found} paths were parsed"))
    }
}

static VALIDATIONS: &[ValidationRule] = &[
    ValidationRule::warning("destination_count_matches", destinations_match),
    ValidationRule::warning("route_count_matches", routes_match),
];

impl Grammar for IpRoutingTable {
    const NAME: &'static str = "ip_routing_table";
    type Cursor = RoutingCursor;

    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"^\s*Route Flags:\s*R - relay,\s*D - download to fib")?,
            rules: RuleSet::new(vec![
                Rule::new(
                    "route",
                    r"^\s*(?P<destination>\d{1,3}(?:\.\d{1,3}){3})/(?P<mask_length>\d+)\s+(?P<proto>[A-Za-z][\w-]*)\s+(?P<preference>\d+)\s+(?P<cost>\d+)\s+(?:(?P<flags>[A-Z]+)\s+)?(?P<next_hop>\d{1,3}(?:\.\d{1,3}){3})\s+(?P<interface>\S+)\s*$",
                    route,
                )?,
                Rule::new(
                    "next_hop",
                    r"^\s+(?P<proto>[A-Za-z][\w-]*)\s+(?P<preference>\d+)\s+(?P<cost>\d+)\s+(?:(?P<flags>[A-Z]+)\s+)?(?P<next_hop>\d{1,3}(?:\.\d{1,3}){3})\s+(?P<interface>\S+)\s*$",
                    next_hop,
                )?,
                Rule::new("table", r"^\s*Routing Tables?\s*:\s*(?P<table>\S+)\s*$", table)?,
                Rule::new(
                    "summary",
                    r"^\s*Destinations\s*:\s*(?P<destinations>\d+)\s+Routes\s*:\s*(?P<routes>\d+)\s*$",
                    summary,
                )?,
                Rule::new("header", r"^\s*Destination/Mask\s+Proto\b", header)?,
            ]),
        })
    }

    fn entry_point(&self, line: &str) -> Option<EntryMatch> {
        self.entry.is_match(line).then(EntryMatch::bare)
    }

    fn rules(&self) -> &RuleSet<RoutingCursor> {
        &self.rules
    }

    fn start(&self, _: &mut RoutingCursor, block: &mut Block, _: &EntryMatch) -> Seed {
        block.set("routes", Value::Array(Vec::new()));
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

    const ENTRY: &str = "Route Flags: R - relay, D - download to fib";

    fn parse(lines: &[&str]) -> Document {
        let mut parser = GrammarParser::<IpRoutingTable>::standalone().unwrap();
        let entry = parser.is_entry_point(ENTRY).unwrap();
        parser.start_block(ENTRY, &entry);
        for line in lines {
            parser.parse_line(line);
        }
        parser.get_result().unwrap()
    }

    #[test]
    fn test_equal_cost_hops_attach_to_route() {
        let doc = parse(&[
            "------------------------------------------------------------------------------",
            "Routing Tables: Public",
            "         Destinations : 3        Routes : 4",
            "",
            "Destination/Mask    Proto   Pre  Cost      Flags NextHop         Interface",
            "",
            "        0.0.0.0/0   Static  60   0          RD   10.1.1.1        GigabitEthernet0/0/1",
            "       10.1.1.0/24  Direct  0    0           D   10.1.1.2        GigabitEthernet0/0/1",
            "      10.2.0.0/16   OSPF    10   2           D   10.1.1.1        GigabitEthernet0/0/1",
            "                    OSPF    10   2           D   10.1.2.1        GigabitEthernet0/0/2",
        ]);
        assert!(doc.is_clean(), "{:?}", doc.warnings);
        assert_eq!(doc.get_str("table"), Some("Public"));

        let routes = doc.rows("routes");
        assert_eq!(routes.len(), 3);
        assert_eq!(routes[0]["flags"], "RD");
        assert_eq!(routes[0]["preference"], 60);
        assert_eq!(routes[2]["mask_length"], 16);
        let hops = routes[2]["next_hops"].as_array().unwrap();
        assert_eq!(hops.len(), 1);
        assert_eq!(hops[0]["next_hop"], "10.1.2.1");
        assert_eq!(hops[0]["interface"], "GigabitEthernet0/0/2");
    }

    #[test]
    fn test_route_without_flags() {
        let doc = parse(&["      127.0.0.0/8   Direct  0    0        127.0.0.1       InLoopBack0"]);
        let route = &doc.rows("routes")[0];
        assert_eq!(route["flags"], Value::Null);
        assert_eq!(route["interface"], "InLoopBack0");
    }

    #[test]
    fn test_orphan_hop_is_promoted() {
        let doc = parse(&["                    OSPF    10   2           D   10.1.2.1        GigabitEthernet0/0/2"]);
        let routes = doc.rows("routes");
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0]["destination"], Value::Null);
        assert_eq!(routes[0]["next_hop"], "10.1.2.1");
    }

    #[test]
    fn test_route_count_mismatch_is_flagged() {
        let doc = parse(&[
            "         Destinations : 1        Routes : 2",
            "        0.0.0.0/0   Static  60   0          RD   10.1.1.1        GigabitEthernet0/0/1",
        ]);
        assert_eq!(doc.warnings.len(), 1);
        assert_eq!(doc.warnings[0].kind, DiagnosticKind::ValidationFailed);
        assert_eq!(doc.warnings[0].rule.as_deref(), Some("route_count_matches"));
    }
}
