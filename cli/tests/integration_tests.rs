use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

const ARP_LOG: &str = "\
<R1>display arp
IP ADDRESS      MAC ADDRESS     EXPIRE(M) TYPE        INTERFACE   VPN-INSTANCE
------------------------------------------------------------------------------
10.0.0.1        00e0-fc12-3456  20        D-0         GE0/0/1
10.0.0.2        00e0-fc12-3457  15        D-0         GE0/0/2
------------------------------------------------------------------------------
Total:2         Dynamic:2       Static:0     Interface:0
<R1>display esn
ESN of slot 0: 2102351931P0C3000154
<R1>
";

const CLOCK_LOG: &str = "\
<R2>display clock
2024-01-15 10:30:00+08:00
Monday
Time Zone(Beijing) : UTC+08:00
<R2>
";

fn netlog() -> Command {
    Command::new(env!("CARGO_BIN_EXE_netlog"))
}

fn write_log(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).expect("failed to write log");
    path
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "netlog failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn parse_prints_bundle_in_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let arp = write_log(dir.path(), "r1.log", ARP_LOG);
    let clock = write_log(dir.path(), "r2.log", CLOCK_LOG);

    let output = netlog()
        .args(["parse", "--jobs", "2"])
        .arg(&arp)
        .arg(&clock)
        .output()
        .expect("failed to run netlog");
    let json = stdout_json(&output);

    let captures = json["captures"].as_array().unwrap();
    assert_eq!(captures.len(), 2);
    assert!(captures[0]["source"].as_str().unwrap().ends_with("r1.log"));
    assert_eq!(captures[0]["documents"][0]["type"], "arp");
    assert_eq!(captures[0]["documents"][1]["type"], "esn");
    assert_eq!(captures[1]["documents"][0]["type"], "clock");
    assert!(json["contract_version"].is_string());
}

#[test]
fn parse_with_report_adds_reports() {
    let dir = tempfile::tempdir().unwrap();
    let arp = write_log(dir.path(), "r1.log", ARP_LOG);

    let output = netlog()
        .args(["parse", "--with-report"])
        .arg(&arp)
        .output()
        .expect("failed to run netlog");
    let json = stdout_json(&output);

    let report = &json["reports"][0];
    assert_eq!(report["status"], "clean");
    assert_eq!(report["documents"]["arp"], 1);
    assert_eq!(report["blocks"], 2);
    assert_eq!(report["block_metrics"].as_array().unwrap().len(), 2);
    assert_eq!(json["bundle"]["captures"][0]["documents"][0]["total"], 2);
}

#[test]
fn parse_reports_missing_input_and_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let arp = write_log(dir.path(), "r1.log", ARP_LOG);

    let output = netlog()
        .arg("parse")
        .arg(&arp)
        .arg(dir.path().join("absent.log"))
        .output()
        .expect("failed to run netlog");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("absent.log"), "{stderr}");
    assert!(stderr.contains("error: 1 of 2 inputs failed"), "{stderr}");

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["captures"].as_array().unwrap().len(), 1);
}

#[test]
fn parse_disable_leaves_parser_out() {
    let dir = tempfile::tempdir().unwrap();
    let arp = write_log(dir.path(), "r1.log", ARP_LOG);

    let output = netlog()
        .args(["parse", "--disable", "esn"])
        .arg(&arp)
        .output()
        .expect("failed to run netlog");
    let json = stdout_json(&output);
    assert_eq!(json["captures"][0]["documents"].as_array().unwrap().len(), 1);
}

#[test]
fn parse_stdin_prints_documents() {
    let mut child = netlog()
        .arg("parse-stdin")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run netlog");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(CLOCK_LOG.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    let json = stdout_json(&output);

    assert_eq!(json[0]["type"], "clock");
    assert_eq!(json[0]["hostname"], "R2");
    assert_eq!(json[0]["weekday"], "Monday");
}

#[test]
fn parse_stdin_table_format() {
    let mut child = netlog()
        .args(["parse-stdin", "--format", "table"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to run netlog");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(ARP_LOG.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(lines[0].starts_with("TYPE"));
    assert!(lines[1].starts_with("arp"));
    assert!(lines[2].starts_with("esn"));
}

#[test]
fn rank_lists_matching_parsers() {
    let dir = tempfile::tempdir().unwrap();
    let arp = write_log(dir.path(), "r1.log", ARP_LOG);

    let output = netlog()
        .args(["rank", "--format", "json", "--sample", "4"])
        .arg(&arp)
        .output()
        .expect("failed to run netlog");
    let json = stdout_json(&output);

    let candidates = json.as_array().unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0]["name"], "arp");
    assert_eq!(candidates[0]["sampled"], 4);
}

#[test]
fn parsers_reports_registry_stats() {
    let output = netlog()
        .args(["parsers", "--format", "json", "--disable", "clock,users"])
        .output()
        .expect("failed to run netlog");
    let json = stdout_json(&output);

    assert_eq!(json["loaded"], 34);
    assert_eq!(json["disabled"], serde_json::json!(["clock", "users"]));
    assert!(json["failed"].as_array().unwrap().is_empty());
}

#[test]
fn config_file_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("netlog.yml");
    fs::write(&config, "disabled_parsers: [arp]\n").unwrap();

    let output = netlog()
        .args(["parsers", "--format", "json", "--config"])
        .arg(&config)
        .output()
        .expect("failed to run netlog");
    let json = stdout_json(&output);
    assert_eq!(json["loaded"], 35);
}

#[test]
fn invalid_config_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("netlog.yml");
    fs::write(&config, "jobs: 0\n").unwrap();

    let output = netlog()
        .args(["parsers", "--config"])
        .arg(&config)
        .output()
        .expect("failed to run netlog");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: Failed to load config"), "{stderr}");
}
