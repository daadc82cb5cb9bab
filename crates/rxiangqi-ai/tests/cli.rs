//! Smoke tests for the rxiangqi binary

use std::process::Command;

fn rxiangqi() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_rxiangqi"));
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn bestmove_json_on_start_position() {
    let output = rxiangqi()
        .args(["bestmove", "--json", "--difficulty", "1"])
        .output()
        .expect("run rxiangqi");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(report["side"], "red");
    assert_eq!(report["source"], "book");
    assert_eq!(report["token"].as_str().unwrap().len(), 4);
    assert!(report["rationale"].as_str().unwrap().starts_with("Red "));
}

#[test]
fn selfplay_prints_every_ply() {
    let output = rxiangqi()
        .args(["selfplay", "--plies", "4", "--seed", "1", "--difficulty", "1"])
        .output()
        .expect("run rxiangqi");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[4].ends_with(" w - - 0 1"));
}

#[test]
fn missing_engine_degrades_to_local_search() {
    let output = rxiangqi()
        .args(["bestmove", "--difficulty", "1", "--engine", "/nonexistent/pikafish"])
        .output()
        .expect("run rxiangqi");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("bestmove "));
}

#[test]
fn bad_position_fails() {
    let output = rxiangqi()
        .args(["bestmove", "--fen", "not a position"])
        .output()
        .expect("run rxiangqi");
    assert!(!output.status.success());
}
