use assert_cmd::Command;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const BOT_CONTENT: &str = "entity:\n\tdisplayName: Order Helper\n\tschemaName: cr_orders\ncomponents:\n  - kind: DialogComponent\n    schemaName: cr_orders.topic.Lookup\n    displayName: Order Lookup\n    description: @mention the bot\n";

fn dialog_json() -> Value {
    json!({"activities": [
        {"type": "message", "from": {"role": "user"}, "text": "where is my order",
         "timestamp": "2024-05-01T10:00:00.000Z",
         "channelData": {"webchat:internal:position": 1}},
        {"type": "event", "valueType": "DynamicPlanStepTriggered",
         "timestamp": "2024-05-01T10:00:00.100Z",
         "value": {"taskDialogId": "cr_orders.topic.Lookup", "stepId": "s1", "type": "CustomTopic"},
         "channelData": {"webchat:internal:position": 2}},
        {"type": "event", "valueType": "DynamicPlanStepFinished",
         "timestamp": "2024-05-01T10:00:00.486Z",
         "value": {"taskDialogId": "cr_orders.topic.Lookup", "stepId": "s1", "state": "failed",
                   "error": {"message": "HTTP 500"}},
         "channelData": {"webchat:internal:position": 3}},
        {"type": "message", "from": {"role": "bot", "name": "Order Helper"}, "text": "sorry",
         "timestamp": "2024-05-01T10:00:01.000Z",
         "channelData": {"webchat:internal:position": 4}}
    ]})
}

fn transcript_json() -> Value {
    json!({"activities": [
        {"type": "message", "from": {"role": 1}, "text": "hi",
         "channelData": {"webchat:internal:position": 1000}},
        {"type": "message", "from": {"role": 0}, "text": "hello",
         "channelData": {"webchat:internal:position": 9000}}
    ]})
}

fn write_bot_folder(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("botContent.yml"), BOT_CONTENT).unwrap();
    fs::write(dir.join("dialog.json"), dialog_json().to_string()).unwrap();
}

fn dialoglens_with_config(workdir: &TempDir, config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("dialoglens").unwrap();
    cmd.current_dir(workdir.path())
        .env_remove("RUST_LOG")
        .env_remove("DIALOGLENS_POSITION_INCREMENT_MS")
        .env_remove("DIALOGLENS_SUMMARY_MAX_CHARS")
        .arg("--config")
        .arg(config);
    cmd
}

fn dialoglens(workdir: &TempDir) -> Command {
    dialoglens_with_config(workdir, &workdir.path().join("missing.yaml"))
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn transcript_command_emits_json_report() {
    let work = TempDir::new().unwrap();
    let file = work.path().join("session.json");
    fs::write(&file, transcript_json().to_string()).unwrap();

    let output = dialoglens(&work)
        .args(["--output", "json", "transcript"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report = stdout_json(&output);
    assert_eq!(report["timeline"]["total_elapsed_ms"], 8000);
    assert_eq!(report["timeline"]["clock"], "synthetic");
    assert_eq!(report["diagram"]["entries"][0]["from"]["lane"], "user");
    assert_eq!(report["diagram"]["entries"][0]["to"]["lane"], "bot");
}

#[test]
fn analyse_resolves_topics_and_collects_errors() {
    let work = TempDir::new().unwrap();
    let folder = work.path().join("orders");
    write_bot_folder(&folder);

    let output = dialoglens(&work)
        .args(["--output", "json", "analyse"])
        .arg(&folder)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report = stdout_json(&output);
    let steps = report["timeline"]["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0]["name"], "Order Lookup");
    assert_eq!(steps[0]["duration_ms"], 386);
    assert_eq!(steps[0]["status"], "failed");
    assert_eq!(report["timeline"]["errors"][0], "Order Lookup: HTTP 500");
    assert_eq!(report["timeline"]["total_elapsed_ms"], 1000);
}

#[test]
fn human_output_summarises_phases() {
    let work = TempDir::new().unwrap();
    let folder = work.path().join("orders");
    write_bot_folder(&folder);

    let output = dialoglens(&work).arg("analyse").arg(&folder).output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("Timeline: Order Helper"));
    assert!(text.contains("Phases:"));
    assert!(text.contains("Order Lookup: HTTP 500"));
}

#[test]
fn analyse_all_continues_past_a_broken_folder() {
    let work = TempDir::new().unwrap();
    let root = work.path().join("exports");
    write_bot_folder(&root.join("good"));
    let broken = root.join("broken");
    fs::create_dir_all(&broken).unwrap();
    fs::write(broken.join("botContent.yml"), "components: []\n").unwrap();
    fs::write(broken.join("dialog.json"), "\"not a log\"").unwrap();
    fs::create_dir_all(root.join("Transcripts")).unwrap();
    fs::write(
        root.join("Transcripts").join("t1.json"),
        transcript_json().to_string(),
    )
    .unwrap();

    let output = dialoglens(&work)
        .args(["analyse", "--all"])
        .arg(&root)
        .arg("--export")
        .arg(work.path().join("jsonl"))
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let written: Value =
        serde_json::from_str(&fs::read_to_string(root.join("good").join("timeline.json")).unwrap())
            .unwrap();
    assert_eq!(written["timeline"]["steps"][0]["name"], "Order Lookup");
    assert!(!broken.join("timeline.json").exists());
    assert!(root.join("Transcripts").join("t1.timeline.json").exists());

    let jsonl = fs::read_to_string(work.path().join("jsonl").join("good.jsonl")).unwrap();
    let first: Value = serde_json::from_str(jsonl.lines().next().unwrap()).unwrap();
    assert_eq!(first["type"], "header");
    assert!(work.path().join("jsonl").join("t1.jsonl").exists());
}

#[test]
fn non_sequence_transcript_fails() {
    let work = TempDir::new().unwrap();
    let file = work.path().join("bad.json");
    fs::write(&file, "42").unwrap();
    dialoglens(&work).arg("transcript").arg(&file).assert().failure();
}

#[test]
fn config_file_tunes_the_synthetic_axis() {
    let work = TempDir::new().unwrap();
    let config = work.path().join("dialoglens.yaml");
    fs::write(&config, "timeline:\n  position_increment_ms: 250\n").unwrap();
    let file = work.path().join("session.json");
    fs::write(&file, transcript_json().to_string()).unwrap();

    let output = dialoglens_with_config(&work, &config)
        .args(["--output", "json", "transcript"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_json(&output)["timeline"]["total_elapsed_ms"], 2000);
}

#[test]
fn transcript_export_writes_jsonl() {
    let work = TempDir::new().unwrap();
    let file = work.path().join("session.json");
    fs::write(&file, transcript_json().to_string()).unwrap();
    let export = work.path().join("out").join("session.jsonl");

    dialoglens(&work)
        .arg("transcript")
        .arg(&file)
        .arg("--export")
        .arg(&export)
        .assert()
        .success();

    let lines: Vec<Value> = fs::read_to_string(&export)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.first().unwrap()["type"], "header");
    assert_eq!(lines.last().unwrap()["type"], "footer");
    assert_eq!(lines.last().unwrap()["total_events"], 2);
}

#[test]
fn batch_export_failure_keeps_the_written_report() {
    let work = TempDir::new().unwrap();
    let root = work.path().join("exports");
    write_bot_folder(&root.join("good"));
    let blocker = work.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();

    let output = dialoglens(&work)
        .args(["analyse", "--all"])
        .arg(&root)
        .arg("--export")
        .arg(&blocker)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report_path = root.join("good").join("timeline.json");
    assert!(report_path.exists());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("timeline.json"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to export"));
}
