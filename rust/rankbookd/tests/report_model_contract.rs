use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rankbookd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rankbookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false), "{}", value);
    value.get("error").cloned().unwrap_or_else(|| json!({}))
}

#[test]
fn model_carries_rows_bands_summary_and_rosters() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "report.model",
        json!({
            "files": [
                { "name": "t1", "csv": "Name,Score,Max Marks\nAsha,45,50\nRavi,30,50\nMeena,10,50\n" }
            ],
            "title": "TERM 1 RESULTS",
            "fileName": "term1"
        }),
    );

    assert_eq!(res["title"], json!("TERM 1 RESULTS"));
    assert_eq!(res["fileName"], json!("term1.pdf"));
    assert_eq!(res["totalMarks"], json!(50));

    let bands: Vec<&str> = res["rows"]
        .as_array()
        .expect("rows")
        .iter()
        .filter_map(|r| r["band"].as_str())
        .collect();
    assert_eq!(bands, vec!["green", "yellow", "red"]);

    let summary = &res["summary"];
    assert_eq!(summary["candidates"], json!(3));
    assert_eq!(summary["passCount"], json!(2));
    assert_eq!(summary["highestObtained"].as_f64(), Some(45.0));
    assert_eq!(summary["lowestObtained"].as_f64(), Some(10.0));
    assert_eq!(summary["averageObtained"].as_f64(), Some(28.33));
    assert_eq!(summary["topRankers"].as_array().map(|v| v.len()), Some(3));
    assert_eq!(summary["needsImprovement"][0]["name"], json!("Meena"));

    assert_eq!(res["rosters"].as_array().map(|v| v.len()), Some(7));
    assert_eq!(res["settings"]["greenPct"].as_f64(), Some(80.0));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn model_defaults_title_and_file_name() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "report.model",
        json!({ "files": [{ "csv": "Name,Score\nAsha,1\n" }] }),
    );
    let title = res["title"].as_str().expect("title");
    assert!(title.starts_with("MONTHLY RESULT REPORT - "), "{}", title);
    let file_name = res["fileName"].as_str().expect("fileName");
    assert!(file_name.starts_with("Monthly_Report_"), "{}", file_name);
    assert!(file_name.ends_with(".pdf"), "{}", file_name);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn nothing_to_process_when_no_sheet_is_readable() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let e = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "report.model",
        json!({ "files": [] }),
    );
    assert_eq!(e["code"], json!("nothing_to_process"));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "report.consolidate",
        json!({ "files": [{ "name": "empty.csv", "csv": "" }] }),
    );
    assert_eq!(e["code"], json!("nothing_to_process"));
    assert_eq!(e["details"]["errors"][0]["file"], json!("empty.csv"));

    let e = request_err(&mut stdin, &mut reader, "3", "report.awards", json!({}));
    assert_eq!(e["code"], json!("bad_params"));

    drop(stdin);
    let _ = child.wait();
}
