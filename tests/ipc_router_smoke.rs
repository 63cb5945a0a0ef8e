use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_classroomd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn classroomd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

struct Session {
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    next_id: u64,
}

impl Session {
    fn send(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        self.next_id += 1;
        let id = self.next_id.to_string();
        let payload = json!({ "id": id, "method": method, "params": params });
        writeln!(self.stdin, "{}", payload).expect("write request");
        self.stdin.flush().expect("flush request");

        let mut line = String::new();
        self.reader.read_line(&mut line).expect("read response line");
        assert!(!line.trim().is_empty(), "empty response for {}", method);
        let value: serde_json::Value =
            serde_json::from_str(line.trim()).expect("parse response json");
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id.as_str()));
        value
    }

    /// Sends and asserts success, returning `result`.
    fn call(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        let value = self.send(method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(true),
            "{} failed: {}",
            method,
            value
        );
        value.get("result").cloned().unwrap_or(serde_json::Value::Null)
    }
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value.get("error")?.get("code")?.as_str()
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("classroom-router-smoke");
    let out = workspace.join("out");

    let (mut child, stdin, reader) = spawn_sidecar();
    let mut s = Session {
        stdin,
        reader,
        next_id: 0,
    };

    let health = s.call("health", json!({}));
    assert!(health.get("workspacePath").expect("workspacePath").is_null());

    let before = s.send("students.create", json!({ "name": "Ann", "rollNumber": "1" }));
    assert_eq!(error_code(&before), Some("no_workspace"));

    s.call("workspace.select", json!({ "path": workspace.to_string_lossy() }));

    let ann = s.call("students.create", json!({ "name": "Ann", "rollNumber": "1" }));
    let ann_id = ann["student"]["id"].as_str().expect("ann id").to_string();
    let ben = s.call(
        "students.create",
        json!({ "name": "Ben", "rollNumber": "2", "parentPhone": "555-0100", "isFlagged": true }),
    );
    let ben_id = ben["student"]["id"].as_str().expect("ben id").to_string();
    let dup = s.call("students.create", json!({ "name": "Ann", "rollNumber": "1" }));
    assert_eq!(dup["created"], json!(false));

    let found = s.call("students.list", json!({ "query": "0100" }));
    assert_eq!(found["students"].as_array().map(|a| a.len()), Some(1));
    s.call("students.update", json!({ "studentId": ann_id, "parentName": "Mrs A" }));
    let toggled = s.call("students.toggleFlag", json!({ "studentId": ben_id }));
    assert_eq!(toggled["isFlagged"], json!(false));

    s.call(
        "attendance.set",
        json!({ "studentId": ben_id, "date": "2025-03-03", "status": "Sick" }),
    );
    s.call(
        "attendance.reason",
        json!({ "studentId": ben_id, "date": "2025-03-03", "reason": "flu" }),
    );
    let marked = s.call("attendance.markAllPresent", json!({ "date": "2025-03-03" }));
    assert_eq!(marked["marked"], json!(1));
    let day = s.call("attendance.day", json!({ "date": "2025-03-03" }));
    assert_eq!(day["counts"]["sick"], json!(1));
    assert_eq!(day["counts"]["present"], json!(1));
    s.call("notes.set", json!({ "date": "2025-03-03", "note": "assembly" }));
    let note = s.call("notes.get", json!({ "date": "2025-03-03" }));
    assert_eq!(note["note"], json!("assembly"));

    let summary = s.call("reports.monthSummary", json!({ "month": "2025-03" }));
    assert_eq!(summary["rows"].as_array().map(|a| a.len()), Some(2));
    let report = s.call(
        "reports.exportMonth",
        json!({ "month": "2025-03", "outDir": out.to_string_lossy() }),
    );
    assert!(report["path"]
        .as_str()
        .expect("report path")
        .ends_with("Attendance_Report_2025-03.csv"));

    let event = s.call(
        "events.create",
        json!({ "date": "2025-03-10", "title": "Quiz", "type": "test" }),
    );
    let event_id = event["event"]["id"].as_str().expect("event id").to_string();
    assert_eq!(event["event"]["type"], json!("Test"));
    s.call("events.update", json!({ "eventId": event_id, "type": "Exam" }));
    let listed = s.call("events.list", json!({ "month": "2025-03" }));
    assert_eq!(listed["events"][0]["type"], json!("Exam"));
    let schedule_csv = out.join("schedule.csv");
    s.call(
        "schedule.export",
        json!({ "outPath": schedule_csv.to_string_lossy(), "today": "2025-03-01" }),
    );
    let imported = s.call(
        "schedule.import",
        json!({ "inPath": schedule_csv.to_string_lossy(), "today": "2025-03-01" }),
    );
    assert_eq!(imported["imported"], json!(1));
    s.call("events.delete", json!({ "eventId": event_id }));

    let slot = s.call(
        "timetable.create",
        json!({ "dayOfWeek": 1, "startTime": "9:00", "endTime": "09:45", "subject": "Maths" }),
    );
    let slot_id = slot["slot"]["id"].as_str().expect("slot id").to_string();
    assert_eq!(slot["slot"]["startTime"], json!("09:00"));
    s.call("timetable.update", json!({ "slotId": slot_id, "lesson": "Fractions" }));
    let monday = s.call("timetable.list", json!({ "dayOfWeek": 1 }));
    assert_eq!(monday["slots"].as_array().map(|a| a.len()), Some(1));
    s.call(
        "timetable.export",
        json!({ "startMonth": "2025-03", "span": "month", "outDir": out.to_string_lossy() }),
    );

    let seating = s.call("seating.get", json!({}));
    assert_eq!(seating["grid"]["seats"], json!(2));
    let filled = s.call("seating.autoFill", json!({}));
    assert_eq!(filled["placed"], json!(2));
    s.call("seating.place", json!({ "seatId": "seat-0", "studentId": ann_id }));
    s.call("seating.unseat", json!({ "studentId": ann_id }));
    let refused = s.send("seating.clear", json!({}));
    assert_eq!(error_code(&refused), Some("confirm_required"));
    s.call("seating.clear", json!({ "confirm": true }));

    let groups = s.call("groups.generate", json!({ "groupCount": 2 }));
    assert_eq!(groups["groups"].as_array().map(|a| a.len()), Some(2));
    let pick = s.call("picker.pick", json!({ "spins": 5 }));
    assert_eq!(pick["pick"]["draws"].as_array().map(|a| a.len()), Some(5));

    let dash = s.call("dashboard.open", json!({ "now": "2025-03-03T08:00" }));
    assert_eq!(dash["attendanceDone"], json!(true));
    assert_eq!(dash["todaysClasses"].as_array().map(|a| a.len()), Some(1));

    s.call("settings.get", json!({}));
    let theme = s.call("settings.toggleTheme", json!({}));
    assert_eq!(theme["theme"], json!("dark"));

    let bundle = out.join("backup.zip");
    s.call("backup.export", json!({ "outPath": bundle.to_string_lossy() }));
    s.call("settings.clearData", json!({ "confirm": true }));
    let restored = s.call("backup.import", json!({ "inPath": bundle.to_string_lossy() }));
    assert_eq!(restored["students"], json!(2));

    let doc = s.call("data.get", json!({}));
    assert!(doc.get("teacher-assistant-storage").is_some());
    s.call("data.put", json!({ "document": doc }));

    let template = s.call("students.template", json!({ "outDir": out.to_string_lossy() }));
    let template_path = template["path"].as_str().expect("template path").to_string();
    let imported = s.call("students.import", json!({ "inPath": template_path }));
    assert_eq!(imported["imported"], json!(2));
    let roster = s.call("students.list", json!({}));
    let first_id = roster["students"][0]["id"].as_str().expect("id").to_string();
    s.call("students.delete", json!({ "studentId": first_id }));

    let unknown = s.send("nope.method", json!({}));
    assert_eq!(error_code(&unknown), Some("not_implemented"));

    drop(s);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn malformed_lines_get_a_bad_json_reply() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    writeln!(stdin, "{{not json").expect("write");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("json reply");
    assert_eq!(error_code(&value), Some("bad_json"));
    drop(stdin);
    let _ = child.wait();
}
