use classroomd::model::{AttendanceRecord, AttendanceStatus, CalendarEvent, EventType, Student};
use classroomd::sheets::{self, ReportOptions, Sheet};
use chrono::NaiveDate;

fn record(student_id: &str, date: &str, status: AttendanceStatus, reason: Option<&str>) -> AttendanceRecord {
    AttendanceRecord {
        student_id: student_id.to_string(),
        date: date.to_string(),
        status,
        reason: reason.map(str::to_string),
    }
}

fn roster() -> Vec<Student> {
    let mut ann = Student::new("Ann", "1");
    ann.id = "a".into();
    ann.parent_phone = Some("555-0100".into());
    let mut ben = Student::new("Ben", "2");
    ben.id = "b".into();
    vec![ann, ben]
}

#[test]
fn default_report_has_daily_columns_and_totals() {
    let records = vec![
        record("a", "2025-02-03", AttendanceStatus::Present, None),
        record("a", "2025-02-04", AttendanceStatus::Sick, Some("flu")),
        record("b", "2025-02-04", AttendanceStatus::Late, None),
        record("b", "2025-03-01", AttendanceStatus::Absent, None),
    ];
    let csv = sheets::monthly_report("2025-02", &roster(), &records, &ReportOptions::default())
        .expect("report");
    let sheet = Sheet::parse(&csv).expect("parse report");

    assert_eq!(sheet.headers.len(), 2 + 28 + 4);
    assert_eq!(sheet.headers[0], "Roll Number");
    assert_eq!(sheet.headers[2], "01/02");
    assert_eq!(sheet.headers[29], "28/02");
    assert_eq!(sheet.headers[33], "Total Late");

    let ann = &sheet.rows[0];
    assert_eq!(ann[1], "Ann");
    assert_eq!(ann[2 + 2], "P");
    assert_eq!(ann[2 + 3], "S (flu)");
    assert_eq!(ann[2], "-");
    assert_eq!(&ann[30..], &["1", "0", "1", "0"]);

    let ben = &sheet.rows[1];
    assert_eq!(&ben[30..], &["0", "0", "0", "1"]);
}

#[test]
fn report_options_toggle_columns() {
    let opts = ReportOptions {
        include_parent_phone: true,
        include_daily_status: false,
        include_reasons: false,
        ..ReportOptions::default()
    };
    let csv = sheets::monthly_report("2025-02", &roster(), &[], &opts).expect("report");
    let sheet = Sheet::parse(&csv).expect("parse");
    assert_eq!(
        sheet.headers,
        vec![
            "Roll Number",
            "Name",
            "Parent Phone",
            "Total Present",
            "Total Absent",
            "Total Sick",
            "Total Late"
        ]
    );
    assert_eq!(sheet.rows[0][2], "555-0100");
    assert_eq!(sheet.rows[1][2], "-");
    assert!(sheets::monthly_report("2025-13", &roster(), &[], &opts).is_err());
    assert_eq!(sheets::report_file_name("2025-02"), "Attendance_Report_2025-02.csv");
}

#[test]
fn schedule_export_reimports_with_same_fields() {
    let mut quiz = CalendarEvent::new("2025-05-02", "Quiz, chapter 3", EventType::Test);
    quiz.description = Some("Bring a \"calculator\"".into());
    let mut trip = CalendarEvent::new("2025-04-20", "Trip", EventType::Other);
    trip.description = Some("Bring lunch\nand a hat".into());
    let fair = CalendarEvent::new("2025-06-01", "Science fair", EventType::Classwork);

    let csv = sheets::schedule_export(&[quiz.clone(), trip.clone(), fair]);
    let today = NaiveDate::from_ymd_opt(2025, 1, 1).expect("date");
    let events = sheets::schedule_import(&Sheet::parse(&csv).expect("parse"), today);

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].title, "Trip");
    assert_eq!(events[0].description, trip.description);
    assert_eq!(events[1].title, quiz.title);
    assert_eq!(events[1].event_type, EventType::Test);
    assert_eq!(events[1].description, quiz.description);
    assert_ne!(events[1].id, quiz.id);
    assert_eq!(events[2].title, "Science fair");
    assert_eq!(events[2].date, "2025-06-01");
    assert_eq!(events[2].event_type, EventType::Classwork);
}

#[test]
fn schedule_import_fills_gaps() {
    let csv = "Date,Title,Type\n\
               15/03/2025,Essay,classwork\n\
               \"March 4, 2025\",Quoted date,Exam\n\
               garbage,Assembly,Parade\n\
               2025-03-09,,Test\n\
               45722,Serial,TEST\n";
    let today = NaiveDate::from_ymd_opt(2025, 3, 1).expect("date");
    let events = sheets::schedule_import(&Sheet::parse(csv).expect("parse"), today);

    let summary: Vec<(&str, &str, EventType)> = events
        .iter()
        .map(|e| (e.date.as_str(), e.title.as_str(), e.event_type))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("2025-03-15", "Essay", EventType::Classwork),
            ("2025-03-04", "Quoted date", EventType::Exam),
            ("2025-03-01", "Assembly", EventType::Other),
            ("2025-03-06", "Serial", EventType::Test),
        ]
    );
}
