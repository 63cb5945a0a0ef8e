//! Spreadsheet interchange as CSV: roster import/template, monthly attendance
//! report, timetable plan and calendar schedule.

use crate::attendance::{format_date, month_days, month_key, parse_month, RecordIndex, StatusCounts};
use crate::model::{AttendanceRecord, AttendanceStatus, CalendarEvent, EventType, Student, TimetableSlot};
use anyhow::{anyhow, Context};
use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use serde::Deserialize;
use std::path::Path;

pub fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Splits CSV text into records. Outside quotes `\n` and `\r\n` end a record;
/// inside quotes they stay part of the cell.
pub fn parse_csv_records(text: &str) -> Vec<Vec<String>> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        let ch = chars[i];
        let next = chars.get(i + 1).copied();
        i += 1;
        match ch {
            '"' if in_quotes && next == Some('"') => {
                buf.push('"');
                i += 1;
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => record.push(std::mem::take(&mut buf)),
            '\r' if !in_quotes && next == Some('\n') => {}
            '\n' | '\r' if !in_quotes => {
                record.push(std::mem::take(&mut buf));
                records.push(std::mem::take(&mut record));
            }
            _ => buf.push(ch),
        }
    }
    if !buf.is_empty() || !record.is_empty() {
        record.push(buf);
        records.push(record);
    }
    records
}

/// Parses a single record; a trailing line break is ignored.
pub fn parse_csv_record(line: &str) -> Vec<String> {
    parse_csv_records(line)
        .into_iter()
        .next()
        .unwrap_or_else(|| vec![String::new()])
}

/// A header row plus data rows. Blank lines are dropped; quoted cells may
/// span lines.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut records = parse_csv_records(text)
            .into_iter()
            .filter(|r| !(r.len() == 1 && r[0].trim().is_empty()));
        let header = records.next().ok_or_else(|| anyhow!("sheet has no header row"))?;
        let headers: Vec<String> = header
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(anyhow!("sheet header row is empty"));
        }
        let rows = records
            .filter(|r| r.iter().any(|c| !c.trim().is_empty()))
            .collect();
        Ok(Self { headers, rows })
    }

    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| anyhow!("{} is not a UTF-8 CSV file", path.to_string_lossy()))?;
        Self::parse(&text)
    }

    /// Column index for the first candidate header present. Matching ignores
    /// case, spaces and punctuation, so `Roll Number` and `rollNumber` agree.
    fn column(&self, candidates: &[&str]) -> Vec<usize> {
        candidates
            .iter()
            .filter_map(|c| {
                let want = header_key(c);
                self.headers.iter().position(|h| header_key(h) == want)
            })
            .collect()
    }

    /// First non-empty cell among `columns` for a row.
    fn cell<'a>(row: &'a [String], columns: &[usize]) -> Option<&'a str> {
        columns
            .iter()
            .filter_map(|&i| row.get(i))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }
}

fn header_key(h: &str) -> String {
    h.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn write_sheet(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    let line = |cells: &[String]| {
        cells
            .iter()
            .map(|c| csv_quote(c))
            .collect::<Vec<_>>()
            .join(",")
    };
    out.push_str(&line(headers));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}

const NAME_HEADERS: [&str; 3] = ["Name", "name", "Student Name"];
const ROLL_HEADERS: [&str; 4] = ["Roll Number", "rollNumber", "Roll", "ID"];

/// One student per data row, with fresh ids. Missing names become
/// `Student {n}` and missing roll numbers `{n}` (1-based row number).
pub fn import_students(sheet: &Sheet) -> Vec<Student> {
    let name_cols = sheet.column(&NAME_HEADERS);
    let roll_cols = sheet.column(&ROLL_HEADERS);
    let parent_name_cols = sheet.column(&["Parent Name"]);
    let parent_phone_cols = sheet.column(&["Parent Phone"]);

    sheet
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let n = i + 1;
            let name = Sheet::cell(row, &name_cols)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Student {n}"));
            let roll = Sheet::cell(row, &roll_cols)
                .map(str::to_string)
                .unwrap_or_else(|| n.to_string());
            let mut s = Student::new(name, roll);
            s.parent_name = Sheet::cell(row, &parent_name_cols).map(str::to_string);
            s.parent_phone = Sheet::cell(row, &parent_phone_cols).map(str::to_string);
            s
        })
        .collect()
}

pub fn roster_template() -> String {
    write_sheet(
        &["Roll Number".to_string(), "Name".to_string()],
        &[
            vec!["1".to_string(), "Alice Smith".to_string()],
            vec!["2".to_string(), "Bob Jones".to_string()],
        ],
    )
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportOptions {
    pub include_roll_number: bool,
    pub include_name: bool,
    pub include_parent_name: bool,
    pub include_parent_phone: bool,
    pub include_daily_status: bool,
    pub include_summary: bool,
    pub include_reasons: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_roll_number: true,
            include_name: true,
            include_parent_name: false,
            include_parent_phone: false,
            include_daily_status: true,
            include_summary: true,
            include_reasons: true,
        }
    }
}

pub fn report_file_name(month: &str) -> String {
    format!("Attendance_Report_{}.csv", month.trim())
}

/// One row per student for the month `YYYY-MM`.
pub fn monthly_report(
    month: &str,
    students: &[Student],
    records: &[AttendanceRecord],
    opts: &ReportOptions,
) -> anyhow::Result<String> {
    let first = parse_month(month)?;
    let days = month_days(first);
    let index = RecordIndex::new(records);

    let mut headers: Vec<String> = Vec::new();
    if opts.include_roll_number {
        headers.push("Roll Number".into());
    }
    if opts.include_name {
        headers.push("Name".into());
    }
    if opts.include_parent_name {
        headers.push("Parent Name".into());
    }
    if opts.include_parent_phone {
        headers.push("Parent Phone".into());
    }
    if opts.include_daily_status {
        headers.extend(days.iter().map(|d| d.format("%d/%m").to_string()));
    }
    if opts.include_summary {
        headers.extend(
            AttendanceStatus::ALL
                .iter()
                .map(|s| format!("Total {}", s.label())),
        );
    }

    let mut rows = Vec::with_capacity(students.len());
    for s in students {
        let mut row: Vec<String> = Vec::new();
        if opts.include_roll_number {
            row.push(s.roll_number.clone());
        }
        if opts.include_name {
            row.push(s.name.clone());
        }
        if opts.include_parent_name {
            row.push(s.parent_name.clone().unwrap_or_else(|| "-".into()));
        }
        if opts.include_parent_phone {
            row.push(s.parent_phone.clone().unwrap_or_else(|| "-".into()));
        }
        let mut counts = StatusCounts::default();
        for day in &days {
            let cell = match index.get(&s.id, &format_date(*day)) {
                Some(r) => {
                    counts.add(r.status);
                    let mut v = r.status.letter().to_string();
                    if opts.include_reasons {
                        if let Some(reason) = r.reason.as_deref().filter(|t| !t.is_empty()) {
                            v.push_str(&format!(" ({reason})"));
                        }
                    }
                    v
                }
                None => "-".to_string(),
            };
            if opts.include_daily_status {
                row.push(cell);
            }
        }
        if opts.include_summary {
            row.extend(AttendanceStatus::ALL.iter().map(|st| counts.get(*st).to_string()));
        }
        rows.push(row);
    }
    Ok(write_sheet(&headers, &rows))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanSpan {
    Month,
    Semester,
}

impl PlanSpan {
    fn months(self) -> u32 {
        match self {
            PlanSpan::Month => 1,
            PlanSpan::Semester => 6,
        }
    }
}

pub fn timetable_file_name(start_month: &str, span: PlanSpan) -> String {
    let label = match span {
        PlanSpan::Month => "Month",
        PlanSpan::Semester => "Semester",
    };
    format!("Lesson_Plan_{}_{}.csv", label, start_month.trim())
}

/// Every weekday from the start of `start_month` up to one or six months
/// later, with one row per class scheduled on that weekday.
pub fn timetable_plan(slots: &[TimetableSlot], start_month: &str, span: PlanSpan) -> anyhow::Result<String> {
    let start = parse_month(start_month)?;
    let end = start
        .checked_add_months(Months::new(span.months()))
        .ok_or_else(|| anyhow!("plan end is out of range"))?;

    let mut by_day: Vec<Vec<&TimetableSlot>> = vec![Vec::new(); 7];
    for slot in slots {
        if let Some(day) = by_day.get_mut(slot.day_of_week as usize) {
            day.push(slot);
        }
    }
    for day in &mut by_day {
        day.sort_by(|a, b| a.start_time.cmp(&b.start_time));
    }

    let headers: Vec<String> = ["Date", "Day", "Start Time", "End Time", "Subject", "Lesson"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let mut rows = Vec::new();
    for day in start.iter_days().take_while(|d| *d < end) {
        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        for slot in &by_day[day.weekday().num_days_from_sunday() as usize] {
            rows.push(vec![
                format_date(day),
                day.format("%A").to_string(),
                slot.start_time.clone(),
                slot.end_time.clone(),
                slot.subject.clone(),
                slot.lesson.clone(),
            ]);
        }
    }
    Ok(write_sheet(&headers, &rows))
}

const SCHEDULE_HEADERS: [&str; 4] = ["Date", "Title", "Type", "Description"];

pub fn schedule_export(events: &[CalendarEvent]) -> String {
    let mut sorted: Vec<&CalendarEvent> = events.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date));
    let rows: Vec<Vec<String>> = sorted
        .into_iter()
        .map(|e| {
            vec![
                e.date.clone(),
                e.title.clone(),
                e.event_type.label().to_string(),
                e.description.clone().unwrap_or_default(),
            ]
        })
        .collect();
    let headers: Vec<String> = SCHEDULE_HEADERS.iter().map(|h| h.to_string()).collect();
    write_sheet(&headers, &rows)
}

pub fn schedule_file_name(today: NaiveDate) -> String {
    format!("Schedule_{}.csv", month_key(today))
}

/// Rows without a title are skipped. Bad dates become `today`, unknown types
/// become `Other`.
pub fn schedule_import(sheet: &Sheet, today: NaiveDate) -> Vec<CalendarEvent> {
    let date_cols = sheet.column(&["Date"]);
    let title_cols = sheet.column(&["Title", "Event", "Name"]);
    let type_cols = sheet.column(&["Type", "Category"]);
    let desc_cols = sheet.column(&["Description", "Details", "Notes"]);

    sheet
        .rows
        .iter()
        .filter_map(|row| {
            let title = Sheet::cell(row, &title_cols)?;
            let date = Sheet::cell(row, &date_cols)
                .and_then(parse_loose_date)
                .unwrap_or(today);
            let event_type = Sheet::cell(row, &type_cols)
                .map(EventType::coerce)
                .unwrap_or_default();
            let mut event = CalendarEvent::new(format_date(date), title, event_type);
            event.description = Sheet::cell(row, &desc_cols).map(str::to_string);
            Some(event)
        })
        .collect()
}

const LOOSE_DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Accepts the common written forms and spreadsheet serial day numbers.
pub fn parse_loose_date(raw: &str) -> Option<NaiveDate> {
    let t = raw.trim();
    if t.is_empty() {
        return None;
    }
    if let Ok(serial) = t.parse::<f64>() {
        // Spreadsheet day 1 is 1900-01-01, counted from 1899-12-30 to
        // absorb the phantom 1900-02-29.
        if (1.0..2_958_466.0).contains(&serial) {
            let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
            return epoch.checked_add_signed(Duration::days(serial.floor() as i64));
        }
        return None;
    }
    for fmt in LOOSE_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            return Some(d);
        }
    }
    // ISO timestamps: keep the date part.
    t.get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    #[test]
    fn csv_quote_and_parse_agree() {
        let cells = vec!["a,b".to_string(), "say \"hi\"".to_string(), "plain".to_string()];
        let line = cells.iter().map(|c| csv_quote(c)).collect::<Vec<_>>().join(",");
        assert_eq!(parse_csv_record(&line), cells);
    }

    #[test]
    fn quoted_cells_keep_line_breaks() {
        let text = "Date,Title,Description\r\n2025-03-06,Trip,\"Bring lunch\nand a hat\"\r\n\r\n2025-03-07,Quiz,\"a,\"\"b\"\"\"\n";
        let sheet = Sheet::parse(text).expect("sheet");
        assert_eq!(sheet.headers, vec!["Date", "Title", "Description"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][2], "Bring lunch\nand a hat");
        assert_eq!(sheet.rows[1][2], "a,\"b\"");
    }

    #[test]
    fn header_synonyms_and_casing() {
        let sheet = Sheet::parse("Roll,name\n7,Ada\n8,Grace\n").expect("sheet");
        let students = import_students(&sheet);
        assert_eq!(students.len(), 2);
        assert_eq!(students[0].roll_number, "7");
        assert_eq!(students[0].name, "Ada");
        assert_eq!(students[1].name, "Grace");

        let sheet = Sheet::parse("STUDENT NAME,id\nLin,42\n").expect("sheet");
        let students = import_students(&sheet);
        assert_eq!(students[0].name, "Lin");
        assert_eq!(students[0].roll_number, "42");
    }

    #[test]
    fn missing_cells_get_placeholders() {
        let sheet = Sheet::parse("Name,Roll Number\n,\nBo,\n").expect("sheet");
        let students = import_students(&sheet);
        // The fully blank row is dropped.
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].name, "Bo");
        assert_eq!(students[0].roll_number, "1");

        let sheet = Sheet::parse("Comment\nhello\n").expect("sheet");
        let students = import_students(&sheet);
        assert_eq!(students[0].name, "Student 1");
    }

    #[test]
    fn empty_sheet_is_an_error() {
        assert!(Sheet::parse("").is_err());
        assert!(Sheet::parse("\n\n").is_err());
    }

    #[test]
    fn loose_dates() {
        assert_eq!(parse_loose_date("2025-03-07"), Some(ymd(2025, 3, 7)));
        assert_eq!(parse_loose_date("07/03/2025"), Some(ymd(2025, 3, 7)));
        assert_eq!(parse_loose_date("March 7, 2025"), Some(ymd(2025, 3, 7)));
        assert_eq!(parse_loose_date("7 Mar 2025"), Some(ymd(2025, 3, 7)));
        assert_eq!(parse_loose_date("45723"), Some(ymd(2025, 3, 7)));
        assert_eq!(parse_loose_date("2025-03-07T09:30:00Z"), Some(ymd(2025, 3, 7)));
        assert_eq!(parse_loose_date("someday"), None);
    }

    #[test]
    fn timetable_plan_skips_weekends() {
        let slot = |id: &str, dow: u8, start: &str| TimetableSlot {
            id: id.into(),
            day_of_week: dow,
            start_time: start.into(),
            end_time: "10:00".into(),
            subject: format!("Subject {id}"),
            lesson: String::new(),
        };
        let slots = vec![slot("b", 1, "10:00"), slot("a", 1, "08:00"), slot("s", 6, "09:00")];
        let csv = timetable_plan(&slots, "2025-09", PlanSpan::Month).expect("plan");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Date,Day,Start Time,End Time,Subject,Lesson");
        // Mondays in September 2025: 1, 8, 15, 22, 29.
        assert_eq!(lines.len(), 1 + 5 * 2);
        assert!(lines[1].starts_with("2025-09-01,Monday,08:00"));
        assert!(lines[2].starts_with("2025-09-01,Monday,10:00"));
        assert!(!csv.contains("Saturday"));

        let semester = timetable_plan(&slots, "2025-09", PlanSpan::Semester).expect("plan");
        assert!(semester.lines().count() > 40);
        assert!(!semester.contains("2026-03-"));
    }
}
