use crate::model::{AttendanceRecord, AttendanceStatus, Student};
use anyhow::{anyhow, Context};
use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .with_context(|| format!("date must be YYYY-MM-DD, got {:?}", raw))
}

pub fn format_date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

/// `YYYY-MM` -> first day of that month.
pub fn parse_month(raw: &str) -> anyhow::Result<NaiveDate> {
    let t = raw.trim();
    let Some((y, m)) = t.split_once('-') else {
        return Err(anyhow!("month must be YYYY-MM"));
    };
    let year = y
        .parse::<i32>()
        .map_err(|_| anyhow!("month year must be numeric"))?;
    let month = m
        .parse::<u32>()
        .map_err(|_| anyhow!("month must be YYYY-MM"))?;
    if !(1..=12).contains(&month) {
        return Err(anyhow!("month must be between 01 and 12"));
    }
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| anyhow!("month out of range"))
}

pub fn month_key(d: NaiveDate) -> String {
    format!("{:04}-{:02}", d.year(), d.month())
}

/// Every day of the month `first` falls in.
pub fn month_days(first: NaiveDate) -> Vec<NaiveDate> {
    let start = first.with_day(1).unwrap_or(first);
    let end = start.checked_add_months(Months::new(1)).unwrap_or(start);
    start.iter_days().take_while(|d| *d < end).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub present: usize,
    pub absent: usize,
    pub sick: usize,
    pub late: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Sick => self.sick += 1,
            AttendanceStatus::Late => self.late += 1,
        }
    }

    pub fn get(&self, status: AttendanceStatus) -> usize {
        match status {
            AttendanceStatus::Present => self.present,
            AttendanceStatus::Absent => self.absent,
            AttendanceStatus::Sick => self.sick,
            AttendanceStatus::Late => self.late,
        }
    }

    pub fn total(&self) -> usize {
        self.present + self.absent + self.sick + self.late
    }
}

/// Lookup of records by (student id, date).
pub struct RecordIndex<'a> {
    by_key: HashMap<(&'a str, &'a str), &'a AttendanceRecord>,
}

impl<'a> RecordIndex<'a> {
    pub fn new(records: &'a [AttendanceRecord]) -> Self {
        let by_key = records
            .iter()
            .map(|r| ((r.student_id.as_str(), r.date.as_str()), r))
            .collect();
        Self { by_key }
    }

    pub fn get(&self, student_id: &str, date: &str) -> Option<&'a AttendanceRecord> {
        self.by_key.get(&(student_id, date)).copied()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentMonth {
    pub student_id: String,
    pub name: String,
    pub roll_number: String,
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub total: usize,
}

pub fn month_summary(
    students: &[Student],
    records: &[AttendanceRecord],
    first: NaiveDate,
) -> Vec<StudentMonth> {
    let index = RecordIndex::new(records);
    let days: Vec<String> = month_days(first).into_iter().map(format_date).collect();
    students
        .iter()
        .map(|s| {
            let mut counts = StatusCounts::default();
            for day in &days {
                if let Some(r) = index.get(&s.id, day) {
                    counts.add(r.status);
                }
            }
            StudentMonth {
                student_id: s.id.clone(),
                name: s.name.clone(),
                roll_number: s.roll_number.clone(),
                counts,
                total: counts.total(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_keys_validate() {
        assert_eq!(
            parse_month("2024-02").expect("month"),
            NaiveDate::from_ymd_opt(2024, 2, 1).expect("date")
        );
        assert!(parse_month("2024-13").is_err());
        assert!(parse_month("Feb").is_err());
        assert_eq!(month_days(parse_month("2024-02").expect("month")).len(), 29);
        assert_eq!(month_days(parse_month("2023-02").expect("month")).len(), 28);
        assert_eq!(month_days(parse_month("2025-12").expect("month")).len(), 31);
    }

    #[test]
    fn summary_counts_only_that_month() {
        let students = vec![Student {
            id: "a".into(),
            ..Student::new("Ann", "1")
        }];
        let rec = |date: &str, status| AttendanceRecord {
            student_id: "a".into(),
            date: date.into(),
            status,
            reason: None,
        };
        let records = vec![
            rec("2025-03-03", AttendanceStatus::Present),
            rec("2025-03-04", AttendanceStatus::Sick),
            rec("2025-03-05", AttendanceStatus::Present),
            rec("2025-04-01", AttendanceStatus::Absent),
        ];
        let rows = month_summary(&students, &records, parse_month("2025-03").expect("month"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].counts.present, 2);
        assert_eq!(rows[0].counts.sick, 1);
        assert_eq!(rows[0].counts.absent, 0);
        assert_eq!(rows[0].total, 3);
    }
}
