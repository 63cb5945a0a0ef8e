use crate::seating::{self, SeatingLayout};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub roll_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_phone: Option<String>,
    #[serde(default)]
    pub is_flagged: bool,
}

impl Student {
    pub fn new(name: impl Into<String>, roll_number: impl Into<String>) -> Self {
        Self {
            id: format!("std_{}", Uuid::new_v4().simple()),
            name: name.into(),
            roll_number: roll_number.into(),
            parent_name: None,
            parent_phone: None,
            is_flagged: false,
        }
    }

    pub fn flagged(mut self) -> Self {
        self.is_flagged = true;
        self
    }

    fn matches(&self, needle: &str) -> bool {
        let hit = |s: &str| s.to_lowercase().contains(needle);
        hit(&self.name)
            || hit(&self.roll_number)
            || self.parent_name.as_deref().map(hit).unwrap_or(false)
            || self.parent_phone.as_deref().map(hit).unwrap_or(false)
    }
}

/// Partial edit of a student. Absent fields are left alone; an empty parent
/// field clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    pub name: Option<String>,
    pub roll_number: Option<String>,
    pub parent_name: Option<String>,
    pub parent_phone: Option<String>,
    pub is_flagged: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Sick,
    Late,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Sick,
        AttendanceStatus::Late,
    ];

    pub fn letter(self) -> char {
        match self {
            AttendanceStatus::Present => 'P',
            AttendanceStatus::Absent => 'A',
            AttendanceStatus::Sick => 'S',
            AttendanceStatus::Late => 'L',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Sick => "Sick",
            AttendanceStatus::Late => "Late",
        }
    }

    /// Accepts the full label or the single-letter code, any case.
    pub fn parse(raw: &str) -> Option<Self> {
        let t = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|s| {
            t == s.label().to_ascii_lowercase() || t == s.letter().to_ascii_lowercase().to_string()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub student_id: String,
    pub date: String,
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventType {
    Classwork,
    Test,
    Exam,
    #[default]
    #[serde(other)]
    Other,
}

impl EventType {
    pub fn label(self) -> &'static str {
        match self {
            EventType::Classwork => "Classwork",
            EventType::Test => "Test",
            EventType::Exam => "Exam",
            EventType::Other => "Other",
        }
    }

    /// Unknown spellings fall into `Other`.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "classwork" => EventType::Classwork,
            "test" => EventType::Test,
            "exam" => EventType::Exam,
            _ => EventType::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub date: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CalendarEvent {
    pub fn new(date: impl Into<String>, title: impl Into<String>, event_type: EventType) -> Self {
        Self {
            id: format!("evt_{}", Uuid::new_v4().simple()),
            date: date.into(),
            title: title.into(),
            event_type,
            description: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableSlot {
    pub id: String,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    pub subject: String,
    #[serde(default)]
    pub lesson: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotPatch {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub subject: Option<String>,
    pub lesson: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// The whole application state as it is stored in the data document.
///
/// Every change goes through a method here; callers persist afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Classroom {
    pub students: Vec<Student>,
    pub records: Vec<AttendanceRecord>,
    pub daily_notes: BTreeMap<String, String>,
    pub events: Vec<CalendarEvent>,
    pub timetable: Vec<TimetableSlot>,
    pub seating_layout: SeatingLayout,
    pub theme: Theme,
}

fn non_empty(v: String) -> Option<String> {
    if v.trim().is_empty() {
        None
    } else {
        Some(v)
    }
}

impl Classroom {
    pub fn student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn search_students(&self, query: &str) -> Vec<&Student> {
        let needle = query.trim().to_lowercase();
        self.students.iter().filter(|s| s.matches(&needle)).collect()
    }

    /// Replaces the roster. Seat assignments for ids that are gone are dropped.
    pub fn set_students(&mut self, students: Vec<Student>) {
        self.students = students;
        let students = &self.students;
        self.seating_layout
            .retain(|_, sid| students.iter().any(|s| &s.id == sid));
    }

    /// Returns false when a student with the same roll number and name exists.
    pub fn add_student(&mut self, student: Student) -> bool {
        if self
            .students
            .iter()
            .any(|s| s.roll_number == student.roll_number && s.name == student.name)
        {
            return false;
        }
        self.students.push(student);
        true
    }

    pub fn remove_student(&mut self, id: &str) -> bool {
        let before = self.students.len();
        self.students.retain(|s| s.id != id);
        self.seating_layout.retain(|_, sid| sid != id);
        self.students.len() != before
    }

    pub fn update_student(&mut self, id: &str, patch: StudentPatch) -> bool {
        let Some(s) = self.students.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        if let Some(v) = patch.name {
            s.name = v;
        }
        if let Some(v) = patch.roll_number {
            s.roll_number = v;
        }
        if let Some(v) = patch.parent_name {
            s.parent_name = non_empty(v);
        }
        if let Some(v) = patch.parent_phone {
            s.parent_phone = non_empty(v);
        }
        if let Some(v) = patch.is_flagged {
            s.is_flagged = v;
        }
        true
    }

    pub fn toggle_flag(&mut self, id: &str) -> Option<bool> {
        let s = self.students.iter_mut().find(|s| s.id == id)?;
        s.is_flagged = !s.is_flagged;
        Some(s.is_flagged)
    }

    pub fn record(&self, student_id: &str, date: &str) -> Option<&AttendanceRecord> {
        self.records
            .iter()
            .find(|r| r.student_id == student_id && r.date == date)
    }

    pub fn records_on(&self, date: &str) -> Vec<&AttendanceRecord> {
        self.records.iter().filter(|r| r.date == date).collect()
    }

    /// Upsert keyed by (student, date).
    pub fn set_record(&mut self, record: AttendanceRecord) {
        match self
            .records
            .iter_mut()
            .find(|r| r.student_id == record.student_id && r.date == record.date)
        {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    /// Sets a status and keeps whatever reason was already recorded.
    pub fn set_status(&mut self, student_id: &str, date: &str, status: AttendanceStatus) {
        let reason = self
            .record(student_id, date)
            .and_then(|r| r.reason.clone());
        self.set_record(AttendanceRecord {
            student_id: student_id.to_string(),
            date: date.to_string(),
            status,
            reason,
        });
    }

    /// Only edits an existing record; returns false when there is none.
    pub fn set_reason(&mut self, student_id: &str, date: &str, reason: &str) -> bool {
        let Some(r) = self
            .records
            .iter_mut()
            .find(|r| r.student_id == student_id && r.date == date)
        else {
            return false;
        };
        r.reason = non_empty(reason.to_string());
        true
    }

    pub fn mark_all_present(&mut self, date: &str) -> usize {
        let missing: Vec<String> = self
            .students
            .iter()
            .filter(|s| self.record(&s.id, date).is_none())
            .map(|s| s.id.clone())
            .collect();
        for id in &missing {
            self.records.push(AttendanceRecord {
                student_id: id.clone(),
                date: date.to_string(),
                status: AttendanceStatus::Present,
                reason: None,
            });
        }
        missing.len()
    }

    pub fn daily_note(&self, date: &str) -> Option<&str> {
        self.daily_notes.get(date).map(|s| s.as_str())
    }

    pub fn set_daily_note(&mut self, date: &str, note: &str) {
        self.daily_notes.insert(date.to_string(), note.to_string());
    }

    pub fn add_event(&mut self, event: CalendarEvent) {
        self.events.push(event);
    }

    pub fn update_event(&mut self, id: &str, patch: EventPatch) -> bool {
        let Some(e) = self.events.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        if let Some(v) = patch.title {
            e.title = v;
        }
        if let Some(v) = patch.event_type {
            e.event_type = EventType::coerce(&v);
        }
        if let Some(v) = patch.description {
            e.description = non_empty(v);
        }
        if let Some(v) = patch.date {
            e.date = v;
        }
        true
    }

    pub fn remove_event(&mut self, id: &str) -> bool {
        let before = self.events.len();
        self.events.retain(|e| e.id != id);
        self.events.len() != before
    }

    pub fn events_on(&self, date: &str) -> Vec<&CalendarEvent> {
        self.events.iter().filter(|e| e.date == date).collect()
    }

    /// `month` is `YYYY-MM`; events are returned in date order.
    pub fn events_in_month(&self, month: &str) -> Vec<&CalendarEvent> {
        let prefix = format!("{}-", month.trim());
        let mut out: Vec<&CalendarEvent> = self
            .events
            .iter()
            .filter(|e| e.date.starts_with(&prefix))
            .collect();
        out.sort_by(|a, b| a.date.cmp(&b.date));
        out
    }

    pub fn add_slot(&mut self, slot: TimetableSlot) {
        self.timetable.push(slot);
    }

    pub fn update_slot(&mut self, id: &str, patch: SlotPatch) -> bool {
        let Some(s) = self.timetable.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        if let Some(v) = patch.start_time {
            s.start_time = v;
        }
        if let Some(v) = patch.end_time {
            s.end_time = v;
        }
        if let Some(v) = patch.subject {
            s.subject = v;
        }
        if let Some(v) = patch.lesson {
            s.lesson = v;
        }
        true
    }

    pub fn remove_slot(&mut self, id: &str) -> bool {
        let before = self.timetable.len();
        self.timetable.retain(|s| s.id != id);
        self.timetable.len() != before
    }

    pub fn slots_for_day(&self, day_of_week: u8) -> Vec<&TimetableSlot> {
        let mut out: Vec<&TimetableSlot> = self
            .timetable
            .iter()
            .filter(|s| s.day_of_week == day_of_week)
            .collect();
        out.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        out
    }

    pub fn slots_for_date(&self, date: NaiveDate) -> Vec<&TimetableSlot> {
        self.slots_for_day(date.weekday().num_days_from_sunday() as u8)
    }

    pub fn update_seat(&mut self, seat_id: &str, student_id: Option<&str>) {
        seating::place_student(&mut self.seating_layout, seat_id, student_id);
    }

    /// Clears whichever seat holds the student. Returns the freed seat id.
    pub fn unseat(&mut self, student_id: &str) -> Option<String> {
        let seat_id = seating::seat_of(&self.seating_layout, student_id)?.to_string();
        self.seating_layout.remove(&seat_id);
        Some(seat_id)
    }

    pub fn set_seating_layout(&mut self, layout: SeatingLayout) {
        self.seating_layout = layout;
    }

    pub fn clear_seating_layout(&mut self) {
        self.seating_layout.clear();
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = match self.theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        self.theme
    }

    /// Wipes roster, attendance, notes, events and seating. Timetable and theme stay.
    pub fn clear_data(&mut self) {
        self.students.clear();
        self.records.clear();
        self.daily_notes.clear();
        self.events.clear();
        self.seating_layout.clear();
    }
}
