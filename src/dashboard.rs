use crate::attendance::{format_date, StatusCounts};
use crate::model::{CalendarEvent, Classroom, TimetableSlot};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Attendance is expected to be taken before this time of day.
pub const ATTENDANCE_TARGET: (u32, u32) = (8, 15);
pub const UPCOMING_LIMIT: usize = 3;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard<'a> {
    pub date: String,
    pub todays_classes: Vec<&'a TimetableSlot>,
    pub roster_size: usize,
    pub marked: usize,
    pub attendance_done: bool,
    pub before_target: bool,
    pub counts: StatusCounts,
    pub note: Option<&'a str>,
    pub upcoming_events: Vec<&'a CalendarEvent>,
}

pub fn dashboard(classroom: &Classroom, now: NaiveDateTime) -> Dashboard<'_> {
    let today = now.date();
    let date = format_date(today);

    let todays = classroom.records_on(&date);
    let mut counts = StatusCounts::default();
    for r in &todays {
        counts.add(r.status);
    }

    let target = NaiveTime::from_hms_opt(ATTENDANCE_TARGET.0, ATTENDANCE_TARGET.1, 0)
        .unwrap_or(NaiveTime::MIN);

    let mut upcoming: Vec<(NaiveDate, &CalendarEvent)> = classroom
        .events
        .iter()
        .filter_map(|e| {
            let d = NaiveDate::parse_from_str(&e.date, "%Y-%m-%d").ok()?;
            (d >= today).then_some((d, e))
        })
        .collect();
    upcoming.sort_by_key(|(d, _)| *d);

    let roster_size = classroom.students.len();
    Dashboard {
        todays_classes: classroom.slots_for_date(today),
        roster_size,
        marked: todays.len(),
        attendance_done: roster_size > 0 && todays.len() == roster_size,
        before_target: now.time() < target,
        counts,
        note: classroom.daily_note(&date),
        upcoming_events: upcoming
            .into_iter()
            .take(UPCOMING_LIMIT)
            .map(|(_, e)| e)
            .collect(),
        date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttendanceStatus, EventType, Student};

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M").expect("datetime")
    }

    #[test]
    fn dashboard_reflects_today() {
        let mut c = Classroom::default();
        c.add_student(Student {
            id: "a".into(),
            ..Student::new("Ann", "1")
        });
        c.set_status("a", "2025-03-05", AttendanceStatus::Late);
        c.set_daily_note("2025-03-05", "fire drill");
        for (date, title) in [
            ("2025-03-01", "past"),
            ("2025-03-09", "fourth"),
            ("2025-03-05", "today"),
            ("2025-03-07", "second"),
            ("2025-03-08", "third"),
        ] {
            c.add_event(CalendarEvent::new(date, title, EventType::Test));
        }
        c.add_slot(TimetableSlot {
            id: "t".into(),
            day_of_week: 3,
            start_time: "09:00".into(),
            end_time: "10:00".into(),
            subject: "Science".into(),
            lesson: "Magnets".into(),
        });

        // 2025-03-05 is a Wednesday.
        let d = dashboard(&c, at("2025-03-05", "07:50"));
        assert!(d.attendance_done);
        assert!(d.before_target);
        assert_eq!(d.counts.late, 1);
        assert_eq!(d.note, Some("fire drill"));
        assert_eq!(d.todays_classes.len(), 1);
        let titles: Vec<&str> = d.upcoming_events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["today", "second", "third"]);

        let later = dashboard(&c, at("2025-03-06", "09:00"));
        assert!(!later.attendance_done);
        assert!(!later.before_target);
        assert!(later.todays_classes.is_empty());
    }
}
