pub mod attendance;
pub mod core;
pub mod dashboard;
pub mod groups;
pub mod reports;
pub mod schedule;
pub mod seating;
pub mod settings;
pub mod students;
pub mod timetable;
