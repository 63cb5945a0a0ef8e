pub mod attendance;
pub mod backup;
pub mod config;
pub mod dashboard;
pub mod groups;
pub mod http;
pub mod ipc;
pub mod model;
pub mod picker;
pub mod seating;
pub mod sheets;
pub mod store;
