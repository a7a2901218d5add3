pub mod appointment;
pub mod attendance;
pub mod import_batch;
pub mod message;
pub mod report;
pub mod user;
