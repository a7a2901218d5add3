pub mod admin_handlers;
pub mod api;
pub mod appointment_handlers;
pub mod attendance_handlers;
pub mod auth_handlers;
pub mod import_handlers;
pub mod legacy_handlers;
pub mod message_handlers;
pub mod report_handlers;
pub mod ws;
