// src/api/handlers/mod.rs
pub mod appointment_handler;
pub mod auth_handler;
pub mod billing_handler;
pub mod blocked_time_slot_handler;
pub mod dashboard_handler;
pub mod inventory_handler;
pub mod medical_record_handler;
pub mod notification_handler;
pub mod otp_handler;
pub mod personnel_handler;
pub mod report_handler;
pub mod system_handler;
pub mod user_handler;
