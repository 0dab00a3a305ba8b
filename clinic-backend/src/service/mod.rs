// src/service/mod.rs
pub mod appointment_service;
pub mod auth_service;
pub mod billing_service;
pub mod blocked_time_slot_service;
pub mod dashboard_service;
pub mod inventory_service;
pub mod medical_record_service;
pub mod notification_service;
pub mod otp_service;
pub mod personnel_service;
pub mod report_service;
pub mod user_service;
