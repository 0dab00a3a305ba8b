// src/api/dto/mod.rs
pub mod appointment_dto;
pub mod auth_dto;
pub mod billing_dto;
pub mod blocked_time_slot_dto;
pub mod dashboard_dto;
pub mod inventory_dto;
pub mod medical_record_dto;
pub mod notification_dto;
pub mod otp_dto;
pub mod personnel_dto;
pub mod report_dto;
pub mod system_dto;
pub mod user_dto;
