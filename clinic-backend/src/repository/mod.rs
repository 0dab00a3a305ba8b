// src/repository/mod.rs
pub mod admin_repository;
pub mod appointment_repository;
pub mod billing_repository;
pub mod blocked_time_slot_repository;
pub mod inventory_item_repository;
pub mod inventory_transaction_repository;
pub mod medical_record_repository;
pub mod notification_repository;
pub mod otp_repository;
pub mod personnel_repository;
pub mod refresh_token_repository;
pub mod user_repository;
