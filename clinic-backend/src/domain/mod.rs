// src/domain/mod.rs

pub mod account;
pub mod admin_model;
pub mod appointment_model;
pub mod appointment_status;
pub mod billing_item_model;
pub mod billing_model;
pub mod blocked_time_slot_model;
pub mod inventory_item_model;
pub mod inventory_transaction_model;
pub mod medical_record_model;
pub mod notification_model;
pub mod otp_model;
pub mod payment_status;
pub mod personnel_model;
pub mod refresh_token_model;
pub mod time_of_day;
pub mod user_model;
