// tests/integration/mod.rs

pub mod access_tests;
pub mod appointment_tests;
pub mod auth_tests;
pub mod billing_tests;
pub mod inventory_tests;
pub mod notification_tests;
pub mod otp_tests;
pub mod report_tests;
