// src/utils/mod.rs

pub mod email;
pub mod error_helper;
pub mod jwt;
pub mod password;
pub mod token;
pub mod transaction;
pub mod validation;
