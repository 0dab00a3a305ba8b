//! 共通バリデーション定数と検証関数
//!
//! DTO の `#[validate(custom(function = ...))]` から参照される。

use crate::domain::time_of_day::TimeOfDay;
use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

/// 氏名の制約
pub mod name {
    pub const MIN_LENGTH: u64 = 1;
    pub const MAX_LENGTH: u64 = 100;
}

/// パスワードの制約
pub mod password {
    pub const MIN_LENGTH: u64 = 8;
    pub const MAX_LENGTH: u64 = 128;
}

/// 自由記述欄の制約
pub mod text {
    pub const SHORT_MAX_LENGTH: u64 = 255;
    pub const LONG_MAX_LENGTH: u64 = 5000;
}

/// 請求明細一行あたりの数量
pub mod quantity {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 100_000;
}

pub static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9\- ]{6,19}$").expect("Invalid phone regex"));

pub static OTP_CODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{6}$").expect("Invalid OTP code regex"));

fn error_with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_REGEX.is_match(phone) {
        Ok(())
    } else {
        Err(error_with_message(
            "invalid_phone",
            "Phone number may contain digits, spaces, hyphens and a leading +",
        ))
    }
}

/// "HH:MM" 形式の時刻
pub fn validate_time_of_day(value: &str) -> Result<(), ValidationError> {
    TimeOfDay::parse(value)
        .map(|_| ())
        .ok_or_else(|| error_with_message("invalid_time", "Time must be in HH:MM format"))
}

pub fn validate_otp_code(code: &str) -> Result<(), ValidationError> {
    if OTP_CODE_REGEX.is_match(code) {
        Ok(())
    } else {
        Err(error_with_message(
            "invalid_otp_code",
            "Code must be exactly 6 digits",
        ))
    }
}

/// パスワードの強度をバリデーション（基本チェック）
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_lowercase || !has_uppercase || !has_digit {
        return Err(error_with_message(
            "weak_password",
            "Password must contain at least one lowercase letter, one uppercase letter, and one digit",
        ));
    }

    Ok(())
}
