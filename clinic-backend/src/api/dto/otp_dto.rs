// src/api/dto/otp_dto.rs

use crate::domain::otp_model::OtpPurpose;
use crate::utils::validation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub purpose: OtpPurpose,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub purpose: OtpPurpose,

    #[validate(custom(function = validation::validate_otp_code))]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOtpResponse {
    pub message: String,
    pub expires_at: DateTime<Utc>,
    pub expires_in_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpResponse {
    pub message: String,
    pub verified: bool,
    pub purpose: OtpPurpose,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purpose_deserialization() {
        let request: SendOtpRequest = serde_json::from_str(
            r#"{"email":"patient@example.com","purpose":"password_reset"}"#,
        )
        .unwrap();
        assert_eq!(request.purpose, OtpPurpose::PasswordReset);

        let unknown = serde_json::from_str::<SendOtpRequest>(
            r#"{"email":"patient@example.com","purpose":"login"}"#,
        );
        assert!(unknown.is_err());
    }
}
