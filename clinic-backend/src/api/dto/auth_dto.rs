// src/api/dto/auth_dto.rs

use crate::domain::account::AuthClaims;
use crate::domain::admin_model;
use crate::domain::user_model;
use crate::utils::jwt::TokenPair;
use crate::utils::validation::{self, name, password};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// --- リクエストDTO ---

/// 患者の新規登録（事前にregistration用OTPの検証が必要）
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(
        min = name::MIN_LENGTH,
        max = name::MAX_LENGTH,
        message = "First name must be between 1 and 100 characters"
    ))]
    pub first_name: String,

    #[validate(length(
        min = name::MIN_LENGTH,
        max = name::MAX_LENGTH,
        message = "Last name must be between 1 and 100 characters"
    ))]
    pub last_name: String,

    #[validate(custom(function = validation::validate_phone))]
    pub phone: Option<String>,

    #[validate(
        length(
            min = password::MIN_LENGTH,
            max = password::MAX_LENGTH,
            message = "Password must be between 8 and 128 characters"
        ),
        custom(function = validation::validate_password_strength)
    )]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// リフレッシュトークンはボディかCookieのどちらかで受け取る
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(
        length(
            min = password::MIN_LENGTH,
            max = password::MAX_LENGTH,
            message = "New password must be between 8 and 128 characters"
        ),
        custom(function = validation::validate_password_strength)
    )]
    pub new_password: String,

    #[validate(must_match(
        other = "new_password",
        message = "Password confirmation does not match"
    ))]
    pub new_password_confirmation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(custom(function = validation::validate_otp_code))]
    pub code: String,

    #[validate(
        length(
            min = password::MIN_LENGTH,
            max = password::MAX_LENGTH,
            message = "New password must be between 8 and 128 characters"
        ),
        custom(function = validation::validate_password_strength)
    )]
    pub new_password: String,
}

// --- レスポンスDTO ---

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub account: AuthClaims,
    pub tokens: TokenPair,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `/auth/me` の応答。どちらのモデルでも同じ形にそろえる
#[derive(Debug, Clone, Serialize)]
pub struct CurrentAccountResponse {
    #[serde(flatten)]
    pub account: AuthClaims,
    pub phone: Option<String>,
    pub email_verified: bool,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// スタッフ・医師アカウントに紐づく職員レコード
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personnel_id: Option<Uuid>,
}

impl CurrentAccountResponse {
    pub fn from_user(user: &user_model::Model, personnel_id: Option<Uuid>) -> Self {
        Self {
            account: user.to_auth_claims(),
            phone: user.phone.clone(),
            email_verified: user.email_verified,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
            personnel_id,
        }
    }

    pub fn from_admin(admin: &admin_model::Model) -> Self {
        Self {
            account: admin.to_auth_claims(),
            phone: None,
            email_verified: true,
            is_active: admin.is_active,
            last_login_at: admin.last_login_at,
            created_at: admin.created_at,
            personnel_id: None,
        }
    }
}
