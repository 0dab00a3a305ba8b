// src/api/dto/user_dto.rs

use crate::domain::account::UserRole;
use crate::types::{deserialize_optional_bool_from_string, PaginationQuery};
use crate::utils::validation::{self, name, password};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// ユーザー一覧の検索条件
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    pub search: Option<String>,
    pub role: Option<UserRole>,
    #[serde(default, deserialize_with = "deserialize_optional_bool_from_string")]
    pub is_active: Option<bool>,
}

/// 管理者によるスタッフ・医師アカウントの作成
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
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

    pub role: UserRole,

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

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(
        min = name::MIN_LENGTH,
        max = name::MAX_LENGTH,
        message = "First name must be between 1 and 100 characters"
    ))]
    pub first_name: Option<String>,

    #[validate(length(
        min = name::MIN_LENGTH,
        max = name::MAX_LENGTH,
        message = "Last name must be between 1 and 100 characters"
    ))]
    pub last_name: Option<String>,

    #[validate(custom(function = validation::validate_phone))]
    pub phone: Option<String>,

    pub role: Option<UserRole>,
}

impl UpdateUserRequest {
    pub fn has_changes(&self) -> bool {
        self.email.is_some()
            || self.first_name.is_some()
            || self.last_name.is_some()
            || self.phone.is_some()
            || self.role.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserStatusRequest {
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_has_changes() {
        assert!(!UpdateUserRequest::default().has_changes());
        let request = UpdateUserRequest {
            role: Some(UserRole::Doctor),
            ..Default::default()
        };
        assert!(request.has_changes());
    }

    #[test]
    fn test_list_query_from_strings() {
        let query: UserListQuery =
            serde_json::from_str(r#"{"page":"2","role":"staff","is_active":"false"}"#).unwrap();
        assert_eq!(query.pagination.page, 2);
        assert_eq!(query.role, Some(UserRole::Staff));
        assert_eq!(query.is_active, Some(false));
    }
}
