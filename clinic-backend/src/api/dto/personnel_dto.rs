// src/api/dto/personnel_dto.rs

use crate::domain::personnel_model::{self, PersonnelPosition};
use crate::types::{deserialize_optional_bool_from_string, PaginationQuery};
use crate::utils::validation::{self, name, text};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonnelListQuery {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    pub position: Option<PersonnelPosition>,
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_bool_from_string")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePersonnelRequest {
    /// ログインアカウントと紐づける場合のユーザーID
    pub user_id: Option<Uuid>,

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

    pub position: PersonnelPosition,

    #[validate(length(
        max = text::SHORT_MAX_LENGTH,
        message = "Specialization must be 255 characters or less"
    ))]
    pub specialization: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(custom(function = validation::validate_phone))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePersonnelRequest {
    pub user_id: Option<Uuid>,

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

    pub position: Option<PersonnelPosition>,

    #[validate(length(
        max = text::SHORT_MAX_LENGTH,
        message = "Specialization must be 255 characters or less"
    ))]
    pub specialization: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(custom(function = validation::validate_phone))]
    pub phone: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonnelResponse {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub position: String,
    pub specialization: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<personnel_model::Model> for PersonnelResponse {
    fn from(personnel: personnel_model::Model) -> Self {
        Self {
            full_name: personnel.full_name(),
            id: personnel.id,
            user_id: personnel.user_id,
            first_name: personnel.first_name,
            last_name: personnel.last_name,
            position: personnel.position,
            specialization: personnel.specialization,
            email: personnel.email,
            phone: personnel.phone,
            is_active: personnel.is_active,
            created_at: personnel.created_at,
            updated_at: personnel.updated_at,
        }
    }
}
