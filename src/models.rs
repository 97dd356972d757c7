use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// Item
///
/// The sole domain resource, stored in the `items` table.
/// The `id` is allocated by the store (`AUTOINCREMENT`) and is never supplied by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Item {
    #[ts(type = "number")]
    pub id: i64,
    pub item_name: String,
    // No range check: negative and zero prices are stored as given.
    pub price: f64,
    // Free-form, no format validation.
    pub phone: String,
}

/// User
///
/// The persisted account record from the `users` table. Carries the password hash,
/// so it is never serialized directly; responses go through [`UserRead`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_superuser: bool,
}

// --- Request Payloads (Input Validation) ---

/// CreateItemRequest
///
/// Payload for `POST /items/`. All three fields are required; a missing field or a
/// wrong JSON type is rejected before the store is touched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateItemRequest {
    pub item_name: String,
    pub price: f64,
    pub phone: String,
}

/// RegisterUserRequest
///
/// Payload for `POST /auth/register`. New accounts start active, unverified and
/// without superuser rights.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
}

/// LoginForm
///
/// Form-encoded credentials for `POST /auth/jwt/login`. The `username` field carries
/// the account email.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// UpdateUserRequest
///
/// Superuser payload for `PATCH /users/{id}`. Only provided flags are changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_superuser: Option<bool>,
}

/// UpdateMeRequest
///
/// Payload for `PATCH /users/me`. A user may change their own email and password but
/// never their flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateMeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// ForgotPasswordRequest
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// ResetPasswordRequest
///
/// Redeems a reset token issued by `POST /auth/forgot-password`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

// --- Response DTOs ---

/// UserRead
///
/// Public view of a [`User`], without the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserRead {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_superuser: bool,
}

impl From<User> for UserRead {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            is_verified: user.is_verified,
            is_superuser: user.is_superuser,
        }
    }
}

/// DeleteItemResponse
///
/// Acknowledgement returned by `DELETE /items/{id}`. The same shape is returned whether
/// or not the item existed. `status_code` always mirrors the HTTP status actually sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeleteItemResponse {
    pub detail: String,
    pub status_code: u16,
}

impl DeleteItemResponse {
    pub fn deleted() -> Self {
        Self {
            detail: "item deleted".to_string(),
            status_code: 200,
        }
    }
}

/// ErrorBody
///
/// Uniform error envelope: `{"detail": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}
