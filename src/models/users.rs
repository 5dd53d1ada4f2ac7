use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    Dentist,
    Patient,
}

impl Role {
    /// Whether a caller with this role may use routes that require `required`.
    /// Admins pass every role check.
    pub fn permits(self, required: Role) -> bool {
        self == Role::Admin || self == required
    }
}

/// Identity of the caller, built from the access token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub role: Role,
}

impl RequestContext {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub age: Option<i32>,
    pub phone: Option<String>,
    pub photo: Option<String>,
    /// Owning dentist, set for patients created by a dentist.
    pub dentist_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User projection returned over the API (no password hash).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub age: Option<i32>,
    pub phone: Option<String>,
    pub photo: Option<String>,
    pub dentist_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            age: user.age,
            phone: user.phone,
            photo: user.photo,
            dentist_id: user.dentist_id,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub age: Option<i32>,
    pub phone: Option<String>,
    pub photo: Option<String>,
    pub dentist_id: Option<Uuid>,
}

/// Public dentist signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterDentist {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Account created by an admin. A temporary password is generated when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password: Option<String>,
}

/// Patient created by a dentist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePatient {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub age: Option<i32>,
    pub phone: Option<String>,
    /// Upload path of the profile photo, already stored.
    pub photo: Option<String>,
}

/// A freshly created account. `temporary_password` is set only when the
/// password was generated, so it can be handed to the account owner once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedAccount {
    pub user: PublicUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginUser {
    pub email: String,
    pub password: String,
    /// When present, the account must have this role.
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResult {
    pub user: PublicUser,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPassword {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<Role>,
}
