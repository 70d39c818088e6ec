//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Id;

/// Opaque reference to a role record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub i32);

impl RoleId {
    pub const ADMIN: Self = Self(1);
    pub const USER: Self = Self(2);
}

/// Opaque reference to a status record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusId(pub i32);

impl StatusId {
    pub const ACTIVE: Self = Self(1);
    pub const INACTIVE: Self = Self(2);
}

/// A registered account.
///
/// `password_hash` is `None` for accounts without a local credential
/// (social-only logins); such accounts must fail password login instead of
/// comparing against nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub social_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<RoleId>,
    pub status: Option<StatusId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Fields for creating a user. The store assigns id and timestamps.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub social_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<RoleId>,
    pub status: Option<StatusId>,
}

/// Partial update payload for a user.
///
/// Id and timestamp fields are absent by construction; a `None` field is
/// left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<RoleId>,
    pub status: Option<StatusId>,
}
