//! Session domain model.
//!
//! One record per active login. The `hash` field is the rotating secret a
//! refresh token must present; at any instant the stored value is the only
//! one accepted, and rotation permanently invalidates its predecessor.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Id;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Id,
    pub user_id: Id,
    #[serde(skip_serializing)]
    pub hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Fields for creating a session. The store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: Id,
    pub hash: String,
}

/// Partial update payload for a session.
///
/// Id and timestamp fields are absent by construction; a `None` field is
/// left untouched.
#[derive(Debug, Clone, Default)]
pub struct SessionChanges {
    pub user_id: Option<Id>,
    pub hash: Option<String>,
}
