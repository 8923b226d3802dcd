//! Record definitions persisted by the portal stores.
//!
//! Every record serializes with camelCase field names so payloads written by
//! the browser build of the portal (`subjectId`, `createdAt`, ...) load
//! unchanged. Timestamps are RFC 3339 strings and ids are UUID v4 strings.
//!
//! # Example
//!
//! ```rust
//! use portal_store_core::portal_model::Like;
//!
//! let like = Like::new("1042", "2077", 2026);
//! let json = serde_json::to_string(&like)?;
//! assert!(json.contains("\"subjectId\":\"1042\""));
//!
//! let back: Like = serde_json::from_str(&json)?;
//! assert_eq!(like, back);
//! # Ok::<(), serde_json::Error>(())
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single "like" left by `author_id` on the birthday card of `subject_id`.
///
/// At most one like exists per `(subject_id, author_id, year)`; the
/// [`LikeLedger`](crate::like_ledger::LikeLedger) enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: String,
    pub subject_id: String,
    pub author_id: String,
    pub year: i32,
    pub created_at: DateTime<Utc>,
}

impl Like {
    pub fn new(subject_id: impl Into<String>, author_id: impl Into<String>, year: i32) -> Self {
        Like {
            id: Uuid::new_v4().to_string(),
            subject_id: subject_id.into(),
            author_id: author_id.into(),
            year,
            created_at: Utc::now(),
        }
    }

    pub fn matches(&self, subject_id: &str, author_id: &str, year: i32) -> bool {
        self.subject_id == subject_id && self.author_id == author_id && self.year == year
    }
}

/// A message left on a birthday card.
///
/// Comments are never edited in place, so `updated_at` always equals
/// `created_at` for records written by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub subject_id: String,
    pub author_id: String,
    pub author_display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar: Option<String>,
    pub message: String,
    pub year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied part of a comment; the ledger fills in id, year and times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub subject_id: String,
    pub author_id: String,
    pub author_display_name: String,
    #[serde(default)]
    pub author_avatar: Option<String>,
    pub message: String,
}

/// The signed-in employee, as persisted by the login screen.
///
/// Field names follow the portal's session record (`matricula` is the
/// employee id, `nome` the display name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub matricula: String,
    pub nome: String,
    #[serde(default)]
    pub cpf: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub data_nascimento: Option<String>,
    pub login_timestamp: DateTime<Utc>,
}

/// Row returned by the remote employee query: active employees with a
/// non-null birth date (`YYYY-MM-DD`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub matricula: String,
    pub nome: String,
    pub data_nascimento: String,
    #[serde(default)]
    pub departamento: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Vacation balance of one employee for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacationBalance {
    pub employee_id: String,
    pub year: i32,
    pub available_days: u32,
    pub used_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// A request filed through the portal (vacation, certificate, voucher...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalRequest {
    pub id: String,
    pub employee_id: String,
    pub kind: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl PortalRequest {
    pub fn new(employee_id: impl Into<String>, kind: impl Into<String>) -> Self {
        PortalRequest {
            id: Uuid::new_v4().to_string(),
            employee_id: employee_id.into(),
            kind: kind.into(),
            status: RequestStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
