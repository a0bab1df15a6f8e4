//! Community member profile, used to build the directory block of the system instructions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub telegram_nick: Option<String>,
    pub occupation: Option<String>,
    pub skills: Vec<String>,
    pub company_info: Option<String>,
    pub about: Option<String>,
    pub updated_at: DateTime<Utc>,
}

fn filled(field: &Option<String>) -> bool {
    field.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

impl UserProfile {
    /// Empty profile for `user_id`.
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            username: None,
            full_name: None,
            telegram_nick: None,
            occupation: None,
            skills: Vec::new(),
            company_info: None,
            about: None,
            updated_at: Utc::now(),
        }
    }

    /// Name, nick, occupation and at least one skill are present.
    pub fn is_complete(&self) -> bool {
        filled(&self.full_name)
            && filled(&self.telegram_nick)
            && filled(&self.occupation)
            && self.skills.iter().any(|s| !s.trim().is_empty())
    }
}

/// Raw `profiles` row; skills are a JSON array.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProfileRow {
    pub user_id: i64,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub telegram_nick: Option<String>,
    pub occupation: Option<String>,
    pub skills: String,
    pub company_info: Option<String>,
    pub about: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for UserProfile {
    type Error = StorageError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: row.user_id,
            username: row.username,
            full_name: row.full_name,
            telegram_nick: row.telegram_nick,
            occupation: row.occupation,
            skills: serde_json::from_str(&row.skills)?,
            company_info: row.company_info,
            about: row.about,
            updated_at: row.updated_at,
        })
    }
}
