//! SQLite-backed store: messages, summaries, settings and profiles.
//!
//! Uses SqlitePoolManager and the models. Multi-statement writes (message append, context
//! clear) run in a transaction whose first statement is a write, so concurrent writers wait
//! on the busy timeout instead of failing a lock upgrade.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::error::StorageResult;
use crate::models::{
    BackupSnapshot, ClearedCounts, ConversationMessage, ConversationSummary, NewSummary, Role,
    SettingRecord, UserProfile,
};
use crate::models::{message::MessageRow, profile::ProfileRow};
use crate::repository::{ContextStore, ProfileStore, SettingsStore};
use crate::sqlite_pool::SqlitePoolManager;

const MESSAGE_COLUMNS: &str = "id, user_id, role, content, created_at";
const SUMMARY_COLUMNS: &str = "id, user_id, summary_text, start_message_id, end_message_id, \
     start_timestamp, end_timestamp, created_at";
const PROFILE_COLUMNS: &str = "user_id, username, full_name, telegram_nick, occupation, skills, \
     company_info, about, updated_at";

#[derive(Clone)]
pub struct SqliteContextStore {
    pool_manager: SqlitePoolManager,
}

impl SqliteContextStore {
    /// Opens (or creates) the database and ensures the schema exists.
    pub async fn new(database_url: &str) -> StorageResult<Self> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        let store = Self { pool_manager };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> StorageResult<()> {
        info!("Creating database tables if not exist");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS summaries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                summary_text TEXT NOT NULL,
                start_message_id INTEGER NOT NULL,
                end_message_id INTEGER NOT NULL,
                start_timestamp TEXT NOT NULL,
                end_timestamp TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id INTEGER PRIMARY KEY,
                username TEXT,
                full_name TEXT,
                telegram_nick TEXT,
                occupation TEXT,
                skills TEXT NOT NULL DEFAULT '[]',
                company_info TEXT,
                about TEXT,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_messages_user_id ON messages(user_id, id);
            CREATE INDEX IF NOT EXISTS idx_summaries_user_id ON summaries(user_id, id);
            "#,
        )
        .execute(pool)
        .await?;

        info!("Database tables created successfully");
        Ok(())
    }

    async fn fetch_messages(
        &self,
        sql: &str,
        user_id: Option<i64>,
    ) -> StorageResult<Vec<ConversationMessage>> {
        let mut query = sqlx::query_as::<_, MessageRow>(sql);
        if let Some(user_id) = user_id {
            query = query.bind(user_id);
        }
        query
            .fetch_all(self.pool_manager.pool())
            .await?
            .into_iter()
            .map(ConversationMessage::try_from)
            .collect()
    }

    async fn fetch_profiles(&self, sql: &str) -> StorageResult<Vec<UserProfile>> {
        sqlx::query_as::<_, ProfileRow>(sql)
            .fetch_all(self.pool_manager.pool())
            .await?
            .into_iter()
            .map(UserProfile::try_from)
            .collect()
    }
}

#[async_trait]
impl ContextStore for SqliteContextStore {
    #[instrument(skip(self, content))]
    async fn append_message(
        &self,
        user_id: i64,
        role: Role,
        content: &str,
    ) -> StorageResult<ConversationMessage> {
        let now = Utc::now();
        let mut tx = self.pool_manager.pool().begin().await?;

        let id = sqlx::query(
            "INSERT INTO messages (user_id, role, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(role.as_str())
        .bind(content)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let previous: Option<(DateTime<Utc>,)> = sqlx::query_as(
            "SELECT created_at FROM messages WHERE user_id = ? AND id < ? ORDER BY id DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        // Clock stepped back: keep per-user timestamps non-decreasing.
        let timestamp = match previous {
            Some((prev,)) if prev > now => {
                sqlx::query("UPDATE messages SET created_at = ? WHERE id = ?")
                    .bind(prev)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                prev
            }
            _ => now,
        };

        tx.commit().await?;

        info!(
            user_id = user_id,
            message_id = id,
            role = %role,
            content_len = content.len(),
            "Saved message"
        );

        Ok(ConversationMessage {
            id,
            user_id,
            role,
            content: content.to_string(),
            timestamp,
        })
    }

    async fn load_messages(&self, user_id: i64) -> StorageResult<Vec<ConversationMessage>> {
        let sql = format!(
            "SELECT {} FROM messages WHERE user_id = ? ORDER BY id ASC",
            MESSAGE_COLUMNS
        );
        let messages = self.fetch_messages(&sql, Some(user_id)).await?;
        info!(user_id = user_id, message_count = messages.len(), "Loaded messages");
        Ok(messages)
    }

    #[instrument(skip(self, summary))]
    async fn append_summary(
        &self,
        user_id: i64,
        summary: NewSummary,
    ) -> StorageResult<ConversationSummary> {
        let created_at = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO summaries (user_id, summary_text, start_message_id, end_message_id, start_timestamp, end_timestamp, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&summary.summary_text)
        .bind(summary.start_message_id)
        .bind(summary.end_message_id)
        .bind(summary.start_timestamp)
        .bind(summary.end_timestamp)
        .bind(created_at)
        .execute(self.pool_manager.pool())
        .await?
        .last_insert_rowid();

        info!(
            user_id = user_id,
            summary_id = id,
            start_message_id = summary.start_message_id,
            end_message_id = summary.end_message_id,
            "Saved summary"
        );

        Ok(ConversationSummary {
            id,
            user_id,
            summary_text: summary.summary_text,
            start_message_id: summary.start_message_id,
            end_message_id: summary.end_message_id,
            start_timestamp: summary.start_timestamp,
            end_timestamp: summary.end_timestamp,
            created_at,
        })
    }

    async fn load_summaries(&self, user_id: i64) -> StorageResult<Vec<ConversationSummary>> {
        let sql = format!(
            "SELECT {} FROM summaries WHERE user_id = ? ORDER BY id ASC",
            SUMMARY_COLUMNS
        );
        let summaries = sqlx::query_as::<_, ConversationSummary>(&sql)
            .bind(user_id)
            .fetch_all(self.pool_manager.pool())
            .await?;
        Ok(summaries)
    }

    async fn latest_summary(&self, user_id: i64) -> StorageResult<Option<ConversationSummary>> {
        let sql = format!(
            "SELECT {} FROM summaries WHERE user_id = ? ORDER BY id DESC LIMIT 1",
            SUMMARY_COLUMNS
        );
        let summary = sqlx::query_as::<_, ConversationSummary>(&sql)
            .bind(user_id)
            .fetch_optional(self.pool_manager.pool())
            .await?;
        Ok(summary)
    }

    async fn count_messages(&self, user_id: i64) -> StorageResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.pool_manager.pool())
            .await?;
        Ok(count)
    }

    async fn count_summaries(&self, user_id: i64) -> StorageResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM summaries WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.pool_manager.pool())
            .await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn clear_user(&self, user_id: i64) -> StorageResult<ClearedCounts> {
        let mut tx = self.pool_manager.pool().begin().await?;

        let messages = sqlx::query("DELETE FROM messages WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let summaries = sqlx::query("DELETE FROM summaries WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        info!(
            user_id = user_id,
            messages = messages,
            summaries = summaries,
            "Cleared user context"
        );
        Ok(ClearedCounts { messages, summaries })
    }

    /// All tables read inside one transaction, so the dump is a single consistent snapshot.
    async fn export_snapshot(&self) -> StorageResult<BackupSnapshot> {
        let mut tx = self.pool_manager.pool().begin().await?;

        let messages = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {} FROM messages ORDER BY id ASC",
            MESSAGE_COLUMNS
        ))
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(ConversationMessage::try_from)
        .collect::<StorageResult<Vec<_>>>()?;
        let summaries = sqlx::query_as::<_, ConversationSummary>(&format!(
            "SELECT {} FROM summaries ORDER BY id ASC",
            SUMMARY_COLUMNS
        ))
        .fetch_all(&mut *tx)
        .await?;
        let settings = sqlx::query_as::<_, SettingRecord>(
            "SELECT key, value, updated_at FROM settings ORDER BY key ASC",
        )
        .fetch_all(&mut *tx)
        .await?;
        let profiles = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM profiles ORDER BY user_id ASC",
            PROFILE_COLUMNS
        ))
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(UserProfile::try_from)
        .collect::<StorageResult<Vec<_>>>()?;

        tx.commit().await?;

        info!(
            messages = messages.len(),
            summaries = summaries.len(),
            settings = settings.len(),
            profiles = profiles.len(),
            "Exported snapshot"
        );

        Ok(BackupSnapshot {
            exported_at: Utc::now(),
            messages,
            summaries,
            settings,
            profiles,
        })
    }
}

#[async_trait]
impl SettingsStore for SqliteContextStore {
    async fn get_setting(&self, key: &str) -> StorageResult<Option<String>> {
        let value: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool_manager.pool())
            .await?;
        Ok(value.map(|(v,)| v))
    }

    async fn put_setting(&self, key: &str, value: &str) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(self.pool_manager.pool())
        .await?;
        info!(key = %key, value_len = value.len(), "Saved setting");
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for SqliteContextStore {
    async fn upsert_profile(&self, profile: &UserProfile) -> StorageResult<()> {
        let skills = serde_json::to_string(&profile.skills)?;
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, username, full_name, telegram_nick, occupation, skills, company_info, about, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                username = excluded.username,
                full_name = excluded.full_name,
                telegram_nick = excluded.telegram_nick,
                occupation = excluded.occupation,
                skills = excluded.skills,
                company_info = excluded.company_info,
                about = excluded.about,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(profile.user_id)
        .bind(&profile.username)
        .bind(&profile.full_name)
        .bind(&profile.telegram_nick)
        .bind(&profile.occupation)
        .bind(skills)
        .bind(&profile.company_info)
        .bind(&profile.about)
        .bind(profile.updated_at)
        .execute(self.pool_manager.pool())
        .await?;
        info!(user_id = profile.user_id, complete = profile.is_complete(), "Saved profile");
        Ok(())
    }

    async fn get_profile(&self, user_id: i64) -> StorageResult<Option<UserProfile>> {
        let sql = format!("SELECT {} FROM profiles WHERE user_id = ?", PROFILE_COLUMNS);
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(user_id)
            .fetch_optional(self.pool_manager.pool())
            .await?;
        row.map(UserProfile::try_from).transpose()
    }

    async fn list_complete_profiles(&self) -> StorageResult<Vec<UserProfile>> {
        let profiles = self
            .fetch_profiles(&format!(
                "SELECT {} FROM profiles ORDER BY full_name ASC, user_id ASC",
                PROFILE_COLUMNS
            ))
            .await?;
        Ok(profiles.into_iter().filter(UserProfile::is_complete).collect())
    }

    async fn find_profile_by_nick(&self, nick: &str) -> StorageResult<Option<UserProfile>> {
        let sql = format!(
            "SELECT {} FROM profiles WHERE lower(ltrim(telegram_nick, '@')) = lower(?) ORDER BY user_id ASC LIMIT 1",
            PROFILE_COLUMNS
        );
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(nick.trim().trim_start_matches('@'))
            .fetch_optional(self.pool_manager.pool())
            .await?;
        row.map(UserProfile::try_from).transpose()
    }
}
