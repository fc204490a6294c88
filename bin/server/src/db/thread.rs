//! Postgres repository for threads and their messages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use penwise_ai::MessageRole;
use penwise_assistant::{
    ListThreadsQuery, NewThread, Thread, ThreadMessage, ThreadStatus, ThreadStore,
    ThreadStoreError,
};
use penwise_core::{MessageId, ThreadId, UserId};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

fn decode_error(message: String) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message,
    )))
}

fn storage_failed(err: sqlx::Error) -> ThreadStoreError {
    tracing::error!(error = %err, "thread storage query failed");
    ThreadStoreError::StorageFailed {
        reason: err.to_string(),
    }
}

/// Row type for thread queries.
#[derive(FromRow)]
struct ThreadRow {
    id: String,
    user_id: String,
    title: Option<String>,
    summary: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl ThreadRow {
    fn try_into_thread(self) -> Result<Thread, sqlx::Error> {
        let id = ThreadId::from_str(&self.id)
            .map_err(|e| decode_error(format!("invalid thread id '{}': {}", self.id, e)))?;
        let status = ThreadStatus::from_str(&self.status).map_err(decode_error)?;

        Ok(Thread {
            id,
            user_id: UserId::new(self.user_id),
            title: self.title,
            summary: self.summary,
            status,
            created_at: self.created_at,
        })
    }
}

/// Row type for thread message queries.
#[derive(FromRow)]
struct MessageRow {
    id: String,
    thread_id: String,
    role: String,
    content: String,
    tool_result: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn try_into_message(self) -> Result<ThreadMessage, sqlx::Error> {
        let id = MessageId::from_str(&self.id)
            .map_err(|e| decode_error(format!("invalid message id '{}': {}", self.id, e)))?;
        let thread_id = ThreadId::from_str(&self.thread_id).map_err(|e| {
            decode_error(format!("invalid thread id '{}': {}", self.thread_id, e))
        })?;
        let role = match self.role.as_str() {
            "user" => MessageRole::User,
            "assistant" => MessageRole::Assistant,
            other => return Err(decode_error(format!("unknown message role '{other}'"))),
        };

        Ok(ThreadMessage {
            id,
            thread_id,
            role,
            content: self.content,
            tool_result: self.tool_result,
            created_at: self.created_at,
        })
    }
}

/// Thread store backed by Postgres.
pub struct PgThreadStore {
    pool: PgPool,
}

impl PgThreadStore {
    /// Creates a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn cursor_seq(&self, user_id: &UserId, cursor: ThreadId) -> Result<i64, ThreadStoreError> {
        let seq: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT seq
            FROM threads
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(cursor.to_string())
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_failed)?;

        seq.ok_or(ThreadStoreError::InvalidCursor { cursor })
    }
}

#[async_trait]
impl ThreadStore for PgThreadStore {
    async fn create(&self, new: NewThread) -> Result<Thread, ThreadStoreError> {
        let thread = Thread::new(new);

        sqlx::query(
            r#"
            INSERT INTO threads (id, user_id, title, summary, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(thread.id.to_string())
        .bind(thread.user_id.as_str())
        .bind(&thread.title)
        .bind(&thread.summary)
        .bind(thread.status.as_str())
        .bind(thread.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage_failed)?;

        Ok(thread)
    }

    async fn get(&self, id: ThreadId) -> Result<Option<Thread>, ThreadStoreError> {
        let row: Option<ThreadRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, title, summary, status, created_at
            FROM threads
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_failed)?;

        row.map(ThreadRow::try_into_thread)
            .transpose()
            .map_err(storage_failed)
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        query: &ListThreadsQuery,
    ) -> Result<Vec<Thread>, ThreadStoreError> {
        let before_seq = match query.cursor {
            Some(cursor) => Some(self.cursor_seq(user_id, cursor).await?),
            None => None,
        };
        let limit = query.limit().map(|n| i64::try_from(n).unwrap_or(i64::MAX));

        let rows: Vec<ThreadRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, title, summary, status, created_at
            FROM threads
            WHERE user_id = $1
              AND ($2::BIGINT IS NULL OR seq < $2)
            ORDER BY seq DESC
            LIMIT $3
            "#,
        )
        .bind(user_id.as_str())
        .bind(before_seq)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_failed)?;

        rows.into_iter()
            .map(ThreadRow::try_into_thread)
            .collect::<Result<_, _>>()
            .map_err(storage_failed)
    }

    async fn append_messages(
        &self,
        thread_id: ThreadId,
        messages: &[ThreadMessage],
    ) -> Result<(), ThreadStoreError> {
        let mut tx = self.pool.begin().await.map_err(storage_failed)?;

        for message in messages {
            let result = sqlx::query(
                r#"
                INSERT INTO thread_messages (id, thread_id, role, content, tool_result, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(message.id.to_string())
            .bind(thread_id.to_string())
            .bind(message.role.as_str())
            .bind(&message.content)
            .bind(&message.tool_result)
            .bind(message.created_at)
            .execute(&mut *tx)
            .await;

            match result {
                Ok(_) => {}
                Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                    return Err(ThreadStoreError::ThreadNotFound { id: thread_id });
                }
                Err(e) => return Err(storage_failed(e)),
            }
        }

        tx.commit().await.map_err(storage_failed)
    }

    async fn recent_messages(
        &self,
        thread_id: ThreadId,
        limit: usize,
    ) -> Result<Vec<ThreadMessage>, ThreadStoreError> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"
            SELECT id, thread_id, role, content, tool_result, created_at
            FROM (
                SELECT seq, id, thread_id, role, content, tool_result, created_at
                FROM thread_messages
                WHERE thread_id = $1
                ORDER BY seq DESC
                LIMIT $2
            ) recent
            ORDER BY seq ASC
            "#,
        )
        .bind(thread_id.to_string())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_failed)?;

        rows.into_iter()
            .map(MessageRow::try_into_message)
            .collect::<Result<_, _>>()
            .map_err(storage_failed)
    }
}
