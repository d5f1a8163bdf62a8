use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

use crate::models::{Message, User};

/// Maximum number of messages on any timeline page.
pub const PER_PAGE: i64 = 30;

/// A message joined with its author.
#[derive(sqlx::FromRow, Clone, Debug)]
struct TimelineRow {
    message_id: i64,
    author_id: i64,
    text: String,
    pub_date: i64,
    flagged: bool,
    username: String,
    email: String,
}

impl TryFrom<TimelineRow> for Message {
    type Error = sqlx::Error;

    fn try_from(row: TimelineRow) -> Result<Self, Self::Error> {
        let pub_date = DateTime::<Utc>::from_timestamp(row.pub_date, 0).ok_or_else(|| {
            sqlx::Error::Decode(format!("pub_date {} is out of range", row.pub_date).into())
        })?;

        Ok(Self {
            message_id: row.message_id,
            author: User {
                user_id: row.author_id,
                username: row.username,
                email: row.email,
            },
            text: row.text,
            pub_date,
            flagged: row.flagged,
        })
    }
}

fn into_messages(rows: Vec<TimelineRow>) -> Result<Vec<Message>, sqlx::Error> {
    rows.into_iter().map(Message::try_from).collect()
}

#[derive(Debug, Clone)]
#[must_use]
pub struct MessageRepository {
    pub(super) connection: SqlitePool,
}

impl MessageRepository {
    #[instrument(skip(self), err(Debug))]
    pub async fn public_timeline(&self, limit: i64) -> Result<Vec<Message>, sqlx::Error> {
        let query = sqlx::query_as::<_, TimelineRow>(
            r"
                SELECT m.message_id, m.author_id, m.text, m.pub_date, m.flagged, u.username, u.email
                FROM message m
                JOIN user u ON u.user_id = m.author_id
                WHERE m.flagged = 0
                ORDER BY m.pub_date DESC, m.message_id DESC
                LIMIT ?
            ",
        )
        .bind(limit);
        into_messages(query.fetch_all(&self.connection).await?)
    }

    /// Messages by the user and everyone they follow.
    #[instrument(skip(self), err(Debug))]
    pub async fn personal_timeline(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let query = sqlx::query_as::<_, TimelineRow>(
            r"
                SELECT m.message_id, m.author_id, m.text, m.pub_date, m.flagged, u.username, u.email
                FROM message m
                JOIN user u ON u.user_id = m.author_id
                WHERE m.flagged = 0 AND (
                    u.user_id = ? OR
                    u.user_id IN (SELECT whom_id FROM follower WHERE who_id = ?)
                )
                ORDER BY m.pub_date DESC, m.message_id DESC
                LIMIT ?
            ",
        )
        .bind(user_id)
        .bind(user_id)
        .bind(limit);
        into_messages(query.fetch_all(&self.connection).await?)
    }

    #[instrument(skip(self), err(Debug))]
    pub async fn user_timeline(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let query = sqlx::query_as::<_, TimelineRow>(
            r"
                SELECT m.message_id, m.author_id, m.text, m.pub_date, m.flagged, u.username, u.email
                FROM message m
                JOIN user u ON u.user_id = m.author_id
                WHERE m.flagged = 0 AND u.user_id = ?
                ORDER BY m.pub_date DESC, m.message_id DESC
                LIMIT ?
            ",
        )
        .bind(user_id)
        .bind(limit);
        into_messages(query.fetch_all(&self.connection).await?)
    }

    #[instrument(skip(self, text), err(Debug))]
    pub async fn add(&self, author_id: i64, text: &str) -> Result<i64, sqlx::Error> {
        let message_id: i64 = sqlx::query_scalar(
            "INSERT INTO message (author_id, text, pub_date, flagged) VALUES (?, ?, ?, 0) RETURNING message_id",
        )
        .bind(author_id)
        .bind(text)
        .bind(Utc::now().timestamp())
        .fetch_one(&self.connection)
        .await?;
        tracing::debug!(message_id, "Recorded new message");
        Ok(message_id)
    }
}
