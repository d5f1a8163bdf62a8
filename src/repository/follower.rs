use sqlx::SqlitePool;
use tracing::instrument;

#[derive(Debug, Clone)]
#[must_use]
pub struct FollowerRepository {
    pub(super) connection: SqlitePool,
}

impl FollowerRepository {
    /// Returns `false` when `who_id` already followed `whom_id`.
    #[instrument(skip(self), err(Debug))]
    pub async fn follow(&self, who_id: i64, whom_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("INSERT OR IGNORE INTO follower (who_id, whom_id) VALUES (?, ?)")
            .bind(who_id)
            .bind(whom_id)
            .execute(&self.connection)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `false` when there was nothing to remove.
    #[instrument(skip(self), err(Debug))]
    pub async fn unfollow(&self, who_id: i64, whom_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM follower WHERE who_id = ? AND whom_id = ?")
            .bind(who_id)
            .bind(whom_id)
            .execute(&self.connection)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err(Debug))]
    pub async fn is_following(&self, who_id: i64, whom_id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM follower WHERE who_id = ? AND whom_id = ?)",
        )
        .bind(who_id)
        .bind(whom_id)
        .fetch_one(&self.connection)
        .await
    }
}
