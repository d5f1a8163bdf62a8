use super::CODE_NON_UNIQUE;
use crate::auth::password;
use crate::models::User;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::instrument;
use uuid::Uuid;

/// Sessions older than this no longer authenticate.
pub const SESSION_LIFETIME_SECS: i64 = 30 * 24 * 60 * 60;

fn session_cutoff() -> i64 {
    Utc::now().timestamp() - SESSION_LIFETIME_SECS
}

#[derive(sqlx::FromRow, Clone, Debug, PartialEq, Eq)]
struct Credentials {
    user_id: i64,
    pw_hash: String,
}

#[derive(sqlx::FromRow, Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub session_id: i64,
    pub token: String,
    pub user_id: i64,
    pub created_at: i64,
    pub expired: bool,
}

#[derive(Debug, Clone)]
#[must_use]
pub struct UserRepository {
    pub(super) connection: SqlitePool,
}

impl UserRepository {
    #[instrument(skip(self), err(Debug))]
    pub async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT user_id, username, email FROM user WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.connection)
            .await
    }

    #[instrument(skip(self), err(Debug))]
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        tracing::trace!("Searching for user in the repository");
        sqlx::query_as::<_, User>("SELECT user_id, username, email FROM user WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.connection)
            .await
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, RegistrationError> {
        let password_hash = password::hash(password)
            .inspect_err(|error| tracing::error!(?error, "Failed to hash password"))
            .map_err(RegistrationError::Hash)?;

        let query = sqlx::query_as::<_, User>(
            "INSERT INTO user (username, email, pw_hash) VALUES (?, ?, ?) RETURNING user_id, username, email",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash);

        query
            .fetch_one(&self.connection)
            .await
            .inspect(|user| tracing::debug!(user_id = user.user_id, "Registered new user"))
            .map_err(|error| match error {
                sqlx::Error::Database(error)
                    if error.code().is_some_and(|code| CODE_NON_UNIQUE == code) =>
                {
                    tracing::debug!(?error, "Rejecting registration: username is taken");
                    RegistrationError::NameTaken
                }
                _ => {
                    tracing::error!(?error, "Database error during registration");
                    RegistrationError::Database(error)
                }
            })
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, LoginError> {
        let query = sqlx::query_as::<_, Credentials>(
            "SELECT user_id, pw_hash FROM user WHERE username = ?",
        )
        .bind(username);

        let credentials = query
            .fetch_optional(&self.connection)
            .await
            .inspect_err(|error| tracing::error!(?error, "Database error during login"))?
            .ok_or_else(|| {
                tracing::debug!("Rejecting login attempt: unknown username");
                LoginError::InvalidUsername
            })?;

        let matches = password::verify(password, &credentials.pw_hash)
            .inspect_err(|error| tracing::error!(?error, "Failed to verify password hash"))
            .map_err(LoginError::Hash)?;
        if !matches {
            tracing::debug!("Rejecting login attempt: wrong password");
            return Err(LoginError::InvalidPassword);
        }

        let purged = sqlx::query(
            "DELETE FROM session WHERE user_id = ? AND (expired = 1 OR created_at <= ?)",
        )
        .bind(credentials.user_id)
        .bind(session_cutoff())
        .execute(&self.connection)
        .await?
        .rows_affected();
        if purged > 0 {
            tracing::debug!(purged, "Removed stale sessions");
        }

        let session_token = Uuid::new_v4().to_string();
        let created_session = sqlx::query_as::<_, Session>(
            "INSERT INTO session (token, user_id, created_at) VALUES (?, ?, ?) RETURNING *",
        )
        .bind(session_token)
        .bind(credentials.user_id)
        .bind(Utc::now().timestamp())
        .fetch_one(&self.connection)
        .await?;

        tracing::debug!("Login successful, created new session");
        Ok(created_session)
    }

    #[instrument(skip_all, err(Debug))]
    pub async fn find_active_session(&self, token: &str) -> Result<Option<Session>, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM session WHERE token = ? AND expired = 0 AND created_at > ?",
        )
        .bind(token)
        .bind(session_cutoff())
        .fetch_optional(&self.connection)
        .await
    }

    #[instrument(skip(self), err(Debug))]
    pub async fn expire_session(&self, session_id: i64) -> Result<(), sqlx::Error> {
        let user_id: i64 = sqlx::query_scalar(
            "UPDATE session SET expired = 1 WHERE session_id = ? RETURNING user_id",
        )
        .bind(session_id)
        .fetch_one(&self.connection)
        .await?;
        tracing::debug!(user_id, "Expired session");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("The username is already taken")]
    NameTaken,

    #[error("Failed to hash the password")]
    Hash(argon2::password_hash::Error),

    #[error("Internal database error")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Invalid username")]
    InvalidUsername,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Failed to verify the password")]
    Hash(argon2::password_hash::Error),

    #[error("Internal database error")]
    Database(#[from] sqlx::Error),
}
