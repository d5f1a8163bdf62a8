use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::instrument;

pub const CODE_NON_UNIQUE: &str = "2067";

pub mod follower;
pub mod message;
pub mod user;

#[derive(Debug, Clone)]
#[must_use]
pub struct Repository {
    pub users: user::UserRepository,
    pub messages: message::MessageRepository,
    pub followers: follower::FollowerRepository,
}

impl Repository {
    pub fn new(connection: SqlitePool) -> Self {
        let users = user::UserRepository {
            connection: connection.clone(),
        };
        let messages = message::MessageRepository {
            connection: connection.clone(),
        };
        let followers = follower::FollowerRepository { connection };
        Self {
            users,
            messages,
            followers,
        }
    }
}

/// Opens the pool, creating the database file if needed, and brings the
/// schema up to date.
#[instrument(err(Debug))]
pub async fn connect(
    database_url: &str,
    acquire_timeout: Duration,
) -> Result<SqlitePool, ConnectError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(acquire_timeout);

    let pool = SqlitePoolOptions::new()
        .acquire_timeout(acquire_timeout)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!(database_url, "Database ready");
    Ok(pool)
}

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum ConnectError {
    Database(#[from] sqlx::Error),
    Migrate(#[from] sqlx::migrate::MigrateError),
}
