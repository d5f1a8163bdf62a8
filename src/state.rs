use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sqlx::SqlitePool;

use crate::repository::Repository;

#[derive(Clone)]
#[must_use]
pub struct SharedState {
    pub repository: Repository,
    /// Signs the flash cookie.
    pub cookie_key: Key,
}

impl SharedState {
    pub fn new(db_pool: SqlitePool, cookie_key: Key) -> Self {
        Self {
            repository: Repository::new(db_pool),
            cookie_key,
        }
    }
}

impl FromRef<SharedState> for Key {
    fn from_ref(state: &SharedState) -> Self {
        state.cookie_key.clone()
    }
}
