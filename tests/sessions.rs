use minitwit::repository::user::SESSION_LIFETIME_SECS;
use minitwit::repository::{self, Repository};
use sqlx::SqlitePool;
use std::time::Duration;
use tempfile::TempDir;

async fn open() -> (Repository, SqlitePool, TempDir) {
    let database_dir = tempfile::tempdir().unwrap();
    let database_url = format!(
        "sqlite://{}",
        database_dir.path().join("minitwit.db").display()
    );
    let pool = repository::connect(&database_url, Duration::from_secs(5))
        .await
        .unwrap();
    (Repository::new(pool.clone()), pool, database_dir)
}

async fn session_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM session")
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn age_session(pool: &SqlitePool, session_id: i64, seconds: i64) {
    sqlx::query("UPDATE session SET created_at = created_at - ? WHERE session_id = ?")
        .bind(seconds)
        .bind(session_id)
        .execute(pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn sessions_stop_authenticating_after_their_lifetime() {
    let (repository, pool, _dir) = open().await;
    repository
        .users
        .register("alice", "alice@example.com", "default")
        .await
        .unwrap();

    let session = repository.users.login("alice", "default").await.unwrap();
    let found = repository.users.find_active_session(&session.token).await.unwrap();
    assert_eq!(found.map(|found| found.session_id), Some(session.session_id));

    age_session(&pool, session.session_id, SESSION_LIFETIME_SECS + 1).await;
    let found = repository.users.find_active_session(&session.token).await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn login_removes_stale_sessions_of_the_user() {
    let (repository, pool, _dir) = open().await;
    for name in ["alice", "bob"] {
        repository
            .users
            .register(name, &format!("{name}@example.com"), "default")
            .await
            .unwrap();
    }

    let still_valid = repository.users.login("alice", "default").await.unwrap();
    let logged_out = repository.users.login("alice", "default").await.unwrap();
    let too_old = repository.users.login("alice", "default").await.unwrap();
    repository
        .users
        .expire_session(logged_out.session_id)
        .await
        .unwrap();
    age_session(&pool, too_old.session_id, SESSION_LIFETIME_SECS + 1).await;
    let other = repository.users.login("bob", "default").await.unwrap();
    assert_eq!(session_count(&pool).await, 4);

    // Logging in again sweeps alice's expired and aged rows, but nobody else's.
    let fresh = repository.users.login("alice", "default").await.unwrap();
    assert_eq!(session_count(&pool).await, 3);
    for token in [&still_valid.token, &fresh.token, &other.token] {
        let found = repository.users.find_active_session(token).await.unwrap();
        assert!(found.is_some());
    }
}
