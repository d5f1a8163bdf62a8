#![allow(clippy::missing_errors_doc)]

use axum::Router;
use axum::routing::{get, post};
use axum_extra::extract::cookie::Key;
use clap::Parser;
use color_eyre::eyre::{WrapErr, eyre};
use state::SharedState;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::instrument;

pub mod auth;
pub mod endpoints;
pub mod error;
pub mod layers;
pub mod models;
pub mod repository;
pub mod state;

#[derive(Parser, Clone, Debug)]
#[command(about = "MiniTwit microblog server", long_about = None)]
#[must_use]
pub struct Settings {
    #[arg(default_value_t = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080))]
    pub socket_addr: SocketAddr,

    /// SQLite database, created on first start
    #[arg(long, env = "MINITWIT_DATABASE_URL", default_value = "sqlite://minitwit.db")]
    pub database_url: String,

    /// Directory served under `/static`
    #[arg(long, env = "MINITWIT_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// At least 64 bytes; a random key is used when unset, so flash
    /// notices do not survive a restart
    #[arg(long, env = "MINITWIT_COOKIE_SECRET", hide_env_values = true)]
    pub cookie_secret: Option<String>,

    #[arg(long, default_value_t = 5)]
    pub db_acquire_timeout_secs: u64,
}

impl Settings {
    pub fn cookie_key(&self) -> Result<Key, color_eyre::eyre::Report> {
        match &self.cookie_secret {
            Some(secret) => Key::try_from(secret.as_bytes())
                .map_err(|error| eyre!("Invalid cookie secret: {error}")),
            None => {
                tracing::warn!("No cookie secret configured, generating a random key");
                Ok(Key::generate())
            }
        }
    }
}

/// Every route of the application, without the tracing layer.
///
/// Fixed first segments must stay listed in
/// [`account::RESERVED_USERNAMES`](endpoints::account::RESERVED_USERNAMES).
pub fn router(state: SharedState, static_dir: PathBuf) -> Router {
    use endpoints::{account, follow, timeline};

    Router::new()
        .route("/", get(timeline::own))
        .route("/public", get(timeline::public))
        .route("/add_message", post(timeline::add_message))
        .route("/login", get(account::login_page).post(account::login))
        .route("/register", get(account::register_page).post(account::register))
        .route(
            "/register-user",
            get(account::register_page).post(account::register),
        )
        .route("/logout", get(account::logout))
        .nest_service("/static", ServeDir::new(static_dir))
        .route("/{username}", get(timeline::user))
        .route("/{username}/follow", get(follow::follow))
        .route("/{username}/unfollow", get(follow::unfollow))
        .with_state(state)
}

#[instrument(skip_all)]
pub async fn run(settings: Settings) -> Result<(), color_eyre::eyre::Report> {
    let acquire_timeout = Duration::from_secs(settings.db_acquire_timeout_secs);
    let db_pool = repository::connect(&settings.database_url, acquire_timeout)
        .await
        .wrap_err("Failed to open the database")?;
    let shared_state = SharedState::new(db_pool.clone(), settings.cookie_key()?);

    let router = self::router(shared_state, settings.static_dir).layer(layers::trace_layer());

    let listener = TcpListener::bind(settings.socket_addr).await?;
    tracing::info!(listen_addr = ?listener.local_addr()?, "Bound to local socket");

    let service = router.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, service)
        .with_graceful_shutdown(self::shutdown_signal())
        .await?;

    db_pool.close().await;
    Ok(())
}

#[instrument]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c()
        .await
        .inspect(|()| tracing::info!("Caught CTRL+C signal, shutting down"))
        .inspect_err(|error| tracing::error!(?error, "Failed to await CTRL+C signal"));
}
