use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failures a request handler can end with.
///
/// Form validation problems never end up here: they are rendered back into
/// the form they came from.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No such user")]
    NotFound,

    #[error("No user is logged in")]
    NotLoggedIn,

    #[error("Internal database error")]
    Database(#[from] sqlx::Error),

    #[error("Failed to render template")]
    Template(#[from] askama::Error),

    #[error("Failed to hash the password")]
    Hash(argon2::password_hash::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::NotLoggedIn => StatusCode::CONFLICT,
            Self::Database(error) => {
                tracing::error!(?error, "Database failure while handling request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Template(error) => {
                tracing::error!(?error, "Template failure while handling request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Hash(error) => {
                tracing::error!(?error, "Password hashing failure while handling request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            status.into_response()
        } else {
            (status, self.to_string()).into_response()
        }
    }
}
