use crate::models::User;
use crate::state::SharedState;
use axum::extract::{FromRef, FromRequestParts, OptionalFromRequestParts};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use tracing::{Level, Span, instrument};

pub mod flash;
pub mod password;

pub const SESSION_COOKIE_NAME: &str = "session-token";

/// The logged-in user behind the request's session cookie.
///
/// Extract `Session` on routes that require a login (rejects with 401) and
/// `Option<Session>` where anonymous visitors are welcome.
#[derive(Debug)]
#[must_use]
pub struct Session(pub AuthorizedUser);

#[derive(Debug)]
#[must_use]
pub struct AuthorizedUser {
    pub user: User,
    pub session_id: i64,
}

impl Session {
    #[instrument(name = "auth_layer", skip_all, err(Debug, level = Level::DEBUG))]
    async fn authorize(state: &SharedState, parts: &Parts) -> Result<Self, RejectionCause> {
        let cookies = CookieJar::from_headers(&parts.headers);
        let token = cookies
            .get(SESSION_COOKIE_NAME)
            .map(Cookie::value_trimmed)
            .ok_or(RejectionCause::NoSessionCookie)?;

        let users = &state.repository.users;
        let session = users
            .find_active_session(token)
            .await
            .map_err(|_| RejectionCause::InternalServerError)?
            .ok_or(RejectionCause::ExpiredSession)?;
        let user = users
            .find_by_id(session.user_id)
            .await
            .map_err(|_| RejectionCause::InternalServerError)?
            .ok_or(RejectionCause::InvalidSession)?;

        let authorized_user = AuthorizedUser {
            user,
            session_id: session.session_id,
        };

        tracing::trace!(?authorized_user, "Cookie authorization successful");
        Ok(Self(authorized_user))
    }
}

impl<S> FromRequestParts<S> for Session
where
    SharedState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = RejectionCause;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = SharedState::from_ref(state);
        let session = Self::authorize(&state, parts).await?;
        // The request span from `layers::trace_layer` is current here.
        Span::current().record("username", session.0.user.username.as_str());
        Ok(session)
    }
}

impl<S> OptionalFromRequestParts<S> for Session
where
    SharedState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = RejectionCause;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        match <Self as FromRequestParts<S>>::from_request_parts(parts, state).await {
            Ok(session) => Ok(Some(session)),
            Err(RejectionCause::InternalServerError) => Err(RejectionCause::InternalServerError),
            Err(_anonymous) => Ok(None),
        }
    }
}

#[derive(Debug)]
#[must_use]
pub enum RejectionCause {
    NoSessionCookie,
    InvalidSession,
    ExpiredSession,
    InternalServerError,
}

impl IntoResponse for RejectionCause {
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            Self::InvalidSession | Self::NoSessionCookie | Self::ExpiredSession => {
                (StatusCode::UNAUTHORIZED, "No user is logged in").into_response()
            }
        }
    }
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .secure(false)
        .same_site(SameSite::Lax)
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE_NAME).path("/").build()
}
