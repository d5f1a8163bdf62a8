use askama::Template;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, debug_handler};
use axum_extra::extract::{CookieJar, SignedCookieJar};
use serde::Deserialize;
use tracing::instrument;
use validator::{Validate, ValidationErrors};

use super::render_page;
use crate::auth::{self, Session, flash};
use crate::error::AppError;
use crate::models::User;
use crate::repository::user::{LoginError, RegistrationError};
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub viewer: Option<User>,
    pub flashes: Vec<String>,
    pub error: Option<String>,
    pub username: String,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub viewer: Option<User>,
    pub flashes: Vec<String>,
    pub error: Option<String>,
    pub username: String,
    pub email: String,
}

/// Logged-in visitors have no use for the login and registration forms.
fn redirect_to_profile(Session(viewer): Session) -> Response {
    tracing::debug!(username = viewer.user.username, "Already logged in");
    Redirect::to(&viewer.user.profile_path()).into_response()
}

#[instrument(skip_all)]
#[debug_handler(state = SharedState)]
pub async fn login_page(
    session: Option<Session>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    if let Some(session) = session {
        return Ok(redirect_to_profile(session));
    }

    render_page(jar, |flashes| LoginTemplate {
        viewer: None,
        flashes,
        error: None,
        username: String::new(),
    })
}

#[derive(Deserialize)]
#[must_use]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[instrument(skip_all, fields(username = form.username))]
#[debug_handler]
pub async fn login(
    State(state): State<SharedState>,
    session: Option<Session>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if let Some(session) = session {
        return Ok(redirect_to_profile(session));
    }

    let login_result = state
        .repository
        .users
        .login(&form.username, &form.password)
        .await;

    match login_result {
        Ok(session) => {
            let cookies = CookieJar::new().add(auth::session_cookie(session.token));
            let jar = flash::push(jar, "You were logged in");
            Ok((cookies, jar, Redirect::to("/")).into_response())
        }

        Err(error @ (LoginError::InvalidUsername | LoginError::InvalidPassword)) => {
            render_page(jar, |flashes| LoginTemplate {
                viewer: None,
                flashes,
                error: Some(error.to_string()),
                username: form.username,
            })
        }
        Err(LoginError::Hash(error)) => Err(AppError::Hash(error)),
        Err(LoginError::Database(error)) => Err(AppError::Database(error)),
    }
}

#[instrument(skip_all)]
#[debug_handler(state = SharedState)]
pub async fn register_page(
    session: Option<Session>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    if let Some(session) = session {
        return Ok(redirect_to_profile(session));
    }

    render_page(jar, |flashes| RegisterTemplate {
        viewer: None,
        flashes,
        error: None,
        username: String::new(),
        email: String::new(),
    })
}

#[derive(Deserialize, Validate)]
#[must_use]
pub struct RegistrationForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "You have to enter a username"))]
    username: String,
    #[serde(default)]
    #[validate(contains(pattern = "@", message = "You have to enter a valid email address"))]
    email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "You have to enter a password"))]
    password: String,
    #[serde(default)]
    #[validate(must_match(other = "password", message = "The two passwords do not match"))]
    password2: String,
}

/// Fields in the order their rules are reported.
const REGISTRATION_RULE_ORDER: [&str; 4] = ["username", "email", "password", "password2"];

/// First path segments owned by fixed routes. A user with one of these names
/// would have an unreachable profile.
pub const RESERVED_USERNAMES: [&str; 7] = [
    "add_message",
    "login",
    "logout",
    "public",
    "register",
    "register-user",
    "static",
];

fn is_reserved(username: &str) -> bool {
    RESERVED_USERNAMES.contains(&username)
}

fn first_registration_error(errors: &ValidationErrors) -> Option<String> {
    let field_errors = errors.field_errors();
    REGISTRATION_RULE_ORDER.iter().find_map(|field| {
        let error = field_errors.get(*field)?.first()?;
        Some(
            error
                .message
                .as_ref()
                .map_or_else(|| error.code.to_string(), ToString::to_string),
        )
    })
}

#[instrument(skip_all, fields(username = form.username))]
#[debug_handler]
pub async fn register(
    State(state): State<SharedState>,
    session: Option<Session>,
    jar: SignedCookieJar,
    Form(form): Form<RegistrationForm>,
) -> Result<Response, AppError> {
    if let Some(session) = session {
        return Ok(redirect_to_profile(session));
    }

    let users = &state.repository.users;
    let error = if let Err(errors) = form.validate() {
        first_registration_error(&errors)
    } else if is_reserved(&form.username)
        || users.find_by_username(&form.username).await?.is_some()
    {
        Some(RegistrationError::NameTaken.to_string())
    } else {
        match users
            .register(&form.username, &form.email, &form.password)
            .await
        {
            Ok(_user) => None,
            Err(error @ RegistrationError::NameTaken) => Some(error.to_string()),
            Err(RegistrationError::Hash(error)) => return Err(AppError::Hash(error)),
            Err(RegistrationError::Database(error)) => return Err(AppError::Database(error)),
        }
    };

    if let Some(error) = error {
        tracing::debug!(%error, "Rejecting registration");
        return render_page(jar, |flashes| RegisterTemplate {
            viewer: None,
            flashes,
            error: Some(error),
            username: form.username,
            email: form.email,
        });
    }

    let jar = flash::push(jar, "You were successfully registered and can login now");
    Ok((jar, Redirect::to("/login")).into_response())
}

#[instrument(skip_all)]
#[debug_handler]
pub async fn logout(
    State(state): State<SharedState>,
    session: Option<Session>,
    cookies: CookieJar,
    jar: SignedCookieJar,
) -> Result<(CookieJar, SignedCookieJar, Redirect), AppError> {
    let Some(Session(viewer)) = session else {
        tracing::debug!("Rejecting logout: no user is logged in");
        return Err(AppError::NotLoggedIn);
    };

    state
        .repository
        .users
        .expire_session(viewer.session_id)
        .await?;
    tracing::debug!(username = viewer.user.username, "Logged out");

    let cookies = cookies.remove(auth::removal_cookie());
    let jar = flash::push(jar, "You were logged out");
    Ok((cookies, jar, Redirect::to("/public")))
}
