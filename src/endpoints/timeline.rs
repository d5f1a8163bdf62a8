use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, debug_handler};
use axum_extra::extract::SignedCookieJar;
use serde::Deserialize;
use tracing::instrument;

use super::render_page;
use crate::auth::{Session, flash};
use crate::error::AppError;
use crate::models::{Message, User};
use crate::repository::message::PER_PAGE;
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "timeline.html")]
pub struct TimelineTemplate {
    pub title: String,
    pub viewer: Option<User>,
    pub flashes: Vec<String>,
    pub messages: Vec<Message>,
    /// Set on a user's page only.
    pub profile_user: Option<User>,
    pub follows: bool,
    pub show_message_box: bool,
}

#[instrument(skip_all)]
#[debug_handler]
pub async fn own(
    State(state): State<SharedState>,
    session: Option<Session>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    let Some(Session(viewer)) = session else {
        return Ok(Redirect::to("/public").into_response());
    };

    tracing::trace!(username = viewer.user.username, "Serving personal timeline");
    let messages = state
        .repository
        .messages
        .personal_timeline(viewer.user.user_id, PER_PAGE)
        .await?;

    render_page(jar, |flashes| TimelineTemplate {
        title: String::from("My Timeline"),
        viewer: Some(viewer.user),
        flashes,
        messages,
        profile_user: None,
        follows: false,
        show_message_box: true,
    })
}

#[instrument(skip_all)]
#[debug_handler]
pub async fn public(
    State(state): State<SharedState>,
    session: Option<Session>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    let messages = state.repository.messages.public_timeline(PER_PAGE).await?;

    render_page(jar, |flashes| TimelineTemplate {
        title: String::from("Public Timeline"),
        viewer: session.map(|Session(viewer)| viewer.user),
        flashes,
        messages,
        profile_user: None,
        follows: false,
        show_message_box: false,
    })
}

#[instrument(skip_all, fields(username = username))]
#[debug_handler]
pub async fn user(
    State(state): State<SharedState>,
    session: Option<Session>,
    jar: SignedCookieJar,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let repository = &state.repository;
    let profile_user = repository
        .users
        .find_by_username(&username)
        .await?
        .ok_or(AppError::NotFound)?;

    let messages = repository
        .messages
        .user_timeline(profile_user.user_id, PER_PAGE)
        .await?;

    let viewer = session.map(|Session(viewer)| viewer.user);
    let follows = match &viewer {
        Some(viewer) => {
            repository
                .followers
                .is_following(viewer.user_id, profile_user.user_id)
                .await?
        }
        None => false,
    };

    render_page(jar, |flashes| TimelineTemplate {
        title: format!("{}'s Timeline", profile_user.username),
        viewer,
        flashes,
        messages,
        profile_user: Some(profile_user),
        follows,
        show_message_box: false,
    })
}

#[derive(Deserialize, Debug)]
#[must_use]
pub struct MessageForm {
    #[serde(default)]
    text: String,
}

#[instrument(skip_all, fields(username = viewer.user.username))]
#[debug_handler]
pub async fn add_message(
    State(state): State<SharedState>,
    Session(viewer): Session,
    jar: SignedCookieJar,
    Form(form): Form<MessageForm>,
) -> Result<(SignedCookieJar, Redirect), AppError> {
    if form.text.is_empty() {
        tracing::debug!("Ignoring empty message");
        return Ok((jar, Redirect::to("/")));
    }

    state
        .repository
        .messages
        .add(viewer.user.user_id, &form.text)
        .await?;

    let jar = flash::push(jar, "Your message was recorded");
    Ok((jar, Redirect::to("/")))
}
