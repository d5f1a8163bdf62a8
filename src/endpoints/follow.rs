use axum::debug_handler;
use axum::extract::{Path, State};
use axum::response::Redirect;
use axum_extra::extract::SignedCookieJar;
use tracing::instrument;

use crate::auth::{Session, flash};
use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;

async fn find_target(state: &SharedState, username: &str) -> Result<User, AppError> {
    state
        .repository
        .users
        .find_by_username(username)
        .await?
        .ok_or(AppError::NotFound)
}

#[instrument(skip_all, fields(follower = viewer.user.username, followee = username))]
#[debug_handler]
pub async fn follow(
    State(state): State<SharedState>,
    Session(viewer): Session,
    jar: SignedCookieJar,
    Path(username): Path<String>,
) -> Result<(SignedCookieJar, Redirect), AppError> {
    let target = find_target(&state, &username).await?;
    let inserted = state
        .repository
        .followers
        .follow(viewer.user.user_id, target.user_id)
        .await?;
    tracing::debug!(inserted, "Followed user");

    let jar = flash::push(
        jar,
        format!("You are now following \"{}\"", target.username),
    );
    Ok((jar, Redirect::to(&target.profile_path())))
}

#[instrument(skip_all, fields(follower = viewer.user.username, followee = username))]
#[debug_handler]
pub async fn unfollow(
    State(state): State<SharedState>,
    Session(viewer): Session,
    jar: SignedCookieJar,
    Path(username): Path<String>,
) -> Result<(SignedCookieJar, Redirect), AppError> {
    let target = find_target(&state, &username).await?;
    let removed = state
        .repository
        .followers
        .unfollow(viewer.user.user_id, target.user_id)
        .await?;
    tracing::debug!(removed, "Unfollowed user");

    let jar = flash::push(
        jar,
        format!("You are no longer following \"{}\"", target.username),
    );
    Ok((jar, Redirect::to(&target.profile_path())))
}
