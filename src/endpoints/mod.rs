use askama::Template;
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::SignedCookieJar;

use crate::auth::flash;
use crate::error::AppError;

pub mod account;
pub mod follow;
pub mod timeline;

/// Renders `template` with the notices drained from `jar`.
///
/// The flashes are taken before rendering so the response clears the cookie.
pub fn render_page<T: Template>(
    jar: SignedCookieJar,
    build: impl FnOnce(Vec<String>) -> T,
) -> Result<Response, AppError> {
    let (jar, flashes) = flash::drain(jar);
    let body = build(flashes).render()?;
    Ok((jar, Html(body)).into_response())
}
