//! One-shot notices carried across a redirect in a signed cookie.

use axum_extra::extract::SignedCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use url::form_urlencoded;

pub const FLASH_COOKIE_NAME: &str = "flash";

const NOTICE_KEY: &str = "n";

fn read(jar: &SignedCookieJar) -> Vec<String> {
    jar.get(FLASH_COOKIE_NAME)
        .map(|cookie| {
            form_urlencoded::parse(cookie.value().as_bytes())
                .map(|(_, notice)| notice.into_owned())
                .collect()
        })
        .unwrap_or_default()
}

/// Queues `notice` for the next rendered page.
pub fn push(jar: SignedCookieJar, notice: impl Into<String>) -> SignedCookieJar {
    let mut notices = read(&jar);
    notices.push(notice.into());
    let payload = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(notices.iter().map(|notice| (NOTICE_KEY, notice)))
        .finish();

    let cookie = Cookie::build((FLASH_COOKIE_NAME, payload))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Takes every queued notice; the returned jar removes the cookie.
pub fn drain(jar: SignedCookieJar) -> (SignedCookieJar, Vec<String>) {
    let notices = read(&jar);
    if notices.is_empty() {
        return (jar, notices);
    }
    let jar = jar.remove(Cookie::build(FLASH_COOKIE_NAME).path("/"));
    (jar, notices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Key;

    #[test]
    fn notices_are_drained_in_order() {
        let jar = SignedCookieJar::new(Key::generate());
        let jar = push(jar, "first");
        let jar = push(jar, "second");

        let (jar, notices) = drain(jar);
        assert_eq!(notices, ["first", "second"]);

        let (_, notices) = drain(jar);
        assert!(notices.is_empty());
    }

    #[test]
    fn notices_survive_cookie_delimiters() {
        let jar = push(SignedCookieJar::new(Key::generate()), "a; b=\"c\", d&e");
        let (_, notices) = drain(jar);
        assert_eq!(notices, ["a; b=\"c\", d&e"]);
    }

    #[test]
    fn empty_jar_has_no_notices() {
        let (_, notices) = drain(SignedCookieJar::new(Key::generate()));
        assert!(notices.is_empty());
    }
}
