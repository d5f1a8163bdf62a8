#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use axum_extra::extract::cookie::{Cookie, Key};
use minitwit::state::SharedState;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use url::form_urlencoded;

/// The whole application on a fresh database in a temporary directory.
pub struct TestApp {
    router: Router,
    _database_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(false).await
    }

    /// Same as [`TestApp::new`], with the request tracing layer installed.
    pub async fn traced() -> Self {
        Self::build(true).await
    }

    async fn build(traced: bool) -> Self {
        let database_dir = tempfile::tempdir().unwrap();
        let database_url = format!(
            "sqlite://{}",
            database_dir.path().join("minitwit.db").display()
        );
        let db_pool = minitwit::repository::connect(&database_url, Duration::from_secs(5))
            .await
            .unwrap();
        let state = SharedState::new(db_pool, Key::generate());
        let mut router = minitwit::router(state, PathBuf::from("static"));
        if traced {
            router = router.layer(minitwit::layers::trace_layer());
        }

        Self {
            router,
            _database_dir: database_dir,
        }
    }

    /// A browser with its own cookie store.
    pub fn client(&self) -> Client {
        Client {
            router: self.router.clone(),
            cookies: BTreeMap::new(),
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

pub struct Client {
    router: Router,
    cookies: BTreeMap<String, String>,
}

impl Client {
    async fn send(&mut self, method: Method, uri: &str, form: Option<String>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if !self.cookies.is_empty() {
            let header = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(COOKIE, header);
        }
        let body = match form {
            Some(form) => {
                builder = builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form)
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        for set_cookie in response.headers().get_all(SET_COOKIE) {
            let cookie = Cookie::parse(set_cookie.to_str().unwrap().to_owned()).unwrap();
            if cookie.value().is_empty() {
                self.cookies.remove(cookie.name());
            } else {
                self.cookies
                    .insert(cookie.name().to_owned(), cookie.value().to_owned());
            }
        }

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .map(|value| value.to_str().unwrap().to_owned());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            location,
            body: String::from_utf8_lossy(&body).into_owned(),
        }
    }

    async fn follow_redirects(&mut self, mut response: TestResponse) -> TestResponse {
        for _ in 0..5 {
            if !response.status.is_redirection() {
                return response;
            }
            let location = response.location.clone().unwrap();
            response = self.send(Method::GET, &location, None).await;
        }
        panic!("too many redirects");
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_owned(), value.to_owned());
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let form = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        self.send(Method::POST, uri, Some(form)).await
    }

    /// GET `uri`, following redirects like a browser.
    pub async fn visit(&mut self, uri: &str) -> TestResponse {
        let response = self.get(uri).await;
        self.follow_redirects(response).await
    }

    /// POST a form, following redirects like a browser.
    pub async fn submit(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let response = self.post_form(uri, fields).await;
        self.follow_redirects(response).await
    }

    pub async fn register(
        &mut self,
        username: &str,
        password: &str,
        password2: Option<&str>,
        email: Option<&str>,
    ) -> TestResponse {
        let default_email = format!("{username}@example.com");
        let fields = [
            ("username", username),
            ("password", password),
            ("password2", password2.unwrap_or(password)),
            ("email", email.unwrap_or(&default_email)),
        ];
        self.submit("/register", &fields).await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        self.submit("/login", &[("username", username), ("password", password)])
            .await
    }

    pub async fn register_and_login(&mut self, username: &str, password: &str) -> TestResponse {
        self.register(username, password, None, None).await;
        self.login(username, password).await
    }

    pub async fn logout(&mut self) -> TestResponse {
        self.visit("/logout").await
    }

    pub async fn add_message(&mut self, text: &str) -> TestResponse {
        let response = self.submit("/add_message", &[("text", text)]).await;
        if !text.is_empty() {
            assert!(
                response.body.contains("Your message was recorded"),
                "message was not recorded: {}",
                response.body
            );
        }
        response
    }
}

#[track_caller]
pub fn assert_contains(body: &str, needle: &str) {
    assert!(body.contains(needle), "expected {needle:?} in:\n{body}");
}

#[track_caller]
pub fn assert_not_contains(body: &str, needle: &str) {
    assert!(!body.contains(needle), "unexpected {needle:?} in:\n{body}");
}
