use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use url::Url;

/// Percent-encoded `/<username>` path of a user's profile page.
#[must_use]
pub fn profile_path(username: &str) -> String {
    let Ok(mut url) = Url::parse("http://localhost/") else {
        return String::from("/");
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(username);
    }
    url.path().to_owned()
}

#[derive(sqlx::FromRow, Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

impl User {
    #[must_use]
    pub fn profile_path(&self) -> String {
        profile_path(&self.username)
    }

    /// Identicon avatar for the user's email address.
    #[must_use]
    pub fn gravatar_url(&self, size: u32) -> String {
        let normalized = self.email.trim().to_lowercase();
        let digest = Md5::digest(normalized.as_bytes());
        format!(
            "http://www.gravatar.com/avatar/{}?d=identicon&s={size}",
            hex::encode(digest)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Message {
    pub message_id: i64,
    pub author: User,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub flagged: bool,
}

impl Message {
    #[must_use]
    pub fn pub_date_display(&self) -> String {
        self.pub_date.format("%Y-%m-%d @ %H:%M").to_string()
    }
}
