use anyhow::Context;
use reqwest::blocking::{Client, Response};
use url::Url;

/// Credentials posted as JSON to the login endpoint. On success the server sets
/// a session cookie, which the client's cookie store keeps for later requests.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionLogin {
    login: String,
    password: String,
}

impl SessionLogin {
    pub fn new(login: &str, password: &str) -> Self {
        Self {
            login: login.to_owned(),
            password: password.to_owned(),
        }
    }

    /// Sends the credentials to `url`. Whatever the server answers is returned;
    /// only a request that can't be completed at all is an error.
    pub fn login(&self, client: &Client, url: Url) -> anyhow::Result<Response> {
        log::debug!("POST {url} as {}", self.login);
        client
            .post(url.clone())
            .json(self)
            .send()
            .with_context(|| format!("Error sending login request to {url}"))
    }

    /// Creates a user with these credentials. The server expects the same body
    /// as for logging in.
    pub fn register(&self, client: &Client, url: Url) -> anyhow::Result<Response> {
        log::debug!("POST {url} registering {}", self.login);
        client
            .post(url.clone())
            .json(self)
            .send()
            .with_context(|| format!("Error sending registration request to {url}"))
    }
}
