use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest_cookie_store::{CookieStore, CookieStoreMutex};

use crate::{configuration::Configuration, header};

pub mod session;
pub mod token;
pub mod verify_auth;

/// The ways the probe can present the configured credentials to the server.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Credentials are only sent in request bodies (registration)
    None,
    /// Log in once and rely on the session cookie afterwards
    Session,
    /// Send the credentials with every request in the `X-Cenarius-Token` header
    Token,
}

/// Authentication details derived from the configuration, meant to be used
/// when making requests against the Cenarius server.
#[derive(Debug, Clone)]
pub enum Authentication {
    /// No authentication at all
    None,
    /// Session authentication; no headers, the client keeps the cookies the
    /// login endpoint hands out
    Session,
    /// Token authentication; the contained value is the base64-encoded string
    /// `login password`
    Token(String),
}

impl Authentication {
    pub fn from_config(mode: Mode, config: &Configuration) -> Self {
        match mode {
            Mode::None => Authentication::None,
            Mode::Session => Authentication::Session,
            Mode::Token => Authentication::Token(
                token::TokenLogin::new(&config.login, &config.password).header_value(),
            ),
        }
    }

    /// Headers to send with every request.
    pub fn generate_headers(&self) -> Result<HeaderMap> {
        match self {
            Authentication::None | Authentication::Session => Ok(HeaderMap::new()),
            Authentication::Token(value) => {
                single_header(HeaderName::from_static("x-cenarius-token"), value)
            }
        }
    }
}

fn single_header(key: HeaderName, value: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        key,
        HeaderValue::from_str(value).context("Could not build authorization header")?,
    );
    Ok(headers)
}

/// Builds a blocking Reqwest HTTP client that carries the authentication and
/// static headers, and keeps the cookies the server sets in its own jar.
pub fn build_http_client(
    config: &Configuration,
    authentication: &Authentication,
) -> Result<reqwest::blocking::Client> {
    if matches!(authentication, Authentication::Token(_)) && config.target.scheme() == "http" {
        log::warn!(
            "Sending credentials in the {} header over plain http to {}",
            token::AUTH_HEADER,
            config.target
        );
    }

    // Make a cookie jar for our client
    let cookie_store = Arc::new(CookieStoreMutex::new(CookieStore::default()));
    let mut default_headers = authentication.generate_headers()?;
    default_headers.extend(header::get_default_headers(config.header.as_deref())?);

    // Without an explicit time-out the blocking client would give up after 30 seconds
    reqwest::blocking::Client::builder()
        .cookie_provider(cookie_store)
        .default_headers(default_headers)
        .timeout(config.request_timeout)
        .build()
        .context("Could not build the HTTP client")
}
