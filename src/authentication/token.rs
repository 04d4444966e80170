use base64::{Engine as _, engine::general_purpose::STANDARD as base64};

/// Name of the header the Cenarius server reads the credentials from.
pub const AUTH_HEADER: &str = "X-Cenarius-Token";

/// Credentials to be sent with each request in the `X-Cenarius-Token` header.
#[derive(Debug, Clone)]
pub struct TokenLogin {
    login: String,
    password: String,
}

impl TokenLogin {
    pub fn new(login: &str, password: &str) -> Self {
        Self {
            login: login.to_owned(),
            password: password.to_owned(),
        }
    }

    /// Constructs the header value by base64-encoding the string
    /// `login password`. Neither part is escaped, so a space inside the login
    /// will confuse the server.
    pub fn header_value(self) -> String {
        base64.encode(format!("{} {}", self.login, self.password).as_bytes())
    }
}
