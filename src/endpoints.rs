//! Paths of the Cenarius API that the probe talks to, and the kinds of
//! secrets that can be listed through the private part of the API.

use std::str::FromStr;

use anyhow::Context;
use url::Url;

pub const LOGIN_PATH: &str = "api/v1/user/login";
pub const REGISTER_PATH: &str = "api/v1/user/register";
pub const HEALTH_PATH: &str = "api/v1/private/health";

/// The private endpoints hit by the token probe, in the order they are requested.
pub const TOKEN_PROBE_PATHS: [&str; 3] = [
    HEALTH_PATH,
    SecretKind::LoginWithPassword.list_path(),
    SecretKind::CreditCard.list_path(),
];

/// A kind of secret stored by the server. Each kind has its own list endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, strum::VariantArray, strum::Display)]
pub enum SecretKind {
    #[strum(to_string = "login with password")]
    LoginWithPassword,
    #[strum(to_string = "credit card")]
    CreditCard,
    #[strum(to_string = "secret text")]
    SecretText,
    #[strum(to_string = "secret file")]
    SecretFile,
}

impl SecretKind {
    pub const fn list_path(self) -> &'static str {
        match self {
            SecretKind::LoginWithPassword => "api/v1/private/loginwithpasswords",
            SecretKind::CreditCard => "api/v1/private/creditcards",
            SecretKind::SecretText => "api/v1/private/secrettexts",
            SecretKind::SecretFile => "api/v1/private/secretfiles",
        }
    }

    /// The names a user may type on the command line to select this kind.
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            SecretKind::LoginWithPassword => &["l", "login", "password", "lp"],
            SecretKind::CreditCard => &["c", "credit", "card", "cc", "creditcard"],
            SecretKind::SecretText => &["t", "text", "secrettext"],
            SecretKind::SecretFile => &["f", "file", "secretfile"],
        }
    }
}

impl FromStr for SecretKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        <SecretKind as strum::VariantArray>::VARIANTS
            .iter()
            .copied()
            .find(|kind| kind.aliases().contains(&wanted.as_str()))
            .ok_or_else(|| anyhow!("Unknown type of secret: {s}"))
    }
}

/// Resolves an API path against the target URL. The target is treated as a
/// directory, so a path prefix in the target (`http://host/cenarius`) is kept.
pub fn endpoint_url(target: &Url, path: &str) -> anyhow::Result<Url> {
    let mut base = target.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path)
        .with_context(|| format!("Can't build an URL for {path} on {target}"))
}
