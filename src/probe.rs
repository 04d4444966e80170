//! The probe sends a fixed sequence of requests to the Cenarius server and
//! reports every answer as `<status code> <body>`, one line per response.
//! HTTP error statuses are reported like any other response; only requests
//! that could not be completed at all count as failures.

use std::io::Write;

use anyhow::{Context, Result};
use reqwest::{
    StatusCode,
    blocking::{Client, Response},
};
use url::Url;

use crate::{
    authentication::{self, Authentication, Mode, session::SessionLogin},
    configuration::Configuration,
    endpoints::{self, SecretKind},
};

/// What the probe keeps of a response once its body has been read.
struct Reply {
    status: StatusCode,
    /// Cookies set by this response, as `name=value`
    cookies: Vec<String>,
    text: String,
}

pub struct Probe<W: Write> {
    target: Url,
    login: SessionLogin,
    client: Client,
    out: W,
}

impl<W: Write> Probe<W> {
    /// Sets up a client that authenticates in the given mode and writes its
    /// report to `out`.
    pub fn new(config: &Configuration, mode: Mode, out: W) -> Result<Self> {
        let authentication = Authentication::from_config(mode, config);
        let client = authentication::build_http_client(config, &authentication)?;
        Ok(Self {
            target: config.target.clone(),
            login: SessionLogin::new(&config.login, &config.password),
            client,
            out,
        })
    }

    /// Logs in and calls the health endpoint with the session cookies. The
    /// cookies each response sets are reported after it.
    pub fn session(&mut self) -> Result<()> {
        let url = endpoints::endpoint_url(&self.target, endpoints::LOGIN_PATH)?;
        let response = self.login.login(&self.client, url.clone())?;
        let reply = read_response(response, &url)?;
        self.report(&reply)?;
        self.report_cookies(&reply)?;

        let reply = self.get(endpoints::HEALTH_PATH)?;
        self.report(&reply)?;
        self.report_cookies(&reply)
    }

    /// Calls the health, loginwithpasswords and creditcards endpoints in that
    /// order. A request that fails does not stop the ones after it, but the
    /// run as a whole then ends in an error.
    pub fn token(&mut self) -> Result<()> {
        let mut failed = 0;
        for path in endpoints::TOKEN_PROBE_PATHS {
            match self.get(path) {
                Ok(reply) => self.report(&reply)?,
                Err(err) => {
                    log::error!("{err:#}");
                    writeln!(self.out, "error {err:#}")?;
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            bail!(
                "{failed} of {} requests could not be completed",
                endpoints::TOKEN_PROBE_PATHS.len()
            );
        }
        Ok(())
    }

    /// Registers the configured credentials as a new user.
    pub fn register(&mut self) -> Result<()> {
        let url = endpoints::endpoint_url(&self.target, endpoints::REGISTER_PATH)?;
        let response = self.login.register(&self.client, url.clone())?;
        let reply = read_response(response, &url)?;
        self.report(&reply)
    }

    /// Lists the stored secrets of one kind.
    pub fn list(&mut self, kind: SecretKind) -> Result<()> {
        log::info!("Listing secrets of type {kind}");
        let reply = self.get(kind.list_path())?;
        self.report(&reply)
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    fn get(&self, path: &str) -> Result<Reply> {
        let url = endpoints::endpoint_url(&self.target, path)?;
        log::debug!("GET {url}");
        let response = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("Error sending request to {url}"))?;
        read_response(response, &url)
    }

    fn report(&mut self, reply: &Reply) -> Result<()> {
        log::debug!("Response status: {}", reply.status);
        writeln!(self.out, "{} {}", reply.status.as_u16(), reply.text)?;
        Ok(())
    }

    fn report_cookies(&mut self, reply: &Reply) -> Result<()> {
        writeln!(self.out, "cookies: [{}]", reply.cookies.join(", "))?;
        Ok(())
    }
}

fn read_response(response: Response, url: &Url) -> Result<Reply> {
    let status = response.status();
    // The body read consumes the response, so take the cookies first
    let cookies = response
        .cookies()
        .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
        .collect();
    let text = response
        .text()
        .with_context(|| format!("Error reading the response from {url}"))?;
    Ok(Reply {
        status,
        cookies,
        text,
    })
}
