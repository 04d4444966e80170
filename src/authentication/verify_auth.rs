use std::io::Write;

use anyhow::{Context, Result};
use log::Level::{Debug, Info};
use strum::VariantArray;

use super::{Authentication, Mode};
use crate::{
    configuration::Configuration,
    endpoints::{self, SecretKind},
};

fn print_response(out: &mut impl Write, mode: &str, response: &str) -> Result<()> {
    writeln!(out, "Response from authenticator:")?;
    writeln!(out, "\t{:<24}{}", "Authentication mode:", mode)?;
    writeln!(out, "\t{:<24}{}", "Header:", response)?;
    Ok(())
}

/// Calls the health endpoint and the list endpoint of every kind of secret
/// with the token header. Fails on the first "401 Unauthorized" and when the
/// server can't be reached.
pub fn verify_auth(config: &Configuration, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "\n============================================================================="
    )?;
    writeln!(out, "\n[*] Running authentication verification!\n\n")?;

    let authentication = Authentication::from_config(Mode::Token, config);
    let client = super::build_http_client(config, &authentication)
        .context("Could not initialize authentication")?;

    if let Authentication::Token(value) = &authentication {
        if log::log_enabled!(Debug) {
            print_response(out, "Token", &format!("{}: {value}", super::token::AUTH_HEADER))?;
        } else {
            print_response(out, "Token", super::token::AUTH_HEADER)?;
        }
    }

    let paths = std::iter::once(endpoints::HEALTH_PATH)
        .chain(SecretKind::VARIANTS.iter().map(|kind| kind.list_path()));

    for path in paths {
        let url = endpoints::endpoint_url(&config.target, path)?;
        if log::log_enabled!(Info) {
            writeln!(out, "Path: {path}")?;
        }
        match client.get(url.clone()).send() {
            Ok(r) => {
                if r.status() == reqwest::StatusCode::UNAUTHORIZED {
                    writeln!(out, "\n\nAuthentication verification:")?;
                    writeln!(out, "\tResult:   failed")?;
                    writeln!(out, "\tReason:   received status code: 401 Unauthorized")?;
                    writeln!(out, "\tEndpoint: {url}\n")?;
                    writeln!(
                        out,
                        "============================================================================="
                    )?;
                    bail!("Could not authenticate: 401 Unauthorized");
                }
                if log::log_enabled!(Info) {
                    let status = r.status();
                    let text = r
                        .text()
                        .with_context(|| format!("Error reading the response from {url}"))?;
                    writeln!(out, "\tResponse: {} {}", status.as_u16(), text)?;
                }
            }
            Err(e) => {
                writeln!(out, "\n\nAuthentication verification:")?;
                writeln!(out, "\tResult:   failed")?;
                writeln!(out, "\tError in sending request: {e}")?;
                writeln!(out, "\tIs the server up and running?")?;
                return Err(e).context("Error sending request to the server");
            }
        };
    }

    // No authorization errors found: success!
    writeln!(out, "\n\nAuthentication verification:")?;
    writeln!(out, "\tResult: success!\n")?;
    writeln!(
        out,
        "\n\nTip: for less verbose output, set the flag \"--log-level=warn\""
    )?;
    writeln!(
        out,
        "============================================================================="
    )?;
    Ok(())
}
