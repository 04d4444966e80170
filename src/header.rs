//! This module loads and prepares default headers. Users can optionally
//! specify headers that should be sent with every request the probe makes,
//! and this module parses those into a Reqwest HeaderMap.

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

/// Builds the default headers: the user agent, plus the custom headers from
/// `header_path` if one is given.
pub fn get_default_headers(header_path: Option<&Path>) -> Result<HeaderMap> {
    // Add custom default headers from file
    let custom_header: HashMap<String, String> = match header_path {
        Some(header_path) => {
            serde_yaml::from_reader(File::open(header_path).with_context(|| {
                format!(
                    "Failed to open default header file {}",
                    header_path.to_string_lossy()
                )
            })?)
            .with_context(|| "Failed to parse default header file as YAML")?
        }
        None => HashMap::new(),
    };

    let mut default_headers = HeaderMap::new();
    default_headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&crate::version::user_agent())
            .context("Can't use the crate version as user agent")?,
    );

    for (key, value) in custom_header {
        default_headers.insert(
            HeaderName::from_str(&key)
                .with_context(|| format!("Can't parse {key} as header name"))?,
            HeaderValue::from_str(&value)
                .with_context(|| format!("Can't parse {value} as header value"))?,
        );
    }

    Ok(default_headers)
}
