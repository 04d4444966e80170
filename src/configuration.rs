use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use url::Url;

use crate::endpoints::SecretKind;

const DEFAULT_TARGET: &str = "http://localhost:8080";
const DEFAULT_LOGIN: &str = "python3";
const DEFAULT_PASSWORD: &str = "python3password";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;

/// Probes the login and private endpoints of a Cenarius server.
#[derive(Parser)]
#[command(about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// The list of supported subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Print the version and exit
    Version,
    /// Log in with the credentials, then call the health endpoint reusing the
    /// session cookies the server handed out
    Session {
        #[command(flatten)]
        config: PartialConfiguration,
    },
    /// Call the health, loginwithpasswords and creditcards endpoints, sending
    /// the credentials in the X-Cenarius-Token header
    Token {
        #[command(flatten)]
        config: PartialConfiguration,
    },
    /// Register the credentials as a new user
    Register {
        #[command(flatten)]
        config: PartialConfiguration,
    },
    /// List the stored secrets of one kind
    List {
        /// Type of secret. One of: l/login/password/lp, c/credit/card/cc/creditcard,
        /// t/text/secrettext, f/file/secretfile
        #[arg(value_name = "KIND")]
        kind: SecretKind,
        #[command(flatten)]
        config: PartialConfiguration,
    },
    /// Verify the credentials by calling every private endpoint and checking
    /// for "401 Unauthorized"
    VerifyAuth {
        #[command(flatten)]
        config: PartialConfiguration,
    },
}

impl Commands {
    /// The configuration given on the command line. None for commands that do
    /// not talk to the server.
    pub fn partial_config(&self) -> Option<&PartialConfiguration> {
        match self {
            Commands::Version => None,
            Commands::Session { config }
            | Commands::Token { config }
            | Commands::Register { config }
            | Commands::List { config, .. }
            | Commands::VerifyAuth { config } => Some(config),
        }
    }
}

/// PartialConfiguration is one source of configuration: the command line
/// (including environment variables) or a configuration file. Every field is
/// optional, the `Configuration` built from the merged partials fills in defaults.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Args)]
#[serde(deny_unknown_fields)]
pub struct PartialConfiguration {
    /// The path to a configuration file. Arguments given on the command line
    /// take precedence over the configuration file.
    #[arg(long, value_parser, value_name = "CONFIG_FILE.YAML")]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// The URL of the Cenarius server. A bare `host:port` is taken to mean
    /// `http://host:port`. Defaults to http://localhost:8080.
    #[arg(value_parser = verify_url, long, env = "CENARIUS_SERVER_ADDR")]
    #[serde(default, deserialize_with = "deserialize_target")]
    pub target: Option<Url>,

    /// Login of the user to authenticate as.
    #[arg(long, env = "CENARIUS_LOGIN")]
    pub login: Option<String>,

    /// Password of the user to authenticate as.
    #[arg(long, env = "CENARIUS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Custom (static) headers that should be added to each request, as a YAML
    /// map of header names to values.
    #[arg(long, value_parser, value_name = "STATIC_HEADERS.YAML")]
    pub header: Option<PathBuf>,

    /// Per-request time-out in milliseconds. Without it, requests wait for the
    /// server indefinitely.
    #[arg(value_parser, long)]
    pub request_timeout: Option<u64>,

    // Manually added possible values below, since automatically showing possible values of an external (remote) enum
    // such as log::LevelFilter is not well supported.
    /// Log level to output. This flag takes precedence over the environment variable. [possible values: off, error, warn, debug, info, trace]
    #[arg(value_parser = clap::value_parser!(log::LevelFilter), long, value_enum, env = "CENARIUS_LOG_LEVEL", ignore_case = true)]
    pub log_level: Option<log::LevelFilter>,
}

/// The main configuration object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Base URL of the Cenarius server.
    pub target: Url,

    /// Login of the user to authenticate as.
    pub login: String,

    /// Password of the user to authenticate as.
    pub password: String,

    /// Custom (static) headers that should be added to each request.
    pub header: Option<PathBuf>,

    /// Per-request time-out. None means no time-out at all.
    pub request_timeout: Option<Duration>,

    /// Log level to output.
    pub log_level: log::LevelFilter,
}

impl Configuration {
    /// Gathers configuration from the command line, the environment and the
    /// configuration file named by `--config`, if any.
    pub fn load(cli_config: &PartialConfiguration) -> anyhow::Result<Self> {
        Configuration::try_from(PartialConfiguration::merged(cli_config.clone())?)
    }
}

impl TryFrom<PartialConfiguration> for Configuration {
    type Error = anyhow::Error;

    fn try_from(value: PartialConfiguration) -> Result<Self, Self::Error> {
        let login = value.login.unwrap_or_else(|| DEFAULT_LOGIN.to_owned());
        if login.is_empty() {
            bail!("The login can not be empty");
        }

        let target = match value.target {
            Some(target) => target,
            None => verify_url(DEFAULT_TARGET)?,
        };

        Ok(Self {
            target,
            login,
            password: value
                .password
                .unwrap_or_else(|| DEFAULT_PASSWORD.to_owned()),
            header: value.header,
            request_timeout: value.request_timeout.map(Duration::from_millis),
            log_level: value.log_level.unwrap_or(DEFAULT_LOG_LEVEL),
        })
    }
}

impl PartialConfiguration {
    /// Loads any configuration file named in `cli_config` and overwrites its
    /// values with those given on the command line.
    fn merged(cli_config: PartialConfiguration) -> anyhow::Result<Self> {
        let mut file_config = match cli_config.config.as_deref() {
            Some(filename) => PartialConfiguration::from_yaml_file(filename)?,
            None => return Ok(cli_config),
        };

        // Prefer cli values if present
        file_config.overwrite_from(cli_config);
        Ok(file_config)
    }

    /// Loads a PartialConfiguration from a yaml file
    fn from_yaml_file(filename: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(filename)
            .with_context(|| format!("Error opening configuration file {filename:?}"))?;
        serde_yaml::from_reader(file)
            .with_context(|| format!("Error parsing configuration file {filename:?}"))
    }

    /// Overwrites `self` with the options given in other. If `other` contains
    /// None for a certain field, leaves the value from `self` in place.
    fn overwrite_from(&mut self, other: PartialConfiguration) {
        *self = PartialConfiguration {
            config: other.config.or(self.config.take()),
            target: other.target.or(self.target.take()),
            login: other.login.or(self.login.take()),
            password: other.password.or(self.password.take()),
            header: other.header.or(self.header.take()),
            request_timeout: other.request_timeout.or(self.request_timeout.take()),
            log_level: other.log_level.or_else(|| self.log_level.take()),
        };
    }
}

fn deserialize_target<'de, D>(deserializer: D) -> Result<Option<Url>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|text| verify_url(&text).map_err(serde::de::Error::custom))
        .transpose()
}

/// Parses the server address. Accepts full http(s) URLs as well as a bare
/// `host:port`, which is given the http scheme.
fn verify_url(arg: &str) -> anyhow::Result<Url> {
    let url = if has_scheme(arg) {
        Url::parse(arg)?
    } else {
        Url::parse(&format!("http://{arg}"))?
    };
    if !matches!(url.scheme(), "http" | "https") {
        bail!("The given URL does not start with a scheme (http(s)://)")
    }
    if url.host().is_none() {
        bail!("The given URL does not seem to contain a hostname")
    }
    Ok(url)
}

/// Whether `arg` starts with `<scheme>://`. A `://` further on, e.g. in the
/// query string, does not count.
fn has_scheme(arg: &str) -> bool {
    arg.split_once("://").is_some_and(|(scheme, _)| {
        scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

#[cfg(test)]
mod tests {
    use std::{io::Write, time::Duration};

    use clap::{Parser, error::ErrorKind};

    use super::{Cli, Commands, Configuration, DEFAULT_LOG_LEVEL, PartialConfiguration, verify_url};
    use crate::endpoints::SecretKind;

    #[test]
    fn test_try_from_empty() {
        let tried_config: Configuration = PartialConfiguration::default().try_into().unwrap();

        assert_eq!(tried_config.target.as_str(), "http://localhost:8080/");
        assert_eq!(tried_config.login, "python3");
        assert_eq!(tried_config.password, "python3password");
        assert_eq!(tried_config.request_timeout, None);
        assert_eq!(tried_config.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_try_from_empty_login() {
        let stored_config = PartialConfiguration {
            login: Some(String::new()),
            ..Default::default()
        };

        let tried_config: Result<Configuration, _> = stored_config.try_into();

        match tried_config {
            Ok(_) => panic!("Empty login was accepted"),
            Err(e) => assert_eq!(e.to_string(), "The login can not be empty"),
        }
    }

    #[test]
    fn test_request_timeout_in_millis() {
        let stored_config = PartialConfiguration {
            request_timeout: Some(1500),
            ..Default::default()
        };

        let tried_config: Configuration = stored_config.try_into().unwrap();

        assert_eq!(
            tried_config.request_timeout,
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn test_verify_url() {
        assert_eq!(
            verify_url("localhost:8080").unwrap().as_str(),
            "http://localhost:8080/"
        );
        assert_eq!(
            verify_url("https://vault.example.org").unwrap().as_str(),
            "https://vault.example.org/"
        );
        assert!(verify_url("ftp://vault.example.org").is_err());
    }

    #[test]
    fn test_verify_url_scheme_only_as_prefix() {
        let url = verify_url("localhost:8080/?next=http://x").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(url.port(), Some(8080));
        assert_eq!(url.query(), Some("next=http://x"));

        assert_eq!(
            verify_url("127.0.0.1:8080").unwrap().as_str(),
            "http://127.0.0.1:8080/"
        );
        assert!(verify_url("ftp://vault.example.org/?next=http://x").is_err());
    }

    #[test]
    fn test_cli_list_kind_alias() {
        let cli = Cli::try_parse_from(["cenarius-probe", "list", "cc"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::List {
                kind: SecretKind::CreditCard,
                ..
            }
        ));
    }

    #[test]
    fn test_cli_list_unknown_kind() {
        let err = Cli::try_parse_from(["cenarius-probe", "list", "wallet"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(err.to_string().contains("Unknown type of secret: wallet"));
    }

    #[test]
    fn test_overwrite() {
        let mut file_config = PartialConfiguration {
            target: Some(verify_url("http://10.0.0.2:8080").unwrap()),
            login: Some("filelogin".into()),
            password: Some("filepassword".into()),
            request_timeout: Some(10000),
            ..Default::default()
        };

        let cli_config = PartialConfiguration {
            login: Some("clilogin".into()),
            log_level: Some(log::LevelFilter::Debug),
            ..Default::default()
        };

        let result_config = PartialConfiguration {
            target: Some(verify_url("http://10.0.0.2:8080").unwrap()),
            login: Some("clilogin".into()),
            password: Some("filepassword".into()),
            request_timeout: Some(10000),
            log_level: Some(log::LevelFilter::Debug),
            ..Default::default()
        };

        file_config.overwrite_from(cli_config);
        assert_eq!(file_config, result_config);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "target: localhost:9090\nlogin: agent\npassword: agentpassword\nlog_level: warn"
        )
        .unwrap();

        let cli_config = PartialConfiguration {
            config: Some(file.path().to_owned()),
            password: Some("fromcli".into()),
            ..Default::default()
        };

        let config = Configuration::load(&cli_config).unwrap();

        assert_eq!(config.target.as_str(), "http://localhost:9090/");
        assert_eq!(config.login, "agent");
        assert_eq!(config.password, "fromcli");
        assert_eq!(config.log_level, log::LevelFilter::Warn);
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "database_dsn: postgres://localhost").unwrap();

        let cli_config = PartialConfiguration {
            config: Some(file.path().to_owned()),
            ..Default::default()
        };

        assert!(Configuration::load(&cli_config).is_err());
    }
}
