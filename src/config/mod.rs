use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub mod security;

pub use security::{create_no_store_layer, hsts_from_env, with_security_headers};

const SANDBOX_API_URL: &str = "https://api-3t.sandbox.paypal.com/nvp";
const SANDBOX_LOGIN_URL: &str =
    "https://www.sandbox.paypal.com/cgi-bin/webscr?cmd=_express-checkout&token=";
const LIVE_API_URL: &str = "https://api-3t.paypal.com/nvp";
const LIVE_LOGIN_URL: &str = "https://www.paypal.com/cgi-bin/webscr?cmd=_express-checkout&token=";

const DEFAULT_API_VERSION: &str = "91.0";
const DEFAULT_CURRENCY: &str = "EUR";
const DEFAULT_PORT: u16 = 3001;

/// Prefix of environment variables that add or override default gateway fields.
const DEFAULT_FIELD_PREFIX: &str = "PAYPAL_DEFAULT_";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Everything the checkout steps need to talk to the gateway and to build
/// absolute callback URLs.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_url: Url,
    /// Hosted login page; the token is appended verbatim.
    pub login_url: String,
    pub hostname: Url,
    /// Fields merged into every outbound call.
    pub defaults: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
}

impl GatewayConfig {
    /// Joins `path` onto the configured hostname.
    pub fn absolute_url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.hostname.join(path)
    }

    pub fn login_redirect(&self, token: &str) -> String {
        format!("{}{}", self.login_url, token)
    }
}

pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub gateway: GatewayConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env::vars())
    }

    /// Builds the configuration from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: BTreeMap<String, String> = vars.into_iter().collect();
        let get = |key: &str| lookup(&vars, key);
        let require = |key: &'static str| required(&vars, key);

        let live = match get("PAYPAL_LIVE") {
            Some(value) => parse_flag("PAYPAL_LIVE", value)?,
            None => false,
        };
        let (default_api, default_login) = if live {
            (LIVE_API_URL, LIVE_LOGIN_URL)
        } else {
            (SANDBOX_API_URL, SANDBOX_LOGIN_URL)
        };

        let api_url = parse_url("PAYPAL_API_URL", get("PAYPAL_API_URL").unwrap_or(default_api))?;
        let login_url = get("PAYPAL_LOGIN_URL").unwrap_or(default_login).to_string();
        let hostname = parse_url("HOSTNAME", require("HOSTNAME")?)?;

        let timeout = get("PAYPAL_TIMEOUT_SECS")
            .map(|value| {
                value
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| ConfigError::Invalid {
                        key: "PAYPAL_TIMEOUT_SECS",
                        reason: e.to_string(),
                    })
            })
            .transpose()?;

        let port = get("PORT")
            .map(|value| {
                value.parse::<u16>().map_err(|e| ConfigError::Invalid {
                    key: "PORT",
                    reason: e.to_string(),
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_PORT);

        let mut defaults = BTreeMap::new();
        defaults.insert("USER".to_string(), require("PAYPAL_USER")?.to_string());
        defaults.insert("PWD".to_string(), require("PAYPAL_PWD")?.to_string());
        defaults.insert("SIGNATURE".to_string(), require("PAYPAL_SIGNATURE")?.to_string());
        defaults.insert(
            "VERSION".to_string(),
            get("PAYPAL_VERSION").unwrap_or(DEFAULT_API_VERSION).to_string(),
        );
        defaults.insert(
            "PAYMENTREQUEST_0_PAYMENTACTION".to_string(),
            "Sale".to_string(),
        );
        defaults.insert(
            "PAYMENTREQUEST_0_CURRENCYCODE".to_string(),
            get("PAYPAL_CURRENCY").unwrap_or(DEFAULT_CURRENCY).to_string(),
        );
        defaults.insert("NOSHIPPING".to_string(), "1".to_string());
        defaults.insert("SOLUTIONTYPE".to_string(), "Sole".to_string());
        defaults.insert("LANDINGPAGE".to_string(), "Billing".to_string());

        for (key, value) in &vars {
            if let Some(field) = key.strip_prefix(DEFAULT_FIELD_PREFIX) {
                if !field.is_empty() {
                    defaults.insert(field.to_string(), value.clone());
                }
            }
        }

        Ok(Self {
            database_url: require("DATABASE_URL")?.to_string(),
            port,
            gateway: GatewayConfig {
                api_url,
                login_url,
                hostname,
                defaults,
                timeout,
            },
        })
    }
}

fn lookup<'a>(vars: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn required<'a>(vars: &'a BTreeMap<String, String>, key: &'static str) -> Result<&'a str, ConfigError> {
    lookup(vars, key).ok_or(ConfigError::Missing(key))
}

fn parse_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("expected a boolean, got '{}'", other),
        }),
    }
}
