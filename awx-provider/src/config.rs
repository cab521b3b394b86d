//! Provider configuration
//!
//! Settings come from the manifest's `provider` block; connection settings
//! fall back to `AWX_*` environment variables and then to built-in defaults.

use std::collections::HashMap;
use std::time::Duration;

use awx_core::resource::Value;
use thiserror::Error;

use crate::wait::WaitOptions;

pub const DEFAULT_HOSTNAME: &str = "http://localhost";
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "password";

const KNOWN_ATTRIBUTES: &[&str] = &[
    "hostname",
    "username",
    "password",
    "insecure",
    "project_sync_interval_secs",
    "project_sync_timeout_secs",
];

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Unknown provider attribute '{0}'")]
    UnknownAttribute(String),

    #[error("Provider attribute '{name}' must be {expected}")]
    InvalidAttribute { name: String, expected: &'static str },

    #[error("Environment variable {name} has invalid value '{value}'")]
    InvalidEnv { name: String, value: String },
}

/// Resolved provider settings
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    pub hostname: String,
    pub username: String,
    pub password: String,
    /// Skip TLS certificate verification
    pub insecure: bool,
    pub wait: WaitOptions,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("insecure", &self.insecure)
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            insecure: false,
            wait: WaitOptions::default(),
        }
    }
}

impl ProviderConfig {
    /// Resolve configuration from provider attributes and the process environment
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> Result<Self, ConfigError> {
        Self::resolve(attributes, |name| std::env::var(name).ok())
    }

    /// Resolve configuration with an explicit environment lookup
    pub fn resolve<F>(attributes: &HashMap<String, Value>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut names: Vec<&String> = attributes.keys().collect();
        names.sort_unstable();
        if let Some(unknown) = names
            .into_iter()
            .find(|name| !KNOWN_ATTRIBUTES.contains(&name.as_str()))
        {
            return Err(ConfigError::UnknownAttribute(unknown.clone()));
        }

        let string_setting = |name: &str, var: &str, default: &str| -> Result<String, ConfigError> {
            match attributes.get(name) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(_) => Err(ConfigError::InvalidAttribute {
                    name: name.to_string(),
                    expected: "a string",
                }),
                None => Ok(env(var).unwrap_or_else(|| default.to_string())),
            }
        };

        let hostname = string_setting("hostname", "AWX_HOSTNAME", DEFAULT_HOSTNAME)?;
        let username = string_setting("username", "AWX_USERNAME", DEFAULT_USERNAME)?;
        let password = string_setting("password", "AWX_PASSWORD", DEFAULT_PASSWORD)?;

        let insecure = match attributes.get("insecure") {
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                return Err(ConfigError::InvalidAttribute {
                    name: "insecure".to_string(),
                    expected: "a boolean",
                });
            }
            None => match env("AWX_INSECURE") {
                Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidEnv {
                    name: "AWX_INSECURE".to_string(),
                    value: raw,
                })?,
                None => false,
            },
        };

        let mut wait = WaitOptions::default();
        if let Some(secs) = seconds(attributes, "project_sync_interval_secs")? {
            wait.interval = Duration::from_secs(secs);
        }
        wait.timeout = seconds(attributes, "project_sync_timeout_secs")?.map(Duration::from_secs);

        Ok(Self {
            hostname,
            username,
            password,
            insecure,
            wait,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" | "" => Some(false),
        _ => None,
    }
}

fn seconds(attributes: &HashMap<String, Value>, name: &str) -> Result<Option<u64>, ConfigError> {
    match attributes.get(name) {
        None => Ok(None),
        Some(Value::Int(n)) if *n >= 0 => Ok(Some(*n as u64)),
        Some(_) => Err(ConfigError::InvalidAttribute {
            name: name.to_string(),
            expected: "a non-negative integer",
        }),
    }
}
