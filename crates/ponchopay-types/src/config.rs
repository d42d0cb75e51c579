//! Client configuration.
//!
//! A PonchoPay client needs the integration key and, optionally, a base URL
//! (the production host is used otherwise). Both can be given as literal
//! values or as references to environment variables, which keeps the key out
//! of configuration files:
//!
//! ```json
//! {
//!   "key": "$PONCHOPAY_KEY",
//!   "base_url": "https://demo.ponchopay.com/"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::str::FromStr;

/// Production host of the PonchoPay API.
pub const DEFAULT_BASE_URL: &str = "https://pay.ponchopay.com/";

/// Environment variable holding the integration key.
pub const KEY_ENV: &str = "PONCHOPAY_KEY";
/// Environment variable holding the base URL.
pub const BASE_URL_ENV: &str = "PONCHOPAY_BASE_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable '{0}' not found")]
    MissingEnv(&'static str),
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration of a PonchoPay client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Integration key.
    pub key: LiteralOrEnv<String>,
    /// Base URL of the API. Defaults to [`DEFAULT_BASE_URL`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<LiteralOrEnv<String>>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: LiteralOrEnv::from_literal(key.into()),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(LiteralOrEnv::from_literal(base_url.into()));
        self
    }

    /// Reads `PONCHOPAY_KEY` and, if set, `PONCHOPAY_BASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let key = std::env::var(KEY_ENV).map_err(|_| ConfigError::MissingEnv(KEY_ENV))?;
        let config = Self::new(key);
        Ok(match std::env::var(BASE_URL_ENV) {
            Ok(base_url) => config.with_base_url(base_url),
            Err(_) => config,
        })
    }

    /// Parses a JSON document, resolving `$VAR` and `${VAR}` references.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(String::as_str)
            .unwrap_or(DEFAULT_BASE_URL)
    }
}

/// A transparent wrapper that resolves environment variables during deserialization.
///
/// Supports both literal values and environment variable references:
/// - Literal: `"https://demo.ponchopay.com/"`
/// - Simple env var: `"$PONCHOPAY_KEY"`
/// - Braced env var: `"${PONCHOPAY_KEY}"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(T);

impl<T> LiteralOrEnv<T> {
    pub fn from_literal(value: T) -> Self {
        Self(value)
    }

    /// Returns the variable name if the string matches `$VAR` or `${VAR}` syntax.
    fn parse_env_var_syntax(s: &str) -> Option<&str> {
        if let Some(name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
            Some(name)
        } else {
            let name = s.strip_prefix('$')?;
            let valid = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
            valid.then_some(name)
        }
    }
}

impl<T> Deref for LiteralOrEnv<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        let value = match Self::parse_env_var_syntax(&s) {
            Some(var_name) => std::env::var(var_name).map_err(|_| {
                serde::de::Error::custom(format!(
                    "Environment variable '{}' not found (referenced as '{}')",
                    var_name, s
                ))
            })?,
            None => s,
        };

        let parsed = value
            .parse::<T>()
            .map_err(|e| serde::de::Error::custom(format!("Failed to parse value: {}", e)))?;

        Ok(LiteralOrEnv(parsed))
    }
}

impl<T> Serialize for LiteralOrEnv<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}
