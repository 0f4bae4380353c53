use std::path::PathBuf;
use std::time::Duration;

use log::debug;

use crate::clients::{
    LastFmClient,
    entities::Credentials,
    errors::{Error, Result},
    lastfm::{API_ROOT, DEFAULT_TIMEOUT, LastFmClientBuilder},
};

const USERNAME: &str = "LASTFM_USERNAME";
const PASSWORD: &str = "LASTFM_PASSWORD";
const API_KEY: &str = "LASTFM_API_KEY";
const API_SECRET: &str = "LASTFM_API_SECRET";
const API_URL: &str = "LASTFM_API_URL";
const TIMEOUT_SECS: &str = "LASTFM_TIMEOUT_SECS";

/// Settings for talking to Last.fm
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub api_url: String,
    pub timeout: Duration,
}

impl Config {
    /// Read the settings from the process environment, see [`load_dotenv`]
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| match lookup(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(Error::ConfigurationError(format!(
                "{key} is missing or empty. Set it in the environment or in a .env file"
            ))),
        };

        let credentials = Credentials {
            api_key: required(API_KEY)?,
            api_secret: required(API_SECRET)?,
            username: required(USERNAME)?,
            password: required(PASSWORD)?,
        };

        let api_url = lookup(API_URL)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| API_ROOT.to_string());

        let timeout = match lookup(TIMEOUT_SECS) {
            None => DEFAULT_TIMEOUT,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(Error::ConfigurationError(format!(
                        "{TIMEOUT_SECS} must be a positive number of seconds, got {raw:?}"
                    )));
                }
            },
        };

        Ok(Config {
            credentials,
            api_url,
            timeout,
        })
    }

    pub fn client_builder(&self) -> LastFmClientBuilder {
        LastFmClient::builder(self.credentials.clone())
            .base_url(self.api_url.clone())
            .timeout(self.timeout)
    }
}

/// Load `.env` from the working directory, then `<config dir>/rscrobbler/.env`.
/// Variables already set in the environment win.
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded environment from {path:?}");
    }
    if let Some(path) = user_env_file() {
        if dotenvy::from_path(&path).is_ok() {
            debug!("Loaded environment from {path:?}");
        }
    }
}

fn user_env_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rscrobbler").join(".env"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("LASTFM_USERNAME", "u"),
        ("LASTFM_PASSWORD", "p"),
        ("LASTFM_API_KEY", "K"),
        ("LASTFM_API_SECRET", "S"),
    ];

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.credentials.username, "u");
        assert_eq!(config.credentials.api_secret, "S");
        assert_eq!(config.api_url, API_ROOT);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn overrides_are_read() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("LASTFM_API_URL", "https://libre.fm/2.0/"));
        pairs.push(("LASTFM_TIMEOUT_SECS", " 12 "));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.api_url, "https://libre.fm/2.0/");
        assert_eq!(config.timeout, Duration::from_secs(12));
    }

    #[test]
    fn empty_required_value_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs[1] = ("LASTFM_PASSWORD", "");
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(&err, Error::ConfigurationError(msg) if msg.contains("LASTFM_PASSWORD")));
    }

    #[test]
    fn missing_required_value_is_rejected() {
        let err = Config::from_lookup(lookup(&REQUIRED[..3])).unwrap_err();
        assert!(matches!(&err, Error::ConfigurationError(msg) if msg.contains("LASTFM_API_SECRET")));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        for bad in ["abc", "0", "-3"] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push(("LASTFM_TIMEOUT_SECS", bad));
            assert!(Config::from_lookup(lookup(&pairs)).is_err(), "{bad} accepted");
        }
    }
}
