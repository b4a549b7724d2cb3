use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde_with::serde_as;
use serde_with::DurationSeconds;
use thiserror::Error;

use crate::brain::policy::PolicyConfig;
use crate::io::outdoor::owm::OWM_URL;
use crate::io::thermostat::auth::AUTH_URL;
use crate::io::thermostat::nest::API_URL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read configuration from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot parse configuration from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

#[derive(Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct Config {
    nest: NestConfig,
    weather: Option<WeatherConfig>,
    #[serde(default)]
    policy: PolicyConfig,
    #[serde(default)]
    poll: PollConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl Config {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let config = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_owned(), source })?;
        let config: Config = toml::from_str(&config)
            .map_err(|source| ConfigError::Parse { path: path.to_owned(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let problems = self.policy.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    pub fn get_nest(&self) -> &NestConfig {
        &self.nest
    }

    pub fn get_weather(&self) -> Option<&WeatherConfig> {
        self.weather.as_ref()
    }

    pub fn get_policy(&self) -> &PolicyConfig {
        &self.policy
    }

    pub fn get_poll(&self) -> &PollConfig {
        &self.poll
    }

    pub fn get_logging(&self) -> &LoggingConfig {
        &self.logging
    }
}

fn default_token_file() -> PathBuf {
    PathBuf::from("nest_follow.tkn")
}

fn default_api_url() -> String {
    API_URL.to_owned()
}

fn default_auth_url() -> String {
    AUTH_URL.to_owned()
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(30)
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct NestConfig {
    client_id: String,
    client_secret: String,
    /// Where the access token is kept between runs.
    #[serde(default = "default_token_file")]
    token_file: PathBuf,
    #[serde(default = "default_api_url")]
    api_url: String,
    #[serde(default = "default_auth_url")]
    auth_url: String,
    /// Timeout for every request to the thermostat and weather APIs.
    #[serde_as(as = "DurationSeconds")]
    #[serde(default = "default_http_timeout")]
    timeout_secs: Duration,
}

impl NestConfig {
    #[cfg(test)]
    pub fn new(client_id: String, client_secret: String, token_file: PathBuf, auth_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            token_file,
            api_url: default_api_url(),
            auth_url,
            timeout_secs: default_http_timeout(),
        }
    }

    pub fn get_client_id(&self) -> &str {
        &self.client_id
    }

    pub fn get_client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn get_token_file(&self) -> &Path {
        &self.token_file
    }

    pub fn get_api_url(&self) -> &str {
        &self.api_url
    }

    pub fn get_auth_url(&self) -> &str {
        &self.auth_url
    }

    pub fn get_timeout(&self) -> &Duration {
        &self.timeout_secs
    }
}

fn default_owm_url() -> String {
    OWM_URL.to_owned()
}

fn default_weather_refresh() -> Duration {
    Duration::from_secs(30)
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct WeatherConfig {
    /// openweathermap.org access key
    key: String,
    /// openweathermap.org city code
    city_id: String,
    #[serde(default = "default_owm_url")]
    url: String,
    /// How long an outdoor reading is used for before asking again.
    #[serde_as(as = "DurationSeconds")]
    #[serde(default = "default_weather_refresh")]
    refresh_secs: Duration,
}

impl WeatherConfig {
    #[cfg(test)]
    pub fn new(key: String, city_id: String, url: String) -> Self {
        Self {
            key,
            city_id,
            url,
            refresh_secs: default_weather_refresh(),
        }
    }

    pub fn get_key(&self) -> &str {
        &self.key
    }

    pub fn get_city_id(&self) -> &str {
        &self.city_id
    }

    pub fn get_url(&self) -> &str {
        &self.url
    }

    pub fn get_refresh(&self) -> &Duration {
        &self.refresh_secs
    }
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct PollConfig {
    #[serde_as(as = "DurationSeconds")]
    interval_secs: Duration,
    /// Control is paused while this file is missing.
    enable_file: PathBuf,
    /// Stand-in for the remote APIs, used with --fake and --outdoor.
    fake_file: PathBuf,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: Duration::from_secs(65),
            enable_file: PathBuf::from("gojnest"),
            fake_file: PathBuf::from("fake.json"),
        }
    }
}

impl PollConfig {
    pub fn get_interval(&self) -> &Duration {
        &self.interval_secs
    }

    pub fn get_enable_file(&self) -> &Path {
        &self.enable_file
    }

    pub fn get_fake_file(&self) -> &Path {
        &self.fake_file
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    directory: PathBuf,
    file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            file_prefix: "nest_follow.log".to_owned(),
        }
    }
}

impl LoggingConfig {
    /// Only the `[logging]` section, falling back to defaults, so a config file
    /// that fails to load can still have its error logged in the right place.
    pub fn read_lenient(path: &Path) -> Self {
        fs::read_to_string(path).ok()
            .and_then(|s| s.parse::<toml::Value>().ok())
            .and_then(|value| value.get("logging").cloned())
            .and_then(|logging| logging.try_into().ok())
            .unwrap_or_default()
    }

    pub fn get_directory(&self) -> &Path {
        &self.directory
    }

    pub fn get_file_prefix(&self) -> &str {
        &self.file_prefix
    }
}
