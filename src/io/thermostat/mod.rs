use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::io::fake_file::FakeFileError;

pub mod auth;
#[cfg(test)]
pub mod dummy;
pub mod fake;
pub mod nest;

/// The modes a thermostat can report. Only heat and cool are ever commanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum HvacMode {
    Heat,
    Cool,
    HeatCool,
    Eco,
    Off,
}

/// A single reading of the thermostat. All temperatures are in Fahrenheit.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DeviceState {
    #[serde(rename = "ambient_temperature_f")]
    ambient_temperature: f32,
    hvac_mode: HvacMode,
    #[serde(rename = "target_temperature_f")]
    target_temperature: f32,
    device_id: String,
}

impl DeviceState {
    pub fn get_ambient_temperature(&self) -> f32 {
        self.ambient_temperature
    }

    pub fn get_hvac_mode(&self) -> HvacMode {
        self.hvac_mode
    }

    pub fn get_target_temperature(&self) -> f32 {
        self.target_temperature
    }

    pub fn get_device_id(&self) -> &str {
        &self.device_id
    }
}

#[cfg(test)]
impl DeviceState {
    pub fn new(ambient_temperature: f32, hvac_mode: HvacMode, target_temperature: f32, device_id: String) -> Self {
        Self {
            ambient_temperature,
            hvac_mode,
            target_temperature,
            device_id,
        }
    }

    pub fn set_ambient_temperature(&mut self, ambient_temperature: f32) {
        self.ambient_temperature = ambient_temperature;
    }

    pub fn set_hvac_mode(&mut self, hvac_mode: HvacMode) {
        self.hvac_mode = hvac_mode;
    }

    pub fn set_target_temperature(&mut self, target_temperature: f32) {
        self.target_temperature = target_temperature;
    }
}

#[derive(Debug, Error)]
pub enum ThermostatError {
    #[error("Failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Request to '{url}' failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to '{url}' returned {status}: {body}")]
    Status { url: String, status: u16, body: String },
    #[error("Redirect from '{url}' had no usable Location header")]
    MissingRedirectLocation { url: String },
    #[error("Cannot parse device response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No thermostat in device response")]
    NoThermostat,
    #[cfg(test)]
    #[error("Dummy thermostat is unavailable")]
    Unavailable,
    #[error(transparent)]
    Fake(#[from] FakeFileError),
}

impl ThermostatError {
    /// Whether retrying on the next poll is pointless.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ThermostatError::Fake(_) | ThermostatError::Client(_))
    }
}

#[async_trait]
pub trait ThermostatManager: Send + Sync {
    async fn read_device(&self) -> Result<DeviceState, ThermostatError>;

    async fn set_hvac_mode(&self, device_id: &str, mode: HvacMode) -> Result<(), ThermostatError>;

    async fn set_target_temperature(&self, device_id: &str, target: f32) -> Result<(), ThermostatError>;
}
