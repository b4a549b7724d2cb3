use async_trait::async_trait;
use thiserror::Error;

use crate::io::fake_file::FakeFileError;

#[cfg(test)]
pub mod dummy;
pub mod fake;
pub mod owm;

#[derive(Debug, Error)]
pub enum OutdoorError {
    #[error("Failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Weather request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather request returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Cannot parse weather response: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(test)]
    #[error("Outdoor temperature unavailable")]
    Unavailable,
    #[error(transparent)]
    Fake(#[from] FakeFileError),
}

impl OutdoorError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, OutdoorError::Fake(_))
    }
}

/// A source of the current outdoor temperature, in Fahrenheit.
#[async_trait]
pub trait OutdoorTemperatureManager: Send + Sync {
    async fn get_outdoor_temperature(&self) -> Result<f32, OutdoorError>;
}
