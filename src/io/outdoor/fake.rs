use async_trait::async_trait;
use log::debug;

use crate::io::fake_file::FakeFile;

use super::{OutdoorError, OutdoorTemperatureManager};

/// Reads the outdoor temperature from the `outdoor` value in the fake file,
/// to exercise the outdoor thresholds without waiting on the weather.
pub struct FakeOutdoor {
    file: FakeFile,
}

impl FakeOutdoor {
    pub fn new(file: FakeFile) -> Self {
        Self { file }
    }
}

#[async_trait]
impl OutdoorTemperatureManager for FakeOutdoor {
    async fn get_outdoor_temperature(&self) -> Result<f32, OutdoorError> {
        let outdoor = self.file.read("outdoor")?;
        debug!("Fake outdoor temperature {}", outdoor);
        Ok(outdoor)
    }
}
