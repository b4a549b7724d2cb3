use async_trait::async_trait;
use log::debug;
use serde_json::json;

use crate::io::fake_file::FakeFile;

use super::{DeviceState, HvacMode, ThermostatError, ThermostatManager};

const DEVICE_KEY: &str = "device";

/// Thermostat backed by the `device` object of the fake file, so the
/// remote API isn't hammered while testing with short poll rates.
pub struct FakeThermostat {
    file: FakeFile,
}

impl FakeThermostat {
    pub fn new(file: FakeFile) -> Self {
        Self { file }
    }
}

#[async_trait]
impl ThermostatManager for FakeThermostat {
    async fn read_device(&self) -> Result<DeviceState, ThermostatError> {
        debug!("Returning fake device state from {:?}", self.file.get_path());
        Ok(self.file.read(DEVICE_KEY)?)
    }

    async fn set_hvac_mode(&self, _device_id: &str, mode: HvacMode) -> Result<(), ThermostatError> {
        debug!("Setting fake hvac_mode to {}", mode);
        Ok(self.file.write(DEVICE_KEY, "hvac_mode", json!(mode))?)
    }

    async fn set_target_temperature(&self, _device_id: &str, target: f32) -> Result<(), ThermostatError> {
        debug!("Setting fake target_temperature_f to {}", target);
        Ok(self.file.write(DEVICE_KEY, "target_temperature_f", json!(target))?)
    }
}
