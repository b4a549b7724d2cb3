use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log::debug;

use crate::io;
use crate::io::dummy::DummyIO;

use super::{DeviceState, HvacMode, ThermostatError, ThermostatManager};

pub enum ModifyState {
    SetAmbient(f32),
    SetMode(HvacMode),
    SetTarget(f32),
    /// Makes every read fail until switched back.
    FailReads(bool),
    /// Makes every write fail until switched back.
    FailWrites(bool),
}

struct DummyState {
    device: DeviceState,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

pub struct Dummy {
    receiver: Mutex<Receiver<ModifyState>>,
    state: Mutex<DummyState>,
}

impl DummyIO for Dummy {
    type MessageType = ModifyState;
    type Config = DeviceState;

    fn new(receiver: Receiver<Self::MessageType>, config: &Self::Config) -> Self {
        Dummy {
            receiver: Mutex::new(receiver),
            state: Mutex::new(DummyState {
                device: config.clone(),
                fail_reads: false,
                fail_writes: false,
                writes: 0,
            }),
        }
    }
}

impl Dummy {
    fn update_state(&self) {
        let guard = self.receiver.lock().unwrap();
        let mut state = self.state.lock().unwrap();
        io::dummy::read_all(&guard, |message| {
            match message {
                ModifyState::SetAmbient(ambient) => state.device.set_ambient_temperature(ambient),
                ModifyState::SetMode(mode) => state.device.set_hvac_mode(mode),
                ModifyState::SetTarget(target) => state.device.set_target_temperature(target),
                ModifyState::FailReads(fail) => state.fail_reads = fail,
                ModifyState::FailWrites(fail) => state.fail_writes = fail,
            }
        })
    }

    /// How many writes have succeeded.
    pub fn successful_writes(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    fn write(&self, change: impl FnOnce(&mut DeviceState)) -> Result<(), ThermostatError> {
        self.update_state();
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(ThermostatError::Unavailable);
        }
        change(&mut state.device);
        state.writes += 1;
        Ok(())
    }
}

#[async_trait]
impl ThermostatManager for Dummy {
    async fn read_device(&self) -> Result<DeviceState, ThermostatError> {
        self.update_state();
        let state = self.state.lock().unwrap();
        if state.fail_reads {
            return Err(ThermostatError::Unavailable);
        }
        Ok(state.device.clone())
    }

    async fn set_hvac_mode(&self, device_id: &str, mode: HvacMode) -> Result<(), ThermostatError> {
        debug!("Dummy: Setting {} to {}", device_id, mode);
        self.write(|device| device.set_hvac_mode(mode))
    }

    async fn set_target_temperature(&self, device_id: &str, target: f32) -> Result<(), ThermostatError> {
        debug!("Dummy: Setting {} target to {}", device_id, target);
        self.write(|device| device.set_target_temperature(target))
    }
}

/// Lets a test keep hold of the dummy after handing it over.
#[async_trait]
impl ThermostatManager for Arc<Dummy> {
    async fn read_device(&self) -> Result<DeviceState, ThermostatError> {
        self.as_ref().read_device().await
    }

    async fn set_hvac_mode(&self, device_id: &str, mode: HvacMode) -> Result<(), ThermostatError> {
        self.as_ref().set_hvac_mode(device_id, mode).await
    }

    async fn set_target_temperature(&self, device_id: &str, target: f32) -> Result<(), ThermostatError> {
        self.as_ref().set_target_temperature(device_id, target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> DeviceState {
        DeviceState::new(70.0, HvacMode::Heat, 70.0, "dummy".to_owned())
    }

    #[tokio::test]
    async fn dummy_applies_messages() {
        let (dummy, sender) = Dummy::create(&device());
        sender.send(ModifyState::SetAmbient(75.0)).unwrap();
        sender.send(ModifyState::SetMode(HvacMode::Eco)).unwrap();

        let state = dummy.read_device().await.unwrap();
        assert_eq!(state.get_ambient_temperature(), 75.0);
        assert_eq!(state.get_hvac_mode(), HvacMode::Eco);
    }

    #[tokio::test]
    async fn failing_writes_change_nothing() {
        let (dummy, sender) = Dummy::create(&device());
        sender.send(ModifyState::FailWrites(true)).unwrap();

        assert!(dummy.set_hvac_mode("dummy", HvacMode::Cool).await.is_err());
        assert_eq!(dummy.read_device().await.unwrap().get_hvac_mode(), HvacMode::Heat);
        assert_eq!(dummy.successful_writes(), 0);
    }
}
