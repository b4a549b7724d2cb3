use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::io;
use crate::io::dummy::DummyIO;

use super::{OutdoorError, OutdoorTemperatureManager};

pub enum ModifyState {
    SetTemp(f32),
    Unavailable,
}

pub struct Dummy {
    receiver: Mutex<Receiver<ModifyState>>,
    temp: Mutex<Option<f32>>,
    fetches: Mutex<usize>,
}

impl DummyIO for Dummy {
    type MessageType = ModifyState;
    type Config = Option<f32>;

    fn new(receiver: Receiver<Self::MessageType>, config: &Self::Config) -> Self {
        Dummy {
            receiver: Mutex::new(receiver),
            temp: Mutex::new(*config),
            fetches: Mutex::new(0),
        }
    }
}

impl Dummy {
    fn update_state(&self) {
        let guard = self.receiver.lock().unwrap();
        let mut temp = self.temp.lock().unwrap();
        io::dummy::read_all(&guard, |message| {
            match message {
                ModifyState::SetTemp(new_temp) => temp.replace(new_temp),
                ModifyState::Unavailable => temp.take(),
            };
        })
    }

    pub fn fetches(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl OutdoorTemperatureManager for Dummy {
    async fn get_outdoor_temperature(&self) -> Result<f32, OutdoorError> {
        self.update_state();
        *self.fetches.lock().unwrap() += 1;
        let temp = *self.temp.lock().unwrap();
        temp.ok_or(OutdoorError::Unavailable)
    }
}

#[async_trait]
impl OutdoorTemperatureManager for Arc<Dummy> {
    async fn get_outdoor_temperature(&self) -> Result<f32, OutdoorError> {
        self.as_ref().get_outdoor_temperature().await
    }
}
