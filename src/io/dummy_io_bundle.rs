use std::sync::mpsc::Sender;
use std::sync::Arc;

use super::dummy::DummyIO;
use super::thermostat::{DeviceState, HvacMode};
use super::{outdoor, thermostat, IOBundle};

pub const DUMMY_DEVICE_ID: &str = "dummy-thermostat";

pub struct DummyIOBundleHandle {
    thermostat_handle: Sender<thermostat::dummy::ModifyState>,
    outdoor_handle: Option<Sender<outdoor::dummy::ModifyState>>,
    thermostat: Arc<thermostat::dummy::Dummy>,
    outdoor: Option<Arc<outdoor::dummy::Dummy>>,
}

impl DummyIOBundleHandle {
    pub fn send_thermostat(&mut self, msg: thermostat::dummy::ModifyState) {
        self.thermostat_handle.send(msg).unwrap();
    }

    pub fn send_outdoor(&mut self, msg: outdoor::dummy::ModifyState) {
        self.outdoor_handle.as_ref()
            .expect("Dummy bundle was created without an outdoor source")
            .send(msg)
            .unwrap();
    }

    pub fn thermostat_writes(&self) -> usize {
        self.thermostat.successful_writes()
    }

    pub fn outdoor_fetches(&self) -> usize {
        self.outdoor.as_ref().map_or(0, |outdoor| outdoor.fetches())
    }
}

pub fn dummy_device(ambient: f32, mode: HvacMode, target: f32) -> DeviceState {
    DeviceState::new(ambient, mode, target, DUMMY_DEVICE_ID.to_owned())
}

/// Bundle with a dummy thermostat and, if `outdoor_temp` is given, a dummy outdoor source
/// starting at that reading.
pub fn new_dummy_io(device: DeviceState, outdoor_temp: Option<Option<f32>>) -> (IOBundle, DummyIOBundleHandle) {
    let (thermostat, thermostat_handle) = thermostat::dummy::Dummy::create(&device);
    let thermostat = Arc::new(thermostat);

    let (outdoor, outdoor_handle) = match outdoor_temp {
        Some(initial) => {
            let (outdoor, handle) = outdoor::dummy::Dummy::create(&initial);
            (Some(Arc::new(outdoor)), Some(handle))
        }
        None => (None, None),
    };

    let io_bundle = IOBundle::new(
        Box::new(thermostat.clone()),
        outdoor.clone().map(|outdoor| Box::new(outdoor) as Box<dyn outdoor::OutdoorTemperatureManager>),
    );

    let handle = DummyIOBundleHandle {
        thermostat_handle,
        outdoor_handle,
        thermostat,
        outdoor,
    };

    (io_bundle, handle)
}
