#[cfg(test)]
pub mod dummy;
#[cfg(test)]
pub mod dummy_io_bundle;
pub mod enable_file;
pub mod fake_file;
pub mod outdoor;
pub mod thermostat;

use crate::io::outdoor::OutdoorTemperatureManager;
use crate::io::thermostat::ThermostatManager;

pub struct IOBundle {
    thermostat: Box<dyn ThermostatManager>,
    outdoor: Option<Box<dyn OutdoorTemperatureManager>>,
}

impl IOBundle {
    pub fn new(thermostat: Box<dyn ThermostatManager>,
               outdoor: Option<Box<dyn OutdoorTemperatureManager>>) -> IOBundle {
        IOBundle {
            thermostat,
            outdoor,
        }
    }

    pub fn thermostat(&self) -> &dyn ThermostatManager {
        &*self.thermostat
    }

    /// None when no outdoor source is configured.
    pub fn outdoor(&self) -> Option<&dyn OutdoorTemperatureManager> {
        self.outdoor.as_deref()
    }
}
