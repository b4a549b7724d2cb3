use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::{debug, error, info};

use crate::brain::policy::{self, Command, PolicyConfig};
use crate::brain::{Brain, BrainFailure};
use crate::brain_fail;
use crate::io::thermostat::{DeviceState, HvacMode, ThermostatError};
use crate::io::IOBundle;
use crate::time_util::mytime::TimeProvider;
use outdoor_cache::OutdoorCache;

mod outdoor_cache;

/// What the thermostat looked like on a previous poll.
#[derive(Debug, Clone, PartialEq)]
struct Observation {
    mode: HvacMode,
    target: f32,
    ambient: f32,
}

impl From<&DeviceState> for Observation {
    fn from(device: &DeviceState) -> Self {
        Self {
            mode: device.get_hvac_mode(),
            target: device.get_target_temperature(),
            ambient: device.get_ambient_temperature(),
        }
    }
}

/// The only state carried between polls. Empty until the first successful read.
#[derive(Debug, Default)]
struct PollState {
    last: Option<Observation>,
}

impl PollState {
    fn changed(&self, observation: &Observation) -> bool {
        self.last.as_ref() != Some(observation)
    }

    /// Only act once a mode has been seen on two polls in a row, so we never
    /// fight a change someone (or we) just made.
    fn mode_unchanged(&self, mode: HvacMode) -> bool {
        self.last.as_ref().is_some_and(|last| last.mode == mode)
    }

    fn record(&mut self, observation: Observation) {
        self.last = Some(observation);
    }
}

/// Keeps the thermostat in plain heat or cool, following whatever target
/// has been set, and pulls it back when the mode or target stops making sense.
pub struct FollowTargetBrain {
    config: PolicyConfig,
    poll_state: PollState,
    outdoor: OutdoorCache,
}

impl FollowTargetBrain {
    pub fn new(config: PolicyConfig, outdoor_refresh: Duration) -> Self {
        Self {
            config,
            poll_state: PollState::default(),
            outdoor: OutdoorCache::new(outdoor_refresh),
        }
    }

    /// Set the mode and, only if that worked, the target.
    fn apply(&self, runtime: &Runtime, io_bundle: &IOBundle, device: &DeviceState, command: Command) -> Result<(), BrainFailure> {
        let thermostat = io_bundle.thermostat();
        let device_id = device.get_device_id();

        if let Err(err) = runtime.block_on(thermostat.set_hvac_mode(device_id, command.get_mode())) {
            return skip_or_fail(err, &format!("Failed to set mode to {}", command.get_mode()));
        }
        if let Err(err) = runtime.block_on(thermostat.set_target_temperature(device_id, command.get_target())) {
            return skip_or_fail(err, &format!("Set mode to {} but failed to set target to {}", command.get_mode(), command.get_target()));
        }

        info!("{}", command);
        Ok(())
    }
}

fn skip_or_fail(err: ThermostatError, context: &str) -> Result<(), BrainFailure> {
    if err.is_fatal() {
        return Err(brain_fail!(format!("{}: {}", context, err)));
    }
    error!("{}: {}", context, err);
    Ok(())
}

fn status_line(device: &DeviceState, outdoor: Option<f32>) -> String {
    let outdoor = match outdoor {
        Some(outdoor) => format!("{:.0}", outdoor),
        None => "(none)".to_owned(),
    };
    format!("Target={}, ambient={}, outdoor={}, mode={}",
        device.get_target_temperature(),
        device.get_ambient_temperature(),
        outdoor,
        device.get_hvac_mode())
}

impl Brain for FollowTargetBrain {
    fn run(&mut self, runtime: &Runtime, io_bundle: &IOBundle, time_provider: &impl TimeProvider) -> Result<(), BrainFailure> {
        let device = match runtime.block_on(io_bundle.thermostat().read_device()) {
            Ok(device) => device,
            Err(err) => return skip_or_fail(err, "Failed to read thermostat, skipping this poll"),
        };

        let outdoor = self.outdoor.get(runtime, io_bundle.outdoor(), time_provider)?;
        let observation = Observation::from(&device);

        if self.poll_state.changed(&observation) {
            info!("{}", status_line(&device, outdoor));
        }

        if self.poll_state.mode_unchanged(device.get_hvac_mode()) {
            let command = policy::evaluate(
                device.get_hvac_mode(),
                device.get_ambient_temperature(),
                device.get_target_temperature(),
                outdoor,
                &self.config,
            );
            if let Some(command) = command {
                debug!("Decided: {:?}", command);
                self.apply(runtime, io_bundle, &device, command)?;
            }
        }

        self.poll_state.record(observation);
        Ok(())
    }
}
