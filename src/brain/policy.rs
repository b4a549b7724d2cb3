use std::fmt::{Display, Formatter};

use serde::Deserialize;

use crate::io::thermostat::HvacMode;

/// Thresholds that decide when to switch between heat and cool, and what a
/// sensible target is in each. All in Fahrenheit.
#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Target to set when switching to cool.
    cool_target: f32,
    /// Target to set when switching to heat.
    heat_target: f32,
    /// Ambient temperature above which we cool no matter what.
    max_allowed_temp: f32,
    /// Ambient temperature below which we heat no matter what.
    min_allowed_temp: f32,
    /// Outdoor temperature at or above which cooling is allowed.
    outdoor_cool_thresh: f32,
    /// Outdoor temperature at or below which heating is allowed.
    outdoor_heat_thresh: f32,
    min_cool_target: f32,
    max_cool_target: f32,
    min_heat_target: f32,
    max_heat_target: f32,
    /// How far the ambient has to overshoot the target before we flip modes.
    mode_switch_margin: f32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            cool_target: 76.0,
            heat_target: 70.0,
            max_allowed_temp: 80.0,
            min_allowed_temp: 62.0,
            outdoor_cool_thresh: 65.0,
            outdoor_heat_thresh: 70.0,
            min_cool_target: 72.0,
            max_cool_target: 82.0,
            min_heat_target: 60.0,
            max_heat_target: 76.0,
            mode_switch_margin: 2.0,
        }
    }
}

impl PolicyConfig {
    #[cfg(test)]
    pub fn get_cool_target(&self) -> f32 {
        self.cool_target
    }

    #[cfg(test)]
    pub fn get_heat_target(&self) -> f32 {
        self.heat_target
    }

    /// Describes every way the thresholds contradict each other.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut expect_order = |low: (&str, f32), high: (&str, f32)| {
            if low.1 > high.1 {
                problems.push(format!("{} ({}) is above {} ({})", low.0, low.1, high.0, high.1));
            }
        };

        expect_order(("min_allowed_temp", self.min_allowed_temp), ("max_allowed_temp", self.max_allowed_temp));
        expect_order(("min_cool_target", self.min_cool_target), ("cool_target", self.cool_target));
        expect_order(("cool_target", self.cool_target), ("max_cool_target", self.max_cool_target));
        expect_order(("min_heat_target", self.min_heat_target), ("heat_target", self.heat_target));
        expect_order(("heat_target", self.heat_target), ("max_heat_target", self.max_heat_target));

        if self.mode_switch_margin < 0.0 {
            problems.push(format!("mode_switch_margin ({}) is negative", self.mode_switch_margin));
        }
        problems
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandKind {
    /// Changing mode away from `from`.
    Switch { from: HvacMode },
    /// Staying in the same mode, but the target is out of bounds.
    OverrideTarget,
}

/// What to tell the thermostat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    mode: HvacMode,
    target: f32,
    kind: CommandKind,
}

impl Command {
    fn heat(from: HvacMode, config: &PolicyConfig) -> Self {
        Self::to(HvacMode::Heat, config.heat_target, from)
    }

    fn cool(from: HvacMode, config: &PolicyConfig) -> Self {
        Self::to(HvacMode::Cool, config.cool_target, from)
    }

    fn to(mode: HvacMode, target: f32, from: HvacMode) -> Self {
        let kind = if mode == from {
            CommandKind::OverrideTarget
        } else {
            CommandKind::Switch { from }
        };
        Self { mode, target, kind }
    }

    pub fn get_mode(&self) -> HvacMode {
        self.mode
    }

    pub fn get_target(&self) -> f32 {
        self.target
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            CommandKind::Switch { from } => write!(f, "Switch from {} to {} to {}", from, self.mode, self.target),
            CommandKind::OverrideTarget => write!(f, "Override target {} temp to {}", self.mode, self.target),
        }
    }
}

/// Decide what, if anything, to change given the current state of the thermostat.
///
/// `outdoor` is None when the outdoor temperature isn't known, in which case
/// only the indoor ambient and target are considered.
pub fn evaluate(mode: HvacMode, ambient: f32, target: f32, outdoor: Option<f32>, config: &PolicyConfig) -> Option<Command> {
    match mode {
        HvacMode::Heat => {
            let outdoor_allows_cool = outdoor.map_or(true, |outdoor| outdoor >= config.outdoor_cool_thresh);
            if ambient > config.max_allowed_temp
                || (ambient > target + config.mode_switch_margin
                    && ambient > config.cool_target
                    && outdoor_allows_cool) {
                Some(Command::cool(mode, config))
            } else if target > config.max_heat_target || target < config.min_heat_target {
                Some(Command::heat(mode, config))
            } else {
                None
            }
        }
        HvacMode::Cool => {
            let outdoor_allows_heat = outdoor.map_or(true, |outdoor| outdoor <= config.outdoor_heat_thresh);
            if ambient < config.min_allowed_temp
                || (ambient < target - config.mode_switch_margin
                    && ambient < config.heat_target
                    && outdoor_allows_heat) {
                Some(Command::heat(mode, config))
            } else if target < config.min_cool_target || target > config.max_cool_target {
                Some(Command::cool(mode, config))
            } else {
                None
            }
        }
        HvacMode::HeatCool | HvacMode::Eco => {
            let wants_heat = match outdoor {
                Some(outdoor) => outdoor <= config.outdoor_heat_thresh && ambient <= config.cool_target,
                None => ambient <= config.cool_target,
            };
            if wants_heat {
                Some(Command::heat(mode, config))
            } else {
                Some(Command::cool(mode, config))
            }
        }
        HvacMode::Off => None,
    }
}
