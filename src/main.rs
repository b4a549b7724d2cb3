use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::sleep;
use std::time::{Duration, Instant};

use clap::Parser;
use tokio::runtime::{Builder, Runtime};
use tracing::{error, info, Level};

use crate::brain::follow_target::FollowTargetBrain;
use crate::brain::{Brain, BrainFailure};
use crate::config::{Config, LoggingConfig};
use crate::io::enable_file::EnableFile;
use crate::io::fake_file::FakeFile;
use crate::io::outdoor::fake::FakeOutdoor;
use crate::io::outdoor::owm::OpenWeatherMap;
use crate::io::outdoor::OutdoorTemperatureManager;
use crate::io::thermostat::auth::obtain_access_token;
use crate::io::thermostat::fake::FakeThermostat;
use crate::io::thermostat::nest::NestThermostat;
use crate::io::thermostat::ThermostatManager;
use crate::io::IOBundle;
use crate::time_util::mytime::RealTimeProvider;

mod brain;
mod config;
mod io;
mod logging;
mod time_util;

const CONFIG_FILE: &str = "nest_follow.toml";

/// Below this we'd be hammering the real API, so fake it instead.
const MIN_POLL_TIME: Duration = Duration::from_secs(5);

/// Outdoor refresh when there's no weather section to say otherwise.
const DEFAULT_OUTDOOR_REFRESH: Duration = Duration::from_secs(30);

const EXIT_CHECK_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(version, about = "Nest thermostat monitoring and control.")]
struct Args {
    /// Authentication PIN, exchanged for a new access token
    #[arg(short, long)]
    pin: Option<String>,

    /// Log debug messages
    #[arg(short, long, conflicts_with = "quiet")]
    debug: bool,

    /// Suppress info log messages
    #[arg(short, long)]
    quiet: bool,

    /// Fake calls to the Nest API using the fake file (forces --outdoor)
    #[arg(short, long)]
    fake: bool,

    /// Get the outdoor temperature from the fake file (forced by --fake)
    #[arg(short, long)]
    outdoor: bool,

    /// Poll rate in seconds (forces --fake if below 5)
    #[arg(short, long)]
    rate: Option<u64>,

    /// Configuration file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,
}

/// How often to poll and to refresh the outdoor temperature, once the flags
/// have been reconciled with the config file.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Timing {
    interval: Duration,
    outdoor_refresh: Duration,
}

impl Args {
    /// A rate below `MIN_POLL_TIME` forces `--fake`, and `--fake` forces `--outdoor`.
    /// The fake outdoor source is refreshed at least once per poll.
    fn resolve(&mut self, configured_interval: Duration, configured_refresh: Duration) -> Timing {
        let interval = self.rate.map(Duration::from_secs).unwrap_or(configured_interval);
        if interval < MIN_POLL_TIME {
            self.fake = true;
        }
        if self.fake {
            self.outdoor = true;
        }

        let outdoor_refresh = if self.outdoor {
            configured_refresh.min(interval)
        } else {
            configured_refresh
        };
        Timing { interval, outdoor_refresh }
    }

    fn console_level(&self) -> Level {
        if self.debug {
            Level::DEBUG
        } else if self.quiet {
            Level::WARN
        } else {
            Level::INFO
        }
    }
}

fn main() -> ExitCode {
    let mut args = Args::parse();

    let config = Config::read(&args.config);
    let logging_config = match &config {
        Ok(config) => config.get_logging().clone(),
        Err(_) => LoggingConfig::read_lenient(&args.config),
    };

    let _logging = match logging::init_logging(args.console_level(), &logging_config) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    info!("{} Version {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = match config {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            error!("Terminating program.");
            return ExitCode::FAILURE;
        }
    };

    let configured_refresh = config.get_weather()
        .map(|weather| *weather.get_refresh())
        .unwrap_or(DEFAULT_OUTDOOR_REFRESH);
    let timing = args.resolve(*config.get_poll().get_interval(), configured_refresh);

    match run(&args, &config, timing) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            error!("Terminating program.");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, config: &Config, timing: Timing) -> Result<(), Box<dyn Error>> {
    let rt = Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .enable_io()
        .build()?;

    let fake_file = FakeFile::new(config.get_poll().get_fake_file().to_owned());

    let thermostat: Box<dyn ThermostatManager> = if args.fake {
        info!("Faking the thermostat with {:?}", fake_file.get_path());
        Box::new(FakeThermostat::new(fake_file.clone()))
    } else {
        let nest = config.get_nest();
        let token = rt.block_on(obtain_access_token(nest, args.pin.as_deref()))?;
        Box::new(NestThermostat::new(nest.get_api_url().to_owned(), token, *nest.get_timeout())?)
    };

    let outdoor: Option<Box<dyn OutdoorTemperatureManager>> = if args.outdoor {
        info!("Faking the outdoor temperature with {:?}", fake_file.get_path());
        Some(Box::new(FakeOutdoor::new(fake_file)))
    } else if let Some(weather) = config.get_weather() {
        Some(Box::new(OpenWeatherMap::new(weather, *config.get_nest().get_timeout())?))
    } else {
        info!("No weather configured, decisions will only use indoor temperatures");
        None
    };

    let io_bundle = IOBundle::new(thermostat, outdoor);
    let brain = FollowTargetBrain::new(config.get_policy().clone(), timing.outdoor_refresh);
    let enable_file = EnableFile::create(config.get_poll().get_enable_file().to_owned())?;

    let should_exit = Arc::new(AtomicBool::new(false));
    {
        let should_exit = should_exit.clone();
        ctrlc::set_handler(move || {
            info!("Received termination signal.");
            should_exit.store(true, Ordering::Relaxed);
        })?;
    }

    main_loop(brain, &io_bundle, &rt, enable_file, timing.interval, &should_exit)?;
    rt.shutdown_background();
    Ok(())
}

fn main_loop<B>(mut brain: B, io_bundle: &IOBundle, rt: &Runtime, mut enable_file: EnableFile, interval: Duration, should_exit: &AtomicBool) -> Result<(), BrainFailure>
    where B: Brain {
    let time_provider = RealTimeProvider::default();

    info!("Polling every {}s while {:?} exists.", interval.as_secs(), enable_file.get_path());
    loop {
        if enable_file.check() {
            brain.run(rt, io_bundle, &time_provider)?;
        }
        if sleep_unless_exit(interval, should_exit) {
            info!("Stopped.");
            return Ok(());
        }
    }
}

/// Returns true if we were asked to exit while sleeping.
fn sleep_unless_exit(duration: Duration, should_exit: &AtomicBool) -> bool {
    let deadline = Instant::now() + duration;
    while !should_exit.load(Ordering::Relaxed) {
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        sleep((deadline - now).min(EXIT_CHECK_INTERVAL));
    }
    true
}
