//! Backend assembly and the foreground loop.

use crate::console::ConsoleDisplay;
use crate::demo::{ConsoleLed, LoggingWeather, SimulatedPrinter, SimulatedSensor, SystemClock};
use crate::octoprint::OctoPrintClient;
use anyhow::Context;
use printbuddy_core::{BusWiring, DirFs, Engine, SettingsStore};
use printbuddy_transport::JsonRequestClient;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_LOOP_MS: u64 = 1000;

/// Printer backend ids.
pub const PRINTER_SIMULATED: usize = 0;
pub const PRINTER_OCTOPRINT: usize = 1;

/// Sensor backend ids.
pub const SENSOR_SIMULATED: usize = 0;

/// Display backend ids.
pub const DISPLAY_CONSOLE: usize = 0;

/// Runner settings read from the environment.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub data_dir: PathBuf,
    pub loop_interval: Duration,
}

impl RunnerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let data_dir = std::env::var("PRINTBUDDY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let loop_ms = match std::env::var("PRINTBUDDY_LOOP_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("PRINTBUDDY_LOOP_MS is not a number: {:?}", raw))?,
            Err(_) => DEFAULT_LOOP_MS,
        };

        Ok(Self {
            data_dir,
            loop_interval: Duration::from_millis(loop_ms),
        })
    }
}

/// Build the engine with every backend this runner provides.
pub fn assemble(data_dir: PathBuf) -> Engine<DirFs> {
    let mut engine = Engine::new(SettingsStore::new(DirFs::new(data_dir)));
    let client = Rc::new(RefCell::new(JsonRequestClient::tcp()));

    engine.register_printer_backend(
        PRINTER_SIMULATED,
        Rc::new(RefCell::new(SimulatedPrinter::default())),
    );
    engine.register_printer_backend(
        PRINTER_OCTOPRINT,
        Rc::new(RefCell::new(OctoPrintClient::new(client))),
    );
    engine.register_sensor_backend(
        SENSOR_SIMULATED,
        Rc::new(RefCell::new(SimulatedSensor::default())),
        &BusWiring {
            i2c_bus: Some(1),
            ..Default::default()
        },
    );
    engine.register_display_backend(DISPLAY_CONSOLE, Rc::new(RefCell::new(ConsoleDisplay::new())));

    engine.set_weather_backend(Rc::new(RefCell::new(LoggingWeather::default())));
    engine.set_clock_source(Rc::new(RefCell::new(SystemClock::default())));
    engine.set_status_led(Rc::new(RefCell::new(ConsoleLed)));

    engine
}

/// Run the foreground loop until `stop` is raised.
pub fn run(config: RunnerConfig, stop: &AtomicBool) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating data dir {}", config.data_dir.display()))?;

    let mut engine = assemble(config.data_dir);
    engine.setup();

    if engine.num_printers() == 0 {
        let printer = engine.add_printer();
        printer.api_type = PRINTER_SIMULATED;
        printer
            .custom_name
            .set("Demo")
            .context("demo printer name")?;
        printer
            .remote_address
            .set("localhost")
            .context("demo printer address")?;
        printer.remote_port = 80;
        engine.sensor_mut().activated = true;
        engine.sensor_mut().show_on_display = true;
        engine.save_settings();
        engine.system_mut().set_ok("Demo printer added");
    }

    engine.reinit_display();
    engine.flash_led(1, Duration::from_millis(100));
    info!(
        "Ready: {} printer(s), sensor {}",
        engine.num_printers(),
        engine.sensor_client_type()
    );

    let mut iteration: u64 = 0;
    while !stop.load(Ordering::Relaxed) {
        let started = Instant::now();

        engine.led_on_off(true);
        engine.run_iteration();
        engine.led_on_off(false);

        if let Some(ok) = engine.system_mut().take_ok() {
            info!("{}", ok);
        }
        iteration += 1;
        debug!("Iteration {} took {:?}", iteration, started.elapsed());

        sleep_until_stopped(config.loop_interval.saturating_sub(started.elapsed()), stop);
    }

    if engine.sensor_started().is_some() {
        if let Some(sensor) = engine.sensor_backend() {
            sensor.borrow_mut().end_sensor();
        }
    }
    info!("Foreground loop finished after {} iteration(s)", iteration);
    Ok(())
}

fn sleep_until_stopped(total: Duration, stop: &AtomicBool) {
    const STEP: Duration = Duration::from_millis(50);
    let deadline = Instant::now() + total;
    while !stop.load(Ordering::Relaxed) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep(STEP.min(deadline - now));
    }
}
