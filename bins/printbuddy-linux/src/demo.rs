//! Simulated backends and collaborators for running without hardware.

use printbuddy_core::{
    BusWiring, ClockSource, PrinterBackend, PrinterConfig, PrinterState, SensorBackend,
    SensorCapabilities, SensorConfig, StatusLed, WeatherBackend,
};
use tracing::{debug, info, trace};

/// Progress added per sync, in percent.
const PROGRESS_STEP: f32 = 2.5;
/// Simulated job duration in seconds.
const JOB_SECONDS: u32 = 3600;

/// A printer that runs an endless sequence of fake jobs.
#[derive(Debug, Default)]
pub struct SimulatedPrinter {
    jobs_started: u32,
}

impl PrinterBackend for SimulatedPrinter {
    fn client_type(&self) -> &str {
        "Simulated"
    }

    fn is_valid_config(&self, printer: &PrinterConfig) -> bool {
        !printer.remote_address.is_empty()
    }

    fn fetch_job_status(&mut self, printer: &mut PrinterConfig) {
        let t = &mut printer.telemetry;
        t.error.clear();

        match t.state {
            PrinterState::Printing => {
                t.progress_completion = (t.progress_completion + PROGRESS_STEP).min(100.0);
            }
            PrinterState::Completed => {
                t.state = PrinterState::Standby;
                t.is_printing = false;
                return;
            }
            _ => {
                self.jobs_started += 1;
                t.state = PrinterState::Printing;
                t.progress_completion = PROGRESS_STEP;
                t.file_name = format!("demo_{:03}.gcode", self.jobs_started);
                t.file_size = 1_843_200;
                t.filament_length = 4_215.0;
            }
        }

        let done = t.progress_completion / 100.0;
        t.print_time_elapsed = (JOB_SECONDS as f32 * done) as u32;
        t.print_time_left = JOB_SECONDS - t.print_time_elapsed;
        t.tool_target_temp = 215.0;
        t.bed_target_temp = 60.0;
        t.tool_temp = 214.2 + done;
        t.bed_temp = 59.6;

        if t.progress_completion >= 100.0 {
            t.state = PrinterState::Completed;
        }
        t.is_printing = t.state == PrinterState::Printing;
    }

    fn fetch_psu_status(&mut self, printer: &mut PrinterConfig) {
        printer.telemetry.is_psu_off = printer.has_psu_control && !printer.telemetry.is_printing;
    }
}

/// Temperature/humidity/pressure sensor producing a slow daily wave.
#[derive(Debug, Default)]
pub struct SimulatedSensor {
    wiring: BusWiring,
    running: bool,
}

impl SensorBackend for SimulatedSensor {
    fn sensor_type(&self) -> &str {
        "Simulated"
    }

    fn capabilities(&self) -> SensorCapabilities {
        SensorCapabilities {
            has_humidity: true,
            has_pressure: true,
            has_altitude: true,
            has_air_quality: false,
        }
    }

    fn initialize(&mut self, wiring: &BusWiring) {
        debug!("Simulated sensor wired: {:?}", wiring);
        self.wiring = *wiring;
    }

    fn start_sensor(&mut self, sensor: &mut SensorConfig) {
        self.running = true;
        sensor.error.clear();
    }

    fn update_sensor(&mut self, sensor: &mut SensorConfig) {
        if !self.running {
            sensor.error.set_truncated("Sensor not started");
            return;
        }
        let phase = chrono::Utc::now().timestamp() as f32 / 86_400.0 * std::f32::consts::TAU;
        sensor.temperature = 21.0 + 2.5 * phase.sin();
        sensor.humidity = 45.0 + 5.0 * phase.cos();
        sensor.pressure = 1013.25;
        sensor.altitude = 112.0;
        sensor.error.clear();
    }

    fn end_sensor(&mut self) {
        self.running = false;
    }
}

/// Weather provider stand-in that only records its configuration.
#[derive(Debug, Default)]
pub struct LoggingWeather {
    pub api_key_set: bool,
    pub language: String,
    pub metric: bool,
    pub city_id: u32,
}

impl WeatherBackend for LoggingWeather {
    fn update_api_key(&mut self, api_key: &str) {
        self.api_key_set = !api_key.is_empty();
    }

    fn update_language(&mut self, lang: &str) {
        self.language = lang.to_string();
    }

    fn set_metric(&mut self, is_metric: bool) {
        self.metric = is_metric;
    }

    fn update_city_id(&mut self, city_id: u32) {
        self.city_id = city_id;
        info!(
            "Weather: city {} lang {} metric {} key {}",
            self.city_id,
            self.language,
            self.metric,
            if self.api_key_set { "set" } else { "missing" }
        );
    }
}

/// Clock source backed by the host clock.
#[derive(Debug, Default)]
pub struct SystemClock {
    utc_offset: i32,
    last_epoch: Option<i64>,
}

impl SystemClock {
    /// Local time with the configured offset, formatted `HH:MM`.
    pub fn local_time(&self) -> String {
        let offset = chrono::Duration::hours(i64::from(self.utc_offset));
        (chrono::Utc::now() + offset).format("%H:%M").to_string()
    }
}

impl ClockSource for SystemClock {
    fn set_utc_offset(&mut self, utc_offset: i32) {
        self.utc_offset = utc_offset;
        info!("Clock: UTC offset {:+}h, now {}", utc_offset, self.local_time());
    }

    fn reset_last_epoch(&mut self) {
        self.last_epoch = None;
    }
}

/// Status LED drawn as trace output.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleLed;

impl StatusLed for ConsoleLed {
    fn set(&mut self, on: bool) {
        trace!("LED {}", if on { "on" } else { "off" });
    }
}
