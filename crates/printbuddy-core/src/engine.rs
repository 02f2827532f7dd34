//! Device orchestration engine.
//!
//! The engine owns every configuration/telemetry structure, the printer,
//! sensor and display registries and the settings store. The foreground loop
//! calls its sync operations once per iteration; each one is best-effort and
//! logs instead of failing.

use crate::backend::{
    BusWiring, DisplayContext, SharedClockSource, SharedDisplayBackend, SharedPrinterBackend,
    SharedSensorBackend, SharedStatusLed, SharedWeatherBackend,
};
use crate::backend::{DisplayBackend, PrinterBackend, SensorBackend};
use crate::error::ErrorClass;
use crate::model::{
    ClockConfig, DeviceConfig, DisplayConfig, PrinterConfig, SensorConfig, SystemConfig,
    WeatherConfig,
};
use crate::registry::Registry;
use crate::settings::{SettingsFs, SettingsStore};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of one [`Engine::sync_printer`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterSyncOutcome {
    /// Job and PSU status were fetched from the backend.
    Synced,
    /// No backend is registered for the printer's `api_type`.
    UnsupportedApi,
    /// The backend rejected the printer configuration.
    InvalidConfig,
}

/// Orchestrates backends over the shared configuration.
pub struct Engine<F: SettingsFs> {
    config: DeviceConfig,
    settings: SettingsStore<F>,
    printer_backends: Registry<dyn PrinterBackend>,
    sensor_backends: Registry<dyn SensorBackend>,
    display_backends: Registry<dyn DisplayBackend>,
    weather: Option<SharedWeatherBackend>,
    clock: Option<SharedClockSource>,
    led: Option<SharedStatusLed>,
    /// Id of the sensor backend currently subscribed to live updates.
    sensor_started: Option<usize>,
}

impl<F: SettingsFs> Engine<F> {
    /// Create an engine with compiled-in defaults. Nothing is read until
    /// [`setup`](Self::setup) or [`load_settings`](Self::load_settings).
    pub fn new(settings: SettingsStore<F>) -> Self {
        Self {
            config: DeviceConfig::default(),
            settings,
            printer_backends: Registry::new(),
            sensor_backends: Registry::new(),
            display_backends: Registry::new(),
            weather: None,
            clock: None,
            led: None,
            sensor_started: None,
        }
    }

    pub fn set_weather_backend(&mut self, weather: SharedWeatherBackend) {
        self.weather = Some(weather);
    }

    pub fn set_clock_source(&mut self, clock: SharedClockSource) {
        self.clock = Some(clock);
    }

    pub fn set_status_led(&mut self, led: SharedStatusLed) {
        self.led = Some(led);
    }

    // ========================================================================
    // Setup / persistence
    // ========================================================================

    /// Load settings and push them into the weather backend, the clock
    /// source and the selected display.
    pub fn setup(&mut self) {
        self.settings.list_files();
        self.load_settings();

        if let Some(weather) = &self.weather {
            let cfg = &self.config.weather;
            let mut weather = weather.borrow_mut();
            weather.update_api_key(&cfg.api_key);
            weather.update_language(&cfg.lang);
            weather.set_metric(cfg.is_metric);
            weather.update_city_id(cfg.city_id);
        }
        if let Some(clock) = &self.clock {
            let mut clock = clock.borrow_mut();
            clock.set_utc_offset(self.config.clock.utc_offset);
            clock.reset_last_epoch();
        }
        match self.display_backend() {
            Some(display) => display.borrow_mut().post_setup(true),
            None => warn!(
                "No display registered for type {}",
                self.config.display.display_type
            ),
        }
    }

    pub fn load_settings(&mut self) {
        self.settings.load(&mut self.config);
    }

    pub fn save_settings(&mut self) {
        self.settings.save(&mut self.config);
    }

    /// Delete the settings files; defaults apply from the next load.
    pub fn reset_settings(&mut self) -> bool {
        self.settings.reset()
    }

    pub fn settings(&self) -> &SettingsStore<F> {
        &self.settings
    }

    // ========================================================================
    // Configuration access
    // ========================================================================

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DeviceConfig {
        &mut self.config
    }

    pub fn system(&self) -> &SystemConfig {
        &self.config.system
    }

    pub fn system_mut(&mut self) -> &mut SystemConfig {
        &mut self.config.system
    }

    pub fn clock(&self) -> &ClockConfig {
        &self.config.clock
    }

    pub fn weather(&self) -> &WeatherConfig {
        &self.config.weather
    }

    pub fn sensor(&self) -> &SensorConfig {
        &self.config.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut SensorConfig {
        &mut self.config.sensor
    }

    pub fn display(&self) -> &DisplayConfig {
        &self.config.display
    }

    pub fn display_mut(&mut self) -> &mut DisplayConfig {
        &mut self.config.display
    }

    pub fn printers(&self) -> &[PrinterConfig] {
        &self.config.printers
    }

    pub fn printer_mut(&mut self, index: usize) -> Option<&mut PrinterConfig> {
        self.config.printers.get_mut(index)
    }

    pub fn num_printers(&self) -> usize {
        self.config.printers.len()
    }

    /// Borrowed view handed to display backends.
    pub fn display_context(&self) -> DisplayContext<'_> {
        DisplayContext {
            system: &self.config.system,
            clock: &self.config.clock,
            weather: &self.config.weather,
            sensor: &self.config.sensor,
            display: &self.config.display,
            printers: &self.config.printers,
        }
    }

    // ========================================================================
    // Printer table
    // ========================================================================

    /// Append a zeroed printer and return it.
    pub fn add_printer(&mut self) -> &mut PrinterConfig {
        let index = self.config.printers.len();
        self.config.printers.push(PrinterConfig::default());
        &mut self.config.printers[index]
    }

    /// Remove the printer at `index`, renumbering the ones after it.
    ///
    /// Returns `false` without changes if `index` is out of range.
    pub fn remove_printer_by_index(&mut self, index: usize) -> bool {
        if index >= self.config.printers.len() {
            return false;
        }
        self.config.printers.remove(index);
        true
    }

    pub fn num_printers_printing(&self) -> usize {
        self.config
            .printers
            .iter()
            .filter(|p| p.telemetry.is_printing)
            .count()
    }

    pub fn is_any_printer_printing(&self) -> bool {
        self.num_printers_printing() > 0
    }

    // ========================================================================
    // Registries
    // ========================================================================

    pub fn register_printer_backend(&mut self, id: usize, backend: SharedPrinterBackend) {
        self.printer_backends.register(id, backend);
    }

    /// Wire the sensor to its bus, then register it.
    pub fn register_sensor_backend(
        &mut self,
        id: usize,
        backend: SharedSensorBackend,
        wiring: &BusWiring,
    ) {
        backend.borrow_mut().initialize(wiring);
        self.sensor_backends.register(id, backend);
    }

    pub fn register_display_backend(&mut self, id: usize, backend: SharedDisplayBackend) {
        self.display_backends.register(id, backend);
    }

    pub fn printer_backends(&self) -> &Registry<dyn PrinterBackend> {
        &self.printer_backends
    }

    pub fn sensor_backends(&self) -> &Registry<dyn SensorBackend> {
        &self.sensor_backends
    }

    pub fn display_backends(&self) -> &Registry<dyn DisplayBackend> {
        &self.display_backends
    }

    /// Backend name for the printer's `api_type`, or `"Unknown"`.
    pub fn printer_client_type(&self, printer: &PrinterConfig) -> String {
        self.printer_backends
            .get(printer.api_type)
            .map(|b| b.borrow().client_type().to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Name of the selected sensor backend, or `"Unknown"`.
    pub fn sensor_client_type(&self) -> String {
        self.sensor_backend()
            .map(|b| b.borrow().sensor_type().to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Backend for the configured `sens_type`, if registered.
    pub fn sensor_backend(&self) -> Option<SharedSensorBackend> {
        self.sensor_backends
            .get(self.config.sensor.sens_type)
            .cloned()
    }

    /// Backend for the configured `display_type`, if registered.
    pub fn display_backend(&self) -> Option<SharedDisplayBackend> {
        self.display_backends
            .get(self.config.display.display_type)
            .cloned()
    }

    pub fn sensor_started(&self) -> Option<usize> {
        self.sensor_started
    }

    // ========================================================================
    // Sync
    // ========================================================================

    /// Reconcile the started sensor with `sens_type`, then update it.
    ///
    /// The previously started backend is always ended before a different one
    /// is started, and a newly started backend is updated in the same call.
    pub fn sync_sensor(&mut self) {
        let selected = self.config.sensor.sens_type;

        if self.sensor_started != Some(selected) {
            if let Some(started) = self.sensor_started.take() {
                if let Some(backend) = self.sensor_backends.get(started) {
                    debug!("Stopping sensor {}", started);
                    backend.borrow_mut().end_sensor();
                }
            }
            if let Some(backend) = self.sensor_backends.get(selected).cloned() {
                info!("Starting sensor {} ({})", selected, backend.borrow().sensor_type());
                backend.borrow_mut().start_sensor(&mut self.config.sensor);
                self.sensor_started = Some(selected);
            }
        }

        if let Some(backend) = self.sensor_backends.get(selected).cloned() {
            backend.borrow_mut().update_sensor(&mut self.config.sensor);
            if !self.config.sensor.error.is_empty() {
                warn!("Error: {}", self.config.sensor.error);
            }
        }
    }

    /// Poll the printer at `index` through its backend.
    ///
    /// Returns `None` if there is no printer at `index`.
    pub fn sync_printer(&mut self, index: usize) -> Option<PrinterSyncOutcome> {
        let printer = self.config.printers.get_mut(index)?;
        Some(sync_printer_with(&self.printer_backends, printer))
    }

    /// Poll every configured printer once.
    pub fn sync_printers(&mut self) {
        for index in 0..self.config.printers.len() {
            self.sync_printer(index);
        }
    }

    /// Redraw the selected display.
    pub fn sync_display(&mut self) {
        if let Some(display) = self.display_backend() {
            display.borrow_mut().handle_update(&self.display_context());
        }
    }

    /// Run the full setup sequence of the selected display, used when the
    /// display type changes at runtime.
    pub fn reinit_display(&mut self) {
        let Some(display) = self.display_backend() else {
            warn!(
                "No display registered for type {}",
                self.config.display.display_type
            );
            return;
        };
        let mut display = display.borrow_mut();
        display.pre_setup();
        display.show_boot_screen(&self.display_context());
        display.post_setup(false);
        display.first_loop_completed();
    }

    /// One foreground iteration: sensor, every printer, display.
    pub fn run_iteration(&mut self) {
        self.sync_sensor();
        self.sync_printers();
        self.sync_display();
    }

    // ========================================================================
    // Status LED
    // ========================================================================

    /// Switch the LED, if LED flashing is enabled.
    pub fn led_on_off(&self, on: bool) {
        if !self.config.system.use_led_flash {
            return;
        }
        if let Some(led) = &self.led {
            led.borrow_mut().set(on);
        }
    }

    /// Blink the LED `count + 1` times.
    pub fn flash_led(&self, count: u32, delay: Duration) {
        let Some(led) = &self.led else {
            return;
        };
        for _ in 0..=count {
            std::thread::sleep(delay);
            led.borrow_mut().set(true);
            std::thread::sleep(delay);
            led.borrow_mut().set(false);
            std::thread::sleep(delay);
        }
    }
}

/// Sync one printer against the registry. Logs exactly one outcome.
pub fn sync_printer_with(
    backends: &Registry<dyn PrinterBackend>,
    printer: &mut PrinterConfig,
) -> PrinterSyncOutcome {
    let outcome = match backends.get(printer.api_type) {
        None => PrinterSyncOutcome::UnsupportedApi,
        Some(backend) => {
            let mut backend = backend.borrow_mut();
            if backend.is_valid_config(printer) {
                printer.telemetry.last_sync_epoch = chrono::Utc::now().timestamp();
                debug!(
                    "syncPrinter: {} | {}",
                    printer.telemetry.last_sync_epoch, printer.custom_name
                );
                backend.fetch_job_status(printer);
                backend.fetch_psu_status(printer);
                return PrinterSyncOutcome::Synced;
            }
            PrinterSyncOutcome::InvalidConfig
        }
    };

    let reason = match outcome {
        PrinterSyncOutcome::UnsupportedApi => format!("Api ({}) not supported!", printer.api_type),
        _ => "Config validation failed!".to_string(),
    };
    warn!(
        "{}: syncPrinter failed: {} | {} | {}",
        ErrorClass::Config,
        printer.telemetry.last_sync_epoch,
        printer.custom_name,
        reason
    );
    outcome
}
