//! Backend contracts.
//!
//! Printer, sensor, display and weather backends are implemented outside the
//! core and addressed by a small integer id through a
//! [`Registry`](crate::Registry). Every call mutates the structure it is
//! handed in place; failures are reported through the structure's error
//! text rather than as a returned error.

use crate::model::{
    ClockConfig, DisplayConfig, PrinterConfig, SensorConfig, SystemConfig, WeatherConfig,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Handle to a backend owned by the application assembly.
pub type Shared<T> = Rc<RefCell<T>>;

pub type SharedPrinterBackend = Shared<dyn PrinterBackend>;
pub type SharedSensorBackend = Shared<dyn SensorBackend>;
pub type SharedDisplayBackend = Shared<dyn DisplayBackend>;
pub type SharedWeatherBackend = Shared<dyn WeatherBackend>;
pub type SharedClockSource = Shared<dyn ClockSource>;
pub type SharedStatusLed = Shared<dyn StatusLed>;

// ============================================================================
// Printers
// ============================================================================

/// A printer controller API (e.g. a network JSON API).
pub trait PrinterBackend {
    /// Human-readable backend name.
    fn client_type(&self) -> &str;

    /// Whether this backend needs `api_key` to be set.
    fn api_key_required(&self) -> bool {
        false
    }

    /// Check that the stored configuration can be used for a sync.
    fn is_valid_config(&self, printer: &PrinterConfig) -> bool;

    /// Fetch job status and update the printer's telemetry and state.
    fn fetch_job_status(&mut self, printer: &mut PrinterConfig);

    /// Fetch PSU status and update `is_psu_off`.
    fn fetch_psu_status(&mut self, printer: &mut PrinterConfig);
}

// ============================================================================
// Sensors
// ============================================================================

/// Readings a sensor backend can supply beyond temperature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorCapabilities {
    pub has_humidity: bool,
    pub has_pressure: bool,
    pub has_altitude: bool,
    pub has_air_quality: bool,
}

/// Bus and pin wiring handed to a sensor backend at registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusWiring {
    pub i2c_bus: Option<u8>,
    pub spi_bus: Option<u8>,
    pub spi_cs_pin: u8,
    pub one_wire_pin: u8,
}

/// An environmental sensor.
pub trait SensorBackend {
    /// Human-readable sensor name.
    fn sensor_type(&self) -> &str;

    fn capabilities(&self) -> SensorCapabilities {
        SensorCapabilities::default()
    }

    /// One-time bus/pin wiring, called before the backend is registered.
    fn initialize(&mut self, wiring: &BusWiring) {}

    /// Subscribe to live updates.
    fn start_sensor(&mut self, sensor: &mut SensorConfig);

    /// Read current values into `sensor`.
    fn update_sensor(&mut self, sensor: &mut SensorConfig);

    fn end_sensor(&mut self);
}

// ============================================================================
// Displays
// ============================================================================

/// Read-only view of the engine state handed to a display for one call.
#[derive(Debug, Clone, Copy)]
pub struct DisplayContext<'a> {
    pub system: &'a SystemConfig,
    pub clock: &'a ClockConfig,
    pub weather: &'a WeatherConfig,
    pub sensor: &'a SensorConfig,
    pub display: &'a DisplayConfig,
    pub printers: &'a [PrinterConfig],
}

impl DisplayContext<'_> {
    pub fn num_printers_printing(&self) -> usize {
        self.printers
            .iter()
            .filter(|p| p.telemetry.is_printing)
            .count()
    }
}

/// A local display panel. The engine only sequences these calls.
pub trait DisplayBackend {
    fn pre_setup(&mut self);

    fn post_setup(&mut self, is_config_change: bool);

    fn show_boot_screen(&mut self, ctx: &DisplayContext<'_>);

    fn first_loop_completed(&mut self) {}

    /// Redraw from the current state.
    fn handle_update(&mut self, ctx: &DisplayContext<'_>);

    /// Wi-Fi provisioning screen.
    fn show_ap_access_screen(&mut self, ap_ssid: &str, ap_ip: &str);

    fn show_webserver_splash_screen(&mut self, is_enabled: bool);

    fn is_in_transition_mode(&self) -> bool {
        false
    }
}

// ============================================================================
// Weather / clock / LED
// ============================================================================

/// Weather provider fed from [`WeatherConfig`] on setup.
pub trait WeatherBackend {
    fn update_api_key(&mut self, api_key: &str);
    fn update_language(&mut self, lang: &str);
    fn set_metric(&mut self, is_metric: bool);
    fn update_city_id(&mut self, city_id: u32);
}

/// Network time source.
pub trait ClockSource {
    fn set_utc_offset(&mut self, utc_offset: i32);
    fn reset_last_epoch(&mut self);
}

pub trait StatusLed {
    fn set(&mut self, on: bool);
}
