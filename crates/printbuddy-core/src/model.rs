//! PrintBuddy configuration and telemetry model.
//!
//! All structures here are plain aggregates owned by the
//! [`Engine`](crate::Engine). Backends receive a mutable reference for the
//! duration of one sync call and must not retain it.

use crate::defaults;
use crate::text::FixedText;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type PrinterName = FixedText<{ defaults::PRINTER_NAME_LEN }>;
pub type PrinterApiKey = FixedText<{ defaults::PRINTER_API_KEY_LEN }>;
pub type PrinterAddress = FixedText<{ defaults::PRINTER_ADDRESS_LEN }>;
pub type PrinterAuthUser = FixedText<{ defaults::PRINTER_AUTH_USER_LEN }>;
pub type PrinterAuthPass = FixedText<{ defaults::PRINTER_AUTH_PASS_LEN }>;
pub type PrinterError = FixedText<{ defaults::PRINTER_ERROR_LEN }>;
pub type SensorError = FixedText<{ defaults::SENSOR_ERROR_LEN }>;

// ============================================================================
// System
// ============================================================================

/// Web server, LED and banner settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    /// Require Basic-Auth on the local web UI.
    pub has_basic_auth: bool,
    pub webserver_username: String,
    pub webserver_password: String,
    pub webserver_port: u16,
    /// Flash the status LED on activity.
    pub use_led_flash: bool,
    /// Clock/weather resync interval in minutes.
    pub clock_weather_resync_minutes: u32,
    /// Sticky error banner, shown until cleared.
    pub last_error: String,
    /// One-shot info banner, cleared once surfaced.
    pub last_ok: String,
    pub version: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            has_basic_auth: defaults::WEBSERVER_IS_BASIC_AUTH,
            webserver_username: defaults::WEBSERVER_USERNAME.to_string(),
            webserver_password: defaults::WEBSERVER_PASSWORD.to_string(),
            webserver_port: defaults::WEBSERVER_PORT,
            use_led_flash: defaults::USE_LED_FLASH,
            clock_weather_resync_minutes: defaults::TIME_RESYNC_MINUTES_DELAY,
            last_error: String::new(),
            last_ok: String::new(),
            version: defaults::VERSION.to_string(),
        }
    }
}

impl SystemConfig {
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = message.into();
    }

    pub fn clear_error(&mut self) {
        self.last_error.clear();
    }

    pub fn set_ok(&mut self, message: impl Into<String>) {
        self.last_ok = message.into();
    }

    /// Take the info banner, leaving it empty.
    pub fn take_ok(&mut self) -> Option<String> {
        if self.last_ok.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.last_ok))
        }
    }
}

// ============================================================================
// Clock / Weather
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockConfig {
    pub utc_offset: i32,
    /// Hash of the timezone rules, used to detect DST changes.
    pub timezone_hash: String,
    pub show: bool,
    pub is_24h: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            utc_offset: defaults::TIME_UTCOFFSET,
            timezone_hash: defaults::TIME_HASHOFFSET.to_string(),
            show: defaults::DISPLAY_CLOCK,
            is_24h: defaults::TIME_IS_24HOUR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherConfig {
    pub api_key: String,
    pub city_id: u32,
    pub is_metric: bool,
    pub lang: String,
    pub show: bool,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: defaults::WEATHER_APIKEY.to_string(),
            city_id: defaults::WEATHER_CITYID,
            is_metric: defaults::WEATHER_METRIC,
            lang: defaults::WEATHER_LANGUAGE.to_string(),
            show: defaults::DISPLAY_WEATHER,
        }
    }
}

// ============================================================================
// Sensor
// ============================================================================

/// Environmental sensor selection and live readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorConfig {
    pub activated: bool,
    pub show_on_display: bool,
    /// Registry id of the selected sensor backend.
    pub sens_type: usize,
    pub temperature: f32,
    pub humidity: f32,
    pub pressure: f32,
    pub altitude: f32,
    pub air_quality: f32,
    /// Set by the backend when a reading fails; empty otherwise.
    pub error: SensorError,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            activated: false,
            show_on_display: false,
            sens_type: defaults::SENSOR_TYPE,
            temperature: 0.0,
            humidity: 0.0,
            pressure: 0.0,
            altitude: 0.0,
            air_quality: 0.0,
            error: SensorError::new(),
        }
    }
}

// ============================================================================
// Display
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    /// Registry id of the selected display backend.
    pub display_type: usize,
    pub invert_display: bool,
    pub show_weather_sensor_split: bool,
    pub automatic_switch_enabled: bool,
    pub automatic_switch_active_only: bool,
    /// Page switch delay in milliseconds.
    pub automatic_switch_delay: u32,
    /// Turn the display off after this many idle minutes.
    pub automatic_inactive_off: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            display_type: defaults::DISPLAY_TYPE,
            invert_display: defaults::DISPLAY_INVERT,
            show_weather_sensor_split: defaults::DISPLAY_WEATHER_SENSOR_SPLIT,
            automatic_switch_enabled: defaults::DISPLAY_SWITCH_ENABLED,
            automatic_switch_active_only: defaults::DISPLAY_SWITCH_ACTIVE_ONLY,
            automatic_switch_delay: defaults::DISPLAY_SWITCH_DELAY_MS,
            automatic_inactive_off: defaults::DISPLAY_INACTIVE_OFF_MINUTES,
        }
    }
}

// ============================================================================
// Printers
// ============================================================================

/// Printer state as last reported by its backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PrinterState {
    #[default]
    Offline = 0,
    Error = 1,
    Standby = 2,
    Printing = 3,
    Paused = 4,
    Completed = 5,
}

impl PrinterState {
    /// Map a numeric state code; unknown codes are `Offline`.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => PrinterState::Error,
            2 => PrinterState::Standby,
            3 => PrinterState::Printing,
            4 => PrinterState::Paused,
            5 => PrinterState::Completed,
            _ => PrinterState::Offline,
        }
    }

    pub fn as_text(&self) -> &'static str {
        match self {
            PrinterState::Offline => "Offline",
            PrinterState::Error => "Error",
            PrinterState::Standby => "Standby",
            PrinterState::Printing => "Printing",
            PrinterState::Paused => "Paused",
            PrinterState::Completed => "Completed",
        }
    }
}

impl fmt::Display for PrinterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_text())
    }
}

/// Live printer status, overwritten on every sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterTelemetry {
    pub state: PrinterState,
    pub is_printing: bool,
    /// Job progress in percent.
    pub progress_completion: f32,
    /// Seconds.
    pub print_time_elapsed: u32,
    /// Seconds.
    pub print_time_left: u32,
    pub file_name: String,
    /// Bytes.
    pub file_size: u64,
    /// Millimetres.
    pub filament_length: f32,
    pub tool_temp: f32,
    pub tool_target_temp: f32,
    pub bed_temp: f32,
    pub bed_target_temp: f32,
    pub is_psu_off: bool,
    pub error: PrinterError,
    /// Unix seconds of the last sync that reached the backend.
    pub last_sync_epoch: i64,
}

/// One configured printer. Its identity is its index in the printer table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterConfig {
    pub custom_name: PrinterName,
    /// Registry id of the printer backend.
    pub api_type: usize,
    pub api_key: PrinterApiKey,
    pub remote_address: PrinterAddress,
    pub remote_port: u16,
    pub basic_auth_needed: bool,
    pub basic_auth_username: PrinterAuthUser,
    pub basic_auth_password: PrinterAuthPass,
    pub has_psu_control: bool,
    #[serde(default)]
    pub telemetry: PrinterTelemetry,
}

impl PrinterConfig {
    /// Drop all live status and return to `Offline`.
    pub fn reset_telemetry(&mut self) {
        self.telemetry = PrinterTelemetry::default();
    }

    pub fn state_text(&self) -> &'static str {
        self.telemetry.state.as_text()
    }
}

// ============================================================================
// Aggregate
// ============================================================================

/// Every durable and live structure the engine owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    pub system: SystemConfig,
    pub clock: ClockConfig,
    pub weather: WeatherConfig,
    pub sensor: SensorConfig,
    pub display: DisplayConfig,
    pub printers: Vec<PrinterConfig>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let mut config = Self {
            system: SystemConfig::default(),
            clock: ClockConfig::default(),
            weather: WeatherConfig::default(),
            sensor: SensorConfig::default(),
            display: DisplayConfig::default(),
            printers: Vec::new(),
        };
        config.init_defaults();
        config
    }
}

impl DeviceConfig {
    /// Reset every configuration field to its compiled-in default.
    ///
    /// Live sensor readings and the one-shot info banner are kept; the error
    /// banner, the sensor error and the printer table are cleared.
    pub fn init_defaults(&mut self) {
        let last_ok = std::mem::take(&mut self.system.last_ok);
        self.system = SystemConfig {
            last_ok,
            ..SystemConfig::default()
        };
        self.clock = ClockConfig::default();
        self.weather = WeatherConfig::default();
        self.display = DisplayConfig::default();

        self.sensor.activated = false;
        self.sensor.show_on_display = false;
        self.sensor.sens_type = defaults::SENSOR_TYPE;
        self.sensor.error.clear();

        self.printers.clear();
    }

    pub fn printers_cnt(&self) -> usize {
        self.printers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_printer_state_text() {
        assert_eq!(PrinterState::Offline.to_string(), "Offline");
        assert_eq!(PrinterState::Printing.to_string(), "Printing");
        assert_eq!(PrinterState::from_code(4), PrinterState::Paused);
        assert_eq!(PrinterState::from_code(42), PrinterState::Offline);
        assert_eq!(PrinterState::from_code(-1), PrinterState::Offline);
    }

    #[test]
    fn test_new_printer_is_offline() {
        let printer = PrinterConfig::default();
        assert_eq!(printer.telemetry.state, PrinterState::Offline);
        assert_eq!(printer.state_text(), "Offline");
        assert!(!printer.telemetry.is_printing);
    }

    #[test]
    fn test_reset_telemetry_keeps_config() {
        let mut printer = PrinterConfig {
            custom_name: "Voron".try_into().unwrap(),
            remote_port: 7125,
            ..Default::default()
        };
        printer.telemetry.state = PrinterState::Printing;
        printer.telemetry.is_printing = true;

        printer.reset_telemetry();

        assert_eq!(printer.custom_name, "Voron");
        assert_eq!(printer.remote_port, 7125);
        assert_eq!(printer.telemetry, PrinterTelemetry::default());
    }

    #[test]
    fn test_init_defaults_restores_compiled_values() {
        let mut config = DeviceConfig::default();
        config.system.webserver_port = 8080;
        config.system.set_error("boom");
        config.system.set_ok("saved");
        config.weather.city_id = 1;
        config.sensor.sens_type = 3;
        config.sensor.temperature = 21.5;
        config.printers.push(PrinterConfig::default());

        config.init_defaults();

        assert_eq!(config.system.webserver_port, defaults::WEBSERVER_PORT);
        assert_eq!(config.system.last_error, "");
        assert_eq!(config.system.last_ok, "saved");
        assert_eq!(config.weather, WeatherConfig::default());
        assert_eq!(config.sensor.sens_type, defaults::SENSOR_TYPE);
        assert_eq!(config.sensor.temperature, 21.5);
        assert!(config.printers.is_empty());
    }

    #[test]
    fn test_banner_ok_is_one_shot() {
        let mut system = SystemConfig::default();
        system.set_ok("Settings saved");
        system.set_error("SOCKET: Connection failed");

        assert_eq!(system.take_ok().as_deref(), Some("Settings saved"));
        assert_eq!(system.take_ok(), None);
        assert_eq!(system.last_error, "SOCKET: Connection failed");

        system.clear_error();
        assert!(system.last_error.is_empty());
    }

    #[test]
    fn test_printer_serializes_camel_case() {
        let printer = PrinterConfig {
            custom_name: "Ender".try_into().unwrap(),
            ..Default::default()
        };
        let json = serde_json::to_value(&printer).unwrap();
        assert_eq!(json["customName"], "Ender");
        assert_eq!(json["telemetry"]["state"], "offline");
    }
}
