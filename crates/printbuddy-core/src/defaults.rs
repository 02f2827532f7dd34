//! Compiled-in configuration defaults.
//!
//! These values are consumed once by
//! [`DeviceConfig::init_defaults`](crate::DeviceConfig::init_defaults) and
//! are independent of any settings file state.

/// Firmware version reported in the system banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Settings files
pub const CONFIG_FILE: &str = "/conf.txt";
pub const PRINTER_CONFIG_FILE: &str = "/printer.txt";

// System
pub const TIME_RESYNC_MINUTES_DELAY: u32 = 15;
pub const WEBSERVER_IS_BASIC_AUTH: bool = true;
pub const WEBSERVER_USERNAME: &str = "admin";
pub const WEBSERVER_PASSWORD: &str = "password";
pub const WEBSERVER_PORT: u16 = 80;
pub const USE_LED_FLASH: bool = true;

// Printers
pub const MAX_PRINTERS: usize = 64;

// Clock
pub const TIME_UTCOFFSET: i32 = 1;
pub const TIME_HASHOFFSET: &str = "";
pub const DISPLAY_CLOCK: bool = true;
pub const TIME_IS_24HOUR: bool = true;

// Weather
pub const WEATHER_APIKEY: &str = "";
pub const WEATHER_CITYID: u32 = 2_928_810;
pub const WEATHER_METRIC: bool = true;
pub const WEATHER_LANGUAGE: &str = "en";
pub const DISPLAY_WEATHER: bool = true;

// Display
pub const DISPLAY_TYPE: usize = 0;
pub const DISPLAY_INVERT: bool = false;
pub const DISPLAY_WEATHER_SENSOR_SPLIT: bool = false;
pub const DISPLAY_SWITCH_DELAY_MS: u32 = 5000;
pub const DISPLAY_SWITCH_ENABLED: bool = true;
pub const DISPLAY_SWITCH_ACTIVE_ONLY: bool = true;
pub const DISPLAY_INACTIVE_OFF_MINUTES: u32 = 10;

// Sensor
pub const SENSOR_TYPE: usize = 0;

// Fixed text capacities (bytes)
pub const PRINTER_NAME_LEN: usize = 20;
pub const PRINTER_API_KEY_LEN: usize = 60;
pub const PRINTER_ADDRESS_LEN: usize = 60;
pub const PRINTER_AUTH_USER_LEN: usize = 30;
pub const PRINTER_AUTH_PASS_LEN: usize = 60;
pub const PRINTER_ERROR_LEN: usize = 120;
pub const SENSOR_ERROR_LEN: usize = 120;
