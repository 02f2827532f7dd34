//! Flat-file settings store.
//!
//! Configuration (not telemetry) is persisted as two human-readable files of
//! `KEY=VALUE` lines:
//! - `/conf.txt` holds system, display, clock, weather and sensor settings
//!   plus `printerCnt`
//! - `/printer.txt` holds one block of `printer{N}_*` keys per printer
//!
//! Booleans are written as `0`/`1`, values are trimmed on read and there is
//! no escaping. A missing file is the first-boot signal.
//!
//! Storage is abstracted behind [`SettingsFs`] so the same format works on a
//! flash filesystem, a host directory ([`DirFs`]) or in memory
//! ([`MemoryFs`]).

use crate::defaults::{CONFIG_FILE, MAX_PRINTERS, PRINTER_CONFIG_FILE};
use crate::error::SettingsError;
use crate::model::{DeviceConfig, PrinterConfig};
use crate::text::FixedText;
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

// ============================================================================
// Storage abstraction
// ============================================================================

/// Minimal filesystem used by the settings store.
///
/// Paths are absolute, slash-separated names such as `/conf.txt`.
pub trait SettingsFs {
    fn exists(&self, path: &str) -> bool;

    /// Open a file for line-by-line reading.
    fn open_read(&self, path: &str) -> io::Result<Box<dyn BufRead + '_>>;

    /// Replace the whole file.
    fn write(&self, path: &str, contents: &str) -> io::Result<()>;

    fn remove(&self, path: &str) -> io::Result<()>;

    /// Names of all stored files.
    fn list(&self) -> io::Result<Vec<String>>;
}

/// Settings files stored in a host directory.
#[derive(Debug, Clone)]
pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl SettingsFs for DirFs {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn open_read(&self, path: &str) -> io::Result<Box<dyn BufRead + '_>> {
        let file = fs::File::open(self.resolve(path))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn write(&self, path: &str, contents: &str) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.resolve(path), contents)
    }

    fn remove(&self, path: &str) -> io::Result<()> {
        fs::remove_file(self.resolve(path))
    }

    fn list(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(format!("/{}", entry.file_name().to_string_lossy()));
            }
        }
        names.sort();
        Ok(names)
    }
}

/// In-memory settings files.
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: RefCell<BTreeMap<String, String>>,
    read_only: Cell<bool>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write and remove fail, as a full or missing flash would.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    pub fn contents(&self, path: &str) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }

    fn check_writable(&self) -> io::Result<()> {
        if self.read_only.get() {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "filesystem is read-only",
            ))
        } else {
            Ok(())
        }
    }
}

impl SettingsFs for MemoryFs {
    fn exists(&self, path: &str) -> bool {
        self.files.borrow().contains_key(path)
    }

    fn open_read(&self, path: &str) -> io::Result<Box<dyn BufRead + '_>> {
        let contents = self
            .files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))?;
        Ok(Box::new(Cursor::new(contents.into_bytes())))
    }

    fn write(&self, path: &str, contents: &str) -> io::Result<()> {
        self.check_writable()?;
        self.files
            .borrow_mut()
            .insert(path.to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&self, path: &str) -> io::Result<()> {
        self.check_writable()?;
        self.files
            .borrow_mut()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }

    fn list(&self) -> io::Result<Vec<String>> {
        Ok(self.files.borrow().keys().cloned().collect())
    }
}

// ============================================================================
// Field encoding
// ============================================================================

/// A configuration field that can be written to and read from a settings line.
trait SettingField {
    fn render(&self) -> String;

    /// Store the trimmed raw value; on error the field is left unchanged.
    fn parse_into(&mut self, raw: &str) -> Result<(), String>;
}

impl SettingField for bool {
    fn render(&self) -> String {
        let encoded = if *self { "1" } else { "0" };
        encoded.to_string()
    }

    fn parse_into(&mut self, raw: &str) -> Result<(), String> {
        *self = parse_leading_int(raw) != 0;
        Ok(())
    }
}

impl SettingField for String {
    fn render(&self) -> String {
        self.clone()
    }

    fn parse_into(&mut self, raw: &str) -> Result<(), String> {
        *self = raw.to_string();
        Ok(())
    }
}

impl<const CAP: usize> SettingField for FixedText<CAP> {
    fn render(&self) -> String {
        self.as_str().to_string()
    }

    fn parse_into(&mut self, raw: &str) -> Result<(), String> {
        self.set(raw).map_err(|e| e.to_string())
    }
}

macro_rules! int_setting_field {
    ($($ty:ty),*) => {
        $(
            impl SettingField for $ty {
                fn render(&self) -> String {
                    self.to_string()
                }

                fn parse_into(&mut self, raw: &str) -> Result<(), String> {
                    let value = parse_leading_int(raw);
                    *self = <$ty>::try_from(value)
                        .map_err(|_| format!("{} is out of range", value))?;
                    Ok(())
                }
            }
        )*
    };
}

int_setting_field!(i32, u16, u32, usize);

/// Parse an optional sign and leading digits, ignoring anything after them.
///
/// Values without leading digits parse as `0`.
fn parse_leading_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    if negative {
        -value
    } else {
        value
    }
}

// ============================================================================
// Key tables
// ============================================================================

trait FieldVisitor {
    fn field<T: SettingField>(&mut self, key: &str, value: &mut T);
}

/// Every key of the primary file, in file order.
fn visit_primary<V: FieldVisitor>(config: &mut DeviceConfig, printer_cnt: &mut usize, v: &mut V) {
    v.field("printerCnt", printer_cnt);

    let display = &mut config.display;
    v.field("systemInvertDisplay", &mut display.invert_display);
    v.field("displayType", &mut display.display_type);
    v.field("displayWeatherSplit", &mut display.show_weather_sensor_split);
    v.field("displaySwitchDelay", &mut display.automatic_switch_delay);
    v.field("displaySwitchEnab", &mut display.automatic_switch_enabled);
    v.field("displaySwitchActiv", &mut display.automatic_switch_active_only);
    v.field("displayInactiveOff", &mut display.automatic_inactive_off);

    let system = &mut config.system;
    v.field("systemHasBasicAuth", &mut system.has_basic_auth);
    v.field("systemWebserverUsername", &mut system.webserver_username);
    v.field("systemWebserverPassword", &mut system.webserver_password);
    v.field("systemWebserverPort", &mut system.webserver_port);
    v.field("systemUseLedFlash", &mut system.use_led_flash);
    v.field("systemResyncMinutes", &mut system.clock_weather_resync_minutes);

    let clock = &mut config.clock;
    v.field("clockUtcOffset", &mut clock.utc_offset);
    v.field("clockHashOffset", &mut clock.timezone_hash);
    v.field("clockShow", &mut clock.show);
    v.field("clockIs24h", &mut clock.is_24h);

    let weather = &mut config.weather;
    v.field("weatherShow", &mut weather.show);
    v.field("weatherApiKey", &mut weather.api_key);
    v.field("weatherCityId", &mut weather.city_id);
    v.field("weatherIsMetric", &mut weather.is_metric);
    v.field("weatherLang", &mut weather.lang);

    let sensor = &mut config.sensor;
    v.field("sensorIsActive", &mut sensor.activated);
    v.field("sensorShow", &mut sensor.show_on_display);
    v.field("sensorType", &mut sensor.sens_type);
}

/// Every key of one printer block.
fn visit_printer<V: FieldVisitor>(index: usize, printer: &mut PrinterConfig, v: &mut V) {
    let prefix = format!("printer{}_", index);
    let key = |name: &str| format!("{}{}", prefix, name);

    v.field(&key("Name"), &mut printer.custom_name);
    v.field(&key("ApiType"), &mut printer.api_type);
    v.field(&key("ApiKey"), &mut printer.api_key);
    v.field(&key("RemAddr"), &mut printer.remote_address);
    v.field(&key("RemPort"), &mut printer.remote_port);
    v.field(&key("baNeed"), &mut printer.basic_auth_needed);
    v.field(&key("baUser"), &mut printer.basic_auth_username);
    v.field(&key("baPass"), &mut printer.basic_auth_password);
    v.field(&key("hasPsu"), &mut printer.has_psu_control);
}

/// Appends `key=value` lines.
struct LineWriter {
    out: String,
}

impl FieldVisitor for LineWriter {
    fn field<T: SettingField>(&mut self, key: &str, value: &mut T) {
        let _ = writeln!(self.out, "{}={}", key, value.render());
    }
}

/// Tests one line against every key.
///
/// A key matches when `key=` occurs anywhere in the line; the value is what
/// follows its last occurrence. Values are not tokenised first, so a value
/// containing another `key=` also sets that key.
struct LineMatcher<'a> {
    line: &'a str,
}

impl FieldVisitor for LineMatcher<'_> {
    fn field<T: SettingField>(&mut self, key: &str, value: &mut T) {
        let search = format!("{}=", key);
        let Some(pos) = self.line.rfind(&search) else {
            return;
        };
        let raw = self.line[pos + search.len()..].trim();
        match value.parse_into(raw) {
            Ok(()) => debug!("{}{}", search, value.render()),
            Err(e) => warn!("Ignoring setting {}{}: {}", search, raw, e),
        }
    }
}

// ============================================================================
// Store
// ============================================================================

/// Best-effort persistence of [`DeviceConfig`].
///
/// File failures are logged and never returned: the store keeps going with
/// whatever is in memory.
#[derive(Debug)]
pub struct SettingsStore<F: SettingsFs> {
    fs: F,
}

impl<F: SettingsFs> SettingsStore<F> {
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Both settings files are present.
    pub fn files_exist(&self) -> bool {
        self.fs.exists(CONFIG_FILE) && self.fs.exists(PRINTER_CONFIG_FILE)
    }

    /// Log every stored file at debug level.
    pub fn list_files(&self) {
        match self.fs.list() {
            Ok(names) => {
                debug!("========= FileSystem Files =================");
                for name in names {
                    debug!("{}", name);
                }
            }
            Err(e) => warn!("Could not list settings files: {}", e),
        }
    }

    /// Load settings into `config`.
    ///
    /// On first boot (either file missing) the defaults are written out
    /// and read back. Otherwise every field is reset to its default and then
    /// overwritten from the files; printer telemetry starts over as
    /// `Offline`.
    pub fn load(&self, config: &mut DeviceConfig) {
        if !self.files_exist() {
            info!("Settings File does not yet exists.");
            config.init_defaults();
            self.write_files(config);
            if !self.files_exist() {
                error!("Settings files could not be created, keeping defaults");
                return;
            }
        }

        config.init_defaults();
        if let Err(e) = self.read_files(config) {
            error!("{}", e);
        }
    }

    /// Write every configuration field to both files, then load them back so
    /// memory matches what is stored.
    pub fn save(&self, config: &mut DeviceConfig) {
        self.write_files(config);
        self.load(config);
    }

    /// Delete both settings files. In-memory state is untouched until the
    /// next [`load`](Self::load).
    pub fn reset(&self) -> bool {
        let mut ok = true;
        for path in [CONFIG_FILE, PRINTER_CONFIG_FILE] {
            if let Err(source) = self.fs.remove(path) {
                let e = SettingsError::Remove {
                    path: path.to_string(),
                    source,
                };
                warn!("{}", e);
                ok = false;
            }
        }
        ok
    }

    fn write_files(&self, config: &mut DeviceConfig) {
        info!("Saving settings now...");
        let primary = render_primary(config);
        if let Err(e) = self.write_file(CONFIG_FILE, &primary) {
            error!("{}", e);
        }

        info!("Saving printer settings now...");
        let printers = render_printers(config);
        if let Err(e) = self.write_file(PRINTER_CONFIG_FILE, &printers) {
            error!("{}", e);
        }
    }

    fn write_file(&self, path: &str, contents: &str) -> Result<(), SettingsError> {
        self.fs
            .write(path, contents)
            .map_err(|source| SettingsError::Write {
                path: path.to_string(),
                source,
            })
    }

    fn read_files(&self, config: &mut DeviceConfig) -> Result<(), SettingsError> {
        let mut printer_cnt = 0usize;
        self.for_each_line(CONFIG_FILE, |line| {
            visit_primary(config, &mut printer_cnt, &mut LineMatcher { line });
        })?;

        if printer_cnt > MAX_PRINTERS {
            warn!(
                "Ignoring setting printerCnt={}: more than {} printers",
                printer_cnt, MAX_PRINTERS
            );
            printer_cnt = 0;
        }

        // The count must be known before the printer file is parsed
        config.printers = vec![PrinterConfig::default(); printer_cnt];
        let result = self.for_each_line(PRINTER_CONFIG_FILE, |line| {
            for (index, printer) in config.printers.iter_mut().enumerate() {
                visit_printer(index, printer, &mut LineMatcher { line });
            }
        });

        for printer in config.printers.iter_mut() {
            printer.reset_telemetry();
        }
        result
    }

    fn for_each_line(&self, path: &str, mut f: impl FnMut(&str)) -> Result<(), SettingsError> {
        let read_err = |source| SettingsError::Read {
            path: path.to_string(),
            source,
        };
        let mut reader = self.fs.open_read(path).map_err(read_err)?;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).map_err(read_err)? == 0 {
                return Ok(());
            }
            let raw = buf.strip_suffix(b"\n").unwrap_or(&buf);
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let line = String::from_utf8_lossy(raw);
            if let Cow::Owned(_) = line {
                warn!("{}: replaced invalid UTF-8 in {:?}", path, line);
            }
            f(&line);
        }
    }
}

fn render_primary(config: &mut DeviceConfig) -> String {
    let mut printer_cnt = config.printers.len();
    let mut writer = LineWriter { out: String::new() };
    visit_primary(config, &mut printer_cnt, &mut writer);
    writer.out
}

fn render_printers(config: &mut DeviceConfig) -> String {
    let mut writer = LineWriter { out: String::new() };
    for (index, printer) in config.printers.iter_mut().enumerate() {
        visit_printer(index, printer, &mut writer);
    }
    writer.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults;
    use crate::model::PrinterState;
    use pretty_assertions::assert_eq;

    fn printer(name: &str, api_type: usize, port: u16) -> PrinterConfig {
        PrinterConfig {
            custom_name: name.try_into().unwrap(),
            api_type,
            api_key: "0123456789ABCDEF".try_into().unwrap(),
            remote_address: "192.168.1.50".try_into().unwrap(),
            remote_port: port,
            basic_auth_needed: true,
            basic_auth_username: "octo".try_into().unwrap(),
            basic_auth_password: "s3cret".try_into().unwrap(),
            has_psu_control: true,
            ..Default::default()
        }
    }

    fn customized() -> DeviceConfig {
        let mut config = DeviceConfig::default();
        config.system.has_basic_auth = false;
        config.system.webserver_username = "operator".to_string();
        config.system.webserver_password = "hunter2".to_string();
        config.system.webserver_port = 8080;
        config.system.use_led_flash = false;
        config.system.clock_weather_resync_minutes = 30;
        config.clock.utc_offset = -5;
        config.clock.timezone_hash = "a1b2c3".to_string();
        config.clock.show = false;
        config.clock.is_24h = false;
        config.weather.api_key = "owm-key".to_string();
        config.weather.city_id = 5_128_581;
        config.weather.is_metric = false;
        config.weather.lang = "de".to_string();
        config.weather.show = false;
        config.sensor.activated = true;
        config.sensor.show_on_display = true;
        config.sensor.sens_type = 4;
        config.display.display_type = 1;
        config.display.invert_display = true;
        config.display.show_weather_sensor_split = true;
        config.display.automatic_switch_enabled = false;
        config.display.automatic_switch_active_only = false;
        config.display.automatic_switch_delay = 8000;
        config.display.automatic_inactive_off = 0;
        config.printers = vec![printer("Prusa MK3", 2, 80), printer("Voron", 1, 7125)];
        config
    }

    #[test]
    fn test_first_boot_writes_defaults() {
        let store = SettingsStore::new(MemoryFs::new());
        let mut config = customized();

        store.load(&mut config);

        assert_eq!(config, DeviceConfig::default());
        assert!(store.fs().exists(CONFIG_FILE));
        assert!(store.fs().exists(PRINTER_CONFIG_FILE));
        assert_eq!(store.fs().contents(PRINTER_CONFIG_FILE).unwrap(), "");
    }

    #[test]
    fn test_first_boot_with_only_one_file() {
        let fs = MemoryFs::new();
        fs.write(CONFIG_FILE, "systemWebserverPort=9000\nprinterCnt=0\n")
            .unwrap();
        let store = SettingsStore::new(fs);
        let mut config = DeviceConfig::default();

        store.load(&mut config);

        assert_eq!(config.system.webserver_port, defaults::WEBSERVER_PORT);
        assert!(store.files_exist());
    }

    #[test]
    fn test_save_load_round_trip() {
        let store = SettingsStore::new(MemoryFs::new());
        let expected = customized();

        let mut config = expected.clone();
        store.save(&mut config);
        assert_eq!(config, expected);

        let mut reloaded = DeviceConfig::default();
        store.load(&mut reloaded);
        assert_eq!(reloaded, expected);
    }

    #[test]
    fn test_file_format() {
        let store = SettingsStore::new(MemoryFs::new());
        let mut config = customized();
        store.save(&mut config);

        let primary = store.fs().contents(CONFIG_FILE).unwrap();
        let lines: Vec<&str> = primary.lines().collect();
        assert_eq!(lines[0], "printerCnt=2");
        assert!(lines.contains(&"systemInvertDisplay=1"));
        assert!(lines.contains(&"clockIs24h=0"));
        assert!(lines.contains(&"clockUtcOffset=-5"));
        assert!(lines.contains(&"weatherLang=de"));
        assert!(lines.contains(&"sensorType=4"));
        assert_eq!(lines.len(), 26);

        let printers = store.fs().contents(PRINTER_CONFIG_FILE).unwrap();
        let lines: Vec<&str> = printers.lines().collect();
        assert_eq!(lines.len(), 18);
        assert_eq!(lines[0], "printer0_Name=Prusa MK3");
        assert!(lines.contains(&"printer1_RemPort=7125"));
        assert!(lines.contains(&"printer1_baNeed=1"));
    }

    #[test]
    fn test_load_resets_telemetry() {
        let store = SettingsStore::new(MemoryFs::new());
        let mut config = customized();
        config.printers[0].telemetry.state = PrinterState::Printing;
        config.printers[0].telemetry.is_printing = true;

        store.save(&mut config);

        assert_eq!(config.printers[0].telemetry.state, PrinterState::Offline);
        assert!(!config.printers[0].telemetry.is_printing);
    }

    #[test]
    fn test_values_are_trimmed_and_unknown_lines_ignored() {
        let fs = MemoryFs::new();
        fs.write(
            CONFIG_FILE,
            "printerCnt=1\r\n# comment\nweatherLang=  fr  \r\nbogusKey=3\nsystemWebserverPort=8081\n",
        )
        .unwrap();
        fs.write(
            PRINTER_CONFIG_FILE,
            "printer0_Name=  Ender 3 \nprinter0_RemPort=5000\r\nprinter1_Name=Ghost\n",
        )
        .unwrap();
        let store = SettingsStore::new(fs);
        let mut config = DeviceConfig::default();

        store.load(&mut config);

        assert_eq!(config.weather.lang, "fr");
        assert_eq!(config.system.webserver_port, 8081);
        assert_eq!(config.printers.len(), 1);
        assert_eq!(config.printers[0].custom_name, "Ender 3");
        assert_eq!(config.printers[0].remote_port, 5000);
    }

    #[test]
    fn test_booleans_accept_any_integer() {
        let fs = MemoryFs::new();
        fs.write(CONFIG_FILE, "clockShow=0\nclockIs24h=7\nweatherShow=yes\n")
            .unwrap();
        fs.write(PRINTER_CONFIG_FILE, "").unwrap();
        let store = SettingsStore::new(fs);
        let mut config = DeviceConfig::default();

        store.load(&mut config);

        assert!(!config.clock.show);
        assert!(config.clock.is_24h);
        assert!(!config.weather.show);
    }

    #[test]
    fn test_value_containing_other_key_sets_both() {
        let fs = MemoryFs::new();
        fs.write(CONFIG_FILE, "weatherApiKey=abcclockShow=0\n").unwrap();
        fs.write(PRINTER_CONFIG_FILE, "").unwrap();
        let store = SettingsStore::new(fs);
        let mut config = DeviceConfig::default();

        store.load(&mut config);

        assert_eq!(config.weather.api_key, "abcclockShow=0");
        assert!(!config.clock.show);
    }

    #[test]
    fn test_over_capacity_printer_value_keeps_default() {
        let fs = MemoryFs::new();
        fs.write(CONFIG_FILE, "printerCnt=1\n").unwrap();
        fs.write(
            PRINTER_CONFIG_FILE,
            "printer0_Name=This name is far too long for the display\nprinter0_ApiType=3\n",
        )
        .unwrap();
        let store = SettingsStore::new(fs);
        let mut config = DeviceConfig::default();

        store.load(&mut config);

        assert_eq!(config.printers[0].custom_name, "");
        assert_eq!(config.printers[0].api_type, 3);
    }

    #[test]
    fn test_out_of_range_integer_keeps_default() {
        let fs = MemoryFs::new();
        fs.write(CONFIG_FILE, "systemWebserverPort=70000\nsensorType=-2\n")
            .unwrap();
        fs.write(PRINTER_CONFIG_FILE, "").unwrap();
        let store = SettingsStore::new(fs);
        let mut config = DeviceConfig::default();

        store.load(&mut config);

        assert_eq!(config.system.webserver_port, defaults::WEBSERVER_PORT);
        assert_eq!(config.sensor.sens_type, defaults::SENSOR_TYPE);
    }

    #[test]
    fn test_oversized_printer_count_keeps_default() {
        let fs = MemoryFs::new();
        fs.write(
            CONFIG_FILE,
            "printerCnt=99999999999999999\nsystemWebserverPort=8080\n",
        )
        .unwrap();
        fs.write(PRINTER_CONFIG_FILE, "printer0_Name=Voron\n").unwrap();
        let store = SettingsStore::new(fs);
        let mut config = DeviceConfig::default();

        store.load(&mut config);

        assert!(config.printers.is_empty());
        assert_eq!(config.system.webserver_port, 8080);
    }

    #[test]
    fn test_printer_count_at_limit_is_accepted() {
        let fs = MemoryFs::new();
        fs.write(CONFIG_FILE, &format!("printerCnt={}\n", MAX_PRINTERS))
            .unwrap();
        fs.write(PRINTER_CONFIG_FILE, "").unwrap();
        let store = SettingsStore::new(fs);
        let mut config = DeviceConfig::default();

        store.load(&mut config);

        assert_eq!(config.printers.len(), MAX_PRINTERS);
    }

    #[test]
    fn test_reset_removes_files_but_keeps_memory() {
        let store = SettingsStore::new(MemoryFs::new());
        let mut config = customized();
        store.save(&mut config);

        assert!(store.reset());
        assert!(!store.files_exist());
        assert_eq!(config, customized());

        store.load(&mut config);
        assert_eq!(config, DeviceConfig::default());
        assert!(store.files_exist());
    }

    #[test]
    fn test_reset_without_files_reports_failure() {
        let store = SettingsStore::new(MemoryFs::new());
        assert!(!store.reset());
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let store = SettingsStore::new(MemoryFs::new());
        store.fs().set_read_only(true);
        let mut config = customized();

        store.save(&mut config);

        // Nothing could be written, so first-boot load keeps the defaults
        assert!(!store.files_exist());
        assert_eq!(config, DeviceConfig::default());
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("42"), 42);
        assert_eq!(parse_leading_int("  -7"), -7);
        assert_eq!(parse_leading_int("+3"), 3);
        assert_eq!(parse_leading_int("12abc"), 12);
        assert_eq!(parse_leading_int("abc"), 0);
        assert_eq!(parse_leading_int(""), 0);
    }

    #[test]
    fn test_dir_fs_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(DirFs::new(dir.path()));
        let expected = customized();

        let mut config = expected.clone();
        store.save(&mut config);

        assert!(dir.path().join("conf.txt").is_file());
        assert!(dir.path().join("printer.txt").is_file());
        assert_eq!(
            store.fs().list().unwrap(),
            vec!["/conf.txt".to_string(), "/printer.txt".to_string()]
        );

        let mut reloaded = DeviceConfig::default();
        SettingsStore::new(DirFs::new(dir.path())).load(&mut reloaded);
        assert_eq!(reloaded, expected);
    }

    #[test]
    fn test_dir_fs_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("data");
        let store = SettingsStore::new(DirFs::new(&root));
        let mut config = DeviceConfig::default();

        store.load(&mut config);

        assert!(root.join("conf.txt").is_file());
        assert_eq!(config, DeviceConfig::default());
    }

    #[test]
    fn test_invalid_utf8_line_does_not_stop_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("conf.txt"),
            b"systemWebserverPassword=caf\xe9\nprinterCnt=1\nsystemWebserverPort=8080\n",
        )
        .unwrap();
        fs::write(dir.path().join("printer.txt"), "printer0_Name=Voron\n").unwrap();
        let store = SettingsStore::new(DirFs::new(dir.path()));
        let mut config = DeviceConfig::default();

        store.load(&mut config);

        assert_eq!(config.system.webserver_password, "caf\u{fffd}");
        assert_eq!(config.system.webserver_port, 8080);
        assert_eq!(config.printers.len(), 1);
        assert_eq!(config.printers[0].custom_name.as_str(), "Voron");
    }
}
