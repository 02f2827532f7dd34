//! Display backend that renders screens as log lines.

use printbuddy_core::{DisplayBackend, DisplayConfig, DisplayContext};
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Printer(usize),
    Sensor,
    Clock,
}

/// Pages in rotation order.
///
/// With `automatic_switch_active_only`, idle printers are left out while at
/// least one printer is printing.
pub fn pages(ctx: &DisplayContext<'_>) -> Vec<Page> {
    let only_active = ctx.display.automatic_switch_active_only && ctx.num_printers_printing() > 0;
    let mut pages: Vec<Page> = ctx
        .printers
        .iter()
        .enumerate()
        .filter(|(_, p)| !only_active || p.telemetry.is_printing)
        .map(|(i, _)| Page::Printer(i))
        .collect();
    if ctx.sensor.show_on_display {
        pages.push(Page::Sensor);
    }
    if ctx.clock.show || pages.is_empty() {
        pages.push(Page::Clock);
    }
    pages
}

pub fn render(page: Page, ctx: &DisplayContext<'_>) -> String {
    match page {
        Page::Printer(i) => match ctx.printers.get(i) {
            Some(p) if p.telemetry.is_printing => format!(
                "[{}] {} {:.1}% {} ({} min left) | tool {:.0}/{:.0} bed {:.0}/{:.0}",
                p.custom_name,
                p.state_text(),
                p.telemetry.progress_completion,
                p.telemetry.file_name,
                p.telemetry.print_time_left / 60,
                p.telemetry.tool_temp,
                p.telemetry.tool_target_temp,
                p.telemetry.bed_temp,
                p.telemetry.bed_target_temp,
            ),
            Some(p) if !p.telemetry.error.is_empty() => {
                format!("[{}] {} | {}", p.custom_name, p.state_text(), p.telemetry.error)
            }
            Some(p) => format!("[{}] {}", p.custom_name, p.state_text()),
            None => String::new(),
        },
        Page::Sensor => {
            let s = ctx.sensor;
            if !s.error.is_empty() {
                format!("Sensor | {}", s.error)
            } else {
                format!(
                    "Sensor | {:.1}C {:.0}% {:.1}hPa",
                    s.temperature, s.humidity, s.pressure
                )
            }
        }
        Page::Clock => {
            let offset = chrono::Duration::hours(i64::from(ctx.clock.utc_offset));
            let format = if ctx.clock.is_24h { "%H:%M" } else { "%I:%M %p" };
            format!("Clock | {}", (chrono::Utc::now() + offset).format(format))
        }
    }
}

fn switch_due(display: &DisplayConfig, since_switch: Duration) -> bool {
    display.automatic_switch_enabled
        && since_switch >= Duration::from_millis(u64::from(display.automatic_switch_delay))
}

fn inactive_off_due(display: &DisplayConfig, idle: Duration) -> bool {
    display.automatic_inactive_off > 0
        && idle >= Duration::from_secs(u64::from(display.automatic_inactive_off) * 60)
}

pub struct ConsoleDisplay {
    page: usize,
    last_switch: Instant,
    idle_since: Instant,
    is_off: bool,
    is_config_change: bool,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self {
            page: 0,
            last_switch: Instant::now(),
            idle_since: Instant::now(),
            is_off: false,
            is_config_change: false,
        }
    }
}

impl Default for ConsoleDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayBackend for ConsoleDisplay {
    fn pre_setup(&mut self) {
        self.page = 0;
        self.is_off = false;
    }

    fn post_setup(&mut self, is_config_change: bool) {
        self.is_config_change = is_config_change;
        debug!("Console display ready (config change: {})", is_config_change);
    }

    fn show_boot_screen(&mut self, ctx: &DisplayContext<'_>) {
        info!("== PrintBuddy {} ==", ctx.system.version);
    }

    fn first_loop_completed(&mut self) {
        self.last_switch = Instant::now();
        self.idle_since = Instant::now();
    }

    fn handle_update(&mut self, ctx: &DisplayContext<'_>) {
        if ctx.num_printers_printing() > 0 {
            self.idle_since = Instant::now();
            if self.is_off {
                info!("Display on");
                self.is_off = false;
            }
        } else if !self.is_off && inactive_off_due(ctx.display, self.idle_since.elapsed()) {
            info!("Display off after {} idle minutes", ctx.display.automatic_inactive_off);
            self.is_off = true;
        }
        if self.is_off {
            return;
        }

        let pages = pages(ctx);
        let switched = switch_due(ctx.display, self.last_switch.elapsed());
        if switched {
            self.page += 1;
            self.last_switch = Instant::now();
        }
        let page = pages[self.page % pages.len()];
        let line = render(page, ctx);
        if switched {
            info!("{}", line);
        } else {
            debug!("{}", line);
        }
    }

    fn show_ap_access_screen(&mut self, ap_ssid: &str, ap_ip: &str) {
        info!("Connect to access point {} and open http://{}", ap_ssid, ap_ip);
    }

    fn show_webserver_splash_screen(&mut self, is_enabled: bool) {
        info!("Web interface {}", if is_enabled { "enabled" } else { "disabled" });
    }
}
