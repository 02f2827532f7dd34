//! OctoPrint REST API printer backend.
//!
//! Polls `/api/job` and `/api/printer` for job and temperature state, and
//! the PSU Control plugin for power state. The API key travels as the
//! `apikey` query parameter.

use printbuddy_core::{PrinterBackend, PrinterConfig, PrinterState};
use printbuddy_transport::{basic_auth, Connector, JsonRequestClient, Request, TcpConnector};
use serde::Deserialize;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct JobResponse {
    state: String,
    #[serde(default)]
    job: JobInfo,
    #[serde(default)]
    progress: Progress,
}

#[derive(Debug, Default, Deserialize)]
struct JobInfo {
    #[serde(default)]
    file: FileInfo,
    #[serde(default)]
    filament: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct FileInfo {
    name: Option<String>,
    size: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Progress {
    completion: Option<f32>,
    print_time: Option<u32>,
    print_time_left: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PrinterResponse {
    temperature: Option<Temperatures>,
}

#[derive(Debug, Deserialize)]
struct Temperatures {
    tool0: Option<Temperature>,
    bed: Option<Temperature>,
}

#[derive(Debug, Deserialize)]
struct Temperature {
    actual: Option<f32>,
    target: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct PsuResponse {
    #[serde(rename = "isPSUOn")]
    is_psu_on: bool,
}

/// Map OctoPrint's state text to a printer state.
fn map_state(text: &str, completion: f32) -> PrinterState {
    if text.starts_with("Printing") {
        PrinterState::Printing
    } else if text.starts_with("Paus") {
        PrinterState::Paused
    } else if text.starts_with("Offline") || text.starts_with("Closed") {
        PrinterState::Offline
    } else if text.contains("Error") {
        PrinterState::Error
    } else if completion >= 100.0 {
        PrinterState::Completed
    } else {
        PrinterState::Standby
    }
}

pub struct OctoPrintClient<C: Connector = TcpConnector> {
    client: Rc<RefCell<JsonRequestClient<C>>>,
}

impl<C: Connector> OctoPrintClient<C> {
    pub fn new(client: Rc<RefCell<JsonRequestClient<C>>>) -> Self {
        Self { client }
    }

    fn get(printer: &PrinterConfig, path: &str) -> Request {
        Self::authorize(
            printer,
            Request::get(
                printer.remote_address.as_str(),
                printer.remote_port,
                format!("{}?apikey={}", path, printer.api_key),
            ),
        )
    }

    fn post(printer: &PrinterConfig, path: &str, body: &str) -> Request {
        Self::authorize(
            printer,
            Request::post(
                printer.remote_address.as_str(),
                printer.remote_port,
                format!("{}?apikey={}", path, printer.api_key),
                body,
            ),
        )
    }

    fn authorize(printer: &PrinterConfig, req: Request) -> Request {
        if printer.basic_auth_needed {
            req.with_auth(basic_auth(
                &printer.basic_auth_username,
                &printer.basic_auth_password,
            ))
        } else {
            req
        }
    }
}

impl<C: Connector> PrinterBackend for OctoPrintClient<C> {
    fn client_type(&self) -> &str {
        "OctoPrint"
    }

    fn api_key_required(&self) -> bool {
        true
    }

    fn is_valid_config(&self, printer: &PrinterConfig) -> bool {
        !printer.remote_address.is_empty() && printer.remote_port != 0 && !printer.api_key.is_empty()
    }

    fn fetch_job_status(&mut self, printer: &mut PrinterConfig) {
        let mut client = self.client.borrow_mut();

        let job: Option<JobResponse> = client.request_json_as(&Self::get(printer, "/api/job"), true);
        let Some(job) = job else {
            let t = &mut printer.telemetry;
            t.state = PrinterState::Offline;
            t.is_printing = false;
            t.error.set_truncated(&client.last_error_text());
            return;
        };

        let t = &mut printer.telemetry;
        let completion = job.progress.completion.unwrap_or(0.0);
        t.error.clear();
        t.state = map_state(&job.state, completion);
        t.is_printing = t.state == PrinterState::Printing;
        t.progress_completion = completion;
        t.print_time_elapsed = job.progress.print_time.unwrap_or(0);
        t.print_time_left = job.progress.print_time_left.unwrap_or(0);
        t.file_name = job.job.file.name.unwrap_or_default();
        t.file_size = job.job.file.size.unwrap_or(0);
        t.filament_length = job
            .job
            .filament
            .as_ref()
            .and_then(|f| f["tool0"]["length"].as_f64())
            .unwrap_or(0.0) as f32;
        debug!("{}: {} {:.1}%", printer.custom_name, job.state, completion);

        // 409 CONFLICT when the printer is not operational; no temperatures then
        let status: Option<PrinterResponse> =
            client.request_json_as(&Self::get(printer, "/api/printer"), true);
        let t = &mut printer.telemetry;
        t.tool_temp = 0.0;
        t.tool_target_temp = 0.0;
        t.bed_temp = 0.0;
        t.bed_target_temp = 0.0;
        if let Some(temps) = status.and_then(|s| s.temperature) {
            if let Some(tool) = temps.tool0 {
                t.tool_temp = tool.actual.unwrap_or(0.0);
                t.tool_target_temp = tool.target.unwrap_or(0.0);
            }
            if let Some(bed) = temps.bed {
                t.bed_temp = bed.actual.unwrap_or(0.0);
                t.bed_target_temp = bed.target.unwrap_or(0.0);
            }
        }
    }

    fn fetch_psu_status(&mut self, printer: &mut PrinterConfig) {
        if !printer.has_psu_control {
            printer.telemetry.is_psu_off = false;
            return;
        }

        let req = Self::post(printer, "/api/plugin/psucontrol", r#"{"command":"getPSUState"}"#);
        let psu: Option<PsuResponse> = self.client.borrow_mut().request_json_as(&req, true);
        match psu {
            Some(psu) => printer.telemetry.is_psu_off = !psu.is_psu_on,
            None => debug!("{}: PSU state unavailable", printer.custom_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printbuddy_transport::Connection;
    use std::io::{self, Cursor, Read, Write};

    type Routes = Vec<(&'static str, &'static str)>;

    /// Answers each request with the response routed by its path prefix.
    struct RoutedConnection {
        routes: Rc<Routes>,
        sent: Rc<RefCell<Vec<String>>>,
        written: Vec<u8>,
        response: Option<Cursor<Vec<u8>>>,
    }

    impl Read for RoutedConnection {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.response.is_none() {
                let request = String::from_utf8_lossy(&self.written).to_string();
                let path = request.split(' ').nth(1).unwrap_or("").to_string();
                let raw = self
                    .routes
                    .iter()
                    .find(|(prefix, _)| path.starts_with(prefix))
                    .map(|(_, raw)| *raw)
                    .unwrap_or("HTTP/1.1 404 Not Found\r\n\r\n");
                self.sent.borrow_mut().push(request);
                self.response = Some(Cursor::new(raw.as_bytes().to_vec()));
            }
            self.response.as_mut().unwrap().read(buf)
        }
    }

    impl Write for RoutedConnection {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct RoutedConnector {
        routes: Option<Rc<Routes>>,
        sent: Rc<RefCell<Vec<String>>>,
    }

    impl Connector for RoutedConnector {
        fn connect(&self, _host: &str, _port: u16) -> io::Result<Box<dyn Connection>> {
            let routes = self
                .routes
                .clone()
                .ok_or_else(|| io::Error::from(io::ErrorKind::ConnectionRefused))?;
            Ok(Box::new(RoutedConnection {
                routes,
                sent: self.sent.clone(),
                written: Vec::new(),
                response: None,
            }))
        }
    }

    fn backend(routes: Option<Routes>) -> (OctoPrintClient<RoutedConnector>, Rc<RefCell<Vec<String>>>) {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let connector = RoutedConnector {
            routes: routes.map(Rc::new),
            sent: sent.clone(),
        };
        let client = Rc::new(RefCell::new(JsonRequestClient::new(connector)));
        (OctoPrintClient::new(client), sent)
    }

    fn printer() -> PrinterConfig {
        let mut p = PrinterConfig::default();
        p.custom_name.set("Voron").unwrap();
        p.api_key.set("ABCDEF").unwrap();
        p.remote_address.set("octopi.local").unwrap();
        p.remote_port = 80;
        p
    }

    const JOB_PRINTING: &str = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n\
        {\"job\":{\"file\":{\"name\":\"benchy.gcode\",\"size\":1468987},\
        \"filament\":{\"tool0\":{\"length\":810.5,\"volume\":5.4}}},\
        \"progress\":{\"completion\":22.5,\"printTime\":276,\"printTimeLeft\":912},\
        \"state\":\"Printing\"}";

    const PRINTER_TEMPS: &str = "HTTP/1.1 200 OK\r\n\r\n\
        {\"temperature\":{\"tool0\":{\"actual\":214.5,\"target\":215.0},\
        \"bed\":{\"actual\":60.25,\"target\":60.0}}}";

    #[test]
    fn test_job_and_temperatures() {
        let (mut backend, sent) = backend(Some(vec![
            ("/api/job", JOB_PRINTING),
            ("/api/printer", PRINTER_TEMPS),
        ]));
        let mut p = printer();

        backend.fetch_job_status(&mut p);

        let t = &p.telemetry;
        assert_eq!(t.state, PrinterState::Printing);
        assert!(t.is_printing);
        assert_eq!(t.progress_completion, 22.5);
        assert_eq!(t.print_time_elapsed, 276);
        assert_eq!(t.print_time_left, 912);
        assert_eq!(t.file_name, "benchy.gcode");
        assert_eq!(t.file_size, 1_468_987);
        assert_eq!(t.filament_length, 810.5);
        assert_eq!(t.tool_temp, 214.5);
        assert_eq!(t.bed_temp, 60.25);
        assert_eq!(t.bed_target_temp, 60.0);

        let sent = sent.borrow();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].starts_with("GET /api/job?apikey=ABCDEF HTTP/1.1\r\n"));
        assert!(!sent[0].contains("Authorization"));
    }

    #[test]
    fn test_conflict_keeps_job_state() {
        let (mut backend, _) = backend(Some(vec![
            (
                "/api/job",
                "HTTP/1.1 200 OK\r\n\r\n{\"job\":{\"file\":{\"name\":null}},\"progress\":{\"completion\":null},\"state\":\"Offline\"}",
            ),
            (
                "/api/printer",
                "HTTP/1.1 409 CONFLICT\r\n\r\n{\"error\":\"Printer is not operational\"}",
            ),
        ]));
        let mut p = printer();
        p.telemetry.tool_temp = 214.5;
        p.telemetry.tool_target_temp = 215.0;
        p.telemetry.bed_temp = 60.25;
        p.telemetry.bed_target_temp = 60.0;

        backend.fetch_job_status(&mut p);

        assert_eq!(p.telemetry.state, PrinterState::Offline);
        assert_eq!(p.telemetry.file_name, "");
        assert_eq!(p.telemetry.tool_temp, 0.0);
        assert_eq!(p.telemetry.tool_target_temp, 0.0);
        assert_eq!(p.telemetry.bed_temp, 0.0);
        assert_eq!(p.telemetry.bed_target_temp, 0.0);
        assert!(p.telemetry.error.is_empty());
    }

    #[test]
    fn test_unreachable_marks_offline_with_error() {
        let (mut backend, _) = backend(None);
        let mut p = printer();
        p.telemetry.state = PrinterState::Printing;
        p.telemetry.is_printing = true;

        backend.fetch_job_status(&mut p);

        assert_eq!(p.telemetry.state, PrinterState::Offline);
        assert!(!p.telemetry.is_printing);
        assert!(p.telemetry.error.starts_with("SOCKET: Connection failed: octopi.local:80"));
    }

    #[test]
    fn test_psu_state_with_basic_auth() {
        let (mut backend, sent) = backend(Some(vec![(
            "/api/plugin/psucontrol",
            "HTTP/1.1 200 OK\r\n\r\n{\"isPSUOn\":false}",
        )]));
        let mut p = printer();
        p.has_psu_control = true;
        p.basic_auth_needed = true;
        p.basic_auth_username.set("admin").unwrap();
        p.basic_auth_password.set("secret").unwrap();

        backend.fetch_psu_status(&mut p);

        assert!(p.telemetry.is_psu_off);
        let sent = sent.borrow();
        assert!(sent[0].starts_with("POST /api/plugin/psucontrol?apikey=ABCDEF HTTP/1.1\r\n"));
        assert!(sent[0].contains("Authorization: Basic YWRtaW46c2VjcmV0\r\n"));
        assert!(sent[0].ends_with("{\"command\":\"getPSUState\"}"));
    }

    #[test]
    fn test_psu_without_control_skips_request() {
        let (mut backend, sent) = backend(None);
        let mut p = printer();
        p.telemetry.is_psu_off = true;

        backend.fetch_psu_status(&mut p);

        assert!(!p.telemetry.is_psu_off);
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn test_config_validation() {
        let (backend, _) = backend(None);
        let mut p = printer();
        assert!(backend.is_valid_config(&p));

        p.api_key.clear();
        assert!(!backend.is_valid_config(&p));
    }

    #[test]
    fn test_state_mapping() {
        assert_eq!(map_state("Printing from SD", 10.0), PrinterState::Printing);
        assert_eq!(map_state("Pausing", 10.0), PrinterState::Paused);
        assert_eq!(map_state("Offline after error", 0.0), PrinterState::Offline);
        assert_eq!(map_state("Error: Thermal runaway", 0.0), PrinterState::Error);
        assert_eq!(map_state("Operational", 100.0), PrinterState::Completed);
        assert_eq!(map_state("Operational", 0.0), PrinterState::Standby);
    }
}
