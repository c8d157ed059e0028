// src/gps/source.rs
//! Live position sources delivered as cancelable subscriptions

use super::{data::GpsData, gpsd, nmea};
use crate::{
    error::{Result, RouteError},
    route::{Fix, Route},
};
use chrono::Utc;
use log::{debug, warn};
use std::{
    io::ErrorKind,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    task::JoinHandle,
};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

pub type FixCallback = Box<dyn FnMut(Fix) + Send + 'static>;
pub type ErrorCallback = Box<dyn FnMut(String) + Send + 'static>;

/// Something that reports position fixes until canceled.
///
/// Failures while reading are delivered to `on_error` and are not fatal;
/// the subscription keeps waiting for the next fix where the source allows it.
pub trait PositionSource {
    fn name(&self) -> &str;

    /// Start delivering fixes. Must be called from within a tokio runtime.
    fn subscribe(&self, on_fix: FixCallback, on_error: ErrorCallback) -> Subscription;
}

/// Handle to a running source task. Canceling stops delivery immediately.
#[derive(Debug)]
pub struct Subscription {
    active: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    fn spawn<F>(task: impl FnOnce(Arc<AtomicBool>) -> F) -> Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let handle = tokio::spawn(task(Arc::clone(&active)));
        Self {
            active,
            handle: Some(handle),
        }
    }

    /// Unsubscribe. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        self.active.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Position subscription canceled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
            && self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Callback pair that goes quiet once the subscription is canceled
struct Delivery {
    active: Arc<AtomicBool>,
    on_fix: FixCallback,
    on_error: ErrorCallback,
}

impl Delivery {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn fix(&mut self, fix: Fix) {
        if self.is_active() {
            (self.on_fix)(fix);
        }
    }

    fn error(&mut self, message: String) {
        if self.is_active() {
            warn!("{}", message);
            (self.on_error)(message);
        }
    }
}

/// How a line loop finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinesEnd {
    Eof,
    Canceled,
    Failed,
}

/// Hand each newline-terminated line to `handle` until EOF, cancellation or
/// a fatal read error.
///
/// Undecodable bytes and read timeouts are reported through `delivery` and
/// skipped; the loop goes on waiting for the next line.
async fn read_lines<R, F>(
    reader: &mut R,
    delivery: &mut Delivery,
    label: &str,
    mut handle: F,
) -> LinesEnd
where
    R: AsyncBufRead + Unpin,
    F: FnMut(&str, &mut Delivery),
{
    let mut buf = Vec::new();

    while delivery.is_active() {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => return LinesEnd::Eof,
            Ok(_) => match std::str::from_utf8(&buf) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        handle(line, delivery);
                    }
                }
                Err(_) => {
                    delivery.error(format!("Ignoring undecodable line from {}", label));
                }
            },
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::InvalidData | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                delivery.error(format!("Error reading from {}: {}", label, e));
            }
            Err(e) => {
                delivery.error(format!("Error reading from {}: {}", label, e));
                return LinesEnd::Failed;
            }
        }
    }

    LinesEnd::Canceled
}

/// Fixes from a gpsd daemon
#[derive(Debug, Clone)]
pub struct GpsdSource {
    pub host: String,
    pub port: u16,
}

impl PositionSource for GpsdSource {
    fn name(&self) -> &str {
        "gpsd"
    }

    fn subscribe(&self, on_fix: FixCallback, on_error: ErrorCallback) -> Subscription {
        let host = self.host.clone();
        let port = self.port;

        Subscription::spawn(move |active| async move {
            let mut delivery = Delivery { active, on_fix, on_error };

            let mut reader = match gpsd::connect_gpsd(&host, port).await {
                Ok(reader) => reader,
                Err(e) => {
                    delivery.error(e.to_string());
                    return;
                }
            };

            let mut data = GpsData::new();
            let end = read_lines(&mut reader, &mut delivery, "gpsd", |line, delivery| {
                match gpsd::parse_gpsd_json(&mut data, line) {
                    Ok(true) => {
                        if let Some(fix) = data.to_fix() {
                            delivery.fix(fix);
                        }
                    }
                    Ok(false) => {}
                    Err(e) => delivery.error(e.to_string()),
                }
            })
            .await;

            if end == LinesEnd::Eof {
                delivery.error("gpsd closed the connection".to_string());
            }
        })
    }
}

/// Fixes from an NMEA receiver on a serial port
#[derive(Debug, Clone)]
pub struct SerialSource {
    pub port: String,
    pub baudrate: u32,
}

impl PositionSource for SerialSource {
    fn name(&self) -> &str {
        "serial"
    }

    fn subscribe(&self, on_fix: FixCallback, on_error: ErrorCallback) -> Subscription {
        let port = self.port.clone();
        let baudrate = self.baudrate;

        Subscription::spawn(move |active| async move {
            let mut delivery = Delivery { active, on_fix, on_error };

            let serial = match open_serial(&port, baudrate) {
                Ok(serial) => serial,
                Err(e) => {
                    delivery.error(format!("Failed to open serial port {}: {}", port, e));
                    return;
                }
            };

            let mut reader = BufReader::new(serial);
            let mut data = GpsData::new();
            read_lines(&mut reader, &mut delivery, "serial port", |line, delivery| {
                // NMEA carries only time of day, so stamp fixes on arrival
                data.update_timestamp();
                if nmea::parse_nmea_sentence(&mut data, line) {
                    if let Some(fix) = data.to_fix() {
                        delivery.fix(fix);
                    }
                }
            })
            .await;
        })
    }
}

fn open_serial(port: &str, baudrate: u32) -> Result<SerialStream> {
    let serial = tokio_serial::new(port, baudrate)
        .timeout(Duration::from_millis(1000))
        .open_native_async()?;
    Ok(serial)
}

/// Plays back a fixed list of fixes at a steady cadence
#[derive(Debug, Clone)]
pub struct ReplaySource {
    fixes: Vec<Fix>,
    interval: Duration,
    restamp: bool,
}

impl ReplaySource {
    pub fn new(fixes: Vec<Fix>, interval: Duration) -> Self {
        Self {
            fixes,
            interval,
            restamp: false,
        }
    }

    /// Replace recorded timestamps with the wall-clock time of delivery
    pub fn restamped(mut self) -> Self {
        self.restamp = true;
        self
    }

    /// Drive a saved route's own points back through as fixes
    pub fn from_route(route: &Route, interval: Duration) -> Self {
        let fixes = route
            .points
            .iter()
            .map(|p| Fix {
                latitude: Some(p.latitude),
                longitude: Some(p.longitude),
                timestamp: p.timestamp,
                accuracy: p.accuracy,
            })
            .collect();
        Self::new(fixes, interval)
    }

    /// Load a JSON array of fixes (`latitude`/`longitude` or `lat`/`lon`)
    pub fn from_file(path: &Path, interval: Duration) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let fixes: Vec<Fix> = serde_json::from_str(&contents).map_err(|e| {
            RouteError::Parse(format!("Failed to parse replay file {}: {}", path.display(), e))
        })?;
        Ok(Self::new(fixes, interval))
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

impl PositionSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    fn subscribe(&self, on_fix: FixCallback, on_error: ErrorCallback) -> Subscription {
        let fixes = self.fixes.clone();
        let interval = self.interval;
        let restamp = self.restamp;

        Subscription::spawn(move |active| async move {
            let mut delivery = Delivery { active, on_fix, on_error };

            for mut fix in fixes {
                tokio::time::sleep(interval).await;
                if !delivery.is_active() {
                    break;
                }
                if restamp {
                    fix.timestamp = Utc::now().timestamp_millis();
                }
                delivery.fix(fix);
            }
            debug!("Replay finished");
        })
    }
}
