use crate::amplitude::{AmplitudeFilter, RawCell};
use crate::config::SensorConfig;
use crate::protocol::{self, DEFAULT_AMPLITUDE, MAX_CONSECUTIVE_ERRORS, MAX_RECORD_LEN};
use crate::{ParallaxError, Result};
use std::io::{self, BufRead, BufReader, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// State shared between the acquisition thread and the controller.
struct Shared {
    raw: RawCell,
    connected: AtomicBool,
}

/// Live amplitude from an analog sensor on a serial link.
///
/// A background thread owns the device and publishes the latest raw reading
/// into a single-slot cell. The controller calls [`AmplitudeChannel::amplitude`]
/// once per tick, which rescales and smooths on the caller's thread and never
/// blocks on device I/O.
pub struct AmplitudeChannel {
    shared: Arc<Shared>,
    stop_flag: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
    filter: AmplitudeFilter,
    threshold: i64,
    max_value: i64,
    loss_reported: bool,
}

impl AmplitudeChannel {
    /// Open the serial port named in `config` and start acquisition.
    pub fn open(config: &SensorConfig) -> Result<AmplitudeChannel> {
        let port_name = config.port.clone();
        let baud_rate = config.baud_rate;
        let timeout = config.read_timeout;

        Self::spawn(config, move || {
            let port = serialport::new(&port_name, baud_rate)
                .timeout(timeout)
                .open()?;
            log::info!("Serial port opened: {} @ {} baud", port_name, baud_rate);
            Ok(port)
        })
    }

    /// Start acquisition over an already-open byte stream.
    ///
    /// The reader should return `ErrorKind::TimedOut` when idle so the thread
    /// can observe a stop request.
    pub fn from_reader<R>(reader: R, config: &SensorConfig) -> Result<AmplitudeChannel>
    where
        R: Read + Send + 'static,
    {
        Self::spawn(config, move || Ok(reader))
    }

    /// Spawn the acquisition thread, which opens the device itself and reports
    /// the outcome before entering its read loop.
    fn spawn<R, F>(config: &SensorConfig, open: F) -> Result<AmplitudeChannel>
    where
        R: Read + Send + 'static,
        F: FnOnce() -> Result<R> + Send + 'static,
    {
        config.validate()?;

        let shared = Arc::new(Shared {
            raw: RawCell::new(),
            connected: AtomicBool::new(false),
        });
        let stop_flag = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<()>>(1);

        let shared_clone = shared.clone();
        let stop_clone = stop_flag.clone();
        let thread = std::thread::Builder::new()
            .name("parallax-sensor".into())
            .spawn(move || {
                let device = match open() {
                    Ok(device) => device,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                shared_clone.connected.store(true, Ordering::Release);
                let _ = ready_tx.send(Ok(()));

                sensor_reader_loop(BufReader::new(device), &shared_clone, &stop_clone);
                shared_clone.connected.store(false, Ordering::Release);
            })
            .map_err(|e| ParallaxError::ThreadSpawn(e.to_string()))?;

        let opened = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(ParallaxError::ChannelDisconnected));
        if let Err(e) = opened {
            let _ = thread.join();
            return Err(e);
        }

        Ok(AmplitudeChannel {
            shared,
            stop_flag,
            thread: Some(thread),
            filter: AmplitudeFilter::new(config.smoothing),
            threshold: config.threshold,
            max_value: config.max_value,
            loss_reported: false,
        })
    }

    /// Advance the smoothing filter one tick and return the published amplitude.
    ///
    /// Before the first record arrives the filter holds its current value.
    /// Once the device is lost this returns the neutral default.
    pub fn amplitude(&mut self) -> f64 {
        if !self.is_connected() {
            if !self.loss_reported {
                log::warn!(
                    "Sensor device lost, amplitude held at {}",
                    DEFAULT_AMPLITUDE
                );
                self.loss_reported = true;
            }
            return DEFAULT_AMPLITUDE;
        }

        match self.shared.raw.load() {
            Some(raw) => {
                let target = protocol::rescale(raw, self.threshold, self.max_value);
                self.filter.update(target)
            }
            None => self.filter.value(),
        }
    }

    /// Latest raw device reading, if any has arrived.
    pub fn raw_value(&self) -> Option<i64> {
        self.shared.raw.load()
    }

    /// Number of well-formed records received so far.
    pub fn sample_count(&self) -> u64 {
        self.shared.raw.sample_count()
    }

    /// Whether the acquisition thread still holds an open device.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// Stop acquisition and wait for the reader thread to release the device.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
            log::info!("Sensor channel closed");
        }
    }
}

impl Drop for AmplitudeChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Names of the serial ports visible on this machine.
pub fn list_ports() -> Result<Vec<String>> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|p| p.port_name)
        .collect())
}

fn is_idle(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// Reads newline-delimited records until stopped, end of stream, or too many
/// consecutive hard errors.
///
/// Bytes are taken one buffered chunk at a time so the stop flag is seen even
/// while the device streams without newlines. A timeout may split a record;
/// the partial bytes stay in `line` and are completed by the next chunk. A run
/// longer than `MAX_RECORD_LEN` is discarded up to its newline.
fn sensor_reader_loop<R: BufRead>(mut device: R, shared: &Shared, stop_flag: &AtomicBool) {
    let mut line = Vec::with_capacity(MAX_RECORD_LEN);
    let mut discarding = false;
    let mut errors: u32 = 0;

    log::info!("Sensor reader started");

    loop {
        if stop_flag.load(Ordering::Relaxed) {
            log::info!("Sensor reader stopping (stop flag set)");
            break;
        }

        let (used, complete) = match device.fill_buf() {
            Ok([]) => {
                log::info!("Sensor stream ended");
                break;
            }
            Ok(chunk) => {
                let (used, complete) = match chunk.iter().position(|&b| b == b'\n') {
                    Some(i) => (i + 1, true),
                    None => (chunk.len(), false),
                };
                if !discarding {
                    if complete || line.len() + used <= MAX_RECORD_LEN {
                        line.extend_from_slice(&chunk[..used]);
                    } else {
                        log::trace!("Dropping {} bytes without a newline", line.len() + used);
                        line.clear();
                        discarding = true;
                    }
                }
                (used, complete)
            }
            Err(e) if is_idle(&e) => continue,
            Err(e) => {
                errors += 1;
                line.clear();
                discarding = false;
                log::warn!("Sensor read error: {}", e);
                if errors >= MAX_CONSECUTIVE_ERRORS {
                    log::warn!("Sensor reader giving up after {} consecutive errors", errors);
                    break;
                }
                continue;
            }
        };
        device.consume(used);
        errors = 0;

        if complete {
            if discarding {
                discarding = false;
            } else {
                match protocol::parse_record(&line) {
                    Some(raw) => shared.raw.store(raw),
                    None => log::trace!("Skipping malformed record {:?}", line),
                }
                line.clear();
            }
        }
    }
}
