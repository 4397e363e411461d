//! Reachability probes against a fixed host.
//!
//! Probes block, so each measurement runs on its own blocking worker and the
//! caller awaits the value it produces.

use std::{
    fmt, io,
    net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs},
    sync::Arc,
    time::{Duration, Instant},
};

use thiserror::Error;
use tokio::task;
use tracing::{debug, warn};

pub const LATENCY_TIMEOUT: Duration = Duration::from_millis(1000);
pub const PACKET_LOSS_ATTEMPTS: u32 = 10;
pub const PACKET_LOSS_TIMEOUT: Duration = Duration::from_millis(500);

/// Connect timeout used by the data-rate handshake.
pub const DATA_RATE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("could not resolve {host}: {source}")]
    Resolve { host: String, source: io::Error },
    #[error("no address found for {0}")]
    NoAddress(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("probe worker failed: {0}")]
    Worker(#[from] task::JoinError),
}

pub trait Prober: Send + Sync {
    /// Best-effort check whether `ip` answers within `timeout`. An `Err`
    /// means the probe itself could not be performed.
    fn is_reachable(&self, ip: IpAddr, timeout: Duration) -> io::Result<bool>;

    /// Opens and closes one TCP connection to `addr`.
    fn connect(&self, addr: SocketAddr, timeout: Duration) -> io::Result<()>;
}

/// Reachability over TCP, the way unprivileged processes check hosts: a
/// refused connection still proves the host is up.
#[derive(Debug, Clone, Copy)]
pub struct TcpProber {
    pub port: u16,
}

impl Default for TcpProber {
    fn default() -> Self {
        // echo
        Self { port: 7 }
    }
}

impl Prober for TcpProber {
    fn is_reachable(&self, ip: IpAddr, timeout: Duration) -> io::Result<bool> {
        reachability(TcpStream::connect_timeout(
            &SocketAddr::new(ip, self.port),
            timeout,
        ))
    }

    fn connect(&self, addr: SocketAddr, timeout: Duration) -> io::Result<()> {
        TcpStream::connect_timeout(&addr, timeout)?;
        Ok(())
    }
}

/// Classifies the result of a connect attempt. A refused connection still
/// counts as an answer. No route to the host, or no answer before the
/// timeout, means not reachable.
fn reachability<T>(result: io::Result<T>) -> io::Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(e) => match e.kind() {
            io::ErrorKind::ConnectionRefused => Ok(true),
            io::ErrorKind::TimedOut
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::NetworkUnreachable
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::InvalidInput => Ok(false),
            _ => Err(e),
        },
    }
}

/// Counts from one packet-loss run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub sent: u32,
    pub received: u32,
    pub elapsed: Duration,
}

impl ProbeOutcome {
    pub fn loss_percent(&self) -> f64 {
        if self.sent == 0 {
            return 0.0;
        }
        f64::from(self.sent - self.received) / f64::from(self.sent) * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataRate {
    pub download_mbps: f64,
    pub upload_mbps: f64,
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Download: {} Mbps\nUpload: {} Mbps",
            self.download_mbps, self.upload_mbps
        )
    }
}

#[derive(Clone)]
pub struct ProbeRunner {
    prober: Arc<dyn Prober>,
}

impl ProbeRunner {
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self { prober }
    }

    /// Wall-clock duration of a single probe. The answer itself is not
    /// considered, only whether the probe could be sent.
    pub async fn latency(&self, host: &str) -> Result<Duration, ProbeError> {
        let prober = self.prober.clone();
        let host = host.to_owned();

        task::spawn_blocking(move || -> Result<Duration, ProbeError> {
            let ip = resolve_host(&host)?;
            let start = Instant::now();
            let reachable = prober.is_reachable(ip, LATENCY_TIMEOUT)?;
            let elapsed = start.elapsed();
            debug!(%ip, reachable, elapsed_ms = elapsed.as_millis() as u64, "latency probe");
            Ok(elapsed)
        })
        .await?
    }

    /// Runs the fixed number of sequential probes. Unanswered or unroutable
    /// probes count as loss; any other I/O error aborts the whole run.
    pub async fn packet_loss(&self, host: &str) -> Result<ProbeOutcome, ProbeError> {
        let prober = self.prober.clone();
        let host = host.to_owned();

        task::spawn_blocking(move || -> Result<ProbeOutcome, ProbeError> {
            let ip = resolve_host(&host)?;
            let start = Instant::now();
            let mut sent = 0;
            let mut received = 0;

            for _ in 0..PACKET_LOSS_ATTEMPTS {
                sent += 1;
                if prober.is_reachable(ip, PACKET_LOSS_TIMEOUT)? {
                    received += 1;
                }
            }

            let outcome = ProbeOutcome {
                sent,
                received,
                elapsed: start.elapsed(),
            };
            debug!(%ip, sent, received, "packet loss probe");
            Ok(outcome)
        })
        .await?
    }

    /// Checks that the speed-test server accepts connections.
    // TODO: replace the zero rates with a timed HTTP download and upload against the same host
    pub async fn data_rate(&self, host: &str, port: u16) -> Result<DataRate, ProbeError> {
        let prober = self.prober.clone();
        let host = host.to_owned();

        task::spawn_blocking(move || -> Result<DataRate, ProbeError> {
            let ip = resolve_host(&host)?;
            prober.connect(SocketAddr::new(ip, port), DATA_RATE_TIMEOUT)?;
            Ok(DataRate {
                download_mbps: 0.0,
                upload_mbps: 0.0,
            })
        })
        .await?
    }
}

fn resolve_host(host: &str) -> Result<IpAddr, ProbeError> {
    if let Ok(ip) = host.parse() {
        return Ok(ip);
    }

    let mut addrs = (host, 0).to_socket_addrs().map_err(|source| {
        warn!(host, "could not resolve probe target");
        ProbeError::Resolve {
            host: host.to_owned(),
            source,
        }
    })?;

    addrs
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| ProbeError::NoAddress(host.to_owned()))
}
