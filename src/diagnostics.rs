//! Turns a selected metric into a user-visible result.

use std::{fmt, sync::Arc, time::Duration};

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::{
    config::ProbeConfig,
    metric::{Metric, MetricResult, Reading},
    permission::{self, Permissions},
    probe::{DataRate, ProbeError, ProbeOutcome, ProbeRunner},
    resolve::resolve,
    source::RecordSource,
    watch::{self, Subscription},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    Cell(Reading),
    Latency(Duration),
    PacketLoss(ProbeOutcome),
    DataRate(DataRate),
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measurement::Cell(reading) => write!(f, "{reading}"),
            Measurement::Latency(d) => write!(f, "Latency: {} ms", d.as_millis()),
            Measurement::PacketLoss(outcome) => {
                write!(f, "Packet Loss: {:.2}%", outcome.loss_percent())
            }
            Measurement::DataRate(rate) => write!(f, "{rate}"),
        }
    }
}

/// Every way a measurement can fail. None of them are fatal, each renders
/// as a short message.
#[derive(Debug, Error)]
pub enum DiagnosticError {
    #[error("Permissions not granted")]
    PermissionDenied,
    #[error("{}: Unable to retrieve", .0.short_name())]
    NoMatchingRecord(Metric),
    #[error("{}: Unable to measure", .metric.short_name())]
    Probe {
        metric: Metric,
        #[source]
        source: ProbeError,
    },
    #[error("Measurement for {0} is not implemented yet.")]
    Unsupported(String),
}

pub struct Diagnostics {
    permissions: Arc<dyn Permissions>,
    source: Arc<dyn RecordSource>,
    probes: ProbeRunner,
    probe_config: ProbeConfig,
}

impl Diagnostics {
    pub fn new(
        permissions: Arc<dyn Permissions>,
        source: Arc<dyn RecordSource>,
        probes: ProbeRunner,
        probe_config: ProbeConfig,
    ) -> Self {
        Self {
            permissions,
            source,
            probes,
            probe_config,
        }
    }

    /// Starts periodic signal strength updates, once the required
    /// permissions are granted.
    pub fn watch(
        &self,
        interval: Duration,
    ) -> Result<(Subscription, mpsc::Receiver<MetricResult>), DiagnosticError> {
        if let Some(permission) = permission::missing(&*self.permissions) {
            warn!(%permission, "permission not granted");
            return Err(DiagnosticError::PermissionDenied);
        }

        Ok(watch::subscribe(self.source.clone(), interval))
    }

    /// Looks up a metric by display name or id, then measures it.
    pub async fn measure_named(&self, name: &str) -> Result<Measurement, DiagnosticError> {
        let metric = name
            .parse::<Metric>()
            .map_err(|_| DiagnosticError::Unsupported(name.to_owned()))?;
        self.measure(metric).await
    }

    pub async fn measure(&self, metric: Metric) -> Result<Measurement, DiagnosticError> {
        if let Some(permission) = permission::missing(&*self.permissions) {
            warn!(%metric, %permission, "permission not granted");
            return Err(DiagnosticError::PermissionDenied);
        }

        let result = if metric.is_cell_metric() {
            self.measure_cell(metric).await
        } else {
            self.measure_network(metric).await
        };

        match &result {
            Ok(measurement) => info!(%metric, %measurement, "measured"),
            Err(e) => info!(%metric, error = %e, "measurement unavailable"),
        }
        result
    }

    async fn measure_cell(&self, metric: Metric) -> Result<Measurement, DiagnosticError> {
        let records = match self.source.cell_records().await {
            Ok(records) => records,
            Err(e) => {
                warn!(%metric, error = ?e, "could not query cell records");
                return Err(DiagnosticError::NoMatchingRecord(metric));
            }
        };

        match resolve(metric, &records) {
            MetricResult::Value(reading) => Ok(Measurement::Cell(reading)),
            MetricResult::Unavailable => Err(DiagnosticError::NoMatchingRecord(metric)),
        }
    }

    async fn measure_network(&self, metric: Metric) -> Result<Measurement, DiagnosticError> {
        let target = self.probe_config.target.as_str();

        let result = match metric {
            Metric::Latency => self.probes.latency(target).await.map(Measurement::Latency),
            Metric::PacketLoss => self
                .probes
                .packet_loss(target)
                .await
                .map(Measurement::PacketLoss),
            Metric::DataRate => self
                .probes
                .data_rate(
                    &self.probe_config.speedtest_host,
                    self.probe_config.speedtest_port,
                )
                .await
                .map(Measurement::DataRate),
            other => return Err(DiagnosticError::Unsupported(other.to_string())),
        };

        result.map_err(|source| DiagnosticError::Probe { metric, source })
    }
}

/// The single line shown on the detail screen.
pub fn message(result: &Result<Measurement, DiagnosticError>) -> String {
    match result {
        Ok(measurement) => measurement.to_string(),
        Err(e) => e.to_string(),
    }
}
