use std::fmt;

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::model::Number;

/// Metrics offered on the list screen, in display order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Metric {
    #[strum(to_string = "RSRP", serialize = "rsrp")]
    Rsrp,
    #[strum(to_string = "RSRQ", serialize = "rsrq")]
    Rsrq,
    #[strum(to_string = "SINR", serialize = "sinr")]
    Sinr,
    #[strum(to_string = "EC/IO", serialize = "ecio", serialize = "ec-io")]
    EcIo,
    #[strum(to_string = "Cell ID (CID)", serialize = "cell-id", serialize = "cid")]
    CellId,
    #[strum(
        to_string = "Location Area Code (LAC)",
        serialize = "lac",
        serialize = "location-area-code"
    )]
    Lac,
    #[strum(
        to_string = "Timing Advance (TA)",
        serialize = "timing-advance",
        serialize = "ta"
    )]
    TimingAdvance,
    #[strum(to_string = "Signal Strength", serialize = "signal-strength")]
    SignalStrength,
    #[strum(to_string = "Data Rate", serialize = "data-rate")]
    DataRate,
    #[strum(to_string = "Latency", serialize = "latency")]
    Latency,
    #[strum(to_string = "Packet Loss", serialize = "packet-loss")]
    PacketLoss,
}

impl Metric {
    /// Stable kebab-case identifier, used in URLs and on the command line.
    pub fn id(self) -> &'static str {
        match self {
            Metric::Rsrp => "rsrp",
            Metric::Rsrq => "rsrq",
            Metric::Sinr => "sinr",
            Metric::EcIo => "ecio",
            Metric::CellId => "cell-id",
            Metric::Lac => "lac",
            Metric::TimingAdvance => "timing-advance",
            Metric::SignalStrength => "signal-strength",
            Metric::DataRate => "data-rate",
            Metric::Latency => "latency",
            Metric::PacketLoss => "packet-loss",
        }
    }

    /// Prefix used when a measurement cannot be produced.
    pub fn short_name(self) -> &'static str {
        match self {
            Metric::CellId => "Cell ID",
            Metric::Lac => "LAC",
            Metric::TimingAdvance => "Timing Advance",
            other => other.into(),
        }
    }

    /// Metrics derived from cell records rather than network probes.
    pub fn is_cell_metric(self) -> bool {
        !matches!(self, Metric::DataRate | Metric::Latency | Metric::PacketLoss)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Dbm,
    Db,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Dbm => f.write_str("dBm"),
            Unit::Db => f.write_str("dB"),
        }
    }
}

/// A single value read off a cell record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub label: &'static str,
    pub value: Number,
    pub unit: Option<Unit>,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.value)?;
        if let Some(unit) = self.unit {
            write!(f, " {unit}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricResult {
    Value(Reading),
    Unavailable,
}

impl MetricResult {
    pub fn value(&self) -> Option<Number> {
        match self {
            MetricResult::Value(reading) => Some(reading.value),
            MetricResult::Unavailable => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn list_order() {
        let names: Vec<String> = Metric::iter().map(|m| m.to_string()).collect();
        assert_eq!(
            names,
            [
                "RSRP",
                "RSRQ",
                "SINR",
                "EC/IO",
                "Cell ID (CID)",
                "Location Area Code (LAC)",
                "Timing Advance (TA)",
                "Signal Strength",
                "Data Rate",
                "Latency",
                "Packet Loss",
            ]
        );
    }

    #[test]
    fn parse_names_and_ids() {
        for metric in Metric::iter() {
            assert_eq!(metric.id().parse::<Metric>().unwrap(), metric);
            assert_eq!(metric.to_string().parse::<Metric>().unwrap(), metric);
        }
        assert_eq!("Packet loss".parse::<Metric>().unwrap(), Metric::PacketLoss);
        assert_eq!("EC/IO".parse::<Metric>().unwrap(), Metric::EcIo);
        assert!("throughput".parse::<Metric>().is_err());
    }

    #[test]
    fn reading_display() {
        let reading = Reading {
            label: "RSRP (5G)",
            value: Number::Real(-97.0),
            unit: Some(Unit::Dbm),
        };
        assert_eq!(reading.to_string(), "RSRP (5G): -97 dBm");

        let reading = Reading {
            label: "Cell ID",
            value: Number::Int(1234),
            unit: None,
        };
        assert_eq!(reading.to_string(), "Cell ID: 1234");
    }
}
