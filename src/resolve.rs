//! Table-driven resolution of cell metrics.
//!
//! Every cell metric is described by an ordered list of rules. Records are
//! scanned in the order the source returned them and the first record whose
//! radio has a rule decides the result, even if a later record would carry a
//! stronger or more complete value.

use crate::{
    metric::{Metric, MetricResult, Reading, Unit},
    model::{
        CellRadio::{self, Gsm, Lte, Nr, Wcdma},
        CellRecord, Field,
    },
};

#[derive(Debug, Clone, Copy)]
struct Rule {
    radio: CellRadio,
    field: Field,
    label: &'static str,
    unit: Option<Unit>,
}

const fn rule(radio: CellRadio, field: Field, label: &'static str, unit: Option<Unit>) -> Rule {
    Rule {
        radio,
        field,
        label,
        unit,
    }
}

const DBM: Option<Unit> = Some(Unit::Dbm);
const DB: Option<Unit> = Some(Unit::Db);

const RSRP: &[Rule] = &[
    rule(Lte, Field::Rsrp, "RSRP", DBM),
    rule(Nr, Field::Dbm, "RSRP (5G)", DBM),
];

const RSRQ: &[Rule] = &[
    rule(Lte, Field::Rsrq, "RSRQ", DB),
    rule(Nr, Field::Dbm, "Signal Quality", DB),
    rule(Wcdma, Field::Dbm, "Signal Quality", DB),
    rule(Gsm, Field::Dbm, "Signal Quality", DB),
];

const SINR: &[Rule] = &[
    rule(Lte, Field::Rssnr, "SINR", DB),
    rule(Nr, Field::Dbm, "Signal Quality", DB),
    rule(Wcdma, Field::Dbm, "Signal Quality", DB),
    rule(Gsm, Field::Dbm, "Signal Quality", DB),
];

const ECIO: &[Rule] = &[rule(Wcdma, Field::EcNo, "EC/IO", DB)];

const CELL_ID: &[Rule] = &[
    rule(Lte, Field::CellId, "Cell ID", None),
    rule(Wcdma, Field::CellId, "Cell ID", None),
    rule(Gsm, Field::CellId, "Cell ID", None),
];

const LAC: &[Rule] = &[
    rule(Lte, Field::AreaCode, "Location Area Code", None),
    rule(Wcdma, Field::AreaCode, "Location Area Code", None),
    rule(Gsm, Field::AreaCode, "Location Area Code", None),
];

const TIMING_ADVANCE: &[Rule] = &[
    rule(Lte, Field::TimingAdvance, "Timing Advance", None),
    rule(Gsm, Field::TimingAdvance, "Timing Advance", None),
];

const SIGNAL_STRENGTH: &[Rule] = &[
    rule(Lte, Field::Dbm, "Signal Strength", DBM),
    rule(Nr, Field::Dbm, "Signal Strength", DBM),
    rule(Wcdma, Field::Dbm, "Signal Strength", DBM),
    rule(Gsm, Field::Dbm, "Signal Strength", DBM),
];

fn rules(metric: Metric) -> &'static [Rule] {
    match metric {
        Metric::Rsrp => RSRP,
        Metric::Rsrq => RSRQ,
        Metric::Sinr => SINR,
        Metric::EcIo => ECIO,
        Metric::CellId => CELL_ID,
        Metric::Lac => LAC,
        Metric::TimingAdvance => TIMING_ADVANCE,
        Metric::SignalStrength => SIGNAL_STRENGTH,
        Metric::DataRate | Metric::Latency | Metric::PacketLoss => &[],
    }
}

/// Resolves `metric` against `records`.
///
/// The first record with a matching radio ends the scan. If that record did
/// not report the field, the metric is unavailable.
pub fn resolve(metric: Metric, records: &[CellRecord]) -> MetricResult {
    let rules = rules(metric);

    let matched = records.iter().find_map(|record| {
        let radio = record.radio();
        rules
            .iter()
            .find(|rule| rule.radio == radio)
            .map(|rule| (record, rule))
    });

    let Some((record, rule)) = matched else {
        return MetricResult::Unavailable;
    };

    match record.get(rule.field) {
        Some(value) => MetricResult::Value(Reading {
            label: rule.label,
            value,
            unit: rule.unit,
        }),
        None => MetricResult::Unavailable,
    }
}
