use std::fmt;

use serde::{Deserialize, Deserializer};

/// Radio access technology of an observed cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellRadio {
    Gsm,
    #[serde(alias = "umts")]
    Wcdma,
    Lte,
    Nr,
}

/// One observed cell as reported by the record source. Records are fresh on
/// every query and never retained.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "radioType", rename_all = "lowercase")]
pub enum CellRecord {
    Lte(LteCell),
    Nr(NrCell),
    #[serde(alias = "umts")]
    Wcdma(WcdmaCell),
    Gsm(GsmCell),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LteCell {
    #[serde(default, deserialize_with = "de_reported_f64")]
    pub dbm: Option<f64>,
    #[serde(default, deserialize_with = "de_reported_f64")]
    pub rsrp: Option<f64>,
    #[serde(default, deserialize_with = "de_reported_f64")]
    pub rsrq: Option<f64>,
    #[serde(default, deserialize_with = "de_reported_f64")]
    pub rssnr: Option<f64>,
    #[serde(default, deserialize_with = "de_reported_i64", rename = "cellId")]
    pub ci: Option<i64>,
    #[serde(default, deserialize_with = "de_reported_i64", rename = "trackingAreaCode")]
    pub tac: Option<i64>,
    #[serde(default, deserialize_with = "de_reported_i64")]
    pub timing_advance: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NrCell {
    #[serde(default, deserialize_with = "de_reported_f64")]
    pub dbm: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WcdmaCell {
    #[serde(default, deserialize_with = "de_reported_f64")]
    pub dbm: Option<f64>,
    #[serde(default, deserialize_with = "de_reported_f64")]
    pub ec_no: Option<f64>,
    #[serde(default, deserialize_with = "de_reported_i64", rename = "cellId")]
    pub cid: Option<i64>,
    #[serde(default, deserialize_with = "de_reported_i64", rename = "locationAreaCode")]
    pub lac: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GsmCell {
    #[serde(default, deserialize_with = "de_reported_f64")]
    pub dbm: Option<f64>,
    #[serde(default, deserialize_with = "de_reported_i64", rename = "cellId")]
    pub cid: Option<i64>,
    #[serde(default, deserialize_with = "de_reported_i64", rename = "locationAreaCode")]
    pub lac: Option<i64>,
    #[serde(default, deserialize_with = "de_reported_i64")]
    pub timing_advance: Option<i64>,
}

/// Android reports fields it cannot measure as `CellInfo.UNAVAILABLE`.
pub const UNAVAILABLE: i64 = i32::MAX as i64;

fn de_reported_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<f64> = Option::deserialize(deserializer)?;
    Ok(value.filter(|v| *v != UNAVAILABLE as f64))
}

fn de_reported_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<i64> = Option::deserialize(deserializer)?;
    Ok(value.filter(|v| *v != UNAVAILABLE))
}

/// A field that may be addressable on a cell record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Generic signal power.
    Dbm,
    Rsrp,
    Rsrq,
    Rssnr,
    EcNo,
    CellId,
    /// Location area code, or tracking area code on LTE.
    AreaCode,
    TimingAdvance,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Real(f64),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(x) => write!(f, "{x}"),
            // f64's Display already drops a trailing `.0`
            Number::Real(x) => write!(f, "{x}"),
        }
    }
}

impl CellRecord {
    pub fn radio(&self) -> CellRadio {
        match self {
            CellRecord::Lte(_) => CellRadio::Lte,
            CellRecord::Nr(_) => CellRadio::Nr,
            CellRecord::Wcdma(_) => CellRadio::Wcdma,
            CellRecord::Gsm(_) => CellRadio::Gsm,
        }
    }

    /// Returns `None` both when the variant has no such field and when the
    /// platform did not report it.
    pub fn get(&self, field: Field) -> Option<Number> {
        let real = |x: Option<f64>| x.map(Number::Real);
        let int = |x: Option<i64>| x.map(Number::Int);

        match (self, field) {
            (CellRecord::Lte(c), Field::Dbm) => real(c.dbm),
            (CellRecord::Lte(c), Field::Rsrp) => real(c.rsrp),
            (CellRecord::Lte(c), Field::Rsrq) => real(c.rsrq),
            (CellRecord::Lte(c), Field::Rssnr) => real(c.rssnr),
            (CellRecord::Lte(c), Field::CellId) => int(c.ci),
            (CellRecord::Lte(c), Field::AreaCode) => int(c.tac),
            (CellRecord::Lte(c), Field::TimingAdvance) => int(c.timing_advance),

            (CellRecord::Nr(c), Field::Dbm) => real(c.dbm),

            (CellRecord::Wcdma(c), Field::Dbm) => real(c.dbm),
            (CellRecord::Wcdma(c), Field::EcNo) => real(c.ec_no),
            (CellRecord::Wcdma(c), Field::CellId) => int(c.cid),
            (CellRecord::Wcdma(c), Field::AreaCode) => int(c.lac),

            (CellRecord::Gsm(c), Field::Dbm) => real(c.dbm),
            (CellRecord::Gsm(c), Field::CellId) => int(c.cid),
            (CellRecord::Gsm(c), Field::AreaCode) => int(c.lac),
            (CellRecord::Gsm(c), Field::TimingAdvance) => int(c.timing_advance),

            _ => None,
        }
    }
}
