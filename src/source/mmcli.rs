//! Cell records from ModemManager, queried through `mmcli`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use tokio::process::Command;
use tracing::{debug, warn};

use super::RecordSource;
use crate::model::{CellRadio, CellRecord, GsmCell, LteCell, NrCell, WcdmaCell};

#[derive(Debug, Clone)]
pub struct MmcliSource {
    modem: String,
}

impl MmcliSource {
    /// `modem` is anything `mmcli -m` accepts, e.g. `any` or an index.
    pub fn new(modem: impl Into<String>) -> Self {
        Self {
            modem: modem.into(),
        }
    }
}

#[async_trait]
impl RecordSource for MmcliSource {
    async fn cell_records(&self) -> Result<Vec<CellRecord>> {
        let modem = self.modem.as_str();

        let signal = run_cmd("mmcli", &["-m", modem, "--signal-get", "-J"]).await?;

        let location = run_cmd("mmcli", &["-m", modem, "--location-get", "-J"])
            .await
            .inspect_err(|e| warn!(error = ?e, "mmcli location unavailable"))
            .ok();

        let serving = run_cmd("mmcli", &["-m", modem, "-J"])
            .await
            .inspect_err(|e| warn!(error = ?e, "mmcli modem info unavailable"))
            .ok()
            .and_then(|info| serving_radio(&info));

        let records = build_records(&signal, location.as_deref(), serving)?;
        debug!(count = records.len(), ?serving, "mmcli cell records");
        Ok(records)
    }
}

async fn run_cmd(cmd: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(cmd).args(args).output().await?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let err = String::from_utf8_lossy(&output.stderr);
        let args = args.join(" ");
        Err(anyhow!("Failed to run {cmd} {args}. Error {err}"))
    }
}

#[derive(Debug, Deserialize)]
struct SignalRoot {
    modem: SignalModem,
}

#[derive(Debug, Deserialize)]
struct SignalModem {
    signal: SignalData,
}

/// Blocks mmcli reports per access technology. CDMA blocks are ignored.
#[derive(Debug, Default, Deserialize)]
struct SignalData {
    #[serde(rename = "5g")]
    nr5g: Option<SignalBlock>,
    lte: Option<SignalBlock>,
    umts: Option<SignalBlock>,
    gsm: Option<SignalBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct SignalBlock {
    #[serde(default, deserialize_with = "de_mmcli_f64")]
    rsrp: Option<f64>,
    #[serde(default, deserialize_with = "de_mmcli_f64")]
    rsrq: Option<f64>,
    #[serde(default, deserialize_with = "de_mmcli_f64")]
    rssi: Option<f64>,
    #[serde(default, deserialize_with = "de_mmcli_f64")]
    rscp: Option<f64>,
    #[serde(default, deserialize_with = "de_mmcli_f64")]
    ecio: Option<f64>,
    #[serde(default, deserialize_with = "de_mmcli_f64")]
    snr: Option<f64>,
}

/// mmcli prints `--` for values it does not have.
fn de_mmcli_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<&str> = Option::deserialize(deserializer)?;
    match s {
        Some("--") | None => Ok(None),
        Some(val) => val
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// 3GPP location of the serving cell.
#[derive(Debug, Default, PartialEq)]
struct ServingLocation {
    cid: Option<i64>,
    lac: Option<i64>,
    tac: Option<i64>,
}

fn parse_location(raw: &str) -> Result<ServingLocation> {
    let json: serde_json::Value = serde_json::from_str(raw)?;
    let gpp = &json["modem"]["location"]["3gpp"];

    // hex encoded, `--` when unknown
    let hex = |key: &str| {
        gpp[key]
            .as_str()
            .and_then(|s| i64::from_str_radix(s.trim(), 16).ok())
    };

    Ok(ServingLocation {
        cid: hex("cid"),
        lac: hex("lac"),
        tac: hex("tac"),
    })
}

fn serving_radio(raw: &str) -> Option<CellRadio> {
    let json: serde_json::Value = serde_json::from_str(raw).ok()?;
    let tech = json["modem"]["generic"]["access-technologies"]
        .as_array()?
        .first()?
        .as_str()?;
    radio_from_tech(tech)
}

fn radio_from_tech(tech: &str) -> Option<CellRadio> {
    match tech.trim().to_ascii_lowercase().as_str() {
        "gsm" | "gprs" | "edge" => Some(CellRadio::Gsm),
        "umts" | "hsdpa" | "hsupa" | "hspa" | "hspa+" => Some(CellRadio::Wcdma),
        "lte" => Some(CellRadio::Lte),
        "5g" | "5gnr" | "5g-nsa" | "nr5g" | "nr5g-nsa" | "nr5g-sa" => Some(CellRadio::Nr),
        _ => None,
    }
}

fn has_values(block: &SignalBlock) -> bool {
    [
        block.rsrp,
        block.rsrq,
        block.rssi,
        block.rscp,
        block.ecio,
        block.snr,
    ]
    .iter()
    .any(Option::is_some)
}

fn to_record(radio: CellRadio, block: &SignalBlock) -> CellRecord {
    match radio {
        CellRadio::Lte => CellRecord::Lte(LteCell {
            dbm: block.rsrp,
            rsrp: block.rsrp,
            rsrq: block.rsrq,
            rssnr: block.snr,
            ..Default::default()
        }),
        CellRadio::Nr => CellRecord::Nr(NrCell { dbm: block.rsrp }),
        CellRadio::Wcdma => CellRecord::Wcdma(WcdmaCell {
            dbm: block.rscp.or(block.rssi),
            ec_no: block.ecio,
            ..Default::default()
        }),
        CellRadio::Gsm => CellRecord::Gsm(GsmCell {
            dbm: block.rssi,
            ..Default::default()
        }),
    }
}

fn attach_location(record: &mut CellRecord, location: &ServingLocation) {
    match record {
        CellRecord::Lte(c) => {
            c.ci = location.cid;
            c.tac = location.tac;
        }
        CellRecord::Wcdma(c) => {
            c.cid = location.cid;
            c.lac = location.lac;
        }
        CellRecord::Gsm(c) => {
            c.cid = location.cid;
            c.lac = location.lac;
        }
        CellRecord::Nr(_) => {}
    }
}

/// Serving cell first, then the remaining blocks in the order 5g, lte, umts,
/// gsm. Only the serving cell carries location fields.
fn build_records(
    signal: &str,
    location: Option<&str>,
    serving: Option<CellRadio>,
) -> Result<Vec<CellRecord>> {
    let root: SignalRoot = serde_json::from_str(signal)?;
    let data = root.modem.signal;

    let blocks = [
        (CellRadio::Nr, data.nr5g),
        (CellRadio::Lte, data.lte),
        (CellRadio::Wcdma, data.umts),
        (CellRadio::Gsm, data.gsm),
    ];

    let mut records = Vec::new();

    if let Some(radio) = serving {
        let empty = SignalBlock::default();
        let block = blocks
            .iter()
            .find(|(r, _)| *r == radio)
            .and_then(|(_, b)| b.as_ref())
            .unwrap_or(&empty);

        let mut record = to_record(radio, block);
        if let Some(raw) = location {
            match parse_location(raw) {
                Ok(location) => attach_location(&mut record, &location),
                Err(e) => warn!(error = ?e, "could not parse mmcli location"),
            }
        }
        records.push(record);
    }

    for (radio, block) in &blocks {
        if Some(*radio) == serving {
            continue;
        }
        if let Some(block) = block.as_ref().filter(|b| has_values(b)) {
            records.push(to_record(*radio, block));
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNAL: &str = r#"{"modem":{"signal":{"5g":{"error-rate":"--","rsrp":"-101.00","rsrq":"--","snr":"--"},"cdma1x":{"ecio":"--","error-rate":"--","rssi":"--"},"evdo":{"ecio":"--","error-rate":"--","io":"--","rssi":"--","sinr":"--"},"gsm":{"error-rate":"--","rssi":"--"},"lte":{"error-rate":"--","rsrp":"-112.00","rsrq":"-17.00","rssi":"-74.00","snr":"-2.00"},"refresh":{"rate":"10"},"threshold":{"error-rate":"no","rssi":"0"},"umts":{"ecio":"-9.50","error-rate":"--","rscp":"-95.00","rssi":"--"}}}}"#;

    const LOCATION: &str = r#"{"modem":{"location":{"3gpp":{"cid":"0197763E","lac":"0000","mcc":"262","mnc":"03","tac":"00C945"},"cdma-bs":{"latitude":"--","longitude":"--"},"gps":{"altitude":"--","latitude":"--","longitude":"--","nmea":[],"utc":"--"}}}}"#;

    #[test]
    fn serving_cell_first() {
        let records = build_records(SIGNAL, Some(LOCATION), Some(CellRadio::Lte)).unwrap();

        assert_eq!(
            records,
            vec![
                CellRecord::Lte(LteCell {
                    dbm: Some(-112.0),
                    rsrp: Some(-112.0),
                    rsrq: Some(-17.0),
                    rssnr: Some(-2.0),
                    ci: Some(0x0197_763E),
                    tac: Some(0xC945),
                    timing_advance: None,
                }),
                CellRecord::Nr(NrCell {
                    dbm: Some(-101.0)
                }),
                CellRecord::Wcdma(WcdmaCell {
                    dbm: Some(-95.0),
                    ec_no: Some(-9.5),
                    cid: None,
                    lac: None,
                }),
            ]
        );
    }

    #[test]
    fn no_serving_radio() {
        let records = build_records(SIGNAL, Some(LOCATION), None).unwrap();
        let radios: Vec<_> = records.iter().map(CellRecord::radio).collect();
        assert_eq!(radios, [CellRadio::Nr, CellRadio::Lte, CellRadio::Wcdma]);
    }

    #[test]
    fn serving_without_signal_keeps_location() {
        let records = build_records(SIGNAL, Some(LOCATION), Some(CellRadio::Gsm)).unwrap();
        assert_eq!(
            records[0],
            CellRecord::Gsm(GsmCell {
                dbm: None,
                cid: Some(0x0197_763E),
                lac: Some(0),
                timing_advance: None,
            })
        );
    }

    #[test]
    fn bad_location_is_ignored() {
        let records = build_records(SIGNAL, Some("not json"), Some(CellRadio::Lte)).unwrap();
        assert_eq!(records[0].radio(), CellRadio::Lte);
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn bad_signal_is_an_error() {
        assert!(build_records("{}", None, None).is_err());
    }

    #[test]
    fn parses_serving_radio() {
        let info = r#"{"modem":{"generic":{"access-technologies":["lte"],"state":"connected"}}}"#;
        assert_eq!(serving_radio(info), Some(CellRadio::Lte));
        assert_eq!(serving_radio(r#"{"modem":{}}"#), None);

        assert_eq!(radio_from_tech("HSPA+"), Some(CellRadio::Wcdma));
        assert_eq!(radio_from_tech("edge"), Some(CellRadio::Gsm));
        assert_eq!(radio_from_tech("5gnr"), Some(CellRadio::Nr));
        assert_eq!(radio_from_tech("cdma1x"), None);
    }

    #[test]
    fn parses_location() {
        let location = parse_location(LOCATION).unwrap();
        assert_eq!(
            location,
            ServingLocation {
                cid: Some(0x0197_763E),
                lac: Some(0),
                tac: Some(0xC945),
            }
        );
    }
}
