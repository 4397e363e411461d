use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::permission::Grants;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    #[serde(default)]
    pub permissions: Grants,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
}

fn default_http_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Cell records recorded to a JSON file
    Snapshot { path: PathBuf },
    /// Cell records queried from ModemManager
    Mmcli {
        #[serde(default = "default_modem")]
        modem: String,
    },
}

fn default_modem() -> String {
    "any".to_owned()
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Mmcli {
            modem: default_modem(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Host used for latency and packet loss
    pub target: String,
    /// TCP port the reachability probe connects to
    pub port: u16,
    pub speedtest_host: String,
    pub speedtest_port: u16,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            target: "8.8.8.8".to_owned(),
            port: 7,
            speedtest_host: "speedtest.wdc01.softlayer.com".to_owned(),
            speedtest_port: 80,
        }
    }
}

pub fn load(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path).context("Failed to read config")?;
    parse(&data)
}

pub fn parse(data: &str) -> Result<Config> {
    let config = toml::from_str(data).context("Failed to parse config")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.http_port, 8080);
        assert!(!config.permissions.read_phone_state);
        assert!(matches!(config.source, SourceConfig::Mmcli { ref modem } if modem == "any"));
        assert_eq!(config.probe.target, "8.8.8.8");
        assert_eq!(config.probe.port, 7);
        assert_eq!(config.probe.speedtest_port, 80);
    }

    #[test]
    fn full() {
        let config = parse(
            r#"
            http_port = 9000

            [permissions]
            read_phone_state = true
            coarse_location = true

            [source]
            kind = "snapshot"
            path = "cells.json"

            [probe]
            target = "1.1.1.1"
            port = 443
            "#,
        )
        .unwrap();

        assert_eq!(config.http_port, 9000);
        assert!(config.permissions.coarse_location);
        assert!(!config.permissions.fine_location);
        assert!(
            matches!(config.source, SourceConfig::Snapshot { ref path } if path == Path::new("cells.json"))
        );
        assert_eq!(config.probe.target, "1.1.1.1");
        assert_eq!(config.probe.port, 443);
        assert_eq!(config.probe.speedtest_host, "speedtest.wdc01.softlayer.com");
    }

    #[test]
    fn unknown_source_kind() {
        assert!(parse("[source]\nkind = \"bluetooth\"").is_err());
    }
}
