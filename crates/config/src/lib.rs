// RS485 Bridge - USB/RS485 Serial Bridge Firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use rs485_bridge_core::{BridgeConfig, EndpointId};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default schema version for YAML configs
fn default_schema_version() -> String {
    "1.0".to_string()
}

fn check_schema_version(kind: &str, version: &str) -> Result<()> {
    if version != "1.0" {
        anyhow::bail!(
            "Unsupported {} schema_version '{}'. Supported versions: '1.0'",
            kind,
            version
        );
    }
    Ok(())
}

/// Misbehaviour injected into the simulated board.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FaultConfig {
    /// UARTs whose `configure` call fails at boot.
    #[serde(default)]
    pub reject_configure: Vec<EndpointId>,
    /// UARTs whose transmitter never drains, so every transmit times out.
    #[serde(default)]
    pub stall_transmit: Vec<EndpointId>,
}

impl FaultConfig {
    pub fn rejects_configure(&self, id: EndpointId) -> bool {
        self.reject_configure.contains(&id)
    }

    pub fn stalls_transmit(&self, id: EndpointId) -> bool {
        self.stall_transmit.contains(&id)
    }
}

/// A bridge board: timing/line settings plus optional injected faults.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BoardProfile {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub name: String,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub faults: FaultConfig,
}

impl BoardProfile {
    /// The shipped board: reference timings, no faults.
    pub fn reference() -> Self {
        Self {
            schema_version: default_schema_version(),
            name: "stm32f103-rs485-bridge".to_string(),
            bridge: BridgeConfig::REFERENCE,
            faults: FaultConfig::default(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read board profile at {:?}", path.as_ref()))?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let profile: Self =
            serde_yaml::from_str(yaml).context("Failed to parse Board Profile YAML")?;
        profile.validate()?;
        tracing::debug!("Loaded board profile '{}'", profile.name);
        Ok(profile)
    }

    pub fn validate(&self) -> Result<()> {
        check_schema_version("board profile", &self.schema_version)?;

        if self.name.trim().is_empty() {
            anyhow::bail!("Board profile 'name' cannot be empty");
        }

        let bridge = &self.bridge;
        if bridge.serial.baud == 0 {
            anyhow::bail!("'bridge.serial.baud' must be greater than zero");
        }
        if bridge.transmit_timeout_ms == 0 {
            anyhow::bail!("'bridge.transmit_timeout_ms' must be greater than zero");
        }
        if bridge.heartbeat_period_ms == 0 {
            anyhow::bail!("'bridge.heartbeat_period_ms' must be greater than zero");
        }
        if bridge.fatal_blink_ms == 0 {
            anyhow::bail!("'bridge.fatal_blink_ms' must be greater than zero");
        }

        Ok(())
    }
}

/// Bytes of one stimulus: a literal string or a list of byte values.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Payload {
    Text(String),
    Bytes(Vec<u8>),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(s) => s.as_bytes(),
            Payload::Bytes(b) => b,
        }
    }
}

/// Bytes arriving on one endpoint's line, starting at `at_ms`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Stimulus {
    pub at_ms: u32,
    pub endpoint: EndpointId,
    pub bytes: Payload,
    /// Start-to-start spacing between bytes. Defaults to back-to-back
    /// characters at the line's baud rate.
    #[serde(default)]
    pub gap_us: Option<u32>,
}

/// Timed input for one simulator run.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StimulusScript {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub run_ms: u32,
    #[serde(default)]
    pub stimuli: Vec<Stimulus>,
}

impl StimulusScript {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read stimulus script at {:?}", path.as_ref()))?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let script: Self =
            serde_yaml::from_str(yaml).context("Failed to parse Stimulus Script YAML")?;
        script.validate()?;
        Ok(script)
    }

    pub fn validate(&self) -> Result<()> {
        check_schema_version("stimulus script", &self.schema_version)?;

        if self.run_ms == 0 {
            anyhow::bail!("'run_ms' must be greater than zero");
        }

        for (idx, stimulus) in self.stimuli.iter().enumerate() {
            if stimulus.bytes.as_bytes().is_empty() {
                anyhow::bail!("Stimulus #{} carries no bytes", idx);
            }
            if stimulus.at_ms >= self.run_ms {
                anyhow::bail!(
                    "Stimulus #{} starts at {} ms, outside the {} ms run",
                    idx,
                    stimulus.at_ms,
                    self.run_ms
                );
            }
            if stimulus.gap_us == Some(0) {
                anyhow::bail!("Stimulus #{} has a zero 'gap_us'", idx);
            }
        }

        Ok(())
    }

    /// All bytes the script sends into `endpoint`, in order.
    pub fn bytes_for(&self, endpoint: EndpointId) -> Vec<u8> {
        let mut stimuli: Vec<&Stimulus> = self
            .stimuli
            .iter()
            .filter(|s| s.endpoint == endpoint)
            .collect();
        stimuli.sort_by_key(|s| s.at_ms);
        stimuli
            .into_iter()
            .flat_map(|s| s.bytes.as_bytes().iter().copied())
            .collect()
    }
}
