/*
Topology input: the structured record behind a `.pon` file.

The simulator's only read contract here is "give me the ONU ids, the OLT-ONU
link distances, and the simulation parameters". Key aliases cover both field
spellings found in the wild (`devices` / `devices_data`, `device_a` /
`device_a_id`).
*/

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use log::warn;
use serde::Deserialize;

use crate::dba::engine::DbaParams;
use crate::dba::messages::CycleTiming;
use crate::sim::traffic::ProfileTable;

pub const DEVICE_TYPE_OLT: &str = "OLT";
pub const DEVICE_TYPE_ONU: &str = "ONU";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Topology {
    #[serde(default, alias = "devices_data")]
    pub devices: BTreeMap<String, Device>,
    #[serde(default, alias = "connections_data")]
    pub connections: BTreeMap<String, Connection>,
    #[serde(default)]
    pub phy: CycleTiming,
    #[serde(default)]
    pub simulation: SimulationSection,
}

impl Topology {
    /// ONU device ids in id order.
    pub fn onu_ids(&self) -> Vec<String> {
        self.devices
            .iter()
            .filter(|(_, d)| d.device_type == DEVICE_TYPE_ONU)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn device_type(&self, id: &str) -> Option<&str> {
        self.devices.get(id).map(|d| d.device_type.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    #[serde(alias = "type")]
    pub device_type: String,
    #[serde(default)]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Point-to-point link between two devices. `distance` is in canvas pixels;
/// the phy layer converts it to meters via `scale_m_per_px`.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection {
    #[serde(alias = "device_a")]
    pub device_a_id: String,
    #[serde(alias = "device_b")]
    pub device_b_id: String,
    #[serde(default)]
    pub distance: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    pub algorithm: String,
    pub algo_params: DbaParams,
    pub cycles: u64,
    pub seed: u64,
    pub traffic_profiles: ProfileTable,
}

impl Default for SimulationSection {
    fn default() -> Self {
        let mut algo_params = DbaParams::new();
        algo_params.insert("MAX_GRANT_BYTES".to_string(), 12_000);
        Self {
            algorithm: "ipact".to_string(),
            algo_params,
            cycles: 1,
            seed: 1234,
            traffic_profiles: ProfileTable::new(),
        }
    }
}

/// Load a `.pon` topology. If `<path>.profiles.json` exists next to it and
/// holds a non-empty profile table, it replaces the inline traffic profiles.
pub fn load_topology(path: &Path) -> anyhow::Result<Topology> {
    let payload = fs::read_to_string(path)
        .with_context(|| format!("failed to read topology file {}", path.display()))?;
    let mut topology: Topology = serde_json::from_str(&payload)
        .with_context(|| format!("cannot parse topology {}", path.display()))?;

    let sidecar = sidecar_path(path);
    if sidecar.exists() {
        match fs::read_to_string(&sidecar)
            .map_err(anyhow::Error::from)
            .and_then(|s| serde_json::from_str::<ProfileTable>(&s).map_err(anyhow::Error::from))
        {
            Ok(profiles) if !profiles.is_empty() => {
                topology.simulation.traffic_profiles = profiles;
            }
            Ok(_) => {}
            Err(err) => warn!(
                "ignoring unreadable profile sidecar {}: {}",
                sidecar.display(),
                err
            ),
        }
    }
    Ok(topology)
}

fn sidecar_path(path: &Path) -> std::path::PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".profiles.json");
    std::path::PathBuf::from(name)
}
