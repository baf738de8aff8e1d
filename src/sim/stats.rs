/*
Statistics recorder.

Four in-cycle accumulators feed five run-scoped row streams: grants, per-ONU
counters, per-cycle aggregates, per-packet delays, and per-(ONU, class) delay
aggregates. Rows of a closed cycle are never mutated again; downstream
analytics depend on the exact column names and units (nanoseconds, raw byte
counts, 0..1 fractions).
*/

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::dba::messages::{bytes_to_ns, Nanos, ServiceClass};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantRow {
    pub cycle: u64,
    pub algorithm: String,
    pub onu_id: String,
    /// Bytes actually drained, not the declared grant size.
    pub grant_bytes: u64,
    pub start_ns: u64,
    pub end_ns: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnuRow {
    pub cycle: u64,
    pub algorithm: String,
    pub onu_id: String,
    pub offered_bytes: u64,
    pub served_bytes: u64,
    pub backlog_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRow {
    pub cycle: u64,
    pub algorithm: String,
    /// Transmission time over total slot time including guard, 0..1.
    pub utilization: f64,
    /// Jain index over per-ONU served bytes, 0..1.
    pub fairness_jain: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketRow {
    pub cycle: u64,
    pub algorithm: String,
    pub onu_id: String,
    pub cls: ServiceClass,
    pub size_bytes: u64,
    pub arrival_ns: u64,
    pub start_ns: u64,
    pub end_ns: u64,
    pub queue_delay_ns: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayAggRow {
    pub cycle: u64,
    pub algorithm: String,
    pub onu_id: String,
    pub cls: ServiceClass,
    pub n_packets: u64,
    pub mean_delay_ns: f64,
    pub std_delay_ns: f64,
    pub p95_delay_ns: f64,
}

/// All five streams in one serializable object, the JSON export payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsBundle {
    pub grants: Vec<GrantRow>,
    pub per_onu: Vec<OnuRow>,
    pub per_cycle: Vec<CycleRow>,
    pub packets: Vec<PacketRow>,
    pub delay_agg: Vec<DelayAggRow>,
}

#[derive(Debug, Default, Clone, Copy)]
struct OnuAccum {
    offered: u64,
    served: u64,
    backlog: u64,
}

pub struct StatsRecorder {
    algorithm: String,
    line_rate_bps: u64,
    cycle_idx: u64,

    grants: Vec<GrantRow>,
    per_onu_rows: Vec<OnuRow>,
    per_cycle_rows: Vec<CycleRow>,
    packet_rows: Vec<PacketRow>,
    delay_agg_rows: Vec<DelayAggRow>,

    onu_order: Vec<String>,
    per_onu_tmp: BTreeMap<String, OnuAccum>,
    tx_ns_sum: u64,
    dur_ns_sum: u64,
    delay_map: BTreeMap<(String, ServiceClass), Vec<u64>>,
}

impl StatsRecorder {
    pub fn new(algorithm: &str, line_rate_bps: u64) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            line_rate_bps,
            cycle_idx: 0,
            grants: Vec::new(),
            per_onu_rows: Vec::new(),
            per_cycle_rows: Vec::new(),
            packet_rows: Vec::new(),
            delay_agg_rows: Vec::new(),
            onu_order: Vec::new(),
            per_onu_tmp: BTreeMap::new(),
            tx_ns_sum: 0,
            dur_ns_sum: 0,
            delay_map: BTreeMap::new(),
        }
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn begin_cycle(&mut self, cycle_idx: u64, onu_ids: &[String]) {
        self.cycle_idx = cycle_idx;
        self.onu_order = onu_ids.to_vec();
        self.per_onu_tmp = onu_ids
            .iter()
            .map(|onu| (onu.clone(), OnuAccum::default()))
            .collect();
        self.tx_ns_sum = 0;
        self.dur_ns_sum = 0;
        self.delay_map = onu_ids
            .iter()
            .flat_map(|onu| {
                ServiceClass::ALL
                    .iter()
                    .map(move |cls| ((onu.clone(), *cls), Vec::new()))
            })
            .collect();
    }

    pub fn record_offered(&mut self, onu_id: &str, inc_bytes: u64) {
        if let Some(accum) = self.per_onu_tmp.get_mut(onu_id) {
            accum.offered += inc_bytes;
        }
    }

    /// `size_bytes` is the actually-served size; `dur_ns` already includes
    /// the guard interval.
    pub fn record_grant(&mut self, onu_id: &str, size_bytes: u64, start_ns: Nanos, dur_ns: Nanos) {
        let end_ns = start_ns + dur_ns;
        self.grants.push(GrantRow {
            cycle: self.cycle_idx,
            algorithm: self.algorithm.clone(),
            onu_id: onu_id.to_string(),
            grant_bytes: size_bytes,
            start_ns,
            end_ns,
        });
        if let Some(accum) = self.per_onu_tmp.get_mut(onu_id) {
            accum.served += size_bytes;
        }
        self.tx_ns_sum += bytes_to_ns(size_bytes, self.line_rate_bps);
        self.dur_ns_sum += dur_ns;
    }

    pub fn record_packet(
        &mut self,
        onu_id: &str,
        cls: ServiceClass,
        size_bytes: u64,
        arrival_ns: Nanos,
        start_ns: Nanos,
        end_ns: Nanos,
    ) {
        // slots never start before the packet arrived
        let queue_delay_ns = start_ns - arrival_ns;
        self.packet_rows.push(PacketRow {
            cycle: self.cycle_idx,
            algorithm: self.algorithm.clone(),
            onu_id: onu_id.to_string(),
            cls,
            size_bytes,
            arrival_ns,
            start_ns,
            end_ns,
            queue_delay_ns,
        });
        self.delay_map
            .entry((onu_id.to_string(), cls))
            .or_default()
            .push(queue_delay_ns);
    }

    pub fn set_backlog(&mut self, onu_id: &str, backlog_bytes: u64) {
        if let Some(accum) = self.per_onu_tmp.get_mut(onu_id) {
            accum.backlog = backlog_bytes;
        }
    }

    pub fn end_cycle(&mut self) {
        for onu_id in &self.onu_order {
            let accum = self.per_onu_tmp[onu_id];
            self.per_onu_rows.push(OnuRow {
                cycle: self.cycle_idx,
                algorithm: self.algorithm.clone(),
                onu_id: onu_id.clone(),
                offered_bytes: accum.offered,
                served_bytes: accum.served,
                backlog_bytes: accum.backlog,
            });
        }

        let utilization = if self.dur_ns_sum > 0 {
            self.tx_ns_sum as f64 / self.dur_ns_sum as f64
        } else {
            0.0
        };
        let served: Vec<u64> = self
            .onu_order
            .iter()
            .map(|onu| self.per_onu_tmp[onu].served)
            .collect();
        self.per_cycle_rows.push(CycleRow {
            cycle: self.cycle_idx,
            algorithm: self.algorithm.clone(),
            utilization,
            fairness_jain: jain_fairness(&served),
        });

        let delay_map = std::mem::take(&mut self.delay_map);
        for ((onu_id, cls), mut samples) in delay_map {
            let row = if samples.is_empty() {
                DelayAggRow {
                    cycle: self.cycle_idx,
                    algorithm: self.algorithm.clone(),
                    onu_id,
                    cls,
                    n_packets: 0,
                    mean_delay_ns: 0.0,
                    std_delay_ns: 0.0,
                    p95_delay_ns: 0.0,
                }
            } else {
                samples.sort_unstable();
                let n = samples.len();
                let mean = samples.iter().sum::<u64>() as f64 / n as f64;
                let std = if n > 1 {
                    let var = samples
                        .iter()
                        .map(|&d| {
                            let diff = d as f64 - mean;
                            diff * diff
                        })
                        .sum::<f64>()
                        / n as f64;
                    var.sqrt()
                } else {
                    0.0
                };
                let p95 = samples[(0.95 * (n - 1) as f64) as usize] as f64;
                DelayAggRow {
                    cycle: self.cycle_idx,
                    algorithm: self.algorithm.clone(),
                    onu_id,
                    cls,
                    n_packets: n as u64,
                    mean_delay_ns: mean,
                    std_delay_ns: std,
                    p95_delay_ns: p95,
                }
            };
            self.delay_agg_rows.push(row);
        }
    }

    pub fn grants(&self) -> &[GrantRow] {
        &self.grants
    }

    pub fn per_onu_rows(&self) -> &[OnuRow] {
        &self.per_onu_rows
    }

    pub fn per_cycle_rows(&self) -> &[CycleRow] {
        &self.per_cycle_rows
    }

    pub fn packet_rows(&self) -> &[PacketRow] {
        &self.packet_rows
    }

    pub fn delay_agg_rows(&self) -> &[DelayAggRow] {
        &self.delay_agg_rows
    }

    pub fn bundle(&self) -> StatsBundle {
        StatsBundle {
            grants: self.grants.clone(),
            per_onu: self.per_onu_rows.clone(),
            per_cycle: self.per_cycle_rows.clone(),
            packets: self.packet_rows.clone(),
            delay_agg: self.delay_agg_rows.clone(),
        }
    }

    /// Write the five CSV artifacts under `{out_prefix}_<stream>.csv` and
    /// return their paths.
    pub fn export_csv(&self, out_prefix: &str) -> anyhow::Result<Vec<PathBuf>> {
        ensure_parent_dir(Path::new(out_prefix))?;
        let paths = vec![
            write_csv(&format!("{}_grants.csv", out_prefix), &self.grants)?,
            write_csv(&format!("{}_per_onu.csv", out_prefix), &self.per_onu_rows)?,
            write_csv(&format!("{}_cycles.csv", out_prefix), &self.per_cycle_rows)?,
            write_csv(&format!("{}_packets.csv", out_prefix), &self.packet_rows)?,
            write_csv(
                &format!("{}_delay_agg.csv", out_prefix),
                &self.delay_agg_rows,
            )?,
        ];
        Ok(paths)
    }

    pub fn export_json(&self, out_path: &Path) -> anyhow::Result<()> {
        ensure_parent_dir(out_path)?;
        let payload = serde_json::to_string_pretty(&self.bundle())?;
        fs::write(out_path, payload)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
        Ok(())
    }
}

/// Jain fairness index over per-ONU served bytes. All-zero counts as
/// perfectly fair.
pub fn jain_fairness(served: &[u64]) -> f64 {
    let sum: u64 = served.iter().sum();
    if served.is_empty() || sum == 0 {
        return 1.0;
    }
    let num = (sum as f64) * (sum as f64);
    let den = served.len() as f64 * served.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>();
    num / den
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> anyhow::Result<PathBuf> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("failed to create {}", path))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(PathBuf::from(path))
}

/// Read back one CSV artifact, the inverse of `export_csv` for one stream.
pub fn read_csv_rows<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Read back a JSON bundle written by `export_json`.
pub fn read_bundle(path: &Path) -> anyhow::Result<StatsBundle> {
    let payload = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&payload)?)
}
