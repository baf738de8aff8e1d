/*
DBA engine contract and registry.

An engine is constructed once per run with (CycleTiming, DbaParams) and must
be deterministic: the same report set and clock always yield the same grants.
The registry is an explicit object populated in a single pass at construction
time; nothing registers itself through global state.
*/

use std::collections::HashMap;

use crate::dba::messages::{bytes_to_ns, CycleTiming, Grant, Nanos, Report};
use crate::error::SimError;

/// Flat numeric parameter map handed to engine constructors.
pub type DbaParams = HashMap<String, u64>;

pub const MAX_GRANT_BYTES: &str = "MAX_GRANT_BYTES";
pub const MIN_GRANT_BYTES: &str = "MIN_GRANT_BYTES";

pub trait DbaEngine {
    fn name(&self) -> &'static str;

    /// Compute one cycle's grant schedule from the ONU reports. Grants come
    /// back ordered, with non-overlapping slots starting at or after `now_ns`.
    fn compute_grants(&self, reports: &[Report], now_ns: Nanos) -> Vec<Grant>;
}

/// Shared slot-packing skeleton for all shipped engines. Reports are ordered
/// by (timestamp_ns, onu_id), zero-demand reports are skipped, and each
/// positive-demand report gets one slot of `size_for(demand)` bytes packed
/// sequentially behind a running cursor.
pub(crate) fn pack_grants<F>(
    reports: &[Report],
    now_ns: Nanos,
    timing: &CycleTiming,
    mut size_for: F,
) -> Vec<Grant>
where
    F: FnMut(u64) -> u64,
{
    let mut ordered: Vec<&Report> = reports.iter().collect();
    ordered.sort_by(|a, b| {
        (a.timestamp_ns, a.onu_id.as_str()).cmp(&(b.timestamp_ns, b.onu_id.as_str()))
    });

    let mut grants = Vec::new();
    let mut cursor = now_ns;
    for report in ordered {
        let demand = report.total_demand_bytes();
        if demand == 0 {
            continue;
        }
        let size = size_for(demand);
        let duration = bytes_to_ns(size, timing.line_rate_bps) + timing.guard_time_ns;
        grants.push(Grant {
            onu_id: report.onu_id.clone(),
            size_bytes: size,
            start_time_ns: cursor,
            duration_ns: duration,
        });
        cursor += duration;
    }
    grants
}

type EngineBuilder = fn(CycleTiming, DbaParams) -> Box<dyn DbaEngine>;

/// Name-keyed engine factory. Names are stored lowercase.
pub struct DbaRegistry {
    builders: HashMap<String, EngineBuilder>,
}

impl DbaRegistry {
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Registry preloaded with the shipped engines.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("gated", |timing, params| {
            Box::new(crate::dba::gated::Gated::new(timing, params))
        });
        registry.register("limited", |timing, params| {
            Box::new(crate::dba::limited::Limited::new(timing, params))
        });
        registry.register("ipact", |timing, params| {
            Box::new(crate::dba::ipact::IpactLimited::new(timing, params))
        });
        registry
    }

    pub fn register(&mut self, name: &str, builder: EngineBuilder) {
        self.builders.insert(name.to_ascii_lowercase(), builder);
    }

    pub fn build(
        &self,
        name: &str,
        timing: CycleTiming,
        params: DbaParams,
    ) -> Result<Box<dyn DbaEngine>, SimError> {
        match self.builders.get(&name.to_ascii_lowercase()) {
            Some(builder) => Ok(builder(timing, params)),
            None => Err(SimError::UnknownAlgorithm(name.to_string())),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for DbaRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Build an engine from the builtin registry.
pub fn build_engine(
    name: &str,
    timing: CycleTiming,
    params: DbaParams,
) -> Result<Box<dyn DbaEngine>, SimError> {
    DbaRegistry::with_builtins().build(name, timing, params)
}
