use crate::dba::engine::{pack_grants, DbaEngine, DbaParams, MAX_GRANT_BYTES};
use crate::dba::messages::{CycleTiming, Grant, Nanos, Report};

/// Gated DBA: every ONU is granted exactly what it reported. An optional
/// `MAX_GRANT_BYTES` cap bounds the slot; without it a single ONU can take
/// the whole cycle.
pub struct Gated {
    timing: CycleTiming,
    max_grant_bytes: Option<u64>,
}

impl Gated {
    pub fn new(timing: CycleTiming, params: DbaParams) -> Self {
        Self {
            timing,
            max_grant_bytes: params.get(MAX_GRANT_BYTES).copied(),
        }
    }
}

impl DbaEngine for Gated {
    fn name(&self) -> &'static str {
        "gated"
    }

    fn compute_grants(&self, reports: &[Report], now_ns: Nanos) -> Vec<Grant> {
        pack_grants(reports, now_ns, &self.timing, |demand| {
            match self.max_grant_bytes {
                Some(cap) => demand.min(cap),
                None => demand,
            }
        })
    }
}
