use crate::dba::engine::{pack_grants, DbaEngine, DbaParams, MAX_GRANT_BYTES, MIN_GRANT_BYTES};
use crate::dba::limited::DEFAULT_MAX_GRANT_BYTES;
use crate::dba::messages::{CycleTiming, Grant, Nanos, Report};

/// IPACT with limited service: interleaved polling order (report arrival at
/// the OLT), per-ONU cap as in Limited, plus an optional `MIN_GRANT_BYTES`
/// floor so ONUs with tiny requests are not starved. The floor may grant more
/// than the ONU asked for; the drain step simply leaves the surplus unused.
pub struct IpactLimited {
    timing: CycleTiming,
    max_grant_bytes: u64,
    min_grant_bytes: u64,
}

impl IpactLimited {
    pub fn new(timing: CycleTiming, params: DbaParams) -> Self {
        Self {
            timing,
            max_grant_bytes: params
                .get(MAX_GRANT_BYTES)
                .copied()
                .unwrap_or(DEFAULT_MAX_GRANT_BYTES),
            min_grant_bytes: params.get(MIN_GRANT_BYTES).copied().unwrap_or(0),
        }
    }
}

impl DbaEngine for IpactLimited {
    fn name(&self) -> &'static str {
        "ipact"
    }

    fn compute_grants(&self, reports: &[Report], now_ns: Nanos) -> Vec<Grant> {
        pack_grants(reports, now_ns, &self.timing, |demand| {
            let mut size = demand.min(self.max_grant_bytes);
            if self.min_grant_bytes > 0 {
                size = size.max(self.min_grant_bytes);
            }
            size
        })
    }
}
