use crate::dba::engine::{pack_grants, DbaEngine, DbaParams, MAX_GRANT_BYTES};
use crate::dba::messages::{CycleTiming, Grant, Nanos, Report};

pub const DEFAULT_MAX_GRANT_BYTES: u64 = 12_000;

/// Limited DBA: per-cycle grant capped at `MAX_GRANT_BYTES` (default 12000).
/// Excess demand stays queued at the ONU for a later cycle.
pub struct Limited {
    timing: CycleTiming,
    max_grant_bytes: u64,
}

impl Limited {
    pub fn new(timing: CycleTiming, params: DbaParams) -> Self {
        Self {
            timing,
            max_grant_bytes: params
                .get(MAX_GRANT_BYTES)
                .copied()
                .unwrap_or(DEFAULT_MAX_GRANT_BYTES),
        }
    }
}

impl DbaEngine for Limited {
    fn name(&self) -> &'static str {
        "limited"
    }

    fn compute_grants(&self, reports: &[Report], now_ns: Nanos) -> Vec<Grant> {
        pack_grants(reports, now_ns, &self.timing, |demand| {
            demand.min(self.max_grant_bytes)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::dba::messages::ServiceClass;

    fn report(onu_id: &str, ts: Nanos, be_bytes: u64) -> Report {
        let mut queues = BTreeMap::new();
        queues.insert(ServiceClass::Be, be_bytes);
        Report {
            onu_id: onu_id.to_string(),
            queues_bytes: queues,
            timestamp_ns: ts,
        }
    }

    #[test]
    fn grants_never_exceed_the_cap_or_demand() {
        let engine = Limited::new(CycleTiming::default(), DbaParams::new());
        let grants = engine.compute_grants(&[report("onu1", 0, 40_000), report("onu2", 1, 5_000)], 0);
        assert_eq!(grants[0].size_bytes, DEFAULT_MAX_GRANT_BYTES);
        assert_eq!(grants[1].size_bytes, 5_000);
    }

    #[test]
    fn slots_are_sequential_with_guard() {
        let timing = CycleTiming::default();
        let engine = Limited::new(timing, DbaParams::new());
        let grants = engine.compute_grants(
            &[report("onu1", 0, 12_000), report("onu2", 1, 12_000)],
            500,
        );
        assert_eq!(grants[0].start_time_ns, 500);
        // 12000 B at 10 Gbps is 9600 ns, plus 1000 ns guard
        assert_eq!(grants[0].duration_ns, 10_600);
        assert_eq!(grants[1].start_time_ns, grants[0].end_time_ns());
    }
}
