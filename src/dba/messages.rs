/*
Message model shared by the cycle simulator and the DBA engines.

Reports travel ONU -> OLT and snapshot per-class byte backlogs; grants travel
OLT -> ONU and carry an absolute upstream slot. Both are cycle-scoped value
objects: built, consumed, and dropped inside one run_one_cycle invocation.
*/

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type Nanos = u64;

/// Upstream class of service, in drain priority order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceClass {
    Ef,
    Af,
    Be,
}

impl ServiceClass {
    pub const ALL: [ServiceClass; 3] = [ServiceClass::Ef, ServiceClass::Af, ServiceClass::Be];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceClass::Ef => "EF",
            ServiceClass::Af => "AF",
            ServiceClass::Be => "BE",
        }
    }

    /// Packet size used when a traffic profile does not override it.
    pub fn default_pkt_size_bytes(self) -> u64 {
        match self {
            ServiceClass::Ef => 200,
            ServiceClass::Af => 1500,
            ServiceClass::Be => 1500,
        }
    }
}

/// One ONU's queue-state report as seen by the OLT. `timestamp_ns` is the
/// arrival instant at the OLT, not the generation instant at the ONU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub onu_id: String,
    pub queues_bytes: BTreeMap<ServiceClass, u64>,
    pub timestamp_ns: Nanos,
}

impl Report {
    /// Aggregate demand over all service classes.
    pub fn total_demand_bytes(&self) -> u64 {
        self.queues_bytes.values().sum()
    }
}

/// One upstream transmission slot granted to an ONU. `duration_ns` covers the
/// transmission time of `size_bytes` plus the guard interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub onu_id: String,
    pub size_bytes: u64,
    pub start_time_ns: Nanos,
    pub duration_ns: Nanos,
}

impl Grant {
    pub fn end_time_ns(&self) -> Nanos {
        self.start_time_ns + self.duration_ns
    }
}

/// Physical and timing parameters shared by the simulator, the DBA engines
/// and the RTT model. Immutable once a run starts.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct CycleTiming {
    pub guard_time_ns: Nanos,
    pub line_rate_bps: u64,
    pub scale_m_per_px: f64,
    pub n_fiber: f64,
}

impl Default for CycleTiming {
    fn default() -> Self {
        Self {
            guard_time_ns: 1000,
            line_rate_bps: 10_000_000_000,
            scale_m_per_px: 0.1,
            n_fiber: 1.468,
        }
    }
}

/// Transmission time of `size_bytes` at `line_rate_bps`, truncated to whole
/// nanoseconds. Guard time is NOT included; slot durations add it on top, so
/// the truncation can never make adjacent slots overlap.
pub fn bytes_to_ns(size_bytes: u64, line_rate_bps: u64) -> Nanos {
    (size_bytes as u128 * 8 * 1_000_000_000 / line_rate_bps as u128) as Nanos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_to_ns_matches_line_rate_law() {
        // 12000 bytes at 10 Gbps: 12000 * 8 / 10e9 s = 9600 ns
        assert_eq!(bytes_to_ns(12000, 10_000_000_000), 9600);
        assert_eq!(bytes_to_ns(0, 10_000_000_000), 0);
        assert_eq!(bytes_to_ns(1500, 1_000_000_000), 12000);
    }

    #[test]
    fn bytes_to_ns_truncates_and_is_monotonic() {
        // 1 byte at 10 Gbps is 0.8 ns, truncated down
        assert_eq!(bytes_to_ns(1, 10_000_000_000), 0);
        let rate = 10_000_000_000;
        let mut prev = 0;
        for size in 0..4000 {
            let ns = bytes_to_ns(size, rate);
            assert!(ns >= prev);
            prev = ns;
        }
    }

    #[test]
    fn bytes_to_ns_survives_large_sizes() {
        // u128 intermediate keeps size*8e9 from wrapping
        let ns = bytes_to_ns(u64::MAX / 16, 10_000_000_000);
        assert!(ns > 0);
    }

    #[test]
    fn service_classes_drain_in_declared_order() {
        assert!(ServiceClass::Ef < ServiceClass::Af);
        assert!(ServiceClass::Af < ServiceClass::Be);
        assert_eq!(ServiceClass::Ef.as_str(), "EF");
    }

    #[test]
    fn report_demand_sums_all_classes() {
        let mut queues = BTreeMap::new();
        queues.insert(ServiceClass::Ef, 200);
        queues.insert(ServiceClass::Be, 1800);
        let report = Report {
            onu_id: "onu1".to_string(),
            queues_bytes: queues,
            timestamp_ns: 0,
        };
        assert_eq!(report.total_demand_bytes(), 2000);
    }
}
