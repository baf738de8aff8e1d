/*
Per-(ONU, class) traffic profiles.

A profile is sampled once per cycle and yields a byte increment for that
class's queue. Sampling draws from the simulator's own seeded RNG, so two
runs with the same configuration and seed produce identical traffic.
*/

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dba::messages::ServiceClass;

/// Profile table key holding the fallback profile for ONUs without an entry.
pub const DEFAULT_ONU_KEY: &str = "default_onu";

/// onu_id (or `default_onu`) -> class -> profile.
pub type ProfileTable = BTreeMap<String, BTreeMap<ServiceClass, TrafficProfile>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TrafficProfile {
    /// Fixed byte increment every cycle.
    Det {
        #[serde(default)]
        bytes_per_cycle: u64,
        #[serde(default)]
        pkt_size_bytes: Option<u64>,
    },
    /// Poisson-distributed byte count with mean `lambda_bpc` per cycle.
    Poisson {
        #[serde(default)]
        lambda_bpc: f64,
        #[serde(default)]
        pkt_size_bytes: Option<u64>,
    },
    /// Bernoulli burst: `on_bytes_bpc` with probability `p_on`, else nothing.
    Onoff {
        #[serde(default)]
        p_on: f64,
        #[serde(default)]
        on_bytes_bpc: u64,
        #[serde(default)]
        pkt_size_bytes: Option<u64>,
    },
}

impl TrafficProfile {
    pub fn pkt_size_override(&self) -> Option<u64> {
        match self {
            TrafficProfile::Det { pkt_size_bytes, .. }
            | TrafficProfile::Poisson { pkt_size_bytes, .. }
            | TrafficProfile::Onoff { pkt_size_bytes, .. } => *pkt_size_bytes,
        }
    }

    pub fn sample_bytes<R: Rng>(&self, rng: &mut R) -> u64 {
        match self {
            TrafficProfile::Det { bytes_per_cycle, .. } => *bytes_per_cycle,
            TrafficProfile::Poisson { lambda_bpc, .. } => sample_poisson(*lambda_bpc, rng),
            TrafficProfile::Onoff {
                p_on, on_bytes_bpc, ..
            } => {
                if rng.gen::<f64>() < *p_on {
                    *on_bytes_bpc
                } else {
                    0
                }
            }
        }
    }
}

/// Knuth inversion below lambda 200, normal approximation above (the
/// inversion loop runs lambda iterations on average).
fn sample_poisson<R: Rng>(lambda: f64, rng: &mut R) -> u64 {
    if lambda <= 0.0 {
        return 0;
    }
    if lambda > 200.0 {
        let val = (lambda + lambda.sqrt() * standard_normal(rng)).round();
        return if val < 0.0 { 0 } else { val as u64 };
    }
    let limit = (-lambda).exp();
    let mut k: u64 = 0;
    let mut p = 1.0;
    loop {
        k += 1;
        p *= rng.gen::<f64>();
        if p <= limit {
            break;
        }
    }
    k - 1
}

fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    // Box-Muller transform
    let u1: f64 = rng.gen_range(f64::MIN_POSITIVE..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Resolved view over a profile table. Lookup order: the ONU's own entry for
/// the class, then `default_onu`'s entry for the class. A class with no entry
/// generates no traffic.
#[derive(Debug, Clone, Default)]
pub struct TrafficModel {
    table: ProfileTable,
}

impl TrafficModel {
    pub fn new(table: ProfileTable) -> Self {
        Self { table }
    }

    pub fn profile_for(&self, onu_id: &str, cls: ServiceClass) -> Option<&TrafficProfile> {
        for key in [onu_id, DEFAULT_ONU_KEY] {
            if let Some(profile) = self.table.get(key).and_then(|by_class| by_class.get(&cls)) {
                return Some(profile);
            }
        }
        None
    }

    /// Packet size used to chop this (ONU, class)'s byte stream.
    pub fn pkt_size_for(&self, onu_id: &str, cls: ServiceClass) -> u64 {
        self.profile_for(onu_id, cls)
            .and_then(TrafficProfile::pkt_size_override)
            .unwrap_or_else(|| cls.default_pkt_size_bytes())
    }
}
