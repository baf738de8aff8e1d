use crate::dba::messages::{CycleTiming, Nanos};

/// Vacuum speed of light in m/s.
pub const SPEED_OF_LIGHT_M_PER_S: f64 = 299_792_458.0;

/// Fiber plant parameters for distance-to-delay conversion.
#[derive(Debug, Clone, Copy)]
pub struct PhyParams {
    pub scale_m_per_px: f64,
    pub n_fiber: f64,
}

impl Default for PhyParams {
    fn default() -> Self {
        Self {
            scale_m_per_px: 0.1,
            n_fiber: 1.468,
        }
    }
}

impl From<&CycleTiming> for PhyParams {
    fn from(timing: &CycleTiming) -> Self {
        Self {
            scale_m_per_px: timing.scale_m_per_px,
            n_fiber: timing.n_fiber,
        }
    }
}

pub fn px_to_m(px: f64, scale_m_per_px: f64) -> f64 {
    px * scale_m_per_px
}

pub fn propagation_speed_mps(n_fiber: f64) -> f64 {
    SPEED_OF_LIGHT_M_PER_S / n_fiber
}

pub fn one_way_delay_ns(distance_m: f64, n_fiber: f64) -> f64 {
    distance_m / propagation_speed_mps(n_fiber) * 1e9
}

/// Round-trip time for a canvas distance, truncated to whole nanoseconds.
pub fn rtt_ns_from_px(distance_px: f64, params: &PhyParams) -> Nanos {
    let d_m = px_to_m(distance_px, params.scale_m_per_px);
    let rtt = 2.0 * one_way_delay_ns(d_m, params.n_fiber);
    rtt as Nanos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_way_delay_follows_group_velocity() {
        // 20 km of fiber at n=1.468: 20000 / (c/1.468) * 1e9 ~ 97.93 us
        let delay = one_way_delay_ns(20_000.0, 1.468);
        assert!((delay - 97_934.0).abs() < 10.0);
    }

    #[test]
    fn rtt_is_twice_one_way_truncated() {
        let params = PhyParams::default();
        // 1000 px * 0.1 m/px = 100 m
        let rtt = rtt_ns_from_px(1000.0, &params);
        let expected = (2.0 * one_way_delay_ns(100.0, params.n_fiber)) as Nanos;
        assert_eq!(rtt, expected);
        assert!(rtt > 0);
    }

    #[test]
    fn zero_distance_has_zero_rtt() {
        assert_eq!(rtt_ns_from_px(0.0, &PhyParams::default()), 0);
    }
}
