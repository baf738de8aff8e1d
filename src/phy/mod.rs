pub mod rtt;
pub mod rtt_assign;

pub use rtt::{one_way_delay_ns, propagation_speed_mps, px_to_m, rtt_ns_from_px, PhyParams};
pub use rtt_assign::build_onu_rtts;
