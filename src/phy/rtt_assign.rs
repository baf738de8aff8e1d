use std::collections::HashMap;

use crate::dba::messages::Nanos;
use crate::phy::rtt::{rtt_ns_from_px, PhyParams};
use crate::topology::{Topology, DEVICE_TYPE_OLT, DEVICE_TYPE_ONU};

/// Map each ONU to the RTT of its first OLT link, scanning connections in
/// connection-id order. An ONU wired to multiple OLTs keeps the first match;
/// extra links are ignored without validation. ONUs with no OLT link are
/// absent from the result (callers default them to RTT 0).
pub fn build_onu_rtts(topology: &Topology, params: &PhyParams) -> HashMap<String, Nanos> {
    let mut rtts = HashMap::new();
    for connection in topology.connections.values() {
        let a_type = topology.device_type(&connection.device_a_id);
        let b_type = topology.device_type(&connection.device_b_id);
        let onu = match (a_type, b_type) {
            (Some(DEVICE_TYPE_OLT), Some(DEVICE_TYPE_ONU)) => &connection.device_b_id,
            (Some(DEVICE_TYPE_ONU), Some(DEVICE_TYPE_OLT)) => &connection.device_a_id,
            _ => continue,
        };
        if !rtts.contains_key(onu) {
            rtts.insert(onu.clone(), rtt_ns_from_px(connection.distance, params));
        }
    }
    rtts
}
