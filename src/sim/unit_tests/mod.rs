mod drain_tests;
mod export_tests;

use crate::topology::Topology;

/// Star topology: one OLT, `n` ONUs at 1000, 2000, ... px, with the given
/// `simulation` section spliced in as raw JSON.
pub(crate) fn star_topology(n_onus: usize, simulation: &str) -> Topology {
    let mut devices = vec![r#""olt1": {"device_type": "OLT"}"#.to_string()];
    let mut connections = Vec::new();
    for i in 1..=n_onus {
        devices.push(format!(r#""onu{}": {{"device_type": "ONU"}}"#, i));
        connections.push(format!(
            r#""c{}": {{"device_a_id": "olt1", "device_b_id": "onu{}", "distance": {}}}"#,
            i,
            i,
            i * 1000
        ));
    }
    let raw = format!(
        r#"{{"devices": {{{}}}, "connections": {{{}}}, "simulation": {}}}"#,
        devices.join(", "),
        connections.join(", "),
        simulation
    );
    serde_json::from_str(&raw).expect("test topology must parse")
}
