use super::star_topology;
use crate::dba::messages::{bytes_to_ns, Grant};
use crate::sim::simulator::Simulator;

/// Build a simulator whose ONU has two 1500 B packets queued (the limited cap
/// of 1000 B can never carry one, so two cycles leave both in place).
fn sim_with_backlog() -> Simulator {
    let topology = star_topology(
        1,
        r#"{"algorithm": "limited", "algo_params": {"MAX_GRANT_BYTES": 1000},
            "cycles": 2, "seed": 1,
            "traffic_profiles": {"onu1": {"BE": {"type": "det", "bytes_per_cycle": 1500}}}}"#,
    );
    let mut sim = Simulator::from_topology(&topology).unwrap();
    sim.run(None).unwrap();
    assert_eq!(sim.backlog_bytes("onu1"), 3000);
    sim
}

fn grant(onu_id: &str, size_bytes: u64, start_time_ns: u64) -> Grant {
    Grant {
        onu_id: onu_id.to_string(),
        size_bytes,
        start_time_ns,
        duration_ns: 0,
    }
}

#[test]
fn drain_serves_whole_packets_only() {
    let mut sim = sim_with_backlog();
    let start = sim.now_ns();
    // budget for one packet plus 100 spare bytes: the spare never fragments
    // the second packet
    let outcome = sim.drain_grant(&grant("onu1", 1600, start));
    assert_eq!(outcome.served_bytes, 1500);
    assert_eq!(outcome.tx_end_ns, start + bytes_to_ns(1500, 10_000_000_000));
    assert_eq!(sim.backlog_bytes("onu1"), 1500);
}

#[test]
fn drain_exact_budget_empties_the_queue() {
    let mut sim = sim_with_backlog();
    let start = sim.now_ns();
    let outcome = sim.drain_grant(&grant("onu1", 3000, start));
    assert_eq!(outcome.served_bytes, 3000);
    assert_eq!(sim.backlog_bytes("onu1"), 0);
}

#[test]
fn drain_with_no_fitting_packet_serves_nothing() {
    let mut sim = sim_with_backlog();
    let start = sim.now_ns();
    let outcome = sim.drain_grant(&grant("onu1", 1499, start));
    assert_eq!(outcome.served_bytes, 0);
    assert_eq!(outcome.tx_end_ns, start);
    assert_eq!(sim.backlog_bytes("onu1"), 3000);
}

#[test]
fn drain_for_unknown_onu_is_a_no_op() {
    let mut sim = sim_with_backlog();
    let outcome = sim.drain_grant(&grant("onu9", 5000, 0));
    assert_eq!(outcome.served_bytes, 0);
    assert_eq!(outcome.tx_end_ns, 0);
}

#[test]
fn drained_packets_report_queue_delay_from_slot_start() {
    let mut sim = sim_with_backlog();
    let packets_before = sim.stats().packet_rows().len();
    let start = sim.now_ns() + 5000;
    sim.drain_grant(&grant("onu1", 1500, start));

    let row = sim.stats().packet_rows().last().unwrap();
    assert_eq!(sim.stats().packet_rows().len(), packets_before + 1);
    assert_eq!(row.start_ns, start);
    // both queued packets arrived at cycle starts, before `start`
    assert_eq!(row.queue_delay_ns, row.start_ns - row.arrival_ns);
    assert!(row.queue_delay_ns >= 5000);
}
