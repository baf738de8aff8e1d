use std::fs;
use std::path::PathBuf;

use super::star_topology;
use crate::sim::simulator::Simulator;
use crate::sim::stats::{read_bundle, read_csv_rows, CycleRow, GrantRow, PacketRow};

fn run_small_sim() -> Simulator {
    let topology = star_topology(
        2,
        r#"{"algorithm": "ipact", "cycles": 4, "seed": 11,
            "traffic_profiles": {
                "onu1": {"BE": {"type": "poisson", "lambda_bpc": 3000.0}},
                "onu2": {"EF": {"type": "det", "bytes_per_cycle": 600}}}}"#,
    );
    let mut sim = Simulator::from_topology(&topology).unwrap();
    sim.run(None).unwrap();
    sim
}

fn scratch_prefix(tag: &str) -> String {
    let dir = std::env::temp_dir().join(format!("ponsim_{}_{}", tag, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir.join("run").to_str().unwrap().to_string()
}

#[test]
fn csv_export_round_trips_every_value() {
    let sim = run_small_sim();
    let prefix = scratch_prefix("csv");
    let paths = sim.stats().export_csv(&prefix).unwrap();
    assert_eq!(paths.len(), 5);

    let cycles: Vec<CycleRow> =
        read_csv_rows(&PathBuf::from(format!("{}_cycles.csv", prefix))).unwrap();
    assert_eq!(cycles, sim.stats().per_cycle_rows());

    let grants: Vec<GrantRow> =
        read_csv_rows(&PathBuf::from(format!("{}_grants.csv", prefix))).unwrap();
    assert_eq!(grants, sim.stats().grants());

    let packets: Vec<PacketRow> =
        read_csv_rows(&PathBuf::from(format!("{}_packets.csv", prefix))).unwrap();
    assert_eq!(packets, sim.stats().packet_rows());
}

#[test]
fn json_bundle_round_trips() {
    let sim = run_small_sim();
    let prefix = scratch_prefix("json");
    let path = PathBuf::from(format!("{}.json", prefix));
    sim.stats().export_json(&path).unwrap();
    assert_eq!(read_bundle(&path).unwrap(), sim.stats().bundle());
}

#[test]
fn csv_headers_are_stable_for_downstream_tools() {
    let sim = run_small_sim();
    let prefix = scratch_prefix("headers");
    sim.stats().export_csv(&prefix).unwrap();

    let expectations = [
        ("grants", "cycle,algorithm,onu_id,grant_bytes,start_ns,end_ns"),
        (
            "per_onu",
            "cycle,algorithm,onu_id,offered_bytes,served_bytes,backlog_bytes",
        ),
        ("cycles", "cycle,algorithm,utilization,fairness_jain"),
        (
            "packets",
            "cycle,algorithm,onu_id,cls,size_bytes,arrival_ns,start_ns,end_ns,queue_delay_ns",
        ),
        (
            "delay_agg",
            "cycle,algorithm,onu_id,cls,n_packets,mean_delay_ns,std_delay_ns,p95_delay_ns",
        ),
    ];
    for (stream, header) in expectations {
        let payload = fs::read_to_string(format!("{}_{}.csv", prefix, stream)).unwrap();
        assert_eq!(payload.lines().next().unwrap(), header, "{} header", stream);
    }
}
