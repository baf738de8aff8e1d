use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;
use toml::Table;

use ponsim::sim::config::{Config, RunOverrides};
use ponsim::sim::simulator::{SimSettings, Simulator};
use ponsim::topology::load_topology;

#[derive(Parser)]
#[command(version, about)]
struct PonsimArgs {
    #[arg(help = "Path to topology .pon file (JSON)")]
    topology_path: PathBuf,
    #[arg(long, help = "Path to run config .toml with a [sim] section")]
    config: Option<PathBuf>,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Override DBA algorithm(s), comma separated"
    )]
    algorithms: Option<Vec<String>>,
    #[arg(long, help = "Override number of DBA cycles")]
    cycles: Option<u64>,
    #[arg(long, help = "Override traffic RNG seed")]
    seed: Option<u64>,
    #[arg(long, help = "Output artifact prefix")]
    out: Option<String>,
    #[arg(long, help = "Skip the JSON bundle export")]
    no_json: bool,
}

pub fn main() -> anyhow::Result<()> {
    env_logger::init();

    let argv = PonsimArgs::parse();
    let topology = load_topology(&argv.topology_path)?;

    let overrides = match &argv.config {
        Some(path) => {
            let payload = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            let table: Table = toml::from_str(&payload).context("cannot parse config toml")?;
            RunOverrides::from_section(table.get("sim"))
        }
        None => RunOverrides::default(),
    };

    // override file config with argv, topology inline values with both
    let algorithms = argv
        .algorithms
        .or(overrides.algorithms)
        .unwrap_or_else(|| vec![topology.simulation.algorithm.clone()]);
    let out_prefix = argv
        .out
        .or(overrides.out_prefix)
        .unwrap_or_else(|| "out/ponsim".to_string());

    for algorithm in &algorithms {
        let mut settings = SimSettings::from_topology(&topology).with_algorithm(algorithm);
        settings.cycles = argv.cycles.or(overrides.cycles).unwrap_or(settings.cycles);
        settings.seed = argv.seed.or(overrides.seed).unwrap_or(settings.seed);

        let mut sim = Simulator::new(&topology, settings)?;
        let cycles = sim.run(None)?;

        let prefix = if algorithms.len() > 1 {
            format!("{}_{}", out_prefix, algorithm)
        } else {
            out_prefix.clone()
        };
        let paths = sim.stats().export_csv(&prefix)?;
        if !argv.no_json {
            sim.stats()
                .export_json(&PathBuf::from(format!("{}.json", prefix)))?;
        }
        info!("{}: wrote {} csv artifacts", algorithm, paths.len());
        println!(
            "{}: {} cycles, t = {} ns, artifacts at {}*",
            algorithm,
            cycles,
            sim.now_ns(),
            prefix
        );
    }
    Ok(())
}
