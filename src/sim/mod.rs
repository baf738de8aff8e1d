pub mod config;
pub mod queue;
pub mod simulator;
pub mod stats;
pub mod traffic;

#[cfg(test)]
mod unit_tests;

pub use config::{Config, RunOverrides};
pub use queue::{ClassQueue, OnuQueues, Packet};
pub use simulator::{DrainOutcome, SimSettings, Simulator};
pub use stats::{
    read_bundle, read_csv_rows, CycleRow, DelayAggRow, GrantRow, OnuRow, PacketRow, StatsBundle,
    StatsRecorder,
};
pub use traffic::{ProfileTable, TrafficModel, TrafficProfile};
