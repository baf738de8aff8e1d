pub mod dba;
pub mod error;
pub mod phy;
pub mod sim;
pub mod topology;

pub use dba::engine::{build_engine, DbaEngine, DbaParams, DbaRegistry};
pub use dba::messages::{bytes_to_ns, CycleTiming, Grant, Nanos, Report, ServiceClass};
pub use error::SimError;
pub use sim::simulator::{SimSettings, Simulator};
pub use topology::Topology;
