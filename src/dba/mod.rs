pub mod engine;
pub mod gated;
pub mod ipact;
pub mod limited;
pub mod messages;

pub use engine::{build_engine, DbaEngine, DbaParams, DbaRegistry};
pub use gated::Gated;
pub use ipact::IpactLimited;
pub use limited::Limited;
pub use messages::{bytes_to_ns, CycleTiming, Grant, Nanos, Report, ServiceClass};
