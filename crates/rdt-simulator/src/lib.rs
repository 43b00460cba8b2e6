pub mod scenario_runner;
pub mod trace;
pub mod transcript;

pub use trace::SimulationReport;
pub use transcript::Transcript;
