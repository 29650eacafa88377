pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;

pub use policy::GameplayStrategy;
pub use reports::{ReportFormat, write_report};
pub use seeds::{resolve_start_date, run_dates};
pub use simulation::{RunRecord, SimulationConfig, StrategySummary, run_simulation, summarize};
