pub mod health;
pub mod pipeline;
pub mod report;
pub mod resources;
pub mod select;
pub mod stats;

pub use health::{check_services, HealthReport, Probe};
pub use pipeline::{Pipeline, RunMode, RunState, RunSummary};
pub use report::write_error_report;
pub use resources::{JudgeProvider, StoreProvider, StoreSpec};
pub use select::Selector;
pub use stats::{window_stats, WindowStats};
