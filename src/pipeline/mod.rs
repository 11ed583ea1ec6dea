pub mod annotate;
pub mod classify;
pub mod cycle;
pub mod dedup;

pub use annotate::annotate;
pub use classify::classify;
pub use cycle::{CycleReport, CycleStats, Outcome, Scout};
