pub mod config;
pub mod error;
pub mod geo;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod sources;
pub mod store;
pub mod supervisor;

pub use config::Config;
pub use error::{ConfigError, NotifyError, SourceError, StoreError};
pub use pipeline::{CycleReport, Scout};
pub use supervisor::{Supervisor, SupervisorSummary};
