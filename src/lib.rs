pub mod core;
pub mod models;

pub use crate::core::baseline::BaselineMeasurement;
pub use crate::core::execute::Benchmark;
pub use crate::core::scheduler::{RateScheduler, TimingPolicy};
pub use crate::models::result::Results;
pub use crate::models::run_config::RunConfig;
