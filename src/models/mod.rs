pub mod args;
pub mod baseline;
pub mod result;
pub mod run_config;
