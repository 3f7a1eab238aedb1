pub mod aggregator;
pub mod baseline;
pub mod capability;
pub mod execute;
pub mod http_maker;
pub mod output;
pub mod process;
pub mod rapl;
pub mod report;
pub mod scheduler;
pub mod show_result_with_table;
pub(crate) mod sleep_guard;
