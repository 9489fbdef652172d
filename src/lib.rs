
pub mod aggregator;
pub mod config;
pub mod fetch_core;
pub mod persistence;
pub mod pipeline;
pub mod report_core;
pub mod sqlite_pragma;
