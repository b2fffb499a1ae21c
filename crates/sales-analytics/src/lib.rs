pub mod analytics;
pub mod clock;
pub mod config;
pub mod error;
pub mod import;
pub mod telemetry;
pub mod territory;
