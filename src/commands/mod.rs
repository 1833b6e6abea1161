pub mod agents;
pub mod analyze;
pub mod config;
pub mod generate;
pub mod helpers;
