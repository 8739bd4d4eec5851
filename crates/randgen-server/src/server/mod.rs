pub mod config;
pub mod generation;
pub mod service;
pub mod telemetry;
