pub mod capture_management;
pub mod configuration;
pub mod controller;
pub mod error_handling;
pub mod log_monitoring;
pub mod network;
pub mod pattern_matching;
