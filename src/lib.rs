// Library entry point for probegraph.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod ports;
