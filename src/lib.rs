// The binary in main.rs drives this library from the terminal; integration
// tests and benchmarks import the same modules.

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod keyboard;
pub mod session;
pub mod store;
