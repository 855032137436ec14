//! Integration tests for the sweep pipeline.
//!
//! 1. Sweep generation and trial execution against stand-in binaries
//! 2. Result parsing, aggregation and reporting

pub mod analysis_tests;
pub mod helpers;
pub mod sweep_tests;
