//! Contract tests shared by every storage backend.
//!
//! Each backend test binary builds its store and runs these through the
//! `run_*_tests!` macros.

pub mod invalid_sink_tests;
pub mod order_store_tests;
