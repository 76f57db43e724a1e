//! Pure utility functions.
//!
//! Process bootstrap and retry policy shared by the library and binaries.

pub mod bootstrap;
pub mod retry;
