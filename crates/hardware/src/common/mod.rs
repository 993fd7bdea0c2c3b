//! Common types shared across the simulator.
//!
//! This module collects definitions used by every layer of the model:
//! 1. **Error Handling:** The library-wide error enum and its conversions.

/// Error definitions for configuration, loading, and simulation control.
pub mod error;

pub use error::SimError;
