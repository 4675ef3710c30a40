//! Common types for the k-mer embedding layer
//!
//! This crate provides the foundational types shared across the workspace:
//! configuration, error handling, the training/evaluation mode switch and
//! execution device selection.

pub mod config;
pub mod device;
pub mod error;
pub mod mode;

pub use config::*;
pub use device::DeviceSpec;
pub use error::*;
pub use kmer_sinusoid::{DEFAULT_BASE, FrequencyScaling};
pub use mode::Mode;
