//! Core types and utilities for the CellAdvisor remote-control protocol
//!
//! This crate provides the error taxonomy and measurement types
//! used throughout the CellAdvisor gateway implementation.

pub mod error;
pub mod measurement;

pub use error::{CellError, CellResult};
pub use measurement::InterferencePower;
