//! Utility functions
//!
//! - Special functions for variational inference
//! - Topic quality metrics

pub mod evaluation;
pub mod math;
