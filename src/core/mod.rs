//! Core types: errors, configuration, the unit data model.

pub mod config;
pub mod errors;
pub mod units;
