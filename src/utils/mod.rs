//! Utils Module - Shared Constants & Helpers

pub mod constants;

pub use constants::*;
