//! Core business logic for tally.

pub mod services;

pub use services::*;
