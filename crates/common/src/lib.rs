//! Common utilities and shared types for tally.
//!
//! This crate provides foundational components used across all tally crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Fingerprinting**: Pseudo-anonymous voter identifiers via [`fingerprint`]
//!
//! # Example
//!
//! ```no_run
//! use tally_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod id;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use fingerprint::{ClientSignals, fingerprint};
pub use id::IdGenerator;
