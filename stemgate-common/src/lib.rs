//! # Stemgate Common Library
//!
//! Shared code for the Stemgate services including:
//! - Track/stem descriptor types and cache-key identity
//! - Event types (StemEvent enum)
//! - Common error types
//! - Configuration path resolution

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use error::{Error, Result};
pub use types::{AudioFile, CandidateTier, Stem, StemIdentity, Track};
