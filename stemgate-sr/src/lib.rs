//! # Stemgate Stem Resolver (stemgate-sr)
//!
//! Resolves a (track, stem) pair to a playable URL across ordered fallback
//! tiers (cache, legacy hash tables, declared URL, alternative URLs, file
//! search), validates every candidate against the stem identity to prevent
//! cross-track contamination, and coordinates the single shared "currently
//! audible" playback slot.

pub mod api;
pub mod config;
pub mod playback;
pub mod resolver;
pub mod state;

pub use config::{Heuristics, ServiceConfig};
pub use playback::{PlaybackCoordinator, PlaybackHandle};
pub use resolver::resolve::{Resolution, Resolver};
