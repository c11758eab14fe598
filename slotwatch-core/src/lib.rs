//! Core types and service wiring for the slotwatch NDLS appointment monitor.

/// HTTP client for the NDLS booking service.
pub mod client;
/// Fuzzy centre-name resolution.
pub mod matching;
/// Domain models and identifiers.
pub mod model;
/// Traits and errors describing the booking backend and alert delivery.
pub mod ports;
/// Poll-and-diff loop watching one centre for new slots.
pub mod watcher;

pub use client::*;
pub use matching::*;
pub use model::*;
pub use ports::*;
pub use watcher::*;
