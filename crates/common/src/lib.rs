//! Shared types used across the experience crates.
//!
//! # Invariants
//! - Every type that owns a rendering resource implements [`Disposable`].
//! - Releasing twice is a no-op, never an error.

pub mod dispose;
pub mod types;

pub use dispose::{Disposable, ReleaseReport};
pub use types::{NodeId, Size, Transform};
