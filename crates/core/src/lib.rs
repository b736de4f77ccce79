//! Domain types shared across the varia workspace.
//!
//! Pure data and parsing only: the progress-marker lexer, analysis
//! configuration types, the result document model, the job event
//! vocabulary, and the supported country table. No I/O lives here.

pub mod analysis;
pub mod countries;
pub mod error;
pub mod events;
pub mod progress;
pub mod results;

pub use error::CoreError;
