//! Varia API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes, the
//! analysis pipeline) so integration tests and the binary entrypoint can
//! both access them.

pub mod config;
pub mod error;
pub mod genai;
pub mod handlers;
pub mod pipeline;
pub mod routes;
pub mod state;
