//! Request handlers.
//!
//! Each submodule provides the async handler functions for one resource.
//! Handlers validate the request shape, delegate the real work to
//! [`crate::pipeline`] or `varia_engine`, and map errors via
//! [`crate::error::AppError`].

pub mod analysis;
pub mod artifacts;
pub mod detection;
