//! External engine integration.
//!
//! Everything that touches the filesystem or spawns processes for an
//! analysis job: the per-job scratch context and input staging, engine
//! command construction (interpreter resolution), supervised execution
//! with line-streamed progress, and result-file polling.

pub mod command;
pub mod error;
pub mod job;
pub mod poller;
pub mod run;

pub use command::{resolve_interpreter, EngineCommand};
pub use error::EngineError;
pub use job::JobContext;
pub use poller::PollConfig;
