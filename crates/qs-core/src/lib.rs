pub mod config;
pub mod discover;
pub mod error;
pub mod git;
pub mod github;
pub mod io;
pub mod paths;
pub mod pull_request;
pub mod registry;
pub mod remote;
pub mod resolver;
pub mod story;
pub mod sync;
pub mod types;

#[cfg(test)]
mod testing;

pub use error::{QsError, Result};
