pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod k8s;
pub mod logging;
pub mod report;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, ScoutError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
