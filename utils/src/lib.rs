//! Shared utilities for the settlement workspace.

pub mod display;
pub mod logging;

pub use display::{format_elapsed, format_sol};
pub use logging::{init_logging, LogFormat};
