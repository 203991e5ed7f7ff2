//! CLI command handling

pub mod args;
pub mod logging;
pub mod notify;

pub use args::*;
pub use logging::*;
pub use notify::*;
