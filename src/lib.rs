pub mod config;
pub mod logging;
pub mod package;
pub mod sync;
