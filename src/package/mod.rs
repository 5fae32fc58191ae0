//! Package-side data: who is being synchronized and what ends up attached to it
//!
//! # Modules
//!
//! - [`types`]: Package identity, field names and the normalized records
//! - [`record`]: In-memory metadata record that successful syncs attach to

pub mod record;
pub mod types;
