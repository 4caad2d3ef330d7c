//! gido/crates/domains/src/lib.rs
//!
//! Data model and port definitions shared by every Gido crate.

pub mod error;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
