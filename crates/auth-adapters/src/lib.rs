//! # auth-adapters
//!
//! Ban-list sources for the support intake.

pub mod ban_list;

pub use ban_list::{EnvBanList, StaticBanList, DEFAULT_DELIMITER};
