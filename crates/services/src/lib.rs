//! # services
//!
//! Application logic for the Gido site and status bot. Everything here talks
//! to the outside world through the ports in `domains`.

pub mod abuse;
pub mod identity;
pub mod reconciler;
pub mod status_message;
pub mod support;

pub use abuse::AbuseNotifier;
pub use identity::{derive_identity, is_banned};
pub use reconciler::{StatusReconciler, StatusSettings};
pub use status_message::StatusMessageSlot;
pub use support::{SupportService, SupportSettings};
