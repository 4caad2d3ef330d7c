//! Submitter fingerprinting and ban checks.

use domains::{BanList, Identity};
use sha2::{Digest, Sha256};

/// Hex SHA-256 of `agent` followed by `source_address`.
///
/// Deterministic and one-way. Two different pairs may collide (e.g. when the
/// boundary between agent and address shifts); that is accepted.
pub fn derive_identity(agent: &str, source_address: &str) -> Identity {
    let mut hasher = Sha256::new();
    hasher.update(agent.as_bytes());
    hasher.update(source_address.as_bytes());
    Identity::new(hex::encode(hasher.finalize()))
}

/// Plain membership test. An empty list bans nobody.
pub fn is_banned(identity: &Identity, bans: &BanList) -> bool {
    !bans.is_empty() && bans.contains(identity)
}
