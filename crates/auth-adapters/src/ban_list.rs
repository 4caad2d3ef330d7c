//! Ban lists, either fixed at startup or read live from the environment.

use std::env;

use domains::{BanList, BanListSource};
use tracing::{debug, trace};

/// Separator used by `BANNED_USERS`-style variables.
pub const DEFAULT_DELIMITER: char = '/';

/// Ban list loaded once from configuration.
///
/// An empty list is a valid configuration: nobody is banned.
#[derive(Debug, Clone, Default)]
pub struct StaticBanList {
    list: BanList,
}

impl StaticBanList {
    pub fn new(list: BanList) -> Self {
        if list.is_empty() {
            debug!("ban list is empty, all identities allowed");
        }
        Self { list }
    }
}

impl BanListSource for StaticBanList {
    fn snapshot(&self) -> BanList {
        self.list.clone()
    }
}

/// Re-reads an environment variable on every check, so the list can change
/// without a restart. A missing variable means nobody is banned.
#[derive(Debug, Clone)]
pub struct EnvBanList {
    var: String,
    delimiter: char,
}

impl EnvBanList {
    pub fn new(var: impl Into<String>, delimiter: char) -> Self {
        Self {
            var: var.into(),
            delimiter,
        }
    }
}

impl BanListSource for EnvBanList {
    fn snapshot(&self) -> BanList {
        match env::var(&self.var) {
            Ok(raw) => {
                let list = BanList::parse_delimited(&raw, self.delimiter);
                trace!(var = %self.var, entries = list.len(), "loaded ban list");
                list
            }
            Err(_) => BanList::default(),
        }
    }
}
