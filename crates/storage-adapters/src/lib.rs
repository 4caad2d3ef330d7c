//! # storage-adapters
//!
//! In-process state behind the storage ports. Nothing here survives a
//! restart.

pub mod memory_ledger;

pub use memory_ledger::MemoryAbuseLedger;
