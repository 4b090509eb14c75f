//! Recipe sandbox library surface.
//!
//! An in-process forked chain (`fork_db`) with typed recipe actions, a proxy executor that
//! commits each batch atomically, and the fixtures scenarios assert balances against.

pub mod actions;
pub mod cheatcodes;
pub mod error;
pub mod executor;
pub mod fork_db;
pub mod harness;
pub mod ledger;
pub mod recipe;
pub mod registry;
pub mod utils;

pub mod config {
    pub mod chains;
}
