//! CLI command implementations.

pub mod ask;
pub mod classify;
pub mod handlers;
pub mod ledger;
pub mod run;
pub mod summary;
