//! Bulk GitHub repository operations driven through the `gh` CLI.
//!
//! Each tool (topics, download, ghas) builds a fixed list of remote calls,
//! runs them on a bounded [`pool::TaskPool`], and hands back a
//! [`report::RunReport`] with exactly one result per attempted operation.

pub mod catalog;
pub mod classify;
pub mod config;
pub mod download;
pub mod error;
pub mod execute;
pub mod gh;
pub mod ghas;
pub mod outcome;
pub mod paginate;
pub mod pool;
pub mod report;
pub mod settings;
pub mod topics;

#[cfg(test)]
mod testing;
