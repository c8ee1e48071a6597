//! sql-kernel - an interactive SQL kernel.
//!
//! Splits cells into connection directives and SQL batches, runs them
//! against a single session connection, and renders results as text.

pub mod classify;
pub mod cli;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod kernel;
pub mod logging;
pub mod protocol;
pub mod query;
pub mod split;
