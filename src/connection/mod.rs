//! Connection management for the kernel.
//!
//! Centralizes the lifecycle of the session's single connection.

pub mod manager;

pub use manager::{ActiveConnection, ConnectionManager};
