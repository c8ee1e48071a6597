//! Integration tests for sql-kernel.

pub mod kernel_test;
pub mod postgres_test;
pub mod protocol_test;
