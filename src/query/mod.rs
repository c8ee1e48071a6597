//! Statement execution and result formatting.
//!
//! This module isolates per-statement execution, classification and text
//! rendering from the kernel's orchestration.

pub mod executor;
pub mod format;

pub use executor::{render_outcome, QueryExecutor};
pub use format::format_result_set;
