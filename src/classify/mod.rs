//! Statement classification module.
//!
//! Parses SQL and decides which kind of statement it is, which in turn
//! decides how its outcome is reported back to the user.

mod parser;

pub use parser::StatementClassifier;

use std::fmt;

/// The coarse kind of a SQL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// Row-returning queries: `SELECT`, `VALUES`, `WITH ... SELECT`.
    Select,
    Insert,
    Update,
    Delete,
    /// DDL, transaction control, pragmas and anything unrecognised.
    Other,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}
