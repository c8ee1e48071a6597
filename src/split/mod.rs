//! Input splitting.
//!
//! An execute payload is first cut into connection directives and SQL
//! batches ([`split_blocks`]); each batch is then cut into individual
//! statements ([`split_statements`]).
//!
//! Directive detection is line-oriented, not SQL-aware: a line shaped like
//! `!...;` inside a multi-line string literal or block comment is still
//! taken as a directive.

mod statements;

pub use statements::split_statements;

use regex::Regex;
use std::sync::OnceLock;

/// A line made only of optional indentation, `!`, a payload and `;`.
const DIRECTIVE_PATTERN: &str = r"(?mR)^[ \t]*!.+;$";

/// A segment of an execute payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputBlock {
    /// A connection string taken from a `!...;` line.
    ConnectionDirective(String),
    /// Text between directives, trimmed and never empty.
    SqlBatch(String),
}

impl InputBlock {
    /// Renders the block back into payload text.
    pub fn to_source(&self) -> String {
        match self {
            Self::ConnectionDirective(conn_str) => format!("!{conn_str};"),
            Self::SqlBatch(sql) => sql.clone(),
        }
    }
}

fn directive_regex() -> &'static Regex {
    static DIRECTIVE: OnceLock<Regex> = OnceLock::new();
    DIRECTIVE.get_or_init(|| Regex::new(DIRECTIVE_PATTERN).expect("directive pattern is valid"))
}

/// Splits raw input into directives and SQL batches, in source order.
///
/// Whitespace-only batches are dropped.
pub fn split_blocks(raw: &str) -> Vec<InputBlock> {
    let mut blocks = Vec::new();
    let mut last_end = 0;

    for directive in directive_regex().find_iter(raw) {
        push_batch(&mut blocks, &raw[last_end..directive.start()]);

        let conn_str = directive
            .as_str()
            .trim()
            .trim_start_matches('!')
            .trim_end_matches(';')
            .trim();
        blocks.push(InputBlock::ConnectionDirective(conn_str.to_string()));

        last_end = directive.end();
    }
    push_batch(&mut blocks, &raw[last_end..]);

    blocks
}

fn push_batch(blocks: &mut Vec<InputBlock>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        blocks.push(InputBlock::SqlBatch(text.to_string()));
    }
}
