//! SQL-aware statement splitting.
//!
//! Uses the sqlparser tokenizer so that `;` inside string literals, quoted
//! identifiers and comments never terminates a statement. Statements are
//! sliced out of the original text, so the database receives exactly what
//! the user wrote.

use sqlparser::dialect::Dialect;
use sqlparser::tokenizer::{Location, Token, TokenWithLocation, Tokenizer};
use tracing::warn;

/// Splits a SQL batch into statements, in source order.
///
/// Each statement keeps its terminating `;` and is trimmed. Fragments made
/// only of whitespace and comments are dropped. If the batch cannot be
/// tokenized (an unterminated string, say) it is returned whole, and the
/// database reports the problem when it runs.
pub fn split_statements(batch: &str, dialect: &dyn Dialect) -> Vec<String> {
    let tokens = match Tokenizer::new(dialect, batch)
        .with_unescape(false)
        .tokenize_with_location()
    {
        Ok(tokens) => tokens,
        Err(e) => {
            warn!("Could not tokenize SQL batch, running it as one statement: {e}");
            return whole(batch);
        }
    };

    let line_starts = line_starts(batch);
    let mut statements = Vec::new();
    let mut start = 0;
    let mut has_content = false;

    for TokenWithLocation { token, location } in &tokens {
        match token {
            Token::SemiColon => {
                let Some(end) = terminator_end(batch, &line_starts, location) else {
                    warn!("Token location out of step with SQL text, running batch as one statement");
                    return whole(batch);
                };
                if has_content {
                    statements.push(batch[start..end].trim().to_string());
                }
                start = end;
                has_content = false;
            }
            Token::Whitespace(_) | Token::EOF => {}
            _ => has_content = true,
        }
    }

    if has_content {
        statements.push(batch[start..].trim().to_string());
    }

    statements
}

fn whole(batch: &str) -> Vec<String> {
    let batch = batch.trim();
    if batch.is_empty() {
        Vec::new()
    } else {
        vec![batch.to_string()]
    }
}

/// Byte offsets at which each line of `text` begins.
fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// Byte offset just past the `;` at `location` (1-based line and column,
/// columns counted in characters).
fn terminator_end(text: &str, line_starts: &[usize], location: &Location) -> Option<usize> {
    let line = usize::try_from(location.line).ok()?.checked_sub(1)?;
    let column = usize::try_from(location.column).ok()?.checked_sub(1)?;
    let line_start = *line_starts.get(line)?;

    let (offset, ch) = text[line_start..].char_indices().nth(column)?;
    (ch == ';').then_some(line_start + offset + 1)
}
