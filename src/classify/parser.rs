//! SQL parsing and classification logic.
//!
//! Uses sqlparser-rs with the dialect of the active backend to parse a
//! statement and map its AST onto a [`StatementKind`]. Statements the parser
//! rejects are classified from their token stream instead.

use sqlparser::ast::{SetExpr, Statement};
use sqlparser::dialect::Dialect;
use sqlparser::keywords::Keyword;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};
use tracing::debug;

use crate::db::DatabaseBackend;

use super::StatementKind;

/// SQL classifier that parses statements and reports their kind.
#[derive(Debug)]
pub struct StatementClassifier {
    dialect: Box<dyn Dialect>,
}

impl StatementClassifier {
    /// Creates a classifier for the dialect spoken by `backend`.
    pub fn for_backend(backend: DatabaseBackend) -> Self {
        Self {
            dialect: backend.dialect(),
        }
    }

    /// Returns the dialect used for parsing.
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Classifies one SQL statement.
    ///
    /// Statements the parser rejects are classified by their first top-level
    /// keyword, see [`classify_tokens`].
    pub fn classify(&self, sql: &str) -> StatementKind {
        match Parser::parse_sql(self.dialect.as_ref(), sql) {
            Ok(statements) => statements
                .first()
                .map(classify_statement)
                .unwrap_or(StatementKind::Other),
            Err(e) => {
                debug!("Falling back to token classification: {e}");
                classify_tokens(self.dialect.as_ref(), sql)
            }
        }
    }
}

/// Classifies a single parsed statement.
fn classify_statement(statement: &Statement) -> StatementKind {
    match statement {
        Statement::Query(query) => classify_set_expr(&query.body),
        Statement::Insert(_) => StatementKind::Insert,
        Statement::Update { .. } => StatementKind::Update,
        Statement::Delete(_) => StatementKind::Delete,
        _ => StatementKind::Other,
    }
}

/// Classifies a query body; `WITH ... INSERT/UPDATE` takes the kind of its body.
fn classify_set_expr(set_expr: &SetExpr) -> StatementKind {
    match set_expr {
        SetExpr::Insert(stmt) | SetExpr::Update(stmt) => classify_statement(stmt),
        SetExpr::Query(query) => classify_set_expr(&query.body),
        _ => StatementKind::Select,
    }
}

/// Classifies a statement the parser rejected.
///
/// Comments and leading parentheses are skipped. A statement opening with
/// `WITH` takes the kind of the first DML or `SELECT` keyword found outside
/// the parentheses of its CTE list; anything else is classified by its first
/// keyword.
fn classify_tokens(dialect: &dyn Dialect, sql: &str) -> StatementKind {
    let tokens = match Tokenizer::new(dialect, sql).tokenize() {
        Ok(tokens) => tokens,
        Err(e) => {
            debug!("Cannot tokenize statement: {e}");
            return StatementKind::Other;
        }
    };

    let mut significant = tokens
        .iter()
        .filter(|token| !matches!(token, Token::Whitespace(_)))
        .skip_while(|token| matches!(token, Token::LParen));

    match significant.next() {
        Some(Token::Word(word)) if word.keyword == Keyword::WITH => {
            let mut depth = 0usize;
            for token in significant {
                match token {
                    Token::LParen => depth += 1,
                    Token::RParen => depth = depth.saturating_sub(1),
                    Token::Word(word) if depth == 0 => {
                        let kind = keyword_kind(word.keyword);
                        if kind != StatementKind::Other {
                            return kind;
                        }
                    }
                    _ => {}
                }
            }
            StatementKind::Other
        }
        Some(Token::Word(word)) => keyword_kind(word.keyword),
        _ => StatementKind::Other,
    }
}

fn keyword_kind(keyword: Keyword) -> StatementKind {
    match keyword {
        Keyword::SELECT | Keyword::VALUES => StatementKind::Select,
        Keyword::INSERT | Keyword::REPLACE => StatementKind::Insert,
        Keyword::UPDATE => StatementKind::Update,
        Keyword::DELETE => StatementKind::Delete,
        _ => StatementKind::Other,
    }
}
