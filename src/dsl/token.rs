//! Token types shared by the tokenizer, the grammar table and the parser.

use serde::Serialize;
use std::fmt;

/// Token kinds produced by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    // Stream sentinels
    Entry,
    Eof,

    // Operands
    Identifier, // selector
    Literal,    // value compared against

    // Grouping
    OpenGroup,  // (
    CloseGroup, // )

    // Boolean joins
    LogicalAnd, // &&
    LogicalOr,  // ||

    // Comparisons
    Eq,      // == or =
    NotEq,   // !=
    Gt,      // >
    Gte,     // >=
    Lt,      // <
    Lte,     // <=
    RegexOp, // =~
}

impl TokenKind {
    /// True for the comparison operators that carry an operation.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::Gt
                | TokenKind::Gte
                | TokenKind::Lt
                | TokenKind::Lte
                | TokenKind::RegexOp
        )
    }

    /// True for the comparisons that require a numeric literal.
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            TokenKind::Gt | TokenKind::Gte | TokenKind::Lt | TokenKind::Lte
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TokenKind::Entry => "BEGIN",
            TokenKind::Eof => "END",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Literal => "LITERAL",
            TokenKind::OpenGroup => "(",
            TokenKind::CloseGroup => ")",
            TokenKind::LogicalAnd => "&&",
            TokenKind::LogicalOr => "||",
            TokenKind::Eq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Gt => ">",
            TokenKind::Gte => ">=",
            TokenKind::Lt => "<",
            TokenKind::Lte => "<=",
            TokenKind::RegexOp => "=~",
        };
        f.write_str(label)
    }
}

/// A lexical unit and the byte span of its trimmed value in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            start,
            end,
        }
    }

    /// The value, or the kind label for valueless sentinel tokens.
    pub fn label(&self) -> String {
        if self.value.is_empty() {
            self.kind.to_string()
        } else {
            self.value.clone()
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type: '{}', value: '{}' [{}..{}]",
            self.kind, self.value, self.start, self.end
        )
    }
}
