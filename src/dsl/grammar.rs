//! Token adjacency rules.
//!
//! Each token kind lists the kinds allowed to come immediately before it.

use super::token::TokenKind;

const COMPARISONS: &[TokenKind] = &[
    TokenKind::Eq,
    TokenKind::NotEq,
    TokenKind::Gt,
    TokenKind::Gte,
    TokenKind::Lt,
    TokenKind::Lte,
    TokenKind::RegexOp,
];

/// The kinds allowed to precede `kind`.
pub fn predecessors(kind: TokenKind) -> &'static [TokenKind] {
    match kind {
        TokenKind::Entry => &[],
        TokenKind::OpenGroup => &[
            TokenKind::OpenGroup,
            TokenKind::LogicalAnd,
            TokenKind::LogicalOr,
            TokenKind::Entry,
        ],
        TokenKind::CloseGroup => &[TokenKind::CloseGroup, TokenKind::Literal],
        TokenKind::Identifier => &[
            TokenKind::OpenGroup,
            TokenKind::Entry,
            TokenKind::LogicalAnd,
            TokenKind::LogicalOr,
        ],
        TokenKind::Literal => COMPARISONS,
        TokenKind::Eq
        | TokenKind::NotEq
        | TokenKind::Gt
        | TokenKind::Gte
        | TokenKind::Lt
        | TokenKind::Lte
        | TokenKind::RegexOp => &[TokenKind::Identifier],
        TokenKind::LogicalAnd | TokenKind::LogicalOr => {
            &[TokenKind::CloseGroup, TokenKind::Literal]
        }
        TokenKind::Eof => &[TokenKind::Literal, TokenKind::CloseGroup],
    }
}

/// Whether `candidate` may directly follow `previous`.
pub fn is_allowed(previous: TokenKind, candidate: TokenKind) -> bool {
    predecessors(candidate).contains(&previous)
}
