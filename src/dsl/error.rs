//! Errors raised while building an expression tree.

use thiserror::Error;

/// Why a parse was aborted.
///
/// Every variant carries the offending token's value, its byte offset in
/// the input and the value of the token before it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A `)` without a matching `(`, or a `(` still open at the end.
    #[error("unbalanced group: '{value}' at position {position} after '{previous}'")]
    UnbalancedGroup {
        value: String,
        position: usize,
        previous: String,
    },

    /// The token is not allowed to follow its predecessor.
    #[error("'{value}' at position {position} cannot follow '{previous}'")]
    GrammarViolation {
        value: String,
        position: usize,
        previous: String,
    },

    /// An ordering comparison against a value that is not a number.
    #[error("'{value}' at position {position} is not a number, required by '{previous}'")]
    NonNumericOrdering {
        value: String,
        position: usize,
        previous: String,
    },

    #[error("invalid regex '{value}' at position {position}: {reason}")]
    InvalidRegex {
        value: String,
        position: usize,
        previous: String,
        reason: String,
    },

    /// Two chains of several groups joined together, where neither folds
    /// into a single group: `(a == 1 || b == 1) && (c == 1 || d == 1)`
    /// joined with another bracketed pair like it.
    #[error("'{value}' at position {position} closes a group that cannot be chained after '{previous}'")]
    UnsupportedNesting {
        value: String,
        position: usize,
        previous: String,
    },

    /// A token the tree builder has no rule for.
    #[error("unexpected token '{value}' at position {position} after '{previous}'")]
    UnexpectedToken {
        value: String,
        position: usize,
        previous: String,
    },
}

impl ParseError {
    /// The value of the token that failed.
    pub fn value(&self) -> &str {
        match self {
            ParseError::UnbalancedGroup { value, .. }
            | ParseError::GrammarViolation { value, .. }
            | ParseError::NonNumericOrdering { value, .. }
            | ParseError::InvalidRegex { value, .. }
            | ParseError::UnsupportedNesting { value, .. }
            | ParseError::UnexpectedToken { value, .. } => value,
        }
    }

    /// Byte offset of the failing token in the input.
    pub fn position(&self) -> usize {
        match self {
            ParseError::UnbalancedGroup { position, .. }
            | ParseError::GrammarViolation { position, .. }
            | ParseError::NonNumericOrdering { position, .. }
            | ParseError::InvalidRegex { position, .. }
            | ParseError::UnsupportedNesting { position, .. }
            | ParseError::UnexpectedToken { position, .. } => *position,
        }
    }

    /// The value of the token before the failing one.
    pub fn previous(&self) -> &str {
        match self {
            ParseError::UnbalancedGroup { previous, .. }
            | ParseError::GrammarViolation { previous, .. }
            | ParseError::NonNumericOrdering { previous, .. }
            | ParseError::InvalidRegex { previous, .. }
            | ParseError::UnsupportedNesting { previous, .. }
            | ParseError::UnexpectedToken { previous, .. } => previous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_violation_message() {
        let err = ParseError::GrammarViolation {
            value: "END".into(),
            position: 4,
            previous: "test".into(),
        };
        assert_eq!(err.to_string(), "'END' at position 4 cannot follow 'test'");
        assert_eq!(err.value(), "END");
        assert_eq!(err.position(), 4);
        assert_eq!(err.previous(), "test");
    }

    #[test]
    fn test_invalid_regex_message_includes_reason() {
        let err = ParseError::InvalidRegex {
            value: "/test".into(),
            position: 8,
            previous: "=~".into(),
            reason: "unterminated regex literal".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid regex '/test' at position 8: unterminated regex literal"
        );
        assert_eq!(err.previous(), "=~");
    }
}
