//! Tree types produced by the parser.
//!
//! A parse yields a chain of [`Group`]s. Each group owns a chain of
//! [`Expression`]s. Both chains are singly linked, each node owning its
//! successor, and are read front to back in evaluation order.

use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

use super::token::TokenKind;

/// Comparison applied between a selector's value and the match value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Not set yet. Never present in a completed tree.
    #[default]
    Na,
    Eq,   // ==
    Ne,   // !=
    Gt,   // >
    Lt,   // <
    Gte,  // >=
    Lte,  // <=
    Like, // =~
}

impl Operation {
    /// Map a comparison token onto its operation, `Na` for anything else.
    pub fn from_token(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Eq => Operation::Eq,
            TokenKind::NotEq => Operation::Ne,
            TokenKind::Gt => Operation::Gt,
            TokenKind::Gte => Operation::Gte,
            TokenKind::Lt => Operation::Lt,
            TokenKind::Lte => Operation::Lte,
            TokenKind::RegexOp => Operation::Like,
            _ => Operation::Na,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Eq => write!(f, "=="),
            Operation::Ne => write!(f, "!="),
            Operation::Gt => write!(f, ">"),
            Operation::Lt => write!(f, "<"),
            Operation::Gte => write!(f, ">="),
            Operation::Lte => write!(f, "<="),
            Operation::Like => write!(f, "=~"),
            Operation::Na => write!(f, "unknown"),
        }
    }
}

/// Boolean join to the next sibling. Defaults to OR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicType {
    And,
    #[default]
    Or,
}

impl fmt::Display for LogicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicType::And => write!(f, "&&"),
            LogicType::Or => write!(f, "||"),
        }
    }
}

/// The literal an expression compares against.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchValue {
    Text(String),
    Number(f64),
    Pattern(#[serde(serialize_with = "serialize_pattern")] Regex),
}

fn serialize_pattern<S: Serializer>(pattern: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(pattern.as_str())
}

impl PartialEq for MatchValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MatchValue::Text(a), MatchValue::Text(b)) => a == b,
            (MatchValue::Number(a), MatchValue::Number(b)) => a == b,
            (MatchValue::Pattern(a), MatchValue::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl From<f64> for MatchValue {
    fn from(value: f64) -> Self {
        MatchValue::Number(value)
    }
}

impl From<&str> for MatchValue {
    fn from(value: &str) -> Self {
        MatchValue::Text(value.to_string())
    }
}

impl From<String> for MatchValue {
    fn from(value: String) -> Self {
        MatchValue::Text(value)
    }
}

impl From<Regex> for MatchValue {
    fn from(value: Regex) -> Self {
        MatchValue::Pattern(value)
    }
}

/// A single comparison: `selector operation value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub selector: String,
    pub operation: Operation,
    pub value: MatchValue,
    /// Join to `next`; meaningless on the last node.
    pub logic: LogicType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<Expression>>,
}

impl Expression {
    pub fn new(
        selector: impl Into<String>,
        operation: Operation,
        value: impl Into<MatchValue>,
    ) -> Self {
        Self {
            selector: selector.into(),
            operation,
            value: value.into(),
            logic: LogicType::default(),
            next: None,
        }
    }

    /// Append `next` at the tail of this chain, joined with AND.
    pub fn and(mut self, next: Expression) -> Self {
        self.push(LogicType::And, next);
        self
    }

    /// Append `next` at the tail of this chain, joined with OR.
    pub fn or(mut self, next: Expression) -> Self {
        self.push(LogicType::Or, next);
        self
    }

    fn push(&mut self, logic: LogicType, next: Expression) {
        match &mut self.next {
            Some(tail) => tail.push(logic, next),
            None => {
                self.logic = logic;
                self.next = Some(Box::new(next));
            }
        }
    }
}

/// A parenthesized (or the implicit top-level) run of expressions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Group {
    /// Head of the expression chain. Only `Group::empty` leaves it unset;
    /// parsed groups always hold at least one expression.
    pub expression: Option<Box<Expression>>,
    /// Join to `next`.
    pub logic: LogicType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<Group>>,
}

impl Group {
    /// A group without expressions.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A group holding the given expression chain.
    pub fn with(expression: Expression) -> Self {
        Self {
            expression: Some(Box::new(expression)),
            ..Self::default()
        }
    }

    /// Append `next` at the tail of the group chain, joined with AND.
    pub fn and(mut self, next: Group) -> Self {
        self.push(LogicType::And, next);
        self
    }

    /// Append `next` at the tail of the group chain, joined with OR.
    pub fn or(mut self, next: Group) -> Self {
        self.push(LogicType::Or, next);
        self
    }

    fn push(&mut self, logic: LogicType, next: Group) {
        match &mut self.next {
            Some(tail) => tail.push(logic, next),
            None => {
                self.logic = logic;
                self.next = Some(Box::new(next));
            }
        }
    }

    /// Iterate the expressions of this group in order.
    pub fn expressions(&self) -> Expressions<'_> {
        Expressions {
            current: self.expression.as_deref(),
        }
    }

    /// Iterate this group and every group linked after it.
    pub fn groups(&self) -> Groups<'_> {
        Groups {
            current: Some(self),
        }
    }

    /// The last expression of this group.
    pub fn last(&self) -> Option<&Expression> {
        self.expressions().last()
    }

    /// Number of expressions in this group.
    pub fn len(&self) -> usize {
        self.expressions().count()
    }

    pub fn is_empty(&self) -> bool {
        self.expression.is_none()
    }
}

/// Iterator over an expression chain.
pub struct Expressions<'a> {
    current: Option<&'a Expression>,
}

impl<'a> Iterator for Expressions<'a> {
    type Item = &'a Expression;

    fn next(&mut self) -> Option<Self::Item> {
        let expr = self.current?;
        self.current = expr.next.as_deref();
        Some(expr)
    }
}

/// Iterator over a group chain.
pub struct Groups<'a> {
    current: Option<&'a Group>,
}

impl<'a> Iterator for Groups<'a> {
    type Item = &'a Group;

    fn next(&mut self) -> Option<Self::Item> {
        let group = self.current?;
        self.current = group.next.as_deref();
        Some(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_display() {
        let cases = [
            (Operation::Eq, "=="),
            (Operation::Ne, "!="),
            (Operation::Gt, ">"),
            (Operation::Lt, "<"),
            (Operation::Gte, ">="),
            (Operation::Lte, "<="),
            (Operation::Like, "=~"),
            (Operation::Na, "unknown"),
        ];
        for (op, expected) in cases {
            assert_eq!(op.to_string(), expected);
        }
    }

    #[test]
    fn test_operation_from_token() {
        let cases = [
            (TokenKind::Eq, Operation::Eq),
            (TokenKind::NotEq, Operation::Ne),
            (TokenKind::Gt, Operation::Gt),
            (TokenKind::Gte, Operation::Gte),
            (TokenKind::Lt, Operation::Lt),
            (TokenKind::Lte, Operation::Lte),
            (TokenKind::RegexOp, Operation::Like),
            (TokenKind::Identifier, Operation::Na),
        ];
        for (kind, expected) in cases {
            assert_eq!(Operation::from_token(kind), expected);
        }
    }

    #[test]
    fn test_logic_defaults_to_or() {
        assert_eq!(LogicType::default(), LogicType::Or);
        assert_eq!(LogicType::And.to_string(), "&&");
        assert_eq!(LogicType::Or.to_string(), "||");
    }

    #[test]
    fn test_empty_group() {
        let group = Group::empty();
        assert!(group.is_empty());
        assert_eq!(group.len(), 0);
        assert!(group.last().is_none());
    }

    #[test]
    fn test_group_last_with_many() {
        let mut chain = Expression::new("test1", Operation::Eq, 1.0);
        for i in 2..=5 {
            chain = chain.and(Expression::new(format!("test{i}"), Operation::Eq, i as f64));
        }
        let group = Group::with(chain);

        assert_eq!(group.len(), 5);
        assert_eq!(group.last().unwrap().selector, "test5");
    }

    #[test]
    fn test_chain_appends_at_tail() {
        let chain = Expression::new("a", Operation::Eq, 1.0)
            .and(Expression::new("b", Operation::Gt, 2.0))
            .or(Expression::new("c", Operation::Lt, 3.0));

        let logic: Vec<LogicType> = Group::with(chain).expressions().map(|e| e.logic).collect();
        assert_eq!(logic, vec![LogicType::And, LogicType::Or, LogicType::Or]);
    }

    #[test]
    fn test_groups_iterates_chain() {
        let root = Group::empty()
            .and(Group::with(Expression::new("a", Operation::Eq, 1.0)))
            .or(Group::with(Expression::new("b", Operation::Eq, 2.0)));

        assert_eq!(root.groups().count(), 3);
        assert_eq!(root.logic, LogicType::And);
    }

    #[test]
    fn test_pattern_equality_uses_source() {
        let a = MatchValue::from(Regex::new("foo.*").unwrap());
        let b = MatchValue::from(Regex::new("foo.*").unwrap());
        let c = MatchValue::from(Regex::new("bar").unwrap());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(MatchValue::from("1"), MatchValue::from(1.0));
    }

    #[test]
    fn test_serialize_pattern_as_source() {
        let expr = Expression::new("name", Operation::Like, Regex::new("foo.*").unwrap());
        let json = serde_json::to_value(&expr).unwrap();
        assert_eq!(json["value"]["pattern"], "foo.*");
        assert_eq!(json["operation"], "like");
        assert!(json.get("next").is_none());
    }
}
