//! Tree builder for the filter DSL.
//!
//! Tokens are consumed in order. Each one is first checked against its
//! predecessor using the grammar table, then folded into the tree:
//!
//! | token        | effect                                                    |
//! |--------------|-----------------------------------------------------------|
//! | `(`          | open a new nesting level                                  |
//! | `)`          | close the level and link its groups into the enclosing one |
//! | `&&` / `||`  | remember the join for the next operand                    |
//! | identifier   | start a new expression with this selector                 |
//! | comparison   | set the operation of the last expression                  |
//! | literal      | coerce according to the comparison and assign             |
//!
//! The result is a chain of groups evaluated left to right, each group a
//! chain of expressions evaluated left to right. Groups keep reading order
//! where possible. A bracketed chain joined onto a single group is placed
//! before it, which evaluates the same since `&&` and `||` commute.

use crossbeam_channel::Receiver;
use regex::Regex;

use super::ast::{Expression, Group, LogicType, MatchValue, Operation};
use super::error::ParseError;
use super::grammar;
use super::lexer::tokenize;
use super::listener::TokenListener;
use super::stream::TokenStream;
use super::token::{Token, TokenKind};
use crate::config::{ParserConfig, StreamMode};

/// Parses a single input string into a [`Group`] tree.
///
/// `parse` consumes the parser; create a new one per input.
pub struct Parser {
    input: String,
    config: ParserConfig,
    listeners: Vec<TokenListener>,
}

impl Parser {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            config: ParserConfig::default(),
            listeners: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a listener offered every token observed during the parse.
    pub fn with_listener(mut self, listener: TokenListener) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Register a listener sized from the config and return its receiver.
    pub fn subscribe(&mut self) -> Receiver<Token> {
        let (listener, receiver) = TokenListener::bounded(self.config.listener_capacity);
        self.listeners.push(listener);
        receiver
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn parse(self) -> Result<Group, ParseError> {
        match self.config.stream_mode {
            StreamMode::Inline => self.build(tokenize(&self.input)),
            StreamMode::Threaded => {
                let mut stream = TokenStream::spawn(&self.input, self.config.queue_capacity);
                let result = self.build(&mut stream);
                if result.is_err() {
                    stream.stop();
                }
                result
            }
        }
    }

    fn build<I>(&self, tokens: I) -> Result<Group, ParseError>
    where
        I: Iterator<Item = Token>,
    {
        let mut builder = TreeBuilder::new();
        let mut previous: Option<Token> = None;

        for token in tokens {
            self.broadcast(&token);
            tracing::trace!("Parser: {}", token);

            if let Some(prev) = &previous {
                if !grammar::is_allowed(prev.kind, token.kind) {
                    return Err(failure(&token, Some(prev), |value, position, previous| {
                        ParseError::GrammarViolation {
                            value,
                            position,
                            previous,
                        }
                    }));
                }
            }

            match token.kind {
                TokenKind::Entry => {}
                TokenKind::OpenGroup => builder.open_group(),
                TokenKind::CloseGroup => match builder.close_group() {
                    Ok(()) => {}
                    Err(Unlinked::Unbalanced) => {
                        return Err(unbalanced(&token, previous.as_ref()));
                    }
                    Err(Unlinked::Unsupported) => {
                        return Err(unsupported(&token, previous.as_ref()));
                    }
                },
                TokenKind::LogicalAnd => builder.join(LogicType::And),
                TokenKind::LogicalOr => builder.join(LogicType::Or),
                TokenKind::Identifier => builder.start_expression(&token.value),
                kind if kind.is_comparison() => match builder.last_expression() {
                    Some(expr) => expr.operation = Operation::from_token(kind),
                    None => return Err(unexpected(&token, previous.as_ref())),
                },
                TokenKind::Literal => {
                    let value = match &previous {
                        Some(prev) => coerce(&token, prev)?,
                        None => return Err(unexpected(&token, None)),
                    };
                    match builder.last_expression() {
                        Some(expr) => expr.value = Some(value),
                        None => return Err(unexpected(&token, previous.as_ref())),
                    }
                }
                TokenKind::Eof => {
                    if builder.depth() > 0 {
                        return Err(unbalanced(&token, previous.as_ref()));
                    }
                    return builder
                        .finish()
                        .ok_or_else(|| unexpected(&token, previous.as_ref()));
                }
                _ => return Err(unexpected(&token, previous.as_ref())),
            }

            previous = Some(token);
        }

        // the tokenizer always ends with Eof
        let end = Token::new(TokenKind::Eof, "", self.input.len(), self.input.len());
        Err(unexpected(&end, previous.as_ref()))
    }

    fn broadcast(&self, token: &Token) {
        for listener in &self.listeners {
            listener.offer(token);
        }
    }
}

/// Parse a filter expression with the default configuration.
pub fn parse_filter(input: &str) -> Result<Group, ParseError> {
    Parser::new(input).parse()
}

/// Convert a literal according to the comparison before it.
fn coerce(token: &Token, previous: &Token) -> Result<MatchValue, ParseError> {
    match previous.kind {
        kind if kind.is_ordering() => {
            parse_number(&token.value)
                .map(MatchValue::Number)
                .ok_or_else(|| {
                    failure(token, Some(previous), |value, position, previous| {
                        ParseError::NonNumericOrdering {
                            value,
                            position,
                            previous,
                        }
                    })
                })
        }
        TokenKind::RegexOp => compile_pattern(&token.value)
            .map(MatchValue::Pattern)
            .map_err(|reason| ParseError::InvalidRegex {
                value: token.label(),
                position: token.start,
                previous: previous.label(),
                reason,
            }),
        TokenKind::Eq => Ok(parse_number(&token.value)
            .map_or_else(|| MatchValue::Text(token.value.clone()), MatchValue::Number)),
        _ => Ok(MatchValue::Text(token.value.clone())),
    }
}

/// The whole literal as a finite number. `nan` and `inf` stay text.
fn parse_number(literal: &str) -> Option<f64> {
    literal.parse::<f64>().ok().filter(|number| number.is_finite())
}

/// Compile a `/pattern/` literal, unescaping `\/` delimiters in the body.
fn compile_pattern(literal: &str) -> Result<Regex, String> {
    let body = literal
        .strip_prefix('/')
        .and_then(|rest| rest.strip_suffix('/'))
        .filter(|body| !body.ends_with('\\'))
        .ok_or_else(|| "unterminated regex literal".to_string())?;

    Regex::new(&body.replace("\\/", "/")).map_err(|err| err.to_string())
}

fn failure<F>(token: &Token, previous: Option<&Token>, make: F) -> ParseError
where
    F: FnOnce(String, usize, String) -> ParseError,
{
    let previous = previous.map_or_else(|| TokenKind::Entry.to_string(), Token::label);
    make(token.label(), token.start, previous)
}

fn unbalanced(token: &Token, previous: Option<&Token>) -> ParseError {
    failure(token, previous, |value, position, previous| {
        ParseError::UnbalancedGroup {
            value,
            position,
            previous,
        }
    })
}

fn unsupported(token: &Token, previous: Option<&Token>) -> ParseError {
    failure(token, previous, |value, position, previous| {
        ParseError::UnsupportedNesting {
            value,
            position,
            previous,
        }
    })
}

fn unexpected(token: &Token, previous: Option<&Token>) -> ParseError {
    failure(token, previous, |value, position, previous| {
        ParseError::UnexpectedToken {
            value,
            position,
            previous,
        }
    })
}

#[derive(Default)]
struct DraftExpression {
    selector: String,
    operation: Operation,
    value: Option<MatchValue>,
    logic: LogicType,
}

#[derive(Default)]
struct DraftGroup {
    expressions: Vec<DraftExpression>,
    logic: LogicType,
    /// Closed by `)`; later bare expressions start a new group.
    bracketed: bool,
}

/// Groups collected at one nesting level and the join waiting for the
/// next operand.
#[derive(Default)]
struct Level {
    chain: Vec<DraftGroup>,
    join: Option<LogicType>,
}

/// Why a `)` could not be folded into the enclosing level.
enum Unlinked {
    Unbalanced,
    Unsupported,
}

/// One level per open bracket, the outermost first.
struct TreeBuilder {
    levels: Vec<Level>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            levels: vec![Level::default()],
        }
    }

    /// Number of brackets still open.
    fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    fn level(&mut self) -> &mut Level {
        let innermost = self.levels.len() - 1;
        &mut self.levels[innermost]
    }

    fn join(&mut self, logic: LogicType) {
        self.level().join = Some(logic);
    }

    fn last_expression(&mut self) -> Option<&mut DraftExpression> {
        self.level().chain.last_mut()?.expressions.last_mut()
    }

    fn start_expression(&mut self, selector: &str) {
        let level = self.level();
        let join = level.join.take().unwrap_or_default();
        let expression = DraftExpression {
            selector: selector.to_string(),
            ..DraftExpression::default()
        };

        let extends_head = matches!(level.chain.as_slice(), [head] if !head.bracketed);
        if extends_head {
            let head = &mut level.chain[0];
            if let Some(last) = head.expressions.last_mut() {
                last.logic = join;
            }
            head.expressions.push(expression);
        } else {
            link(&mut level.chain, join);
            level.chain.push(DraftGroup {
                expressions: vec![expression],
                ..DraftGroup::default()
            });
        }
    }

    fn open_group(&mut self) {
        self.levels.push(Level::default());
    }

    fn close_group(&mut self) -> Result<(), Unlinked> {
        if self.depth() == 0 {
            return Err(Unlinked::Unbalanced);
        }
        let mut groups = self.levels.pop().map(|level| level.chain).unwrap_or_default();
        for group in &mut groups {
            group.bracketed = true;
        }
        if self.attach(groups) {
            Ok(())
        } else {
            Err(Unlinked::Unsupported)
        }
    }

    /// Link a closed chain after the current level's chain. `false` when
    /// neither side folds into a single group.
    fn attach(&mut self, mut groups: Vec<DraftGroup>) -> bool {
        let level = self.level();
        let join = level.join.take().unwrap_or_default();
        if level.chain.is_empty() {
            level.chain = groups;
            return true;
        }

        if groups.len() > 1
            && level.chain.len() > 1
            && !collapse(&mut groups)
            && !collapse(&mut level.chain)
        {
            return false;
        }

        if groups.len() == 1 {
            link(&mut level.chain, join);
            level.chain.append(&mut groups);
        } else {
            // x op (g1 op g2) evaluates as g1 op g2 op x
            link(&mut groups, join);
            groups.append(&mut level.chain);
            level.chain = groups;
        }
        true
    }

    /// Link the drafts into owned chains. `None` if an expression never
    /// received a value.
    fn finish(self) -> Option<Group> {
        let root = self.levels.into_iter().next()?;
        let mut next: Option<Box<Group>> = None;
        for draft in root.chain.into_iter().rev() {
            let mut expression: Option<Box<Expression>> = None;
            for expr in draft.expressions.into_iter().rev() {
                expression = Some(Box::new(Expression {
                    selector: expr.selector,
                    operation: expr.operation,
                    value: expr.value?,
                    logic: expr.logic,
                    next: expression,
                }));
            }
            next = Some(Box::new(Group {
                expression,
                logic: draft.logic,
                next,
            }));
        }
        next.map(|group| *group)
    }
}

/// Set the join from the last group of `chain` to whatever follows it.
fn link(chain: &mut [DraftGroup], join: LogicType) {
    if let Some(last) = chain.last_mut() {
        last.logic = join;
    }
}

/// Fold a chain into its first group when every later group holds a
/// single expression.
fn collapse(chain: &mut Vec<DraftGroup>) -> bool {
    if chain.iter().skip(1).any(|group| group.expressions.len() != 1) {
        return false;
    }

    let mut groups = std::mem::take(chain).into_iter();
    if let Some(mut head) = groups.next() {
        for group in groups {
            if let Some(last) = head.expressions.last_mut() {
                last.logic = head.logic;
            }
            head.expressions.extend(group.expressions);
            head.logic = group.logic;
        }
        chain.push(head);
    }
    true
}
