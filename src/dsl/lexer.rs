//! Tokenizer for the filter DSL.
//!
//! The scanner keeps a read cursor and the start of the pending token. Each
//! state looks at the byte under the cursor, emits tokens when one is
//! complete and hands back the next state. Tokens are produced lazily: the
//! iterator runs states only until at least one token is queued.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::token::{Token, TokenKind};

/// Bytes that end a match literal.
const LITERAL_TERMINATORS: &[u8] = b"()&|><=!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Expression,
    Match,
    LessThan,
    GreaterThan,
    Equality,
    NotEquality,
    BeforeRegex,
    Regex,
    OpenGroup,
    CloseGroup,
    LogicalAnd,
    LogicalOr,
}

/// Lazy token stream over an input string.
///
/// Always yields `Entry` first and `Eof` last, and never fails: malformed
/// input shows up as token sequences the grammar rejects.
pub struct Tokenizer {
    input: String,
    position: usize,
    start: usize,
    state: Option<State>,
    queued: VecDeque<Token>,
    stop: Option<Arc<AtomicBool>>,
    finished: bool,
}

/// Start tokenizing `input`. Every call returns an independent stream.
pub fn tokenize(input: &str) -> Tokenizer {
    Tokenizer::new(input)
}

impl Tokenizer {
    pub fn new(input: impl Into<String>) -> Self {
        let mut tokenizer = Self {
            input: input.into(),
            position: 0,
            start: 0,
            state: Some(State::Expression),
            queued: VecDeque::new(),
            stop: None,
            finished: false,
        };
        tokenizer.emit_sentinel(TokenKind::Entry);
        tokenizer
    }

    /// Stop scanning once `stop` is raised. Checked between states; the
    /// stream still ends with `Eof`.
    pub fn with_stop_signal(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    fn stopped(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|stop| stop.load(Ordering::SeqCst))
    }

    fn step(&mut self, state: State) -> Option<State> {
        match state {
            State::Expression => self.inside_expression(),
            State::Match => self.inside_match(),
            State::LessThan => self.inside_less_than(),
            State::GreaterThan => self.inside_greater_than(),
            State::Equality => self.inside_equality(),
            State::NotEquality => self.inside_not_equality(),
            State::BeforeRegex => self.before_regex(),
            State::Regex => self.inside_regex(),
            State::OpenGroup => self.inside_open_group(),
            State::CloseGroup => self.inside_close_group(),
            State::LogicalAnd => self.inside_logical(b'&', TokenKind::LogicalAnd),
            State::LogicalOr => self.inside_logical(b'|', TokenKind::LogicalOr),
        }
    }

    fn inside_expression(&mut self) -> Option<State> {
        let Some(c) = self.next_byte() else {
            self.emit(TokenKind::Identifier);
            return None;
        };

        let state = match c {
            b'(' => State::OpenGroup,
            b')' => State::CloseGroup,
            b'&' => State::LogicalAnd,
            b'|' => State::LogicalOr,
            b'>' => State::GreaterThan,
            b'<' => State::LessThan,
            b'=' => State::Equality,
            b'!' => State::NotEquality,
            _ => State::Expression,
        };
        Some(state)
    }

    /// The value being compared against, up to the next operator byte.
    fn inside_match(&mut self) -> Option<State> {
        while let Some(c) = self.next_byte() {
            if LITERAL_TERMINATORS.contains(&c) {
                self.backup();
                break;
            }
        }
        self.emit(TokenKind::Literal);
        Some(State::Expression)
    }

    fn inside_less_than(&mut self) -> Option<State> {
        self.emit_before(TokenKind::Identifier);
        if self.peek() == Some(b'=') {
            self.skip();
            self.emit(TokenKind::Lte);
        } else {
            self.emit(TokenKind::Lt);
        }
        Some(State::Match)
    }

    fn inside_greater_than(&mut self) -> Option<State> {
        self.emit_before(TokenKind::Identifier);
        if self.peek() == Some(b'=') {
            self.skip();
            self.emit(TokenKind::Gte);
        } else {
            self.emit(TokenKind::Gt);
        }
        Some(State::Match)
    }

    fn inside_equality(&mut self) -> Option<State> {
        self.emit_before(TokenKind::Identifier);
        match self.peek() {
            Some(b'=') => {
                self.skip();
                self.emit(TokenKind::Eq);
            }
            Some(b'~') => {
                self.skip();
                self.emit(TokenKind::RegexOp);
                return Some(State::BeforeRegex);
            }
            // a single '=' still means equality
            _ => self.emit(TokenKind::Eq),
        }
        Some(State::Match)
    }

    fn inside_not_equality(&mut self) -> Option<State> {
        if self.peek() != Some(b'=') {
            return Some(State::Expression);
        }
        self.emit_before(TokenKind::Identifier);
        self.skip();
        self.emit(TokenKind::NotEq);
        Some(State::Match)
    }

    /// Skip ahead to the opening delimiter of a regex literal.
    fn before_regex(&mut self) -> Option<State> {
        match self.next_byte()? {
            b'/' => Some(State::Regex),
            _ => Some(State::BeforeRegex),
        }
    }

    /// Regex body up to an unescaped closing delimiter or end of input.
    fn inside_regex(&mut self) -> Option<State> {
        let Some(c) = self.next_byte() else {
            self.emit(TokenKind::Literal);
            return None;
        };
        if c == b'/' && self.previous() != Some(b'\\') {
            self.emit(TokenKind::Literal);
            return Some(State::Expression);
        }
        Some(State::Regex)
    }

    fn inside_open_group(&mut self) -> Option<State> {
        self.emit_before(TokenKind::Identifier);
        self.emit(TokenKind::OpenGroup);
        Some(State::Expression)
    }

    fn inside_close_group(&mut self) -> Option<State> {
        self.emit_before(TokenKind::Identifier);
        self.emit(TokenKind::CloseGroup);
        Some(State::Expression)
    }

    /// `&&` or `||`. A single `&` or `|` is plain identifier text; a third
    /// one is emitted as its own operator so the grammar rejects it.
    fn inside_logical(&mut self, symbol: u8, kind: TokenKind) -> Option<State> {
        if self.peek() != Some(symbol) {
            return Some(State::Expression);
        }
        self.emit_before(TokenKind::Identifier);
        self.skip();
        self.emit(kind);
        if self.peek() == Some(symbol) {
            self.skip();
            self.emit(kind);
        }
        Some(State::Expression)
    }

    /// Queue the pending text as a token of `kind`. Empty operands are
    /// dropped.
    fn emit(&mut self, kind: TokenKind) {
        let raw = &self.input[self.start..self.position];
        let value = raw.trim();
        if value.is_empty() && matches!(kind, TokenKind::Identifier | TokenKind::Literal) {
            self.start = self.position;
            return;
        }

        let start = self.start + (raw.len() - raw.trim_start().len());
        let token = Token::new(kind, value, start, start + value.len());
        self.queued.push_back(token);
        self.start = self.position;
    }

    /// Flush the text before the byte just consumed, then step over it.
    fn emit_before(&mut self, kind: TokenKind) {
        self.backup();
        self.emit(kind);
        self.skip();
    }

    fn emit_sentinel(&mut self, kind: TokenKind) {
        self.queued
            .push_back(Token::new(kind, "", self.position, self.position));
        self.start = self.position;
    }

    fn next_byte(&mut self) -> Option<u8> {
        let c = *self.input.as_bytes().get(self.position)?;
        self.position += 1;
        Some(c)
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.position).copied()
    }

    /// The byte before the one just consumed.
    fn previous(&self) -> Option<u8> {
        let index = self.position.checked_sub(2)?;
        self.input.as_bytes().get(index).copied()
    }

    fn backup(&mut self) {
        self.position = self.position.saturating_sub(1);
    }

    fn skip(&mut self) {
        if self.position < self.input.len() {
            self.position += 1;
        }
    }
}

impl Iterator for Tokenizer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.queued.pop_front() {
                return Some(token);
            }
            if self.finished {
                return None;
            }
            match self.state.take() {
                Some(state) if !self.stopped() => self.state = self.step(state),
                _ => {
                    self.finished = true;
                    self.emit_sentinel(TokenKind::Eof);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).map(|t| t.kind).collect()
    }

    fn values(input: &str) -> Vec<String> {
        tokenize(input).map(|t| t.value).collect()
    }

    #[test]
    fn test_simple_tokens() {
        assert_eq!(
            kinds("test == 1"),
            vec![
                TokenKind::Entry,
                TokenKind::Identifier,
                TokenKind::Eq,
                TokenKind::Literal,
                TokenKind::Eof,
            ]
        );
        assert_eq!(values("test == 1"), vec!["", "test", "==", "1", ""]);
    }

    #[test]
    fn test_whitespace_insensitive() {
        assert_eq!(values("test==1"), values("test == 1"));
        assert_eq!(kinds("test==1"), kinds("  test   ==   1  "));
    }

    #[test]
    fn test_comparison_operators() {
        let cases = [
            ("a > 1", TokenKind::Gt),
            ("a >= 1", TokenKind::Gte),
            ("a < 1", TokenKind::Lt),
            ("a <= 1", TokenKind::Lte),
            ("a != 1", TokenKind::NotEq),
            ("a = 1", TokenKind::Eq),
        ];
        for (input, expected) in cases {
            let tokens: Vec<Token> = tokenize(input).collect();
            assert_eq!(tokens[2].kind, expected, "input: {input}");
            assert_eq!(tokens[3].value, "1", "input: {input}");
        }
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(
            values("test == 1 && test > 5 || test > 19"),
            vec![
                "", "test", "==", "1", "&&", "test", ">", "5", "||", "test", ">", "19", ""
            ]
        );
    }

    #[test]
    fn test_groups() {
        assert_eq!(
            kinds("(test==2)&&(test>0)"),
            vec![
                TokenKind::Entry,
                TokenKind::OpenGroup,
                TokenKind::Identifier,
                TokenKind::Eq,
                TokenKind::Literal,
                TokenKind::CloseGroup,
                TokenKind::LogicalAnd,
                TokenKind::OpenGroup,
                TokenKind::Identifier,
                TokenKind::Gt,
                TokenKind::Literal,
                TokenKind::CloseGroup,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_close_group_flushes_identifier() {
        assert_eq!(
            kinds("(test)"),
            vec![
                TokenKind::Entry,
                TokenKind::OpenGroup,
                TokenKind::Identifier,
                TokenKind::CloseGroup,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_regex_literal_keeps_delimiters() {
        let tokens: Vec<Token> = tokenize("name =~ /foo.*/").collect();
        assert_eq!(tokens[2].kind, TokenKind::RegexOp);
        assert_eq!(tokens[3].kind, TokenKind::Literal);
        assert_eq!(tokens[3].value, "/foo.*/");
        assert_eq!(tokens[4].kind, TokenKind::Eof);
    }

    #[test]
    fn test_regex_escaped_delimiter() {
        let tokens: Vec<Token> = tokenize(r"path =~ /a\/b/ && x == 1").collect();
        assert_eq!(tokens[3].value, r"/a\/b/");
        assert_eq!(tokens[4].kind, TokenKind::LogicalAnd);
    }

    #[test]
    fn test_regex_may_contain_operators() {
        let tokens: Vec<Token> = tokenize("name =~ /(a|b)&&c/").collect();
        assert_eq!(tokens[3].value, "/(a|b)&&c/");
        assert_eq!(tokens.len(), 5);
    }

    #[test]
    fn test_unterminated_regex_emitted_as_scanned() {
        let tokens: Vec<Token> = tokenize("test =~ /dsd$").collect();
        assert_eq!(tokens[3].kind, TokenKind::Literal);
        assert_eq!(tokens[3].value, "/dsd$");
    }

    #[test]
    fn test_regex_without_delimiter_emits_no_literal() {
        assert_eq!(
            kinds("test =~ abc"),
            vec![
                TokenKind::Entry,
                TokenKind::Identifier,
                TokenKind::RegexOp,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_single_ampersand_is_text() {
        assert_eq!(values("test & tes"), vec!["", "test & tes", ""]);
    }

    #[test]
    fn test_tripled_logical_operator() {
        let tokens: Vec<Token> = tokenize("a == 1 ||| b == 2").collect();
        assert_eq!(tokens[4].kind, TokenKind::LogicalOr);
        assert_eq!(tokens[4].value, "||");
        assert_eq!(tokens[5].kind, TokenKind::LogicalOr);
        assert_eq!(tokens[5].value, "|");
        assert_eq!(tokens[6].value, "b");
    }

    #[test]
    fn test_lone_bang_is_text() {
        assert_eq!(values("test ! 1"), vec!["", "test ! 1", ""]);
    }

    #[test]
    fn test_empty_operands_suppressed() {
        assert_eq!(
            kinds("test =="),
            vec![
                TokenKind::Entry,
                TokenKind::Identifier,
                TokenKind::Eq,
                TokenKind::Eof
            ]
        );
        assert_eq!(kinds(""), vec![TokenKind::Entry, TokenKind::Eof]);
        assert_eq!(kinds("   "), vec![TokenKind::Entry, TokenKind::Eof]);
    }

    #[test]
    fn test_token_offsets_trimmed() {
        let tokens: Vec<Token> = tokenize("  test >= 42 ").collect();
        assert_eq!((tokens[1].start, tokens[1].end), (2, 6));
        assert_eq!((tokens[2].start, tokens[2].end), (7, 9));
        assert_eq!((tokens[3].start, tokens[3].end), (10, 12));
        let eof = tokens.last().unwrap();
        assert_eq!((eof.start, eof.end), (13, 13));
    }

    #[test]
    fn test_restartable() {
        let input = "(a == 1 || a > 5) && b >= 19";
        let first: Vec<Token> = tokenize(input).collect();
        let second: Vec<Token> = tokenize(input).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stop_signal_ends_with_eof() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut tokenizer = Tokenizer::new("a == 1 && b == 2 && c == 3")
            .with_stop_signal(Arc::clone(&stop));

        assert_eq!(tokenizer.next().unwrap().kind, TokenKind::Entry);
        assert_eq!(tokenizer.next().unwrap().kind, TokenKind::Identifier);
        stop.store(true, Ordering::SeqCst);

        let rest: Vec<TokenKind> = tokenizer.map(|t| t.kind).collect();
        assert_eq!(rest.last(), Some(&TokenKind::Eof));
        assert!(rest.len() < 4, "scanner kept going after stop: {rest:?}");
    }
}
