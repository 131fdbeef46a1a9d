//! Filter expression language.
//!
//! Syntax:
//!   selector == value        - equality (a single `=` also works)
//!   selector != value        - inequality
//!   selector > n, >= n       - numeric comparison (also `<`, `<=`)
//!   selector =~ /pattern/    - regex match (`\/` escapes the delimiter)
//!   expr1 && expr2           - AND
//!   expr1 || expr2           - OR
//!   (expr)                   - grouping
//!
//! Parsing yields a [`Group`] chain for an external evaluator. Groups are
//! combined left to right by each group's `logic`, expressions inside a
//! group by each expression's `logic`. Joins have no precedence:
//! `a == 1 || b == 1 && c == 1` reads as `(a == 1 || b == 1) && c == 1`.

mod ast;
mod error;
mod grammar;
mod lexer;
mod listener;
mod parser;
mod stream;
mod token;

pub use ast::*;
pub use error::ParseError;
pub use grammar::{is_allowed, predecessors};
pub use lexer::{Tokenizer, tokenize};
pub use listener::TokenListener;
pub use parser::{Parser, parse_filter};
pub use stream::TokenStream;
pub use token::{Token, TokenKind};
