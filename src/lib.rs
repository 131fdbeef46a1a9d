//! Compiles filter expressions such as `(a == 1 || a > 5) && b >= 19` into
//! an expression tree.

pub mod config;
pub mod dsl;

pub use crate::config::{ParserConfig, StreamMode};
pub use dsl::{Group, ParseError, Parser, parse_filter};
