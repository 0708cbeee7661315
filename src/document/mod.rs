//! # Document Parser
//!
//! Extended-JSON front end for pipeline documents: `#` line comments,
//! single- or double-quoted strings, Python-style `True`/`False`,
//! bare keys and trailing commas.
//! Pure functions: no I/O, no state, no registry dependency.

pub mod lexer;
pub mod parser;
pub mod printer;

use crate::model::ConfigNode;
use crate::Result;

pub use printer::{to_compact_string, to_pretty_string};

/// Parse a document string into a config tree.
pub fn parse(text: &str) -> Result<ConfigNode> {
    let tokens = lexer::tokenize(text)?;
    parser::parse_document(&tokens)
}
