//! Document recursive descent parser.
//!
//! Parses token streams into a [`ConfigNode`] tree. Grammar:
//! - values: mapping, sequence, string, number, `true`/`false`/`True`/`False`, `null`
//! - mapping keys: quoted strings or bare words
//! - one trailing comma allowed before `]` / `}`
//! - duplicate keys in one mapping are rejected

use crate::model::{ConfigMap, ConfigNode};
use crate::{Error, Result};
use super::lexer::{Token, TokenKind};

/// Nesting limit; deeper documents are rejected instead of overflowing the stack.
pub const MAX_DEPTH: usize = 256;

/// Parser state: wraps a token slice with cursor.
struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0, depth: 0 }
    }

    fn peek(&self) -> &'t Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn advance(&mut self) -> &'t Token {
        let tok = self.peek();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<&'t Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn error_at(&self, tok: &Token, msg: String) -> Error {
        Error::ParseError { line: tok.span.line, column: tok.span.column, message: msg }
    }

    fn unexpected(&self, expected: &str) -> Error {
        let tok = self.peek();
        let found = match tok.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", tok.text),
        };
        self.error_at(tok, format!("Expected {expected}, found {found}"))
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error_at(self.peek(), format!("Nesting deeper than {MAX_DEPTH} levels")));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}

/// Parse a complete document from tokens.
pub fn parse_document(tokens: &[Token]) -> Result<ConfigNode> {
    let mut p = Parser::new(tokens);
    let node = parse_value(&mut p)?;
    if !p.at(TokenKind::Eof) {
        return Err(p.unexpected("end of input"));
    }
    Ok(node)
}

fn parse_value(p: &mut Parser) -> Result<ConfigNode> {
    match p.peek_kind() {
        TokenKind::LBrace => parse_mapping(p),
        TokenKind::LBracket => parse_sequence(p),
        TokenKind::StringLiteral => Ok(ConfigNode::String(p.advance().text.clone())),
        TokenKind::Integer => {
            let tok = p.advance();
            // Integers beyond i64 degrade to floats rather than failing.
            match tok.text.parse::<i64>() {
                Ok(i) => Ok(ConfigNode::Int(i)),
                Err(_) => parse_float(p, tok),
            }
        }
        TokenKind::Float => {
            let tok = p.advance();
            parse_float(p, tok)
        }
        TokenKind::Word => {
            let tok = p.advance();
            match tok.text.as_str() {
                "true" | "True" => Ok(ConfigNode::Bool(true)),
                "false" | "False" => Ok(ConfigNode::Bool(false)),
                "null" => Ok(ConfigNode::Null),
                other => Err(p.error_at(
                    tok,
                    format!("Unquoted string value '{other}'; quote it with ' or \""),
                )),
            }
        }
        _ => Err(p.unexpected("a value")),
    }
}

fn parse_float(p: &Parser, tok: &Token) -> Result<ConfigNode> {
    tok.text
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(ConfigNode::Float)
        .ok_or_else(|| p.error_at(tok, format!("Number out of range: {}", tok.text)))
}

fn parse_mapping(p: &mut Parser) -> Result<ConfigNode> {
    p.enter()?;
    p.expect(TokenKind::LBrace, "'{'")?;
    let mut map = ConfigMap::new();

    while !p.at(TokenKind::RBrace) {
        let key_tok = match p.peek_kind() {
            TokenKind::StringLiteral | TokenKind::Word => p.advance(),
            _ => return Err(p.unexpected("a key or '}'")),
        };
        p.expect(TokenKind::Colon, "':'")?;
        let value = parse_value(p)?;

        if map.contains_key(&key_tok.text) {
            return Err(p.error_at(key_tok, format!("Duplicate key '{}'", key_tok.text)));
        }
        map.insert(key_tok.text.clone(), value);

        if !p.eat(TokenKind::Comma) {
            break;
        }
    }

    p.expect(TokenKind::RBrace, "',' or '}'")?;
    p.leave();
    Ok(ConfigNode::Map(map))
}

fn parse_sequence(p: &mut Parser) -> Result<ConfigNode> {
    p.enter()?;
    p.expect(TokenKind::LBracket, "'['")?;
    let mut items = Vec::new();

    while !p.at(TokenKind::RBracket) {
        items.push(parse_value(p)?);
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }

    p.expect(TokenKind::RBracket, "',' or ']'")?;
    p.leave();
    Ok(ConfigNode::List(items))
}
