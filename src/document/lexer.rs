//! Document lexer: tokenizes extended-JSON text.

use std::iter::Peekable;
use std::str::Chars;

use crate::{Error, Result};

/// A token from the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Decoded text: string contents without quotes, the raw number,
    /// or the bare word.
    pub text: String,
}

/// Source position of a token's first character (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

/// Token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    Integer, Float, StringLiteral,

    /// Unquoted word: a key, or one of the literal keywords.
    Word,

    // Punctuation
    LBracket, RBracket, LBrace, RBrace, Comma, Colon,

    Eof,
}

/// Character cursor that tracks line and column.
struct Scanner<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { chars: input.chars().peekable(), line: 1, column: 1 }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn span(&self) -> Span {
        Span { line: self.line, column: self.column }
    }
}

fn error_at(span: Span, message: impl Into<String>) -> Error {
    Error::ParseError { line: span.line, column: span.column, message: message.into() }
}

/// Tokenize a document.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut sc = Scanner::new(input);

    while let Some(ch) = sc.peek() {
        let span = sc.span();
        match ch {
            ' ' | '\t' | '\r' | '\n' => { sc.bump(); }

            // Line comment
            '#' => {
                while sc.peek().is_some_and(|c| c != '\n') {
                    sc.bump();
                }
            }

            '\'' | '"' => {
                let text = lex_string(&mut sc, span)?;
                tokens.push(Token { kind: TokenKind::StringLiteral, span, text });
            }

            c if c.is_ascii_digit() || c == '-' => {
                let (kind, text) = lex_number(&mut sc, span)?;
                tokens.push(Token { kind, span, text });
            }

            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(c) = sc.peek() {
                    if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                        word.push(c);
                        sc.bump();
                    } else {
                        break;
                    }
                }
                tokens.push(Token { kind: TokenKind::Word, span, text: word });
            }

            '[' => { sc.bump(); tokens.push(punct(TokenKind::LBracket, span, "[")); }
            ']' => { sc.bump(); tokens.push(punct(TokenKind::RBracket, span, "]")); }
            '{' => { sc.bump(); tokens.push(punct(TokenKind::LBrace, span, "{")); }
            '}' => { sc.bump(); tokens.push(punct(TokenKind::RBrace, span, "}")); }
            ',' => { sc.bump(); tokens.push(punct(TokenKind::Comma, span, ",")); }
            ':' => { sc.bump(); tokens.push(punct(TokenKind::Colon, span, ":")); }

            other => {
                return Err(error_at(span, format!("Unexpected character: '{other}'")));
            }
        }
    }

    tokens.push(Token { kind: TokenKind::Eof, span: sc.span(), text: String::new() });
    Ok(tokens)
}

fn lex_string(sc: &mut Scanner<'_>, start: Span) -> Result<String> {
    let quote = sc.bump().unwrap_or('"');
    let mut s = String::new();
    loop {
        let here = sc.span();
        match sc.bump() {
            Some('\\') => {
                let escaped = sc.bump().ok_or_else(|| error_at(start, "Unterminated string"))?;
                match escaped {
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    'r' => s.push('\r'),
                    'b' => s.push('\u{8}'),
                    'f' => s.push('\u{c}'),
                    '/' => s.push('/'),
                    '\\' => s.push('\\'),
                    '"' => s.push('"'),
                    '\'' => s.push('\''),
                    'u' => s.push(lex_unicode_escape(sc, here)?),
                    other => {
                        return Err(error_at(here, format!("Unknown escape sequence '\\{other}'")));
                    }
                }
            }
            Some(c) if c == quote => return Ok(s),
            Some('\n') | None => return Err(error_at(start, "Unterminated string")),
            Some(c) => s.push(c),
        }
    }
}

fn lex_unicode_escape(sc: &mut Scanner<'_>, at: Span) -> Result<char> {
    let mut code = 0u32;
    for _ in 0..4 {
        let digit = sc.bump()
            .and_then(|c| c.to_digit(16))
            .ok_or_else(|| error_at(at, "Invalid \\u escape: expected 4 hex digits"))?;
        code = code * 16 + digit;
    }
    char::from_u32(code)
        .ok_or_else(|| error_at(at, format!("Invalid \\u escape: U+{code:04X} is not a scalar value")))
}

fn lex_number(sc: &mut Scanner<'_>, start: Span) -> Result<(TokenKind, String)> {
    let mut num = String::new();
    let mut is_float = false;

    if sc.peek() == Some('-') {
        num.push('-');
        sc.bump();
    }
    if !eat_digits(sc, &mut num) {
        return Err(error_at(start, "Expected digits in number"));
    }
    if sc.peek() == Some('.') {
        is_float = true;
        num.push('.');
        sc.bump();
        if !eat_digits(sc, &mut num) {
            return Err(error_at(start, "Expected digits after decimal point"));
        }
    }
    if matches!(sc.peek(), Some('e' | 'E')) {
        is_float = true;
        num.push('e');
        sc.bump();
        if let Some(sign @ ('+' | '-')) = sc.peek() {
            num.push(sign);
            sc.bump();
        }
        if !eat_digits(sc, &mut num) {
            return Err(error_at(start, "Expected digits in exponent"));
        }
    }

    let kind = if is_float { TokenKind::Float } else { TokenKind::Integer };
    Ok((kind, num))
}

fn eat_digits(sc: &mut Scanner<'_>, out: &mut String) -> bool {
    let before = out.len();
    while let Some(c) = sc.peek().filter(char::is_ascii_digit) {
        out.push(c);
        sc.bump();
    }
    out.len() > before
}

fn punct(kind: TokenKind, span: Span, text: &str) -> Token {
    Token { kind, span, text: text.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_mapping() {
        assert_eq!(kinds(r#"{"a": 1, 'b': 2.5}"#), vec![
            TokenKind::LBrace,
            TokenKind::StringLiteral,
            TokenKind::Colon,
            TokenKind::Integer,
            TokenKind::Comma,
            TokenKind::StringLiteral,
            TokenKind::Colon,
            TokenKind::Float,
            TokenKind::RBrace,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn test_comment_skipped() {
        let tokens = tokenize("# header\n[1, # inline\n 2]").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![
            TokenKind::LBracket,
            TokenKind::Integer,
            TokenKind::Comma,
            TokenKind::Integer,
            TokenKind::RBracket,
            TokenKind::Eof,
        ]);
        assert_eq!(tokens[0].span, Span { line: 2, column: 1 });
    }

    #[test]
    fn test_hash_inside_string_is_text() {
        let tokens = tokenize("'a # b'").unwrap();
        assert_eq!(tokens[0].text, "a # b");
    }

    #[test]
    fn test_escapes() {
        let tokens = tokenize(r#""line\n\"q\" A it\'s""#).unwrap();
        assert_eq!(tokens[0].text, "line\n\"q\" A it's");
    }

    #[test]
    fn test_unterminated_string_reports_start() {
        let err = tokenize("\n  'open").unwrap_err();
        match err {
            Error::ParseError { line, column, .. } => {
                assert_eq!((line, column), (2, 3));
            }
            other => panic!("expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn test_newline_inside_string_is_error() {
        assert!(tokenize("\"a\nb\"").is_err());
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("-12 3.5 1e3 -0.25E-2").unwrap();
        let texts: Vec<_> = tokens.iter().map(|t| (t.kind, t.text.as_str())).collect();
        assert_eq!(texts[..4], [
            (TokenKind::Integer, "-12"),
            (TokenKind::Float, "3.5"),
            (TokenKind::Float, "1e3"),
            (TokenKind::Float, "-0.25e-2"),
        ]);
    }

    #[test]
    fn test_malformed_numbers() {
        assert!(tokenize("-").is_err());
        assert!(tokenize("1.").is_err());
        assert!(tokenize("2e").is_err());
    }

    #[test]
    fn test_words() {
        let tokens = tokenize("True cam_poses global.all").unwrap();
        assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::Word));
        assert_eq!(tokens[2].text, "global.all");
    }

    #[test]
    fn test_unexpected_character() {
        assert!(tokenize("{a: @}").is_err());
    }

    #[test]
    fn test_only_ascii_whitespace_separates() {
        assert!(tokenize(" \t\r\n[1,\t2]\r\n").is_ok());
        match tokenize("[1,\u{a0}2]") {
            Err(Error::ParseError { line, column, .. }) => assert_eq!((line, column), (1, 4)),
            other => panic!("expected ParseError, got {other:?}"),
        }
    }
}
