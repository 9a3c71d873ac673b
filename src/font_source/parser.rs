//! Document grammar
//!
//! The source format is a property-list dialect:
//!
//! ```text
//! value    := mapping | sequence | quoted | bare | number
//! mapping  := '{' (key '=' value ';')* '}'
//! sequence := '(' [value (',' value)*] ')'
//! ```
//!
//! Bare tokens are restricted to a character class that differs between
//! format revisions, so it is carried in [`ParserOptions`] instead of being
//! baked into the lexer.

use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::Chars;

use serde::{Deserialize, Serialize};

use super::raw::RawValue;
use crate::core::errors::{SourcePos, SyntaxError};

/// Characters allowed in an unquoted token, besides ASCII alphanumerics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BareCharset {
    extra: Vec<char>,
}

impl BareCharset {
    pub fn new(extra: impl IntoIterator<Item = char>) -> Self {
        Self {
            extra: extra.into_iter().collect(),
        }
    }

    /// `_`, `.` and `-` on top of alphanumerics
    pub fn glyphs3() -> Self {
        Self::new(['_', '.', '-'])
    }

    /// Revision that does not allow `-` inside bare tokens
    pub fn without_hyphen() -> Self {
        Self::new(['_', '.'])
    }

    pub fn contains(&self, c: char) -> bool {
        c.is_ascii_alphanumeric() || self.extra.contains(&c)
    }

    pub fn allows_hyphen(&self) -> bool {
        self.extra.contains(&'-')
    }
}

impl Default for BareCharset {
    fn default() -> Self {
        Self::glyphs3()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserOptions {
    pub charset: BareCharset,
}

impl ParserOptions {
    pub fn with_charset(charset: BareCharset) -> Self {
        Self { charset }
    }
}

/// Parse a document with the default options
pub fn parse(text: &str) -> Result<RawValue, SyntaxError> {
    Parser::new(text, ParserOptions::default()).parse_document()
}

/// Parse a document with explicit options
pub fn parse_with(text: &str, options: ParserOptions) -> Result<RawValue, SyntaxError> {
    Parser::new(text, options).parse_document()
}

/// True if a bare token would be read as a number (or rejected as a
/// malformed one). Such strings must be quoted when written back.
pub fn looks_numeric(token: &str) -> bool {
    let mut chars = token.chars();
    let starts_like_number = match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('-') | Some('.') => {
            let rest = &token[1..];
            rest.starts_with(|c: char| c.is_ascii_digit())
                || (token.starts_with("-.") && token[2..].starts_with(|c: char| c.is_ascii_digit()))
        }
        _ => false,
    };
    starts_like_number && token.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-')
}

/// Read a numeric token. Integral values collapse to `Integer`.
fn parse_number(token: &str) -> Option<RawValue> {
    let unsigned = token.strip_prefix('-').unwrap_or(token);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(int_part) {
        return None;
    }
    match frac_part {
        None => {
            if int_part.is_empty() {
                return None;
            }
            match token.parse::<i64>() {
                Ok(value) if int_part.len() > 1 && int_part.starts_with('0') => {
                    Some(RawValue::Padded {
                        value,
                        text: token.to_string(),
                    })
                }
                Ok(i) => Some(RawValue::Integer(i)),
                Err(_) => token.parse::<f64>().ok().map(RawValue::Float),
            }
        }
        Some(frac) => {
            if !all_digits(frac) || (int_part.is_empty() && frac.is_empty()) {
                return None;
            }
            let value: f64 = token.parse().ok()?;
            if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
                Some(RawValue::Integer(value as i64))
            } else {
                Some(RawValue::Float(value))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Equals,
    Semicolon,
    Comma,
    Bare(String),
    Quoted(String),
    Number(RawValue, String),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::OpenBrace => "'{'".into(),
            Token::CloseBrace => "'}'".into(),
            Token::OpenParen => "'('".into(),
            Token::CloseParen => "')'".into(),
            Token::Equals => "'='".into(),
            Token::Semicolon => "';'".into(),
            Token::Comma => "','".into(),
            Token::Bare(s) => format!("token '{s}'"),
            Token::Quoted(s) => format!("string \"{s}\""),
            Token::Number(_, text) => format!("number {text}"),
        }
    }
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    charset: BareCharset,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str, charset: BareCharset) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
            column: 1,
            charset,
        }
    }

    fn pos(&self) -> SourcePos {
        SourcePos {
            line: self.line,
            column: self.column,
        }
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

    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.bump();
        }
    }

    /// Next token with the position it started at, or `None` at the end
    fn next_token(&mut self) -> Result<Option<(Token, SourcePos)>, SyntaxError> {
        self.skip_whitespace();
        let pos = self.pos();
        let Some(&c) = self.chars.peek() else {
            return Ok(None);
        };
        let token = match c {
            '{' => self.single(Token::OpenBrace),
            '}' => self.single(Token::CloseBrace),
            '(' => self.single(Token::OpenParen),
            ')' => self.single(Token::CloseParen),
            '=' => self.single(Token::Equals),
            ';' => self.single(Token::Semicolon),
            ',' => self.single(Token::Comma),
            '"' => self.quoted(pos)?,
            c if self.charset.contains(c) || c == '-' => self.bare(pos)?,
            other => {
                return Err(SyntaxError::UnexpectedToken {
                    found: format!("character '{other}'"),
                    expected: "a value",
                    pos,
                })
            }
        };
        Ok(Some((token, pos)))
    }

    fn single(&mut self, token: Token) -> Token {
        self.bump();
        token
    }

    fn bare(&mut self, pos: SourcePos) -> Result<Token, SyntaxError> {
        let mut text = String::new();
        if let Some(first) = self.bump() {
            text.push(first);
        }
        while let Some(&c) = self.chars.peek() {
            if !self.charset.contains(c) {
                break;
            }
            text.push(c);
            self.bump();
        }
        if looks_numeric(&text) {
            return match parse_number(&text) {
                Some(value) => Ok(Token::Number(value, text)),
                None => Err(SyntaxError::MalformedNumber { text, pos }),
            };
        }
        if text.starts_with('-') && !self.charset.allows_hyphen() {
            return Err(SyntaxError::UnexpectedToken {
                found: format!("token '{text}'"),
                expected: "a value",
                pos,
            });
        }
        Ok(Token::Bare(text))
    }

    fn quoted(&mut self, start: SourcePos) -> Result<Token, SyntaxError> {
        self.bump();
        let mut text = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(SyntaxError::UnterminatedString { pos: start });
            };
            match c {
                '"' => return Ok(Token::Quoted(text)),
                '\\' => text.push(self.escape(start)?),
                other => text.push(other),
            }
        }
    }

    /// Up to four hex digits following a `\U` escape
    fn hex_digits(&mut self) -> String {
        let mut digits = String::new();
        for _ in 0..4 {
            match self.chars.peek() {
                Some(&d) if d.is_ascii_hexdigit() => {
                    digits.push(d);
                    self.bump();
                }
                _ => break,
            }
        }
        digits
    }

    /// Consume a `\Uxxxx` low surrogate if one comes next; leave the input
    /// untouched otherwise
    fn low_surrogate(&mut self) -> Option<u32> {
        let mut ahead = self.chars.clone();
        if ahead.next() != Some('\\') || !matches!(ahead.next(), Some('U' | 'u')) {
            return None;
        }
        let digits: String = ahead.take(4).collect();
        if digits.len() != 4 || !digits.chars().all(|d| d.is_ascii_hexdigit()) {
            return None;
        }
        let low = u32::from_str_radix(&digits, 16).ok()?;
        if !(0xDC00..=0xDFFF).contains(&low) {
            return None;
        }
        for _ in 0..6 {
            self.bump();
        }
        Some(low)
    }

    fn escape(&mut self, start: SourcePos) -> Result<char, SyntaxError> {
        let pos = self.pos();
        let Some(c) = self.bump() else {
            return Err(SyntaxError::UnterminatedString { pos: start });
        };
        let resolved = match c {
            '"' => '"',
            '\\' => '\\',
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0'..='7' => {
                let mut digits = String::from(c);
                for _ in 0..2 {
                    match self.chars.peek() {
                        Some(&d) if d.is_digit(8) => {
                            digits.push(d);
                            self.bump();
                        }
                        _ => break,
                    }
                }
                u32::from_str_radix(&digits, 8)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or(SyntaxError::InvalidEscape {
                        sequence: digits.clone(),
                        pos,
                    })?
            }
            'U' | 'u' => {
                let digits = self.hex_digits();
                let unit = u32::from_str_radix(&digits, 16).ok();
                let code = match unit {
                    Some(high @ 0xD800..=0xDBFF) => match self.low_surrogate() {
                        Some(low) => Some(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)),
                        None => unit,
                    },
                    _ => unit,
                };
                code.and_then(char::from_u32)
                    .ok_or_else(|| SyntaxError::InvalidEscape {
                        sequence: format!("{c}{digits}"),
                        pos,
                    })?
            }
            other => {
                return Err(SyntaxError::InvalidEscape {
                    sequence: other.to_string(),
                    pos,
                })
            }
        };
        Ok(resolved)
    }
}

/// Single-pass recursive descent parser
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Option<(Token, SourcePos)>,
}

impl<'a> Parser<'a> {
    pub fn new(text: &'a str, options: ParserOptions) -> Self {
        Self {
            lexer: Lexer::new(text, options.charset),
            lookahead: None,
        }
    }

    /// Parse exactly one top-level value and require the input to end there
    pub fn parse_document(mut self) -> Result<RawValue, SyntaxError> {
        let value = self.parse_value()?;
        if let Some((_, pos)) = self.next()? {
            return Err(SyntaxError::TrailingInput { pos });
        }
        Ok(value)
    }

    fn next(&mut self) -> Result<Option<(Token, SourcePos)>, SyntaxError> {
        match self.lookahead.take() {
            Some(token) => Ok(Some(token)),
            None => self.lexer.next_token(),
        }
    }

    fn peek(&mut self) -> Result<Option<&Token>, SyntaxError> {
        if self.lookahead.is_none() {
            self.lookahead = self.lexer.next_token()?;
        }
        Ok(self.lookahead.as_ref().map(|(token, _)| token))
    }

    fn expect(&mut self, wanted: Token, expected: &'static str) -> Result<(), SyntaxError> {
        match self.next()? {
            Some((token, _)) if token == wanted => Ok(()),
            Some((token, pos)) => Err(SyntaxError::UnexpectedToken {
                found: token.describe(),
                expected,
                pos,
            }),
            None => Err(SyntaxError::UnexpectedEnd { expected }),
        }
    }

    fn parse_value(&mut self) -> Result<RawValue, SyntaxError> {
        let Some((token, pos)) = self.next()? else {
            return Err(SyntaxError::UnexpectedEnd { expected: "a value" });
        };
        match token {
            Token::OpenBrace => self.parse_mapping(),
            Token::OpenParen => self.parse_sequence(),
            Token::Bare(s) => Ok(RawValue::String(s)),
            Token::Quoted(s) => Ok(RawValue::Quoted(s)),
            Token::Number(value, _) => Ok(value),
            other => Err(SyntaxError::UnexpectedToken {
                found: other.describe(),
                expected: "a value",
                pos,
            }),
        }
    }

    fn parse_mapping(&mut self) -> Result<RawValue, SyntaxError> {
        let mut dict = BTreeMap::new();
        loop {
            let Some((token, pos)) = self.next()? else {
                return Err(SyntaxError::UnexpectedEnd { expected: "'}'" });
            };
            let key = match token {
                Token::CloseBrace => return Ok(RawValue::Dict(dict)),
                Token::Bare(s) | Token::Quoted(s) => s,
                Token::Number(_, text) => text,
                other => {
                    return Err(SyntaxError::UnexpectedToken {
                        found: other.describe(),
                        expected: "a key or '}'",
                        pos,
                    })
                }
            };
            self.expect(Token::Equals, "'='")?;
            let value = self.parse_value()?;
            self.expect(Token::Semicolon, "';'")?;
            dict.insert(key, value);
        }
    }

    fn parse_sequence(&mut self) -> Result<RawValue, SyntaxError> {
        let mut items = Vec::new();
        if self.peek()? == Some(&Token::CloseParen) {
            self.next()?;
            return Ok(RawValue::Array(items));
        }
        loop {
            items.push(self.parse_value()?);
            match self.next()? {
                Some((Token::Comma, _)) => continue,
                Some((Token::CloseParen, _)) => return Ok(RawValue::Array(items)),
                Some((token, pos)) => {
                    return Err(SyntaxError::UnexpectedToken {
                        found: token.describe(),
                        expected: "',' or ')'",
                        pos,
                    })
                }
                None => return Err(SyntaxError::UnexpectedEnd { expected: "')'" }),
            }
        }
    }
}
