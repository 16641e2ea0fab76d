//! Parser for serialized list literals such as `['SQL', "Python"]`.
//!
//! Qualification fields arrive as the textual form of a list of strings.
//! This accepts that literal grammar: single- or double-quoted strings with
//! backslash escapes (including `\xNN`, `\uNNNN`, `\UNNNNNNNN` and octal),
//! integers, floats, `True`/`False`/`None`, and nested lists or tuples.
//! Anything else is a [`LiteralError`], never a panic.

use thiserror::Error;

const MAX_DEPTH: usize = 32;

/// A decoded literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    None,
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LiteralError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected character '{ch}' at offset {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("trailing input at offset {0}")]
    TrailingInput(usize),
    #[error("nesting deeper than {MAX_DEPTH} levels")]
    TooDeep,
    #[error("invalid \\{kind} escape at offset {pos}")]
    InvalidEscape { kind: char, pos: usize },
}

/// Parse a complete literal; surrounding whitespace is allowed.
pub fn parse_literal(input: &str) -> Result<Literal, LiteralError> {
    let mut parser = Parser {
        chars: input.char_indices().collect(),
        pos: 0,
    };
    let value = parser.value(0)?;
    parser.skip_ws();
    match parser.peek() {
        None => Ok(value),
        Some(_) => Err(LiteralError::TrailingInput(parser.offset())),
    }
}

/// Decode `input` as a list whose items are all strings.
///
/// Returns `None` for malformed literals, non-list values, or lists holding
/// anything other than strings.
pub fn parse_string_list(input: &str) -> Option<Vec<String>> {
    match parse_literal(input).ok()? {
        Literal::List(items) => items
            .into_iter()
            .map(|item| match item {
                Literal::Str(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map(|&(o, _)| o).unwrap_or_else(|| {
            self.chars
                .last()
                .map(|&(o, c)| o + c.len_utf8())
                .unwrap_or(0)
        })
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn unexpected(&self) -> LiteralError {
        match self.peek() {
            Some(ch) => LiteralError::UnexpectedChar {
                ch,
                pos: self.offset(),
            },
            None => LiteralError::UnexpectedEnd,
        }
    }

    fn value(&mut self, depth: usize) -> Result<Literal, LiteralError> {
        if depth > MAX_DEPTH {
            return Err(LiteralError::TooDeep);
        }
        self.skip_ws();
        match self.peek() {
            None => Err(LiteralError::UnexpectedEnd),
            Some('[') => {
                self.pos += 1;
                Ok(Literal::List(self.sequence(']', depth)?))
            }
            Some('(') => {
                self.pos += 1;
                Ok(Literal::Tuple(self.sequence(')', depth)?))
            }
            Some(q @ ('\'' | '"')) => {
                self.pos += 1;
                self.string(q).map(Literal::Str)
            }
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.keyword(),
            Some(_) => Err(self.unexpected()),
        }
    }

    /// Comma-separated items up to `close`; a trailing comma is allowed.
    fn sequence(&mut self, close: char, depth: usize) -> Result<Vec<Literal>, LiteralError> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(items);
            }
            items.push(self.value(depth + 1)?);
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(c) if c == close => {
                    self.pos += 1;
                    return Ok(items);
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<String, LiteralError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(LiteralError::UnexpectedEnd),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    None => return Err(LiteralError::UnexpectedEnd),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('a') => out.push('\x07'),
                    Some('b') => out.push('\x08'),
                    Some('f') => out.push('\x0c'),
                    Some('v') => out.push('\x0b'),
                    Some('x') => out.push(self.hex_escape('x', 2)?),
                    Some('u') => out.push(self.hex_escape('u', 4)?),
                    Some('U') => out.push(self.hex_escape('U', 8)?),
                    Some(d @ '0'..='7') => out.push(self.octal_escape(d)),
                    Some(c @ ('\\' | '\'' | '"')) => out.push(c),
                    // Unknown escapes keep the backslash.
                    Some(c) => {
                        out.push('\\');
                        out.push(c);
                    }
                },
                Some(c) => out.push(c),
            }
        }
    }

    /// Exactly `digits` hex digits naming a Unicode scalar value.
    fn hex_escape(&mut self, kind: char, digits: usize) -> Result<char, LiteralError> {
        let pos = self.offset();
        let invalid = LiteralError::InvalidEscape { kind, pos };
        let mut code: u32 = 0;
        for _ in 0..digits {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| invalid.clone())?;
            self.pos += 1;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or(invalid)
    }

    /// One to three octal digits; `first` is already consumed.
    fn octal_escape(&mut self, first: char) -> char {
        let mut code = first.to_digit(8).unwrap_or(0);
        for _ in 0..2 {
            match self.peek().and_then(|c| c.to_digit(8)) {
                Some(digit) => {
                    self.pos += 1;
                    code = code * 8 + digit;
                }
                None => break,
            }
        }
        // At most 0o777, always a valid scalar value.
        char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    fn number(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_'))
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().map(|&(_, c)| c).collect();
        let cleaned = text.replace('_', "");
        if let Ok(i) = cleaned.parse::<i64>() {
            return Ok(Literal::Int(i));
        }
        match cleaned.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Literal::Float(f)),
            _ => Err(LiteralError::InvalidNumber(text)),
        }
    }

    fn keyword(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        let offset = self.offset();
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().map(|&(_, c)| c).collect();
        match word.as_str() {
            "True" => Ok(Literal::Bool(true)),
            "False" => Ok(Literal::Bool(false)),
            "None" => Ok(Literal::None),
            _ => Err(LiteralError::UnexpectedChar {
                ch: word.chars().next().unwrap_or(' '),
                pos: offset,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string_list_single_quotes() {
        assert_eq!(
            parse_string_list("['Python', 'SQL!', ' python ']"),
            Some(vec!["Python".into(), "SQL!".into(), " python ".into()])
        );
    }

    #[test]
    fn test_parse_string_list_mixed_quotes_and_escapes() {
        assert_eq!(
            parse_string_list(r#"["Bachelor's degree", 'C\'s', "a\\b"]"#),
            Some(vec!["Bachelor's degree".into(), "C's".into(), "a\\b".into()])
        );
    }

    #[test]
    fn test_parse_empty_list_and_trailing_comma() {
        assert_eq!(parse_string_list("[]"), Some(vec![]));
        assert_eq!(parse_string_list("['a',]"), Some(vec!["a".into()]));
    }

    #[test]
    fn test_numeric_escapes_decoded() {
        assert_eq!(
            parse_string_list(r"['SQL\xa0Server', 'Zero\u200bWidth', '\U0001F600', 'tab\11x', '\0']"),
            Some(vec![
                "SQL\u{a0}Server".into(),
                "Zero\u{200b}Width".into(),
                "\u{1F600}".into(),
                "tab\tx".into(),
                "\0".into(),
            ])
        );
    }

    #[test]
    fn test_invalid_numeric_escapes_rejected() {
        assert_eq!(
            parse_literal(r"'\xZZ'"),
            Err(LiteralError::InvalidEscape { kind: 'x', pos: 3 })
        );
        assert!(matches!(
            parse_literal(r"'\u12'"),
            Err(LiteralError::InvalidEscape { kind: 'u', .. })
        ));
        // Surrogates and values past U+10FFFF are not scalar values.
        assert!(matches!(
            parse_literal(r"'\ud800'"),
            Err(LiteralError::InvalidEscape { kind: 'u', .. })
        ));
        assert!(matches!(
            parse_literal(r"'\U00110000'"),
            Err(LiteralError::InvalidEscape { kind: 'U', .. })
        ));
        assert_eq!(parse_string_list(r"['bad \x1']"), None);
    }

    #[test]
    fn test_non_string_items_rejected() {
        assert_eq!(parse_string_list("[1, 2]"), None);
        assert_eq!(parse_string_list("['a', None]"), None);
        assert_eq!(parse_string_list("[['a']]"), None);
    }

    #[test]
    fn test_non_list_rejected() {
        assert_eq!(parse_string_list("'just a string'"), None);
        assert_eq!(parse_string_list("('a', 'b')"), None);
        assert_eq!(parse_string_list("not-a-list"), None);
    }

    #[test]
    fn test_malformed_literals_are_errors() {
        assert_eq!(parse_literal("['a'"), Err(LiteralError::UnexpectedEnd));
        assert!(matches!(
            parse_literal("['a' 'b']"),
            Err(LiteralError::UnexpectedChar { ch: '\'', .. })
        ));
        assert!(matches!(
            parse_literal("['a'] extra"),
            Err(LiteralError::TrailingInput(_))
        ));
        assert_eq!(parse_literal(""), Err(LiteralError::UnexpectedEnd));
    }

    #[test]
    fn test_numbers_and_keywords() {
        assert_eq!(
            parse_literal("[1, -2.5, True, None]"),
            Ok(Literal::List(vec![
                Literal::Int(1),
                Literal::Float(-2.5),
                Literal::Bool(true),
                Literal::None,
            ]))
        );
        assert!(matches!(
            parse_literal("1.2.3"),
            Err(LiteralError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_depth_limit() {
        let deep = "[".repeat(100) + &"]".repeat(100);
        assert_eq!(parse_literal(&deep), Err(LiteralError::TooDeep));
    }

    #[test]
    fn test_unicode_inside_strings() {
        assert_eq!(
            parse_string_list("['Análisis', '数据']"),
            Some(vec!["Análisis".into(), "数据".into()])
        );
    }
}
