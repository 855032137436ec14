//! Parser for the record literal printed by the benchmark binaries.
//!
//! The binaries print a nested mapping that is almost JSON: strings may
//! use single quotes, collections may end with a trailing comma, and
//! `True`/`False`/`None` appear beside their JSON spellings. Nothing is
//! evaluated; the text is parsed into a `serde_json::Value` and rejected
//! on the first deviation from the grammar.

use std::iter::Peekable;
use std::str::Chars;

use serde_json::{Map, Number, Value};

use crate::error::RecordError;

/// Deepest mapping/list nesting accepted.
pub const MAX_DEPTH: usize = 32;

/// Parses one complete literal. Trailing non-blank text is an error.
pub fn parse_literal(text: &str) -> Result<Value, RecordError> {
    let mut parser = Parser::new(text);
    let value = parser.value(0)?;
    parser.skip_blank();
    if parser.peek().is_some() {
        return Err(parser.error("unexpected text after record"));
    }
    Ok(value)
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> RecordError {
        RecordError::Syntax {
            line: self.line,
            column: self.column,
            message: message.into(),
        }
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

    fn skip_blank(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn match_delim(&mut self, delim: char) -> bool {
        self.skip_blank();
        self.peek() == Some(delim)
    }

    fn eat_delim(&mut self, delim: char) -> Result<(), RecordError> {
        if self.match_delim(delim) {
            self.bump();
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", delim)))
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value, RecordError> {
        if depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.skip_blank();
        match self.peek() {
            Some('{') => self.mapping(depth),
            Some('[') => self.list(depth),
            Some('"') | Some('\'') => Ok(Value::String(self.string()?)),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.keyword(),
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn mapping(&mut self, depth: usize) -> Result<Value, RecordError> {
        self.eat_delim('{')?;
        let mut map = Map::new();
        loop {
            if self.match_delim('}') {
                self.bump();
                return Ok(Value::Object(map));
            }
            self.skip_blank();
            if !matches!(self.peek(), Some('"') | Some('\'')) {
                return Err(self.error("expected quoted key"));
            }
            let key = self.string()?;
            self.eat_delim(':')?;
            let value = self.value(depth + 1)?;
            if map.insert(key.clone(), value).is_some() {
                return Err(self.error(format!("duplicate key '{}'", key)));
            }
            if self.match_delim(',') {
                self.bump();
            } else if !self.match_delim('}') {
                return Err(self.error("expected ',' or '}'"));
            }
        }
    }

    fn list(&mut self, depth: usize) -> Result<Value, RecordError> {
        self.eat_delim('[')?;
        let mut items = Vec::new();
        loop {
            if self.match_delim(']') {
                self.bump();
                return Ok(Value::Array(items));
            }
            items.push(self.value(depth + 1)?);
            if self.match_delim(',') {
                self.bump();
            } else if !self.match_delim(']') {
                return Err(self.error("expected ',' or ']'"));
            }
        }
    }

    fn string(&mut self) -> Result<String, RecordError> {
        let quote = self.bump().ok_or_else(|| self.error("expected string"))?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('\n') => return Err(self.error("newline in string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let escaped = self.bump().ok_or_else(|| self.error("unterminated escape"))?;
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        '\\' | '\'' | '"' | '/' => escaped,
                        other => return Err(self.error(format!("unknown escape '\\{}'", other))),
                    });
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<Value, RecordError> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }

        if let Ok(n) = text.parse::<u64>() {
            return Ok(Value::Number(n.into()));
        }
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Value::Number(n.into()));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| self.error(format!("invalid number '{}'", text)))
    }

    fn keyword(&mut self) -> Result<Value, RecordError> {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        match word.as_str() {
            "true" | "True" => Ok(Value::Bool(true)),
            "false" | "False" => Ok(Value::Bool(false)),
            "null" | "None" => Ok(Value::Null),
            _ => Err(self.error(format!("unknown identifier '{}'", word))),
        }
    }
}
